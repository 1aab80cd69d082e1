//! XML helpers shared by the package and shape writers.

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"<foo & "bar">"#),
            "&lt;foo &amp; &quot;bar&quot;&gt;"
        );
    }

    #[test]
    fn test_escape_xml_plain_text() {
        assert_eq!(escape_xml("plain text"), "plain text");
    }
}
