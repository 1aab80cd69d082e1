//! Shape types and XML generation for slides.

use std::fmt::Write as FmtWrite;

use crate::common::Result;
use crate::common::xml::escape_xml;

/// A rectangle in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Raster image formats accepted for embedded pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Detect the format from file magic bytes.
    pub fn detect_from_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"GIF8") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }

    /// Part-name extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
        }
    }

    /// MIME content type for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// One paragraph inside a text frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParagraph {
    pub text: String,
    /// Indent level, 0-based.
    pub level: u8,
    /// Explicit typeface, e.g. a monospaced font for code.
    pub font: Option<String>,
    /// Explicit size in points.
    pub size_pt: Option<f64>,
}

impl TextParagraph {
    /// A level-0 paragraph with inherited formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: 0,
            font: None,
            size_pt: None,
        }
    }

    /// Set the indent level.
    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Set an explicit typeface.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    /// Set an explicit size in points.
    pub fn with_size(mut self, size_pt: f64) -> Self {
        self.size_pt = Some(size_pt);
        self
    }
}

/// An ordered run of paragraphs bound to one shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFrame {
    pub paragraphs: Vec<TextParagraph>,
}

impl TextFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame holding a single plain paragraph.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            paragraphs: vec![TextParagraph::new(text)],
        }
    }

    /// Append a paragraph.
    pub fn push(&mut self, paragraph: TextParagraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ShapeKind {
    /// A layout-inherited placeholder; position comes from the layout.
    Placeholder {
        ph_type: &'static str,
        idx: Option<u32>,
        frame: TextFrame,
    },
    /// A free text box at an explicit rectangle.
    TextBox {
        rect: Rect,
        frame: TextFrame,
        auto_fit: bool,
    },
    /// An embedded picture. The relationship id is assigned at save time.
    Picture {
        data: Vec<u8>,
        format: ImageFormat,
        rect: Rect,
        description: String,
    },
    /// A table rendered as a DrawingML graphic frame.
    Table {
        rect: Rect,
        data: Vec<Vec<String>>,
        row_height: i64,
    },
}

/// A shape on an output slide.
#[derive(Debug, Clone)]
pub struct Shape {
    pub(crate) shape_id: u32,
    pub(crate) name: String,
    pub(crate) kind: ShapeKind,
}

impl Shape {
    pub(crate) fn new(shape_id: u32, name: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            shape_id,
            name: name.into(),
            kind,
        }
    }

    /// Shape name as it appears in `p:cNvPr`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn image_payload(&self) -> Option<(&[u8], ImageFormat)> {
        match &self.kind {
            ShapeKind::Picture { data, format, .. } => Some((data.as_slice(), *format)),
            _ => None,
        }
    }

    /// Generate XML for this shape.
    ///
    /// Pictures reference `image_rel_id`; other kinds ignore it.
    pub(crate) fn to_xml(&self, xml: &mut String, image_rel_id: Option<&str>) -> Result<()> {
        match &self.kind {
            ShapeKind::Placeholder {
                ph_type,
                idx,
                frame,
            } => {
                xml.push_str("<p:sp>");
                xml.push_str("<p:nvSpPr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="{}"/>"#,
                    self.shape_id,
                    escape_xml(&self.name)
                )?;
                xml.push_str("<p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr>");
                match idx {
                    Some(idx) => write!(xml, r#"<p:nvPr><p:ph type="{ph_type}" idx="{idx}"/></p:nvPr>"#)?,
                    None => write!(xml, r#"<p:nvPr><p:ph type="{ph_type}"/></p:nvPr>"#)?,
                }
                xml.push_str("</p:nvSpPr>");
                xml.push_str("<p:spPr/>");
                write_text_body(xml, frame, "<a:bodyPr/>")?;
                xml.push_str("</p:sp>");
            }
            ShapeKind::TextBox {
                rect,
                frame,
                auto_fit,
            } => {
                xml.push_str("<p:sp>");
                xml.push_str("<p:nvSpPr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="{}"/>"#,
                    self.shape_id,
                    escape_xml(&self.name)
                )?;
                xml.push_str("<p:cNvSpPr txBox=\"1\"/>");
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvSpPr>");
                xml.push_str("<p:spPr>");
                write_xfrm(xml, rect)?;
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
                xml.push_str("</p:spPr>");
                let body_pr = if *auto_fit {
                    r#"<a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr>"#
                } else {
                    r#"<a:bodyPr wrap="square" rtlCol="0"/>"#
                };
                write_text_body(xml, frame, body_pr)?;
                xml.push_str("</p:sp>");
            }
            ShapeKind::Picture {
                rect, description, ..
            } => {
                xml.push_str("<p:pic>");
                xml.push_str("<p:nvPicPr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="{}" descr="{}"/>"#,
                    self.shape_id,
                    escape_xml(&self.name),
                    escape_xml(description)
                )?;
                xml.push_str("<p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr>");
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvPicPr>");
                xml.push_str("<p:blipFill>");
                write!(
                    xml,
                    r#"<a:blip r:embed="{}"/>"#,
                    image_rel_id.unwrap_or("rIdImagePlaceholder")
                )?;
                xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
                xml.push_str("</p:blipFill>");
                xml.push_str("<p:spPr>");
                write_xfrm(xml, rect)?;
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
                xml.push_str("</p:spPr>");
                xml.push_str("</p:pic>");
            }
            ShapeKind::Table {
                rect,
                data,
                row_height,
            } => {
                let columns = data.first().map_or(0, Vec::len);
                xml.push_str("<p:graphicFrame>");
                xml.push_str("<p:nvGraphicFramePr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="{}"/>"#,
                    self.shape_id,
                    escape_xml(&self.name)
                )?;
                xml.push_str(
                    "<p:cNvGraphicFramePr><a:graphicFrameLocks noGrp=\"1\"/></p:cNvGraphicFramePr>",
                );
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvGraphicFramePr>");
                xml.push_str("<p:xfrm>");
                write!(xml, r#"<a:off x="{}" y="{}"/>"#, rect.x, rect.y)?;
                write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, rect.width, rect.height)?;
                xml.push_str("</p:xfrm>");
                xml.push_str(r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table">"#);
                xml.push_str("<a:tbl>");
                xml.push_str(r#"<a:tblPr firstRow="1" bandRow="1"/>"#);
                xml.push_str("<a:tblGrid>");
                if columns > 0 {
                    let col_width = rect.width / columns as i64;
                    for _ in 0..columns {
                        write!(xml, r#"<a:gridCol w="{col_width}"/>"#)?;
                    }
                }
                xml.push_str("</a:tblGrid>");
                for row in data {
                    write!(xml, r#"<a:tr h="{row_height}">"#)?;
                    for cell in row {
                        xml.push_str("<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r>");
                        xml.push_str(r#"<a:rPr lang="en-US" dirty="0"/>"#);
                        write!(xml, "<a:t>{}</a:t>", escape_xml(cell))?;
                        xml.push_str("</a:r></a:p></a:txBody><a:tcPr/></a:tc>");
                    }
                    xml.push_str("</a:tr>");
                }
                xml.push_str("</a:tbl>");
                xml.push_str("</a:graphicData></a:graphic>");
                xml.push_str("</p:graphicFrame>");
            }
        }

        Ok(())
    }
}

fn write_xfrm(xml: &mut String, rect: &Rect) -> Result<()> {
    xml.push_str("<a:xfrm>");
    write!(xml, r#"<a:off x="{}" y="{}"/>"#, rect.x, rect.y)?;
    write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, rect.width, rect.height)?;
    xml.push_str("</a:xfrm>");
    Ok(())
}

fn write_text_body(xml: &mut String, frame: &TextFrame, body_pr: &str) -> Result<()> {
    xml.push_str("<p:txBody>");
    xml.push_str(body_pr);
    xml.push_str("<a:lstStyle/>");

    if frame.is_empty() {
        xml.push_str("<a:p/>");
    }
    for paragraph in &frame.paragraphs {
        xml.push_str("<a:p>");
        if paragraph.level > 0 {
            write!(xml, r#"<a:pPr lvl="{}"/>"#, paragraph.level)?;
        }
        xml.push_str("<a:r>");
        xml.push_str("<a:rPr lang=\"en-US\" dirty=\"0\"");
        if let Some(size) = paragraph.size_pt {
            write!(xml, " sz=\"{}\"", (size * 100.0) as u32)?;
        }
        match &paragraph.font {
            Some(font) => {
                xml.push('>');
                write!(xml, r#"<a:latin typeface="{}"/>"#, escape_xml(font))?;
                xml.push_str("</a:rPr>");
            }
            None => xml.push_str("/>"),
        }
        write!(xml, "<a:t>{}</a:t>", escape_xml(&paragraph.text))?;
        xml.push_str("</a:r>");
        xml.push_str("</a:p>");
    }

    xml.push_str("</p:txBody>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_detection() {
        assert_eq!(
            ImageFormat::detect_from_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::detect_from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::detect_from_bytes(b"GIF89a"),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::detect_from_bytes(b"BM"), None);
    }

    #[test]
    fn test_text_box_xml() {
        let mut frame = TextFrame::new();
        frame.push(TextParagraph::new("Hello & <world>"));
        let shape = Shape::new(
            3,
            "Text Box 3",
            ShapeKind::TextBox {
                rect: Rect::new(100, 200, 300, 400),
                frame,
                auto_fit: true,
            },
        );

        let mut xml = String::new();
        shape.to_xml(&mut xml, None).unwrap();

        assert!(xml.contains(r#"<a:off x="100" y="200"/>"#));
        assert!(xml.contains("<a:spAutoFit/>"));
        assert!(xml.contains("<a:t>Hello &amp; &lt;world&gt;</a:t>"));
    }

    #[test]
    fn test_code_paragraph_formatting() {
        let mut frame = TextFrame::new();
        frame.push(TextParagraph::new("let x = 1;").with_font("Consolas").with_size(10.0));
        let shape = Shape::new(
            2,
            "Content Placeholder 2",
            ShapeKind::Placeholder {
                ph_type: "body",
                idx: Some(1),
                frame,
            },
        );

        let mut xml = String::new();
        shape.to_xml(&mut xml, None).unwrap();

        assert!(xml.contains(r#"sz="1000""#));
        assert!(xml.contains(r#"<a:latin typeface="Consolas"/>"#));
        assert!(xml.contains(r#"<p:ph type="body" idx="1"/>"#));
    }

    #[test]
    fn test_table_grid_dimensions() {
        let data = vec![
            vec!["H1".to_string(), "H2".to_string()],
            vec!["a".to_string(), "b".to_string()],
        ];
        let shape = Shape::new(
            4,
            "Table 4",
            ShapeKind::Table {
                rect: Rect::new(0, 0, 8000, 1000),
                data,
                row_height: 457_200,
            },
        );

        let mut xml = String::new();
        shape.to_xml(&mut xml, None).unwrap();

        assert_eq!(xml.matches("<a:tr ").count(), 2);
        assert_eq!(xml.matches("<a:gridCol ").count(), 2);
        assert!(xml.contains(r#"<a:gridCol w="4000"/>"#));
    }

    #[test]
    fn test_picture_references_relationship() {
        let shape = Shape::new(
            5,
            "Picture 5",
            ShapeKind::Picture {
                data: vec![0x89, b'P', b'N', b'G'],
                format: ImageFormat::Png,
                rect: Rect::new(0, 0, 100, 100),
                description: "chart".into(),
            },
        );

        let mut xml = String::new();
        shape.to_xml(&mut xml, Some("rId2")).unwrap();
        assert!(xml.contains(r#"<a:blip r:embed="rId2"/>"#));
    }
}
