//! OPC package assembly for `.pptx` output.
//!
//! Serializes a [`Presentation`](super::Presentation) into a ZIP-based OPC
//! package: `[Content_Types].xml`, package relationships, document
//! properties, the master/layout/theme family (template passthrough when a
//! template was opened, built-in defaults otherwise), one part per slide
//! plus its relationships, embedded media and notes slides.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use std::path::Path;

use log::debug;

use crate::common::Result;
use crate::common::xml::escape_xml;

use super::Presentation;
use super::defaults;

mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const APP_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
}

mod content_type {
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const NOTES_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
    pub const NOTES_SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const CORE_PROPS: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const APP_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
}

/// Relationship collection for one source part.
#[derive(Debug, Default)]
struct Relationships {
    entries: Vec<(String, &'static str, String)>,
}

impl Relationships {
    fn new() -> Self {
        Self::default()
    }

    /// Add a relationship and return its assigned id.
    fn add(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push((id.clone(), rel_type, target.into()));
        id
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, rel_type, target) in &self.entries {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id,
                rel_type,
                escape_xml(target)
            );
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Write the package to a file.
pub(crate) fn write<P: AsRef<Path>>(pres: &Presentation, path: P) -> Result<()> {
    let bytes = to_bytes(pres)?;
    std::fs::write(path.as_ref(), bytes)?;
    debug!("wrote presentation package to {}", path.as_ref().display());
    Ok(())
}

/// Serialize the package to bytes.
pub(crate) fn to_bytes(pres: &Presentation) -> Result<Vec<u8>> {
    // Ordered part list; relationship parts are parts like any other.
    let mut parts: Vec<(String, Vec<u8>)> = Vec::new();

    parts.push((
        "docProps/core.xml".into(),
        defaults::default_core_props_xml().into(),
    ));
    parts.push((
        "docProps/app.xml".into(),
        defaults::default_app_props_xml().into(),
    ));

    // Master / layout / theme family, either from the template or built in.
    let passthrough = pres.template().has_parts();
    let mut layout_numbers: Vec<u32> = Vec::new();
    if passthrough {
        for (name, data) in pres.template().parts() {
            if !is_passthrough_part(name) {
                continue;
            }
            if let Some(number) = layout_part_number(name) {
                layout_numbers.push(number);
            }
            parts.push((name.to_string(), data.to_vec()));
        }
        layout_numbers.sort_unstable();
    } else {
        parts.push((
            "ppt/theme/theme1.xml".into(),
            defaults::default_theme_xml().into(),
        ));
        parts.push((
            "ppt/slideMasters/slideMaster1.xml".into(),
            defaults::default_slide_master_xml().into(),
        ));
        let mut master_rels = Relationships::new();
        master_rels.add(rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        master_rels.add(rel_type::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml");
        master_rels.add(rel_type::THEME, "../theme/theme1.xml");
        parts.push((
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
            master_rels.to_xml().into_bytes(),
        ));
        for (number, xml) in [
            (1, defaults::default_title_layout_xml()),
            (2, defaults::default_content_layout_xml()),
        ] {
            parts.push((format!("ppt/slideLayouts/slideLayout{number}.xml"), xml.into()));
            let mut layout_rels = Relationships::new();
            layout_rels.add(rel_type::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
            parts.push((
                format!("ppt/slideLayouts/_rels/slideLayout{number}.xml.rels"),
                layout_rels.to_xml().into_bytes(),
            ));
        }
        layout_numbers = vec![1, 2];
    }

    let master_part = parts
        .iter()
        .map(|(name, _)| name.as_str())
        .filter(|name| {
            name.starts_with("ppt/slideMasters/slideMaster") && name.ends_with(".xml")
        })
        .min()
        .unwrap_or("ppt/slideMasters/slideMaster1.xml")
        .to_string();

    // Notes master, for slides carrying speaker notes.
    let notes_master_part = match parts
        .iter()
        .map(|(name, _)| name.as_str())
        .filter(|name| {
            name.starts_with("ppt/notesMasters/notesMaster") && name.ends_with(".xml")
        })
        .min()
    {
        Some(existing) => existing.to_string(),
        None => {
            parts.push((
                "ppt/notesMasters/notesMaster1.xml".into(),
                defaults::default_notes_master_xml().into(),
            ));
            let mut notes_master_rels = Relationships::new();
            notes_master_rels.add(rel_type::THEME, "../theme/theme1.xml");
            parts.push((
                "ppt/notesMasters/_rels/notesMaster1.xml.rels".into(),
                notes_master_rels.to_xml().into_bytes(),
            ));
            "ppt/notesMasters/notesMaster1.xml".to_string()
        }
    };

    // Slides, their media, and their notes.
    let mut image_counter = 0usize;
    let mut notes_counter = 0usize;
    for (slide_index, slide) in pres.slides().iter().enumerate() {
        let slide_number = slide_index + 1;
        let mut slide_rels = Relationships::new();

        let layout_number = resolve_layout_number(slide.layout_index(), &layout_numbers);
        slide_rels.add(
            rel_type::SLIDE_LAYOUT,
            format!("../slideLayouts/slideLayout{layout_number}.xml"),
        );

        let mut image_rel_ids = Vec::new();
        for (data, format) in slide.picture_payloads() {
            image_counter += 1;
            let media_name = format!("ppt/media/image{image_counter}.{}", format.extension());
            let rel_id = slide_rels.add(
                rel_type::IMAGE,
                format!("../media/image{image_counter}.{}", format.extension()),
            );
            image_rel_ids.push(rel_id);
            parts.push((media_name, data.to_vec()));
        }

        if let Some(notes_xml) = slide.notes_xml() {
            notes_counter += 1;
            let notes_name = format!("ppt/notesSlides/notesSlide{notes_counter}.xml");
            slide_rels.add(
                rel_type::NOTES_SLIDE,
                format!("../notesSlides/notesSlide{notes_counter}.xml"),
            );

            let mut notes_rels = Relationships::new();
            notes_rels.add(
                rel_type::NOTES_MASTER,
                format!("../{}", notes_master_part.trim_start_matches("ppt/")),
            );
            notes_rels.add(rel_type::SLIDE, format!("../slides/slide{slide_number}.xml"));

            parts.push((notes_name, notes_xml?.into_bytes()));
            parts.push((
                format!("ppt/notesSlides/_rels/notesSlide{notes_counter}.xml.rels"),
                notes_rels.to_xml().into_bytes(),
            ));
        }

        parts.push((
            format!("ppt/slides/slide{slide_number}.xml"),
            slide.to_xml(&image_rel_ids)?.into_bytes(),
        ));
        parts.push((
            format!("ppt/slides/_rels/slide{slide_number}.xml.rels"),
            slide_rels.to_xml().into_bytes(),
        ));
    }

    // ppt/presentation.xml and its relationships.
    let mut pres_rels = Relationships::new();
    let master_rel_id = pres_rels.add(
        rel_type::SLIDE_MASTER,
        master_part.trim_start_matches("ppt/").to_string(),
    );
    let mut slide_rel_ids = Vec::with_capacity(pres.slide_count());
    for slide_number in 1..=pres.slide_count() {
        slide_rel_ids.push(pres_rels.add(rel_type::SLIDE, format!("slides/slide{slide_number}.xml")));
    }
    let notes_master_rel_id = pres_rels.add(
        rel_type::NOTES_MASTER,
        notes_master_part.trim_start_matches("ppt/").to_string(),
    );

    parts.push((
        "ppt/presentation.xml".into(),
        presentation_xml(pres, &master_rel_id, &slide_rel_ids, &notes_master_rel_id)?.into_bytes(),
    ));
    parts.push((
        "ppt/_rels/presentation.xml.rels".into(),
        pres_rels.to_xml().into_bytes(),
    ));

    // Package-level relationships.
    let mut pkg_rels = Relationships::new();
    pkg_rels.add(rel_type::OFFICE_DOCUMENT, "ppt/presentation.xml");
    pkg_rels.add(rel_type::CORE_PROPS, "docProps/core.xml");
    pkg_rels.add(rel_type::APP_PROPS, "docProps/app.xml");
    parts.push(("_rels/.rels".into(), pkg_rels.to_xml().into_bytes()));

    // Content types computed over the final part list.
    let content_types = ContentTypesItem::from_parts(&parts).to_xml();

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types.as_bytes())?;
    for (name, data) in &parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn presentation_xml(
    pres: &Presentation,
    master_rel_id: &str,
    slide_rel_ids: &[String],
    notes_master_rel_id: &str,
) -> Result<String> {
    let mut xml = String::with_capacity(2048);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    xml.push_str("<p:sldMasterIdLst>");
    write!(
        xml,
        r#"<p:sldMasterId id="2147483648" r:id="{master_rel_id}"/>"#
    )?;
    xml.push_str("</p:sldMasterIdLst>");

    xml.push_str("<p:notesMasterIdLst>");
    write!(xml, r#"<p:notesMasterId r:id="{notes_master_rel_id}"/>"#)?;
    xml.push_str("</p:notesMasterIdLst>");

    if !pres.slides().is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (slide, rel_id) in pres.slides().iter().zip(slide_rel_ids) {
            write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, slide.slide_id, rel_id)?;
        }
        xml.push_str("</p:sldIdLst>");
    }

    write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/>"#,
        pres.slide_width(),
        pres.slide_height()
    )?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");

    Ok(xml)
}

/// Which template parts are carried into the output verbatim.
fn is_passthrough_part(name: &str) -> bool {
    name.starts_with("ppt/slideMasters/")
        || name.starts_with("ppt/slideLayouts/")
        || name.starts_with("ppt/theme/")
        || name.starts_with("ppt/media/")
        || name.starts_with("ppt/notesMasters/")
}

fn layout_part_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slideLayouts/slideLayout")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Map a 0-based layout index onto an existing layout part number,
/// degrading to the nearest available part when the template ships fewer
/// layouts than expected.
fn resolve_layout_number(layout_index: usize, available: &[u32]) -> u32 {
    let wanted = layout_index as u32 + 1;
    if available.contains(&wanted) {
        return wanted;
    }
    available
        .iter()
        .rev()
        .find(|&&number| number < wanted)
        .or_else(|| available.first())
        .copied()
        .unwrap_or(1)
}

/// Builder for `[Content_Types].xml`: default mappings by extension plus
/// per-part overrides.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn from_parts(parts: &[(String, Vec<u8>)]) -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), content_type::RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), content_type::XML.to_string());

        let mut overrides = BTreeMap::new();
        for (name, _) in parts {
            match override_content_type(name) {
                Some(ct) => {
                    overrides.insert(format!("/{name}"), ct.to_string());
                }
                None => {
                    let ext = name.rsplit('.').next().unwrap_or_default();
                    if let Some(ct) = media_default(ext) {
                        defaults.insert(ext.to_string(), ct.to_string());
                    }
                }
            }
        }

        Self {
            defaults,
            overrides,
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ct) in &self.defaults {
            let _ = write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            );
        }
        for (part_name, ct) in &self.overrides {
            let _ = write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(part_name),
                escape_xml(ct)
            );
        }
        xml.push_str("</Types>");
        xml
    }
}

fn override_content_type(name: &str) -> Option<&'static str> {
    if name.contains("/_rels/") || name == "_rels/.rels" {
        return None;
    }
    if !name.ends_with(".xml") {
        return None;
    }
    if name == "ppt/presentation.xml" {
        Some(content_type::PRESENTATION)
    } else if name == "docProps/core.xml" {
        Some(content_type::CORE_PROPS)
    } else if name == "docProps/app.xml" {
        Some(content_type::APP_PROPS)
    } else if name.starts_with("ppt/slideMasters/") {
        Some(content_type::SLIDE_MASTER)
    } else if name.starts_with("ppt/slideLayouts/") {
        Some(content_type::SLIDE_LAYOUT)
    } else if name.starts_with("ppt/slides/") {
        Some(content_type::SLIDE)
    } else if name.starts_with("ppt/notesMasters/") {
        Some(content_type::NOTES_MASTER)
    } else if name.starts_with("ppt/notesSlides/") {
        Some(content_type::NOTES_SLIDE)
    } else if name.starts_with("ppt/theme/") {
        Some(content_type::THEME)
    } else {
        None
    }
}

fn media_default(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tiff" => Some("image/tiff"),
        "emf" => Some("image/x-emf"),
        "wmf" => Some("image/x-wmf"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_ids_are_sequential() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(rel_type::SLIDE_LAYOUT, "a"), "rId1");
        assert_eq!(rels.add(rel_type::IMAGE, "b"), "rId2");

        let xml = rels.to_xml();
        assert!(xml.contains(r#"Id="rId1""#));
        assert!(xml.contains(r#"Target="b""#));
    }

    #[test]
    fn test_resolve_layout_number_degrades() {
        assert_eq!(resolve_layout_number(1, &[1, 2]), 2);
        assert_eq!(resolve_layout_number(1, &[1]), 1);
        assert_eq!(resolve_layout_number(5, &[1, 2, 3]), 3);
        assert_eq!(resolve_layout_number(0, &[2, 3]), 2);
        assert_eq!(resolve_layout_number(0, &[]), 1);
    }

    #[test]
    fn test_content_types_defaults_and_overrides() {
        let parts = vec![
            ("ppt/presentation.xml".to_string(), Vec::new()),
            ("ppt/slides/slide1.xml".to_string(), Vec::new()),
            ("ppt/media/image1.png".to_string(), Vec::new()),
            ("ppt/slides/_rels/slide1.xml.rels".to_string(), Vec::new()),
        ];
        let xml = ContentTypesItem::from_parts(&parts).to_xml();

        assert!(xml.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
        assert!(xml.contains(r#"<Default Extension="rels""#));
        assert!(xml.contains(r#"<Override PartName="/ppt/slides/slide1.xml""#));
        // Relationship parts never get overrides.
        assert!(!xml.contains("slide1.xml.rels\" ContentType"));
    }
}
