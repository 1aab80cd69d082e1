//! Presentation templates.
//!
//! A template is an existing `.pptx` supplying slide layouts. Opening one
//! reads the whole archive into memory, scans each slide layout for its
//! placeholder inventory and named shapes, and keeps every part around so
//! the theme, masters, layouts and media can be carried into the output
//! package verbatim. Lookup is best-effort by design: a layout or
//! placeholder that cannot be found simply degrades downstream to freeform
//! placement.
//!
//! Without a template, the built-in defaults provide the same two layouts
//! at the same indices: a title slide (centered title + subtitle at
//! ordinal 1) and a title-and-content slide (title + body at ordinal 1).

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::common::{Error, Result};

use super::shape::Rect;

/// A typed region on a layout, identified by kind and ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// Placeholder kind from the `type` attribute; a `p:ph` without one is
    /// a body placeholder.
    pub kind: String,
    /// Placeholder ordinal from the `idx` attribute.
    pub idx: Option<u32>,
    /// Position and size on the layout, when the layout specifies one.
    pub rect: Option<Rect>,
}

/// Any named shape on a layout, placeholder or not.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutShape {
    pub name: String,
    pub rect: Option<Rect>,
}

/// The scanned inventory of one slide layout.
#[derive(Debug, Clone, Default)]
pub struct LayoutInfo {
    pub name: String,
    pub placeholders: Vec<Placeholder>,
    pub shapes: Vec<LayoutShape>,
}

impl LayoutInfo {
    /// Find a placeholder by ordinal.
    pub fn placeholder(&self, idx: u32) -> Option<&Placeholder> {
        self.placeholders.iter().find(|ph| ph.idx == Some(idx))
    }

    /// Find a shape by its exact name.
    pub fn named_shape(&self, name: &str) -> Option<&LayoutShape> {
        self.shapes.iter().find(|shape| shape.name == name)
    }
}

/// An opened template, or the built-in default layouts.
#[derive(Debug, Clone)]
pub struct Template {
    layouts: Vec<LayoutInfo>,
    /// Raw template parts by archive name, for passthrough into the output.
    parts: BTreeMap<String, Vec<u8>>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            layouts: default_layouts(),
            parts: BTreeMap::new(),
        }
    }
}

impl Template {
    /// Open a template from a `.pptx` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Open a template from `.pptx` bytes already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|err| Error::Template(format!("not a readable package: {err}")))?;

        let mut parts = BTreeMap::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.insert(entry.name().to_string(), data);
        }

        let mut layout_names: Vec<(u32, String)> = parts
            .keys()
            .filter_map(|name| {
                let number = name
                    .strip_prefix("ppt/slideLayouts/slideLayout")?
                    .strip_suffix(".xml")?;
                Some((number.parse::<u32>().ok()?, name.clone()))
            })
            .collect();
        layout_names.sort();

        if layout_names.is_empty() {
            warn!("template contains no slide layouts; using defaults");
            return Ok(Self {
                layouts: default_layouts(),
                parts,
            });
        }

        let mut layouts = Vec::with_capacity(layout_names.len());
        for (_, part_name) in &layout_names {
            let info = scan_layout(&parts[part_name])?;
            debug!(
                "template layout '{}': {} placeholder(s), {} shape(s)",
                info.name,
                info.placeholders.len(),
                info.shapes.len()
            );
            layouts.push(info);
        }

        Ok(Self { layouts, parts })
    }

    /// Construct a template from pre-built layout inventories.
    ///
    /// Used by tests to model templates with unusual shape collections
    /// without shipping binary fixtures.
    pub fn from_layouts(layouts: Vec<LayoutInfo>) -> Self {
        Self {
            layouts,
            parts: BTreeMap::new(),
        }
    }

    /// Get a layout by index.
    pub fn layout(&self, index: usize) -> Option<&LayoutInfo> {
        self.layouts.get(index)
    }

    /// Number of layouts the template supplies.
    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    /// Whether this template carries raw parts to copy into the output.
    pub(crate) fn has_parts(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Raw parts in deterministic order.
    pub(crate) fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|(name, data)| (name.as_str(), data.as_slice()))
    }
}

/// Scan one slide layout part for placeholders and named shapes.
fn scan_layout(bytes: &[u8]) -> Result<LayoutInfo> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut info = LayoutInfo::default();

    // Per-shape scan state.
    let mut sp_depth = 0usize;
    let mut shape_name = String::new();
    let mut placeholder: Option<(String, Option<u32>)> = None;
    let mut offset: Option<(i64, i64)> = None;
    let mut extent: Option<(i64, i64)> = None;

    loop {
        let (e, is_start) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, true),
            Ok(Event::Empty(e)) => (e, false),
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"sp" && sp_depth > 0 {
                    sp_depth -= 1;
                    if sp_depth == 0 {
                        let rect = match (offset, extent) {
                            (Some((x, y)), Some((cx, cy))) => Some(Rect::new(x, y, cx, cy)),
                            _ => None,
                        };
                        if let Some((kind, idx)) = placeholder.take() {
                            info.placeholders.push(Placeholder { kind, idx, rect });
                        }
                        if !shape_name.is_empty() {
                            info.shapes.push(LayoutShape {
                                name: std::mem::take(&mut shape_name),
                                rect,
                            });
                        }
                        offset = None;
                        extent = None;
                    }
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(Error::Xml(err.to_string())),
            _ => continue,
        };

        match e.local_name().as_ref() {
            // A self-closing p:sp carries nothing and has no End event.
            b"sp" if is_start => {
                sp_depth += 1;
                if sp_depth == 1 {
                    shape_name.clear();
                    placeholder = None;
                    offset = None;
                    extent = None;
                }
            }
            b"cSld" => {
                if let Some(name) = attribute(&e, b"name") {
                    info.name = name;
                }
            }
            b"cNvPr" if sp_depth > 0 => {
                if shape_name.is_empty() {
                    if let Some(name) = attribute(&e, b"name") {
                        shape_name = name;
                    }
                }
            }
            b"ph" if sp_depth > 0 => {
                let kind = attribute(&e, b"type").unwrap_or_else(|| "body".to_string());
                let idx = attribute(&e, b"idx").and_then(|v| v.parse().ok());
                placeholder = Some((kind, idx));
            }
            b"off" if sp_depth > 0 && offset.is_none() => {
                let x = attribute(&e, b"x").and_then(|v| v.parse().ok());
                let y = attribute(&e, b"y").and_then(|v| v.parse().ok());
                if let (Some(x), Some(y)) = (x, y) {
                    offset = Some((x, y));
                }
            }
            b"ext" if sp_depth > 0 && extent.is_none() => {
                let cx = attribute(&e, b"cx").and_then(|v| v.parse().ok());
                let cy = attribute(&e, b"cy").and_then(|v| v.parse().ok());
                if let (Some(cx), Some(cy)) = (cx, cy) {
                    extent = Some((cx, cy));
                }
            }
            _ => {}
        }
    }

    Ok(info)
}

fn attribute(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Built-in layout inventory used when no template is supplied.
///
/// Geometry mirrors the stock "Title Slide" and "Title and Content"
/// layouts so placeholder-bound text lands where a default deck puts it.
pub(crate) fn default_layouts() -> Vec<LayoutInfo> {
    vec![
        LayoutInfo {
            name: "Title Slide".to_string(),
            placeholders: vec![
                Placeholder {
                    kind: "ctrTitle".to_string(),
                    idx: None,
                    rect: Some(Rect::new(685_800, 2_130_425, 7_772_400, 1_470_025)),
                },
                Placeholder {
                    kind: "subTitle".to_string(),
                    idx: Some(1),
                    rect: Some(Rect::new(1_371_600, 3_886_200, 6_400_800, 1_752_600)),
                },
            ],
            shapes: vec![
                LayoutShape {
                    name: "Title 1".to_string(),
                    rect: Some(Rect::new(685_800, 2_130_425, 7_772_400, 1_470_025)),
                },
                LayoutShape {
                    name: "Subtitle 2".to_string(),
                    rect: Some(Rect::new(1_371_600, 3_886_200, 6_400_800, 1_752_600)),
                },
            ],
        },
        LayoutInfo {
            name: "Title and Content".to_string(),
            placeholders: vec![
                Placeholder {
                    kind: "title".to_string(),
                    idx: None,
                    rect: Some(Rect::new(457_200, 274_638, 8_229_600, 1_143_000)),
                },
                Placeholder {
                    kind: "body".to_string(),
                    idx: Some(1),
                    rect: Some(Rect::new(457_200, 1_600_200, 8_229_600, 4_525_963)),
                },
            ],
            shapes: vec![
                LayoutShape {
                    name: "Title 1".to_string(),
                    rect: Some(Rect::new(457_200, 274_638, 8_229_600, 1_143_000)),
                },
                LayoutShape {
                    name: "Content Placeholder 2".to_string(),
                    rect: Some(Rect::new(457_200, 1_600_200, 8_229_600, 4_525_963)),
                },
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="obj">
<p:cSld name="Custom Content">
<p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
<p:grpSpPr/>
<p:sp>
<p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="457200" y="274638"/><a:ext cx="8229600" cy="1143000"/></a:xfrm></p:spPr>
</p:sp>
<p:sp>
<p:nvSpPr><p:cNvPr id="3" name="Lead"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="457200" y="1500000"/><a:ext cx="8229600" cy="600000"/></a:xfrm></p:spPr>
</p:sp>
<p:sp>
<p:nvSpPr><p:cNvPr id="4" name="Content Placeholder 3"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="457200" y="2200000"/><a:ext cx="8229600" cy="3900000"/></a:xfrm></p:spPr>
</p:sp>
</p:spTree>
</p:cSld>
</p:sldLayout>"#;

    #[test]
    fn test_scan_layout_finds_placeholders_and_names() {
        let info = scan_layout(LAYOUT_XML.as_bytes()).unwrap();

        assert_eq!(info.name, "Custom Content");
        assert_eq!(info.placeholders.len(), 2);
        assert_eq!(info.shapes.len(), 3);

        // A p:ph without a type attribute is a body placeholder.
        let body = info.placeholder(1).unwrap();
        assert_eq!(body.kind, "body");
        assert_eq!(
            body.rect,
            Some(Rect::new(457_200, 2_200_000, 8_229_600, 3_900_000))
        );

        let lead = info.named_shape("Lead").unwrap();
        assert_eq!(
            lead.rect,
            Some(Rect::new(457_200, 1_500_000, 8_229_600, 600_000))
        );
        assert!(info.named_shape("Nonexistent").is_none());
    }

    #[test]
    fn test_lookup_is_shape_order_independent() {
        // Same layout with the shapes reversed still resolves both lookups.
        let reversed = LayoutInfo {
            name: String::new(),
            placeholders: vec![Placeholder {
                kind: "body".into(),
                idx: Some(1),
                rect: None,
            }],
            shapes: vec![
                LayoutShape {
                    name: "Content Placeholder 3".into(),
                    rect: None,
                },
                LayoutShape {
                    name: "Lead".into(),
                    rect: None,
                },
            ],
        };
        assert!(reversed.placeholder(1).is_some());
        assert!(reversed.named_shape("Lead").is_some());
    }

    #[test]
    fn test_default_layouts_shape() {
        let layouts = default_layouts();
        assert_eq!(layouts.len(), 2);

        // Title layout: subtitle at ordinal 1, no body.
        assert_eq!(layouts[0].placeholder(1).unwrap().kind, "subTitle");
        // Content layout: body at ordinal 1, no Lead shape.
        assert_eq!(layouts[1].placeholder(1).unwrap().kind, "body");
        assert!(layouts[1].named_shape("Lead").is_none());
    }

    #[test]
    fn test_open_rejects_garbage() {
        let err = Template::from_bytes(b"not a zip archive".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }
}
