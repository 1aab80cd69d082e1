//! Slide placement and presentation assembly.
//!
//! The builder owns the output presentation, places each slide record in
//! emission order, and persists the result. Placement is layout-driven:
//! the title slide binds placeholders on layout 0; content slides bind
//! layout 1, preferring the template's body placeholder and falling back
//! to a vertical-flow freeform pass when the layout has none.
//!
//! Every binding miss degrades by skipping the affected element or
//! binding, never by aborting a slide.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::common::Result;
use crate::common::unit::EMUS_PER_INCH;
use crate::diagram::ImageCache;
use crate::document::{Element, ListKind, SlideContent};
use crate::pptx::{ImageFormat, LayoutInfo, Presentation, Rect, Slide, Template, TextFrame, TextParagraph};

/// Top margin where freeform content starts (2").
const FREEFORM_TOP: i64 = 2 * EMUS_PER_INCH;
/// Left margin for freeform shapes (0.5").
const LEFT_MARGIN: i64 = EMUS_PER_INCH / 2;
/// Width of freeform shapes (9").
const CONTENT_WIDTH: i64 = 9 * EMUS_PER_INCH;
/// Vertical gap between freeform shapes (0.2").
const ELEMENT_GAP: i64 = EMUS_PER_INCH / 5;
/// Default text box height before auto-fit (0.5").
const TEXT_BOX_HEIGHT: i64 = EMUS_PER_INCH / 2;
/// Table row height (0.5").
const TABLE_ROW_HEIGHT: i64 = EMUS_PER_INCH / 2;
/// Fallback position for a template Lead shape without geometry (1.5").
const LEAD_FALLBACK_TOP: i64 = 3 * EMUS_PER_INCH / 2;

const CODE_FONT: &str = "Consolas";
const CODE_SIZE_PT: f64 = 10.0;

/// Builds a presentation from slide records.
///
/// # Examples
///
/// ```rust,no_run
/// use longan::builder::SlideBuilder;
/// use longan::diagram::ImageCache;
///
/// let slides = longan::markdown::segment("# Deck\n\n## One\n\nBody.");
/// let mut builder = SlideBuilder::from_template_path(None)?;
/// builder.build(&slides, &ImageCache::new(), "deck.pptx".as_ref())?;
/// # Ok::<(), longan::Error>(())
/// ```
pub struct SlideBuilder {
    pres: Presentation,
}

impl SlideBuilder {
    /// Create a builder over an explicit template.
    pub fn new(template: Template) -> Self {
        Self {
            pres: Presentation::with_template(template),
        }
    }

    /// Create a builder, loading the template when the path exists.
    ///
    /// A missing or absent template degrades to the default layouts, the
    /// same way the converter treats every other optional input.
    pub fn from_template_path(template_path: Option<&Path>) -> Result<Self> {
        let pres = match template_path {
            Some(path) if path.exists() => {
                let pres = Presentation::from_template(path)?;
                info!("loaded template from {}", path.display());
                pres
            }
            Some(path) => {
                warn!(
                    "template {} does not exist; using default layouts",
                    path.display()
                );
                Presentation::new()
            }
            None => {
                info!("created new presentation without template");
                Presentation::new()
            }
        };
        Ok(Self { pres })
    }

    /// Access the presentation under construction.
    pub fn presentation(&self) -> &Presentation {
        &self.pres
    }

    /// Place every slide in emission order and persist the package.
    pub fn build(
        &mut self,
        slides: &[SlideContent],
        images: &ImageCache,
        output_path: &Path,
    ) -> Result<()> {
        info!("building presentation with {} slide(s)", slides.len());
        for content in slides {
            self.place(content, images);
        }
        self.pres.save(output_path)?;
        info!("saved presentation to {}", output_path.display());
        Ok(())
    }

    /// Place one slide record, appending exactly one slide to the target.
    pub fn place(&mut self, content: &SlideContent, images: &ImageCache) {
        if content.index == 0 {
            self.place_title_slide(content);
        } else {
            self.place_content_slide(content, images);
        }
    }

    fn place_title_slide(&mut self, content: &SlideContent) {
        let layout = self.pres.layout(0).cloned();
        let slide = self.pres.add_slide(0);

        if has_title_placeholder(layout.as_ref()) {
            slide.set_title(&content.title);
        } else {
            debug!("layout 0 has no title placeholder; title skipped");
        }

        // Only the first paragraph is ever used as the subtitle.
        let subtitle = content.elements.iter().find_map(|element| match element {
            Element::Paragraph { text } => Some(text.as_str()),
            _ => None,
        });
        if let Some(subtitle) = subtitle {
            if layout.as_ref().is_some_and(|l| l.placeholder(1).is_some())
                || layout.is_none()
            {
                slide.set_subtitle(subtitle);
            } else {
                debug!("layout 0 has no subtitle placeholder; subtitle skipped");
            }
        }

        if !content.notes.is_empty() {
            slide.set_notes(&content.notes);
        }
    }

    fn place_content_slide(&mut self, content: &SlideContent, images: &ImageCache) {
        let layout = self.pres.layout(1).cloned();
        let lead_shape = layout
            .as_ref()
            .and_then(|l| l.named_shape("Lead"))
            .cloned();
        let body_placeholder = layout.as_ref().and_then(|l| l.placeholder(1)).cloned();

        let slide = self.pres.add_slide(1);

        if has_title_placeholder(layout.as_ref()) {
            slide.set_title(&content.title);
        } else {
            debug!("layout 1 has no title placeholder; title skipped");
        }

        if let Some(lead_text) = content.lead_text.as_deref() {
            match lead_shape {
                Some(shape) => {
                    let rect = shape.rect.unwrap_or(Rect::new(
                        LEFT_MARGIN,
                        LEAD_FALLBACK_TOP,
                        CONTENT_WIDTH,
                        TEXT_BOX_HEIGHT,
                    ));
                    slide.add_named_text_box("Lead", TextFrame::from_text(lead_text), rect);
                }
                None => debug!("no shape named 'Lead'; lead text skipped"),
            }
        }

        if body_placeholder.is_some() {
            // Placeholder mode: the body frame carries text-only renderings;
            // images, diagrams and tables are skipped in this mode.
            let mut frame = TextFrame::new();
            for element in &content.elements {
                append_text_paragraphs(&mut frame, element, 1);
            }
            slide.set_body(frame);
        } else {
            let mut cursor = FREEFORM_TOP;
            for element in &content.elements {
                cursor = place_freeform(slide, element, cursor, images);
            }
        }

        if !content.notes.is_empty() {
            slide.set_notes(&content.notes);
        }
    }
}

fn has_title_placeholder(layout: Option<&LayoutInfo>) -> bool {
    match layout {
        Some(layout) => layout
            .placeholders
            .iter()
            .any(|ph| ph.kind == "title" || ph.kind == "ctrTitle"),
        // No layout information at all: bind optimistically.
        None => true,
    }
}

/// Append a text-bearing element's paragraphs to a frame.
///
/// Lists use the literal `"{n}. "` / `"• "` prefixes at `list_level`; code
/// keeps its whole body as one monospaced paragraph. Non-text elements
/// append nothing.
fn append_text_paragraphs(frame: &mut TextFrame, element: &Element, list_level: u8) {
    match element {
        Element::Paragraph { text } => frame.push(TextParagraph::new(text.clone())),
        Element::List { kind, items } => {
            for (position, item) in items.iter().enumerate() {
                let text = match kind {
                    ListKind::Ordered => format!("{}. {}", position + 1, item),
                    ListKind::Unordered => format!("\u{2022} {item}"),
                };
                frame.push(TextParagraph::new(text).with_level(list_level));
            }
        }
        Element::CodeBlock { source, .. } => {
            frame.push(
                TextParagraph::new(source.clone())
                    .with_font(CODE_FONT)
                    .with_size(CODE_SIZE_PT),
            );
        }
        Element::Image { .. } | Element::Diagram { .. } | Element::Table { .. } => {
            debug!("{:?} element not renderable as text; skipped", element.kind());
        }
    }
}

/// Render one element at the flow cursor, returning the advanced cursor.
fn place_freeform(slide: &mut Slide, element: &Element, cursor: i64, images: &ImageCache) -> i64 {
    match element {
        Element::Image { path, alt } => {
            let path = Path::new(path);
            if !path.exists() {
                debug!("image {} not found (paths resolve against the working directory)", path.display());
            }
            place_picture(slide, path, cursor, alt)
        }
        Element::Diagram { source } => match images.get(source) {
            Some(path) => place_picture(slide, path, cursor, "Diagram"),
            None => {
                debug!("diagram has no rendered image; skipped");
                cursor
            }
        },
        Element::Table { headers, rows } => {
            if headers.is_empty() || rows.is_empty() {
                return cursor;
            }
            let mut data = Vec::with_capacity(rows.len() + 1);
            data.push(headers.clone());
            data.extend(rows.iter().cloned());

            let row_count = rows.len() as i64;
            let rect = Rect::new(
                LEFT_MARGIN,
                cursor,
                CONTENT_WIDTH,
                TABLE_ROW_HEIGHT * (row_count + 1),
            );
            slide.add_table(data, rect, TABLE_ROW_HEIGHT);
            cursor + TABLE_ROW_HEIGHT * (row_count + 2)
        }
        Element::Paragraph { .. } | Element::List { .. } | Element::CodeBlock { .. } => {
            let mut frame = TextFrame::new();
            append_text_paragraphs(&mut frame, element, 1);
            slide.add_text_box(
                frame,
                Rect::new(LEFT_MARGIN, cursor, CONTENT_WIDTH, TEXT_BOX_HEIGHT),
            );
            cursor + TEXT_BOX_HEIGHT + ELEMENT_GAP
        }
    }
}

/// Insert a picture scaled to the content width, preserving aspect ratio.
/// A missing or undecodable file skips the element and leaves the cursor
/// where it was.
fn place_picture(slide: &mut Slide, path: &Path, cursor: i64, description: &str) -> i64 {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            warn!("cannot read image {}: {err}; skipping", path.display());
            return cursor;
        }
    };
    let Some(format) = ImageFormat::detect_from_bytes(&data) else {
        warn!("unsupported image format for {}; skipping", path.display());
        return cursor;
    };
    let (width_px, height_px) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(err) => {
            warn!("cannot probe image {}: {err}; skipping", path.display());
            return cursor;
        }
    };
    if width_px == 0 || height_px == 0 {
        return cursor;
    }

    let scaled_height =
        (CONTENT_WIDTH as i128 * i128::from(height_px) / i128::from(width_px)) as i64;
    slide.add_picture(
        data,
        format,
        Rect::new(LEFT_MARGIN, cursor, CONTENT_WIDTH, scaled_height),
        description,
    );
    cursor + scaled_height + ELEMENT_GAP
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::{LayoutShape, Placeholder};

    fn freeform_template() -> Template {
        // A content layout with a title but no body placeholder and no Lead.
        Template::from_layouts(vec![
            crate::pptx::LayoutInfo::default(),
            crate::pptx::LayoutInfo {
                name: "Title Only".into(),
                placeholders: vec![Placeholder {
                    kind: "title".into(),
                    idx: None,
                    rect: None,
                }],
                shapes: vec![],
            },
        ])
    }

    fn lead_template() -> Template {
        Template::from_layouts(vec![
            crate::pptx::LayoutInfo::default(),
            crate::pptx::LayoutInfo {
                name: "Content with Lead".into(),
                placeholders: vec![
                    Placeholder {
                        kind: "title".into(),
                        idx: None,
                        rect: None,
                    },
                    Placeholder {
                        kind: "body".into(),
                        idx: Some(1),
                        rect: None,
                    },
                ],
                shapes: vec![LayoutShape {
                    name: "Lead".into(),
                    rect: Some(Rect::new(457_200, 1_500_000, 8_229_600, 600_000)),
                }],
            },
        ])
    }

    fn table_slide() -> SlideContent {
        let mut content = SlideContent::new("Tables", 1);
        content.add_element(Element::Table {
            headers: vec!["H1".into(), "H2".into()],
            rows: vec![
                vec!["a".into(), "b".into()],
                vec!["c".into(), "d".into()],
            ],
        });
        content
    }

    #[test]
    fn test_title_slide_uses_first_paragraph_as_subtitle() {
        let mut builder = SlideBuilder::new(Template::default());
        let mut content = SlideContent::new("Deck", 0);
        content.add_element(Element::List {
            kind: ListKind::Unordered,
            items: vec!["not a subtitle".into()],
        });
        content.add_element(Element::Paragraph {
            text: "The subtitle".into(),
        });
        content.add_element(Element::Paragraph {
            text: "Ignored second paragraph".into(),
        });
        content.set_notes("Deck");

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        let xml = slide.to_xml(&[]).unwrap();
        assert!(xml.contains(r#"<p:ph type="ctrTitle"/>"#));
        assert!(xml.contains("<a:t>The subtitle</a:t>"));
        assert!(!xml.contains("Ignored second paragraph"));
        assert!(slide.has_notes());
    }

    #[test]
    fn test_placeholder_mode_skips_table_without_error() {
        let mut builder = SlideBuilder::new(Template::default());
        builder.place(&table_slide(), &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        // Title placeholder + body placeholder, no table shape.
        assert_eq!(slide.shape_count(), 2);
        let xml = slide.to_xml(&[]).unwrap();
        assert!(!xml.contains("<a:tbl>"));
    }

    #[test]
    fn test_freeform_mode_renders_table_grid() {
        let mut builder = SlideBuilder::new(freeform_template());
        builder.place(&table_slide(), &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        let xml = slide.to_xml(&[]).unwrap();
        // Header row + 2 data rows, 2 columns.
        assert_eq!(xml.matches("<a:tr ").count(), 3);
        assert_eq!(xml.matches("<a:gridCol ").count(), 2);
    }

    #[test]
    fn test_freeform_table_with_no_rows_renders_nothing() {
        let mut builder = SlideBuilder::new(freeform_template());
        let mut content = SlideContent::new("Empty table", 1);
        content.add_element(Element::Table {
            headers: vec!["H1".into()],
            rows: vec![],
        });
        content.add_element(Element::Paragraph { text: "after".into() });

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        let xml = slide.to_xml(&[]).unwrap();
        assert!(!xml.contains("<a:tbl>"));
        // The paragraph still lands at the untouched flow cursor.
        assert!(xml.contains(&format!(r#"<a:off x="{LEFT_MARGIN}" y="{FREEFORM_TOP}"/>"#)));
    }

    #[test]
    fn test_freeform_flow_advances_cursor() {
        let mut builder = SlideBuilder::new(freeform_template());
        let mut content = SlideContent::new("Flow", 1);
        content.add_element(Element::Paragraph { text: "first".into() });
        content.add_element(Element::Paragraph { text: "second".into() });

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        let xml = slide.to_xml(&[]).unwrap();
        let second_top = FREEFORM_TOP + TEXT_BOX_HEIGHT + ELEMENT_GAP;
        assert!(xml.contains(&format!(r#"<a:off x="{LEFT_MARGIN}" y="{FREEFORM_TOP}"/>"#)));
        assert!(xml.contains(&format!(r#"<a:off x="{LEFT_MARGIN}" y="{second_top}"/>"#)));
    }

    #[test]
    fn test_lead_text_binds_to_named_shape() {
        let mut builder = SlideBuilder::new(lead_template());
        let mut content = SlideContent::new("With lead", 1);
        content.lead_text = Some("A lead line".into());

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        assert!(slide.shapes().iter().any(|s| s.name() == "Lead"));
        let xml = slide.to_xml(&[]).unwrap();
        assert!(xml.contains("<a:t>A lead line</a:t>"));
    }

    #[test]
    fn test_lead_text_without_lead_shape_is_skipped() {
        let mut builder = SlideBuilder::new(Template::default());
        let mut content = SlideContent::new("No lead shape", 1);
        content.lead_text = Some("dropped".into());

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        assert!(slide.shapes().iter().all(|s| s.name() != "Lead"));
    }

    #[test]
    fn test_missing_image_skips_and_preserves_cursor() {
        let mut builder = SlideBuilder::new(freeform_template());
        let mut content = SlideContent::new("Missing image", 1);
        content.add_element(Element::Image {
            path: "does-not-exist-9f2a.png".into(),
            alt: "nope".into(),
        });
        content.add_element(Element::Paragraph { text: "after".into() });

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        assert_eq!(slide.picture_payloads().len(), 0);
        let xml = slide.to_xml(&[]).unwrap();
        assert!(xml.contains(&format!(r#"<a:off x="{LEFT_MARGIN}" y="{FREEFORM_TOP}"/>"#)));
    }

    #[test]
    fn test_picture_scaled_to_content_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        image::RgbaImage::new(200, 100).save(&path).unwrap();

        let mut builder = SlideBuilder::new(freeform_template());
        let mut content = SlideContent::new("Image", 1);
        content.add_element(Element::Image {
            path: path.to_string_lossy().into_owned(),
            alt: "wide".into(),
        });

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        assert_eq!(slide.picture_payloads().len(), 1);
        let xml = slide.to_xml(&[String::from("rId2")]).unwrap();
        let expected_height = CONTENT_WIDTH / 2;
        assert!(xml.contains(&format!(r#"<a:ext cx="{CONTENT_WIDTH}" cy="{expected_height}"/>"#)));
    }

    #[test]
    fn test_diagram_renders_from_cache_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.png");
        image::RgbaImage::new(100, 100).save(&path).unwrap();

        let mut cache = ImageCache::new();
        cache.insert("graph TD", path);

        let mut builder = SlideBuilder::new(freeform_template());
        let mut content = SlideContent::new("Diagrams", 1);
        content.add_element(Element::Diagram {
            source: "graph TD".into(),
        });
        content.add_element(Element::Diagram {
            source: "not rendered".into(),
        });

        builder.place(&content, &cache);

        let slide = &builder.presentation().slides()[0];
        assert_eq!(slide.picture_payloads().len(), 1);
    }

    #[test]
    fn test_placeholder_mode_list_and_code_formatting() {
        let mut builder = SlideBuilder::new(Template::default());
        let mut content = SlideContent::new("Mixed", 1);
        content.add_element(Element::List {
            kind: ListKind::Ordered,
            items: vec!["first".into(), "second".into()],
        });
        content.add_element(Element::CodeBlock {
            language: "rust".into(),
            source: "fn main() {}".into(),
        });

        builder.place(&content, &ImageCache::new());

        let slide = &builder.presentation().slides()[0];
        let xml = slide.to_xml(&[]).unwrap();
        assert!(xml.contains("<a:t>1. first</a:t>"));
        assert!(xml.contains("<a:t>2. second</a:t>"));
        assert!(xml.contains(r#"<a:pPr lvl="1"/>"#));
        assert!(xml.contains(r#"<a:latin typeface="Consolas"/>"#));
        assert!(xml.contains(r#"sz="1000""#));
    }
}
