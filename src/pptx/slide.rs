//! Output slide assembly and XML generation.

use std::fmt::Write as FmtWrite;

use crate::common::Result;
use crate::common::xml::escape_xml;

use super::shape::{ImageFormat, Rect, Shape, ShapeKind, TextFrame};

/// A slide being written into a presentation package.
///
/// Created through [`Presentation::add_slide`](super::Presentation::add_slide);
/// its placeholder bindings inherit position and formatting from the layout
/// it was instantiated from.
#[derive(Debug, Clone)]
pub struct Slide {
    pub(crate) slide_id: u32,
    pub(crate) layout_index: usize,
    pub(crate) shapes: Vec<Shape>,
    pub(crate) notes: Option<String>,
}

impl Slide {
    pub(crate) fn new(slide_id: u32, layout_index: usize) -> Self {
        Self {
            slide_id,
            layout_index,
            shapes: Vec::new(),
            notes: None,
        }
    }

    /// Index of the layout this slide was instantiated from.
    pub fn layout_index(&self) -> usize {
        self.layout_index
    }

    /// Bind the title placeholder.
    ///
    /// Slides on the title layout use the centered-title placeholder kind;
    /// everything else uses the plain title kind.
    pub fn set_title(&mut self, title: &str) {
        let ph_type = if self.layout_index == 0 { "ctrTitle" } else { "title" };
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::new(
            shape_id,
            "Title 1",
            ShapeKind::Placeholder {
                ph_type,
                idx: None,
                frame: TextFrame::from_text(title),
            },
        ));
    }

    /// Bind the subtitle placeholder (ordinal 1 on the title layout).
    pub fn set_subtitle(&mut self, subtitle: &str) {
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::new(
            shape_id,
            "Subtitle 2",
            ShapeKind::Placeholder {
                ph_type: "subTitle",
                idx: Some(1),
                frame: TextFrame::from_text(subtitle),
            },
        ));
    }

    /// Bind the body placeholder (ordinal 1 on the content layout) to a
    /// prepared text frame, replacing any text the placeholder carried.
    pub fn set_body(&mut self, frame: TextFrame) {
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::new(
            shape_id,
            "Content Placeholder 2",
            ShapeKind::Placeholder {
                ph_type: "body",
                idx: Some(1),
                frame,
            },
        ));
    }

    /// Add a text box at an explicit rectangle, auto-sized to its text.
    pub fn add_text_box(&mut self, frame: TextFrame, rect: Rect) {
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::new(
            shape_id,
            format!("Text Box {shape_id}"),
            ShapeKind::TextBox {
                rect,
                frame,
                auto_fit: true,
            },
        ));
    }

    /// Add a named text box, used for template-defined regions such as the
    /// "Lead" shape.
    pub fn add_named_text_box(&mut self, name: &str, frame: TextFrame, rect: Rect) {
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::new(
            shape_id,
            name,
            ShapeKind::TextBox {
                rect,
                frame,
                auto_fit: false,
            },
        ));
    }

    /// Add a picture from raw bytes.
    pub fn add_picture(
        &mut self,
        data: Vec<u8>,
        format: ImageFormat,
        rect: Rect,
        description: &str,
    ) {
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::new(
            shape_id,
            format!("Picture {shape_id}"),
            ShapeKind::Picture {
                data,
                format,
                rect,
                description: description.to_string(),
            },
        ));
    }

    /// Add a table. `data` is rows of cells, header row first; every row
    /// is rendered at `row_height` EMUs.
    pub fn add_table(&mut self, data: Vec<Vec<String>>, rect: Rect, row_height: i64) {
        let shape_id = self.next_shape_id();
        self.shapes.push(Shape::new(
            shape_id,
            format!("Table {shape_id}"),
            ShapeKind::Table {
                rect,
                data,
                row_height,
            },
        ));
    }

    /// Set speaker notes for the slide.
    pub fn set_notes(&mut self, notes: &str) {
        self.notes = Some(notes.to_string());
    }

    /// Check if the slide has speaker notes.
    pub fn has_notes(&self) -> bool {
        self.notes.is_some()
    }

    /// Get the number of shapes on the slide.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Shapes in insertion order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    // IDs: 1 = the root group shape, user shapes from 2.
    fn next_shape_id(&self) -> u32 {
        self.shapes.len() as u32 + 2
    }

    pub(crate) fn picture_payloads(&self) -> Vec<(&[u8], ImageFormat)> {
        self.shapes.iter().filter_map(Shape::image_payload).collect()
    }

    /// Generate slide XML. `image_rel_ids` holds one relationship id per
    /// picture shape, in insertion order.
    pub(crate) fn to_xml(&self, image_rel_ids: &[String]) -> Result<String> {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
        );
        xml.push_str(r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        xml.push_str("<p:cSld>");
        xml.push_str("<p:spTree>");
        xml.push_str("<p:nvGrpSpPr>");
        xml.push_str(r#"<p:cNvPr id="1" name=""/>"#);
        xml.push_str("<p:cNvGrpSpPr/>");
        xml.push_str("<p:nvPr/>");
        xml.push_str("</p:nvGrpSpPr>");
        xml.push_str("<p:grpSpPr>");
        xml.push_str("<a:xfrm>");
        xml.push_str(r#"<a:off x="0" y="0"/>"#);
        xml.push_str(r#"<a:ext cx="0" cy="0"/>"#);
        xml.push_str(r#"<a:chOff x="0" y="0"/>"#);
        xml.push_str(r#"<a:chExt cx="0" cy="0"/>"#);
        xml.push_str("</a:xfrm>");
        xml.push_str("</p:grpSpPr>");

        let mut image_counter = 0usize;
        for shape in &self.shapes {
            let rel_id = match shape.image_payload() {
                Some(_) => {
                    let id = image_rel_ids.get(image_counter).map(String::as_str);
                    image_counter += 1;
                    id
                }
                None => None,
            };
            shape.to_xml(&mut xml, rel_id)?;
        }

        xml.push_str("</p:spTree>");
        xml.push_str("</p:cSld>");
        xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
        xml.push_str("</p:sld>");

        Ok(xml)
    }

    /// Generate the notes slide XML, if notes are set.
    pub(crate) fn notes_xml(&self) -> Option<Result<String>> {
        let notes = self.notes.as_deref()?;

        let mut xml = String::with_capacity(2048);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<p:notes xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
        );
        xml.push_str(r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );

        xml.push_str("<p:cSld>");
        xml.push_str("<p:spTree>");
        xml.push_str("<p:nvGrpSpPr>");
        xml.push_str(r#"<p:cNvPr id="1" name=""/>"#);
        xml.push_str("<p:cNvGrpSpPr/>");
        xml.push_str("<p:nvPr/>");
        xml.push_str("</p:nvGrpSpPr>");
        xml.push_str("<p:grpSpPr>");
        xml.push_str("<a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>");
        xml.push_str("<a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm>");
        xml.push_str("</p:grpSpPr>");

        xml.push_str("<p:sp>");
        xml.push_str("<p:nvSpPr>");
        xml.push_str(r#"<p:cNvPr id="2" name="Notes Placeholder"/>"#);
        xml.push_str("<p:cNvSpPr><a:spLocks noGrp=\"1\"/></p:cNvSpPr>");
        xml.push_str("<p:nvPr><p:ph type=\"body\" idx=\"1\"/></p:nvPr>");
        xml.push_str("</p:nvSpPr>");
        xml.push_str("<p:spPr/>");
        xml.push_str("<p:txBody>");
        xml.push_str("<a:bodyPr/>");
        xml.push_str("<a:lstStyle/>");
        xml.push_str("<a:p>");
        xml.push_str("<a:r>");
        xml.push_str("<a:rPr lang=\"en-US\" dirty=\"0\"/>");
        if let Err(err) = write!(xml, "<a:t>{}</a:t>", escape_xml(notes)) {
            return Some(Err(err.into()));
        }
        xml.push_str("</a:r>");
        xml.push_str("</a:p>");
        xml.push_str("</p:txBody>");
        xml.push_str("</p:sp>");

        xml.push_str("</p:spTree>");
        xml.push_str("</p:cSld>");
        xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
        xml.push_str("</p:notes>");

        Some(Ok(xml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_placeholder_kind_depends_on_layout() {
        let mut title_slide = Slide::new(256, 0);
        title_slide.set_title("Deck");
        let xml = title_slide.to_xml(&[]).unwrap();
        assert!(xml.contains(r#"<p:ph type="ctrTitle"/>"#));

        let mut content_slide = Slide::new(257, 1);
        content_slide.set_title("Section");
        let xml = content_slide.to_xml(&[]).unwrap();
        assert!(xml.contains(r#"<p:ph type="title"/>"#));
    }

    #[test]
    fn test_shape_ids_are_unique_and_start_after_group() {
        let mut slide = Slide::new(256, 1);
        slide.set_title("T");
        slide.add_text_box(TextFrame::from_text("a"), Rect::new(0, 0, 10, 10));
        slide.add_text_box(TextFrame::from_text("b"), Rect::new(0, 20, 10, 10));

        let ids: Vec<u32> = slide.shapes().iter().map(|s| s.shape_id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_picture_rel_ids_assigned_in_order() {
        let mut slide = Slide::new(256, 1);
        slide.add_picture(
            vec![0x89, b'P', b'N', b'G'],
            ImageFormat::Png,
            Rect::new(0, 0, 10, 10),
            "first",
        );
        slide.add_picture(
            vec![0xFF, 0xD8, 0xFF],
            ImageFormat::Jpeg,
            Rect::new(0, 20, 10, 10),
            "second",
        );

        let xml = slide
            .to_xml(&["rId2".to_string(), "rId3".to_string()])
            .unwrap();
        let first = xml.find(r#"r:embed="rId2""#).unwrap();
        let second = xml.find(r#"r:embed="rId3""#).unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_notes_xml() {
        let mut slide = Slide::new(256, 1);
        slide.set_notes("Remember the demo");

        let xml = slide.notes_xml().unwrap().unwrap();
        assert!(xml.contains("<p:notes"));
        assert!(xml.contains("<a:t>Remember the demo</a:t>"));

        let without = Slide::new(257, 1);
        assert!(without.notes_xml().is_none());
    }
}
