//! The mutable output presentation.

use std::path::Path;

use log::info;

use crate::common::Result;

use super::package;
use super::slide::Slide;
use super::template::{LayoutInfo, Template};

/// A presentation being written, optionally backed by a template.
///
/// # Examples
///
/// ```rust
/// use longan::pptx::Presentation;
///
/// let mut pres = Presentation::new();
/// let slide = pres.add_slide(0);
/// slide.set_title("Hello");
/// assert_eq!(pres.slide_count(), 1);
/// ```
#[derive(Debug)]
pub struct Presentation {
    template: Template,
    slides: Vec<Slide>,
    /// Slide width in EMUs (914400 EMU = 1 inch).
    slide_width: i64,
    /// Slide height in EMUs.
    slide_height: i64,
}

impl Presentation {
    /// Create a presentation with the built-in default layouts.
    ///
    /// Default size is 10" x 7.5" (standard 4:3 aspect ratio).
    pub fn new() -> Self {
        Self::with_template(Template::default())
    }

    /// Create a presentation backed by a template file.
    pub fn from_template<P: AsRef<Path>>(path: P) -> Result<Self> {
        let template = Template::open(path.as_ref())?;
        info!(
            "loaded template {} with {} layout(s)",
            path.as_ref().display(),
            template.layout_count()
        );
        Ok(Self::with_template(template))
    }

    /// Create a presentation from an already-opened template.
    pub fn with_template(template: Template) -> Self {
        Self {
            template,
            slides: Vec::new(),
            slide_width: 9_144_000,
            slide_height: 6_858_000,
        }
    }

    /// The backing template (or default layouts).
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Look up a layout's scanned inventory by index.
    pub fn layout(&self, index: usize) -> Option<&LayoutInfo> {
        self.template.layout(index)
    }

    /// Append a slide instantiated from the given layout index.
    pub fn add_slide(&mut self, layout_index: usize) -> &mut Slide {
        let slide_id = (self.slides.len() + 256) as u32;
        self.slides.push(Slide::new(slide_id, layout_index));
        self.slides.last_mut().expect("slide was just pushed")
    }

    /// Slides in insertion order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Get the number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Get the slide width in EMUs.
    pub fn slide_width(&self) -> i64 {
        self.slide_width
    }

    /// Get the slide height in EMUs.
    pub fn slide_height(&self) -> i64 {
        self.slide_height
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        package::to_bytes(self)
    }

    /// Persist the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        package::write(self, path)
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::shape::{Rect, TextFrame};
    use std::io::Read;

    #[test]
    fn test_add_slide_assigns_ids() {
        let mut pres = Presentation::new();
        pres.add_slide(0);
        pres.add_slide(1);

        assert_eq!(pres.slide_count(), 2);
        assert_eq!(pres.slides()[0].slide_id, 256);
        assert_eq!(pres.slides()[1].slide_id, 257);
        assert_eq!(pres.slides()[1].layout_index(), 1);
    }

    #[test]
    fn test_default_layouts_available() {
        let pres = Presentation::new();
        assert!(pres.layout(0).is_some());
        assert!(pres.layout(1).is_some());
        assert!(pres.layout(2).is_none());
    }

    #[test]
    fn test_package_round_trip() {
        let mut pres = Presentation::new();
        let slide = pres.add_slide(0);
        slide.set_title("Round Trip");
        slide.set_notes("note text");
        let slide = pres.add_slide(1);
        slide.set_title("Content");
        slide.add_text_box(TextFrame::from_text("body"), Rect::new(0, 0, 100, 100));

        let bytes = pres.to_bytes().unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"_rels/.rels".to_string()));
        assert!(names.contains(&"ppt/presentation.xml".to_string()));
        assert!(names.contains(&"ppt/slides/slide1.xml".to_string()));
        assert!(names.contains(&"ppt/slides/slide2.xml".to_string()));
        assert!(names.contains(&"ppt/notesSlides/notesSlide1.xml".to_string()));
        assert!(names.contains(&"ppt/slideLayouts/slideLayout2.xml".to_string()));

        let mut presentation_xml = String::new();
        archive
            .by_name("ppt/presentation.xml")
            .unwrap()
            .read_to_string(&mut presentation_xml)
            .unwrap();
        assert!(presentation_xml.contains("<p:sldIdLst>"));
        assert!(presentation_xml.contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pptx");

        let mut pres = Presentation::new();
        pres.add_slide(0).set_title("Saved");
        pres.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // ZIP local file header signature.
        assert_eq!(&bytes[..2], b"PK");
    }
}
