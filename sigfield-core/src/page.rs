use crate::geometry::Rectangle;
use crate::graphics::GraphicsContext;
use crate::objects::{Dictionary, Object};
use crate::text::TextContext;

/// A single page under construction.
///
/// Pages have a size (width and height in points) and carry graphics and
/// text which become the page's content stream when the page is added to a
/// [`Document`](crate::Document).
///
/// # Example
///
/// ```rust
/// use sigfield::{Color, Font, Page};
///
/// let mut page = Page::letter();
///
/// page.text()
///     .set_font(Font::Helvetica, 12.0)
///     .at(72.0, 720.0)
///     .write("Hello World");
///
/// page.graphics()
///     .set_stroke_color(Color::red())
///     .rect(61.2, 79.2, 244.8, 95.04)
///     .stroke();
/// ```
#[derive(Clone, Debug)]
pub struct Page {
    width: f64,
    height: f64,
    graphics_context: GraphicsContext,
    text_context: TextContext,
}

impl Page {
    /// Creates a new page with the specified width and height in points.
    ///
    /// Points are 1/72 of an inch.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            graphics_context: GraphicsContext::new(),
            text_context: TextContext::new(),
        }
    }

    /// Creates a new A4 page (595 x 842 points).
    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }

    /// Creates a new US Letter page (612 x 792 points).
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Returns a mutable reference to the graphics context for drawing shapes.
    pub fn graphics(&mut self) -> &mut GraphicsContext {
        &mut self.graphics_context
    }

    /// Returns a mutable reference to the text context for adding text.
    pub fn text(&mut self) -> &mut TextContext {
        &mut self.text_context
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn media_box(&self) -> Rectangle {
        Rectangle::from_coords(0.0, 0.0, self.width, self.height)
    }

    /// Graphics operations followed by text operations.
    pub(crate) fn generate_content(&self) -> Vec<u8> {
        let mut content = self.graphics_context.generate_operations();
        content.extend_from_slice(&self.text_context.generate_operations());
        content
    }

    /// `/Resources` for the generated content: fonts and transparency states.
    pub(crate) fn resources(&self) -> Dictionary {
        let mut resources = Dictionary::new();

        let fonts: Dictionary = self
            .text_context
            .used_fonts()
            .map(|font| (font.pdf_name().to_string(), Object::Dictionary(font.to_dict())))
            .collect();
        if !fonts.is_empty() {
            resources.set("Font", fonts);
        }

        if self.graphics_context.uses_transparency() {
            let states: Dictionary = self
                .graphics_context
                .ext_g_states()
                .iter()
                .map(|(name, dict)| (name.clone(), Object::Dictionary(dict.clone())))
                .collect();
            resources.set("ExtGState", states);
        }

        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Color;
    use crate::text::Font;

    #[test]
    fn test_page_sizes() {
        let letter = Page::letter();
        assert_eq!((letter.width(), letter.height()), (612.0, 792.0));
        let a4 = Page::a4();
        assert_eq!((a4.width(), a4.height()), (595.0, 842.0));
        assert_eq!(
            letter.media_box(),
            Rectangle::from_coords(0.0, 0.0, 612.0, 792.0)
        );
    }

    #[test]
    fn test_empty_page_has_no_content() {
        let page = Page::letter();
        assert!(page.generate_content().is_empty());
        assert!(page.resources().is_empty());
    }

    #[test]
    fn test_content_puts_graphics_before_text() {
        let mut page = Page::letter();
        page.text().at(72.0, 720.0).write("Heading");
        page.graphics().rect(10.0, 10.0, 20.0, 20.0).stroke();

        let content = String::from_utf8(page.generate_content()).unwrap();
        let rect_at = content.find(" re\n").unwrap();
        let text_at = content.find("BT\n").unwrap();
        assert!(rect_at < text_at);
    }

    #[test]
    fn test_resources_list_fonts_and_states() {
        let mut page = Page::letter();
        page.text()
            .set_font(Font::HelveticaBold, 22.0)
            .write("a")
            .set_font(Font::Helvetica, 13.0)
            .write("b");
        page.graphics()
            .set_fill_color(Color::red())
            .set_fill_opacity(0.05)
            .rect(0.0, 0.0, 5.0, 5.0)
            .fill_stroke();

        let resources = page.resources();
        let fonts = resources.get_dict("Font").unwrap();
        assert_eq!(fonts.len(), 2);
        assert_eq!(
            fonts.get_dict("Helvetica-Bold").unwrap().get_name("BaseFont"),
            Some("Helvetica-Bold")
        );
        let states = resources.get_dict("ExtGState").unwrap();
        assert_eq!(states.get_dict("GS1").unwrap().get("ca"), Some(&Object::Real(0.05)));
    }
}
