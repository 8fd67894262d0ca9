mod encoding;
mod font;

pub use encoding::encode_win_ansi;
pub use font::Font;

use crate::graphics::Color;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Builds the text part of a page's content stream.
#[derive(Clone, Debug)]
pub struct TextContext {
    operations: String,
    current_font: Font,
    font_size: f64,
    fill_color: Color,
    position: (f64, f64),
    used_fonts: BTreeSet<Font>,
}

impl Default for TextContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TextContext {
    pub fn new() -> Self {
        Self {
            operations: String::new(),
            current_font: Font::Helvetica,
            font_size: 12.0,
            fill_color: Color::black(),
            position: (0.0, 0.0),
            used_fonts: BTreeSet::new(),
        }
    }

    pub fn set_font(&mut self, font: Font, size: f64) -> &mut Self {
        self.current_font = font;
        self.font_size = size;
        self
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.fill_color = color;
        self
    }

    pub fn at(&mut self, x: f64, y: f64) -> &mut Self {
        self.position = (x, y);
        self
    }

    /// Show `text` at the current position as one `BT ... ET` block.
    pub fn write(&mut self, text: &str) -> &mut Self {
        self.used_fonts.insert(self.current_font);

        self.operations.push_str("BT\n");
        let _ = writeln!(
            self.operations,
            "/{} {} Tf",
            self.current_font.pdf_name(),
            self.font_size
        );
        self.operations.push_str(&self.fill_color.fill_operator());
        self.operations.push('\n');
        let _ = writeln!(
            self.operations,
            "{:.2} {:.2} Td",
            self.position.0, self.position.1
        );

        self.operations.push('(');
        for byte in encode_win_ansi(text) {
            match byte {
                b'(' => self.operations.push_str("\\("),
                b')' => self.operations.push_str("\\)"),
                b'\\' => self.operations.push_str("\\\\"),
                b'\n' => self.operations.push_str("\\n"),
                b'\r' => self.operations.push_str("\\r"),
                b'\t' => self.operations.push_str("\\t"),
                0x20..=0x7E => self.operations.push(byte as char),
                _ => {
                    let _ = write!(self.operations, "\\{byte:03o}");
                }
            }
        }
        self.operations.push_str(") Tj\n");
        self.operations.push_str("ET\n");
        self
    }

    /// Write and move the position down one line.
    pub fn write_line(&mut self, text: &str) -> &mut Self {
        self.write(text);
        self.position.1 -= self.font_size * 1.2;
        self
    }

    /// Fonts used so far, for the page's `/Font` resources.
    pub fn used_fonts(&self) -> impl Iterator<Item = Font> + '_ {
        self.used_fonts.iter().copied()
    }

    pub fn operations(&self) -> &str {
        &self.operations
    }

    pub(crate) fn generate_operations(&self) -> Vec<u8> {
        self.operations.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_emits_text_block() {
        let mut ctx = TextContext::new();
        ctx.set_font(Font::HelveticaBold, 22.0)
            .at(72.0, 720.0)
            .write("Documento di Test");

        let ops = ctx.operations();
        assert!(ops.starts_with("BT\n/Helvetica-Bold 22 Tf\n0.000 g\n72.00 720.00 Td\n"));
        assert!(ops.contains("(Documento di Test) Tj\nET\n"));
        assert_eq!(ctx.used_fonts().collect::<Vec<_>>(), vec![Font::HelveticaBold]);
    }

    #[test]
    fn test_write_escapes_and_encodes() {
        let mut ctx = TextContext::new();
        ctx.write("a(b)\\ and\u{e0}");
        assert!(ctx.operations().contains("(a\\(b\\)\\\\ and\\340) Tj"));
    }

    #[test]
    fn test_fill_color_is_applied() {
        let mut ctx = TextContext::new();
        ctx.set_fill_color(Color::red()).write("x");
        assert!(ctx.operations().contains("1.000 0.000 0.000 rg\n"));
    }

    #[test]
    fn test_write_line_advances() {
        let mut ctx = TextContext::new();
        ctx.set_font(Font::Helvetica, 10.0)
            .at(0.0, 100.0)
            .write_line("one")
            .write_line("two");
        assert!(ctx.operations().contains("0.00 100.00 Td"));
        assert!(ctx.operations().contains("0.00 88.00 Td"));
    }

    #[test]
    fn test_used_fonts_are_deduplicated() {
        let mut ctx = TextContext::new();
        ctx.write("a").write("b");
        ctx.set_font(Font::Courier, 9.0).write("c");
        assert_eq!(
            ctx.used_fonts().collect::<Vec<_>>(),
            vec![Font::Helvetica, Font::Courier]
        );
    }
}
