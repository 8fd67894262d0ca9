use crate::objects::{Dictionary, Object};

/// Standard Type 1 fonts every conforming reader provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    /// Helvetica (sans-serif)
    Helvetica,
    /// Helvetica Bold
    HelveticaBold,
    /// Times Roman (serif)
    TimesRoman,
    /// Times Bold
    TimesBold,
    /// Courier (monospace)
    Courier,
}

impl Font {
    /// Get the PDF name for this font
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
            Font::TimesRoman => "Times-Roman",
            Font::TimesBold => "Times-Bold",
            Font::Courier => "Courier",
        }
    }

    /// Font dictionary for the page's `/Font` resources.
    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("Font"));
        dict.set("Subtype", Object::name("Type1"));
        dict.set("BaseFont", Object::name(self.pdf_name()));
        dict.set("Encoding", Object::name("WinAnsiEncoding"));
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_names() {
        assert_eq!(Font::Helvetica.pdf_name(), "Helvetica");
        assert_eq!(Font::HelveticaBold.pdf_name(), "Helvetica-Bold");
        assert_eq!(Font::TimesRoman.pdf_name(), "Times-Roman");
    }

    #[test]
    fn test_font_dict() {
        let dict = Font::HelveticaBold.to_dict();
        assert_eq!(dict.get_name("Subtype"), Some("Type1"));
        assert_eq!(dict.get_name("BaseFont"), Some("Helvetica-Bold"));
        assert_eq!(dict.get_name("Encoding"), Some("WinAnsiEncoding"));
    }
}
