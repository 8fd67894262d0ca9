/// Represents a color in PDF documents.
///
/// Supports RGB, Grayscale, and CMYK color spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    /// RGB color (red, green, blue) with values from 0.0 to 1.0
    Rgb(f64, f64, f64),
    /// Grayscale color with value from 0.0 (black) to 1.0 (white)
    Gray(f64),
    /// CMYK color (cyan, magenta, yellow, key/black) with values from 0.0 to 1.0
    Cmyk(f64, f64, f64, f64),
}

impl Color {
    /// Creates an RGB color with values clamped to 0.0-1.0.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color::Rgb(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0))
    }

    /// Creates a grayscale color with value clamped to 0.0-1.0.
    pub fn gray(value: f64) -> Self {
        Color::Gray(value.clamp(0.0, 1.0))
    }

    /// Creates a CMYK color with values clamped to 0.0-1.0.
    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Color::Cmyk(
            c.clamp(0.0, 1.0),
            m.clamp(0.0, 1.0),
            y.clamp(0.0, 1.0),
            k.clamp(0.0, 1.0),
        )
    }

    pub fn black() -> Self {
        Color::Gray(0.0)
    }

    pub fn white() -> Self {
        Color::Gray(1.0)
    }

    pub fn red() -> Self {
        Color::Rgb(1.0, 0.0, 0.0)
    }

    pub fn blue() -> Self {
        Color::Rgb(0.0, 0.0, 1.0)
    }

    /// Content-stream operator selecting this color for fills (`rg`, `g`, `k`).
    pub fn fill_operator(&self) -> String {
        match *self {
            Color::Rgb(r, g, b) => format!("{r:.3} {g:.3} {b:.3} rg"),
            Color::Gray(g) => format!("{g:.3} g"),
            Color::Cmyk(c, m, y, k) => format!("{c:.3} {m:.3} {y:.3} {k:.3} k"),
        }
    }

    /// Content-stream operator selecting this color for strokes (`RG`, `G`, `K`).
    pub fn stroke_operator(&self) -> String {
        match *self {
            Color::Rgb(r, g, b) => format!("{r:.3} {g:.3} {b:.3} RG"),
            Color::Gray(g) => format!("{g:.3} G"),
            Color::Cmyk(c, m, y, k) => format!("{c:.3} {m:.3} {y:.3} {k:.3} K"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_clamp() {
        assert_eq!(Color::rgb(1.5, -0.2, 0.5), Color::Rgb(1.0, 0.0, 0.5));
        assert_eq!(Color::gray(2.0), Color::Gray(1.0));
        assert_eq!(Color::cmyk(0.1, 0.2, 1.3, -1.0), Color::Cmyk(0.1, 0.2, 1.0, 0.0));
    }

    #[test]
    fn test_operators() {
        assert_eq!(Color::red().fill_operator(), "1.000 0.000 0.000 rg");
        assert_eq!(Color::red().stroke_operator(), "1.000 0.000 0.000 RG");
        assert_eq!(Color::black().fill_operator(), "0.000 g");
        assert_eq!(Color::white().stroke_operator(), "1.000 G");
        assert_eq!(
            Color::cmyk(0.0, 0.5, 1.0, 0.25).fill_operator(),
            "0.000 0.500 1.000 0.250 k"
        );
    }
}
