mod color;

pub use color::Color;

use crate::objects::{Dictionary, Object};
use std::fmt::Write;

/// Builds the path-drawing part of a page's content stream.
///
/// Transparency is expressed through named `ExtGState` resources (`/GS1`,
/// `/GS2`, ...) which the page lists in its resource dictionary.
#[derive(Clone, Debug)]
pub struct GraphicsContext {
    operations: String,
    fill_color: Color,
    stroke_color: Color,
    line_width: f64,
    fill_opacity: f64,
    stroke_opacity: f64,
    applied_opacity: (f64, f64),
    ext_g_states: Vec<(String, Dictionary)>,
}

impl Default for GraphicsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext {
    pub fn new() -> Self {
        Self {
            operations: String::new(),
            fill_color: Color::black(),
            stroke_color: Color::black(),
            line_width: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            applied_opacity: (1.0, 1.0),
            ext_g_states: Vec::new(),
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        let _ = writeln!(self.operations, "{x:.2} {y:.2} m");
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        let _ = writeln!(self.operations, "{x:.2} {y:.2} l");
        self
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        let _ = writeln!(self.operations, "{x:.2} {y:.2} {width:.2} {height:.2} re");
        self
    }

    pub fn close_path(&mut self) -> &mut Self {
        self.operations.push_str("h\n");
        self
    }

    pub fn stroke(&mut self) -> &mut Self {
        self.apply_opacity();
        self.apply_stroke_color();
        self.operations.push_str("S\n");
        self
    }

    pub fn fill(&mut self) -> &mut Self {
        self.apply_opacity();
        self.apply_fill_color();
        self.operations.push_str("f\n");
        self
    }

    pub fn fill_stroke(&mut self) -> &mut Self {
        self.apply_opacity();
        self.apply_fill_color();
        self.apply_stroke_color();
        self.operations.push_str("B\n");
        self
    }

    pub fn set_stroke_color(&mut self, color: Color) -> &mut Self {
        self.stroke_color = color;
        self
    }

    pub fn set_fill_color(&mut self, color: Color) -> &mut Self {
        self.fill_color = color;
        self
    }

    pub fn set_line_width(&mut self, width: f64) -> &mut Self {
        self.line_width = width;
        let _ = writeln!(self.operations, "{width:.2} w");
        self
    }

    /// Set the fill opacity (0.0 to 1.0)
    pub fn set_fill_opacity(&mut self, opacity: f64) -> &mut Self {
        self.fill_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Set the stroke opacity (0.0 to 1.0)
    pub fn set_stroke_opacity(&mut self, opacity: f64) -> &mut Self {
        self.stroke_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn save_state(&mut self) -> &mut Self {
        self.operations.push_str("q\n");
        self
    }

    /// Restores the saved state; opacity set since the save is dropped with it.
    pub fn restore_state(&mut self) -> &mut Self {
        self.operations.push_str("Q\n");
        self.applied_opacity = (1.0, 1.0);
        self
    }

    fn apply_stroke_color(&mut self) {
        self.operations.push_str(&self.stroke_color.stroke_operator());
        self.operations.push('\n');
    }

    fn apply_fill_color(&mut self) {
        self.operations.push_str(&self.fill_color.fill_operator());
        self.operations.push('\n');
    }

    /// Emit `/GSn gs` when the requested opacity differs from what is in effect.
    fn apply_opacity(&mut self) {
        let wanted = (self.fill_opacity, self.stroke_opacity);
        if wanted == self.applied_opacity {
            return;
        }

        let existing = self.ext_g_states.iter().find(|(_, dict)| {
            dict.get("ca").and_then(Object::as_real) == Some(wanted.0)
                && dict.get("CA").and_then(Object::as_real) == Some(wanted.1)
        });
        let name = match existing {
            Some((name, _)) => name.clone(),
            None => {
                let name = format!("GS{}", self.ext_g_states.len() + 1);
                let mut dict = Dictionary::new();
                dict.set("Type", Object::name("ExtGState"));
                dict.set("ca", wanted.0);
                dict.set("CA", wanted.1);
                self.ext_g_states.push((name.clone(), dict));
                name
            }
        };

        let _ = writeln!(self.operations, "/{name} gs");
        self.applied_opacity = wanted;
    }

    /// Check if transparency is used (opacity != 1.0)
    pub fn uses_transparency(&self) -> bool {
        !self.ext_g_states.is_empty()
    }

    /// `ExtGState` resource entries referenced by the operations.
    pub fn ext_g_states(&self) -> &[(String, Dictionary)] {
        &self.ext_g_states
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn fill_opacity(&self) -> f64 {
        self.fill_opacity
    }

    pub fn stroke_opacity(&self) -> f64 {
        self.stroke_opacity
    }

    pub fn operations(&self) -> &str {
        &self.operations
    }

    pub(crate) fn generate_operations(&self) -> Vec<u8> {
        self.operations.as_bytes().to_vec()
    }
}
