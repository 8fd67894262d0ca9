//! Fixture layout loaded from JSON
//!
//! Every key is optional; anything missing falls back to the default layout
//! (US Letter page, `SignatureField1` and `SignatureField2`, the four
//! fixture paths of the signing SDK).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// `/Title` of every generated file
    pub title: String,
    pub page: PageConfig,
    /// First line of the page, in bold
    pub heading: String,
    /// Lines below the heading
    pub body: Vec<String>,
    /// Fields in the order they are added; the single-field variant uses the
    /// first, the multi-field variant all of them
    pub fields: Vec<FieldConfig>,
    pub outputs: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// `[left, bottom, right, top]` as fractions of the page width and height
    pub rect: [f64; 4],
    #[serde(default)]
    pub page: usize,
}

/// Destination paths per variant, relative to the output root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_field: Vec<PathBuf>,
    pub single_field: Vec<PathBuf>,
    pub multi_field: Vec<PathBuf>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            title: "CIE Mobile SDK - Documento di Test".to_string(),
            page: PageConfig::default(),
            heading: "CIE Mobile SDK - Documento di Test".to_string(),
            body: vec![
                "Questo PDF contiene un campo firma predefinito (SignatureField1).".to_string(),
                "Il rettangolo rosso indica il punto firma che verra' sostituito dalla grafica."
                    .to_string(),
                "La firma mock/real andr\u{e0} posizionata in quell'area.".to_string(),
            ],
            fields: vec![
                FieldConfig {
                    name: "SignatureField1".to_string(),
                    rect: [0.1, 0.1, 0.5, 0.22],
                    page: 0,
                },
                FieldConfig {
                    name: "SignatureField2".to_string(),
                    rect: [0.45, 0.55, 0.85, 0.67],
                    page: 0,
                },
            ],
            outputs: OutputConfig::default(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        // US Letter, one inch margin
        Self {
            width: 612.0,
            height: 792.0,
            margin: 72.0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_field: vec![PathBuf::from("cie_sign_sdk/data/fixtures/sample_no_field.pdf")],
            single_field: vec![
                PathBuf::from("cie_sign_flutter/example/assets/sample.pdf"),
                PathBuf::from("cie_sign_sdk/data/fixtures/sample.pdf"),
            ],
            multi_field: vec![PathBuf::from(
                "cie_sign_sdk/data/fixtures/sample_multi_field.pdf",
            )],
        }
    }
}

impl FieldConfig {
    /// The field rectangle in points on a `width` x `height` page.
    pub fn rect_on(&self, width: f64, height: f64) -> sigfield::Rectangle {
        let [left, bottom, right, top] = self.rect;
        sigfield::Rectangle::from_coords(left * width, bottom * height, right * width, top * height)
    }
}

impl FixtureConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
