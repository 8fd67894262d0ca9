//! Fixture generation: one rendered base page, three field variants

use crate::config::{FieldConfig, FixtureConfig};
use anyhow::{Context, Result};
use sigfield::{copy_pages, persist, BaseDocument, Color, Document, Font, Page};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Field layout of one output variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    NoField,
    SingleField,
    MultiField,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::NoField, Variant::SingleField, Variant::MultiField];

    pub fn label(self) -> &'static str {
        match self {
            Variant::NoField => "no_field",
            Variant::SingleField => "single_field",
            Variant::MultiField => "multi_field",
        }
    }

    fn fields(self, config: &FixtureConfig) -> &[FieldConfig] {
        match self {
            Variant::NoField => &[],
            Variant::SingleField => &config.fields[..config.fields.len().min(1)],
            Variant::MultiField => &config.fields,
        }
    }

    fn targets(self, config: &FixtureConfig) -> &[PathBuf] {
        match self {
            Variant::NoField => &config.outputs.no_field,
            Variant::SingleField => &config.outputs.single_field,
            Variant::MultiField => &config.outputs.multi_field,
        }
    }
}

/// Outcome of a `generate` run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Draws the fixture page: heading, body text and the placeholder box over
/// the first field with its labels.
pub fn base_page(config: &FixtureConfig) -> Page {
    let mut page = Page::new(config.page.width, config.page.height);
    let (width, height, margin) = (config.page.width, config.page.height, config.page.margin);

    page.text()
        .set_font(Font::HelveticaBold, 22.0)
        .at(margin, height - margin)
        .write(&config.heading);

    let text = page.text().set_font(Font::Helvetica, 13.0);
    let mut y = height - margin - 36.0;
    for line in &config.body {
        text.at(margin, y).write(line);
        y -= 18.0;
    }

    if let Some(field) = config.fields.first() {
        let area = field.rect_on(width, height);
        page.graphics()
            .save_state()
            .set_stroke_color(Color::red())
            .set_fill_color(Color::red())
            .set_fill_opacity(0.05)
            .set_line_width(3.0)
            .rect(area.left(), area.bottom(), area.width(), area.height())
            .fill_stroke()
            .restore_state();

        let [left, bottom, right, top] = field.rect;
        page.text()
            .set_font(Font::HelveticaBold, 14.0)
            .set_fill_color(Color::red())
            .at(area.left() + 10.0, area.top() - 24.0)
            .write(&format!("Area firma: {}", field.name));
        page.text()
            .set_font(Font::Helvetica, 12.0)
            .set_fill_color(Color::black())
            .at(area.left() + 10.0, area.top() - 44.0)
            .write(&format!(
                "Dimensioni: {:.0}% larghezza x {:.0}% altezza (pageIndex={}).",
                (right - left) * 100.0,
                (top - bottom) * 100.0,
                field.page
            ))
            .at(area.left() + 10.0, area.bottom() + 12.0)
            .write("L'immagine della firma verra' inserita qui dallo SDK.");
    }

    page
}

/// Renders the base document every variant is copied from.
pub fn build_base(config: &FixtureConfig) -> Result<BaseDocument> {
    BaseDocument::render([base_page(config)]).context("rendering base page")
}

/// Copies the base and adds the variant's fields.
pub fn build_variant(
    base: &BaseDocument,
    config: &FixtureConfig,
    variant: Variant,
) -> Result<Document> {
    let mut doc = copy_pages(base).context("copying base pages")?;
    doc.set_title(config.title.clone());

    for field in variant.fields(config) {
        let rect = field.rect_on(config.page.width, config.page.height);
        doc.add_signature_field(&field.name, rect, field.page)
            .with_context(|| format!("adding field {}", field.name))?;
        debug!(variant = variant.label(), field = %field.name, "added signature field");
    }
    Ok(doc)
}

/// Writes every variant to all of its targets under `root`.
///
/// A target that cannot be written is logged and recorded in the report; the
/// remaining targets are still written.
pub fn generate(config: &FixtureConfig, root: &Path) -> Result<GenerateReport> {
    let base = build_base(config)?;
    let mut report = GenerateReport::default();

    for variant in Variant::ALL {
        let targets = variant.targets(config);
        if targets.is_empty() {
            continue;
        }
        let bytes = build_variant(&base, config, variant)?
            .to_bytes()
            .with_context(|| format!("serializing {} variant", variant.label()))?;

        for target in targets {
            let path = root.join(target);
            match persist(&path, &bytes) {
                Ok(()) => {
                    info!(variant = variant.label(), path = %path.display(), "wrote fixture");
                    report.written.push(path);
                }
                Err(e) => {
                    error!(variant = variant.label(), path = %path.display(), error = %e, "failed to write fixture");
                    report.failed.push((path, e.to_string()));
                }
            }
        }
    }

    Ok(report)
}
