//! Writing the current scene out as a PNG image or an SVG document.
//!
//! The SVG source is the single rendering; PNG export rasterizes it.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use resvg::{tiny_skia, usvg};

use crate::scene::reconciler::{NODE_HEIGHT, NODE_WIDTH, Scene};

const MARGIN: f64 = 20.0;
const LINK_COLOR: &str = "#999999";
const FONT_SIZE: f64 = 12.0;
const FONT_FAMILY: &str = "DejaVu Sans Mono, Liberation Mono, Menlo, Consolas, monospace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    /// `.svg` paths get a vector file, anything else a PNG.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Self::Svg,
            _ => Self::Png,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// SVG source for `scene`, cropped to its bounding box plus a margin.
/// Affordances are interactive controls and are left out.
pub fn render_svg(scene: &Scene) -> String {
    let (min, max) = scene.bounds().unwrap_or_default();
    let (ox, oy) = (min.x - MARGIN, min.y - MARGIN);
    let width = max.x - min.x + 2.0 * MARGIN;
    let height = max.y - min.y + 2.0 * MARGIN;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="{ox:.1} {oy:.1} {width:.1} {height:.1}">"#
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="{ox:.1}" y="{oy:.1}" width="{width:.1}" height="{height:.1}" fill="white"/>"#
    );

    svg.push_str("  <g class=\"links\">\n");
    for link in scene.links() {
        let _ = writeln!(
            svg,
            r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{LINK_COLOR}" stroke-width="1.5"/>"#,
            link.from.x, link.from.y, link.to.x, link.to.y
        );
    }
    svg.push_str("  </g>\n");

    svg.push_str("  <g class=\"nodes\">\n");
    for el in scene.nodes() {
        let p = el.position;
        let label = el.label_origin();
        let _ = writeln!(svg, r#"    <g id="{}">"#, escape(el.node.as_str()));
        let _ = writeln!(svg, "      <title>{}</title>", escape(&el.title));
        let _ = writeln!(
            svg,
            r#"      <rect x="{:.1}" y="{:.1}" width="{NODE_WIDTH}" height="{NODE_HEIGHT}" rx="6" fill="{}"/>"#,
            p.x,
            p.y,
            el.fill.hex()
        );
        let _ = writeln!(
            svg,
            r#"      <text x="{:.1}" y="{:.1}" font-family="{FONT_FAMILY}" font-size="{FONT_SIZE}" fill="white">{}</text>"#,
            label.x,
            label.y + FONT_SIZE / 3.0,
            escape(&el.label)
        );
        svg.push_str("    </g>\n");
    }
    svg.push_str("  </g>\n</svg>\n");
    svg
}

/// Rasterize `scene` at one pixel per world unit and encode it as PNG.
pub fn render_png(scene: &Scene) -> Result<Vec<u8>> {
    let mut fonts = usvg::fontdb::Database::new();
    fonts.load_system_fonts();
    let options = usvg::Options {
        fontdb: Arc::new(fonts),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&render_svg(scene), &options)
        .context("failed to parse rendered svg")?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .context("export image has no area")?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap.encode_png().context("failed to encode png")
}

/// Write `scene` to `path` in the format its extension selects.
pub fn export(scene: &Scene, path: &Path) -> Result<ExportFormat> {
    let format = ExportFormat::for_path(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let bytes = match format {
        ExportFormat::Png => render_png(scene)?,
        ExportFormat::Svg => render_svg(scene).into_bytes(),
    };
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(format)
}
