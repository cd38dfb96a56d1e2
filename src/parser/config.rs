//! Parser and writer for `.mindmap/config.mindmap`.
//!
//! The format is one `key: value` pair per line. Blank lines and `#`
//! comments are skipped and unknown keys are ignored, so older binaries can
//! read newer files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::layout::simulation::{
    DEFAULT_CHARGE, DEFAULT_COLLIDE_RADIUS, DEFAULT_LINK_DISTANCE, LayoutConfig,
};
use crate::scene::palette::Palette;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub palette: Palette,
    pub link_distance: f64,
    pub charge: f64,
    pub collide_radius: f64,
    /// Milliseconds between layout frames in the canvas.
    pub frame_ms: u64,
    pub confirm_remove: bool,
    pub confirm_clear: bool,
    /// Filter directive used when `MINDMAP_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            link_distance: DEFAULT_LINK_DISTANCE,
            charge: DEFAULT_CHARGE,
            collide_radius: DEFAULT_COLLIDE_RADIUS,
            frame_ms: 33,
            confirm_remove: true,
            confirm_clear: true,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            link_distance: self.link_distance,
            charge: self.charge,
            collide_radius: self.collide_radius,
            ..LayoutConfig::default()
        }
    }
}

/// What `mindmap init` writes. Equal to `serialize(&Config::default())`.
pub const DEFAULT_CONTENTS: &str = "\
# mindmap configuration
# Edit manually or run: mindmap setup

# Node color ramp
# Options: blue | green | purple | orange | gray
palette: blue

# Layout forces: target link length, node repulsion (negative pushes apart),
# and the minimum clearance radius around each node
link_distance: 140
charge: -60
collide_radius: 60

# Milliseconds between layout frames in `mindmap view`
frame_ms: 33

# Ask before deleting a node or clearing the whole map
confirm_remove: true
confirm_clear: true

# Log filter (overridden by MINDMAP_LOG), written to .mindmap/mindmap.log
log_level: warn
";

pub fn parse(input: &str) -> Result<Config> {
    let mut config = Config::default();
    for (idx, raw) in input.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            bail!("expected `key: value` at line {line_num}");
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "palette" => {
                config.palette = Palette::from_name(value).with_context(|| {
                    format!("unknown palette '{value}' at line {line_num}")
                })?;
            }
            "link_distance" => config.link_distance = parse_number(key, value, line_num)?,
            "charge" => config.charge = parse_number(key, value, line_num)?,
            "collide_radius" => config.collide_radius = parse_number(key, value, line_num)?,
            "frame_ms" => {
                config.frame_ms = value
                    .parse()
                    .with_context(|| format!("invalid frame_ms at line {line_num}"))?;
                if config.frame_ms == 0 {
                    bail!("frame_ms must be positive at line {line_num}");
                }
            }
            "confirm_remove" => config.confirm_remove = parse_bool(key, value, line_num)?,
            "confirm_clear" => config.confirm_clear = parse_bool(key, value, line_num)?,
            "log_level" => config.log_level = value.to_string(),
            _ => debug!(key, line = line_num, "ignoring unknown config key"),
        }
    }
    Ok(config)
}

fn parse_number(key: &str, value: &str, line_num: usize) -> Result<f64> {
    let n: f64 = value
        .parse()
        .with_context(|| format!("invalid {key} at line {line_num}"))?;
    if !n.is_finite() {
        bail!("{key} must be finite at line {line_num}");
    }
    Ok(n)
}

fn parse_bool(key: &str, value: &str, line_num: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => bail!("invalid {key} '{value}' at line {line_num} (expected true or false)"),
    }
}

pub fn serialize(config: &Config) -> String {
    format!(
        "\
# mindmap configuration
# Edit manually or run: mindmap setup

# Node color ramp
# Options: blue | green | purple | orange | gray
palette: {}

# Layout forces: target link length, node repulsion (negative pushes apart),
# and the minimum clearance radius around each node
link_distance: {}
charge: {}
collide_radius: {}

# Milliseconds between layout frames in `mindmap view`
frame_ms: {}

# Ask before deleting a node or clearing the whole map
confirm_remove: {}
confirm_clear: {}

# Log filter (overridden by MINDMAP_LOG), written to .mindmap/mindmap.log
log_level: {}
",
        config.palette.name(),
        config.link_distance,
        config.charge,
        config.collide_radius,
        config.frame_ms,
        config.confirm_remove,
        config.confirm_clear,
        config.log_level
    )
}

/// Read the config at `path`, falling back to defaults when it is missing.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid config in {}", path.display()))
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    fs::write(path, serialize(config)).with_context(|| format!("failed to write {}", path.display()))
}
