use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{FocusPoint, Result, ShortsError};

/// Narrated durations are rounded to tenths of a second.
const STEPS_PER_SECOND: f64 = 10.0;

/// One narrated scene as returned by the image-understanding step: the line
/// of narration and where to zoom while it plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    /// Scene number assigned upstream (usually 1-based).
    pub scene: usize,
    pub text: String,
    #[serde(flatten)]
    pub focus: FocusPoint,
}

impl SceneDescriptor {
    pub fn new(scene: usize, text: impl Into<String>, focus: FocusPoint) -> Self {
        Self {
            scene,
            text: text.into(),
            focus,
        }
    }
}

/// Reads the JSON array of `{scene, x, y, zoom, text}` records.
pub fn load_scene_descriptors(path: impl AsRef<Path>) -> Result<Vec<SceneDescriptor>> {
    let raw = fs::read_to_string(path)?;
    let scenes: Vec<SceneDescriptor> = serde_json::from_str(&raw)?;
    Ok(scenes)
}

/// Splits a narration script into scenes, one per non-blank line.
fn parse_narration(script: &str) -> Result<Vec<String>> {
    let scenes: Vec<String> = script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if scenes.is_empty() {
        return Err(ShortsError::msg("narration script contains no scenes"));
    }
    Ok(scenes)
}

/// Reads a narration script, one scene per non-blank line.
pub fn load_narration(path: impl AsRef<Path>) -> Result<Vec<String>> {
    parse_narration(&fs::read_to_string(path)?)
}

/// Artist line used when only a title is known.
pub const DEFAULT_ARTIST: &str = "Unknown Artist";

/// Caption for the closing scene: the title, with underscores read as
/// spaces, followed by the artist.
pub fn artwork_caption(title: &str, artist: Option<&str>) -> Vec<String> {
    vec![
        title.replace('_', " "),
        artist.unwrap_or(DEFAULT_ARTIST).to_string(),
    ]
}

/// Parses caption lines from a JSON array such as
/// `["The Starry Night", "Vincent van Gogh", "1889, oil on canvas"]`.
pub fn parse_artwork_info(raw: &str) -> Result<Vec<String>> {
    let lines: Vec<String> = serde_json::from_str(raw)?;
    let lines: Vec<String> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        return Err(ShortsError::InvalidConfig(
            "artwork info must contain at least one line".into(),
        ));
    }
    Ok(lines)
}

/// Duration model used when scenes are not synchronised to music: a fixed
/// base plus a per-character reading allowance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NarrationPacing {
    pub base: f64,
    pub per_char: f64,
}

impl NarrationPacing {
    pub fn new(base: f64, per_char: f64) -> Self {
        Self { base, per_char }
    }

    /// Seconds to hold a scene narrating `text`, rounded to a tenth and
    /// never shorter than one tenth.
    pub fn duration_for(&self, text: &str) -> f64 {
        let chars = text.chars().count() as f64;
        let raw = self.base + chars * self.per_char;
        let rounded = (raw * STEPS_PER_SECOND).round() / STEPS_PER_SECOND;
        rounded.max(1.0 / STEPS_PER_SECOND)
    }
}
