use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{AspectRatio, ImageSize, NarrationPacing, Result, ShortsError, SyncStrategy};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    pub showcase: ShowcaseConfig,
}

impl AppConfig {
    /// Loads a JSON configuration file. Missing sections and fields fall back
    /// to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.audio.validate()?;
        self.showcase.validate(self.video.frame())
    }
}

/// Output frame and narration pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Seconds every narrated scene lasts before its text is counted.
    pub base_duration: f64,
    /// Extra seconds per narration character.
    pub duration_per_char: f64,
    /// How long the closing showcase scene lasts without rhythmic sync.
    pub final_scene_duration: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            base_duration: 1.5,
            duration_per_char: 0.08,
            final_scene_duration: 5.0,
        }
    }
}

impl VideoConfig {
    pub fn frame(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> Result<AspectRatio> {
        AspectRatio::new(self.width, self.height)
    }

    pub fn pacing(&self) -> NarrationPacing {
        NarrationPacing::new(self.base_duration, self.duration_per_char)
    }

    fn validate(&self) -> Result<()> {
        self.aspect_ratio()?;
        if self.fps == 0 {
            return Err(ShortsError::InvalidConfig("fps must be positive".into()));
        }
        ensure_seconds("video.base_duration", self.base_duration, true)?;
        ensure_seconds("video.duration_per_char", self.duration_per_char, false)?;
        ensure_seconds("video.final_scene_duration", self.final_scene_duration, true)
    }
}

/// Configuration specific to rhythmic synchronisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Whether scenes follow the music when an analysis is available.
    pub enabled: bool,
    pub sync_strategy: SyncStrategy,
    /// Anchors closer than this to the previous kept anchor are dropped.
    pub min_scene_interval: f64,
    /// No rhythm-driven scene is shorter than this.
    pub min_scene_duration: f64,
    /// Only the first `target_duration` seconds of audio are used.
    pub target_duration: Option<f64>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sync_strategy: SyncStrategy::Auto,
            min_scene_interval: 0.5,
            min_scene_duration: 0.5,
            target_duration: None,
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        ensure_seconds("audio.min_scene_interval", self.min_scene_interval, false)?;
        ensure_seconds("audio.min_scene_duration", self.min_scene_duration, true)?;
        if let Some(target) = self.target_duration {
            ensure_seconds("audio.target_duration", target, true)?;
        }
        Ok(())
    }
}

/// Layout of the closing scene that shows the whole artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub enabled: bool,
    /// Total horizontal margin around the artwork.
    pub padding: u32,
    /// Height reserved below the artwork for its caption.
    pub text_height: u32,
    /// Lines printed in the caption band, title first.
    pub caption: Vec<String>,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            padding: 200,
            text_height: 550,
            caption: Vec::new(),
        }
    }
}

impl ShowcaseConfig {
    fn validate(&self, frame: ImageSize) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.padding >= frame.width || self.text_height >= frame.height {
            return Err(ShortsError::InvalidConfig(format!(
                "showcase margins ({}px padding, {}px caption) do not fit a {frame} frame",
                self.padding, self.text_height
            )));
        }
        Ok(())
    }
}

fn ensure_seconds(name: &str, value: f64, strictly_positive: bool) -> Result<()> {
    let valid = value.is_finite() && if strictly_positive { value > 0.0 } else { value >= 0.0 };
    if valid {
        Ok(())
    } else {
        Err(ShortsError::InvalidConfig(format!(
            "{name} = {value} is not a valid number of seconds"
        )))
    }
}
