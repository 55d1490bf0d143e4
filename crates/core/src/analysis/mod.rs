use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Result, ShortsError};

/// Rhythm features of one audio asset, as produced by the external beat and
/// onset analyzer. Timestamps are in seconds from the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAnalysis {
    #[serde(alias = "duration_seconds")]
    pub duration: f64,
    #[serde(default, alias = "tempo")]
    pub tempo_bpm: Option<f64>,
    #[serde(default)]
    pub beats: Vec<f64>,
    #[serde(default)]
    pub onsets: Vec<f64>,
}

impl AudioAnalysis {
    pub fn new(duration: f64, beats: Vec<f64>, onsets: Vec<f64>) -> Self {
        Self {
            duration,
            tempo_bpm: None,
            beats,
            onsets,
        }
    }

    /// Rejects analyses whose duration or timestamps are not usable numbers.
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ShortsError::InvalidAnalysis(format!(
                "duration {} must be a positive number of seconds",
                self.duration
            )));
        }
        if let Some(bad) = self
            .beats
            .iter()
            .chain(&self.onsets)
            .find(|time| !time.is_finite())
        {
            return Err(ShortsError::InvalidAnalysis(format!(
                "timestamp {bad} is not finite"
            )));
        }
        Ok(())
    }

    /// Returns a copy with both timestamp lists sorted, de-duplicated and
    /// restricted to `[0, duration)`.
    pub fn normalized(&self) -> Self {
        Self {
            duration: self.duration,
            tempo_bpm: self.tempo_bpm,
            beats: normalize_timestamps(&self.beats, self.duration),
            onsets: normalize_timestamps(&self.onsets, self.duration),
        }
    }

    /// Caps the analysis at `target` seconds, discarding anchors at or past
    /// the new end. Targets longer than the audio leave it untouched.
    pub fn truncated(&self, target: f64) -> Self {
        if !target.is_finite() || target <= 0.0 || target >= self.duration {
            return self.clone();
        }

        let keep = |times: &[f64]| -> Vec<f64> {
            times.iter().copied().filter(|t| *t < target).collect()
        };
        Self {
            duration: target,
            tempo_bpm: self.tempo_bpm,
            beats: keep(&self.beats),
            onsets: keep(&self.onsets),
        }
    }
}

/// Sorts, de-duplicates and range-filters a raw timestamp list.
pub(crate) fn normalize_timestamps(times: &[f64], duration: f64) -> Vec<f64> {
    let mut kept: Vec<f64> = times
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0 && *t < duration)
        .collect();
    kept.sort_by(f64::total_cmp);
    kept.dedup();
    kept
}

/// Source of rhythm features for the coordinator. Real decoding and beat
/// tracking live outside this crate behind this seam.
pub trait RhythmAnalyzer {
    fn analyze(&self) -> Result<AudioAnalysis>;
}

/// Analysis computed ahead of time and persisted as JSON.
#[derive(Debug, Clone)]
pub struct AnalysisCache {
    path: PathBuf,
}

impl AnalysisCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists `analysis` so later runs can skip the analyzer.
    pub fn store(&self, analysis: &AudioAnalysis) -> Result<()> {
        let json = serde_json::to_string_pretty(analysis)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl RhythmAnalyzer for AnalysisCache {
    fn analyze(&self) -> Result<AudioAnalysis> {
        let raw = fs::read_to_string(&self.path)?;
        let analysis: AudioAnalysis = serde_json::from_str(&raw)?;
        analysis.validate()?;
        tracing::debug!(
            path = %self.path.display(),
            duration = analysis.duration,
            beats = analysis.beats.len(),
            onsets = analysis.onsets.len(),
            "loaded cached audio analysis"
        );
        Ok(analysis)
    }
}
