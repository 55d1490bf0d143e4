use serde::{Deserialize, Serialize};

use crate::{analysis::normalize_timestamps, AudioAnalysis, Result, ShortsError};

/// Anchors later than this are too late to count as "the start of the audio",
/// so the timeline gets an explicit 0.0 in front of them.
const START_TOLERANCE: f64 = 0.1;

/// Merged, de-duplicated and minimum-spaced anchor timestamps for one audio
/// asset. Always strictly increasing and starting at or before 0.1s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    anchors: Vec<f64>,
}

impl Timeline {
    pub fn anchors(&self) -> &[f64] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Builds the timeline for `analysis`; see [`build_timeline`].
    pub fn from_analysis(analysis: &AudioAnalysis, min_interval: f64) -> Result<Self> {
        build_timeline(
            &analysis.beats,
            &analysis.onsets,
            analysis.duration,
            min_interval,
        )
    }
}

/// Merges beat and onset timestamps into a single timeline.
///
/// Candidates are sorted and de-duplicated, then walked once: a timestamp is
/// kept only when it lies at least `min_interval` after the last kept one, so
/// the first member of a cluster wins. Candidates outside `[0,
/// total_duration)` are ignored. When nothing lands within 0.1s of the start,
/// the walk is seeded with 0.0.
pub fn build_timeline(
    beats: &[f64],
    onsets: &[f64],
    total_duration: f64,
    min_interval: f64,
) -> Result<Timeline> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(ShortsError::InvalidAnalysis(format!(
            "total duration {total_duration} must be a positive number of seconds"
        )));
    }
    if !min_interval.is_finite() || min_interval < 0.0 {
        return Err(ShortsError::InvalidConfig(format!(
            "minimum scene interval {min_interval} must be a non-negative number"
        )));
    }

    let merged: Vec<f64> = beats.iter().chain(onsets).copied().collect();
    let mut candidates = normalize_timestamps(&merged, total_duration);
    if candidates.first().map_or(true, |first| *first > START_TOLERANCE) {
        candidates.insert(0, 0.0);
    }

    let mut anchors: Vec<f64> = Vec::with_capacity(candidates.len());
    for time in candidates {
        let spaced = anchors
            .last()
            .map_or(true, |last| time - last >= min_interval);
        if spaced {
            anchors.push(time);
        }
    }

    tracing::debug!(
        candidates = beats.len() + onsets.len(),
        anchors = anchors.len(),
        min_interval,
        "built rhythm timeline"
    );

    Ok(Timeline { anchors })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_and_spaces_beats_and_onsets() {
        let beats = [0.0, 1.0, 2.0, 3.0];
        let onsets = [0.2, 1.0, 1.6, 2.2, 3.9];
        let timeline = build_timeline(&beats, &onsets, 5.0, 0.5).unwrap();
        assert_eq!(timeline.anchors(), &[0.0, 1.0, 1.6, 2.2, 3.0, 3.9]);
    }

    #[test]
    fn first_candidate_in_a_cluster_wins() {
        let timeline = build_timeline(&[1.0, 1.3, 1.45], &[1.2], 4.0, 0.5).unwrap();
        assert_eq!(timeline.anchors(), &[0.0, 1.0]);
    }

    #[test]
    fn spacing_is_measured_from_the_last_kept_anchor() {
        // 1.4 is 0.4 after 1.0 (dropped) but 1.8 is 0.8 after it (kept),
        // even though it is only 0.4 after the raw predecessor.
        let timeline = build_timeline(&[1.0, 1.4, 1.8], &[], 3.0, 0.5).unwrap();
        assert_eq!(timeline.anchors(), &[0.0, 1.0, 1.8]);
    }

    #[test]
    fn prepends_zero_when_audio_starts_late_or_is_empty() {
        let late = build_timeline(&[0.8, 2.0], &[], 4.0, 0.5).unwrap();
        assert_eq!(late.anchors(), &[0.0, 0.8, 2.0]);

        let empty = build_timeline(&[], &[], 4.0, 0.5).unwrap();
        assert_eq!(empty.anchors(), &[0.0]);

        let early = build_timeline(&[0.05, 1.0], &[], 4.0, 0.5).unwrap();
        assert_eq!(early.anchors(), &[0.05, 1.0]);
    }

    #[test]
    fn seeded_zero_keeps_minimum_spacing() {
        let timeline = build_timeline(&[0.3, 0.9], &[], 4.0, 0.5).unwrap();
        assert_eq!(timeline.anchors(), &[0.0, 0.9]);
    }

    #[test]
    fn output_is_strictly_sorted_and_spaced() {
        let beats: Vec<f64> = (0..40).map(|i| f64::from(i) * 0.37).collect();
        let onsets: Vec<f64> = (0..25).map(|i| 14.0 - f64::from(i) * 0.53).collect();
        let min_interval = 0.6;
        let timeline = build_timeline(&beats, &onsets, 15.0, min_interval).unwrap();

        assert!(timeline.anchors()[0] <= START_TOLERANCE);
        for pair in timeline.anchors().windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] >= min_interval);
        }
    }

    #[test]
    fn ignores_anchors_past_the_end() {
        let timeline = build_timeline(&[0.0, 2.0, 6.0], &[5.0], 5.0, 0.5).unwrap();
        assert_eq!(timeline.anchors(), &[0.0, 2.0]);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            build_timeline(&[], &[], 0.0, 0.5),
            Err(ShortsError::InvalidAnalysis(_))
        ));
        assert!(matches!(
            build_timeline(&[], &[], 3.0, -1.0),
            Err(ShortsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn builds_from_analysis() {
        let analysis = AudioAnalysis::new(6.0, vec![0.0, 2.0, 4.0], vec![2.2, 5.0]);
        let timeline = Timeline::from_analysis(&analysis, 0.5).unwrap();
        assert_eq!(timeline.anchors(), &[0.0, 2.0, 4.0, 5.0]);
    }
}
