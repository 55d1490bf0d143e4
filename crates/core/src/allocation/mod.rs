use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{analysis::normalize_timestamps, AudioAnalysis, Result, ShortsError, Timeline};

/// Relative drift tolerated on the time axis, between consecutive scenes and
/// between the summed durations and the audio duration.
const SUM_TOLERANCE: f64 = 1e-9;

/// Which timestamp source drives scene boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// The merged, minimum-spaced [`Timeline`].
    #[default]
    Auto,
    /// Equal windows, ignoring rhythm entirely.
    Evenly,
    /// Raw beat timestamps.
    Beats,
    /// Raw onset timestamps.
    Onsets,
}

impl SyncStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Evenly => "evenly",
            Self::Beats => "beats",
            Self::Onsets => "onsets",
        }
    }
}

impl fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStrategy {
    type Err = ShortsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "evenly" => Ok(Self::Evenly),
            "beats" => Ok(Self::Beats),
            "onsets" => Ok(Self::Onsets),
            other => Err(ShortsError::InvalidConfig(format!(
                "unknown sync strategy `{other}` (expected auto, evenly, beats or onsets)"
            ))),
        }
    }
}

/// Start time and duration assigned to one scene, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneAllocation {
    pub scene_index: usize,
    pub start_time: f64,
    pub duration: f64,
}

impl SceneAllocation {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Why an allocation fell back to equal windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegradeReason {
    /// The chosen source holds fewer timestamps than there are scenes.
    InsufficientTimeline {
        strategy: SyncStrategy,
        available: usize,
        required: usize,
    },
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientTimeline {
                strategy,
                available,
                required,
            } => write!(
                f,
                "`{strategy}` source has {available} timestamps for {required} scenes, split evenly instead"
            ),
        }
    }
}

/// Result of [`allocate_scenes`]. A degraded outcome still carries valid,
/// contiguous allocations, but the caller has to acknowledge the reason.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationOutcome {
    Allocated(Vec<SceneAllocation>),
    Degraded {
        allocations: Vec<SceneAllocation>,
        reason: DegradeReason,
    },
}

impl AllocationOutcome {
    pub fn allocations(&self) -> &[SceneAllocation] {
        match self {
            Self::Allocated(allocations) | Self::Degraded { allocations, .. } => allocations,
        }
    }

    pub fn degrade_reason(&self) -> Option<&DegradeReason> {
        match self {
            Self::Allocated(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn into_allocations(self) -> Vec<SceneAllocation> {
        match self {
            Self::Allocated(allocations) | Self::Degraded { allocations, .. } => allocations,
        }
    }
}

/// Distributes `scene_count` scenes over the audio described by `analysis`.
///
/// Rhythm-driven strategies pick `scene_count` anchors spread evenly across
/// the source's index range, first and last included. Each scene runs until
/// the next anchor and the last one runs to the end of the audio. The first
/// scene always starts at 0.0 so the lead-in is covered. No scene gets less
/// than `min_scene_duration` unless the audio is too short to give every
/// scene that much, in which case the floor shrinks to an equal share.
///
/// Sources with fewer anchors than scenes degrade to equal windows.
pub fn allocate_scenes(
    scene_count: usize,
    timeline: &Timeline,
    analysis: &AudioAnalysis,
    strategy: SyncStrategy,
    min_scene_duration: f64,
) -> Result<AllocationOutcome> {
    let total = analysis.duration;
    if !total.is_finite() || total <= 0.0 {
        return Err(ShortsError::InvalidAnalysis(format!(
            "total duration {total} must be a positive number of seconds"
        )));
    }
    if !min_scene_duration.is_finite() || min_scene_duration <= 0.0 {
        return Err(ShortsError::InvalidConfig(format!(
            "minimum scene duration {min_scene_duration} must be positive"
        )));
    }
    if scene_count == 0 {
        return Ok(AllocationOutcome::Allocated(Vec::new()));
    }

    let source = match strategy {
        SyncStrategy::Evenly => {
            return Ok(AllocationOutcome::Allocated(split_evenly(scene_count, total)));
        }
        SyncStrategy::Auto => normalize_timestamps(timeline.anchors(), total),
        SyncStrategy::Beats => normalize_timestamps(&analysis.beats, total),
        SyncStrategy::Onsets => normalize_timestamps(&analysis.onsets, total),
    };

    if source.len() < scene_count {
        let reason = DegradeReason::InsufficientTimeline {
            strategy,
            available: source.len(),
            required: scene_count,
        };
        tracing::warn!(%reason, "falling back to even scene split");
        return Ok(AllocationOutcome::Degraded {
            allocations: split_evenly(scene_count, total),
            reason,
        });
    }

    let mut starts: Vec<f64> = spread_indices(source.len(), scene_count)
        .into_iter()
        .map(|index| source[index])
        .collect();
    starts[0] = 0.0;

    let allocations = assign_durations(&starts, total, min_scene_duration);
    verify_allocations(&allocations, total)?;

    tracing::debug!(
        %strategy,
        scenes = scene_count,
        anchors = source.len(),
        "allocated scenes to rhythm anchors"
    );

    Ok(AllocationOutcome::Allocated(allocations))
}

/// Equal windows; the last one absorbs rounding so the sum is exact.
pub fn split_evenly(scene_count: usize, total: f64) -> Vec<SceneAllocation> {
    let window = total / scene_count as f64;
    (0..scene_count)
        .map(|index| {
            let start_time = index as f64 * window;
            let duration = if index + 1 == scene_count {
                total - start_time
            } else {
                window
            };
            SceneAllocation {
                scene_index: index,
                start_time,
                duration,
            }
        })
        .collect()
}

/// `count` indices linearly spread over `0..len`, rounded to the nearest
/// index. Rounding collisions are clamped so the sequence never decreases.
fn spread_indices(len: usize, count: usize) -> Vec<usize> {
    if count <= 1 || len <= 1 {
        return vec![0; count];
    }

    let last = len - 1;
    let step = last as f64 / (count - 1) as f64;
    let mut previous = 0;
    (0..count)
        .map(|i| {
            let index = ((i as f64 * step).round() as usize).clamp(previous, last);
            previous = index;
            index
        })
        .collect()
}

fn assign_durations(starts: &[f64], total: f64, min_duration: f64) -> Vec<SceneAllocation> {
    let count = starts.len();
    let floor = min_duration.min(total / count as f64);

    let mut cursor = 0.0;
    let mut allocations = Vec::with_capacity(count);
    for index in 0..count {
        let end = match starts.get(index + 1) {
            Some(next) => {
                let reserved = floor * (count - index - 1) as f64;
                next.max(cursor + floor).min(total - reserved)
            }
            None => total,
        };
        allocations.push(SceneAllocation {
            scene_index: index,
            start_time: cursor,
            duration: end - cursor,
        });
        cursor = end;
    }
    allocations
}

/// Checks that `allocations` tile `[0, total]` with positive durations.
pub fn verify_allocations(allocations: &[SceneAllocation], total: f64) -> Result<()> {
    let tolerance = SUM_TOLERANCE * total.abs().max(1.0);
    let mut previous_end = 0.0;
    for allocation in allocations {
        if (allocation.start_time - previous_end).abs() > tolerance {
            return Err(ShortsError::NonMonotonicAllocation {
                expected: previous_end,
                actual: allocation.start_time,
            });
        }
        previous_end = allocation.end_time();
    }

    let sum: f64 = allocations.iter().map(|a| a.duration).sum();
    let drifted = (sum - total).abs() > tolerance;
    let stalled = allocations.iter().any(|a| a.duration <= 0.0);
    if drifted || stalled {
        return Err(ShortsError::NonMonotonicAllocation {
            expected: total,
            actual: sum,
        });
    }
    Ok(())
}
