//! Scene planning: pairs every scene's crop box with its slot on the time
//! axis and packages the result for the external compositor and encoder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    allocate_scenes, compute_crop_box, showcase_placement, verify_allocations, AppConfig,
    AspectRatio, AudioAnalysis, CropBox, DegradeReason, FocusPoint, ImageSize, Placement, Result,
    RhythmAnalyzer, SceneAllocation, SceneDescriptor, ShortsError, SyncStrategy, Timeline,
};

/// What a record shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneKind {
    /// A zoomed crop with its narration line as subtitle.
    Zoom { text: String },
    /// The closing scene: the whole artwork letterboxed at `placement` with
    /// `caption` printed in the band below it.
    Showcase {
        placement: Placement,
        caption: Vec<String>,
    },
}

/// One entry of the render plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRecord {
    pub scene: usize,
    #[serde(flatten)]
    pub kind: SceneKind,
    pub crop_box: CropBox,
    pub start_time: f64,
    pub duration: f64,
}

/// Which duration model produced the plan's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimingMode {
    Rhythm {
        strategy: SyncStrategy,
        degraded: bool,
    },
    Narration,
}

/// Something the caller should know about even though planning succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A scene was left out because no valid crop exists for it.
    SceneDropped { scene: usize, reason: String },
    /// Rhythmic sync was requested but the analysis could not be obtained.
    AudioUnavailable { reason: String },
    /// The rhythm source was too sparse and scenes were split evenly.
    InsufficientTimeline { reason: DegradeReason },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SceneDropped { scene, reason } => write!(f, "scene {scene} dropped: {reason}"),
            Self::AudioUnavailable { reason } => {
                write!(f, "audio unavailable, using narration timing: {reason}")
            }
            Self::InsufficientTimeline { reason } => write!(f, "{reason}"),
        }
    }
}

/// Ordered, gap-free list of scenes ready for compositing and encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub frame: ImageSize,
    pub fps: u32,
    pub timing: TimingMode,
    pub total_duration: f64,
    pub records: Vec<RenderRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A scene that has a crop box but no time slot yet.
struct StagedScene<'a> {
    scene: usize,
    kind: SceneKind,
    crop_box: CropBox,
    narration: Option<&'a str>,
}

/// Sequences the geometry engine and the timing distributor.
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: AppConfig,
    aspect: AspectRatio,
}

impl Coordinator {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let aspect = config.video.aspect_ratio()?;
        Ok(Self { config, aspect })
    }

    /// Plans `scenes` over an image of size `image`, following the music in
    /// `audio` when rhythmic sync is enabled and falling back to narration
    /// pacing otherwise.
    pub fn plan(
        &self,
        image: ImageSize,
        scenes: &[SceneDescriptor],
        audio: Option<&AudioAnalysis>,
    ) -> Result<RenderPlan> {
        self.plan_inner(image, scenes, audio.cloned(), Vec::new())
    }

    /// Like [`Coordinator::plan`], but obtains the analysis from `analyzer`.
    /// An analyzer failure downgrades to narration timing with a diagnostic.
    pub fn plan_with_analyzer(
        &self,
        image: ImageSize,
        scenes: &[SceneDescriptor],
        analyzer: Option<&dyn RhythmAnalyzer>,
    ) -> Result<RenderPlan> {
        let mut diagnostics = Vec::new();
        let audio = match analyzer {
            Some(analyzer) if self.config.audio.enabled => match analyzer.analyze() {
                Ok(analysis) => Some(analysis),
                Err(err) => {
                    tracing::warn!(error = %err, "audio analysis failed, using narration timing");
                    diagnostics.push(Diagnostic::AudioUnavailable {
                        reason: err.to_string(),
                    });
                    None
                }
            },
            _ => None,
        };
        self.plan_inner(image, scenes, audio, diagnostics)
    }

    fn plan_inner(
        &self,
        image: ImageSize,
        scenes: &[SceneDescriptor],
        audio: Option<AudioAnalysis>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Result<RenderPlan> {
        tracing::info!(%image, scenes = scenes.len(), "planning scenes");

        let mut staged = Vec::with_capacity(scenes.len() + 1);
        for descriptor in scenes {
            let cropped = self.crop_scene(image, descriptor.focus);
            let Some(crop_box) = keep_scene(descriptor.scene, cropped, &mut diagnostics)? else {
                continue;
            };
            staged.push(StagedScene {
                scene: descriptor.scene,
                kind: SceneKind::Zoom {
                    text: descriptor.text.clone(),
                },
                crop_box,
                narration: Some(descriptor.text.as_str()),
            });
        }

        if self.config.showcase.enabled {
            let scene = scenes.iter().map(|s| s.scene).max().map_or(1, |last| last + 1);
            let showcase = self.showcase(image);
            if let Some((crop_box, placement)) = keep_scene(scene, showcase, &mut diagnostics)? {
                staged.push(StagedScene {
                    scene,
                    kind: SceneKind::Showcase {
                        placement,
                        caption: self.config.showcase.caption.clone(),
                    },
                    crop_box,
                    narration: None,
                });
            }
        }

        if staged.is_empty() {
            return Err(ShortsError::EmptyPlan);
        }

        let (timing, total_duration, slots) =
            self.schedule(&staged, audio.as_ref(), &mut diagnostics)?;
        verify_allocations(&slots, total_duration)?;

        let records: Vec<RenderRecord> = staged
            .into_iter()
            .zip(slots)
            .map(|(staged, slot)| RenderRecord {
                scene: staged.scene,
                kind: staged.kind,
                crop_box: staged.crop_box,
                start_time: slot.start_time,
                duration: slot.duration,
            })
            .collect();

        tracing::info!(
            records = records.len(),
            total_duration,
            diagnostics = diagnostics.len(),
            "render plan ready"
        );

        Ok(RenderPlan {
            frame: self.config.video.frame(),
            fps: self.config.video.fps,
            timing,
            total_duration,
            records,
            diagnostics,
        })
    }

    fn crop_scene(&self, image: ImageSize, focus: FocusPoint) -> Result<CropBox> {
        compute_crop_box(image, focus)?.fit_to(self.aspect)
    }

    fn showcase(&self, image: ImageSize) -> Result<(CropBox, Placement)> {
        let showcase = &self.config.showcase;
        let crop_box = CropBox::full(image)?;
        let placement = showcase_placement(
            image,
            self.config.video.frame(),
            showcase.padding,
            showcase.text_height,
        )?;
        Ok((crop_box, placement))
    }

    fn schedule(
        &self,
        staged: &[StagedScene<'_>],
        audio: Option<&AudioAnalysis>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(TimingMode, f64, Vec<SceneAllocation>)> {
        let settings = &self.config.audio;
        let Some(analysis) = audio.filter(|_| settings.enabled) else {
            let (total, slots) = self.narration_slots(staged);
            return Ok((TimingMode::Narration, total, slots));
        };

        let analysis = match settings.target_duration {
            Some(target) => analysis.truncated(target),
            None => analysis.clone(),
        };
        if let Err(err) = analysis.validate() {
            tracing::warn!(error = %err, "unusable audio analysis, using narration timing");
            diagnostics.push(Diagnostic::AudioUnavailable {
                reason: err.to_string(),
            });
            let (total, slots) = self.narration_slots(staged);
            return Ok((TimingMode::Narration, total, slots));
        }

        let timeline = Timeline::from_analysis(&analysis, settings.min_scene_interval)?;
        let outcome = allocate_scenes(
            staged.len(),
            &timeline,
            &analysis,
            settings.sync_strategy,
            settings.min_scene_duration,
        )?;

        let degraded = match outcome.degrade_reason() {
            Some(reason) => {
                diagnostics.push(Diagnostic::InsufficientTimeline { reason: *reason });
                true
            }
            None => false,
        };
        let timing = TimingMode::Rhythm {
            strategy: settings.sync_strategy,
            degraded,
        };
        Ok((timing, analysis.duration, outcome.into_allocations()))
    }

    fn narration_slots(&self, staged: &[StagedScene<'_>]) -> (f64, Vec<SceneAllocation>) {
        let pacing = self.config.video.pacing();
        let mut cursor = 0.0;
        let slots = staged
            .iter()
            .enumerate()
            .map(|(scene_index, scene)| {
                let duration = match scene.narration {
                    Some(text) => pacing.duration_for(text),
                    None => self.config.video.final_scene_duration,
                };
                let slot = SceneAllocation {
                    scene_index,
                    start_time: cursor,
                    duration,
                };
                cursor += duration;
                slot
            })
            .collect();
        (cursor, slots)
    }
}

/// Turns a scene-local failure into a diagnostic; anything else propagates.
fn keep_scene<T>(
    scene: usize,
    result: Result<T>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_scene_local() => {
            tracing::warn!(scene, error = %err, "dropping scene");
            diagnostics.push(Diagnostic::SceneDropped {
                scene,
                reason: err.to_string(),
            });
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
