//! Core library for the Art Shorts pipeline.
//!
//! Turns one artwork image and a list of narrated scenes into an ordered,
//! gap-free plan of crop boxes and time slots. Each module owns one stage:
//! crop geometry, rhythm timelines, scene allocation, and the coordinator
//! that zips them together. Decoding, beat tracking, compositing and
//! encoding stay outside the crate behind small traits.

pub mod allocation;
pub mod analysis;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod timeline;

pub use allocation::{
    allocate_scenes, split_evenly, verify_allocations, AllocationOutcome, DegradeReason,
    SceneAllocation, SyncStrategy,
};
pub use analysis::{AnalysisCache, AudioAnalysis, RhythmAnalyzer};
pub use config::{AppConfig, AudioConfig, ShowcaseConfig, VideoConfig};
pub use error::{Result, ShortsError};
pub use geometry::{
    compute_crop_box, fit_to_aspect_ratio, showcase_placement, AspectRatio, CropBox, FocusPoint,
    ImageSize, Placement,
};
pub use pipeline::{Coordinator, Diagnostic, RenderPlan, RenderRecord, SceneKind, TimingMode};
pub use render::{JsonPlanSink, RenderSink};
pub use scene::{
    artwork_caption, load_narration, load_scene_descriptors, parse_artwork_info, NarrationPacing,
    SceneDescriptor, DEFAULT_ARTIST,
};
pub use timeline::{build_timeline, Timeline};
