/// Result alias that carries the custom [`ShortsError`] type.
pub type Result<T> = std::result::Result<T, ShortsError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ShortsError {
    /// A focus point that cannot be turned into a crop: zoom below 1.0 or
    /// coordinates that are not finite numbers.
    #[error("invalid focus point: {0}")]
    InvalidFocus(String),
    /// Non-positive image dimensions or a crop that rounds to zero pixels.
    #[error("degenerate crop: {0}")]
    DegenerateCrop(String),
    /// Scene durations no longer add up to the audio duration. This is an
    /// internal invariant violation and is never recovered from.
    #[error("scene durations sum to {actual}s but the timeline spans {expected}s")]
    NonMonotonicAllocation { expected: f64, actual: f64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The audio analysis handed over by the external analyzer is unusable.
    #[error("invalid audio analysis: {0}")]
    InvalidAnalysis(String),
    /// Every scene was dropped, so there is nothing to hand to the renderer.
    #[error("no scene survived planning")]
    EmptyPlan,
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShortsError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Whether the coordinator may drop the offending scene and carry on.
    pub fn is_scene_local(&self) -> bool {
        matches!(self, Self::InvalidFocus(_) | Self::DegenerateCrop(_))
    }
}
