use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryError {
    #[error("story media reference must not be empty")]
    EmptyMedia,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("no stories to play")]
    EmptyStore,
    #[error("story index {index} out of range for {len} stories")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("playback needs a tokio runtime to drive its ticker")]
    NoRuntime,
}
