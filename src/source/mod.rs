//! Video source: configuration, frame records, and the acquisition loop.
//!
//! This module is the producing side of the crate. A validated
//! [`SourceConfig`] plus a camera driver yields a [`VideoSource`], which
//! streams [`FrameRecord`]s into a [`FrameSink`] until teardown.

mod config;
mod record;
mod stream;

pub use config::{ConfigError, PixelFormat, SourceConfig, SUPPORTED_RESOLUTIONS};
pub use record::{FrameRecord, RAW_MATRIX_TAG};
pub use stream::{FrameSink, SinkError, StopHandle, StreamError, VideoSource};
