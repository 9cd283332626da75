//! Raspberry Pi Camera Video Source
//!
//! Exposes a hardware video camera as a continuous stream of frame records
//! for a downstream stream-processing engine.
//!
//! # Architecture
//!
//! The crate follows one explicit control flow:
//!
//! ```text
//! configure → create camera → stream frames → destroy camera
//!                 (driver)      (under lock)    (exactly once)
//! ```
//!
//! The native camera driver is consumed through the [`driver`] traits and
//! never reimplemented here; [`MockDriver`] stands in for it in tests and
//! demos. The [`source`] module validates configuration up front, runs the
//! acquisition loop, and packages each frame for the sink.
//!
//! # Design Principles
//!
//! - **Validate before touching hardware**: unsupported resolutions and
//!   formats are rejected before any camera exists
//! - **Teardown is not an error**: the driver's zero-size signal ends the
//!   stream cleanly, distinct from every failure path
//! - **Destroy exactly once**: the camera handle moves into the loop and
//!   funnels through a single destruction point on every exit
//! - **No internal retry**: failures are reported once and the stream ends;
//!   restarting is the host's decision
//!
//! # Example
//!
//! ```
//! use raspivideo_source::{
//!     FrameRecord, FrameSink, MockDriver, SinkError, SourceConfig, VideoSource,
//! };
//!
//! struct Collect(Vec<FrameRecord>);
//!
//! impl FrameSink for Collect {
//!     fn write(&mut self, record: FrameRecord) -> Result<(), SinkError> {
//!         self.0.push(record);
//!         Ok(())
//!     }
//! }
//!
//! let config = SourceConfig::default();
//! let driver = MockDriver::new().good_frames(3, config.frame_bytes());
//! let source = VideoSource::new(config, driver);
//!
//! let mut sink = Collect(Vec::new());
//! source.run(&mut sink).unwrap();
//! assert_eq!(sink.0.len(), 3);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod driver;
pub mod source;

// Re-export commonly used types at crate root
pub use driver::{Camera, CameraDriver, FrameBuffer, MockDriver, MockStats, Status};
pub use source::{
    ConfigError, FrameRecord, FrameSink, PixelFormat, SinkError, SourceConfig, StopHandle,
    StreamError, VideoSource,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
