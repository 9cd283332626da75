//! Camera driver capability contract.
//!
//! The native camera driver is an external collaborator: it fills a frame
//! buffer from its own capture thread and reports outcomes as status codes.
//! This module defines the fixed contract the acquisition loop consumes.
//! Implementations sit on either side of it: a hardware adapter binding the
//! native library, and [`MockDriver`] for tests and demos.

mod mock;
mod status;

pub use mock::{MockCamera, MockDriver, MockFrames, MockStats};
pub use status::Status;

use crate::source::SourceConfig;

/// Factory for camera handles, and the sole authority for destroying them.
pub trait CameraDriver {
    /// Opaque handle to one active capture session.
    type Camera: Camera;

    /// Performs the driver's process-wide startup.
    ///
    /// The acquisition loop calls this before its first `create`.
    /// Implementations must tolerate repeated calls; the underlying native
    /// initialization runs at most once per process.
    fn initialize(&self);

    /// Creates a camera and immediately starts capturing frames.
    ///
    /// Assumes `config` has already been validated; invalid combinations
    /// must never reach this call.
    fn create(&self, config: &SourceConfig) -> Result<Self::Camera, Status>;

    /// Destroys a camera handle.
    ///
    /// The driver does not guarantee idempotent destruction. Taking the
    /// handle by value makes a second destruction unrepresentable.
    fn destroy(&self, camera: Self::Camera);
}

/// One active capture session, exclusively owned by the acquisition loop.
pub trait Camera {
    /// View of the frame buffer while the driver's lock is held.
    type Frames<'a>: FrameBuffer
    where
        Self: 'a;

    /// Locks the frame buffer shared with the driver's capture thread.
    ///
    /// The lock is released when the returned guard drops, on every exit
    /// path. Frame sizes must not be read, nor frame bytes copied, outside
    /// this scope.
    fn lock(&mut self) -> Self::Frames<'_>;
}

/// Operations valid only while the frame-buffer lock is held.
pub trait FrameBuffer {
    /// Size in bytes of the most recently captured frame.
    ///
    /// Blocks until a frame becomes ready. Returns 0 when the camera is
    /// being or has been destroyed; that is the teardown signal, never a
    /// valid frame length.
    fn frame_size(&mut self) -> usize;

    /// Copies the captured frame into `buffer` and clears the ready flag.
    ///
    /// `buffer` must be at least as large as the size reported by
    /// [`FrameBuffer::frame_size`] in the same lock scope.
    fn retrieve(&mut self, buffer: &mut [u8]) -> Status;
}
