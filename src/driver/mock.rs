//! Scripted mock driver for tests and demos.
//!
//! The mock plays back a per-frame script: a run of good frames, an
//! injected failure status, or a create-time failure. The frame-buffer
//! lock is a real mutex, so lock discipline is observable from tests, and
//! [`MockDriver::destroy_now`] tears the camera down out-of-band the way a
//! concurrent host stop does on hardware.

use super::{Camera, CameraDriver, FrameBuffer, Status};
use crate::source::SourceConfig;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

#[derive(Debug, Clone, Copy)]
struct ScriptStep {
    size: usize,
    status: Status,
}

#[derive(Debug)]
struct FrameState {
    script: VecDeque<ScriptStep>,
    destroyed: bool,
    fill: u8,
}

#[derive(Debug, Default)]
struct StatsInner {
    initializes: AtomicUsize,
    creates: AtomicUsize,
    destroys: AtomicUsize,
    retrieves: AtomicUsize,
}

/// Call counters shared with a [`MockDriver`].
///
/// Remains observable after the driver has moved into a video source.
#[derive(Debug, Clone, Default)]
pub struct MockStats {
    inner: Arc<StatsInner>,
}

impl MockStats {
    /// Number of `initialize` calls.
    pub fn initializes(&self) -> usize {
        self.inner.initializes.load(Ordering::SeqCst)
    }

    /// Number of successful `create` calls.
    pub fn creates(&self) -> usize {
        self.inner.creates.load(Ordering::SeqCst)
    }

    /// Number of `destroy` calls.
    pub fn destroys(&self) -> usize {
        self.inner.destroys.load(Ordering::SeqCst)
    }

    /// Number of `retrieve` calls.
    pub fn retrieves(&self) -> usize {
        self.inner.retrieves.load(Ordering::SeqCst)
    }
}

/// Camera driver whose behavior is scripted frame by frame.
///
/// Once the script runs out the camera reports the teardown signal, so a
/// plain `good_frames(k, n)` driver streams exactly `k` frames and then
/// ends the stream cleanly.
#[derive(Debug, Clone)]
pub struct MockDriver {
    create_status: Status,
    state: Arc<Mutex<FrameState>>,
    stats: MockStats,
}

impl MockDriver {
    /// A driver with an empty script: the first size query reports teardown.
    pub fn new() -> Self {
        Self {
            create_status: Status::Success,
            state: Arc::new(Mutex::new(FrameState {
                script: VecDeque::new(),
                destroyed: false,
                fill: 1,
            })),
            stats: MockStats::default(),
        }
    }

    /// Appends `count` frames of `size` bytes that retrieve successfully.
    pub fn good_frames(self, count: usize, size: usize) -> Self {
        {
            let mut state = self.lock_state();
            for _ in 0..count {
                state.script.push_back(ScriptStep {
                    size,
                    status: Status::Success,
                });
            }
        }
        self
    }

    /// Appends a frame whose size query succeeds but whose retrieval
    /// returns `status`.
    pub fn failing_frame(self, size: usize, status: Status) -> Self {
        {
            let mut state = self.lock_state();
            state.script.push_back(ScriptStep { size, status });
        }
        self
    }

    /// Makes `create` fail with `status` instead of producing a camera.
    pub fn failing_create(mut self, status: Status) -> Self {
        self.create_status = status;
        self
    }

    /// Handle to the shared call counters.
    pub fn stats(&self) -> MockStats {
        self.stats.clone()
    }

    /// Tears the camera down out-of-band.
    ///
    /// Subsequent size queries report 0 and retrievals report
    /// [`Status::CameraDestroyed`], mirroring a host stop racing the loop.
    pub fn destroy_now(&self) {
        self.lock_state().destroyed = true;
    }

    /// Overwrites the byte value the next retrieved frame is filled with.
    pub fn set_fill(&self, value: u8) {
        self.lock_state().fill = value;
    }

    /// True while some thread holds the frame-buffer lock.
    pub fn is_locked(&self) -> bool {
        matches!(self.state.try_lock(), Err(TryLockError::WouldBlock))
    }

    fn lock_state(&self) -> MutexGuard<'_, FrameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDriver for MockDriver {
    type Camera = MockCamera;

    fn initialize(&self) {
        self.stats.inner.initializes.fetch_add(1, Ordering::SeqCst);
    }

    fn create(&self, config: &SourceConfig) -> Result<MockCamera, Status> {
        if !self.create_status.is_success() {
            return Err(self.create_status);
        }
        self.stats.inner.creates.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            width = config.width,
            height = config.height,
            "mock camera created"
        );
        Ok(MockCamera {
            state: Arc::clone(&self.state),
            stats: self.stats.clone(),
        })
    }

    fn destroy(&self, camera: MockCamera) {
        camera
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .destroyed = true;
        self.stats.inner.destroys.fetch_add(1, Ordering::SeqCst);
        tracing::info!("mock camera destroyed");
    }
}

/// Handle to a scripted mock capture session.
#[derive(Debug)]
pub struct MockCamera {
    state: Arc<Mutex<FrameState>>,
    stats: MockStats,
}

impl Camera for MockCamera {
    type Frames<'a> = MockFrames<'a>;

    fn lock(&mut self) -> MockFrames<'_> {
        MockFrames {
            state: self.state.lock().unwrap_or_else(PoisonError::into_inner),
            stats: &self.stats,
        }
    }
}

/// Lock guard over the mock's frame state.
pub struct MockFrames<'a> {
    state: MutexGuard<'a, FrameState>,
    stats: &'a MockStats,
}

impl FrameBuffer for MockFrames<'_> {
    fn frame_size(&mut self) -> usize {
        if self.state.destroyed {
            return 0;
        }
        match self.state.script.front() {
            Some(step) => step.size,
            None => 0,
        }
    }

    fn retrieve(&mut self, buffer: &mut [u8]) -> Status {
        self.stats.inner.retrieves.fetch_add(1, Ordering::SeqCst);
        if self.state.destroyed {
            return Status::CameraDestroyed;
        }
        let Some(step) = self.state.script.pop_front() else {
            return Status::CameraDestroyed;
        };
        if !step.status.is_success() {
            return step.status;
        }
        buffer.fill(self.state.fill);
        self.state.fill = self.state.fill.wrapping_add(1);
        Status::Success
    }
}
