//! The frame acquisition loop.
//!
//! A [`VideoSource`] owns one camera handle from creation to destruction.
//! It runs synchronously on whatever worker the host assigns, retrieving
//! frames under the driver's lock and pushing one record per frame to the
//! sink until the camera is torn down, a hard failure occurs, or the host
//! requests a stop. The camera handle is destroyed exactly once on every
//! exit path past creation.

use crate::driver::{Camera, CameraDriver, FrameBuffer, Status};
use crate::source::{FrameRecord, SourceConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors that terminate a stream.
///
/// A clean end of stream (teardown signal or host stop) is `Ok(())`, never
/// one of these.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The camera could not be created; streaming never started.
    #[error("cannot create camera: {0}")]
    CameraCreation(Status),
    /// A mid-stream retrieval failed.
    #[error("cannot retrieve a frame: {0}")]
    FrameRetrieval(Status),
    /// The downstream consumer rejected a record.
    #[error("cannot deliver a frame record: {0}")]
    Sink(#[from] SinkError),
}

/// Failure reported by the downstream consumer.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SinkError(String);

impl SinkError {
    /// Wraps a downstream failure description.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Downstream consumer of frame records.
pub trait FrameSink {
    /// Accepts one record, taking ownership of its pixel buffer.
    ///
    /// May block; the loop then retrieves no faster than the sink drains,
    /// applying backpressure upstream into the capture path.
    fn write(&mut self, record: FrameRecord) -> Result<(), SinkError>;
}

/// Cooperative stop switch for a running stream.
///
/// Cloneable and idempotent; safe to trigger from any thread while an
/// iteration is in flight. The flag is honored between iterations. A stop
/// that races a blocking retrieval is observed through the driver's
/// teardown signal instead, never by interrupting the retrieval.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// A handle with no stop requested yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination of the stream. Further calls have no effect.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// True once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Outcome of one lock-scoped retrieval attempt.
///
/// Zero frame size is a control signal, not an empty frame; keeping the
/// three outcomes distinct prevents empty records from ever being emitted.
enum Poll {
    Frame(Vec<u8>),
    Destroyed,
    Failed(Status),
}

/// A video source bound to one validated configuration and one driver.
pub struct VideoSource<D> {
    config: SourceConfig,
    driver: D,
    stop: StopHandle,
}

impl<D: CameraDriver> VideoSource<D> {
    /// Creates a source. `config` must come out of the validation path.
    pub fn new(config: SourceConfig, driver: D) -> Self {
        Self {
            config,
            driver,
            stop: StopHandle::new(),
        }
    }

    /// The configuration this source streams with.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Handle the host uses to request termination.
    ///
    /// A stopped source stays stopped; restarting means building a new
    /// source from a fresh configure step.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs the stream until teardown, a hard failure, or a stop request.
    ///
    /// Creates the camera, then hands every captured frame to `sink` in
    /// retrieval order. Failures are logged once at the point of failure
    /// and returned; there is no internal retry. The host owns any restart
    /// policy.
    pub fn run<S: FrameSink>(&self, sink: &mut S) -> Result<(), StreamError> {
        self.driver.initialize();

        let mut camera = match self.driver.create(&self.config) {
            Ok(camera) => camera,
            Err(status) => {
                tracing::error!(%status, "cannot start streaming video due to a camera creation error");
                return Err(StreamError::CameraCreation(status));
            }
        };
        tracing::info!(
            width = self.config.width,
            height = self.config.height,
            format = self.config.format.as_str(),
            "camera created, streaming video"
        );

        let result = self.stream(&mut camera, sink);
        // Sole destruction point. Every exit from `stream` funnels through
        // here, so the handle is destroyed exactly once per create.
        self.driver.destroy(camera);

        if result.is_ok() {
            tracing::info!("video stream ended");
        }
        result
    }

    fn stream<S: FrameSink>(
        &self,
        camera: &mut D::Camera,
        sink: &mut S,
    ) -> Result<(), StreamError> {
        loop {
            if self.stop.is_stopped() {
                tracing::info!("stop requested, ending video stream");
                return Ok(());
            }

            let poll = {
                let mut frames = camera.lock();
                let size = frames.frame_size();
                if size == 0 {
                    Poll::Destroyed
                } else {
                    let mut image = vec![0u8; size];
                    match frames.retrieve(&mut image) {
                        Status::Success => Poll::Frame(image),
                        status => Poll::Failed(status),
                    }
                }
            }; // frame-buffer lock released here, before the record exists

            match poll {
                Poll::Destroyed => return Ok(()),
                Poll::Failed(status) if status.is_destroyed() => return Ok(()),
                Poll::Failed(status) => {
                    tracing::error!(%status, "cannot retrieve a frame, stopping the video stream");
                    return Err(StreamError::FrameRetrieval(status));
                }
                Poll::Frame(image) => {
                    let record = FrameRecord::new(&self.config, image);
                    if let Err(e) = sink.write(record) {
                        tracing::error!(error = %e, "output sink rejected a frame record, stopping the video stream");
                        return Err(StreamError::Sink(e));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use std::sync::mpsc;
    use std::thread;

    #[derive(Default)]
    struct CollectSink {
        records: Vec<FrameRecord>,
        fail_after: Option<usize>,
    }

    impl FrameSink for CollectSink {
        fn write(&mut self, record: FrameRecord) -> Result<(), SinkError> {
            if Some(self.records.len()) == self.fail_after {
                return Err(SinkError::new("sink full"));
            }
            self.records.push(record);
            Ok(())
        }
    }

    #[test]
    fn test_emits_one_record_per_frame_then_ends_cleanly() {
        let driver = MockDriver::new().good_frames(3, 64);
        let stats = driver.stats();
        let source = VideoSource::new(SourceConfig::default(), driver);

        let mut sink = CollectSink::default();
        source.run(&mut sink).unwrap();

        assert_eq!(sink.records.len(), 3);
        for record in &sink.records {
            assert_eq!(record.image().len(), 64);
            assert_eq!(record.width(), 640);
            assert_eq!(record.color_model(), "bgr");
        }
        assert_eq!(stats.initializes(), 1);
        assert_eq!(stats.creates(), 1);
        assert_eq!(stats.destroys(), 1);
    }

    #[test]
    fn test_retrieval_failure_ends_stream_after_prior_records() {
        let driver = MockDriver::new()
            .good_frames(2, 64)
            .failing_frame(64, Status::SendBuffer);
        let stats = driver.stats();
        let source = VideoSource::new(SourceConfig::default(), driver);

        let mut sink = CollectSink::default();
        let err = source.run(&mut sink).unwrap_err();

        assert!(matches!(
            err,
            StreamError::FrameRetrieval(Status::SendBuffer)
        ));
        assert_eq!(
            err.to_string(),
            "cannot retrieve a frame: cannot send buffer to video port"
        );
        assert_eq!(sink.records.len(), 2);
        assert_eq!(stats.destroys(), 1);
    }

    #[test]
    fn test_destroyed_status_from_retrieve_is_a_clean_end() {
        let driver = MockDriver::new()
            .good_frames(1, 64)
            .failing_frame(64, Status::CameraDestroyed);
        let stats = driver.stats();
        let source = VideoSource::new(SourceConfig::default(), driver);

        let mut sink = CollectSink::default();
        source.run(&mut sink).unwrap();

        assert_eq!(sink.records.len(), 1);
        assert_eq!(stats.destroys(), 1);
    }

    #[test]
    fn test_creation_failure_never_destroys() {
        let driver = MockDriver::new().failing_create(Status::SelectCamera);
        let stats = driver.stats();
        let source = VideoSource::new(SourceConfig::default(), driver);

        let mut sink = CollectSink::default();
        let err = source.run(&mut sink).unwrap_err();

        assert!(matches!(
            err,
            StreamError::CameraCreation(Status::SelectCamera)
        ));
        assert!(sink.records.is_empty());
        assert_eq!(stats.initializes(), 1);
        assert_eq!(stats.creates(), 0);
        assert_eq!(stats.destroys(), 0);
    }

    #[test]
    fn test_sink_failure_ends_stream_with_teardown() {
        let driver = MockDriver::new().good_frames(5, 64);
        let stats = driver.stats();
        let source = VideoSource::new(SourceConfig::default(), driver);

        let mut sink = CollectSink {
            records: Vec::new(),
            fail_after: Some(1),
        };
        let err = source.run(&mut sink).unwrap_err();

        assert!(matches!(err, StreamError::Sink(_)));
        assert_eq!(sink.records.len(), 1);
        assert_eq!(stats.destroys(), 1);
    }

    struct StoppingSink {
        stop: StopHandle,
        stop_after: usize,
        records: usize,
    }

    impl FrameSink for StoppingSink {
        fn write(&mut self, _record: FrameRecord) -> Result<(), SinkError> {
            self.records += 1;
            if self.records == self.stop_after {
                self.stop.stop();
            }
            Ok(())
        }
    }

    #[test]
    fn test_stop_between_iterations_is_clean_and_final() {
        let driver = MockDriver::new().good_frames(10, 64);
        let stats = driver.stats();
        let source = VideoSource::new(SourceConfig::default(), driver);

        let mut sink = StoppingSink {
            stop: source.stop_handle(),
            stop_after: 2,
            records: 0,
        };
        source.run(&mut sink).unwrap();

        // No retrieval happens after the stop request.
        assert_eq!(sink.records, 2);
        assert_eq!(stats.retrieves(), 2);
        assert_eq!(stats.destroys(), 1);
    }

    #[test]
    fn test_stop_before_run_emits_nothing() {
        let driver = MockDriver::new().good_frames(10, 64);
        let stats = driver.stats();
        let source = VideoSource::new(SourceConfig::default(), driver);

        source.stop_handle().stop();
        let mut sink = CollectSink::default();
        source.run(&mut sink).unwrap();

        assert!(sink.records.is_empty());
        assert_eq!(stats.retrieves(), 0);
        assert_eq!(stats.creates(), 1);
        assert_eq!(stats.destroys(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let stop = StopHandle::new();
        assert!(!stop.is_stopped());
        stop.stop();
        stop.stop();
        assert!(stop.is_stopped());
    }

    struct ChannelSink {
        delivered: mpsc::Sender<usize>,
        records: usize,
    }

    impl FrameSink for ChannelSink {
        fn write(&mut self, record: FrameRecord) -> Result<(), SinkError> {
            self.records += 1;
            let _ = self.delivered.send(record.image().len());
            Ok(())
        }
    }

    #[test]
    fn test_out_of_band_destruction_ends_the_stream_cleanly() {
        let driver = MockDriver::new().good_frames(100_000, 64);
        let stats = driver.stats();
        let teardown = driver.clone();
        let source = VideoSource::new(SourceConfig::default(), driver);

        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            let mut sink = ChannelSink {
                delivered: tx,
                records: 0,
            };
            let result = source.run(&mut sink);
            (result, sink.records)
        });

        // Let the loop deliver at least one record, then tear the camera
        // down from outside, as a concurrent host stop would.
        rx.recv().unwrap();
        teardown.destroy_now();

        let (result, records) = worker.join().unwrap();
        result.unwrap();
        assert!(records >= 1);
        assert_eq!(stats.destroys(), 1);
    }

    struct LockProbeSink {
        driver: MockDriver,
        records: Vec<FrameRecord>,
    }

    impl FrameSink for LockProbeSink {
        fn write(&mut self, record: FrameRecord) -> Result<(), SinkError> {
            if self.driver.is_locked() {
                return Err(SinkError::new("frame-buffer lock still held at handoff"));
            }
            self.records.push(record);
            Ok(())
        }
    }

    #[test]
    fn test_lock_released_before_handoff_and_held_during_retrieval() {
        let driver = MockDriver::new().good_frames(50, 32);
        let stats = driver.stats();
        let writer = driver.clone();
        let done = Arc::new(AtomicBool::new(false));
        let writer_done = Arc::clone(&done);

        // A second actor mutates the frame state concurrently, under the
        // same lock the loop uses.
        let mutator = thread::spawn(move || {
            let mut value = 100u8;
            while !writer_done.load(Ordering::SeqCst) {
                writer.set_fill(value);
                value = value.wrapping_add(1);
            }
        });

        let probe = driver.clone();
        let source = VideoSource::new(SourceConfig::default(), driver);
        let mut sink = LockProbeSink {
            driver: probe,
            records: Vec::new(),
        };
        let result = source.run(&mut sink);

        done.store(true, Ordering::SeqCst);
        mutator.join().unwrap();

        result.unwrap();
        assert_eq!(sink.records.len(), 50);
        // Retrieval under the lock: the writer can never tear a frame, so
        // every record is uniformly filled.
        for record in &sink.records {
            let bytes = record.image();
            assert!(bytes.iter().all(|&b| b == bytes[0]));
        }
        assert_eq!(stats.destroys(), 1);
    }
}
