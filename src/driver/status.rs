//! Driver status codes and their classification.
//!
//! Every camera driver operation reports its outcome as a status code from
//! a closed set. The mapping here is total: codes outside the documented
//! set classify as [`Status::Unknown`] instead of being misread.

use thiserror::Error;

/// Outcome of a camera driver operation.
///
/// [`Status::CameraDestroyed`] is not a failure. It is the teardown signal
/// observed when the camera was released out-of-band, and the only code the
/// acquisition loop special-cases (see [`Status::is_destroyed`]). Every other
/// non-success code is a hard failure of equal severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Status {
    /// The operation completed.
    #[error("no error")]
    Success,
    /// The driver could not allocate memory.
    #[error("cannot allocate memory")]
    NoMemory,
    /// The driver could not initialize its frame mutex.
    #[error("cannot init mutex")]
    InitMutex,
    /// The driver could not initialize its frame condition variable.
    #[error("cannot init cond")]
    InitCond,
    /// The camera component could not be created.
    #[error("cannot create camera object")]
    CreateCamera,
    /// The target camera could not be selected.
    #[error("cannot select a target camera")]
    SelectCamera,
    /// The camera configuration could not be applied.
    #[error("cannot configure camera")]
    ConfigureCamera,
    /// The requested frame format could not be committed.
    #[error("cannot commit camera format")]
    CommitFormat,
    /// The camera component could not be enabled.
    #[error("cannot enable camera")]
    EnableCamera,
    /// The driver could not create its pool of frame buffers.
    #[error("cannot create a pool of buffers")]
    CreatePool,
    /// The camera's video port could not be enabled.
    #[error("cannot enable video port of the camera")]
    EnableVideoPort,
    /// A buffer could not be submitted to the video port.
    #[error("cannot send buffer to video port")]
    SendBuffer,
    /// Capture could not be started.
    #[error("cannot start capture")]
    StartCapture,
    /// The camera has already been destroyed. Teardown signal, not a failure.
    #[error("camera has already been destroyed")]
    CameraDestroyed,
    /// A code outside the driver's documented set.
    #[error("unknown error")]
    Unknown(i32),
}

impl Status {
    /// Classifies a raw driver code.
    ///
    /// Total over all inputs: unrecognized codes map to [`Status::Unknown`].
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::NoMemory,
            2 => Self::InitMutex,
            3 => Self::InitCond,
            4 => Self::CreateCamera,
            5 => Self::SelectCamera,
            6 => Self::ConfigureCamera,
            7 => Self::CommitFormat,
            8 => Self::EnableCamera,
            9 => Self::CreatePool,
            10 => Self::EnableVideoPort,
            11 => Self::SendBuffer,
            12 => Self::StartCapture,
            13 => Self::CameraDestroyed,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw driver code for this status.
    pub fn as_raw(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::NoMemory => 1,
            Self::InitMutex => 2,
            Self::InitCond => 3,
            Self::CreateCamera => 4,
            Self::SelectCamera => 5,
            Self::ConfigureCamera => 6,
            Self::CommitFormat => 7,
            Self::EnableCamera => 8,
            Self::CreatePool => 9,
            Self::EnableVideoPort => 10,
            Self::SendBuffer => 11,
            Self::StartCapture => 12,
            Self::CameraDestroyed => 13,
            Self::Unknown(code) => code,
        }
    }

    /// True when the operation succeeded.
    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// True only for the teardown signal.
    ///
    /// Used by the acquisition loop to tell an out-of-band camera
    /// destruction apart from a genuine retrieval failure.
    #[inline]
    pub fn is_destroyed(self) -> bool {
        self == Self::CameraDestroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_codes_round_trip() {
        for code in 0..14 {
            let status = Status::from_raw(code);
            assert_eq!(status.as_raw(), code);
            assert!(!matches!(status, Status::Unknown(_)));
        }
    }

    #[test]
    fn test_unrecognized_codes_classify_as_unknown() {
        assert_eq!(Status::from_raw(14), Status::Unknown(14));
        assert_eq!(Status::from_raw(-1), Status::Unknown(-1));
        assert_eq!(Status::from_raw(14).to_string(), "unknown error");
        assert_eq!(Status::Unknown(99).as_raw(), 99);
    }

    #[test]
    fn test_destroyed_predicate_is_exclusive() {
        assert!(Status::CameraDestroyed.is_destroyed());

        for code in 0..13 {
            assert!(!Status::from_raw(code).is_destroyed());
        }
        assert!(!Status::Unknown(42).is_destroyed());
    }

    #[test]
    fn test_success_predicate() {
        assert!(Status::Success.is_success());
        assert!(!Status::NoMemory.is_success());
        assert!(!Status::CameraDestroyed.is_success());
    }

    #[test]
    fn test_messages() {
        assert_eq!(Status::Success.to_string(), "no error");
        assert_eq!(Status::NoMemory.to_string(), "cannot allocate memory");
        assert_eq!(
            Status::EnableVideoPort.to_string(),
            "cannot enable video port of the camera"
        );
        assert_eq!(
            Status::CameraDestroyed.to_string(),
            "camera has already been destroyed"
        );
    }
}
