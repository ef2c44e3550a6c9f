use chrono::{DateTime, TimeDelta, Utc};

use crate::Result;
use crate::speech::{RecognitionRequest, RecognitionResponse};

/// Pluggable speech-recognition service used by [`crate::cloudscribe::run`].
///
/// A backend speaks the long-running-operation protocol: it submits a request and hands back an
/// operation snapshot, then reports fresh snapshots for that operation on demand. Waiting is the
/// caller's job (see [`crate::operation::LongRunningOperation`]).
pub trait RecognitionBackend {
    /// Submit a recognition request and return the initial state of the operation.
    fn start_recognition(&self, request: &RecognitionRequest) -> Result<OperationSnapshot>;

    /// Fetch the current state of a previously started operation.
    fn poll_operation(&self, name: &str) -> Result<OperationSnapshot>;
}

impl<B: RecognitionBackend + ?Sized> RecognitionBackend for &B {
    fn start_recognition(&self, request: &RecognitionRequest) -> Result<OperationSnapshot> {
        (**self).start_recognition(request)
    }

    fn poll_operation(&self, name: &str) -> Result<OperationSnapshot> {
        (**self).poll_operation(name)
    }
}

/// Point-in-time view of a long-running operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSnapshot {
    /// Server-assigned name used to poll the operation.
    pub name: String,
    pub progress: OperationProgress,
    pub state: OperationState,
}

/// Progress metadata reported while an operation runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationProgress {
    /// Approximate completion, `0..=100`.
    pub percent: Option<u8>,
    pub start_time: Option<DateTime<Utc>>,
    pub last_update_time: Option<DateTime<Utc>>,
}

impl OperationProgress {
    /// Time the service has spent on the operation as of its last update.
    pub fn service_elapsed(&self) -> Option<TimeDelta> {
        Some(self.last_update_time? - self.start_time?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationState {
    Running,
    Succeeded(RecognitionResponse),
    Failed(Status),
}

/// Failure reported by the service for a finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

impl OperationSnapshot {
    pub fn is_done(&self) -> bool {
        !matches!(self.state, OperationState::Running)
    }
}
