use std::time::Instant;

use tracing::debug;

use crate::backend::{OperationSnapshot, OperationState, RecognitionBackend};
use crate::opts::PollOpts;
use crate::speech::{RecognitionRequest, RecognitionResponse};
use crate::{Error, Result};

/// Handle to a recognition running on the service side.
///
/// The handle borrows the backend that started it, so it can only be awaited while the client is
/// alive. `wait` consumes the handle: an operation resolves exactly once.
pub struct LongRunningOperation<'a, B: RecognitionBackend + ?Sized> {
    backend: &'a B,
    snapshot: OperationSnapshot,
}

impl<'a, B: RecognitionBackend + ?Sized> LongRunningOperation<'a, B> {
    /// Submit `request` and return a handle to the resulting operation.
    pub fn start(backend: &'a B, request: &RecognitionRequest) -> Result<Self> {
        let snapshot = backend.start_recognition(request)?;
        debug!(operation = %snapshot.name, done = snapshot.is_done(), "recognition started");
        Ok(Self { backend, snapshot })
    }

    pub fn name(&self) -> &str {
        &self.snapshot.name
    }

    /// Whether the last observed state was terminal.
    pub fn is_done(&self) -> bool {
        self.snapshot.is_done()
    }

    /// Block until the operation resolves.
    pub fn wait(self, poll: &PollOpts) -> Result<RecognitionResponse> {
        self.wait_with(poll, |_| {})
    }

    /// Block until the operation resolves, reporting every observed snapshot.
    ///
    /// `on_progress` sees the snapshot taken at submission time and the one from each poll,
    /// including the final terminal snapshot.
    pub fn wait_with<F>(
        mut self,
        poll: &PollOpts,
        mut on_progress: F,
    ) -> Result<RecognitionResponse>
    where
        F: FnMut(&OperationSnapshot),
    {
        let started = Instant::now();
        on_progress(&self.snapshot);

        loop {
            match self.snapshot.state {
                OperationState::Succeeded(response) => {
                    debug!(
                        operation = %self.snapshot.name,
                        results = response.results.len(),
                        "recognition finished"
                    );
                    return Ok(response);
                }
                OperationState::Failed(status) => {
                    return Err(Error::Service {
                        code: status.code,
                        message: status.message,
                    });
                }
                OperationState::Running => {}
            }

            let mut delay = poll.interval;
            if let Some(limit) = poll.timeout {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    return Err(Error::Timeout {
                        operation: self.snapshot.name,
                        limit,
                    });
                }
                delay = delay.min(limit - elapsed);
            }

            if !delay.is_zero() {
                std::thread::sleep(delay);
            }

            self.snapshot = self.backend.poll_operation(&self.snapshot.name)?;
            debug!(
                operation = %self.snapshot.name,
                percent = ?self.snapshot.progress.percent,
                service_elapsed = ?self.snapshot.progress.service_elapsed(),
                "polled operation"
            );
            on_progress(&self.snapshot);
        }
    }
}
