//! Asynchronous acquisition of input sources.
//!
//! Opening a live input (a microphone, a device channel) may need a user
//! permission prompt or a slow device probe. [`request_source()`] runs a
//! [`SourceProvider`] on a worker thread and hands back a [`PendingSource`]
//! that the control domain polls or waits on. The outcome is either an
//! [`AcquiredSource`] or an [`AcquireError`]; nothing is retried, the caller
//! decides whether to ask again.

use std::task::Poll;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, bounded};
use thiserror::Error;

/// Why a source could not be acquired.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// The user or the platform refused access.
    #[error("access to '{0}' was denied")]
    Denied(String),

    /// No matching source exists or it is busy.
    #[error("source '{0}' is unavailable")]
    Unavailable(String),

    /// The provider went away without answering.
    #[error("the source provider stopped before answering")]
    Disconnected,

    /// The result was already taken from this request.
    #[error("the acquisition result was already taken")]
    Consumed,
}

/// A granted input source, ready to be wired with
/// [`RenderContext::add_input()`](crate::RenderContext::add_input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredSource {
    /// Host input channel the source arrives on.
    pub channel: usize,
    /// Human-readable name, for logs and UI.
    pub label: String,
}

/// Something that can grant an input source, possibly slowly.
pub trait SourceProvider: Send + 'static {
    /// Blocks until the source is granted or refused.
    fn acquire(&mut self) -> Result<AcquiredSource, AcquireError>;
}

impl<F> SourceProvider for F
where
    F: FnMut() -> Result<AcquiredSource, AcquireError> + Send + 'static,
{
    fn acquire(&mut self) -> Result<AcquiredSource, AcquireError> {
        self()
    }
}

/// Outcome of a [`request_source()`] call that may not have arrived yet.
#[derive(Debug)]
pub struct PendingSource {
    rx: Receiver<Result<AcquiredSource, AcquireError>>,
    taken: bool,
}

impl PendingSource {
    /// Checks for the outcome without blocking.
    ///
    /// Returns `Poll::Ready` exactly once with the outcome; later calls
    /// report [`AcquireError::Consumed`].
    pub fn poll(&mut self) -> Poll<Result<AcquiredSource, AcquireError>> {
        if self.taken {
            return Poll::Ready(Err(AcquireError::Consumed));
        }
        match self.rx.try_recv() {
            Ok(result) => Poll::Ready(self.finish(result)),
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => Poll::Ready(self.finish(Err(AcquireError::Disconnected))),
        }
    }

    /// Waits up to `timeout` for the outcome. Returns `None` on timeout.
    pub fn wait_timeout(
        &mut self,
        timeout: Duration,
    ) -> Option<Result<AcquiredSource, AcquireError>> {
        if self.taken {
            return Some(Err(AcquireError::Consumed));
        }
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(self.finish(result)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.finish(Err(AcquireError::Disconnected))),
        }
    }

    /// Blocks until the outcome arrives.
    pub fn wait(mut self) -> Result<AcquiredSource, AcquireError> {
        if self.taken {
            return Err(AcquireError::Consumed);
        }
        let result = self.rx.recv().unwrap_or(Err(AcquireError::Disconnected));
        self.finish(result)
    }

    fn finish(
        &mut self,
        result: Result<AcquiredSource, AcquireError>,
    ) -> Result<AcquiredSource, AcquireError> {
        self.taken = true;
        match &result {
            Ok(source) => tracing::debug!(
                "source '{}' acquired on channel {}",
                source.label,
                source.channel
            ),
            Err(e) => tracing::warn!("source acquisition failed: {e}"),
        }
        result
    }
}

/// Starts acquiring a source on a worker thread.
///
/// If the worker cannot be spawned the request resolves to
/// [`AcquireError::Disconnected`].
pub fn request_source<P: SourceProvider>(mut provider: P) -> PendingSource {
    let (tx, rx) = bounded(1);
    let spawned = thread::Builder::new()
        .name("knobkit-acquire".to_string())
        .spawn(move || {
            let _ = tx.send(provider.acquire());
        });
    if let Err(e) = spawned {
        tracing::error!("failed to spawn source acquisition thread: {e}");
    }
    PendingSource { rx, taken: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mic() -> Result<AcquiredSource, AcquireError> {
        Ok(AcquiredSource {
            channel: 0,
            label: "mic".to_string(),
        })
    }

    #[test]
    fn granted_source_resolves_once() {
        let mut pending = request_source(mic);
        let result = pending.wait_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.unwrap().label, "mic");
        assert_eq!(pending.poll(), Poll::Ready(Err(AcquireError::Consumed)));
    }

    #[test]
    fn denial_is_reported() {
        let pending = request_source(|| Err(AcquireError::Denied("mic".to_string())));
        assert_eq!(pending.wait(), Err(AcquireError::Denied("mic".to_string())));
    }

    #[test]
    fn pending_until_provider_answers() {
        let (go_tx, go_rx) = bounded::<()>(1);
        let mut pending = request_source(move || {
            go_rx.recv().map_err(|_| AcquireError::Disconnected)?;
            mic()
        });
        assert_eq!(pending.poll(), Poll::Pending);
        go_tx.send(()).unwrap();
        let result = pending.wait_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.unwrap().channel, 0);
    }

    #[test]
    fn panicking_provider_disconnects() {
        let pending = request_source(|| -> Result<AcquiredSource, AcquireError> {
            panic!("device probe crashed")
        });
        assert_eq!(pending.wait(), Err(AcquireError::Disconnected));
    }
}
