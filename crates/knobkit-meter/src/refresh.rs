//! Display refresh driver for meters and scopes.
//!
//! A [`RefreshLoop`] calls a frame callback at a fixed interval until it is
//! stopped, either through a [`StopHandle`] or by the callback failing. A
//! failing callback is logged and ends the loop; it is never retried.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default frame interval, roughly 60 frames per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Stops a [`RefreshLoop`] from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the loop to stop before its next frame.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fixed-interval frame driver.
#[derive(Debug)]
pub struct RefreshLoop {
    running: Arc<AtomicBool>,
    interval: Duration,
    frames: u64,
}

impl Default for RefreshLoop {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl RefreshLoop {
    /// Creates a stopped loop.
    pub fn new(interval: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            interval,
            frames: 0,
        }
    }

    /// Marks the loop as running.
    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
    }

    /// Stops the loop before its next frame.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Whether frames are being delivered.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// A handle that stops this loop.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Frames delivered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frame interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Delivers one frame if running. Returns whether the loop is still running.
    ///
    /// An `Err` from `frame` stops the loop.
    pub fn tick<E, F>(&mut self, frame: F) -> bool
    where
        E: Display,
        F: FnOnce() -> Result<(), E>,
    {
        if !self.is_running() {
            return false;
        }
        self.frames += 1;
        if let Err(e) = frame() {
            tracing::warn!("refresh loop stopped after frame {}: {e}", self.frames);
            self.stop();
            return false;
        }
        self.is_running()
    }

    /// Starts the loop and delivers frames every `interval` until stopped.
    pub fn run<E, F>(&mut self, mut frame: F)
    where
        E: Display,
        F: FnMut() -> Result<(), E>,
    {
        self.start();
        let ticker = crossbeam_channel::tick(self.interval);
        tracing::debug!("refresh loop running every {:?}", self.interval);
        while self.is_running() {
            if ticker.recv().is_err() {
                break;
            }
            if !self.tick(&mut frame) {
                break;
            }
        }
        tracing::debug!("refresh loop finished after {} frames", self.frames);
    }
}
