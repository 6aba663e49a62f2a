//! Per-frame callback registration
//!
//! A [`FrameLoop`] owns at most one outstanding registration. Each scene
//! carries its own loop, so several scenes (or a test driving `update()` by
//! hand) never share animation state.

/// Opaque id of one outstanding frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Host service that fires a callback once at the next display frame
pub trait FrameScheduler {
    /// Register interest in the next frame
    fn request_frame(&mut self) -> FrameHandle;
    /// Withdraw a registration that has not fired yet
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Cancellation token for a recurring per-frame callback
#[derive(Debug, Default)]
pub struct FrameLoop {
    pending: Option<FrameHandle>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Request the first frame. Returns false if already running.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(scheduler.request_frame());
        true
    }

    /// Cancel the outstanding request. Returns false if already stopped.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        match self.pending.take() {
            Some(handle) => {
                scheduler.cancel_frame(handle);
                true
            }
            None => false,
        }
    }

    /// Accept a fired frame and register the next one.
    ///
    /// Returns false (and requests nothing) for a handle that is not the live
    /// registration, e.g. one that fired after `stop`.
    pub fn fire(&mut self, handle: FrameHandle, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.pending != Some(handle) {
            return false;
        }
        self.pending = Some(scheduler.request_frame());
        true
    }
}

/// Scheduler for headless runs and tests: frames fire only when the driver
/// calls [`ManualScheduler::due`].
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: i32,
    outstanding: Vec<FrameHandle>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every outstanding request, as a vsync would
    pub fn due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.outstanding)
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Number of successful cancellations
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.outstanding.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.outstanding.len();
        self.outstanding.retain(|h| *h != handle);
        if self.outstanding.len() < before {
            self.cancelled += 1;
        }
    }
}
