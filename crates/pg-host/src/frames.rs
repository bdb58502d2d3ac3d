//! Animation-frame callback queue (`requestAnimationFrame` / `cancelAnimationFrame`).

/// Non-zero handle identifying one pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

/// Queue of callbacks waiting for the next rendered frame.
#[derive(Debug, Clone)]
pub struct FrameScheduler<T> {
    next_id: u64,
    pending: Vec<(FrameHandle, T)>,
    frames_run: u64,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
            frames_run: 0,
        }
    }
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, task: T) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.pending.push((handle, task));
        handle
    }

    /// Drops a pending callback. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(pending, _)| *pending != handle);
        before != self.pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }

    /// Starts a frame: drains every callback requested so far, in request order.
    ///
    /// Callbacks requested while the drained ones run wait for the following frame.
    pub fn take_due(&mut self) -> Vec<(FrameHandle, T)> {
        self.frames_run = self.frames_run.saturating_add(1);
        std::mem::take(&mut self.pending)
    }
}
