//! Frame request coalescing.
//!
//! The host owns the actual frame primitive (`requestAnimationFrame` in the
//! browser). This only decides whether another frame must be asked for.

/// At most one frame is ever outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderLoop {
    scheduled: bool,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Ask for a redraw. Returns `true` when the host must schedule a frame;
    /// repeated requests before that frame runs return `false`.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.scheduled, true)
    }

    /// The scheduled frame ran. `keep_running` is the continuation predicate
    /// (pulse or flight in progress); returns whether to schedule again.
    pub fn frame_done(&mut self, keep_running: bool) -> bool {
        self.scheduled = keep_running;
        keep_running
    }

    /// Forget any outstanding frame (the host cancelled it on teardown).
    pub fn cancel(&mut self) {
        self.scheduled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_coalesce() {
        let mut frames = RenderLoop::new();
        assert!(frames.request());
        assert!(!frames.request());
        assert!(!frames.request());
        assert!(!frames.frame_done(false));
        assert!(frames.request());
    }

    #[test]
    fn test_loop_continues_while_predicate_holds() {
        let mut frames = RenderLoop::new();
        frames.request();
        assert!(frames.frame_done(true));
        // Requests during a running loop never double-schedule
        assert!(!frames.request());
        assert!(frames.frame_done(true));
        assert!(!frames.frame_done(false));
        assert!(!frames.is_scheduled());
    }

    #[test]
    fn test_cancel_allows_reschedule() {
        let mut frames = RenderLoop::new();
        frames.request();
        frames.cancel();
        assert!(frames.request());
    }
}
