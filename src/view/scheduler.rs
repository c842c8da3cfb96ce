//! Render-pending latch between scene invalidations and the host's display refresh.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Identifies one requested frame. Tokens are never reused by a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// Host side of frame scheduling, such as a display-refresh callback registry.
pub trait FrameRequester {
    /// Asks the host to call back with `token` before the next paint.
    fn request_frame(&mut self, token: FrameToken);
    /// Withdraws a request. Hosts whose callbacks recur must stop firing `token`.
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Pending(FrameToken),
}

/// Coalesces any number of invalidations into at most one outstanding frame request.
pub struct FrameScheduler {
    state: FrameState,
    next_token: u64,
    requester: Box<dyn FrameRequester>,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("state", &self.state)
            .field("next_token", &self.next_token)
            .finish_non_exhaustive()
    }
}

impl FrameScheduler {
    pub fn new(requester: impl FrameRequester + 'static) -> Self {
        Self {
            state: FrameState::Idle,
            next_token: 1,
            requester: Box::new(requester),
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, FrameState::Pending(_))
    }

    fn request(&mut self) -> FrameToken {
        let token = FrameToken(self.next_token);
        self.next_token += 1;
        self.requester.request_frame(token);
        self.state = FrameState::Pending(token);
        token
    }

    /// Requests a frame unless one is already pending. Returns whether a request was made.
    pub fn invalidate(&mut self) -> bool {
        match self.state {
            FrameState::Idle => {
                let token = self.request();
                tracing::debug!(token = token.0, "frame requested");
                true
            }
            FrameState::Pending(token) => {
                tracing::debug!(token = token.0, "invalidation coalesced");
                false
            }
        }
    }

    /// Accepts the callback for `token`. Only the pending token is accepted; the latch is
    /// cleared before the caller draws so that changes made while drawing request a new frame.
    pub fn begin_frame(&mut self, token: FrameToken) -> bool {
        if self.state != FrameState::Pending(token) {
            return false;
        }
        self.requester.cancel_frame(token);
        self.state = FrameState::Idle;
        true
    }

    /// Replaces a pending request with a fresh one, or makes one if idle.
    pub fn supersede(&mut self) -> FrameToken {
        self.cancel();
        self.request()
    }

    pub fn cancel(&mut self) {
        if let FrameState::Pending(token) = self.state {
            self.requester.cancel_frame(token);
            self.state = FrameState::Idle;
        }
    }
}

#[derive(Debug, Default)]
struct ManualQueue {
    queued: VecDeque<FrameToken>,
    requests: u64,
    cancellations: u64,
}

/// Frame host driven by hand: requests queue up until [`ManualFrames::next_frame`] hands
/// them out. Clones share the queue, so one copy can go to the view and one stay with the
/// driver loop.
#[derive(Clone, Debug, Default)]
pub struct ManualFrames {
    inner: Rc<RefCell<ManualQueue>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest outstanding request, removed from the queue.
    pub fn next_frame(&self) -> Option<FrameToken> {
        self.inner.borrow_mut().queued.pop_front()
    }

    pub fn queued(&self) -> Vec<FrameToken> {
        self.inner.borrow().queued.iter().copied().collect()
    }

    pub fn requests(&self) -> u64 {
        self.inner.borrow().requests
    }

    pub fn cancellations(&self) -> u64 {
        self.inner.borrow().cancellations
    }
}

impl FrameRequester for ManualFrames {
    fn request_frame(&mut self, token: FrameToken) {
        let mut q = self.inner.borrow_mut();
        q.queued.push_back(token);
        q.requests += 1;
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let mut q = self.inner.borrow_mut();
        q.queued.retain(|t| *t != token);
        q.cancellations += 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/scheduler.rs"]
mod tests;
