use super::*;

#[test]
fn invalidations_coalesce_into_one_request() {
    let frames = ManualFrames::new();
    let mut s = FrameScheduler::new(frames.clone());

    assert!(s.invalidate());
    assert!(!s.invalidate());
    assert!(!s.invalidate());
    assert_eq!(frames.requests(), 1);
    assert_eq!(frames.queued().len(), 1);
    assert!(s.is_pending());
}

#[test]
fn begin_frame_clears_the_latch_first() {
    let frames = ManualFrames::new();
    let mut s = FrameScheduler::new(frames.clone());
    s.invalidate();
    let token = frames.next_frame().unwrap();

    assert!(s.begin_frame(token));
    assert_eq!(s.state(), FrameState::Idle);
    assert_eq!(frames.cancellations(), 1);

    assert!(s.invalidate());
    let next = frames.next_frame().unwrap();
    assert_ne!(next, token);
}

#[test]
fn stale_and_unknown_tokens_are_ignored() {
    let frames = ManualFrames::new();
    let mut s = FrameScheduler::new(frames.clone());
    assert!(!s.begin_frame(FrameToken(42)));

    s.invalidate();
    let old = frames.next_frame().unwrap();
    let fresh = s.supersede();
    assert!(!s.begin_frame(old));
    assert_eq!(s.state(), FrameState::Pending(fresh));
    assert!(s.begin_frame(fresh));
    assert!(!s.begin_frame(fresh));
}

#[test]
fn cancel_withdraws_the_request() {
    let frames = ManualFrames::new();
    let mut s = FrameScheduler::new(frames.clone());
    s.invalidate();
    s.cancel();
    assert!(frames.queued().is_empty());
    assert!(!s.is_pending());
    s.cancel();
    assert_eq!(frames.cancellations(), 1);
}
