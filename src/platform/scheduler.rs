//! Frame scheduling
//!
//! The loop re-arms the next frame before running the current one, so the
//! callback chain keeps itself alive until its [`LoopHandle`] is cancelled.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Receives the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Something that can call back once at the next display frame
pub trait FrameScheduler {
    fn schedule_next_frame(&self, callback: FrameCallback);
}

/// Stops a running loop from re-arming
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    cancelled: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Start a self-sustaining frame loop calling `on_frame` once per frame
pub fn start_loop<S, F>(scheduler: Rc<S>, on_frame: F) -> LoopHandle
where
    S: FrameScheduler + ?Sized + 'static,
    F: FnMut(f64) + 'static,
{
    let handle = LoopHandle::default();
    arm(scheduler, Rc::new(RefCell::new(on_frame)), handle.clone());
    handle
}

fn arm<S, F>(scheduler: Rc<S>, on_frame: Rc<RefCell<F>>, handle: LoopHandle)
where
    S: FrameScheduler + ?Sized + 'static,
    F: FnMut(f64) + 'static,
{
    let next_scheduler = scheduler.clone();
    scheduler.schedule_next_frame(Box::new(move |timestamp| {
        if handle.is_cancelled() {
            return;
        }
        // Re-arm first so the chain survives whatever the frame body does
        arm(next_scheduler, on_frame.clone(), handle);
        let mut body = on_frame.borrow_mut();
        (*body)(timestamp);
    }));
}

/// Scheduler driven by hand: headless runs and tests
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<VecDeque<FrameCallback>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks waiting for a frame
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Deliver one frame at `timestamp_ms`. Returns false if nothing was armed.
    pub fn fire(&self, timestamp_ms: f64) -> bool {
        // Pop before calling: the callback re-arms into the same queue
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some(callback) => {
                callback(timestamp_ms);
                true
            }
            None => false,
        }
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next_frame(&self, callback: FrameCallback) {
        self.pending.borrow_mut().push_back(callback);
    }
}
