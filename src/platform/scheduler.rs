//! Frame scheduling
//!
//! The loop asks for one display frame at a time and may take the request
//! back. On the web this is `requestAnimationFrame`; tests fire frames by hand.

use std::cell::RefCell;
use std::rc::Rc;

/// Opaque id of a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

pub trait FrameScheduler {
    /// Ask for the next frame callback
    fn request_frame(&mut self) -> FrameHandle;
    /// Withdraw a request that has not fired yet
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Default)]
struct ManualInner {
    next_id: i32,
    pending: Vec<FrameHandle>,
    requested: u32,
    cancelled: u32,
}

/// Scheduler driven by hand. Clones share state, so a test keeps a handle to
/// see what the game asked for and to fire frames.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles requested and not yet fired or cancelled
    pub fn pending(&self) -> Vec<FrameHandle> {
        self.inner.borrow().pending.clone()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().pending.is_empty()
    }

    /// Consume the oldest outstanding request, as the display would
    pub fn take_next(&self) -> Option<FrameHandle> {
        let mut inner = self.inner.borrow_mut();
        if inner.pending.is_empty() {
            None
        } else {
            Some(inner.pending.remove(0))
        }
    }

    pub fn requested_count(&self) -> u32 {
        self.inner.borrow().requested
    }

    pub fn cancelled_count(&self) -> u32 {
        self.inner.borrow().cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let handle = FrameHandle(inner.next_id);
        inner.pending.push(handle);
        inner.requested += 1;
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut inner = self.inner.borrow_mut();
        let before = inner.pending.len();
        inner.pending.retain(|h| *h != handle);
        if inner.pending.len() != before {
            inner.cancelled += 1;
        }
    }
}

/// `requestAnimationFrame` scheduler (WASM only)
///
/// The callback is installed after the game exists, since it needs a handle
/// back to the game.
#[cfg(target_arch = "wasm32")]
pub mod raf {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::{FrameHandle, FrameScheduler};

    pub type FrameCallback = Closure<dyn FnMut(f64)>;

    #[derive(Clone, Default)]
    pub struct RafScheduler {
        callback: Rc<RefCell<Option<FrameCallback>>>,
    }

    impl RafScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn install(&self, callback: FrameCallback) {
            *self.callback.borrow_mut() = Some(callback);
        }
    }

    impl FrameScheduler for RafScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            let callback = self.callback.borrow();
            let id = match (web_sys::window(), callback.as_ref()) {
                (Some(window), Some(cb)) => window
                    .request_animation_frame(cb.as_ref().unchecked_ref())
                    .unwrap_or_else(|e| {
                        log::error!("requestAnimationFrame failed: {:?}", e);
                        0
                    }),
                _ => {
                    log::error!("Frame requested before the callback was installed");
                    0
                }
            };
            FrameHandle(id)
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle.0);
            }
        }
    }
}
