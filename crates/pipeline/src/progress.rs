//! Progress callbacks.
//!
//! Callbacks are caller code running inside a generation. A panicking
//! callback is logged and otherwise ignored so it cannot fail the shot.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Batch progress: `(index, total, message)`, with `index` zero-based.
pub type BatchProgressFn = dyn Fn(usize, usize, &str) + Send + Sync;

/// Sampler progress within one shot: `(current_step, total_steps)`.
pub type StepProgressFn = dyn Fn(u32, u32) + Send + Sync;

fn guarded(callback: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!(callback, "Progress callback panicked, ignoring");
    }
}

/// Optional step callback carried inside a generation request.
#[derive(Clone, Default)]
pub struct StepHook(Option<Arc<StepProgressFn>>);

impl StepHook {
    pub fn new(callback: Arc<StepProgressFn>) -> Self {
        Self(Some(callback))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn report(&self, current: u32, total: u32) {
        if let Some(callback) = &self.0 {
            guarded("step", || callback(current, total));
        }
    }
}

impl fmt::Debug for StepHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StepHook").field(&self.is_set()).finish()
    }
}

pub(crate) fn report_batch(
    callback: Option<&BatchProgressFn>,
    index: usize,
    total: usize,
    message: &str,
) {
    if let Some(callback) = callback {
        guarded("batch", || callback(index, total, message));
    }
}
