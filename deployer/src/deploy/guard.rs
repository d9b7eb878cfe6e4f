//! The `action in progress` flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared view of whether a submission is running
#[derive(Debug, Clone, Default)]
pub struct ActionFlag(Arc<AtomicBool>);

impl ActionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Set the flag, or `None` if it is already set
    pub fn try_acquire(&self) -> Option<InProgressGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InProgressGuard {
                flag: self.0.clone(),
            })
    }
}

/// Clears the flag when dropped, whichever way the submission ends
#[derive(Debug)]
pub struct InProgressGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
