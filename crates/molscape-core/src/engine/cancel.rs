use super::error::EngineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag a caller sets to stop an in-flight derivation.
///
/// Derivations poll the token between batches and iterations and return
/// [`EngineError::Cancelled`] instead of partial geometry.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn check(&self, phase: &'static str) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled { phase })
        } else {
            Ok(())
        }
    }
}
