//! Render-thread affinity.

use std::thread::{self, ThreadId};

use crate::error::{GpuError, GpuResult};

/// The thread that owns the graphics context.
///
/// Captured when a [`ResourceManager`](crate::ResourceManager) is created;
/// every driver-touching call checks against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderThread {
    id: ThreadId,
}

impl RenderThread {
    /// Claim the calling thread.
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// `Err(WrongThread)` unless called on this thread.
    pub fn check(&self) -> GpuResult<()> {
        let found = thread::current().id();
        if found == self.id {
            Ok(())
        } else {
            tracing::error!(
                "GPU call from {:?} rejected; the graphics context belongs to {:?}",
                found,
                self.id
            );
            Err(GpuError::WrongThread {
                expected: self.id,
                found,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_passes_check() {
        let owner = RenderThread::current();
        assert!(owner.is_current());
        assert!(owner.check().is_ok());
    }

    #[test]
    fn test_other_thread_is_rejected() {
        let owner = RenderThread::current();
        let result = std::thread::spawn(move || owner.check()).join().unwrap();
        match result {
            Err(GpuError::WrongThread { expected, found }) => {
                assert_eq!(expected, owner.id());
                assert_ne!(found, expected);
            }
            other => panic!("expected WrongThread, got {:?}", other),
        }
    }
}
