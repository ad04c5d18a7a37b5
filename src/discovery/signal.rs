//! The signal contract: stateful detectors that observe every walk entry
//! once and generate candidate services after the walk completes.

use super::service::Service;
use crate::vfs::{paths, DirEntry, VfsError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared across a discovery run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), VfsError> {
        if self.is_canceled() {
            Err(VfsError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Per-run context handed to every signal callback.
#[derive(Debug, Clone)]
pub struct DiscoverContext {
    /// The walk root (`"."` for archive and git sources).
    pub root: String,
    /// Display name for services discovered at the walk root, where the
    /// directory basename would be meaningless (`"."`).
    pub root_name: String,
    pub cancel: CancelToken,
}

impl DiscoverContext {
    pub fn new(root: impl Into<String>, root_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            root_name: root_name.into(),
            cancel: CancelToken::new(),
        }
    }

    /// Service name for a config living in `dir`: the directory basename,
    /// or the source display name at the walk root.
    pub fn dir_name(&self, dir: &str) -> String {
        if dir == self.root || dir == "." {
            return self.root_name.clone();
        }
        paths::base(dir).to_string()
    }
}

/// A detector for one platform flavor.
///
/// Contract: `reset` runs before any observation; `observe_entry` is called
/// once per walk entry, never concurrently for the same signal;
/// `generate_services` runs exactly once per discovery, after the walk.
pub trait ServiceSignal {
    /// Stable identifier used for logging and tie-breaking diagnostics.
    fn id(&self) -> &'static str;

    /// Clears per-run state. Signals must be idempotent across runs after
    /// a reset.
    fn reset(&mut self);

    /// Observes one directory entry. Side effects only; expensive work
    /// belongs in `generate_services`.
    fn observe_entry(
        &mut self,
        ctx: &DiscoverContext,
        parent_path: &str,
        entry: &DirEntry,
    ) -> Result<(), VfsError>;

    /// Produces candidate services from the accumulated observations.
    fn generate_services(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, VfsError>;

    /// Static self-rating consumed by the triangulator (0-100).
    fn confidence(&self) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());

        token.cancel();
        assert!(token.is_canceled());
        assert!(matches!(token.check(), Err(VfsError::Canceled)));

        // Clones share the flag.
        let clone = token.clone();
        assert!(clone.is_canceled());
    }

    #[test]
    fn test_dir_name_falls_back_to_root_name() {
        let ctx = DiscoverContext::new(".", "myrepo");
        assert_eq!(ctx.dir_name("."), "myrepo");
        assert_eq!(ctx.dir_name("./services/api"), "api");
    }
}
