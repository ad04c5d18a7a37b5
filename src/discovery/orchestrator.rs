//! The discovery orchestrator: a single-pass iterative walk that feeds
//! every directory entry to every signal, then collects and triangulates
//! the generated services.

use super::ignore::should_ignore_directory;
use super::service::Service;
use super::signal::{DiscoverContext, ServiceSignal};
use super::signals;
use super::triangulate::{triangulate, SignalResult};
use crate::vfs::{paths, Vfs, VfsError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Surfaced only when the walk produced no services at all; partial
    /// success always wins over noisy credentials.
    #[error("service discovery failed with authentication or permission error: {0}")]
    Critical(#[source] VfsError),

    /// The source URI or path was rejected before any walk began.
    #[error("invalid source: {0}")]
    InvalidSource(#[source] VfsError),

    #[error("discovery canceled")]
    Canceled,
}

/// Drives one discovery run over a VFS with a registered set of signals.
pub struct ServiceDiscovery {
    vfs: Arc<dyn Vfs>,
    signals: Vec<Box<dyn ServiceSignal>>,
    max_depth: usize,
}

impl ServiceDiscovery {
    /// Registers the default signal set in its fixed order; the order is
    /// the deterministic tie-break for the triangulator.
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        let signal_set = signals::default_signals(vfs.clone());
        Self::with_signals(vfs, signal_set)
    }

    pub fn with_signals(vfs: Arc<dyn Vfs>, signals: Vec<Box<dyn ServiceSignal>>) -> Self {
        Self {
            vfs,
            signals,
            max_depth: 4,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walks the tree once, lets every signal observe every entry, then
    /// asks each signal for services and triangulates the results.
    pub fn discover(&mut self, ctx: &DiscoverContext) -> Result<Vec<Service>, DiscoveryError> {
        for signal in &mut self.signals {
            signal.reset();
        }

        let mut last_critical_error: Option<VfsError> = None;
        self.walk(ctx, &mut last_critical_error)?;

        let mut results: Vec<SignalResult> = Vec::new();
        for signal in &mut self.signals {
            ctx.cancel.check().map_err(|_| DiscoveryError::Canceled)?;

            match signal.generate_services(ctx) {
                Ok(services) => {
                    if !services.is_empty() {
                        debug!(
                            signal = signal.id(),
                            count = services.len(),
                            "signal generated services"
                        );
                        results.push(SignalResult {
                            services,
                            confidence: signal.confidence(),
                            signal_id: signal.id(),
                        });
                    }
                }
                Err(e) => {
                    if e.is_critical() {
                        last_critical_error = Some(e.clone());
                    }
                    warn!(signal = signal.id(), error = %e, "signal generation failed");
                }
            }
        }

        if results.is_empty() {
            if let Some(critical) = last_critical_error {
                return Err(DiscoveryError::Critical(critical));
            }
        }

        Ok(triangulate(&results))
    }

    /// Iterative walk with an explicit stack. Each directory is read
    /// exactly once and each entry observed exactly once per signal;
    /// additional passes would duplicate an O(n) archive-index scan on the
    /// archive backend.
    fn walk(
        &mut self,
        ctx: &DiscoverContext,
        last_critical_error: &mut Option<VfsError>,
    ) -> Result<(), DiscoveryError> {
        let mut stack: Vec<(String, usize)> = vec![(ctx.root.clone(), 0)];

        while let Some((path, depth)) = stack.pop() {
            ctx.cancel.check().map_err(|_| DiscoveryError::Canceled)?;

            if depth > self.max_depth {
                continue;
            }
            if should_ignore_directory(paths::base(&path)) {
                trace!(%path, "skipping ignored directory");
                continue;
            }

            for item in self.vfs.read_dir(&path) {
                let entry = match item {
                    Ok(entry) => entry,
                    Err(e) => {
                        if e.is_critical() {
                            *last_critical_error = Some(e);
                        }
                        continue;
                    }
                };

                for signal in &mut self.signals {
                    if let Err(e) = signal.observe_entry(ctx, &path, &entry) {
                        if matches!(e, VfsError::Canceled) {
                            return Err(DiscoveryError::Canceled);
                        }
                        if e.is_critical() {
                            *last_critical_error = Some(e.clone());
                        }
                        trace!(signal = signal.id(), error = %e, "observation failed");
                    }
                }

                if entry.is_dir {
                    stack.push((paths::join(&path, &entry.name), depth + 1));
                }
            }
        }

        Ok(())
    }
}
