//! Service discovery: a single-pass walk feeding fifteen platform signals,
//! triangulated into a deduplicated service inventory.

mod ignore;
mod orchestrator;
mod service;
mod signal;
pub mod signals;
mod triangulate;

pub use orchestrator::{DiscoveryError, ServiceDiscovery};
pub use service::{Build, ConfigRef, Network, Runtime, Service};
pub use signal::{CancelToken, DiscoverContext, ServiceSignal};
pub use triangulate::{triangulate, SignalResult, EXPLICIT_CONFIDENCE};

use crate::config::TurnoutConfig;
use crate::vfs::{resolve_source, ResolvedSource, VfsError};
use tracing::info;

/// Resolves a source URI and runs discovery over it with the default
/// signal set. The returned source keeps the VFS alive for follow-up work
/// (environment extraction); callers invoke `cleanup` when done.
pub fn discover(
    uri: &str,
    config: &TurnoutConfig,
    cancel: CancelToken,
) -> Result<(Vec<Service>, ResolvedSource, DiscoverContext), DiscoveryError> {
    let source = resolve_source(uri, config)?;

    let mut ctx = DiscoverContext::new(source.root.clone(), source.root_name.clone());
    ctx.cancel = cancel;

    let mut discovery =
        ServiceDiscovery::new(source.vfs.clone()).with_max_depth(config.max_depth);
    let services = discovery.discover(&ctx)?;

    info!(uri, count = services.len(), "discovery complete");
    Ok((services, source, ctx))
}

/// Variant that cleans up the source before returning, for callers that
/// only need the service list.
pub fn discover_services(
    uri: &str,
    config: &TurnoutConfig,
) -> Result<Vec<Service>, DiscoveryError> {
    let (services, source, _ctx) = discover(uri, config, CancelToken::new())?;
    if let Err(e) = source.vfs.cleanup() {
        tracing::warn!(error = %e, "source cleanup failed");
    }
    Ok(services)
}

impl From<VfsError> for DiscoveryError {
    fn from(err: VfsError) -> Self {
        match err {
            VfsError::Canceled => DiscoveryError::Canceled,
            VfsError::InvalidInput(_) => DiscoveryError::InvalidSource(err),
            _ => DiscoveryError::Critical(err),
        }
    }
}
