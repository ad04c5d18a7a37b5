//! The signal set: one detector per deployment platform flavor.
//!
//! Signals are registered in a fixed order; the triangulator resolves
//! confidence ties to the first-registered signal, so the order here is
//! part of the observable contract.

mod app_json;
mod compose;
mod digitalocean;
mod dockerfile;
mod fly;
mod framework;
mod helm;
mod netlify;
mod package;
mod procfile;
mod railway;
mod render;
mod serverless;
mod skaffold;
mod vercel;

pub use app_json::HerokuAppJsonSignal;
pub use compose::DockerComposeSignal;
pub use digitalocean::DigitalOceanAppSignal;
pub use dockerfile::DockerfileSignal;
pub use fly::FlySignal;
pub use framework::FrameworkSignal;
pub use helm::HelmSignal;
pub use netlify::NetlifySignal;
pub use package::PackageSignal;
pub use procfile::HerokuProcfileSignal;
pub use railway::RailwaySignal;
pub use render::RenderSignal;
pub use serverless::ServerlessSignal;
pub use skaffold::SkaffoldSignal;
pub use vercel::VercelSignal;

use super::signal::ServiceSignal;
use crate::vfs::Vfs;
use std::sync::Arc;

/// All fifteen detectors in registration order.
pub fn default_signals(vfs: Arc<dyn Vfs>) -> Vec<Box<dyn ServiceSignal>> {
    vec![
        Box::new(DockerComposeSignal::new(vfs.clone())),
        Box::new(DockerfileSignal::new()),
        Box::new(RailwaySignal::new(vfs.clone())),
        Box::new(FlySignal::new(vfs.clone())),
        Box::new(RenderSignal::new(vfs.clone())),
        Box::new(DigitalOceanAppSignal::new(vfs.clone())),
        Box::new(VercelSignal::new(vfs.clone())),
        Box::new(NetlifySignal::new(vfs.clone())),
        Box::new(HerokuProcfileSignal::new(vfs.clone())),
        Box::new(HerokuAppJsonSignal::new(vfs.clone())),
        Box::new(HelmSignal::new(vfs.clone())),
        Box::new(SkaffoldSignal::new(vfs.clone())),
        Box::new(ServerlessSignal::new(vfs.clone())),
        Box::new(FrameworkSignal::new()),
        Box::new(PackageSignal::new(vfs)),
    ]
}
