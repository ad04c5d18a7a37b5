pub mod schema;

pub use schema::{DiscoveryReport, EnvReport, ServiceEnv};
