use clap::Parser;
use std::process;
use tracing::{debug, error, Level};
use turnout::cli::{output, CliArgs, Commands, OutputFormat, SourceArgs};
use turnout::config::TurnoutConfig;
use turnout::discovery::{discover, CancelToken, DiscoveryError};
use turnout::env::extract_service_env;
use turnout::output::{DiscoveryReport, EnvReport, ServiceEnv};
use turnout::util::logging::{self, LoggingConfig};
use turnout::VERSION;

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);
    debug!("turnout v{} starting", VERSION);

    let config = match TurnoutConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match &args.command {
        Commands::Discover(source) => handle_discover(source, &config),
        Commands::Env(source) => handle_env(source, &config),
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        logging::parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str =
            std::env::var("TURNOUT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        logging::parse_level(&level_str)
    };

    let use_json = std::env::var("TURNOUT_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    logging::init_logging(LoggingConfig { level, use_json });
}

fn source_uri(source: &SourceArgs) -> String {
    source.source.clone().unwrap_or_else(|| ".".to_string())
}

fn handle_discover(source: &SourceArgs, config: &TurnoutConfig) -> i32 {
    let uri = source_uri(source);

    let (services, resolved, _ctx) = match discover(&uri, config, CancelToken::new()) {
        Ok(result) => result,
        Err(e) => return report_discovery_error(e),
    };
    if let Err(e) = resolved.vfs.cleanup() {
        debug!(error = %e, "source cleanup failed");
    }

    match source.format {
        OutputFormat::Human => print!("{}", output::render_services(&services)),
        OutputFormat::Json => match DiscoveryReport::new(services).to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("JSON export failed: {}", e);
                return 1;
            }
        },
    }

    0
}

fn handle_env(source: &SourceArgs, config: &TurnoutConfig) -> i32 {
    let uri = source_uri(source);

    let (services, resolved, _ctx) = match discover(&uri, config, CancelToken::new()) {
        Ok(result) => result,
        Err(e) => return report_discovery_error(e),
    };

    let report = EnvReport {
        services: services
            .iter()
            .map(|service| ServiceEnv {
                name: service.name.clone(),
                variables: extract_service_env(resolved.vfs.as_ref(), service, &services),
            })
            .collect(),
    };

    if let Err(e) = resolved.vfs.cleanup() {
        debug!(error = %e, "source cleanup failed");
    }

    match source.format {
        OutputFormat::Human => print!("{}", output::render_env_report(&report)),
        OutputFormat::Json => match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("JSON export failed: {}", e);
                return 1;
            }
        },
    }

    0
}

fn report_discovery_error(err: DiscoveryError) -> i32 {
    error!("{}", err);
    1
}
