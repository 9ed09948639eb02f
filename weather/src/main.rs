mod config;

use clap::{Args, Parser};
use config::{CommonConfig, Config, ConfigError};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use weather_api::errors::WeatherApiError;

#[derive(Parser)]
enum CliCommand {
    /// Run the weather API
    Api(ApiArgs),
}

#[derive(Args)]
struct ApiArgs {
    #[arg(long)]
    config_file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("config file has no `api` section")]
    MissingApiConfig,
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error("could not initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] WeatherApiError),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let result = match cli {
        CliCommand::Api(args) => run_api(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Exiting: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_api(args: ApiArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file)?;
    let api_config = config.api.ok_or(CliError::MissingApiConfig)?;

    // Sentry must be initialized before the runtime starts its threads.
    let _sentry = init_logging(&config.common)?;
    init_metrics(&config.common)?;

    tracing::info!("Starting weather API");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(weather_api::run(api_config))?;

    Ok(())
}

fn init_logging(common: &CommonConfig) -> Result<Option<sentry::ClientInitGuard>, CliError> {
    let guard = common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(sentry_layer)
        .try_init()?;

    Ok(guard)
}

fn init_metrics(common: &CommonConfig) -> Result<(), CliError> {
    let Some(metrics_config) = &common.metrics else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(&metrics_config.statsd_host, metrics_config.statsd_port)
        .build(Some("weather"))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder)
        .map_err(|_| CliError::Metrics("a metrics recorder is already installed".into()))?;

    shared::metrics_defs::describe_all(weather_api::metrics_defs::ALL_METRICS);
    tracing::info!(
        statsd_host = %metrics_config.statsd_host,
        statsd_port = metrics_config.statsd_port,
        "Metrics enabled"
    );

    Ok(())
}
