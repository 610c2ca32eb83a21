use std::process::ExitCode;

use icon_converter::cli;
use icon_converter::config::Config;
use icon_converter::convert;

fn setup_logging() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_dir = Config::app_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let log_path = log_dir.join("debug.log");

    // Truncated on every run, only the last conversion is kept
    let file = std::fs::File::create(&log_path).ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stdout);

    if let Some(file) = file {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .init();
    }
}

fn main() -> ExitCode {
    setup_logging();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        Config::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, output) = match cli::parse_args(&args) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!("{}", e);
            tracing::warn!("{}", cli::USAGE);
            return ExitCode::from(cli::usage_status(&config));
        }
    };

    let result = convert::run(&input, &output, &config);
    ExitCode::from(cli::report(&result, &config))
}
