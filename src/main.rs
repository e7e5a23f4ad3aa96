//! tcping command-line entry point

use clap::Parser;
use std::process;
use tcping::{
    build_info,
    cli::{resolve_color, Cli},
    config::{build_target, display_config_summary, load_config, EnvManager},
    default_registry,
    error::{AppError, Result},
    logging::{Logger, LoggerFactory},
    output::ResultFormatter,
    Config, ProbeOptions, Scheduler, Summary, PKG_NAME,
};

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{} panicked: {}", PKG_NAME, panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("{}", AppError::config(message).format_for_console(cli.use_colors()));
        process::exit(1);
    }

    let use_color = cli.use_colors();
    let outcome = run(cli).await.and_then(|summary| {
        if summary.total > 0 && summary.successes == 0 {
            Err(AppError::test_execution(format!("all {} probes failed", summary.total)))
        } else {
            Ok(())
        }
    });

    if let Err(err) = outcome {
        eprintln!("{}", err.format_for_console(use_color));
        print_error_suggestions(&err);
        process::exit(err.exit_code());
    }
}

/// Print hints for errors raised before the first probe
fn print_error_suggestions(error: &AppError) {
    if !error.is_startup_error() {
        return;
    }
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("{}", EnvManager::display_env_help());
        }
        AppError::UnsupportedProtocol(_) => {
            eprintln!();
            eprintln!("Supported protocols: tcp, http, https");
        }
        _ => {}
    }
    eprintln!("Run '{} --help' for usage.", PKG_NAME);
}

async fn run(cli: Cli) -> Result<Summary> {
    let config = load_config(cli)?;
    let factory = LoggerFactory::new(config.clone());
    let logger = factory.create_logger("tcping").await;

    let outcome = execute(&config, &factory, &logger).await;
    if let Err(err) = &outcome {
        logger.debug("Run aborted").error_info(err).log().await;
    }
    outcome
}

async fn execute(config: &Config, factory: &LoggerFactory, logger: &Logger) -> Result<Summary> {
    if config.debug {
        eprintln!("{}", build_info());
        eprintln!("Session: {}", factory.session_id());
        eprintln!("{}", display_config_summary(config));
        for warning in EnvManager::validate_current_env() {
            logger.warn(&warning).log().await;
        }
    }

    let (target, url) = build_target(config)?;
    let options = ProbeOptions::from_config(config)?;
    logger
        .debug("Building probe")
        .field("url", url.as_str())
        .field("resolver", options.resolver.describe())
        .log()
        .await;
    let probe = default_registry().build(&target.protocol, &url, &options)?;

    let formatter = ResultFormatter::new(
        std::io::stdout(),
        url.to_string(),
        resolve_color(config.enable_color),
    );
    let scheduler_logger = factory.create_logger("scheduler").await;
    scheduler_logger.add_context_field("target", url.as_str()).await;
    let mut scheduler = Scheduler::new(target, probe, formatter).with_logger(scheduler_logger);

    let stop = scheduler.stop_handle();
    let signal_logger = logger.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_logger.debug("Interrupt received").log().await;
            stop.stop();
        }
    });

    scheduler.run().await
}
