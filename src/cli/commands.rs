//! CLI command implementations

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::api::{ApiHandler, Response};
use crate::catalog::Catalog;
use crate::config::{CatalogConfig, Settings};
use crate::index::PeriodicIndexer;
use crate::notify::LoggingListener;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_json};

/// Run a parsed command
///
/// Both commands answer on stdout, so log lines go to stderr.
pub fn run_command(command: Command) -> CliResult<()> {
    Logger::reserve_stdout(true);
    match command {
        Command::Serve { config } => serve(config.as_deref()),
        Command::Check { config } => check(config.as_deref(), &mut io::stdout().lock()),
    }
}

/// Load the config file, or defaults without one, and apply its log level.
pub fn load_config(path: Option<&Path>) -> CliResult<CatalogConfig> {
    let config = match path {
        Some(path) => CatalogConfig::load(path)?,
        None => CatalogConfig::default(),
    };
    Logger::set_min_severity(config.severity()?);

    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    log_event_with_fields(Event::ConfigLoaded, &[("path", &source)]);
    Ok(config)
}

/// Validate configuration and print the effective settings.
pub fn check<W: Write>(path: Option<&Path>, out: &mut W) -> CliResult<()> {
    let config = load_config(path)?;
    let settings = Settings::from_config(&config);
    let data = json!({
        "settings": settings.to_json(),
        "indexing_interval_ms": config.indexing_interval_ms,
        "log_level": config.log_level,
    });
    write_json(out, &Response::success(data).to_json())
}

/// Serve requests from stdin until EOF.
///
/// A periodic indexer drains the index queue in the background; on EOF
/// it is stopped and the queue is flushed once more.
pub fn serve(path: Option<&Path>) -> CliResult<()> {
    let config = load_config(path)?;
    let catalog = Arc::new(Catalog::new(&config));
    catalog.notifications().subscribe(Box::new(LoggingListener));

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime_failed(format!("Failed to create tokio runtime: {}", e)))?;
    let indexer = {
        let _enter = runtime.enter();
        PeriodicIndexer::spawn(catalog.indexing_task(), config.indexing_interval())
    };

    log_event(Event::Serving);
    let handler = ApiHandler::new(Arc::clone(&catalog));
    let result = serve_lines(&handler, io::stdin().lock(), &mut io::stdout().lock());

    runtime.block_on(indexer.shutdown());
    if let Err(e) = catalog.flush_index() {
        Logger::error("FINAL_FLUSH_FAILED", &[("code", e.code()), ("error", &e.to_string())]);
    }
    result.map(|_| ())
}

/// Answer every request line of `input` on `out`; returns the number served.
pub fn serve_lines<R: BufRead, W: Write>(
    handler: &ApiHandler,
    input: R,
    out: &mut W,
) -> CliResult<usize> {
    let mut served = 0;
    for line in read_requests(input) {
        let response = handler.handle(&line?);
        write_json(out, &response.to_json())?;
        served += 1;
    }
    Ok(served)
}
