//! Utility functions for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use vocalis_engine::HttpGateway;
use vocalis_synth::{Config, Orchestrator};

use crate::Cli;

/// Configuration directory under the home directory.
const APP_DIR: &str = ".vocalis";
const CONFIG_FILE: &str = "config.yaml";

/// Returns `~/.vocalis/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR).join(CONFIG_FILE))
}

/// Loads the configuration.
///
/// An explicit `--config` file must exist. Without one, the default path is
/// used if present, and built-in defaults otherwise.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(path) = cli.config.as_deref() {
        return Ok(Config::load(path)?);
    }
    match default_config_path() {
        Some(path) if path.exists() => Ok(Config::load(&path)?),
        _ => Ok(Config::default()),
    }
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` wins over `--verbose`, which wins over `log_level`.
pub fn init_logging(cli: &Cli, config: &Config) {
    let fallback = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Connects to the engine and loads every configured voice.
///
/// An unreachable engine is not fatal: voices with cached bundles still load
/// and the orchestrator reports the model as not ready.
pub async fn connect(cli: &Cli, config: Config) -> anyhow::Result<Orchestrator> {
    let gateway = Arc::new(HttpGateway::new(
        config.engine.url.clone(),
        config.engine.timeout(),
    ));

    let engine = gateway.clone();
    match tokio::task::spawn_blocking(move || engine.initialize()).await? {
        Ok(()) => print_verbose(cli, &format!("Engine ready at {}", gateway.base_url())),
        Err(e) => warn!(url = %gateway.base_url(), error = %e, "cli: engine unavailable"),
    }

    let orch = Orchestrator::new(config, gateway)?;
    let report = orch.initialize().await?;
    print_verbose(
        cli,
        &format!(
            "Loaded {} voices ({} extracted, {} failed)",
            report.loaded.len(),
            report.extracted,
            report.failures.len()
        ),
    );
    for failure in &report.failures {
        print_warning(&failure.to_string());
    }
    Ok(orch)
}

/// Loads a request from a YAML or JSON file.
pub fn load_request<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    Ok(result)
}

/// Outputs binary data to a file.
pub fn output_bytes(data: &[u8], output_path: impl AsRef<Path>) -> anyhow::Result<()> {
    std::fs::write(output_path, data)?;
    Ok(())
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(
    result: &T,
    output_path: Option<&str>,
    as_json: bool,
) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)?
    } else {
        serde_yaml::to_string(result)?
    };

    match output_path {
        Some(path) => std::fs::write(path, output)?,
        None => print!("{}", output),
    }

    Ok(())
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
