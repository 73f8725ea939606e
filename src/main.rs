//! `rpd`: round-robin reverse proxy daemon.
//!
//! Configuration comes from an optional TOML file, overridden by flags or
//! their `RPD_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use rp::config::{loader, validate_config, LogFormat, ProxyConfig};
use rp::lifecycle::{shutdown_signal, Shutdown};
use rp::observability::{self, PrometheusMetrics};
use rp::HttpServer;

/// Time given to in-flight requests once shutdown starts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "rpd", version, about = "Round-robin load balancing reverse proxy")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "RPD_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP proxy port.
    #[arg(long, env = "RPD_HTTP_PORT")]
    http_port: Option<u16>,

    /// HTTP metrics port.
    #[arg(long, env = "RPD_HTTP_METRICS_PORT")]
    http_metrics_port: Option<u16>,

    /// Backend addresses, comma separated.
    #[arg(long, env = "RPD_BACKEND_ADDRS")]
    backend_addrs: Option<String>,

    /// Enable responses caching.
    #[arg(long, env = "RPD_USE_CACHE")]
    use_cache: bool,

    /// Response cache size.
    #[arg(long, env = "RPD_CACHE_SIZE")]
    cache_size: Option<usize>,

    /// Log output format.
    #[arg(long, env = "RPD_LOG_FORMAT", value_parser = ["pretty", "json"])]
    log_format: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut ProxyConfig) {
        if let Some(port) = self.http_port {
            config.listener.bind_address = format!("0.0.0.0:{port}");
        }
        if let Some(port) = self.http_metrics_port {
            config.observability.metrics_address = format!("0.0.0.0:{port}");
        }
        if let Some(addrs) = &self.backend_addrs {
            config.backends = parse_backends(addrs);
        }
        if self.use_cache {
            config.cache.enabled = true;
        }
        if let Some(size) = self.cache_size {
            config.cache.size = size;
        }
        match self.log_format.as_deref() {
            Some("json") => config.observability.log_format = LogFormat::Json,
            Some("pretty") => config.observability.log_format = LogFormat::Pretty,
            _ => {}
        }
    }
}

fn parse_backends(addrs: &str) -> Vec<String> {
    addrs
        .split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(String::from)
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match loader::read_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("rpd: {e}");
                return ExitCode::from(2);
            }
        },
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);

    if let Err(e) = observability::logging::init(&config.observability) {
        eprintln!("rpd: failed to initialize logging: {e}");
        return ExitCode::from(2);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting app");

    if let Err(errors) = validate_config(&config) {
        for error in errors {
            tracing::error!(error = %error, "invalid configuration");
        }
        return ExitCode::from(2);
    }

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "server returning an error");
            ExitCode::from(2)
        }
    }
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        observability::metrics::install_exporter(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, Arc::new(PrometheusMetrics::new()))?;

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.signalled()));

    tokio::select! {
        _ = shutdown_signal() => {}
        res = &mut server_task => return Ok(res??),
    }

    shutdown.trigger();
    match tokio::time::timeout(DRAIN_TIMEOUT, server_task).await {
        Ok(res) => res??,
        Err(_) => tracing::warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "in-flight requests still running, exiting anyway"
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backends() {
        assert_eq!(
            parse_backends(" 127.0.0.1:3000, ,127.0.0.1:3001,"),
            vec!["127.0.0.1:3000".to_string(), "127.0.0.1:3001".to_string()]
        );
        assert!(parse_backends("").is_empty());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "rpd",
            "--http-port",
            "9000",
            "--backend-addrs",
            "a:1,b:2",
            "--use-cache",
            "--cache-size",
            "10",
            "--log-format",
            "json",
        ]);
        let mut config = ProxyConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.backends, vec!["a:1", "b:2"]);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.size, 10);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
