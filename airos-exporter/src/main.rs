//! Prometheus exporter for Ubiquiti airOS radios.

use clap::Parser;
use tracing::info;

use airos_client::{FakeConnector, SshConnector};
use airos_exporter::demo::sample_document;
use airos_exporter::{ExporterConfig, runner};

/// Prometheus exporter for Ubiquiti airOS radios.
#[derive(Parser, Debug)]
#[command(name = "airos-exporter")]
#[command(about = "Scrape airOS devices over SSH on demand")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// HTTP port (overrides config).
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Number of scrape workers (overrides config).
    #[arg(long, env = "WORKERS")]
    workers: Option<usize>,

    /// Device password (overrides config).
    #[arg(long, env = "UBNT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Serve a canned device instead of polling real radios.
    #[arg(long)]
    demo: bool,
}

impl Args {
    fn apply(self, config: &mut ExporterConfig) {
        if let Some(listen) = self.listen {
            config.http.listen = listen;
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(workers) = self.workers {
            config.workers.count = workers;
        }
        if let Some(password) = self.password {
            config.device.password = password;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    let demo = args.demo;
    args.apply(&mut config);
    config.validate()?;

    airos_common::init_tracing(&config.logging)?;

    info!(
        listen = %config.http.listen,
        port = config.http.port,
        workers = config.workers.count,
        demo,
        "Starting airOS exporter"
    );

    if demo {
        runner::run(config, FakeConnector::new(sample_document())).await
    } else {
        let connector = SshConnector::new(config.device.username.clone(), config.device.ssh_port);
        runner::run(config, connector).await
    }
}
