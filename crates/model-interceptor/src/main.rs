use anyhow::Context;
use clap::{Parser, Subcommand};
use model_interceptor::config::{InterceptMode, ServiceConfig};
use model_interceptor::logging::{init_logging, LogFormat};
use model_interceptor::suggest::suggest_rule;
use std::path::{Path, PathBuf};

/// Intercept model downloads and serve them from local or alternate sources
#[derive(Parser, Debug)]
#[command(name = "model-interceptor", author, version)]
struct Args {
    /// YAML service configuration file
    #[arg(short, long, env = "INTERCEPTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Interception listener port
    #[arg(short, long, env = "INTERCEPTOR_PORT")]
    port: Option<u16>,

    /// Management API port
    #[arg(long, env = "INTERCEPTOR_ADMIN_PORT")]
    admin_port: Option<u16>,

    /// Disable the management API
    #[arg(long)]
    no_admin: bool,

    /// How request URLs are read: path or forward-proxy
    #[arg(short, long, env = "INTERCEPTOR_MODE")]
    mode: Option<InterceptMode>,

    /// Directory every local target must stay inside
    #[arg(long, env = "INTERCEPTOR_ROOT")]
    root: Option<PathBuf>,

    /// Path prefix before the embedded URL in forward-proxy mode
    #[arg(long, env = "INTERCEPTOR_ROUTE_PREFIX")]
    route_prefix: Option<String>,

    /// Rule document (JSON)
    #[arg(long, env = "INTERCEPTOR_RULES_FILE")]
    rules_file: Option<PathBuf>,

    /// Request journal (JSON)
    #[arg(long, env = "INTERCEPTOR_JOURNAL_FILE")]
    journal_file: Option<PathBuf>,

    /// Log output: text or json
    #[arg(long, env = "INTERCEPTOR_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Suggest a sourceUrlPrefix from a download log and exit
    Suggest {
        /// Log file to scan
        logfile: PathBuf,
    },
}

impl Args {
    fn into_config(self) -> Result<ServiceConfig, anyhow::Error> {
        let mut config = match &self.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(port) = self.admin_port {
            config.admin.port = port;
        }
        if self.no_admin {
            config.admin.enabled = false;
        }
        if let Some(mode) = self.mode {
            config.interception.mode = mode;
        }
        if let Some(root) = self.root {
            config.interception.content_root = root;
        }
        if let Some(prefix) = self.route_prefix {
            config.interception.route_prefix = prefix;
        }
        if let Some(path) = self.rules_file {
            config.storage.rules_file = path;
        }
        if let Some(path) = self.journal_file {
            config.storage.journal_file = path;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        Ok(config)
    }
}

fn suggest(logfile: &Path) -> Result<(), anyhow::Error> {
    let log = std::fs::read_to_string(logfile)
        .with_context(|| format!("Failed to read {}", logfile.display()))?;
    let suggestion = suggest_rule(&log);
    println!("{}", suggestion.message());
    if suggestion.prefix().is_none() {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let mut args = Args::parse();

    if let Some(Command::Suggest { logfile }) = args.command.take() {
        return suggest(&logfile);
    }

    let config = args.into_config()?;
    init_logging(&config.logging)?;

    if let Err(e) = model_interceptor::run(config).await {
        tracing::error!("Interceptor failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
