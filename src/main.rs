use anyhow::{Context, Result};
use armwalk::azure::auth::validate_subscription_id;
use armwalk::azure::client::ArmClient;
use armwalk::azure::http::format_arm_error;
use armwalk::config::Config;
use armwalk::resource::{DiscoveryEngine, DiscoveryOptions, EnumerationScope};
use armwalk::ArmError;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Browse Azure Resource Manager hierarchies
#[derive(Parser, Debug)]
#[command(name = "armwalk", version, about, long_about = None)]
struct Args {
    /// Azure subscription to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// ARM endpoint (sovereign clouds)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List resource groups
    Groups,
    /// List resources in a resource group
    Resources {
        group: String,
        /// OData filter, e.g. "resourceType eq 'Microsoft.Network/virtualNetworks'"
        #[arg(long)]
        filter: Option<String>,
    },
    /// Fetch a resource by id
    Get { id: String },
    /// Discover the subresources of a resource
    Discover {
        id: String,
        /// Enumeration scope (defaults to the configured scope)
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
    },
    /// Set the default subscription
    Use { subscription: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    Group,
    Type,
}

impl From<ScopeArg> for EnumerationScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Group => EnumerationScope::ResourceGroup,
            ScopeArg::Type => EnumerationScope::ResourceType,
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match (std::env::var("RUST_LOG"), level.directive()) {
        (Ok(_), _) => EnvFilter::from_default_env(),
        (Err(_), Some(directive)) => EnvFilter::new(directive),
        (Err(_), None) => return None,
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armwalk started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armwalk").join("armwalk.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armwalk").join("armwalk.log");
    }
    PathBuf::from("armwalk.log")
}

fn print<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn engine(args: &Args, config: &Config, scope: EnumerationScope) -> Result<DiscoveryEngine> {
    let subscription = args
        .subscription
        .clone()
        .or_else(|| config.effective_subscription())
        .context(
            "No Azure subscription configured. Set AZURE_SUBSCRIPTION_ID, run 'az account set', \
             or use --subscription",
        )?;
    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| config.effective_endpoint());

    tracing::info!("Using subscription: {}, endpoint: {}", subscription, endpoint);

    let client = ArmClient::new(&subscription, &endpoint)?;
    Ok(DiscoveryEngine::new(
        Arc::new(client),
        DiscoveryOptions { scope },
    ))
}

async fn run(args: Args) -> Result<(), ArmError> {
    let mut config = Config::load();

    let scope = match &args.command {
        Command::Discover {
            scope: Some(scope), ..
        } => (*scope).into(),
        _ => config.enumeration_scope,
    };

    if let Command::Use { subscription } = &args.command {
        if !validate_subscription_id(subscription) {
            return Err(anyhow::anyhow!("Invalid subscription id: {}", subscription).into());
        }
        config.set_subscription(subscription)?;
        println!("Default subscription set to {}", subscription);
        return Ok(());
    }

    let engine = engine(&args, &config, scope)?;

    match &args.command {
        Command::Groups => print(&engine.list_groups().await?, args.output)?,
        Command::Resources { group, filter } => {
            let resources = engine.list_resources(group, filter.as_deref()).await?;
            if let Err(e) = config.set_last_resource_group(group) {
                tracing::warn!("Failed to save config: {}", e);
            }
            print(&resources, args.output)?;
        }
        Command::Get { id } => print(&engine.get_resource(id).await?, args.output)?,
        Command::Discover { id, .. } => {
            let result = engine.discover(id).await?;
            let failures: serde_json::Map<String, serde_json::Value> = result
                .failures
                .iter()
                .map(|(candidate, err)| (candidate.clone(), json!(format_arm_error(err))))
                .collect();
            print(
                &json!({ "resources": result.resources, "failures": failures }),
                args.output,
            )?;
        }
        Command::Use { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{}", err);
        eprintln!("Error: {}", format_arm_error(&err));
        // Flush pending log lines before exiting
        drop(log_guard);
        std::process::exit(1);
    }
}
