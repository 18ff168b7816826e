//! snsbridge - Amazon SNS publishing and webhook tool

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use snsbridge::messaging::DynamicTopicResolver;
use snsbridge::types::{HeaderValue, Message};
use snsbridge::web::{LoggingEndpoint, WebhookServer};
use snsbridge::{SnsAutoConfiguration, SnsBridgeConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "snsbridge")]
#[command(version = snsbridge::VERSION)]
#[command(about = "Publish to Amazon SNS and receive SNS webhooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Webhook bind address
    #[arg(long, env = "SNSBRIDGE_BIND_ADDRESS", global = true)]
    bind: Option<String>,

    /// Webhook port
    #[arg(short, long, env = "SNSBRIDGE_PORT", global = true)]
    port: Option<u16>,

    /// SNS region
    #[arg(long, env = "CLOUD_AWS_SNS_REGION", global = true)]
    region: Option<String>,

    /// SNS endpoint override (e.g. a local emulator)
    #[arg(long, env = "CLOUD_AWS_SNS_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Accept inbound messages without checking their signatures
    #[arg(long, global = true)]
    no_verification: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SNSBRIDGE_LOG_LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve,

    /// Publish a message to a topic
    Publish {
        /// Topic ARN or name
        topic: String,

        /// Message body
        message: String,

        #[arg(short, long)]
        subject: Option<String>,

        /// Text header as NAME=VALUE (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_key_value)]
        headers: Vec<(String, String)>,

        /// Numeric header as NAME=VALUE (repeatable)
        #[arg(short = 'N', long = "number", value_parser = parse_key_value)]
        numbers: Vec<(String, String)>,

        /// FIFO message group id
        #[arg(long)]
        group_id: Option<String>,

        /// FIFO deduplication id
        #[arg(long)]
        dedup_id: Option<String>,

        /// Create the topic if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Resolve a topic name to its ARN
    Resolve {
        name: String,

        /// Create the topic if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Show version information
    Version,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))
}

fn parse_number(name: &str, raw: &str) -> anyhow::Result<HeaderValue> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(HeaderValue::from(value));
    }
    raw.parse::<f64>()
        .map(HeaderValue::from)
        .map_err(|_| anyhow!("header {} is not a number: {}", name, raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = if let Some(config_path) = &cli.config {
        let mut config = SnsBridgeConfig::from_file(config_path)
            .with_context(|| format!("loading {}", config_path))?;
        config.apply_env(|key| std::env::var(key).ok());
        config
    } else {
        SnsBridgeConfig::from_env()
    };

    // Override with CLI args
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(region) = cli.region {
        config.cloud.aws.sns.client.region = Some(region);
    }
    if let Some(endpoint) = cli.endpoint {
        config.cloud.aws.sns.client.endpoint = Some(endpoint);
    }
    if cli.no_verification {
        config.cloud.aws.sns.verification = false;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config);

    match cli.command {
        None | Some(Commands::Version) => print_banner(),
        Some(Commands::Serve) => {
            print_banner();
            run_server(config).await?;
        }
        Some(Commands::Publish {
            topic,
            message,
            subject,
            headers,
            numbers,
            group_id,
            dedup_id,
            create,
        }) => {
            let mut builder = Message::builder(message);
            if let Some(subject) = subject {
                builder = builder.subject(subject);
            }
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
            for (name, value) in numbers {
                let number = parse_number(&name, &value)?;
                builder = builder.header(name, number);
            }
            if let Some(group_id) = group_id {
                builder = builder.message_group_id(group_id);
            }
            if let Some(dedup_id) = dedup_id {
                builder = builder.message_deduplication_id(dedup_id);
            }

            let sns = SnsAutoConfiguration::configure(&config).await?;
            let resolver = DynamicTopicResolver::new(sns.client()).with_auto_create(create);
            let template = sns.template().with_resolver(resolver);

            template.send(&topic, &builder.build()).await?;
            println!("Published to {}", template.resolver().resolve(&topic).await?);
        }
        Some(Commands::Resolve { name, create }) => {
            let sns = SnsAutoConfiguration::configure(&config).await?;
            let arn = DynamicTopicResolver::new(sns.client())
                .with_auto_create(create)
                .resolve(&name)
                .await?;
            println!("{}", arn);
        }
    }

    Ok(())
}

fn init_logging(config: &SnsBridgeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

fn print_banner() {
    println!(
        r#"
   ___ _ __  ___| |__  _ __(_) __| | __ _  ___
  / __| '_ \/ __| '_ \| '__| |/ _` |/ _` |/ _ \
  \__ \ | | \__ \ |_) | |  | | (_| | (_| |  __/
  |___/_| |_|___/_.__/|_|  |_|\__,_|\__, |\___|
                                    |___/
   Amazon SNS bridge
   Version: {}
"#,
        snsbridge::VERSION
    );
}

async fn run_server(config: SnsBridgeConfig) -> anyhow::Result<()> {
    info!("Starting snsbridge webhook...");
    info!("Region: {}", config.sns_region());

    let sns = SnsAutoConfiguration::configure(&config).await?;
    let server = WebhookServer::new(config.server.clone(), Arc::new(LoggingEndpoint), sns.resolvers());

    server
        .run_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
