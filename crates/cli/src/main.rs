use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cxhook")]
#[command(about = "Dialogflow CX webhook fulfillment gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway (HTTP server).
    Gateway {
        /// Config file path (default: CXHOOK_CONFIG_PATH or ~/.cxhook/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send a webhook request to a running gateway and print the response.
    Invoke {
        /// Gateway URL (default: http://127.0.0.1:8080/)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Fulfillment tag (e.g. cheapestPlan, validatePhoneLine)
        tag: String,

        /// Session parameters as key=value pairs; values parse as JSON when
        /// possible (trip_duration=45) and fall back to strings (destination=Japan)
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Webhook secret sent as X-Webhook-Secret
        #[arg(long, value_name = "SECRET")]
        secret: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("cxhook {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Invoke {
            url,
            tag,
            params,
            secret,
        }) => {
            if let Err(e) = run_invoke(url, tag, params, secret).await {
                log::error!("invoke failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, _path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{}",
        config.gateway.bind,
        config.gateway.port
    );
    lib::gateway::run_gateway(config).await
}

/// Build a webhook request body from a tag and key=value session parameters.
fn build_request_body(tag: &str, params: &[String]) -> anyhow::Result<serde_json::Value> {
    let mut parameters = serde_json::Map::new();
    for pair in params {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got {:?}", pair))?;
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        parameters.insert(key.to_string(), value);
    }
    Ok(serde_json::json!({
        "fulfillmentInfo": { "tag": tag },
        "sessionInfo": { "parameters": parameters },
    }))
}

async fn run_invoke(
    url: Option<String>,
    tag: String,
    params: Vec<String>,
    secret: Option<String>,
) -> anyhow::Result<()> {
    let url = url.unwrap_or_else(|| "http://127.0.0.1:8080/".to_string());
    let body = build_request_body(&tag, &params)?;

    let client = reqwest::Client::new();
    let mut req = client.post(&url).json(&body);
    if let Some(ref s) = secret {
        req = req.header("X-Webhook-Secret", s);
    }
    let res = req
        .send()
        .await
        .with_context(|| format!("sending webhook request to {}", url))?;
    let status = res.status();
    let text = res.text().await.context("reading gateway response")?;
    if !status.is_success() {
        anyhow::bail!("gateway answered {}: {}", status, text);
    }
    // Pretty-print when the body is JSON, otherwise print as-is.
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(v) => println!("{}", serde_json::to_string_pretty(&v)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
