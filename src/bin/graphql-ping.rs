//! Serves the ping/upload schema so every request encoding can be tried by hand.
//!
//! `GRAPHQL_ADDR` sets the listen address and `GRAPHQL_CONFIG` may point at a
//! JSON file with handler settings; the playground is always enabled.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context as _, Result};
use graphql_http_handler::{schema::ping_schema, GraphQLHandler, HandlerConfig};
use tracing::info;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let addr: SocketAddr = std::env::var("GRAPHQL_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let config = match std::env::var("GRAPHQL_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => HandlerConfig::default(),
    };

    print_examples(addr, &config.path);

    GraphQLHandler::builder()
        .executor(ping_schema()?)
        .with_config(config)
        .enable_playground()
        .serve(addr.to_string())
        .await?;

    Ok(())
}

fn load_config(path: &Path) -> Result<HandlerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

fn print_examples(addr: SocketAddr, path: &str) {
    let url = format!("http://{addr}{path}");
    info!("Try one of:");
    info!("  curl '{url}?query=%7B%20ping%20%7D'");
    info!("  curl -H 'Content-Type: application/graphql' -d '{{ ping }}' {url}");
    info!(
        "  curl -H 'Content-Type: application/json' -d '{{\"query\":\"{{ echo(value: \\\"hi\\\") }}\"}}' {url}"
    );
    info!(
        "  curl -F operations='{{\"query\":\"mutation ($file: Upload!) {{ upload(file: $file) }}\",\"variables\":{{\"file\":null}}}}' -F map='{{\"0\":[\"variables.file\"]}}' -F 0=@Cargo.toml {url}"
    );
}
