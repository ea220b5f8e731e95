use json_translator_mcp::server::http;
use json_translator_mcp::translation::{translate_file, TranslationClient, TranslationPipeline};
use json_translator_mcp::{AppConfig, AppState, JsonTranslatorServer};
use rmcp::{transport::stdio, ServiceExt};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_or_default(Some("config.toml"));
    init_logging(&config)?;

    let args: Vec<String> = env::args().collect();

    tracing::info!("Loaded configuration: {:?}", config.server.name);

    let session_config = config.session_config();
    session_config.validate()?;

    match args.get(1).map(String::as_str) {
        Some("--http") => {
            let port = args
                .get(2)
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(9527);
            let bind_addr = args.get(3).map(|s| s.as_str()).unwrap_or("0.0.0.0");

            http::serve(AppState::new(session_config), bind_addr, port).await?;
        }
        Some("--file") => {
            let (Some(input), Some(output)) = (args.get(2), args.get(3)) else {
                anyhow::bail!("usage: json-translator-mcp --file <input.json> <output.json>");
            };

            let client = TranslationClient::new(session_config.clone())?;
            let pipeline = TranslationPipeline::new(client, &session_config);
            let report = translate_file(&pipeline, input, output, None).await?;

            tracing::info!(
                output = %output,
                entries = report.entries_total,
                batches = report.batches_total,
                failed_batches = report.failures.len(),
                "Translation written"
            );
            for failure in &report.failures {
                tracing::warn!(
                    batch_index = failure.batch_index,
                    entries = failure.entries,
                    reason = %failure.reason,
                    "Batch kept original text"
                );
            }
        }
        _ => {
            tracing::info!("Starting MCP Server on stdio");
            let server = JsonTranslatorServer::new(AppState::new(session_config));
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}

// stdout carries the MCP transport, so logs go to stderr.
fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("json_translator_mcp={}", config.logging.level).parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
