//! Chat Widget terminal host
//!
//! Binds a widget to a headless host page and drives it from stdin, one line
//! per message. Replies are printed to stdout; logs go to stderr.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chat_widget::config::{Cli, WidgetConfig};
use chat_widget::dom::Document;
use chat_widget::host::TerminalHost;
use chat_widget::transport::HttpTransport;
use chat_widget::widget::ChatWidget;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    let cli = Cli::parse();
    let config = WidgetConfig::from_cli(&cli).context("Failed to load configuration")?;
    init_tracing(config.logging.json);

    let transport = HttpTransport::new(&config.endpoint.base_url, &config.endpoint.api_path)
        .context("Invalid chat endpoint")?
        .max_response_bytes(config.limits.max_response_bytes);

    info!(
        name: "widget.config.loaded",
        endpoint = %transport.endpoint(),
        max_response_bytes = config.limits.max_response_bytes,
        "Chat widget configuration loaded"
    );

    let document = Document::new();
    config.page.build_host_page(&document);
    let widget = ChatWidget::bind(&document, &config.page, transport)?;

    let mut host = TerminalHost::new(tokio::io::stdout());
    let summary = host
        .run(&widget, BufReader::new(tokio::io::stdin()))
        .await
        .context("Terminal session failed")?;

    if let Some(path) = &cli.transcript_out {
        tokio::fs::write(path, document.to_html())
            .await
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
        info!(
            name: "host.transcript.written",
            path = %path.display(),
            exchanges = summary.exchanges,
            "Transcript written"
        );
    }

    Ok(())
}
