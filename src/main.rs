use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edl_admin::cli::{self, Commands, EdlCommands, RequestCommands};
use edl_admin::config::{self, Config};
use edl_admin::edl::EdlList;
use edl_admin::models::request::RequestId;
use edl_admin::requests::RequestStore;
use edl_admin::store::KvStore;
use edl_admin::transitions::TransitionEngine;
use edl_admin::{api, connect_store, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(Commands::Request { command }) => {
            let store = connect_store(&cfg).await?;
            handle_request_command(store, command).await
        }
        Some(Commands::Edl { command }) => {
            let store = connect_store(&cfg).await?;
            handle_edl_command(store, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Console logging filtered by RUST_LOG, plus an OTLP exporter when
/// OTEL_EXPORTER_OTLP_ENDPOINT is set.
fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "edl-admin"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json = std::env::var("EDL_ADMIN_LOG_FORMAT").is_ok_and(|f| f == "json");

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "edl_admin=debug,tower_http=debug".into()),
        ))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(telemetry_layer)
        .init();
    Ok(())
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let store = connect_store(&cfg).await?;
    let state = Arc::new(AppState::new(store, cfg)?);
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("EDL admin listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_request_command(
    store: Arc<dyn KvStore>,
    cmd: RequestCommands,
) -> anyhow::Result<()> {
    match cmd {
        RequestCommands::List => {
            let listing = RequestStore::new(store).list().await?;
            for id in &listing.incomplete {
                tracing::warn!(request_id = %id, "skipping request with missing fields");
            }
            if listing.requests.is_empty() {
                println!("No pending requests.");
                return Ok(());
            }

            println!("{:<34} {:<16} {:<40} REASON", "ID", "USER", "URL");
            for r in listing.requests {
                println!("{:<34} {:<16} {:<40} {}", r.id, r.user, r.url, r.reason);
            }
        }
        RequestCommands::Accept { request_id } => {
            let id = RequestId::parse(&request_id)?;
            let accepted = TransitionEngine::new(store)
                .accept(&id)
                .await
                .with_context(|| format!("failed to accept request {}", id))?;
            if accepted.newly_listed {
                println!("Request {} accepted. Added {} to the EDL.", id, accepted.url);
            } else {
                println!(
                    "Request {} accepted. {} was already in the EDL.",
                    id, accepted.url
                );
            }
        }
        RequestCommands::Reject { request_id } => {
            let id = RequestId::parse(&request_id)?;
            TransitionEngine::new(store)
                .reject(&id)
                .await
                .with_context(|| format!("failed to reject request {}", id))?;
            println!("Request {} rejected.", id);
        }
        RequestCommands::Submit { user, url, reason } => {
            let request = RequestStore::new(store).submit(&user, &url, &reason).await?;
            println!("Request submitted:\n  ID:  {}\n  URL: {}", request.id, request.url);
        }
    }
    Ok(())
}

async fn handle_edl_command(store: Arc<dyn KvStore>, cmd: EdlCommands) -> anyhow::Result<()> {
    match cmd {
        EdlCommands::List => {
            let urls = EdlList::new(store).members().await?;
            if urls.is_empty() {
                println!("EDL is empty.");
            }
            for url in urls {
                println!("{}", url);
            }
        }
    }
    Ok(())
}
