use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use askbot::{AppProfile, GeneratorConfig};
use axum::http::Method;
use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

mod rpc;
mod state;

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Serve the Q&A chatbot web UI")]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    #[arg(long, value_enum, default_value_t = AppProfile::Combined)]
    profile: AppProfile,

    /// Directory holding the built frontend (`trunk build` output)
    #[arg(long, default_value = "frontend/dist")]
    static_dir: PathBuf,

    /// Minutes without a chat before a session's transcript is dropped
    #[arg(long, default_value_t = 30)]
    session_idle_minutes: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askbot=info,server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GeneratorConfig::from_env();
    let state = AppState::new(&config, args.profile)?
        .with_idle_timeout(Duration::from_secs(args.session_idle_minutes * 60));

    if !state.generator.telemetry().enabled {
        tracing::info!("Generation tracing disabled");
    }

    let cors = CorsLayer::new()
        // allow `GET`, `POST` and `DELETE` when accessing the resource
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        // allow requests from any origin
        .allow_origin(Any)
        .allow_headers(Any);

    if !args.static_dir.is_dir() {
        tracing::warn!(
            "{} does not exist, run `trunk build` in frontend/ to serve the UI",
            args.static_dir.display()
        );
    }
    let index = ServeFile::new(args.static_dir.join("index.html"));

    let app = rpc::routes(state)
        .fallback_service(ServeDir::new(&args.static_dir).fallback(index))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .into_diagnostic()
        .wrap_err("Invalid listen address")?;

    tracing::info!(
        "{} ({:?} profile) listening on http://{}",
        args.profile.title(),
        args.profile,
        addr
    );

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .into_diagnostic()?;

    Ok(())
}
