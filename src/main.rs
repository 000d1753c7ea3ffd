use std::sync::Arc;

use axum::{response::Html, routing::get, Json};
use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as _};

use hearth::cli::{Args, Command};
use hearth::config::Config;
use hearth::{routes, Result, ServerState};

#[derive(OpenApi)]
#[openapi(info(title = "hearth", description = "realtime multi-room chat"))]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    let sub = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.rust_log)?)
        .finish();
    tracing::subscriber::set_global_default(sub)?;

    match args.command {
        Command::Serve {} => serve(config).await,
        Command::Check {} => {
            println!("config ok");
            Ok(())
        }
        Command::MintToken { name } => {
            let pool = connect(&config).await?;
            let state = Arc::new(ServerState::init(config, pool));
            let (user, token) = state.services().sessions.mint(&name).await?;
            println!("user: {}", user.id);
            println!("token: {token}");
            Ok(())
        }
    }
}

async fn connect(config: &Config) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

async fn serve(config: Config) -> Result<()> {
    let pool = connect(&config).await?;
    let addr = (config.listen.address, config.listen.port);
    let state = Arc::new(ServerState::init(config, pool));
    state.services().rooms.refresh_active_gauge().await;

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/v1", routes::routes())
        .split_for_parts();
    let api1 = api.clone();
    let router = router
        .route("/api/docs.json", get(|| async { Json(api) }))
        .route(
            "/api/docs",
            get(|| async { Html(Scalar::with_url("/scalar", api1).to_html()) }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(routes::cors())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
