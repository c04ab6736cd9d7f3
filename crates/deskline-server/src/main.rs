mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use deskline_ai::{Assistant, CompletionProvider, OpenAiProvider};
use deskline_api::{AppState, AppStateInner, SessionConfig, SessionService};
use deskline_db::Database;
use deskline_gateway::{Dispatcher, Gateway};
use deskline_kv::{KeyValueStore, MemoryStore, RedisStore};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deskline=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let kv: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisStore::connect(url).await?),
        None => {
            warn!("DESKLINE_REDIS_URL not set, tokens are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let provider = match &config.openai_api_key {
        Some(key) => {
            let openai = OpenAiProvider::new(
                key.as_str(),
                config.openai_model.as_str(),
                &config.openai_base_url,
                config.request_timeout,
            )?;
            info!("Completion provider ready (model {})", openai.model());
            Some(Arc::new(openai) as Arc<dyn CompletionProvider>)
        }
        None => None,
    };
    let assistant = Arc::new(Assistant::new(db.clone(), provider));

    let gateway = Gateway::new(Dispatcher::new(), db.clone())
        .with_assistant(assistant.clone(), config.ai_auto_reply);

    let sessions = SessionService::new(
        db.clone(),
        kv.clone(),
        &SessionConfig {
            jwt_secret: config.jwt_secret.clone(),
            access_ttl: config.jwt_expires_in,
            hash: config.hash,
        },
    )?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        kv,
        sessions,
        gateway,
        assistant,
    });

    let app = Router::new()
        .merge(deskline_api::router(state))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Deskline server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
