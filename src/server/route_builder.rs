use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::api::AppState;
use crate::config::AppConfig;
use crate::database::{self, ReplicaRouter, RouteCounters, Schema};
use crate::utils::error::AppError;
use crate::utils::jwt::JwtService;

/// Opens every store named by the config, applies migrations and, when
/// requested, seeds fake users.
pub async fn build_state(config: &AppConfig, jwt_service: JwtService) -> anyhow::Result<Arc<AppState>> {
    let db = database::create_pool(&config.database_url, config.max_connections, Schema::Main)
        .await
        .with_context(|| format!("connecting to primary {}", config.database_url))?;
    tracing::info!("Primary database connected and migrations applied");

    let messages_db = if config.messages_database_url == config.database_url {
        database::run_migrations(&db, Schema::Messages).await?;
        db.clone()
    } else {
        database::create_pool(
            &config.messages_database_url,
            config.max_connections,
            Schema::Messages,
        )
        .await
        .with_context(|| format!("connecting to message shard {}", config.messages_database_url))?
    };
    tracing::info!("Message shard connected and migrations applied");

    let mut replicas = Vec::with_capacity(config.read_replica_urls.len());
    for url in &config.read_replica_urls {
        let replica = database::create_replica_pool(url, config.max_connections)
            .await
            .with_context(|| format!("connecting to read replica {}", url))?;
        replicas.push(replica);
    }

    let router = Arc::new(ReplicaRouter::new(
        db.clone(),
        replicas,
        config.read_from_primary,
        Arc::new(RouteCounters::new()),
    ));
    tracing::info!(
        "Read set has {} member(s), primary included: {}",
        router.read_set_len(),
        config.read_from_primary || config.read_replica_urls.is_empty()
    );

    if let Some(count) = config.fake_user_count {
        crate::tasks::seed::seed_fake_users(&db, count).await;
    }

    Ok(Arc::new(AppState {
        db,
        messages_db,
        router,
        jwt_service: Arc::new(jwt_service),
        message_page_size: config.message_page_size,
        search_page_size: config.search_page_size,
    }))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    AppError::Internal(format!("Handler panicked: {}", detail)).into_response()
}

fn with_layers(router: Router) -> Router {
    router
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

pub fn register_routes(state: Arc<AppState>) -> Router {
    let api_routes = crate::api::routes(state);

    with_layers(Router::new().nest("/api", api_routes))
}
