//src/main.rs

use axum::{
    routing::{get, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod events;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;

fn router(app_state: AppState) -> Router {
    let workload_routes = Router::new()
        .route("/workload", get(handlers::workload::get_workload))
        .route("/utilization", get(handlers::workload::classify_utilization))
        .route("/allocations", put(handlers::allocations::save_allocation))
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/members", get(handlers::members::list_members))
        .route("/events", get(handlers::events::stream_events));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", workload_routes)
        .with_state(app_state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Sem configuração válida a aplicação não deve iniciar.
    let config = Config::from_env().expect("Falha ao carregar a configuração.");

    let app_state = AppState::new(&config)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Eventos de gravação derrubam os agregados em cache
    let _cache_listener = app_state.aggregate_cache.spawn_invalidation(&app_state.event_bus);

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", config.bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
