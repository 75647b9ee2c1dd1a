pub mod handlers;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dailyops_graph::{LinkMutations, LinkQueryService, LinkStore, RecordStore, RollupService};
use sea_orm::DatabaseConnection;

pub use dailyops_graph::rollup::DEFAULT_DETAIL_LIMIT;

/// Application state shared across handlers
pub struct AppState {
    pub records: RecordStore,
    pub query: LinkQueryService,
    pub mutations: LinkMutations,
    pub rollups: RollupService,
}

impl AppState {
    /// Wire every graph service onto one database connection
    pub fn new(db: DatabaseConnection, rollup_detail_limit: u64) -> Self {
        let records = RecordStore::new(db.clone());
        let links = LinkStore::new(db.clone());
        let query = LinkQueryService::new(links.clone(), records.clone());
        let mutations = LinkMutations::new(links.clone(), query.clone());
        let rollups = RollupService::new(db, rollup_detail_limit);

        Self {
            records,
            query,
            mutations,
            rollups,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Daily Ops API",
        version = "0.1.0",
        description = "REST API for the Daily Ops entity connection graph",
        contact(
            name = "Daily Ops Team",
            email = "team@dailyops.app"
        )
    ),
    paths(
        handlers::health_check,
        handlers::list_entity_types,
        handlers::list_connections,
        handlers::create_connection,
        handlers::delete_connection,
        handlers::location_connections,
        handlers::team_connections,
        handlers::member_connections,
        handlers::create_record,
        handlers::list_candidates,
        handlers::get_record,
        handlers::delete_record,
    ),
    components(
        schemas(
            models::EntityType,
            models::EntityTypeInfo,
            models::EntityTypeList,
            models::LinkedEntity,
            models::LinkedEntitiesResponse,
            models::CreateConnectionRequest,
            models::Link,
            models::CreateConnectionResponse,
            models::ConnectedTo,
            models::CreateRecordRequest,
            models::Record,
            models::CandidateList,
            models::DeleteRecordResponse,
            models::RollupCounts,
            models::RollupItem,
            models::RollupDetails,
            models::EntityRef,
            models::ConnectionsRollup,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "connections", description = "Entity link endpoints"),
        (name = "rollups", description = "Parent context aggregation endpoints"),
        (name = "entities", description = "Record and link candidate endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
    /// Allowed CORS origins (if None, allows any localhost port)
    pub cors_origins: Option<Vec<String>>,
    /// Detail rows per rollup category
    pub rollup_detail_limit: u64,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            cors_origins: None,
            rollup_detail_limit: DEFAULT_DETAIL_LIMIT,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let state = Arc::new(AppState::new(db, config.rollup_detail_limit));

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let api_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/entity-types", get(handlers::list_entity_types))
            .route(
                "/api/connections",
                get(handlers::list_connections).post(handlers::create_connection),
            )
            .route(
                "/api/connections/{target_id}",
                axum::routing::delete(handlers::delete_connection),
            )
            .route(
                "/api/locations/{id}/connections",
                get(handlers::location_connections),
            )
            .route("/api/teams/{id}/connections", get(handlers::team_connections))
            .route(
                "/api/members/{id}/connections",
                get(handlers::member_connections),
            )
            .route(
                "/api/entities/{entity_type}",
                get(handlers::list_candidates).post(handlers::create_record),
            )
            .route(
                "/api/entities/{entity_type}/{id}",
                get(handlers::get_record).delete(handlers::delete_record),
            )
            .with_state(self.state.clone());

        // SwaggerUi automatically creates a route for /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        router
    }

    fn cors_layer(&self) -> CorsLayer {
        let allow_origin = match &self.config.cors_origins {
            Some(origins) => {
                let parsed: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!("Ignoring invalid CORS origin: {}", origin);
                            None
                        }
                    })
                    .collect();
                AllowOrigin::list(parsed)
            }
            None => AllowOrigin::predicate(|origin: &HeaderValue, _| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str.starts_with("http://localhost:")
                    || origin_str.starts_with("http://127.0.0.1:")
                    || origin_str.starts_with("https://localhost:")
                    || origin_str.starts_with("https://127.0.0.1:")
            }),
        };

        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(allow_origin)
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
