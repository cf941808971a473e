//! API Router with Swagger UI

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::FromRef, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::modules::{health, services, stats, subscriptions};
use crate::application::{CostService, ServiceNameRegistry, SubscriptionService};
use crate::domain::RepositoryProvider;

/// Shared state for every route. Each handler extracts its own slice via
/// `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub registry: Arc<ServiceNameRegistry>,
    pub subscriptions: Arc<SubscriptionService>,
    pub costs: Arc<CostService>,
    /// Deadline applied to each lifecycle or aggregation call
    pub request_timeout: Duration,
    pub started_at: Arc<Instant>,
}

impl ApiState {
    /// Wire the application services on top of one repository provider.
    pub fn new(repos: Arc<dyn RepositoryProvider>, request_timeout: Duration) -> Self {
        let registry = Arc::new(ServiceNameRegistry::new(repos.clone()));
        let subscriptions = Arc::new(SubscriptionService::new(repos.clone(), registry.clone()));
        let costs = Arc::new(CostService::new(repos.clone()));
        Self {
            repos,
            registry,
            subscriptions,
            costs,
            request_timeout,
            started_at: Arc::new(Instant::now()),
        }
    }
}

impl FromRef<ApiState> for subscriptions::SubscriptionHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        subscriptions::SubscriptionHandlerState {
            subscriptions: Arc::clone(&s.subscriptions),
            request_timeout: s.request_timeout,
        }
    }
}

impl FromRef<ApiState> for services::ServiceHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        services::ServiceHandlerState {
            registry: Arc::clone(&s.registry),
            request_timeout: s.request_timeout,
        }
    }
}

impl FromRef<ApiState> for stats::StatsHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        stats::StatsHandlerState {
            costs: Arc::clone(&s.costs),
            request_timeout: s.request_timeout,
        }
    }
}

impl FromRef<ApiState> for health::HealthState {
    fn from_ref(s: &ApiState) -> Self {
        health::HealthState {
            repos: Arc::clone(&s.repos),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Subscriptions
        subscriptions::create_subscription,
        subscriptions::list_subscriptions,
        subscriptions::get_subscription,
        subscriptions::update_subscription,
        subscriptions::delete_subscription,
        // Services
        services::get_service,
        services::delete_service,
        // Stats
        stats::get_total_cost,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            subscriptions::SubscriptionDto,
            subscriptions::SubscriptionListDto,
            subscriptions::CreatedSubscriptionDto,
            subscriptions::CreateSubscriptionRequest,
            subscriptions::UpdateSubscriptionRequest,
            services::ServiceDto,
            stats::TotalCostDto,
            stats::PeriodDto,
            stats::FiltersDto,
            stats::SubscriptionCostDto,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Subscriptions", description = "Subscription lifecycle: create, read, partial update, delete, list"),
        (name = "Services", description = "Service names referenced by subscriptions"),
        (name = "Stats", description = "Cost aggregation over calendar months"),
    ),
    info(
        title = "Subscription Service API",
        version = "1.0.0",
        description = "REST API for tracking recurring subscriptions and their cost",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: ApiState) -> Router {
    let subscription_routes = Router::new()
        .route(
            "/",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/{id}",
            get(subscriptions::get_subscription)
                .put(subscriptions::update_subscription)
                .delete(subscriptions::delete_subscription),
        );

    let service_routes = Router::new()
        .route(
            "/{id}",
            get(services::get_service).delete(services::delete_service),
        );

    let stats_routes = Router::new()
        .route("/total", get(stats::get_total_cost));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .route("/health", get(health::health_check))
        .nest("/api/v1/subscriptions", subscription_routes)
        .nest("/api/v1/services", service_routes)
        .nest("/api/v1/stats", stats_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
