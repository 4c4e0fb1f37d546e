//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use washi_types::{
    SaveCountryCurrencyResource, SaveCountryResource, SaveCurrencyResource,
    SaveDepartmentResource, SaveLaundryServiceMaterialResource, SaveMaterialResource,
    SaveOrderResource, SaveOrderStatusResource, SavePaymentMethodResource, SavePromotionResource,
    SaveResource, SaveServiceResource, SaveSubscriptionResource, SaveUserProfileResource,
    SaveUserResource, SaveUserSubscriptionResource, Store,
};

use super::handlers::{self, AppState};

type StateRouter<S> = Router<Arc<AppState<S>>>;

/// HTTP Server for the laundry API.
pub struct HttpServer<S: Store> {
    state: Arc<AppState<S>>,
}

impl<S: Store> HttpServer<S> {
    /// Creates a new HTTP server over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            state: Arc::new(AppState::new(store)),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let router = Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/api/users/{user_id}/orders",
                get(handlers::list_user_orders::<S>),
            );

        let router = crud::<SaveUserResource, S>(router, "users");
        let router = crud::<SaveUserProfileResource, S>(router, "user-profiles");
        let router = crud::<SaveUserSubscriptionResource, S>(router, "user-subscriptions");
        let router = crud::<SavePaymentMethodResource, S>(router, "payment-methods");
        let router = crud::<SaveServiceResource, S>(router, "services");
        let router = crud::<SaveMaterialResource, S>(router, "materials");
        let router =
            crud::<SaveLaundryServiceMaterialResource, S>(router, "laundry-service-materials");
        let router = crud::<SavePromotionResource, S>(router, "promotions");
        let router = crud::<SaveSubscriptionResource, S>(router, "subscriptions");
        let router = crud::<SaveCurrencyResource, S>(router, "currencies");
        let router = crud::<SaveCountryResource, S>(router, "countries");
        let router = crud::<SaveDepartmentResource, S>(router, "departments");
        let router = crud::<SaveCountryCurrencyResource, S>(router, "country-currencies");
        let router = crud::<SaveOrderStatusResource, S>(router, "order-statuses");
        let router = crud::<SaveOrderResource, S>(router, "orders");

        router
            .layer(metrics)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Mounts list/save at `/api/<resource>` and find/update/delete at
/// `/api/<resource>/{id}`.
fn crud<R: SaveResource, S: Store>(router: StateRouter<S>, resource: &str) -> StateRouter<S> {
    router
        .route(
            &format!("/api/{resource}"),
            get(handlers::list::<R::Entity, S>).post(handlers::create::<R, S>),
        )
        .route(
            &format!("/api/{resource}/{{id}}"),
            get(handlers::find::<R::Entity, S>)
                .put(handlers::update::<R, S>)
                .delete(handlers::delete::<R::Entity, S>),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
