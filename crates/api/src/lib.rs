//! HTTP API server for the storefront backend.
//!
//! Exposes the cart, checkout, address and catalog engines over axum, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use document_store::DocumentStore;
use domain::{
    AddressService, CartService, CatalogService, CheckoutService, EngineSettings, UserService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
///
/// Every engine holds a clone of the same store handle.
pub struct AppState<S> {
    pub users: UserService<S>,
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub addresses: AddressService<S>,
}

impl<S: DocumentStore + Clone> AppState<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        Self {
            users: UserService::new(store.clone(), settings),
            catalog: CatalogService::new(store.clone(), settings),
            carts: CartService::new(store.clone(), settings),
            checkout: CheckoutService::new(store.clone(), settings),
            addresses: AddressService::new(store, settings),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/addtocart", get(routes::cart::add::<S>))
        .route("/removeitem", get(routes::cart::remove::<S>))
        .route("/listcart", get(routes::cart::list::<S>))
        .route("/cartcheckout", get(routes::checkout::checkout::<S>))
        .route("/instantbuy", get(routes::checkout::instant_buy::<S>))
        .route("/addaddress", post(routes::address::add::<S>))
        .route("/edithomeaddress", put(routes::address::edit_home::<S>))
        .route("/editworkaddress", put(routes::address::edit_work::<S>))
        .route("/deleteaddresses", get(routes::address::delete_all::<S>))
        .route("/users/signup", post(routes::users::signup::<S>))
        .route("/users/productview", get(routes::catalog::list::<S>))
        .route("/users/search", get(routes::catalog::search::<S>))
        .route("/admin/addproduct", post(routes::catalog::add::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state over `store`.
pub fn create_state<S: DocumentStore + Clone + 'static>(
    store: S,
    settings: &EngineSettings,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, settings))
}
