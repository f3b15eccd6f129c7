use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{registry::RegistryApi, state::BrowserState};

pub(crate) mod html;
mod repositories;
mod tags;

/// Routes of the browser. Repository names containing `/` must already be
/// percent-encoded by `RewriteUriLayer`.
pub(crate) fn router<R: RegistryApi>(state: Arc<BrowserState<R>>) -> Router {
    Router::new()
        .route("/", get(repositories::index::<R>))
        .route("/repo/{repository}", get(repositories::show::<R>))
        .route(
            "/repo/{repository}/tags",
            post(tags::bulk_destroy_form::<R>).delete(tags::bulk_destroy_query::<R>),
        )
        .route(
            "/repo/{repository}/tags/{tag}",
            get(tags::show::<R>).delete(tags::destroy::<R>),
        )
        .route(
            "/repo/{repository}/tags/{tag}/delete",
            post(tags::destroy::<R>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
