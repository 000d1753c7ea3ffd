use std::sync::Arc;

use axum::routing::get;
use prometheus::{Encoder, TextEncoder};
use utoipa_axum::router::OpenApiRouter;

use crate::ServerState;

mod invite;
mod room;
mod sync;
mod user;
mod util;

pub use util::{cors, Auth};

async fn metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if encoder.encode(&prometheus::gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

pub fn routes() -> OpenApiRouter<Arc<ServerState>> {
    OpenApiRouter::new()
        .merge(room::routes())
        .merge(invite::routes())
        .merge(user::routes())
        .merge(sync::routes())
        .route("/metrics", get(metrics))
}
