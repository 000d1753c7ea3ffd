pub mod cli;
pub mod config;
pub mod consts;
pub mod data;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;
pub mod types;

pub use error::{Error, Result};
pub use state::{ServerState, ServerStateInner};
