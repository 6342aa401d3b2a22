//! Picguard HTTP API
//!
//! Axum front end for the upload pipeline: the `POST /upload` handler, the
//! read-only view of the upload directory, and the startup wiring around them.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
