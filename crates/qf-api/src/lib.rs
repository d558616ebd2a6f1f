pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod quiz;
pub mod router;
pub mod state;
pub mod store;
pub mod token;
pub mod tracing;
pub mod validation;

pub use config::ApiConfig;
pub use state::ApiState;
