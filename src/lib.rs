pub mod config;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod persistence;
pub mod pipeline;
pub mod render;
pub mod serial;
pub mod service;
pub mod visibility;
pub mod window;

pub use config::AppConfig;
pub use service::{Exit, Service};
