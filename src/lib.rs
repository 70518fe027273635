pub mod axis;
pub mod config;
pub mod drag;
pub mod error;
pub mod gateway;
pub mod grid;
pub mod lane;
pub mod model;
pub mod observability;
pub mod provider;
pub mod session;
pub mod workflow;

pub use error::EngineError;
