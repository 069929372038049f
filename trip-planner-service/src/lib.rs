pub mod clients;
pub mod decode;
pub mod error;
pub mod models;
pub mod service;
pub mod steps;
pub mod workflow;

pub use error::PlannerError;
pub use service::create_app;
