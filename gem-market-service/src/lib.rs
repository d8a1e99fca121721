pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod startup;
pub mod utils;

pub use routes::build_router;
pub use startup::{AppState, Application};
