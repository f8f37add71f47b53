pub mod algorithms;
pub mod book;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;

pub use book::Book;
pub use config::Config;
pub use error::{ApiError, Result};
pub use handlers::AppState;
pub use server::{create_app, Server};
pub use store::BookStore;
