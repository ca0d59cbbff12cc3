//! Single-resource todo HTTP service.
//!
//! # Overview
//! Clients list, create, update and delete todo items under `/todos`. All
//! state lives in one in-memory map, loaded from a JSON file at startup and
//! rewritten in full after every mutation.
//!
//! # Design
//! - `Store` owns the map, its lock and the backing file; it is built once
//!   and handed to the router as state.
//! - `api` is a thin boundary: extract, call the store, render JSON.
//! - Errors are plain text with the status code carrying the meaning.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod store;
pub mod todo;

use std::{future::Future, sync::Arc};

use axum::Router;
use tokio::net::TcpListener;

pub use config::ServerConfig;
pub use error::{ApiError, ConfigError, StoreError};
pub use store::Store;
pub use todo::{NewTodo, Todo, TodoPatch};

pub fn app(store: Arc<Store>) -> Router {
    api::router(store)
}

/// Serves `store` on `listener` until `shutdown` resolves.
pub async fn run<F>(
    listener: TcpListener,
    store: Arc<Store>,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(store))
        .with_graceful_shutdown(shutdown)
        .await
}
