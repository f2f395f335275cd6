pub mod api;
pub mod config;
pub mod currency;
pub mod db;
pub mod models;
pub mod state;
pub mod sync;
pub mod upstream;

#[cfg(test)]
pub mod tests;

pub use api::error::ApiError;
pub use api::route::create_router;
pub use db::connection;
pub use db::migration;
pub use models::{BaseTransactionKind, TransactionRow};
pub use state::AppState;
pub use upstream::NodeClient;
