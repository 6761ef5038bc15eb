pub mod app;
pub mod calendar;
pub mod client;
pub mod config;
pub mod directory;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;

pub use app::router;
pub use client::RemoteClient;
pub use config::Config;
pub use directory::{Confirmation, DeleteOutcome, MemberDirectory};
pub use errors::{ApiError, ApiResult};
pub use session::{MemorySession, SessionProvider};
pub use state::AppState;
pub use storage::{load_session, persist_session};
