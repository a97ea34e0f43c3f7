pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod insight;
pub mod location;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod submission;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::RecordStore;
