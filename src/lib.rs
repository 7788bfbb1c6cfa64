// FastMoney - Core Library
// Exposes all modules for use in the TUI, the API server, and tests

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod listing;
pub mod repository;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use admin::{ContentEditor, Notice, NoticeVariant, ResultEditor, ResultForm};
pub use auth::{hash_password, AuthEvent, AuthProvider, Session, Subscription};
pub use config::{init_logging, Config, LogTarget};
pub use db::{
    import_results, load_results_csv, seed_defaults, setup_database, SeedReport, SqliteStore,
};
pub use entities::{
    CategoryBox, CategoryField, HomepageContent, ResultDraft, ResultKind, WebResult,
};
pub use error::StoreError;
pub use listing::{
    ListingEngine, ListingState, ListingView, PageWindow, Partition, ResultsSnapshot,
    DEFAULT_PAGE_SIZE,
};
pub use repository::{ContentRepository, MemoryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
