pub mod config;
pub mod error;
pub mod models;
pub mod normalize; // table <-> question translation
pub mod openapi;
pub mod routes;
pub mod session;
pub mod sheets;
pub mod store;
pub mod table;
pub mod views;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use session::{Session, SessionRegistry};
pub use store::{QuestionStore, ReadOutcome, WriteOutcome};
