//! Embedded local backend: SQLite documents and accounts behind the
//! collaborator traits.  Used as the mock-mode backend and by the test
//! suites; a hosted SDK implementation would replace it wholesale.

pub mod accounts;
pub mod database;
pub mod migrations;
pub mod store;

pub use accounts::LocalAuth;
pub use database::Database;
pub use store::LocalBackend;
