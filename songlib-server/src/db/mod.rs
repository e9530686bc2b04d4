//! Catalog stores
//!
//! Each store is a trait with a SQLite implementation. Every method takes
//! the connection to run on, so the lifecycle service can hand the same
//! transaction to several stores and commit them as one unit.

mod groups;
mod songs;
mod verses;

pub use groups::{GroupStore, SqliteGroupStore};
pub use songs::{SongStore, SqliteSongStore};
pub use verses::{SqliteVerseStore, VerseStore};
