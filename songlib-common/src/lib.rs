//! # Song Library Common
//!
//! Shared code for the song library catalog service:
//! - Domain models (groups, songs, verses)
//! - Error taxonomy shared by stores, services and the HTTP layer
//! - Bootstrap configuration loading
//! - SQLite pool bootstrap, schema creation and migrations
//! - Small id/time helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use db::models::{
    Group, Song, SongChanges, SongDetails, SongFilter, SongUpdate, Verse, VersePage,
};
pub use error::{Error, Result};
