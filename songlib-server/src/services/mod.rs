//! Service layer

pub mod metadata;
pub mod song_lifecycle;

pub use metadata::{HttpMetadataResolver, MetadataResolver, StubMetadataResolver};
pub use song_lifecycle::{split_verses, SongLifecycle};
