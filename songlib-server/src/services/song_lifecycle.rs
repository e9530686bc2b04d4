//! Song aggregate lifecycle
//!
//! Orchestrates metadata resolution, group get-or-create, song persistence and
//! verse derivation. Every mutating operation runs in a single transaction,
//! so a song and its verses become visible together or not at all.

use crate::db::{
    GroupStore, SongStore, SqliteGroupStore, SqliteSongStore, SqliteVerseStore, VerseStore,
};
use crate::services::metadata::MetadataResolver;
use songlib_common::time;
use songlib_common::{Error, Group, Result, Song, SongFilter, SongUpdate, VersePage};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Separator between verses in a song's text
pub const VERSE_SEPARATOR: &str = "\n\n";

/// Write transactions take the write lock up front, so contending writers
/// wait on the busy timeout instead of failing a lock upgrade
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Split song text into verses, in order
///
/// Every chunk between separators becomes a verse, including empty ones, so
/// the result always has at least one element.
pub fn split_verses(text: &str) -> Vec<String> {
    text.split(VERSE_SEPARATOR).map(str::to_owned).collect()
}

/// Song lifecycle service
pub struct SongLifecycle {
    pool: SqlitePool,
    metadata: Arc<dyn MetadataResolver>,
    groups: Arc<dyn GroupStore>,
    songs: Arc<dyn SongStore>,
    verses: Arc<dyn VerseStore>,
}

impl SongLifecycle {
    /// Service backed by the SQLite stores
    pub fn new(pool: SqlitePool, metadata: Arc<dyn MetadataResolver>) -> Self {
        Self::with_stores(
            pool,
            metadata,
            Arc::new(SqliteGroupStore),
            Arc::new(SqliteSongStore),
            Arc::new(SqliteVerseStore),
        )
    }

    pub fn with_stores(
        pool: SqlitePool,
        metadata: Arc<dyn MetadataResolver>,
        groups: Arc<dyn GroupStore>,
        songs: Arc<dyn SongStore>,
        verses: Arc<dyn VerseStore>,
    ) -> Self {
        Self {
            pool,
            metadata,
            groups,
            songs,
            verses,
        }
    }

    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with(BEGIN_WRITE).await?)
    }

    /// Get-or-create a group by name
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn resolve_group(&self, name: &str) -> Result<Group> {
        let mut conn = self.pool.acquire().await?;
        self.groups.resolve(&mut conn, name).await
    }

    /// Create a song from `(group, title)` and resolved metadata
    ///
    /// Metadata is fetched before any storage work starts. Group creation,
    /// the song row and its verses are then committed together; a duplicate
    /// content tuple leaves no rows behind.
    #[instrument(skip(self), fields(song_id), err(level = "warn"))]
    pub async fn create_song(&self, group: &str, title: &str) -> Result<Song> {
        let details = self
            .metadata
            .song_details(group, title)
            .await
            .map_err(|e| match e {
                Error::MetadataUnavailable(_) => e,
                other => Error::MetadataUnavailable(other.to_string()),
            })?;
        let verses = split_verses(&details.text);

        let mut tx = self.begin_write().await?;

        let group = self.groups.resolve(&mut *tx, group).await?;
        let song = Song::new(&group, title, details);
        tracing::Span::current().record("song_id", tracing::field::display(song.id));

        if self.songs.exists_by_content(&mut *tx, &song).await? {
            return Err(Error::DuplicateSong(format!(
                "'{}' by '{}' released {} already exists",
                song.title, song.group_name, song.release_date
            )));
        }

        self.songs.insert(&mut *tx, &song).await?;
        self.verses.replace_verses(&mut *tx, song.id, &verses).await?;

        tx.commit().await?;

        info!(song_id = %song.id, group_id = %song.group_id, verses = verses.len(), "Created song");
        Ok(song)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn get_song(&self, id: Uuid) -> Result<Song> {
        let mut conn = self.pool.acquire().await?;
        self.songs
            .find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("song {}", id)))
    }

    /// Merge-patch update
    ///
    /// Only non-empty fields overwrite. A group name re-parents the song
    /// (creating the group if needed) and a text change re-derives verses.
    #[instrument(skip(self, update), err(level = "warn"))]
    pub async fn update_song(&self, id: Uuid, update: SongUpdate) -> Result<Song> {
        let mut tx = self.begin_write().await?;

        let mut song = self
            .songs
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("song {}", id)))?;

        let mut changes = update.scalar_changes();
        if let Some(name) = update.group_name() {
            changes.group = Some(self.groups.resolve(&mut *tx, name).await?);
        }

        changes.apply_to(&mut song);
        song.updated_at = time::now();
        self.songs.update(&mut *tx, &song, &changes).await?;

        if changes.text.is_some() {
            let verses = split_verses(&song.text);
            self.verses.replace_verses(&mut *tx, song.id, &verses).await?;
            debug!(
                song_id = %song.id,
                verses = verses.len(),
                "Re-derived verses after text change"
            );
        }

        tx.commit().await?;

        info!(song_id = %song.id, "Updated song");
        Ok(song)
    }

    /// Delete a song together with its verses
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn delete_song(&self, id: Uuid) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let verses = self.verses.delete_for_song(&mut *tx, id).await?;
        if !self.songs.delete(&mut *tx, id).await? {
            return Err(Error::NotFound(format!("song {}", id)));
        }

        tx.commit().await?;

        info!(song_id = %id, verses, "Deleted song");
        Ok(())
    }

    /// Exact-match listing; at least one filter must be non-empty
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn list_songs(&self, filter: &SongFilter) -> Result<Vec<Song>> {
        if filter.is_empty() {
            return Err(Error::InvalidInput("at least one filter must be provided".to_string()));
        }

        let mut conn = self.pool.acquire().await?;
        let songs = self.songs.list(&mut conn, filter).await?;

        debug!(matches = songs.len(), "Listed songs");
        Ok(songs)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn verses_page(&self, song_id: Uuid, page: i64, limit: i64) -> Result<VersePage> {
        let mut conn = self.pool.acquire().await?;
        self.verses.get_page(&mut conn, song_id, page, limit).await
    }
}
