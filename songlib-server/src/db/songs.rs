//! Song persistence

use async_trait::async_trait;
use songlib_common::uuid_utils::parse_stored;
use songlib_common::{Error, Result, Song, SongChanges, SongFilter};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

const SONG_COLUMNS: &str =
    "id, group_id, group_name, title, release_date, text, link, created_at, updated_at";

#[async_trait]
pub trait SongStore: Send + Sync {
    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<bool>;

    /// True if a song with the same content tuple
    /// (group name, title, release date, text, link) is stored
    async fn exists_by_content(&self, conn: &mut SqliteConnection, song: &Song) -> Result<bool>;

    async fn find_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Song>>;

    /// Fails with `DuplicateSong` when the content tuple is already taken
    async fn insert(&self, conn: &mut SqliteConnection, song: &Song) -> Result<()>;

    /// Write `song.updated_at` plus only the columns named by `changes`
    async fn update(
        &self,
        conn: &mut SqliteConnection,
        song: &Song,
        changes: &SongChanges,
    ) -> Result<()>;

    /// Returns false when no row had that id
    async fn delete(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<bool>;

    /// Equality conjunction over the non-empty filter fields
    async fn list(&self, conn: &mut SqliteConnection, filter: &SongFilter) -> Result<Vec<Song>>;
}

/// SQLite-backed song store
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSongStore;

fn song_from_row(row: &SqliteRow) -> Result<Song> {
    let id: String = row.try_get("id")?;
    let group_id: String = row.try_get("group_id")?;

    Ok(Song {
        id: parse_stored("songs.id", &id)?,
        group_id: parse_stored("songs.group_id", &group_id)?,
        group_name: row.try_get("group_name")?,
        title: row.try_get("title")?,
        release_date: row.try_get("release_date")?,
        text: row.try_get("text")?,
        link: row.try_get("link")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn duplicate_or_storage(err: sqlx::Error, song: &Song) -> Error {
    let err = Error::from(err);
    if err.is_unique_violation() {
        Error::DuplicateSong(format!("'{}' by '{}' already exists", song.title, song.group_name))
    } else {
        err
    }
}

#[async_trait]
impl SongStore for SqliteSongStore {
    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM songs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(found.is_some())
    }

    async fn exists_by_content(&self, conn: &mut SqliteConnection, song: &Song) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM songs
            WHERE group_name = ? AND title = ? AND release_date = ? AND text = ? AND link = ?
            LIMIT 1
            "#,
        )
        .bind(&song.group_name)
        .bind(&song.title)
        .bind(&song.release_date)
        .bind(&song.text)
        .bind(&song.link)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(found.is_some())
    }

    async fn find_by_id(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Song>> {
        let row = sqlx::query(&format!("SELECT {} FROM songs WHERE id = ?", SONG_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(song_from_row).transpose()
    }

    async fn insert(&self, conn: &mut SqliteConnection, song: &Song) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO songs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            SONG_COLUMNS
        ))
        .bind(song.id.to_string())
        .bind(song.group_id.to_string())
        .bind(&song.group_name)
        .bind(&song.title)
        .bind(&song.release_date)
        .bind(&song.text)
        .bind(&song.link)
        .bind(song.created_at)
        .bind(song.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| duplicate_or_storage(e, song))?;

        Ok(())
    }

    async fn update(
        &self,
        conn: &mut SqliteConnection,
        song: &Song,
        changes: &SongChanges,
    ) -> Result<()> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE songs SET updated_at = ");
        builder.push_bind(song.updated_at);

        if let Some(group) = &changes.group {
            builder.push(", group_id = ").push_bind(group.id.to_string());
            builder.push(", group_name = ").push_bind(group.name.as_str());
        }
        if let Some(title) = &changes.title {
            builder.push(", title = ").push_bind(title.as_str());
        }
        if let Some(release_date) = &changes.release_date {
            builder.push(", release_date = ").push_bind(release_date.as_str());
        }
        if let Some(text) = &changes.text {
            builder.push(", text = ").push_bind(text.as_str());
        }
        if let Some(link) = &changes.link {
            builder.push(", link = ").push_bind(link.as_str());
        }

        builder.push(" WHERE id = ").push_bind(song.id.to_string());

        let result = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| duplicate_or_storage(e, song))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("song {}", song.id)));
        }

        Ok(())
    }

    async fn delete(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM songs WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, conn: &mut SqliteConnection, filter: &SongFilter) -> Result<Vec<Song>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM songs", SONG_COLUMNS));

        for (i, (column, value)) in filter.conditions().into_iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            builder.push(column).push(" = ").push_bind(value);
        }

        let rows = builder.build().fetch_all(&mut *conn).await?;

        rows.iter().map(song_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{GroupStore, SqliteGroupStore};
    use songlib_common::db::init_memory_database;
    use songlib_common::SongDetails;

    async fn seed(conn: &mut SqliteConnection, group: &str, title: &str, link: &str) -> Song {
        let group = SqliteGroupStore.resolve(conn, group).await.unwrap();
        let song = Song::new(
            &group,
            title,
            SongDetails {
                release_date: "01.01.2001".to_string(),
                text: "a\n\nb".to_string(),
                link: link.to_string(),
            },
        );
        SqliteSongStore.insert(conn, &song).await.unwrap();
        song
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let song = seed(&mut conn, "Muse", "Hysteria", "l1").await;
        let loaded = SqliteSongStore.find_by_id(&mut conn, song.id).await.unwrap().unwrap();

        assert_eq!(loaded, song);
    }

    #[tokio::test]
    async fn test_missing_song_is_none_not_error() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert!(SqliteSongStore.find_by_id(&mut conn, Uuid::new_v4()).await.unwrap().is_none());
        assert!(!SqliteSongStore.exists_by_id(&mut conn, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_content_rejected_by_constraint() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let song = seed(&mut conn, "Muse", "Hysteria", "l1").await;

        let mut copy = song.clone();
        copy.id = Uuid::new_v4();

        assert!(SqliteSongStore.exists_by_content(&mut conn, &copy).await.unwrap());
        let err = SqliteSongStore.insert(&mut conn, &copy).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateSong(_)));
    }

    #[tokio::test]
    async fn test_update_only_touches_changed_columns() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut song = seed(&mut conn, "Muse", "Hysteria", "l1").await;

        let changes = SongChanges {
            link: Some("l2".to_string()),
            ..Default::default()
        };
        changes.apply_to(&mut song);
        song.updated_at = songlib_common::time::now();
        SqliteSongStore.update(&mut conn, &song, &changes).await.unwrap();

        let loaded = SqliteSongStore.find_by_id(&mut conn, song.id).await.unwrap().unwrap();
        assert_eq!(loaded.link, "l2");
        assert_eq!(loaded.title, "Hysteria");
        assert_eq!(loaded.updated_at, song.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_song_is_not_found() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut ghost = seed(&mut conn, "Muse", "Hysteria", "l1").await;
        ghost.id = Uuid::new_v4();

        let err = SqliteSongStore
            .update(&mut conn, &ghost, &SongChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_exact_match_conjunction() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let hysteria = seed(&mut conn, "Muse", "Hysteria", "l1").await;
        seed(&mut conn, "Muse", "Uprising", "l2").await;
        seed(&mut conn, "Placebo", "Hysteria Live", "l3").await;

        let by_title = SongFilter {
            title: Some("Hysteria".to_string()),
            ..Default::default()
        };
        let found = SqliteSongStore.list(&mut conn, &by_title).await.unwrap();
        assert_eq!(found, vec![hysteria]);

        let by_group_and_link = SongFilter {
            group_name: Some("Muse".to_string()),
            link: Some("l3".to_string()),
            ..Default::default()
        };
        assert!(SqliteSongStore.list(&mut conn, &by_group_and_link).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let song = seed(&mut conn, "Muse", "Hysteria", "l1").await;

        assert!(SqliteSongStore.delete(&mut conn, song.id).await.unwrap());
        assert!(!SqliteSongStore.delete(&mut conn, song.id).await.unwrap());
    }
}
