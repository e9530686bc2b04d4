//! Verse persistence and page-windowed reads

use crate::pagination::page_window;
use async_trait::async_trait;
use songlib_common::uuid_utils::{generate, parse_stored};
use songlib_common::{Error, Result, Verse, VersePage};
use sqlx::{Connection, Row, SqliteConnection};
use tracing::debug;
use uuid::Uuid;

#[async_trait]
pub trait VerseStore: Send + Sync {
    /// Replace every verse of `song_id` with `verses`, numbered 1..=n in
    /// list order, atomically
    async fn replace_verses(
        &self,
        conn: &mut SqliteConnection,
        song_id: Uuid,
        verses: &[String],
    ) -> Result<()>;

    /// Verses whose number falls in the page window, ascending
    ///
    /// An empty first page is `NotFound`; an empty later page is not an error.
    async fn get_page(
        &self,
        conn: &mut SqliteConnection,
        song_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<VersePage>;

    async fn list_for_song(
        &self,
        conn: &mut SqliteConnection,
        song_id: Uuid,
    ) -> Result<Vec<Verse>>;

    async fn delete_for_song(&self, conn: &mut SqliteConnection, song_id: Uuid) -> Result<u64>;
}

/// SQLite-backed verse store
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteVerseStore;

#[async_trait]
impl VerseStore for SqliteVerseStore {
    async fn replace_verses(
        &self,
        conn: &mut SqliteConnection,
        song_id: Uuid,
        verses: &[String],
    ) -> Result<()> {
        if song_id.is_nil() {
            return Err(Error::InvalidInput("song id must not be nil".to_string()));
        }
        if verses.is_empty() {
            return Err(Error::InvalidInput(format!("no verses provided for song {}", song_id)));
        }

        // Nested inside a caller's transaction this is a savepoint
        let mut tx = conn.begin().await?;

        let removed = sqlx::query("DELETE FROM verses WHERE song_id = ?")
            .bind(song_id.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for (i, text) in verses.iter().enumerate() {
            sqlx::query("INSERT INTO verses (id, song_id, verse_number, text) VALUES (?, ?, ?, ?)")
                .bind(generate().to_string())
                .bind(song_id.to_string())
                .bind(i as i64 + 1)
                .bind(text)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(song_id = %song_id, removed, inserted = verses.len(), "Replaced verses");
        Ok(())
    }

    async fn get_page(
        &self,
        conn: &mut SqliteConnection,
        song_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<VersePage> {
        let window = page_window(page, limit)?;

        let verses: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT text FROM verses
            WHERE song_id = ? AND verse_number >= ? AND verse_number <= ?
            ORDER BY verse_number ASC
            "#,
        )
        .bind(song_id.to_string())
        .bind(window.first_verse)
        .bind(window.last_verse)
        .fetch_all(&mut *conn)
        .await?;

        if verses.is_empty() && window.page == 1 {
            return Err(Error::NotFound(format!("no verses found for song {}", song_id)));
        }

        Ok(VersePage {
            total: verses.len() as i64,
            verses,
            page: window.page,
            limit: window.limit,
        })
    }

    async fn list_for_song(
        &self,
        conn: &mut SqliteConnection,
        song_id: Uuid,
    ) -> Result<Vec<Verse>> {
        let rows = sqlx::query(
            r#"
            SELECT id, song_id, verse_number, text FROM verses
            WHERE song_id = ?
            ORDER BY verse_number ASC
            "#,
        )
        .bind(song_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let song_id: String = row.try_get("song_id")?;
                Ok(Verse {
                    id: parse_stored("verses.id", &id)?,
                    song_id: parse_stored("verses.song_id", &song_id)?,
                    verse_number: row.try_get("verse_number")?,
                    text: row.try_get("text")?,
                })
            })
            .collect()
    }

    async fn delete_for_song(&self, conn: &mut SqliteConnection, song_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM verses WHERE song_id = ?")
            .bind(song_id.to_string())
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{GroupStore, SongStore, SqliteGroupStore, SqliteSongStore};
    use songlib_common::db::init_memory_database;
    use songlib_common::{Song, SongDetails};

    async fn seed_song(conn: &mut SqliteConnection) -> Uuid {
        let group = SqliteGroupStore.resolve(conn, "Muse").await.unwrap();
        let song = Song::new(
            &group,
            "Hysteria",
            SongDetails {
                release_date: "01.12.2003".to_string(),
                text: "a\n\nb\n\nc".to_string(),
                link: "link".to_string(),
            },
        );
        SqliteSongStore.insert(conn, &song).await.unwrap();
        song.id
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_replace_numbers_verses_in_order() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let song_id = seed_song(&mut conn).await;

        SqliteVerseStore
            .replace_verses(&mut conn, song_id, &strings(&["a", "b", "c"]))
            .await
            .unwrap();

        let verses = SqliteVerseStore.list_for_song(&mut conn, song_id).await.unwrap();
        let numbered: Vec<(i64, &str)> = verses
            .iter()
            .map(|v| (v.verse_number, v.text.as_str()))
            .collect();
        assert_eq!(numbered, vec![(1, "a"), (2, "b"), (3, "c")]);
    }

    #[tokio::test]
    async fn test_replace_drops_old_numbers() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let song_id = seed_song(&mut conn).await;

        SqliteVerseStore
            .replace_verses(&mut conn, song_id, &strings(&["a", "b", "c"]))
            .await
            .unwrap();
        SqliteVerseStore
            .replace_verses(&mut conn, song_id, &strings(&["x"]))
            .await
            .unwrap();

        let verses = SqliteVerseStore.list_for_song(&mut conn, song_id).await.unwrap();
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].verse_number, 1);
        assert_eq!(verses[0].text, "x");
    }

    #[tokio::test]
    async fn test_replace_rejects_nil_id_and_empty_list() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let nil = SqliteVerseStore
            .replace_verses(&mut conn, Uuid::nil(), &strings(&["a"]))
            .await
            .unwrap_err();
        assert!(matches!(nil, Error::InvalidInput(_)));

        let empty = SqliteVerseStore
            .replace_verses(&mut conn, Uuid::new_v4(), &[])
            .await
            .unwrap_err();
        assert!(matches!(empty, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_replace_for_unknown_song_fails_foreign_key() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let err = SqliteVerseStore
            .replace_verses(&mut conn, Uuid::new_v4(), &strings(&["z"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verses")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_delete_for_song_counts_rows() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let song_id = seed_song(&mut conn).await;
        SqliteVerseStore
            .replace_verses(&mut conn, song_id, &strings(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(SqliteVerseStore.delete_for_song(&mut conn, song_id).await.unwrap(), 2);
        assert_eq!(SqliteVerseStore.delete_for_song(&mut conn, song_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pages_follow_verse_numbers() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let song_id = seed_song(&mut conn).await;
        SqliteVerseStore
            .replace_verses(&mut conn, song_id, &strings(&["a", "b", "c"]))
            .await
            .unwrap();

        let first = SqliteVerseStore.get_page(&mut conn, song_id, 1, 2).await.unwrap();
        assert_eq!(
            first,
            VersePage {
                verses: strings(&["a", "b"]),
                page: 1,
                limit: 2,
                total: 2
            }
        );

        let second = SqliteVerseStore.get_page(&mut conn, song_id, 2, 2).await.unwrap();
        assert_eq!(second.verses, strings(&["c"]));
        assert_eq!(second.total, 1);

        let past_end = SqliteVerseStore.get_page(&mut conn, song_id, 3, 2).await.unwrap();
        assert!(past_end.verses.is_empty());
        assert_eq!((past_end.page, past_end.limit, past_end.total), (3, 2, 0));
    }

    #[tokio::test]
    async fn test_empty_first_page_is_not_found() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let err = SqliteVerseStore
            .get_page(&mut conn, Uuid::new_v4(), 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
