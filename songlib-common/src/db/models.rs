//! Database models

use crate::{time, uuid_utils};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Performing group, created once per distinct name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid_utils::generate(),
            name: name.into(),
        }
    }
}

/// Song aggregate root
///
/// `group_name` is a snapshot of the group name taken when the song was
/// created or re-parented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    #[serde(rename = "song_id")]
    pub id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub title: String,
    pub release_date: String,
    pub text: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Song {
    /// Assemble a fresh song for `group` from resolved metadata
    pub fn new(group: &Group, title: impl Into<String>, details: SongDetails) -> Self {
        let now = time::now();
        Self {
            id: uuid_utils::generate(),
            group_id: group.id,
            group_name: group.name.clone(),
            title: title.into(),
            release_date: details.release_date,
            text: details.text,
            link: details.link,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Single verse row, derived from `Song::text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub id: Uuid,
    pub song_id: Uuid,
    /// 1-based, contiguous within a song
    pub verse_number: i64,
    pub text: String,
}

/// Release metadata returned by a metadata resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDetails {
    #[serde(rename = "releaseDate")]
    pub release_date: String,
    pub text: String,
    pub link: String,
}

/// One page of verses
///
/// `total` is the number of verses on this page, not the song-wide count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersePage {
    pub verses: Vec<String>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

/// Exact-match filters for song listing; empty strings count as absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFilter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl SongFilter {
    /// Column/value pairs for every non-empty filter, in a stable order
    pub fn conditions(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("group_name", &self.group_name),
            ("release_date", &self.release_date),
            ("text", &self.text),
            ("link", &self.link),
        ]
        .into_iter()
        .filter_map(|(column, value)| non_empty(value).map(|v| (column, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions().is_empty()
    }
}

/// Merge-patch update request: absent or empty fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongUpdate {
    #[serde(default, rename = "group", alias = "group_name")]
    pub group_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl SongUpdate {
    pub fn group_name(&self) -> Option<&str> {
        non_empty(&self.group_name)
    }

    /// Scalar column changes carried by this request (group excluded, it
    /// needs resolving first)
    pub fn scalar_changes(&self) -> SongChanges {
        SongChanges {
            group: None,
            title: non_empty(&self.title).map(str::to_owned),
            release_date: non_empty(&self.release_date).map(str::to_owned),
            text: non_empty(&self.text).map(str::to_owned),
            link: non_empty(&self.link).map(str::to_owned),
        }
    }
}

/// Columns that actually change in a partial song update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongChanges {
    pub group: Option<Group>,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub text: Option<String>,
    pub link: Option<String>,
}

impl SongChanges {
    /// Overwrite the fields of `song` that this change set carries
    pub fn apply_to(&self, song: &mut Song) {
        if let Some(group) = &self.group {
            song.group_id = group.id;
            song.group_name = group.name.clone();
        }
        if let Some(title) = &self.title {
            song.title = title.clone();
        }
        if let Some(release_date) = &self.release_date {
            song.release_date = release_date.clone();
        }
        if let Some(text) = &self.text {
            song.text = text.clone();
        }
        if let Some(link) = &self.link {
            song.link = link.clone();
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
