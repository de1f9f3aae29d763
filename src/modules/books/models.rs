use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shelf_db::Record;
use time::OffsetDateTime;

use crate::utils::{lenient_number, lenient_patch_number, nullable};

/// Reading-progress label attached to a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[default]
    #[serde(rename = "quero ler", alias = "QUERO_LER")]
    WantToRead,
    #[serde(rename = "lendo", alias = "LENDO")]
    Reading,
    #[serde(rename = "lido", alias = "LIDO")]
    Finished,
    #[serde(rename = "pausado", alias = "PAUSADO")]
    Paused,
    #[serde(rename = "abandonado", alias = "ABANDONADO")]
    Abandoned,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 5] = [
        ReadingStatus::WantToRead,
        ReadingStatus::Reading,
        ReadingStatus::Finished,
        ReadingStatus::Paused,
        ReadingStatus::Abandoned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "quero ler",
            ReadingStatus::Reading => "lendo",
            ReadingStatus::Finished => "lido",
            ReadingStatus::Paused => "pausado",
            ReadingStatus::Abandoned => "abandonado",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown reading status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ReadingStatus {
    type Err = UnknownStatus;

    /// Accepts the display label ("quero ler") and the upper snake form ("QUERO_LER").
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace('_', " ");
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Reading status per book id, as kept by the status tracker.
pub type StatusMap = BTreeMap<String, ReadingStatus>;

/// Stored genre record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
}

impl Genre {
    pub fn reference(&self) -> GenreRef {
        GenreRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

impl Record for Genre {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Genre as embedded in a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRef {
    pub id: String,
    pub name: String,
}

/// A book's genre on the wire: either a bare label or a `{id, name}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenreField {
    Label(String),
    Record(GenreRef),
}

impl GenreField {
    /// Display name regardless of representation.
    pub fn display_name(&self) -> &str {
        match self {
            GenreField::Label(name) => name,
            GenreField::Record(genre) => &genre.name,
        }
    }
}

impl From<&str> for GenreField {
    fn from(name: &str) -> Self {
        GenreField::Label(name.to_string())
    }
}

fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// A catalogued book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    /// URL or inline data URI; stored as given.
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub genre: Option<GenreField>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pages: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_page: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<ReadingStatus>,
    #[serde(default = "now_utc", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default = "now_utc", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Book {
    /// A book with only the mandatory fields set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        let now = now_utc();
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            cover_url: String::new(),
            genre: None,
            year: None,
            pages: None,
            current_page: None,
            rating: None,
            synopsis: None,
            isbn: None,
            notes: None,
            status: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Genre display name; empty when the book has no genre.
    pub fn genre_name(&self) -> &str {
        self.genre.as_ref().map(GenreField::display_name).unwrap_or("")
    }
}

impl Record for Book {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Payload for creating a book. Only title and author are mandatory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub genre: Option<GenreField>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pages: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub current_page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<i64>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Partial update. A missing key leaves the field alone; `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub genre: Option<Option<GenreField>>,
    #[serde(default, deserialize_with = "lenient_patch_number")]
    pub year: Option<Option<i64>>,
    #[serde(default, deserialize_with = "lenient_patch_number")]
    pub pages: Option<Option<i64>>,
    #[serde(default, deserialize_with = "lenient_patch_number")]
    pub current_page: Option<Option<i64>>,
    #[serde(default, deserialize_with = "lenient_patch_number")]
    pub rating: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub synopsis: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub isbn: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<String>>,
}
