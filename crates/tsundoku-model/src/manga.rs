//! Normalized manga and chapter types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Internal surrogate identifier of a manga.
pub type MangaId = u64;

/// Internal surrogate identifier of a chapter.
pub type ChapterId = u64;

/// Descriptive metadata of a manga, as last fetched from its source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaMetadata {
    /// Authors and artists.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Genres or tags.
    #[serde(default)]
    pub genres: Vec<String>,

    /// Publication status (ongoing, completed, ...), as reported by the source.
    #[serde(default)]
    pub status: Option<String>,

    /// Synopsis.
    #[serde(default)]
    pub description: Option<String>,

    /// Cover image URL.
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// A manga normalized across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manga {
    /// Internal identifier, stable for the lifetime of the identity store.
    pub id: MangaId,

    /// Name of the owning source.
    pub source_name: String,

    /// Identifier of the manga in the owning source.
    pub source_native_id: String,

    /// Title.
    pub title: String,

    /// Descriptive metadata.
    pub metadata: MangaMetadata,

    /// Chapters in reading order, when requested.
    pub chapters: Option<Vec<Chapter>>,

    /// Whether the manga is in the favorites.
    #[serde(default)]
    pub is_favorite: bool,
}

/// A chapter normalized across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Internal identifier.
    pub id: ChapterId,

    /// Internal identifier of the manga this chapter belongs to.
    pub manga_id: MangaId,

    /// Identifier of the chapter in the owning source.
    pub source_native_id: String,

    /// Chapter number, when the source provides one.
    pub number: Option<f64>,

    /// Volume label.
    pub volume: Option<String>,

    /// Chapter title.
    pub title: Option<String>,

    /// Release time.
    pub released_at: Option<DateTime<Utc>>,
}

impl Chapter {
    /// Returns a display label such as `Vol. 2 Ch. 10.5 - Title`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(volume) = &self.volume {
            parts.push(format!("Vol. {volume}"));
        }
        if let Some(number) = self.number {
            parts.push(format!("Ch. {number}"));
        }
        let head = parts.join(" ");
        match (&self.title, head.is_empty()) {
            (Some(title), true) => title.clone(),
            (Some(title), false) => format!("{head} - {title}"),
            (None, true) => self.source_native_id.clone(),
            (None, false) => head,
        }
    }
}

/// A chapter of a favorite manga, as listed in the library updates feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterUpdate {
    /// Internal identifier of the manga.
    pub manga_id: MangaId,

    /// Title of the manga.
    pub manga_title: String,

    /// The chapter.
    pub chapter: Chapter,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter() -> Chapter {
        Chapter {
            id: 7,
            manga_id: 1,
            source_native_id: "one/ch-10.5".to_string(),
            number: Some(10.5),
            volume: None,
            title: None,
            released_at: None,
        }
    }

    #[test]
    fn test_label_number_only() {
        assert_eq!(chapter().label(), "Ch. 10.5");
    }

    #[test]
    fn test_label_full() {
        let chapter = Chapter {
            volume: Some("2".to_string()),
            title: Some("The Return".to_string()),
            ..chapter()
        };
        assert_eq!(chapter.label(), "Vol. 2 Ch. 10.5 - The Return");
    }

    #[test]
    fn test_label_falls_back_to_native_id() {
        let chapter = Chapter {
            number: None,
            ..chapter()
        };
        assert_eq!(chapter.label(), "one/ch-10.5");
    }

    #[test]
    fn test_manga_json_snapshot() {
        let manga = Manga {
            id: 1,
            source_name: "local".to_string(),
            source_native_id: "Dragon Tales".to_string(),
            title: "Dragon Tales".to_string(),
            metadata: MangaMetadata {
                authors: vec!["A. Author".to_string()],
                genres: vec!["fantasy".to_string()],
                status: Some("ongoing".to_string()),
                description: None,
                cover_url: None,
            },
            chapters: None,
            is_favorite: true,
        };

        insta::assert_yaml_snapshot!(manga, @r#"
        id: 1
        source_name: local
        source_native_id: Dragon Tales
        title: Dragon Tales
        metadata:
          authors:
            - A. Author
          genres:
            - fantasy
          status: ongoing
          description: ~
          cover_url: ~
        chapters: ~
        is_favorite: true
        "#);
    }
}
