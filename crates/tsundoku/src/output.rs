//! Plain-text rendering of manager results.

use tsundoku_model::{Chapter, ChapterUpdate, Manga, Source};

/// Formats a source as one line.
pub fn source_line(source: &Source) -> String {
    let status = match (&source.installed_version, source.update_available) {
        (Some(installed), true) => format!("installed {installed}, update available"),
        (Some(_), false) => "installed".to_string(),
        (None, _) => "available".to_string(),
    };
    format!(
        "{:<20} {:<10} {:<28} [{}] ({status})",
        source.name, source.version, source.display_name, source.capabilities
    )
}

/// Formats a manga as one line.
pub fn manga_line(manga: &Manga) -> String {
    let star = if manga.is_favorite { " *" } else { "" };
    format!(
        "{:>6}  {}{star}  ({}: {})",
        manga.id, manga.title, manga.source_name, manga.source_native_id
    )
}

/// Formats a chapter as one line.
pub fn chapter_line(chapter: &Chapter) -> String {
    let released = chapter
        .released_at
        .map(|at| format!("  {}", at.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!("{:>6}  {}{released}", chapter.id, chapter.label())
}

/// Prints manga, or `empty` when there are none.
pub fn print_manga(manga: &[Manga], empty: &str) {
    if manga.is_empty() {
        println!("{empty}");
    }
    for m in manga {
        println!("{}", manga_line(m));
    }
}

/// Prints chapters, or a notice when there are none.
pub fn print_chapters(chapters: &[Chapter]) {
    if chapters.is_empty() {
        println!("No chapters.");
    }
    for chapter in chapters {
        println!("{}", chapter_line(chapter));
    }
}

/// Formats an updates feed entry as one line: the chapter, then its manga.
pub fn update_line(update: &ChapterUpdate) -> String {
    format!(
        "{}  [{}] {}",
        chapter_line(&update.chapter),
        update.manga_id,
        update.manga_title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsundoku_model::{Capability, CapabilitySet, MangaMetadata};

    fn source() -> Source {
        Source {
            name: "local".to_string(),
            display_name: "Local Library".to_string(),
            version: semver::Version::new(0, 2, 0),
            capabilities: CapabilitySet::new().with(Capability::Search),
            description: None,
            installed: false,
            installed_version: None,
            update_available: false,
        }
    }

    #[test]
    fn test_source_line_status() {
        let available = source();
        assert!(source_line(&available).ends_with("(available)"));

        let outdated = Source {
            installed: true,
            installed_version: Some(semver::Version::new(0, 1, 0)),
            update_available: true,
            ..source()
        };
        let line = source_line(&outdated);
        assert!(line.contains("[search]"));
        assert!(line.ends_with("(installed 0.1.0, update available)"));
    }

    #[test]
    fn test_manga_line_marks_favorites() {
        let mut manga = Manga {
            id: 1,
            source_name: "foo".to_string(),
            source_native_id: "abc123".to_string(),
            title: "Dragon".to_string(),
            metadata: MangaMetadata::default(),
            chapters: None,
            is_favorite: false,
        };
        assert_eq!(manga_line(&manga), "     1  Dragon  (foo: abc123)");

        manga.is_favorite = true;
        assert_eq!(manga_line(&manga), "     1  Dragon *  (foo: abc123)");
    }

    #[test]
    fn test_update_line() {
        let update = ChapterUpdate {
            manga_id: 3,
            manga_title: "Dragon".to_string(),
            chapter: Chapter {
                id: 12,
                manga_id: 3,
                source_native_id: "abc123/2".to_string(),
                number: Some(2.0),
                volume: None,
                title: None,
                released_at: chrono::DateTime::from_timestamp(86_400, 0),
            },
        };
        assert_eq!(
            update_line(&update),
            "    12  Ch. 2  1970-01-02  [3] Dragon"
        );
    }
}
