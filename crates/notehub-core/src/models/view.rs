//! View filter model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::note::Note;

/// Which projection of the note collection is visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    #[default]
    All,
    Favorites,
    Trash,
}

impl ViewFilter {
    /// Whether a note belongs to this view.
    #[must_use]
    pub const fn includes(self, note: &Note) -> bool {
        match self {
            Self::All => !note.is_deleted,
            Self::Favorites => note.is_favorite && !note.is_deleted,
            Self::Trash => note.is_deleted,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Favorites => "favorites",
            Self::Trash => "trash",
        }
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "notes" => Ok(Self::All),
            "favorites" | "favourites" => Ok(Self::Favorites),
            "trash" => Ok(Self::Trash),
            other => Err(format!("unknown view filter '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(is_favorite: bool, is_deleted: bool) -> Note {
        Note {
            is_favorite,
            is_deleted,
            ..Note::new()
        }
    }

    #[test]
    fn deleted_notes_only_show_in_trash() {
        let trashed_favorite = note(true, true);
        assert!(!ViewFilter::All.includes(&trashed_favorite));
        assert!(!ViewFilter::Favorites.includes(&trashed_favorite));
        assert!(ViewFilter::Trash.includes(&trashed_favorite));
    }

    #[test]
    fn favorites_require_flag() {
        assert!(ViewFilter::Favorites.includes(&note(true, false)));
        assert!(!ViewFilter::Favorites.includes(&note(false, false)));
        assert!(ViewFilter::All.includes(&note(false, false)));
    }

    #[test]
    fn parses_names() {
        assert_eq!("Trash".parse::<ViewFilter>().unwrap(), ViewFilter::Trash);
        assert_eq!("notes".parse::<ViewFilter>().unwrap(), ViewFilter::All);
        assert!("archive".parse::<ViewFilter>().is_err());
    }
}
