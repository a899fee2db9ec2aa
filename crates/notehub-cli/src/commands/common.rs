use std::env;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use notehub_core::{ClientConfig, HttpNoteBackend, Note, NoteId, NoteStore, SessionContext};
use serde::Serialize;

use crate::error::CliError;
use crate::settings::{resolve_client_config, resolve_session};

/// Global flags shared by every remote command.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub config: Option<PathBuf>,
}

/// A connected store with the server listing loaded.
pub struct AppContext {
    pub config: ClientConfig,
    pub session: SessionContext,
    pub store: NoteStore<HttpNoteBackend>,
}

impl AppContext {
    pub async fn connect(args: &GlobalArgs) -> Result<Self, CliError> {
        let config = resolve_client_config(args.config.as_deref(), args.api_url.as_deref())?;
        let session = resolve_session(args.email.clone(), args.token.clone())?;
        let store = NoteStore::new(HttpNoteBackend::new(&config)?);
        store.refresh(&session).await?;
        Ok(Self {
            config,
            session,
            store,
        })
    }

    /// Resolves an id or unique id prefix against the loaded listing.
    pub async fn resolve(&self, query: &str) -> Result<NoteId, CliError> {
        let query = normalize_note_identifier(query)?;
        let notes = self.store.snapshot().await.notes;
        resolve_note_id(&notes, &query)
    }

    /// Resolves the note and fetches its full content.
    ///
    /// Anything that saves a note must open it first; listings may omit content.
    pub async fn open(&self, query: &str) -> Result<NoteId, CliError> {
        let id = self.resolve(query).await?;
        self.store.open_and_select_note(&self.session, &id).await?;
        Ok(id)
    }
}

pub fn resolve_note_id(notes: &[Note], query: &str) -> Result<NoteId, CliError> {
    if let Some(note) = notes.iter().find(|note| note.id.as_str() == query) {
        return Ok(note.id.clone());
    }

    let matching: Vec<&Note> = notes
        .iter()
        .filter(|note| note.id.as_str().starts_with(query))
        .collect();

    match matching.as_slice() {
        [] => Err(CliError::NoteNotFound(query.to_string())),
        [note] => Ok(note.id.clone()),
        many => {
            let options = many
                .iter()
                .take(3)
                .map(|note| short_id(&note.id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub is_favorite: bool,
    pub is_deleted: bool,
    pub attachments: usize,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        is_favorite: note.is_favorite,
        is_deleted: note.is_deleted,
        attachments: note.attachments.len(),
        created_at: note.created_at,
        updated_at: note.updated_at,
        relative_time: format_relative_time(note.updated_at, now_ms),
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let marker = if note.is_favorite { '*' } else { ' ' };
            let title = truncate_chars(&collapse_whitespace(&note.title), 32);
            let relative_time = format_relative_time(note.updated_at, now_ms);
            let attachments = match note.attachments.len() {
                0 => String::new(),
                count => format!("  +{count} file(s)"),
            };
            format!(
                "{marker} {:<22}  {title:<32}  {relative_time}{attachments}",
                short_id(&note.id)
            )
        })
        .collect()
}

pub fn short_id(id: &NoteId) -> String {
    id.as_str().chars().take(22).collect()
}

/// First line of content with markup stripped.
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let text = strip_markup(&note.content);
    let first_line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    truncate_chars(&collapse_whitespace(first_line), max_chars)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

const BLOCK_TAGS: &[&str] = &["p", "div", "li", "h1", "h2", "h3", "blockquote"];

/// Drops HTML tags; `<br>` and closing block tags become line breaks.
pub fn strip_markup(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in content.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let closing = tag.starts_with('/');
                let name = tag
                    .trim_start_matches('/')
                    .trim_end_matches('/')
                    .split_whitespace()
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if name == "br" || (closing && BLOCK_TAGS.contains(&name.as_str())) {
                    output.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ => output.push(ch),
        }
    }

    output
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Opens `$EDITOR` on `initial_content`; `None` when stdin is not a terminal.
pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }

    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let edited = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(Some(edited.trim_end().to_string()))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    let status = match Command::new(editor).arg(file_path).status() {
        Ok(status) => status,
        // `EDITOR="code --wait"` style values
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };
            Command::new(program).args(parts).arg(file_path).status()?
        }
        Err(err) => return Err(CliError::Io(err)),
    };

    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .ok()
        .or_else(|| env::var("EDITOR").ok())
        .and_then(|value| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(default_editor)
}

pub fn default_editor() -> String {
    if cfg!(windows) {
        "notepad".to_string()
    } else {
        "vi".to_string()
    }
}

fn create_temp_note_file_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("notehub-{}-{nanos}.html", std::process::id()))
}
