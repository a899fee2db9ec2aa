use clap::Parser;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use notehub_core::{Note, NoteId, ViewFilter};
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Commands, CompletionShell, FilterArg};
use crate::commands::common::{
    default_editor, format_relative_time, normalize_note_identifier, normalize_search_query,
    note_preview, resolve_note_id, strip_markup, AppContext, GlobalArgs,
};
use crate::commands::completions::render_completions;
use crate::error::CliError;
use crate::settings::{resolve_client_config, resolve_session_with, ENV_EMAIL, ENV_ID_TOKEN};

fn note(id: &str) -> Note {
    Note::with_id(NoteId::from(id))
}

#[test]
fn resolve_note_id_accepts_exact_and_unique_prefix() {
    let notes = vec![note("note-abc"), note("note-abd"), note("note-xyz")];

    assert_eq!(
        resolve_note_id(&notes, "note-xyz").unwrap(),
        NoteId::from("note-xyz")
    );
    assert_eq!(
        resolve_note_id(&notes, "note-x").unwrap(),
        NoteId::from("note-xyz")
    );
    assert!(matches!(
        resolve_note_id(&notes, "note-ab"),
        Err(CliError::AmbiguousNoteId(_))
    ));
    assert!(matches!(
        resolve_note_id(&notes, "other"),
        Err(CliError::NoteNotFound(_))
    ));
}

#[test]
fn exact_id_wins_over_longer_prefix_match() {
    let notes = vec![note("note-1"), note("note-10")];
    assert_eq!(
        resolve_note_id(&notes, "note-1").unwrap(),
        NoteId::from("note-1")
    );
}

#[test]
fn identifiers_and_queries_reject_blank_input() {
    assert_eq!(normalize_note_identifier("  note-1 ").unwrap(), "note-1");
    assert!(matches!(
        normalize_note_identifier("   "),
        Err(CliError::EmptyNoteId)
    ));
    assert!(matches!(
        normalize_search_query("\t"),
        Err(CliError::EmptySearchQuery)
    ));
}

#[test]
fn strip_markup_keeps_text_and_breaks_blocks() {
    assert_eq!(
        strip_markup("<p>Hello <b>world</b></p><p>a &amp; b</p>"),
        "Hello world\na & b\n"
    );
}

#[test]
fn note_preview_uses_first_non_empty_line() {
    let mut note = note("n");
    note.content = "<p></p><p>This is a very long sentence that should be shortened</p>".to_string();
    assert_eq!(note_preview(&note, 20), "This is a very lo...");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn session_prefers_flags_over_environment() {
    let env = |key: &str| match key {
        ENV_EMAIL => Some("env@example.com".to_string()),
        ENV_ID_TOKEN => Some("env-token".to_string()),
        _ => None,
    };

    let session = resolve_session_with(Some("flag@example.com".to_string()), None, env).unwrap();
    assert_eq!(session.user_id(), "flag@example.com");
    assert_eq!(session.require_credential().unwrap(), "env-token");

    assert!(matches!(
        resolve_session_with(None, None, |_| None),
        Err(CliError::MissingSession)
    ));
}

#[test]
fn api_url_flag_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "api_base_url": "https://file.example.com/", "autosave_quiet_ms": 250 }"#,
    )
    .unwrap();

    let from_file = resolve_client_config(Some(&path), None).unwrap();
    assert_eq!(from_file.api_base_url, "https://file.example.com");
    assert_eq!(from_file.autosave_quiet_ms, 250);

    let overridden = resolve_client_config(Some(&path), Some("http://localhost:9000/")).unwrap();
    assert_eq!(overridden.api_base_url, "http://localhost:9000");
    assert_eq!(overridden.autosave_quiet_ms, 250);
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = resolve_client_config(Some(&dir.path().join("absent.json")), None);
    assert!(matches!(result, Err(CliError::Core(_))));
}

#[test]
fn cli_parses_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "notehub",
        "list",
        "--filter",
        "favorites",
        "--api-url",
        "https://api.example.com",
        "--json",
    ])
    .unwrap();

    assert_eq!(cli.api_url.as_deref(), Some("https://api.example.com"));
    match cli.command {
        Commands::List { filter, json, .. } => {
            assert_eq!(filter, FilterArg::Favorites);
            assert_eq!(ViewFilter::from(filter), ViewFilter::Favorites);
            assert!(json);
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn attach_requires_at_least_one_path() {
    assert!(Cli::try_parse_from(["notehub", "attach", "note-1"]).is_err());
}

#[test]
fn completions_mention_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("notehub"));
}

#[tokio::test]
async fn connect_loads_listing_and_resolves_prefix() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/getNotes")
                .query_param("email", "a@example.com");
            then.status(200).json_body(serde_json::json!({
                "notes": [
                    { "noteId": "note-alpha", "title": "Alpha" },
                    { "noteId": "note-beta", "title": "Beta", "deleted": true }
                ]
            }));
        })
        .await;
    let toggle = server
        .mock_async(|when, then| {
            when.method(POST).path("/updateNote");
            then.status(200)
                .json_body(serde_json::json!({ "favorite": true }));
        })
        .await;

    let args = GlobalArgs {
        api_url: Some(server.base_url()),
        email: Some("a@example.com".to_string()),
        token: Some("token-1".to_string()),
        config: None,
    };
    let app = AppContext::connect(&args).await.unwrap();
    listing.assert_async().await;

    let id = app.resolve("note-a").await.unwrap();
    assert_eq!(id, NoteId::from("note-alpha"));
    assert_eq!(app.store.get_filtered_notes(ViewFilter::Trash).await.len(), 1);

    app.store.toggle_favorite(&app.session, &id).await.unwrap();
    toggle.assert_async().await;
    assert!(app.store.get_note(&id).await.unwrap().is_favorite);
}
