use notehub_core::NoteUpdate;
use notehub_core::util::normalize_text_option;

use crate::commands::common::{AppContext, GlobalArgs};
use crate::error::CliError;

pub async fn run_new(
    title: Option<String>,
    content: Option<String>,
    args: &GlobalArgs,
) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let note = app.store.create_note(&app.session).await?;

    let update = NoteUpdate {
        title: normalize_text_option(title),
        content,
        ..NoteUpdate::default()
    };
    if !update.is_empty() {
        app.store.update_note(&app.session, &note.id, update).await?;
    }

    println!("{}", note.id);
    Ok(())
}
