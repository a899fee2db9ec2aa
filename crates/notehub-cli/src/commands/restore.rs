use notehub_core::ViewFilter;

use crate::commands::common::{format_note_lines, AppContext, GlobalArgs};
use crate::error::CliError;

/// Restore only changes the local projection; the service has no restore
/// endpoint, so the note is back in the main view for this invocation only.
pub async fn run_restore(id: &str, args: &GlobalArgs) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let id = app.resolve(id).await?;
    if !app.store.restore_note(&id).await {
        return Err(CliError::NoteNotFound(id.to_string()));
    }
    tracing::warn!("Restore is not persisted by the note service");

    for line in format_note_lines(&app.store.get_filtered_notes(ViewFilter::All).await) {
        println!("{line}");
    }
    Ok(())
}
