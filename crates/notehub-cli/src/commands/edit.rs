use notehub_core::{NoteUpdate, Workspace};

use crate::commands::common::{capture_editor_input_with_initial, AppContext, GlobalArgs};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    title: Option<String>,
    content: Option<String>,
    args: &GlobalArgs,
) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let id = app.resolve(id).await?;
    let workspace = Workspace::new(
        app.store.clone(),
        app.session.clone(),
        app.config.autosave_quiet_window(),
    );
    workspace.open(&id).await?;

    let mut update = NoteUpdate {
        title,
        content,
        ..NoteUpdate::default()
    };
    if update.is_empty() {
        let current = workspace
            .selected_note()
            .await
            .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
        match capture_editor_input_with_initial(&current.content)? {
            Some(edited) if edited != current.content => update.content = Some(edited),
            Some(_) => {
                println!("{id}");
                return Ok(());
            }
            None => return Err(CliError::NothingToEdit),
        }
    }

    workspace.edit(update).await?;
    workspace.flush().await?;

    println!("{id}");
    Ok(())
}
