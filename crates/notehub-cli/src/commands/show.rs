use crate::commands::common::{format_timestamp, strip_markup, AppContext, GlobalArgs};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, args: &GlobalArgs) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let id = app.open(id).await?;
    let Some(note) = app.store.get_note(&id).await else {
        return Err(CliError::NoteNotFound(id.to_string()));
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    let mut flags = Vec::new();
    if note.is_favorite {
        flags.push("favorite");
    }
    if note.is_deleted {
        flags.push("trash");
    }

    println!("{}", note.title);
    println!("id:      {}", note.id);
    println!("updated: {}", format_timestamp(note.updated_at));
    if !flags.is_empty() {
        println!("flags:   {}", flags.join(", "));
    }
    for attachment in &note.attachments {
        println!(
            "file:    {} ({}, {} bytes) [{}]",
            attachment.name, attachment.mime_type, attachment.size_bytes, attachment.id
        );
    }
    println!();
    println!("{}", strip_markup(&note.content).trim());
    Ok(())
}
