use crate::commands::common::{AppContext, GlobalArgs};
use crate::error::CliError;

pub async fn run_delete(id: &str, args: &GlobalArgs) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let id = app.resolve(id).await?;
    app.store.delete_note(&app.session, &id).await?;
    println!("{id}");
    Ok(())
}

pub async fn run_empty_trash(args: &GlobalArgs) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let purged = app.store.empty_trash(&app.session).await?;
    println!("Deleted {purged} note(s) from trash");
    Ok(())
}
