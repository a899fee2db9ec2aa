use crate::commands::common::{AppContext, GlobalArgs};
use crate::error::CliError;

pub async fn run_favorite(id: &str, args: &GlobalArgs) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let id = app.resolve(id).await?;
    app.store.toggle_favorite(&app.session, &id).await?;

    let favorite = app
        .store
        .get_note(&id)
        .await
        .is_some_and(|note| note.is_favorite);
    println!("{id} {}", if favorite { "favorited" } else { "unfavorited" });
    Ok(())
}
