use notehub_core::ViewFilter;

use crate::commands::common::{
    format_note_lines, normalize_search_query, note_to_list_item, AppContext, GlobalArgs,
    NoteListItem,
};
use crate::error::CliError;

pub async fn run_list(
    filter: ViewFilter,
    search: Option<&str>,
    as_json: bool,
    args: &GlobalArgs,
) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let notes = match search {
        Some(query) => {
            let query = normalize_search_query(query)?;
            app.store.search(filter, &query).await
        }
        None => app.store.get_filtered_notes(filter).await,
    };

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes in {filter}");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
