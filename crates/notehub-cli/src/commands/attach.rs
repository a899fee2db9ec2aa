use std::path::PathBuf;

use notehub_core::UploadFile;

use crate::commands::common::{AppContext, GlobalArgs};
use crate::error::CliError;

pub async fn run_attach(id: &str, paths: &[PathBuf], args: &GlobalArgs) -> Result<(), CliError> {
    let files = paths
        .iter()
        .map(|path| UploadFile::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;
    let total = files.len();

    let app = AppContext::connect(args).await?;
    let id = app.open(id).await?;
    let report = app.store.add_attachments(&app.session, &id, files).await?;

    for attachment in &report.uploaded {
        println!("{}", attachment.id);
    }
    for failure in &report.failed {
        eprintln!("Failed to upload {}: {}", failure.file_name, failure.error);
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(CliError::PartialUpload {
            failed: report.failed.len(),
            total,
        })
    }
}

pub async fn run_detach(id: &str, attachment_id: &str, args: &GlobalArgs) -> Result<(), CliError> {
    let app = AppContext::connect(args).await?;
    let id = app.open(id).await?;
    app.store
        .remove_attachment(&app.session, &id, attachment_id.trim())
        .await?;
    println!("{id}");
    Ok(())
}
