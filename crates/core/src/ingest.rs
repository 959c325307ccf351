//! Upload ingestion: validating and persisting image payloads into a
//! job's input directory.

use std::path::Path;

use crate::error::JobError;

/// One uploaded image: the client-supplied filename and its bytes.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Strips any directory components (both `/` and `\` separators) and
/// rejects names that are empty or a dot-directory after reduction.
/// This confines every stored file to the job's own input directory.
pub fn sanitize_filename(raw: &str) -> Result<String, JobError> {
    let basename = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(raw)
        .trim();

    if basename.is_empty() || basename == "." || basename == ".." {
        return Err(JobError::InvalidRequest(format!(
            "Invalid upload filename: '{raw}'"
        )));
    }

    Ok(basename.to_string())
}

/// Write each uploaded payload as a file under `input_dir`.
///
/// The batch must be non-empty; duplicate basenames resolve by
/// last-write-wins.
pub async fn ingest(input_dir: &Path, items: &[UploadItem]) -> Result<(), JobError> {
    if items.is_empty() {
        return Err(JobError::InvalidRequest(
            "At least one image must be uploaded".to_string(),
        ));
    }

    for item in items {
        let name = sanitize_filename(&item.filename)?;
        let dest = input_dir.join(&name);
        tokio::fs::write(&dest, &item.bytes).await?;
        tracing::debug!(path = %dest.display(), bytes = item.bytes.len(), "Upload stored");
    }

    Ok(())
}
