//! Artifact discovery in a job's output directory.

use std::path::Path;

use crate::error::JobError;

/// File extension the generator's artifact is expected to carry.
pub const ARTIFACT_EXT: &str = "ply";

/// Media type served for artifacts.
pub const ARTIFACT_CONTENT_TYPE: &str = "application/x-ply";

/// Find the artifact in `output_dir`, if one exists.
///
/// Lists the directory's immediate entries and returns the
/// lexicographically first regular file whose name ends in `.ply`.
/// The generator is expected to write exactly one, but its output
/// naming is not contractually unique, so the tie-break keeps the
/// result deterministic.
///
/// Returns `Ok(None)` when no artifact is present; I/O failures (other
/// than the directory itself missing) surface as errors.
pub async fn resolve(output_dir: &Path) -> Result<Option<String>, JobError> {
    let mut entries = tokio::fs::read_dir(output_dir).await?;

    let mut candidates: Vec<String> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ARTIFACT_EXT))
        {
            candidates.push(name.to_string());
        }
    }

    candidates.sort();
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_a_single_ply_file() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("model.ply"), b"ply")
            .await
            .unwrap();

        let found = resolve(tmp.path()).await.unwrap();
        assert_eq!(found.as_deref(), Some("model.ply"));
    }

    #[tokio::test]
    async fn empty_directory_has_no_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(resolve(tmp.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn ignores_other_extensions_and_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("log.txt"), b"x").await.unwrap();
        tokio::fs::create_dir(tmp.path().join("nested.ply"))
            .await
            .unwrap();

        assert_eq!(resolve(tmp.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn multiple_artifacts_tie_break_lexicographically() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("b.ply"), b"x").await.unwrap();
        tokio::fs::write(tmp.path().join("a.ply"), b"x").await.unwrap();
        tokio::fs::write(tmp.path().join("c.ply"), b"x").await.unwrap();

        let found = resolve(tmp.path()).await.unwrap();
        assert_eq!(found.as_deref(), Some("a.ply"));
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        assert!(resolve(&missing).await.is_err());
    }

    #[tokio::test]
    async fn extension_match_is_case_insensitive() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("MODEL.PLY"), b"x")
            .await
            .unwrap();

        let found = resolve(tmp.path()).await.unwrap();
        assert_eq!(found.as_deref(), Some("MODEL.PLY"));
    }
}
