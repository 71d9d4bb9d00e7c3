use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::BuildError;

/// A file-like record produced by a transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Archive-relative path with `/` separators.
    pub path: String,
    pub content: Vec<u8>,
}

impl Artifact {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Artifact {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Archive-relative path of `file` under `base`, always using `/`.
pub fn relative_entry_name(base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_entries<W: Write + Seek>(writer: W, artifacts: &[Artifact]) -> Result<W, BuildError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut sorted: Vec<&Artifact> = artifacts.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    for artifact in sorted {
        zip.start_file(artifact.path.as_str(), options)?;
        zip.write_all(&artifact.content)
            .map_err(|e| BuildError::io(&artifact.path, e))?;
        debug!(entry = %artifact.path, bytes = artifact.content.len(), "Added archive entry");
    }
    Ok(zip.finish()?)
}

/// Writes `artifacts` to `dest` as a zip.
///
/// The archive is assembled in a temporary file next to `dest` and only persisted once
/// complete, so a failure never leaves a partial archive behind.
pub fn write_archive(dest: &Path, artifacts: &[Artifact]) -> Result<PathBuf, BuildError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| BuildError::io(dir, e))?;
    write_entries(tmp.as_file_mut(), artifacts)?;
    tmp.persist(dest).map_err(|e| {
        error!(error = ?e.error, path = %dest.display(), "Failed to persist archive");
        BuildError::io(dest, e.error)
    })?;
    info!(path = %dest.display(), entries = artifacts.len(), "Wrote archive");
    Ok(dest.to_path_buf())
}

/// Zips every file below `root/dir` in memory. Entry names keep the `dir/` prefix.
pub fn archive_directory(root: &Path, dir: &Path) -> Result<Vec<u8>, BuildError> {
    let start = root.join(dir);
    if !start.is_dir() {
        return Err(BuildError::io(
            &start,
            std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
        ));
    }

    let mut artifacts = Vec::new();
    for entry in WalkDir::new(&start) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| start.clone());
            BuildError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let content = std::fs::read(entry.path()).map_err(|e| BuildError::io(entry.path(), e))?;
        artifacts.push(Artifact::new(relative_entry_name(root, entry.path()), content));
    }

    let cursor = write_entries(Cursor::new(Vec::new()), &artifacts)?;
    let bytes = cursor.into_inner();
    info!(
        dir = %start.display(),
        files = artifacts.len(),
        bytes = bytes.len(),
        "Archived directory"
    );
    Ok(bytes)
}

/// Writes artifacts as plain files below `dest_dir`.
pub async fn write_tree(dest_dir: &Path, artifacts: &[Artifact]) -> Result<(), BuildError> {
    for artifact in artifacts {
        let target = artifact
            .path
            .split('/')
            .fold(dest_dir.to_path_buf(), |acc, part| acc.join(part));
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::io(parent, e))?;
        }
        tokio::fs::write(&target, &artifact.content)
            .await
            .map_err(|e| BuildError::io(&target, e))?;
    }
    debug!(dir = %dest_dir.display(), files = artifacts.len(), "Wrote unpacked bundle");
    Ok(())
}
