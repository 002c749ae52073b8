use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::StepError;
use crate::git::{LocalRepo, VersionControl};

pub const README_FILE: &str = "README.md";
pub const IGNORE_FILE: &str = ".gitignore";

/// A freshly created project directory and its store
#[derive(Debug)]
pub struct LocalWorkspace {
    path: PathBuf,
    repo: LocalRepo,
    written_files: Vec<PathBuf>,
}

impl LocalWorkspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repo(&self) -> &LocalRepo {
        &self.repo
    }

    /// Seed files that made it to disk, relative to the workspace root
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written_files
    }
}

/// Template catalogs sometimes carry literal `\n` escapes; turn them into newlines
pub fn normalize_ignore_content(content: &str) -> String {
    content.replace("\\n", "\n")
}

pub fn readme_content(name: &str) -> String {
    format!("# {name}")
}

/// Create `<parent>/<name>`, write the seed files and initialize a store there.
///
/// The directory must not already exist. Seed file writes are best effort; a file that
/// cannot be written is left out of the commit. Store initialization is not.
pub fn initialize<V: VersionControl>(
    vcs: &V,
    parent: &Path,
    name: &str,
    ignore_content: &str,
) -> Result<LocalWorkspace, StepError> {
    let path = parent.join(name);
    fs::create_dir(&path).map_err(|e| StepError::from_io(&e, &path))?;
    info!("Created directory: {}", path.display());

    let mut written_files = Vec::new();

    if !ignore_content.is_empty() {
        let content = normalize_ignore_content(ignore_content);
        match fs::write(path.join(IGNORE_FILE), content) {
            Ok(()) => written_files.push(PathBuf::from(IGNORE_FILE)),
            Err(e) => warn!("Failed to write {IGNORE_FILE}: {e}"),
        }
    }

    match fs::write(path.join(README_FILE), readme_content(name)) {
        Ok(()) => written_files.push(PathBuf::from(README_FILE)),
        Err(e) => warn!("Failed to write {README_FILE}: {e}"),
    }

    let repo = vcs.init_repository(&path)?;

    Ok(LocalWorkspace {
        path,
        repo,
        written_files,
    })
}
