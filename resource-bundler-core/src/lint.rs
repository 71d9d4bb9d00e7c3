use tracing::{error, info};

use crate::archive::relative_entry_name;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::selector::expand;
use crate::transform::script_diagnostics;

/// Parses every `components/**/*.js` file and fails on the first file set with syntax errors.
///
/// Returns the number of files checked.
pub async fn lint(config: &BuildConfig) -> Result<usize, BuildError> {
    let root = &config.project_root;
    let dir = relative_entry_name(root, &config.components_root());
    let files = expand(root, &[format!("{dir}/**/*.js")])?;

    let mut problems = Vec::new();
    for file in &files {
        let source = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| BuildError::io(file, e))?;
        for diagnostic in script_diagnostics(&source) {
            let entry = relative_entry_name(root, file);
            error!(file = %entry, problem = %diagnostic, "[LINT] Problem found");
            problems.push(format!("{entry}: {diagnostic}"));
        }
    }

    if !problems.is_empty() {
        return Err(BuildError::LintFailure(problems));
    }
    info!(files = files.len(), "[LINT] All scripts passed");
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn lint_passes_clean_sources() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("components/c_timer");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("timer.js"), "var t = 1;\n").unwrap();

        let config = BuildConfig::new(tmp.path());
        assert_eq!(lint(&config).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lint_reports_each_broken_file() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("components/c_timer");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ok.js"), "var t = 1;\n").unwrap();
        std::fs::write(dir.join("broken.js"), "function (\n").unwrap();

        let config = BuildConfig::new(tmp.path());
        match lint(&config).await {
            Err(BuildError::LintFailure(problems)) => {
                assert!(!problems.is_empty());
                assert!(problems
                    .iter()
                    .all(|p| p.starts_with("components/c_timer/broken.js")));
            }
            other => panic!("expected lint failure, got {other:?}"),
        }
    }
}
