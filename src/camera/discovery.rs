use anyhow::{Context, Result};
use globset::Glob;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Default file name filter: text files with `cam` in their name.
pub const DEFAULT_CAMERA_PATTERN: &str = "*cam*.txt";

/// List the camera files directly inside `dir` whose file name matches `pattern`.
///
/// Subdirectories are not descended into and nothing is skipped because of
/// ignore files or hidden names. The result is sorted by path.
pub fn discover_camera_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Requested folder does not exist: {}", dir.display());
    }

    let matcher = Glob::new(pattern)
        .with_context(|| format!("Invalid camera file pattern: {pattern}"))?
        .compile_matcher();

    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .max_depth(Some(1))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        } else {
            tracing::trace!("Skipping non-camera file {}", entry.path().display());
        }
    }

    files.sort();
    tracing::info!("Discovered {} camera files in {}", files.len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discovers_matching_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["cam_b.txt", "cam_a.txt", "front-cam.txt", "notes.txt", "cam.csv"] {
            fs::write(root.join(name), "").unwrap();
        }
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested").join("cam_c.txt"), "").unwrap();
        fs::create_dir(root.join("cam_dir.txt")).unwrap();

        let files = discover_camera_files(root, DEFAULT_CAMERA_PATTERN).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cam_a.txt", "cam_b.txt", "front-cam.txt"]);
    }

    #[test]
    fn test_hidden_files_are_included() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".cam_hidden.txt"), "").unwrap();

        let files = discover_camera_files(temp_dir.path(), DEFAULT_CAMERA_PATTERN).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_custom_pattern() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("cam1.txt"), "").unwrap();
        fs::write(temp_dir.path().join("votes.log"), "").unwrap();

        let files = discover_camera_files(temp_dir.path(), "*.log").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("votes.log"));
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = discover_camera_files(&temp_dir.path().join("nope"), DEFAULT_CAMERA_PATTERN)
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_invalid_pattern() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_camera_files(temp_dir.path(), "[unclosed").is_err());
    }
}
