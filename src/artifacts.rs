use crate::{Result, ScanError};
use chrono::{DateTime, Local, Utc};
use log::debug;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extensions this system ever writes. Collision checks cover all of them so
/// a fresh base name never partially overwrites an earlier artifact set.
pub const ARTIFACT_EXTENSIONS: [&str; 3] = ["xml", "txt", "html"];

/// Allocates collision-free artifact base names inside the scan directory.
///
/// Names follow `{YYYYMMDD}-{label}-{n}`. Allocation must happen immediately
/// before the task writes anything; the orchestrator never pre-allocates
/// names in bulk.
pub struct ArtifactNamer {
    dir: PathBuf,
}

impl ArtifactNamer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Next free base name for a task label. The counter starts at 0 and
    /// increments until no file with any artifact extension exists.
    pub fn next_name(&self, label: &str) -> String {
        let stamp = Local::now().format("%Y%m%d");
        let mut counter = 0u32;

        loop {
            let base = format!("{}-{}-{}", stamp, label, counter);
            let taken = ARTIFACT_EXTENSIONS
                .iter()
                .any(|ext| self.dir.join(format!("{}.{}", base, ext)).exists());

            if !taken {
                debug!("Allocated artifact base name: {}", base);
                return base;
            }
            counter += 1;
        }
    }

    /// Absolute path for a base name plus extension.
    pub fn path_for(&self, base: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", base, ext))
    }
}

/// One entry in the scan results listing, as consumed by the web front-end.
#[derive(Debug, Clone, Serialize)]
pub struct ResultFile {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub extension: String,
}

/// List every artifact in the scan directory with name, size, modification
/// time and extension. A missing directory is an empty listing, not an error.
pub fn list_results(dir: &Path) -> Result<Vec<ResultFile>> {
    let mut results = Vec::new();

    if !dir.exists() {
        return Ok(results);
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let metadata = entry.metadata()?;
        let modified: DateTime<Utc> = metadata.modified()?.into();

        results.push(ResultFile {
            name: entry.file_name().to_string_lossy().to_string(),
            size: metadata.len(),
            modified,
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default(),
        });
    }

    results.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(results)
}

/// Resolve a result by exact filename. Names containing path separators are
/// rejected so a caller can never escape the scan directory.
pub fn result_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ScanError::InvalidTarget(format!(
            "Invalid result filename: {}",
            filename
        )));
    }

    let path = dir.join(filename);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ScanError::ResultNotFound(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn first_allocation_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let namer = ArtifactNamer::new(dir.path());

        let base = namer.next_name("nmap-web-server");
        assert!(base.ends_with("-nmap-web-server-0"));
    }

    #[test]
    fn any_existing_extension_advances_the_counter() {
        let dir = tempfile::tempdir().unwrap();
        let namer = ArtifactNamer::new(dir.path());

        let base = namer.next_name("sslscan");
        fs::write(namer.path_for(&base, "txt"), "data").unwrap();

        let next = namer.next_name("sslscan");
        assert_ne!(base, next);
        assert!(next.ends_with("-sslscan-1"));
    }

    #[test]
    fn repeated_allocations_are_distinct_once_written() {
        let dir = tempfile::tempdir().unwrap();
        let namer = ArtifactNamer::new(dir.path());

        let mut seen = Vec::new();
        for _ in 0..5 {
            let base = namer.next_name("nikto");
            // Writing one extension is enough to claim the base.
            fs::write(namer.path_for(&base, "html"), "<html></html>").unwrap();
            assert!(!seen.contains(&base));
            seen.push(base);
        }
    }

    #[test]
    fn listing_reports_file_metadata() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("20240101-sslscan-0.txt"), "abc").unwrap();

        let results = list_results(dir.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "20240101-sslscan-0.txt");
        assert_eq!(results[0].size, 3);
        assert_eq!(results[0].extension, "txt");
    }

    #[test]
    fn missing_directory_lists_empty() {
        let results = list_results(Path::new("/nonexistent-scan-dir-4242")).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn result_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            result_path(dir.path(), "../etc/passwd"),
            Err(ScanError::InvalidTarget(_))
        ));
        assert!(matches!(
            result_path(dir.path(), "missing.txt"),
            Err(ScanError::ResultNotFound(_))
        ));

        fs::write(dir.path().join("report.html"), "x").unwrap();
        assert!(result_path(dir.path(), "report.html").is_ok());
    }
}
