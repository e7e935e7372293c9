// src/crawl/checkpoint.rs
// =============================================================================
// This module persists crawl progress to the sitemap file.
//
// Every checkpoint rewrites the WHOLE file from the visited set, sorted:
//   https://example.com/
//   https://example.com/a.html
//   https://example.com/about
//
// The new contents go to a temporary sibling file first and are then renamed
// over the sitemap, so a reader never sees a half-written snapshot.
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
#[error("failed to write checkpoint {}: {}", .path.display(), .source)]
pub struct CheckpointError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

// Writes full snapshots of the visited set
#[derive(Debug, Clone)]
pub struct ProgressWriter {
    path: PathBuf,
}

impl ProgressWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Rewrites the sitemap with the sorted contents of `visited`
    //
    // Creates the parent directory if needed. The caller decides what to do
    // with an error; the crawler logs it and keeps going.
    pub async fn checkpoint(&self, visited: &HashSet<String>) -> Result<(), CheckpointError> {
        self.write_snapshot(&render(visited))
            .await
            .map_err(|source| CheckpointError {
                path: self.path.clone(),
                source,
            })
    }

    async fn write_snapshot(&self, contents: &str) -> std::io::Result<()> {
        // Make sure the output directory exists (e.g. "data/")
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write the full snapshot next to the real file
        let temp_path = temp_path_for(&self.path);
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        // Flush to disk before the rename makes it visible
        file.sync_all().await?;
        drop(file);

        // Swap it in; readers see either the old or the new snapshot
        fs::rename(&temp_path, &self.path).await
    }
}

// One URL per line, lexicographic order, trailing newline after each
fn render(visited: &HashSet<String>) -> String {
    let mut urls: Vec<&str> = visited.iter().map(String::as_str).collect();
    urls.sort_unstable();

    let mut contents = String::with_capacity(urls.iter().map(|u| u.len() + 1).sum());
    for url in urls {
        contents.push_str(url);
        contents.push('\n');
    }
    contents
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "sitemap".into());
    name.push(".tmp");
    path.with_file_name(name)
}
