use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};
use tracing::warn;

/// Returns a path next to `path` with `suffix` appended to the file name. For example
/// `streak.json` + `.lock` gives `streak.json.lock`.
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(suffix);
    path.with_file_name(name)
}

/// Replaces the contents of `path` in one step. Data is written into a temporary sibling file
/// first and then renamed over the target, so readers either see the old or the new contents.
pub async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temp = sibling_with_suffix(path, ".tmp");

    let result: Result<(), io::Error> = async {
        let mut file = File::create(&temp).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&temp).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to clean up {temp:?}: {e}");
            }
        }
    }
    result
}
