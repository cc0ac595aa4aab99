//! Photo store
//!
//! Copies picked images into app-private storage under one subfolder per
//! entity type and hands back the stored path. Failures never escape as
//! errors: saves yield `None`, deletes yield `false`, and the cause is logged.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, error, warn};

use crate::config::PhotoConfig;
use crate::utils::errors::{AuditError, Result};
use crate::utils::helpers::{bytes_to_megabytes, sanitize_filename};
use crate::utils::logging::log_photo_sweep;

/// Directory under the app-private root holding all photos
pub const PHOTO_ROOT_DIR: &str = "s5_photos";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Name clashes within one millisecond are retried with the next timestamp
const MAX_NAME_ATTEMPTS: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    Problem,
    Solution,
}

impl PhotoKind {
    pub const ALL: [PhotoKind; 2] = [PhotoKind::Problem, PhotoKind::Solution];

    pub fn subdirectory(self) -> &'static str {
        match self {
            PhotoKind::Problem => "problems",
            PhotoKind::Solution => "solutions",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    photos_dir: PathBuf,
    retention: Duration,
}

impl PhotoStore {
    pub fn new(config: &PhotoConfig) -> Self {
        Self::with_root(&config.root_dir, config.retention_days)
    }

    pub fn with_root(root_dir: impl AsRef<Path>, retention_days: u64) -> Self {
        Self {
            photos_dir: root_dir.as_ref().join(PHOTO_ROOT_DIR),
            retention: Duration::from_secs(retention_days * SECONDS_PER_DAY),
        }
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    pub fn directory_for(&self, kind: PhotoKind) -> PathBuf {
        self.photos_dir.join(kind.subdirectory())
    }

    pub async fn save_problem_photo(&self, source: &Path, owner_id: &str) -> Option<PathBuf> {
        self.save_from_path(PhotoKind::Problem, source, owner_id).await
    }

    pub async fn save_solution_photo(&self, source: &Path, owner_id: &str) -> Option<PathBuf> {
        self.save_from_path(PhotoKind::Solution, source, owner_id).await
    }

    async fn save_from_path(
        &self,
        kind: PhotoKind,
        source: &Path,
        owner_id: &str,
    ) -> Option<PathBuf> {
        match File::open(source).await {
            Ok(file) => self.save_from_reader(kind, file, owner_id).await,
            Err(e) => {
                error!(source = %source.display(), error = %e, "Failed to open photo source");
                None
            }
        }
    }

    /// Stream-copy `reader` into `{kind}/{ownerId}_{timestampMillis}.jpg`
    pub async fn save_from_reader<R>(
        &self,
        kind: PhotoKind,
        reader: R,
        owner_id: &str,
    ) -> Option<PathBuf>
    where
        R: AsyncRead + Unpin,
    {
        match self.try_save(kind, reader, owner_id).await {
            Ok(path) => {
                debug!(path = %path.display(), "Photo saved");
                Some(path)
            }
            Err(e) => {
                error!(kind = ?kind, owner_id = owner_id, error = %e, "Failed to save photo");
                None
            }
        }
    }

    async fn try_save<R>(&self, kind: PhotoKind, mut reader: R, owner_id: &str) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin,
    {
        let directory = self.directory_for(kind);
        fs::create_dir_all(&directory).await?;

        let (path, mut file) = create_unique(&directory, &sanitize_filename(owner_id)).await?;

        let copied = async {
            tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = copied {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Failed to remove partial photo");
            }
            return Err(e.into());
        }

        Ok(path)
    }

    /// Read a stored photo's bytes
    pub async fn load_photo(&self, path: &Path) -> Option<Vec<u8>> {
        match fs::read(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load photo");
                None
            }
        }
    }

    pub async fn delete_photo(&self, path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to delete photo");
                false
            }
        }
    }

    pub async fn photo_exists(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }

    pub async fn get_total_photo_count(&self) -> usize {
        self.collect_files().await.len()
    }

    /// Total size of stored photos in megabytes
    pub async fn get_total_photo_size(&self) -> f64 {
        let bytes: u64 = self
            .collect_files()
            .await
            .iter()
            .map(|(_, metadata)| metadata.len())
            .sum();
        bytes_to_megabytes(bytes)
    }

    /// Delete photos older than the retention window; returns how many went
    pub async fn clean_old_photos(&self) -> usize {
        let cutoff = SystemTime::now()
            .checked_sub(self.retention)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        self.clean_photos_modified_before(cutoff).await
    }

    pub async fn clean_photos_modified_before(&self, cutoff: SystemTime) -> usize {
        let mut deleted = 0;
        let mut failed = 0;

        for (path, metadata) in self.collect_files().await {
            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "No modification time, skipping");
                    continue;
                }
            };

            if modified < cutoff {
                if self.delete_photo(&path).await {
                    deleted += 1;
                } else {
                    failed += 1;
                }
            }
        }

        log_photo_sweep(deleted, failed, self.retention.as_secs() / SECONDS_PER_DAY);
        deleted
    }

    /// Regular files in both photo subfolders; missing folders count as empty
    async fn collect_files(&self) -> Vec<(PathBuf, std::fs::Metadata)> {
        let mut files = Vec::new();

        for kind in PhotoKind::ALL {
            let directory = self.directory_for(kind);
            let mut entries = match fs::read_dir(&directory).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(directory = %directory.display(), error = %e, "Failed to list photos");
                    continue;
                }
            };

            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => match entry.metadata().await {
                        Ok(metadata) if metadata.is_file() => files.push((entry.path(), metadata)),
                        Ok(_) => {}
                        Err(e) => {
                            let path = entry.path();
                            warn!(path = %path.display(), error = %e, "Failed to stat photo")
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(
                            directory = %directory.display(),
                            error = %e,
                            "Failed to read photo entry"
                        );
                        break;
                    }
                }
            }
        }

        files
    }
}

async fn create_unique(directory: &Path, owner: &str) -> Result<(PathBuf, File)> {
    let millis = Utc::now().timestamp_millis();

    for offset in 0..MAX_NAME_ATTEMPTS {
        let path = directory.join(format!("{}_{}.jpg", owner, millis + offset));
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(AuditError::Photo(format!(
        "no free file name for owner {} in {}",
        owner,
        directory.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let store = PhotoStore::with_root("/data/app", 30);
        assert_eq!(store.photos_dir(), Path::new("/data/app/s5_photos"));
        assert_eq!(
            store.directory_for(PhotoKind::Solution),
            PathBuf::from("/data/app/s5_photos/solutions")
        );
    }

    #[tokio::test]
    async fn test_save_from_reader_names_file_after_owner() {
        let temp = tempfile::tempdir().unwrap();
        let store = PhotoStore::with_root(temp.path(), 30);

        let path = store
            .save_from_reader(PhotoKind::Problem, &b"jpeg bytes"[..], "auditor-7")
            .await
            .expect("photo saved");

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("auditor-7_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(store.load_photo(&path).await.as_deref(), Some(&b"jpeg bytes"[..]));
    }

    #[tokio::test]
    async fn test_same_millisecond_saves_do_not_overwrite() {
        let temp = tempfile::tempdir().unwrap();
        let store = PhotoStore::with_root(temp.path(), 30);

        let first = store.save_from_reader(PhotoKind::Solution, &b"a"[..], "u").await.unwrap();
        let second = store.save_from_reader(PhotoKind::Solution, &b"b"[..], "u").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.get_total_photo_count().await, 2);
    }
}
