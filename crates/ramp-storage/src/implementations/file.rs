//! File-based storage backend.
//!
//! One file per key under a base directory. Each file starts with a small
//! fixed header carrying the expiry timestamp so reads can reject stale
//! sessions without a separate index. Writes go through a temp file and a
//! rename.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

/// File header: magic, then the expiry as Unix seconds (0 = never).
///
/// Layout: `RMPS` (4 bytes) followed by a little-endian u64.
const MAGIC: &[u8; 4] = b"RMPS";
const HEADER_SIZE: usize = 12;

fn encode_header(ttl: Option<Duration>) -> Result<[u8; HEADER_SIZE], StorageError> {
	let expires_at = match ttl {
		None => 0,
		Some(ttl) => SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|e| StorageError::Backend(e.to_string()))?
			.as_secs()
			.saturating_add(ttl.as_secs()),
	};
	let mut header = [0u8; HEADER_SIZE];
	header[..4].copy_from_slice(MAGIC);
	header[4..].copy_from_slice(&expires_at.to_le_bytes());
	Ok(header)
}

fn decode_expiry(data: &[u8]) -> Result<u64, StorageError> {
	if data.len() < HEADER_SIZE || &data[..4] != MAGIC {
		return Err(StorageError::Backend("malformed storage file".into()));
	}
	let mut expiry = [0u8; 8];
	expiry.copy_from_slice(&data[4..HEADER_SIZE]);
	Ok(u64::from_le_bytes(expiry))
}

fn is_expired(expires_at: u64) -> bool {
	if expires_at == 0 {
		return false;
	}
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|now| now.as_secs() >= expires_at)
		.unwrap_or(false)
}

/// Filesystem-backed storage.
pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: impl Into<PathBuf>) -> Self {
		Self {
			base_path: base_path.into(),
		}
	}

	fn file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.file_path(key);
		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			}
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		if is_expired(decode_expiry(&data)?) {
			return Err(StorageError::NotFound);
		}
		Ok(data[HEADER_SIZE..].to_vec())
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let path = self.file_path(key);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let mut file_data = Vec::with_capacity(HEADER_SIZE + value.len());
		file_data.extend_from_slice(&encode_header(ttl)?);
		file_data.extend_from_slice(&value);

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.file_path(key)).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		match self.get_bytes(key).await {
			Ok(_) => Ok(true),
			Err(StorageError::NotFound) => Ok(false),
			Err(e) => Err(e),
		}
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut removed = 0;
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}
			let Ok(data) = fs::read(&path).await else {
				continue;
			};
			let expired = decode_expiry(&data).map(is_expired).unwrap_or(false);
			if expired {
				if let Err(e) = fs::remove_file(&path).await {
					tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired file");
				} else {
					removed += 1;
				}
			}
		}
		Ok(removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_roundtrip_and_delete() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path());

		storage
			.set_bytes("sessions:s-1", b"payload".to_vec(), None)
			.await
			.unwrap();
		assert_eq!(
			storage.get_bytes("sessions:s-1").await.unwrap(),
			b"payload"
		);
		assert!(storage.exists("sessions:s-1").await.unwrap());

		storage.delete("sessions:s-1").await.unwrap();
		assert!(matches!(
			storage.get_bytes("sessions:s-1").await,
			Err(StorageError::NotFound)
		));
		// Deleting again is not an error.
		storage.delete("sessions:s-1").await.unwrap();
	}

	#[tokio::test]
	async fn test_expired_file_reads_as_missing_and_is_swept() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path());

		storage
			.set_bytes("old", b"x".to_vec(), Some(Duration::ZERO))
			.await
			.unwrap();
		storage.set_bytes("new", b"y".to_vec(), None).await.unwrap();

		assert!(matches!(
			storage.get_bytes("old").await,
			Err(StorageError::NotFound)
		));
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert_eq!(storage.get_bytes("new").await.unwrap(), b"y");
	}

	#[tokio::test]
	async fn test_cleanup_of_missing_directory_is_empty() {
		let storage = FileStorage::new("/nonexistent/ramp-storage-test");
		assert_eq!(storage.cleanup_expired().await.unwrap(), 0);
	}
}
