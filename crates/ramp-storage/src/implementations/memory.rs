//! In-memory storage backend.
//!
//! Keeps everything in a map behind an async read-write lock. Expiry is
//! honored on read, so tests exercise the same TTL semantics as the file
//! backend.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry {
	value: Vec<u8>,
	expires_at: Option<Instant>,
}

impl Entry {
	fn is_expired(&self) -> bool {
		self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
	}
}

/// Memory-backed storage for tests and short-lived embeddings.
#[derive(Default)]
pub struct MemoryStorage {
	store: RwLock<HashMap<String, Entry>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		match store.get(key) {
			Some(entry) if !entry.is_expired() => Ok(entry.value.clone()),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(
			key.to_string(),
			Entry {
				value,
				expires_at: ttl.map(|ttl| Instant::now() + ttl),
			},
		);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.get(key).is_some_and(|entry| !entry.is_expired()))
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut store = self.store.write().await;
		let before = store.len();
		store.retain(|_, entry| !entry.is_expired());
		Ok(before - store.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		storage
			.set_bytes("key", b"value".to_vec(), None)
			.await
			.unwrap();
		assert_eq!(storage.get_bytes("key").await.unwrap(), b"value");
		assert!(storage.exists("key").await.unwrap());

		storage.delete("key").await.unwrap();
		assert!(!storage.exists("key").await.unwrap());
		assert!(matches!(
			storage.get_bytes("key").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_expired_entries_are_invisible_and_swept() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("gone", b"x".to_vec(), Some(Duration::ZERO))
			.await
			.unwrap();
		storage
			.set_bytes("kept", b"y".to_vec(), Some(Duration::from_secs(3600)))
			.await
			.unwrap();

		assert!(matches!(
			storage.get_bytes("gone").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("gone").await.unwrap());
		assert!(storage.exists("kept").await.unwrap());

		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_overwrite_replaces_value_and_ttl() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("key", b"old".to_vec(), Some(Duration::ZERO))
			.await
			.unwrap();
		storage.set_bytes("key", b"new".to_vec(), None).await.unwrap();
		assert_eq!(storage.get_bytes("key").await.unwrap(), b"new");
	}
}
