//! Persistence for the ramp pipeline.
//!
//! Ramp sessions survive a page reload: after registration, after signing
//! and after start the orchestrator writes the session here so a restart
//! resumes at the submission step instead of re-requesting wallet
//! signatures. The interface is a small async key-value store with
//! optional expiry; the memory backend serves tests and short-lived
//! embeddings, the file backend real persistence.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::file::FileStorage;
pub use implementations::memory::MemoryStorage;

/// Namespaces for persisted ramp data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Ramp sessions, keyed by session id.
	Sessions,
	/// Open anchor redemption sessions, keyed by ramp session id.
	AnchorSessions,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Sessions => "sessions",
			StorageKey::AnchorSessions => "anchor_sessions",
		}
	}
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// The requested item does not exist or has expired.
	#[error("not found")]
	NotFound,
	/// Serialization or deserialization failed.
	#[error("serialization error: {0}")]
	Serialization(String),
	/// The backend failed.
	#[error("backend error: {0}")]
	Backend(String),
}

/// Low-level interface a storage backend implements.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, optionally expiring after the given duration.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks whether a live (non-expired) value exists for the key.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Removes expired entries, returning how many were dropped.
	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		Ok(0)
	}
}

/// Typed storage facade used by the rest of the pipeline.
///
/// Values are serialized as JSON under `namespace:id` keys.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: StorageKey, id: &str) -> String {
		format!("{}:{}", namespace.as_str(), id)
	}

	/// Stores a value, optionally with an expiry.
	pub async fn store_with_ttl<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes, ttl)
			.await
	}

	/// Stores a value without expiry.
	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store_with_ttl(namespace, id, data, None).await
	}

	/// Retrieves and deserializes a value.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Removes a value.
	pub async fn remove(&self, namespace: StorageKey, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	/// Checks whether a value exists.
	pub async fn exists(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	/// Sweeps expired entries from the backend.
	pub async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.backend.cleanup_expired().await
	}
}
