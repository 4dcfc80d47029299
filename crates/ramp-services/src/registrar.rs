//! Registration and execution-start service client.
//!
//! The registration call announces the ephemeral signing accounts and the
//! rail-specific user data, and returns the ramp process handle with the
//! full unsigned transaction list. The start call hands over the signed
//! collection exactly once; the service executes from there.

use async_trait::async_trait;
use ramp_types::{SignedTx, SigningAccount, UnsignedTx, UserSigningMeta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the registration/execution service.
#[derive(Debug, Error)]
pub enum RegistrarError {
	/// Transport-level failure.
	#[error("network error: {0}")]
	Network(String),
	/// The service rejected the request.
	#[error("service rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
	/// The response body could not be decoded. Also raised when the
	/// service reports a transaction phase outside the known set.
	#[error("invalid response: {0}")]
	Decode(String),
}

/// Rail-specific data attached to a registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalData {
	/// Connected wallet address funding or receiving the on-chain side.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub wallet_address: Option<String>,
	/// Destination for bought tokens on buy ramps.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub destination_address: Option<String>,
	/// Tax identifier of the user.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tax_id: Option<String>,
	/// Tax identifier of the payout receiver.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub receiver_tax_id: Option<String>,
	/// Payout destination key on instant-payment rails.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pix_destination: Option<String>,
	/// Anchor payment details on redemption rails.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub payment_data: Option<ramp_types::AnchorConfirmation>,
}

/// A registered ramp process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RampProcess {
	/// Process id assigned by the service.
	pub id: String,
	/// The unsigned transactions covering the whole route.
	pub unsigned_txs: Vec<UnsignedTx>,
}

/// Status of a ramp process as reported by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RampStatus {
	pub id: String,
	pub status: String,
}

/// Contract of the registration/execution service.
#[async_trait]
pub trait RegistrarApi: Send + Sync {
	/// Registers a ramp for the given quote and signing accounts.
	async fn register_ramp(
		&self,
		quote_id: &str,
		signing_accounts: &[SigningAccount],
		additional_data: &AdditionalData,
	) -> Result<RampProcess, RegistrarError>;

	/// Starts execution of a registered ramp with the signed transaction
	/// collection and the per-phase hashes recorded during user signing.
	async fn start_ramp(
		&self,
		ramp_id: &str,
		signed_txs: &[SignedTx],
		meta: &UserSigningMeta,
	) -> Result<RampStatus, RegistrarError>;

	/// Fetches the current status of a ramp process.
	async fn get_status(&self, ramp_id: &str) -> Result<RampStatus, RegistrarError>;
}

/// HTTP client for the registration/execution service.
pub struct HttpRegistrar {
	client: reqwest::Client,
	base_url: String,
}

impl HttpRegistrar {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.into(),
		}
	}

	async fn decode<T: serde::de::DeserializeOwned>(
		response: reqwest::Response,
	) -> Result<T, RegistrarError> {
		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(RegistrarError::Rejected {
				status: status.as_u16(),
				message,
			});
		}
		response
			.json()
			.await
			.map_err(|e| RegistrarError::Decode(e.to_string()))
	}
}

#[async_trait]
impl RegistrarApi for HttpRegistrar {
	async fn register_ramp(
		&self,
		quote_id: &str,
		signing_accounts: &[SigningAccount],
		additional_data: &AdditionalData,
	) -> Result<RampProcess, RegistrarError> {
		#[derive(Serialize)]
		#[serde(rename_all = "camelCase")]
		struct Body<'a> {
			quote_id: &'a str,
			signing_accounts: &'a [SigningAccount],
			additional_data: &'a AdditionalData,
		}

		tracing::debug!(quote_id, accounts = signing_accounts.len(), "Registering ramp");
		let response = self
			.client
			.post(format!("{}/ramp/register", self.base_url))
			.json(&Body {
				quote_id,
				signing_accounts,
				additional_data,
			})
			.send()
			.await
			.map_err(|e| RegistrarError::Network(e.to_string()))?;

		Self::decode(response).await
	}

	async fn start_ramp(
		&self,
		ramp_id: &str,
		signed_txs: &[SignedTx],
		meta: &UserSigningMeta,
	) -> Result<RampStatus, RegistrarError> {
		#[derive(Serialize)]
		#[serde(rename_all = "camelCase")]
		struct Body<'a> {
			ramp_id: &'a str,
			presigned_txs: &'a [SignedTx],
			additional_data: &'a UserSigningMeta,
		}

		tracing::debug!(ramp_id, txs = signed_txs.len(), "Starting ramp");
		let response = self
			.client
			.post(format!("{}/ramp/start", self.base_url))
			.json(&Body {
				ramp_id,
				presigned_txs: signed_txs,
				additional_data: meta,
			})
			.send()
			.await
			.map_err(|e| RegistrarError::Network(e.to_string()))?;

		Self::decode(response).await
	}

	async fn get_status(&self, ramp_id: &str) -> Result<RampStatus, RegistrarError> {
		let response = self
			.client
			.get(format!("{}/ramp/{}", self.base_url, ramp_id))
			.send()
			.await
			.map_err(|e| RegistrarError::Network(e.to_string()))?;

		Self::decode(response).await
	}
}
