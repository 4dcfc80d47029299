//! KYC status and limits service client.
//!
//! The identity provider is polled by tax identifier. Besides the
//! approval status it reports the per-direction fiat amounts the user may
//! still move at their current verification tier.

use async_trait::async_trait;
use ramp_types::{KycReport, RampDirection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the KYC service.
#[derive(Debug, Error)]
pub enum KycError {
	#[error("network error: {0}")]
	Network(String),
	#[error("service rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
	#[error("invalid response: {0}")]
	Decode(String),
}

/// Remaining fiat-rail limits per direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingLimits {
	pub remaining_limit_onramp: Decimal,
	pub remaining_limit_offramp: Decimal,
}

impl RemainingLimits {
	/// The limit applying to the given ramp direction.
	pub fn for_direction(&self, direction: RampDirection) -> Decimal {
		match direction {
			RampDirection::Onramp => self.remaining_limit_onramp,
			RampDirection::Offramp => self.remaining_limit_offramp,
		}
	}
}

/// Contract of the KYC status service.
#[async_trait]
pub trait KycApi: Send + Sync {
	/// Fetches the current KYC snapshot for a tax identifier.
	async fn fetch_status(&self, tax_id: &str) -> Result<KycReport, KycError>;

	/// Fetches the remaining per-direction limits for a tax identifier.
	async fn fetch_remaining_limits(&self, tax_id: &str) -> Result<RemainingLimits, KycError>;
}

/// HTTP client for the KYC service.
pub struct HttpKycService {
	client: reqwest::Client,
	base_url: String,
}

impl HttpKycService {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.into(),
		}
	}

	async fn decode<T: serde::de::DeserializeOwned>(
		response: reqwest::Response,
	) -> Result<T, KycError> {
		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(KycError::Rejected {
				status: status.as_u16(),
				message,
			});
		}
		response.json().await.map_err(|e| KycError::Decode(e.to_string()))
	}
}

#[async_trait]
impl KycApi for HttpKycService {
	async fn fetch_status(&self, tax_id: &str) -> Result<KycReport, KycError> {
		let response = self
			.client
			.get(format!("{}/kyc/status", self.base_url))
			.query(&[("taxId", tax_id)])
			.send()
			.await
			.map_err(|e| KycError::Network(e.to_string()))?;

		Self::decode(response).await
	}

	async fn fetch_remaining_limits(&self, tax_id: &str) -> Result<RemainingLimits, KycError> {
		let response = self
			.client
			.get(format!("{}/kyc/limits/{}", self.base_url, tax_id))
			.send()
			.await
			.map_err(|e| KycError::Network(e.to_string()))?;

		Self::decode(response).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[test]
	fn test_limits_select_by_direction() {
		let limits: RemainingLimits = serde_json::from_str(
			r#"{"remainingLimitOnramp":"2500","remainingLimitOfframp":"100"}"#,
		)
		.unwrap();
		assert_eq!(limits.for_direction(RampDirection::Onramp), dec!(2500));
		assert_eq!(limits.for_direction(RampDirection::Offramp), dec!(100));
	}
}
