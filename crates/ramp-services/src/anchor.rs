//! Anchor redemption protocol client.
//!
//! Two calls make up the interactive redemption flow: the first opens a
//! session and returns the URL the user completes in a browser, the
//! second reports what the anchor committed to once the user is done. The
//! confirmed amount is checked against the quote by the precondition gate
//! before anything is signed.

use async_trait::async_trait;
use ramp_types::{AnchorConfirmation, AnchorSession};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Transaction status the anchor reports once the user completed the
/// interactive flow and the settlement is waiting on the transfer.
const STATUS_PENDING_TRANSFER_START: &str = "pending_user_transfer_start";

/// Errors from the anchor protocol.
#[derive(Debug, Error)]
pub enum AnchorError {
	#[error("network error: {0}")]
	Network(String),
	#[error("anchor rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
	#[error("invalid response: {0}")]
	Decode(String),
	/// The anchor answered with a session type this pipeline cannot
	/// drive.
	#[error("unsupported session type: {0}")]
	UnsupportedSessionType(String),
}

/// Contract of the anchor redemption protocol.
#[async_trait]
pub trait AnchorApi: Send + Sync {
	/// Opens an interactive redemption session for the given asset and
	/// amount. Called again to refresh the interactive URL; every call
	/// yields a fresh session.
	async fn create_session(
		&self,
		asset_code: &str,
		amount: Decimal,
	) -> Result<AnchorSession, AnchorError>;

	/// Fetches the confirmed settlement for a session. Returns `None`
	/// while the user has not completed the interactive flow yet.
	async fn fetch_confirmation(
		&self,
		session: &AnchorSession,
	) -> Result<Option<AnchorConfirmation>, AnchorError>;
}

/// HTTP client for a SEP-24 style anchor.
pub struct HttpAnchor {
	client: reqwest::Client,
	base_url: String,
	auth_token: Option<String>,
}

impl HttpAnchor {
	pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.into(),
			auth_token,
		}
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match &self.auth_token {
			Some(token) => request.bearer_auth(token),
			None => request,
		}
	}
}

#[async_trait]
impl AnchorApi for HttpAnchor {
	async fn create_session(
		&self,
		asset_code: &str,
		amount: Decimal,
	) -> Result<AnchorSession, AnchorError> {
		#[derive(Deserialize)]
		struct Response {
			#[serde(rename = "type")]
			session_type: String,
			url: String,
			id: String,
		}

		let request = self
			.client
			.post(format!(
				"{}/transactions/withdraw/interactive",
				self.base_url
			))
			.form(&[
				("asset_code", asset_code.to_string()),
				("amount", amount.to_string()),
			]);
		let response = self
			.authorize(request)
			.send()
			.await
			.map_err(|e| AnchorError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(AnchorError::Rejected {
				status: status.as_u16(),
				message,
			});
		}

		let body: Response = response
			.json()
			.await
			.map_err(|e| AnchorError::Decode(e.to_string()))?;
		if body.session_type != "interactive_customer_info_needed" {
			return Err(AnchorError::UnsupportedSessionType(body.session_type));
		}

		Ok(AnchorSession {
			id: body.id,
			interactive_url: body.url,
			auth_token: self.auth_token.clone(),
		})
	}

	async fn fetch_confirmation(
		&self,
		session: &AnchorSession,
	) -> Result<Option<AnchorConfirmation>, AnchorError> {
		#[derive(Deserialize)]
		struct TransactionBody {
			status: String,
			amount_in: Option<Decimal>,
			withdraw_memo: Option<String>,
			withdraw_memo_type: Option<String>,
			withdraw_anchor_account: Option<String>,
		}
		#[derive(Deserialize)]
		struct Response {
			transaction: TransactionBody,
		}

		let request = self
			.client
			.get(format!("{}/transaction", self.base_url))
			.query(&[("id", session.id.as_str())]);
		let response = self
			.authorize(request)
			.send()
			.await
			.map_err(|e| AnchorError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(AnchorError::Rejected {
				status: status.as_u16(),
				message,
			});
		}

		let body: Response = response
			.json()
			.await
			.map_err(|e| AnchorError::Decode(e.to_string()))?;
		if body.transaction.status != STATUS_PENDING_TRANSFER_START {
			return Ok(None);
		}

		let missing = || AnchorError::Decode("confirmed transaction missing fields".into());
		Ok(Some(AnchorConfirmation {
			amount: body.transaction.amount_in.ok_or_else(missing)?,
			memo: body.transaction.withdraw_memo.ok_or_else(missing)?,
			memo_type: body.transaction.withdraw_memo_type.ok_or_else(missing)?,
			destination_account: body
				.transaction
				.withdraw_anchor_account
				.ok_or_else(missing)?,
		}))
	}
}
