//! Anchor protocol session and confirmation types.
//!
//! Anchor-mediated rails run an interactive redemption session: a first
//! call opens the session and yields a URL the user completes in a
//! browser, a second call reports the settlement amount and destination
//! the anchor committed to. The confirmed amount is compared against the
//! quote before execution may proceed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open interactive redemption session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSession {
	/// Session identifier assigned by the anchor.
	pub id: String,
	/// URL the user completes interactively. Refreshed periodically so a
	/// stale link is never presented.
	pub interactive_url: String,
	/// Bearer token authenticating follow-up calls for this session.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auth_token: Option<String>,
}

/// The settlement the anchor confirmed after user interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorConfirmation {
	/// Amount the anchor expects to receive, before its fee.
	pub amount: Decimal,
	/// Payment memo to attach to the settlement transaction.
	pub memo: String,
	/// Memo encoding (`text`, `hash`, `id`).
	pub memo_type: String,
	/// Ledger account the settlement must be paid to.
	pub destination_account: String,
}
