//! Fiat rails and their identifier requirements.
//!
//! A rail is the concrete fiat payment method a ramp settles over. Each
//! rail declares which user identifiers must be present before execution
//! and which user-signed transaction hashes must exist before the ramp may
//! be started.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fiat payment rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rail {
	/// Instant-payment rail addressed by a tax identifier and a payout
	/// key.
	Pix,
	/// Bank transfer settled through an anchor redemption session.
	Bank,
	/// Card rail bridged through an EVM approve/swap pair.
	Card,
}

/// Identifiers a rail requires on the execution input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredIdentifier {
	TaxId,
	PayoutKey,
}

impl RequiredIdentifier {
	pub fn as_str(&self) -> &'static str {
		match self {
			RequiredIdentifier::TaxId => "tax id",
			RequiredIdentifier::PayoutKey => "payout key",
		}
	}
}

impl Rail {
	/// The identifiers this rail requires before a ramp can be executed.
	pub fn required_identifiers(&self) -> &'static [RequiredIdentifier] {
		match self {
			Rail::Pix => &[RequiredIdentifier::TaxId, RequiredIdentifier::PayoutKey],
			Rail::Bank => &[],
			Rail::Card => &[],
		}
	}

	/// Whether this rail redeems through an interactive anchor session.
	pub fn uses_anchor(&self) -> bool {
		matches!(self, Rail::Bank)
	}

	/// Whether execution requires on-chain settlement transactions.
	///
	/// All current rails settle on-chain; the guard on the lifecycle
	/// machine keys off this rather than assuming it.
	pub fn settles_on_chain(&self) -> bool {
		true
	}
}

impl fmt::Display for Rail {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Rail::Pix => write!(f, "pix"),
			Rail::Bank => write!(f, "bank"),
			Rail::Card => write!(f, "card"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pix_requires_both_identifiers() {
		assert_eq!(
			Rail::Pix.required_identifiers(),
			&[RequiredIdentifier::TaxId, RequiredIdentifier::PayoutKey]
		);
		assert!(Rail::Bank.required_identifiers().is_empty());
	}

	#[test]
	fn test_anchor_usage() {
		assert!(Rail::Bank.uses_anchor());
		assert!(!Rail::Pix.uses_anchor());
		assert!(!Rail::Card.uses_anchor());
	}
}
