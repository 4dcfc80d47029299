//! Price quotes and fee breakdowns.
//!
//! A quote is fetched from the pricing backend and is immutable once
//! received; a refreshed price is a new quote object, never a mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a ramp: fiat into crypto or crypto into fiat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RampDirection {
	/// Fiat in, on-chain token out.
	#[serde(rename = "on")]
	Onramp,
	/// On-chain token in, fiat payout out.
	#[serde(rename = "off")]
	Offramp,
}

impl fmt::Display for RampDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RampDirection::Onramp => write!(f, "on"),
			RampDirection::Offramp => write!(f, "off"),
		}
	}
}

/// Fee components of a quote.
///
/// All components are denominated in the output currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
	/// Gas and transfer costs across the involved networks.
	pub network: Decimal,
	/// Fee taken by the ramp provider.
	pub provider: Decimal,
	/// Markup applied on behalf of an integrating partner.
	pub partner_markup: Decimal,
	/// Fixed component independent of amount.
	pub fixed: Decimal,
	/// Fee retained by the anchor on redemption rails.
	pub anchor: Decimal,
	/// Sum of all components.
	pub total: Decimal,
}

/// An accepted price quote.
///
/// Owned by the requesting flow and superseded, never mutated, when a new
/// quote is fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	/// Identifier assigned by the pricing backend.
	pub id: String,
	/// Ramp direction this quote prices.
	#[serde(rename = "rampType")]
	pub direction: RampDirection,
	/// Amount the user puts in.
	pub input_amount: Decimal,
	/// Amount the user receives, after fees.
	pub output_amount: Decimal,
	/// Input currency identifier.
	pub input_currency: String,
	/// Output currency identifier.
	pub output_currency: String,
	/// Fee breakdown.
	pub fee: FeeBreakdown,
	/// Absolute expiry timestamp.
	pub expires_at: DateTime<Utc>,
}

impl Quote {
	/// Whether this quote has expired at the given instant.
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		now >= self.expires_at
	}

	/// The amount the anchor must confirm for this quote: the output
	/// amount before the anchor fee is deducted.
	pub fn amount_before_anchor_fee(&self) -> Decimal {
		self.output_amount + self.fee.anchor
	}
}
