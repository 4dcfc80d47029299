//! Execution preconditions for the ramp pipeline.
//!
//! Before the orchestrator is allowed to register and sign anything, the
//! gate checks the externally supplied state of the attempt: quote
//! freshness, rail identifier completeness, the user's remaining fiat-rail
//! limit and, on anchor rails, agreement between the anchor-confirmed
//! amount and the quote. The rules run in a fixed order and the first
//! failing rule wins; a blocked attempt never reaches the signing layer.

use chrono::{DateTime, Utc};
use ramp_types::{AnchorConfirmation, ExecutionInput, KycReport, RampDirection};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an execution attempt is blocked.
///
/// Every variant is recoverable by user action, not by retrying: a new
/// quote, completing the form, a higher KYC tier, or abandoning the
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Blocked {
	/// The quote expired; a new quote must be fetched.
	#[error("quote expired")]
	QuoteExpired,
	/// The selected rail requires identifiers the input does not carry.
	#[error("missing identifiers: {0:?}")]
	MissingIdentifiers(Vec<String>),
	/// The requested amount exceeds the remaining rail limit. Soft block:
	/// the caller routes the user into a higher KYC tier.
	#[error("amount {requested} exceeds remaining limit {remaining}")]
	LimitExceeded {
		requested: Decimal,
		remaining: Decimal,
	},
	/// The anchor confirmed a different amount than the quote prices.
	#[error("anchor confirmed {confirmed}, quote expects {expected}")]
	AmountMismatch {
		expected: Decimal,
		confirmed: Decimal,
	},
}

/// Externally fetched state the gate evaluates against.
#[derive(Debug, Clone)]
pub struct GateContext {
	/// Latest KYC snapshot for the user's tax identifier.
	pub kyc: Option<KycReport>,
	/// Remaining limit for the rail and direction, when the rail tracks
	/// per-user limits.
	pub remaining_limit: Option<Decimal>,
	/// Anchor confirmation, once the interactive session completed.
	pub anchor_confirmation: Option<AnchorConfirmation>,
}

/// Decides whether execution may proceed.
///
/// Rules are evaluated in order; the first failing rule is returned.
pub fn can_proceed(
	input: &ExecutionInput,
	context: &GateContext,
	now: DateTime<Utc>,
) -> Result<(), Blocked> {
	if input.quote.is_expired(now) {
		return Err(Blocked::QuoteExpired);
	}

	let missing = input.missing_identifiers();
	if !missing.is_empty() {
		return Err(Blocked::MissingIdentifiers(
			missing.iter().map(|id| id.as_str().to_string()).collect(),
		));
	}

	if let Some(remaining) = context.remaining_limit {
		let requested = requested_rail_amount(input);
		if requested > remaining {
			// Soft block: the caller routes the user into the next KYC
			// tier instead of aborting.
			let current_level = context.kyc.map(|report| report.level);
			tracing::info!(
				%requested,
				%remaining,
				rail = %input.rail,
				kyc_level = ?current_level,
				"Requested amount exceeds remaining rail limit"
			);
			return Err(Blocked::LimitExceeded {
				requested,
				remaining,
			});
		}
	}

	if let Some(confirmation) = &context.anchor_confirmation {
		let expected = input.quote.amount_before_anchor_fee();
		if confirmation.amount != expected {
			return Err(Blocked::AmountMismatch {
				expected,
				confirmed: confirmation.amount,
			});
		}
	}

	Ok(())
}

/// The amount counted against the fiat-rail limit: the fiat side of the
/// quote, which is the output when selling and the input when buying.
fn requested_rail_amount(input: &ExecutionInput) -> Decimal {
	match input.quote.direction {
		RampDirection::Offramp => input.quote.output_amount,
		RampDirection::Onramp => input.quote.input_amount,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use ramp_types::{
		EphemeralAccount, EphemeralAccountSet, FeeBreakdown, KycLevel, KycStatus, Network, Quote,
		Rail, SecretString,
	};
	use rust_decimal_macros::dec;

	fn ephemerals() -> EphemeralAccountSet {
		let account = |addr: &str| EphemeralAccount {
			secret: SecretString::from("secret"),
			address: addr.to_string(),
		};
		EphemeralAccountSet {
			stellar: account("GA.."),
			substrate: account("6c.."),
			evm: account("0x.."),
		}
	}

	fn quote(direction: RampDirection, expires_in: Duration) -> Quote {
		Quote {
			id: "q-1".into(),
			direction,
			input_amount: dec!(120),
			output_amount: dec!(100),
			input_currency: "usdc".into(),
			output_currency: "brl".into(),
			fee: FeeBreakdown {
				network: dec!(1),
				provider: dec!(2),
				partner_markup: dec!(0),
				fixed: dec!(0),
				anchor: dec!(5),
				total: dec!(8),
			},
			expires_at: Utc::now() + expires_in,
		}
	}

	fn input(rail: Rail, quote: Quote) -> ExecutionInput {
		ExecutionInput {
			quote,
			on_chain_token: "usdc".into(),
			fiat_token: "brl".into(),
			rail,
			wallet_address: Some("0xabc".into()),
			network: Network::Polygon,
			tax_id: Some("12345678900".into()),
			payout_key: Some("pix-key".into()),
			ephemerals: ephemerals(),
			payment_data: None,
		}
	}

	fn context() -> GateContext {
		GateContext {
			kyc: Some(KycReport {
				status: KycStatus::Approved,
				level: KycLevel::Level1,
			}),
			remaining_limit: None,
			anchor_confirmation: None,
		}
	}

	#[test]
	fn test_expired_quote_blocks_every_rail() {
		for rail in [Rail::Pix, Rail::Bank, Rail::Card] {
			let input = input(rail, quote(RampDirection::Offramp, Duration::seconds(-10)));
			assert_eq!(
				can_proceed(&input, &context(), Utc::now()),
				Err(Blocked::QuoteExpired)
			);
		}
	}

	#[test]
	fn test_pix_without_payout_key_is_blocked() {
		let mut input = input(Rail::Pix, quote(RampDirection::Offramp, Duration::minutes(5)));
		input.payout_key = None;
		assert_eq!(
			can_proceed(&input, &context(), Utc::now()),
			Err(Blocked::MissingIdentifiers(vec!["payout key".into()]))
		);
	}

	#[test]
	fn test_limit_exceeded_is_soft_blocked() {
		// Level 1 approved, requested fiat amount 120 against remaining 100.
		let input = input(Rail::Pix, quote(RampDirection::Onramp, Duration::minutes(5)));
		let mut ctx = context();
		ctx.remaining_limit = Some(dec!(100));
		assert_eq!(
			can_proceed(&input, &ctx, Utc::now()),
			Err(Blocked::LimitExceeded {
				requested: dec!(120),
				remaining: dec!(100),
			})
		);
	}

	#[test]
	fn test_offramp_limit_counts_output_side() {
		let input = input(Rail::Pix, quote(RampDirection::Offramp, Duration::minutes(5)));
		let mut ctx = context();
		ctx.remaining_limit = Some(dec!(100));
		// Offramp counts the fiat output (100), which fits exactly.
		assert_eq!(can_proceed(&input, &ctx, Utc::now()), Ok(()));
	}

	#[test]
	fn test_anchor_amount_mismatch() {
		// output 100 + anchor fee 5 -> the anchor must confirm 105.
		let input = input(Rail::Bank, quote(RampDirection::Offramp, Duration::minutes(5)));
		let mut ctx = context();
		ctx.anchor_confirmation = Some(AnchorConfirmation {
			amount: dec!(104),
			memo: "memo".into(),
			memo_type: "text".into(),
			destination_account: "GB..".into(),
		});
		assert_eq!(
			can_proceed(&input, &ctx, Utc::now()),
			Err(Blocked::AmountMismatch {
				expected: dec!(105),
				confirmed: dec!(104),
			})
		);

		ctx.anchor_confirmation.as_mut().unwrap().amount = dec!(105);
		assert_eq!(can_proceed(&input, &ctx, Utc::now()), Ok(()));
	}

	#[test]
	fn test_rule_order_expiry_before_identifiers() {
		let mut input = input(Rail::Pix, quote(RampDirection::Offramp, Duration::seconds(-1)));
		input.tax_id = None;
		assert_eq!(
			can_proceed(&input, &context(), Utc::now()),
			Err(Blocked::QuoteExpired)
		);
	}
}
