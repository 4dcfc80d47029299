//! The frozen parameters of one ramp attempt.
//!
//! An `ExecutionInput` is assembled once, when the user confirms intent to
//! proceed, and never mutated afterwards. It is discarded when the ramp
//! finishes, fails or is reset, taking the ephemeral secrets with it.

use crate::{AnchorConfirmation, EphemeralAccountSet, Network, Quote, Rail, RequiredIdentifier};

/// Frozen parameters for one ramp attempt.
#[derive(Debug, Clone)]
pub struct ExecutionInput {
	/// The accepted quote.
	pub quote: Quote,
	/// Identifier of the on-chain token being ramped.
	pub on_chain_token: String,
	/// Identifier of the fiat token on the other side.
	pub fiat_token: String,
	/// The fiat rail settling this ramp.
	pub rail: Rail,
	/// Connected wallet address, if a wallet is connected yet.
	pub wallet_address: Option<String>,
	/// The network the user's tokens live on.
	pub network: Network,
	/// Tax identifier, where the rail requires one.
	pub tax_id: Option<String>,
	/// Payout destination identifier (e.g. a pix key).
	pub payout_key: Option<String>,
	/// Fresh ephemeral accounts, one per chain family.
	pub ephemerals: EphemeralAccountSet,
	/// Anchor-confirmed payment data, present once the interactive anchor
	/// session has completed on rails that use one.
	pub payment_data: Option<AnchorConfirmation>,
}

impl ExecutionInput {
	/// Identifiers the selected rail requires but the input is missing.
	pub fn missing_identifiers(&self) -> Vec<RequiredIdentifier> {
		self.rail
			.required_identifiers()
			.iter()
			.copied()
			.filter(|id| match id {
				RequiredIdentifier::TaxId => self.tax_id.as_deref().unwrap_or("").is_empty(),
				RequiredIdentifier::PayoutKey => {
					self.payout_key.as_deref().unwrap_or("").is_empty()
				}
			})
			.collect()
	}
}
