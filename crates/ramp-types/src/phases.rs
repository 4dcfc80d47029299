//! Route phase tags and the user signing phase projection.
//!
//! Two distinct notions share the word "phase": the tag on each
//! transaction identifying which step of the cross-chain route it performs
//! and the coarse UI-facing progress of user-wallet signing. The tag set
//! is closed; a wire value outside it fails at decode time rather than
//! being matched by string at dispatch time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a wire phase tag is not part of the known route
/// step set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase tag: {0}")]
pub struct UnknownPhase(pub String);

/// The route step a transaction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseTag {
	#[serde(rename = "squidrouterApprove")]
	SquidrouterApprove,
	#[serde(rename = "squidrouterSwap")]
	SquidrouterSwap,
	#[serde(rename = "assethubToPendulum")]
	AssethubToPendulum,
	#[serde(rename = "nablaApprove")]
	NablaApprove,
	#[serde(rename = "nablaSwap")]
	NablaSwap,
	#[serde(rename = "subsidizePreSwap")]
	SubsidizePreSwap,
	#[serde(rename = "subsidizePostSwap")]
	SubsidizePostSwap,
	#[serde(rename = "distributeFees")]
	DistributeFees,
	#[serde(rename = "spacewalkRedeem")]
	SpacewalkRedeem,
	#[serde(rename = "stellarPayment")]
	StellarPayment,
	#[serde(rename = "pendulumToMoonbeam")]
	PendulumToMoonbeam,
	#[serde(rename = "moonbeamToPendulum")]
	MoonbeamToPendulum,
	#[serde(rename = "brlaPayoutOnMoonbeam")]
	BrlaPayoutOnMoonbeam,
}

impl PhaseTag {
	pub fn as_str(&self) -> &'static str {
		match self {
			PhaseTag::SquidrouterApprove => "squidrouterApprove",
			PhaseTag::SquidrouterSwap => "squidrouterSwap",
			PhaseTag::AssethubToPendulum => "assethubToPendulum",
			PhaseTag::NablaApprove => "nablaApprove",
			PhaseTag::NablaSwap => "nablaSwap",
			PhaseTag::SubsidizePreSwap => "subsidizePreSwap",
			PhaseTag::SubsidizePostSwap => "subsidizePostSwap",
			PhaseTag::DistributeFees => "distributeFees",
			PhaseTag::SpacewalkRedeem => "spacewalkRedeem",
			PhaseTag::StellarPayment => "stellarPayment",
			PhaseTag::PendulumToMoonbeam => "pendulumToMoonbeam",
			PhaseTag::MoonbeamToPendulum => "moonbeamToPendulum",
			PhaseTag::BrlaPayoutOnMoonbeam => "brlaPayoutOnMoonbeam",
		}
	}

	/// The signing phase transition a user-owned transaction of this tag
	/// drives, as `(entered before signing, entered after signing)`.
	///
	/// Returns `None` for tags that are never signed by the connected
	/// wallet; encountering one of those in the user-owned subset is a
	/// fatal error at the orchestrator.
	pub fn user_signing_transition(&self) -> Option<(SigningPhase, SigningPhase)> {
		match self {
			PhaseTag::SquidrouterApprove => Some((SigningPhase::Started, SigningPhase::Approved)),
			PhaseTag::SquidrouterSwap => Some((SigningPhase::Approved, SigningPhase::Finished)),
			PhaseTag::AssethubToPendulum => Some((SigningPhase::Started, SigningPhase::Finished)),
			_ => None,
		}
	}
}

impl FromStr for PhaseTag {
	type Err = UnknownPhase;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		serde_json::from_value(serde_json::Value::String(s.to_string()))
			.map_err(|_| UnknownPhase(s.to_string()))
	}
}

impl fmt::Display for PhaseTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Coarse progress of user-wallet signing, projected for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningPhase {
	Login,
	Started,
	Approved,
	Signed,
	Finished,
}

impl fmt::Display for SigningPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			SigningPhase::Login => "login",
			SigningPhase::Started => "started",
			SigningPhase::Approved => "approved",
			SigningPhase::Signed => "signed",
			SigningPhase::Finished => "finished",
		};
		f.write_str(s)
	}
}

/// Signature counters for progress-bar rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SigningProgress {
	/// Signatures collected so far.
	pub current: u32,
	/// Signatures required in total.
	pub max: u32,
}

/// Per-phase transaction hashes recorded while the user signs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSigningMeta {
	/// Hash of the token approval on the EVM bridge route.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub squid_router_approve_hash: Option<String>,
	/// Hash of the swap on the EVM bridge route.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub squid_router_swap_hash: Option<String>,
	/// Hash of the cross-chain transfer on the substrate route.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assethub_to_pendulum_hash: Option<String>,
}

impl UserSigningMeta {
	/// Records the hash produced by signing a transaction of the given
	/// tag. Tags without a recorded hash slot are ignored.
	pub fn record(&mut self, phase: PhaseTag, hash: String) {
		match phase {
			PhaseTag::SquidrouterApprove => self.squid_router_approve_hash = Some(hash),
			PhaseTag::SquidrouterSwap => self.squid_router_swap_hash = Some(hash),
			PhaseTag::AssethubToPendulum => self.assethub_to_pendulum_hash = Some(hash),
			_ => {}
		}
	}

	/// The hash recorded for the given tag, if any.
	pub fn recorded(&self, phase: PhaseTag) -> Option<&str> {
		match phase {
			PhaseTag::SquidrouterApprove => self.squid_router_approve_hash.as_deref(),
			PhaseTag::SquidrouterSwap => self.squid_router_swap_hash.as_deref(),
			PhaseTag::AssethubToPendulum => self.assethub_to_pendulum_hash.as_deref(),
			_ => None,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.squid_router_approve_hash.is_none()
			&& self.squid_router_swap_hash.is_none()
			&& self.assethub_to_pendulum_hash.is_none()
	}
}
