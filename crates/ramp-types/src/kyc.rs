//! KYC status types consumed from the identity service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of the identity provider's review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
	Pending,
	Approved,
	Rejected,
}

/// Verification tier; tier two unlocks higher fiat-rail limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum KycLevel {
	Level1,
	Level2,
}

impl TryFrom<u8> for KycLevel {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(KycLevel::Level1),
			2 => Ok(KycLevel::Level2),
			other => Err(format!("unsupported KYC level: {}", other)),
		}
	}
}

impl From<KycLevel> for u8 {
	fn from(level: KycLevel) -> Self {
		match level {
			KycLevel::Level1 => 1,
			KycLevel::Level2 => 2,
		}
	}
}

impl fmt::Display for KycLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", u8::from(*self))
	}
}

/// A snapshot of a user's KYC state, as polled by tax identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycReport {
	pub status: KycStatus,
	pub level: KycLevel,
}

impl KycReport {
	pub fn is_approved(&self) -> bool {
		self.status == KycStatus::Approved
	}
}
