//! Common types for the ramp pipeline.
//!
//! This crate defines the shared data model used by every other crate in
//! the workspace: networks and chain families, quotes, fiat rails, the
//! transaction types exchanged with the registration service, ephemeral
//! account material, the frozen execution input, and the UI-facing
//! projections (signing phases, progress counters, events).

/// Address normalization for cross-chain signer comparison.
pub mod address;
/// Anchor protocol session and confirmation types.
pub mod anchor;
/// Ephemeral account material generated per ramp attempt.
pub mod ephemeral;
/// UI-facing events published by the ramp pipeline.
pub mod events;
/// The frozen parameters of one ramp attempt.
pub mod execution;
/// KYC status types consumed from the identity service.
pub mod kyc;
/// Networks and chain families.
pub mod network;
/// Route phase tags and the user signing phase projection.
pub mod phases;
/// Price quotes and fee breakdowns.
pub mod quote;
/// Fiat rails and their identifier requirements.
pub mod rail;
/// Secret material wrapper that redacts and zeroizes.
pub mod secret_string;
/// Unsigned and signed transaction descriptors.
pub mod tx;

// Re-export all types for convenient access
pub use address::*;
pub use anchor::*;
pub use ephemeral::*;
pub use events::*;
pub use execution::*;
pub use kyc::*;
pub use network::*;
pub use phases::*;
pub use quote::*;
pub use rail::*;
pub use secret_string::SecretString;
pub use tx::*;

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}
