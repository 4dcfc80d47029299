//! UI-facing events published by the ramp pipeline.
//!
//! The presentation layer subscribes to these instead of reaching into
//! pipeline internals. Events carry plain data only; reasons are
//! pre-rendered strings so the UI never needs the originating error types.

use crate::{SigningPhase, SigningProgress};
use serde::{Deserialize, Serialize};

/// An observable change in the ramp pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RampEvent {
	/// The coarse lifecycle status changed.
	StatusChanged { status: String },
	/// The user signing phase advanced.
	SigningPhaseChanged {
		phase: SigningPhase,
		progress: SigningProgress,
	},
	/// Execution is blocked pending user action.
	Blocked { reason: String },
	/// The ramp failed and was reset to a retryable state.
	Failed { reason: String },
	/// The execution service accepted the start call.
	Started { ramp_id: String },
}
