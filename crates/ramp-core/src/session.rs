//! Owned per-attempt ramp state.
//!
//! One `RampSession` exists per execution attempt. It is passed by
//! reference to the orchestrator and read by the UI projection; no other
//! component mutates it. The persisted snapshot deliberately excludes the
//! execution input: ephemeral secrets never leave memory, so a resumed
//! session can submit already-collected signatures but never sign anew.

use crate::lifecycle::RampStatus;
use ramp_services::RampProcess;
use ramp_types::{ExecutionInput, SignedTx, SigningPhase, SigningProgress, UserSigningMeta};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of one ramp attempt.
#[derive(Debug)]
pub struct RampSession {
	/// Session identifier, fresh per attempt.
	pub id: String,
	/// The frozen execution parameters.
	pub input: ExecutionInput,
	/// Coarse lifecycle status.
	pub status: RampStatus,
	/// Fine-grained user signing phase, once signing has begun.
	pub signing_phase: Option<SigningPhase>,
	/// Signature counters for the progress bar.
	pub progress: SigningProgress,
	/// Per-phase hashes recorded during user signing.
	pub meta: UserSigningMeta,
	/// The registered ramp process, once registration succeeded.
	pub ramp: Option<RampProcess>,
	/// The merged signed transaction collection.
	pub signed_txs: Vec<SignedTx>,
	/// Whether the execution-start call has been made for this attempt.
	pub start_invoked: bool,
}

impl RampSession {
	/// Creates a fresh session for one execution attempt.
	pub fn new(input: ExecutionInput) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			input,
			status: RampStatus::Idle,
			signing_phase: None,
			progress: SigningProgress::default(),
			meta: UserSigningMeta::default(),
			ramp: None,
			signed_txs: Vec::new(),
			start_invoked: false,
		}
	}

	/// The ramp process id, once registered.
	pub fn ramp_id(&self) -> Option<&str> {
		self.ramp.as_ref().map(|ramp| ramp.id.as_str())
	}

	/// Discards the attempt. Consumes the session so the execution input,
	/// and with it the ephemeral secrets, is dropped.
	pub fn reset(self) {}

	/// Builds the persistable snapshot of this session.
	pub fn snapshot(&self) -> StoredRampState {
		StoredRampState {
			session_id: self.id.clone(),
			quote_id: self.input.quote.id.clone(),
			status: self.status,
			signing_phase: self.signing_phase,
			progress: self.progress,
			meta: self.meta.clone(),
			ramp: self.ramp.clone(),
			signed_txs: self.signed_txs.clone(),
			start_invoked: self.start_invoked,
		}
	}

	/// Restores progress from a snapshot of an earlier attempt for the
	/// same quote. Signatures and hashes already collected are adopted so
	/// they are never requested from the wallet again.
	pub fn restore(&mut self, stored: StoredRampState) -> bool {
		if stored.quote_id != self.input.quote.id {
			return false;
		}
		self.status = stored.status;
		self.signing_phase = stored.signing_phase;
		self.progress = stored.progress;
		self.meta = stored.meta;
		self.ramp = stored.ramp;
		self.signed_txs = stored.signed_txs;
		self.start_invoked = stored.start_invoked;
		true
	}
}

/// Persisted projection of a `RampSession`.
///
/// Carries no key material: the execution input stays in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRampState {
	pub session_id: String,
	pub quote_id: String,
	pub status: RampStatus,
	pub signing_phase: Option<SigningPhase>,
	pub progress: SigningProgress,
	pub meta: UserSigningMeta,
	pub ramp: Option<RampProcess>,
	pub signed_txs: Vec<SignedTx>,
	pub start_invoked: bool,
}
