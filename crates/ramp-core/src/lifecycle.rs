//! Ramp lifecycle state machine.
//!
//! Tracks the coarse status of an attempt through a static transition
//! table. `Started` is terminal; `Failed` allows exactly one edge back
//! into `Registering` for a manual retry. The transition into `Started`
//! carries rail-specific readiness guards so a ramp is never reported
//! running without the signatures its route needs.

use crate::session::RampSession;
use once_cell::sync::Lazy;
use ramp_types::Rail;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Coarse status of a ramp attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RampStatus {
	/// Nothing submitted yet.
	Idle,
	/// Registration call in flight.
	Registering,
	/// Waiting for ephemeral and user signatures.
	AwaitingSignatures,
	/// Start call in flight.
	Starting,
	/// The execution service accepted the start call. Terminal.
	Started,
	/// The attempt failed; a manual retry may re-register.
	Failed,
}

impl fmt::Display for RampStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			RampStatus::Idle => "idle",
			RampStatus::Registering => "registering",
			RampStatus::AwaitingSignatures => "awaiting-signatures",
			RampStatus::Starting => "starting",
			RampStatus::Started => "started",
			RampStatus::Failed => "failed",
		};
		f.write_str(s)
	}
}

/// Errors raised by the lifecycle machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
	#[error("invalid state transition from {from} to {to}")]
	InvalidTransition { from: RampStatus, to: RampStatus },
	#[error("ramp not ready to start: {0}")]
	NotReady(String),
}

/// Static transition table: each status maps to its allowed successors.
static TRANSITIONS: Lazy<HashMap<RampStatus, HashSet<RampStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		RampStatus::Idle,
		HashSet::from([RampStatus::Registering, RampStatus::Failed]),
	);
	m.insert(
		RampStatus::Registering,
		HashSet::from([RampStatus::AwaitingSignatures, RampStatus::Failed]),
	);
	m.insert(
		RampStatus::AwaitingSignatures,
		HashSet::from([RampStatus::Starting, RampStatus::Failed]),
	);
	m.insert(
		RampStatus::Starting,
		HashSet::from([RampStatus::Started, RampStatus::Failed]),
	);
	m.insert(RampStatus::Started, HashSet::new()); // terminal
	m.insert(RampStatus::Failed, HashSet::from([RampStatus::Registering]));
	m
});

/// Guarded transitions over a `RampSession`.
pub struct RampLifecycleStateMachine;

impl RampLifecycleStateMachine {
	/// Whether the edge exists in the transition table.
	pub fn is_valid_transition(from: RampStatus, to: RampStatus) -> bool {
		TRANSITIONS
			.get(&from)
			.is_some_and(|successors| successors.contains(&to))
	}

	/// Moves the session to a new status, enforcing the table and the
	/// start-readiness guard.
	pub fn transition(session: &mut RampSession, to: RampStatus) -> Result<(), LifecycleError> {
		let from = session.status;
		if !Self::is_valid_transition(from, to) {
			return Err(LifecycleError::InvalidTransition { from, to });
		}
		if to == RampStatus::Started {
			Self::check_start_readiness(session)?;
		}

		tracing::info!(
			session_id = %ramp_types::truncate_id(&session.id),
			%from,
			%to,
			"Ramp status transition"
		);
		session.status = to;
		Ok(())
	}

	/// Rail-specific requirements for entering `Started`.
	fn check_start_readiness(session: &RampSession) -> Result<(), LifecycleError> {
		if session.input.rail.settles_on_chain() && session.signed_txs.is_empty() {
			return Err(LifecycleError::NotReady(
				"signed transaction collection is empty".into(),
			));
		}
		match session.input.rail {
			Rail::Bank => {
				if session.meta.assethub_to_pendulum_hash.is_none() {
					return Err(LifecycleError::NotReady(
						"bank redemption requires the bridge transfer hash".into(),
					));
				}
			}
			Rail::Card => {
				if session.meta.squid_router_approve_hash.is_none()
					|| session.meta.squid_router_swap_hash.is_none()
				{
					return Err(LifecycleError::NotReady(
						"card rail requires approval and swap hashes".into(),
					));
				}
			}
			Rail::Pix => {}
		}
		Ok(())
	}
}
