//! Core orchestration for the ramp pipeline.
//!
//! This crate drives a ramp attempt end to end: it registers the ramp,
//! partitions the returned transactions, signs the ephemeral side while
//! walking the user through wallet signatures in nonce order, and hands
//! the merged result to the execution service exactly once. The coarse
//! lifecycle and the fine-grained signing phase are tracked on an owned
//! `RampSession` and projected to the UI through an event bus.

use ramp_gate::Blocked;
use ramp_services::{AnchorError, KycError, RegistrarError, WalletError};
use ramp_signing::SigningError;
use ramp_storage::StorageError;
use thiserror::Error;

pub mod anchor_flow;
pub mod builder;
pub mod event_bus;
pub mod kyc_watcher;
pub mod lifecycle;
pub mod orchestrator;
pub mod session;

pub use anchor_flow::{confirmation_stream, AnchorUrlRefresher};
pub use event_bus::EventBus;
pub use kyc_watcher::KycMonitor;
pub use lifecycle::{LifecycleError, RampLifecycleStateMachine, RampStatus};
pub use orchestrator::SigningOrchestrator;
pub use session::{RampSession, StoredRampState};

/// Errors that can occur while driving a ramp.
///
/// Everything raised inside the orchestrator is caught at the top of
/// `execute`, moved into the `Failed` lifecycle state and published as an
/// event before it is returned to the caller.
#[derive(Debug, Error)]
pub enum RampError {
	/// A precondition blocked execution; recoverable by user action.
	#[error("execution blocked: {0}")]
	Blocked(#[from] Blocked),
	/// The registration/execution service failed.
	#[error(transparent)]
	Registrar(#[from] RegistrarError),
	/// Ephemeral signing failed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// A wallet interaction failed or was rejected.
	#[error(transparent)]
	Wallet(#[from] WalletError),
	/// Session persistence failed.
	#[error(transparent)]
	Storage(#[from] StorageError),
	/// An illegal lifecycle transition was attempted.
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	/// The KYC service failed beyond the monitor's transient handling.
	#[error(transparent)]
	Kyc(#[from] KycError),
	/// The anchor protocol failed.
	#[error(transparent)]
	Anchor(#[from] AnchorError),
	/// A transaction in the user-owned subset carries a phase tag that is
	/// not a user signing step.
	#[error("unexpected phase in user-owned subset: {0}")]
	UnknownPhase(String),
}
