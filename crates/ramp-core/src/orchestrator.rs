//! End-to-end signing orchestration.
//!
//! `SigningOrchestrator::execute` drives one ramp attempt: registration,
//! partitioning, ephemeral signing concurrently with wallet signing in
//! strict nonce order, checkpointing the session after every collected
//! signature, and the single execution-start call. Re-entrant calls while
//! an attempt is in flight are ignored, and any failure lands the session
//! in the `Failed` state with an event published before the error is
//! returned.

use crate::event_bus::EventBus;
use crate::lifecycle::{RampLifecycleStateMachine, RampStatus};
use crate::session::{RampSession, StoredRampState};
use crate::RampError;
use chrono::{DateTime, Utc};
use ramp_gate::{can_proceed, GateContext};
use ramp_services::{AdditionalData, RegistrarApi, WalletCapability};
use ramp_signing::{partition, EphemeralSigningService, Partitioned};
use ramp_storage::{StorageKey, StorageService};
use ramp_types::{
	truncate_id, ChainFamily, RampDirection, RampEvent, SigningProgress, UnsignedTx,
	UserSigningMeta,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of the user-wallet signing loop.
struct UserSigningOutcome {
	meta: UserSigningMeta,
	progress: SigningProgress,
	last_phase: Option<ramp_types::SigningPhase>,
}

/// Drives the multi-chain signing pipeline for one ramp at a time.
pub struct SigningOrchestrator {
	registrar: Arc<dyn RegistrarApi>,
	wallet: Arc<dyn WalletCapability>,
	signing: EphemeralSigningService,
	storage: Arc<StorageService>,
	event_bus: EventBus,
	in_flight: AtomicBool,
}

impl SigningOrchestrator {
	pub fn new(
		registrar: Arc<dyn RegistrarApi>,
		wallet: Arc<dyn WalletCapability>,
		signing: EphemeralSigningService,
		storage: Arc<StorageService>,
		event_bus: EventBus,
	) -> Self {
		Self {
			registrar,
			wallet,
			signing,
			storage,
			event_bus,
			in_flight: AtomicBool::new(false),
		}
	}

	/// Evaluates the precondition gate, then executes. Gate failures are
	/// published as blocking events and never reach the signing layer.
	pub async fn execute_checked(
		&self,
		session: &mut RampSession,
		gate: &GateContext,
		now: DateTime<Utc>,
	) -> Result<(), RampError> {
		if let Err(blocked) = can_proceed(&session.input, gate, now) {
			self.event_bus.publish(RampEvent::Blocked {
				reason: blocked.to_string(),
			});
			return Err(blocked.into());
		}
		self.execute(session).await
	}

	/// Executes one ramp attempt. A duplicate call while an attempt is in
	/// flight is a logged no-op.
	pub async fn execute(&self, session: &mut RampSession) -> Result<(), RampError> {
		if self
			.in_flight
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			tracing::debug!(
				session_id = %truncate_id(&session.id),
				"Execution already in flight; ignoring duplicate call"
			);
			return Ok(());
		}

		let result = self.run_pipeline(session).await;
		self.in_flight.store(false, Ordering::SeqCst);

		if let Err(error) = &result {
			tracing::error!(
				session_id = %truncate_id(&session.id),
				error = %error,
				"Ramp attempt failed"
			);
			// Best effort: a session already in a terminal state stays put.
			let _ = RampLifecycleStateMachine::transition(session, RampStatus::Failed);
			self.publish_status(session);
			self.event_bus.publish(RampEvent::Failed {
				reason: error.to_string(),
			});
			// Storage keeps the last good checkpoint; a retry resumes from
			// there rather than from this failure.
		}

		result
	}

	async fn run_pipeline(&self, session: &mut RampSession) -> Result<(), RampError> {
		// Adopt progress persisted by an earlier attempt for this quote,
		// so confirmed signatures are never requested twice.
		if let Ok(stored) = self
			.storage
			.retrieve::<StoredRampState>(StorageKey::Sessions, &session.input.quote.id)
			.await
		{
			if session.restore(stored) {
				tracing::info!(
					session_id = %truncate_id(&session.id),
					status = %session.status,
					"Resumed persisted ramp state"
				);
			}
		}

		if session.status == RampStatus::Started {
			tracing::info!(
				session_id = %truncate_id(&session.id),
				"Ramp already started; nothing to do"
			);
			return Ok(());
		}

		// A failed attempt re-enters through `Registering`, whether or not
		// the earlier registration survived.
		if session.status == RampStatus::Failed {
			RampLifecycleStateMachine::transition(session, RampStatus::Registering)?;
			self.publish_status(session);
		}

		let ramp = match session.ramp.clone() {
			Some(ramp) => {
				if session.status == RampStatus::Registering {
					RampLifecycleStateMachine::transition(
						session,
						RampStatus::AwaitingSignatures,
					)?;
					self.publish_status(session);
				}
				ramp
			}
			None => self.register(session).await?,
		};

		let partitioned = partition(
			&ramp.unsigned_txs,
			session.input.wallet_address.as_deref(),
		);

		if session.status != RampStatus::Starting {
			self.collect_signatures(session, &partitioned).await?;
		}

		self.start(session).await
	}

	/// Step 1: announce the ephemeral signing accounts and rail data,
	/// receive the unsigned transaction list.
	async fn register(
		&self,
		session: &mut RampSession,
	) -> Result<ramp_services::RampProcess, RampError> {
		if session.status != RampStatus::Registering {
			RampLifecycleStateMachine::transition(session, RampStatus::Registering)?;
			self.publish_status(session);
		}

		let additional_data = build_additional_data(&session.input);
		let ramp = self
			.registrar
			.register_ramp(
				&session.input.quote.id,
				&session.input.ephemerals.signing_accounts(),
				&additional_data,
			)
			.await?;

		tracing::info!(
			session_id = %truncate_id(&session.id),
			ramp_id = %truncate_id(&ramp.id),
			txs = ramp.unsigned_txs.len(),
			"Ramp registered"
		);

		session.ramp = Some(ramp.clone());
		RampLifecycleStateMachine::transition(session, RampStatus::AwaitingSignatures)?;
		self.publish_status(session);
		self.persist(&session.snapshot()).await?;

		Ok(ramp)
	}

	/// Steps 2-5: ephemeral signing runs concurrently with the
	/// user-wallet loop; every collected signature checkpoints the
	/// session, and the merged collection lands on the session at the
	/// end.
	async fn collect_signatures(
		&self,
		session: &mut RampSession,
		partitioned: &Partitioned,
	) -> Result<(), RampError> {
		let already_signed = partitioned
			.user_txs
			.iter()
			.filter(|tx| session.meta.recorded(tx.phase).is_some())
			.count();
		let progress = SigningProgress {
			current: already_signed as u32,
			max: partitioned.user_txs.len() as u32,
		};
		session.progress = progress;

		let checkpoint = Arc::new(Mutex::new(session.snapshot()));

		let ephemeral_side = async {
			if !session.signed_txs.is_empty() {
				// Restored from a checkpoint; the ephemeral side is done.
				return Ok(session.signed_txs.clone());
			}
			let signed = self
				.signing
				.sign_all(&partitioned.ephemeral_txs, &session.input.ephemerals)
				.await?;
			let mut stored = checkpoint.lock().await;
			stored.signed_txs = signed.clone();
			self.persist(&stored).await?;
			Ok::<_, RampError>(signed)
		};

		let user_side = self.sign_user_transactions(
			&partitioned.user_txs,
			session.meta.clone(),
			progress,
			&checkpoint,
		);

		let (mut signed_txs, user_outcome) = tokio::try_join!(ephemeral_side, user_side)?;

		signed_txs.sort_by(|a, b| {
			(a.network.as_str(), a.nonce).cmp(&(b.network.as_str(), b.nonce))
		});
		session.signed_txs = signed_txs;
		session.meta = user_outcome.meta;
		session.progress = user_outcome.progress;
		if user_outcome.last_phase.is_some() {
			session.signing_phase = user_outcome.last_phase;
		}
		self.persist(&session.snapshot()).await?;

		Ok(())
	}

	/// Step 4: request user signatures strictly in ascending nonce order,
	/// mapping each phase tag onto its signing-phase transition.
	async fn sign_user_transactions(
		&self,
		user_txs: &[UnsignedTx],
		mut meta: UserSigningMeta,
		mut progress: SigningProgress,
		checkpoint: &Mutex<StoredRampState>,
	) -> Result<UserSigningOutcome, RampError> {
		let mut last_phase = None;

		for tx in user_txs {
			let Some((entering, entered)) = tx.phase.user_signing_transition() else {
				return Err(RampError::UnknownPhase(tx.phase.to_string()));
			};

			if let Some(hash) = meta.recorded(tx.phase) {
				tracing::info!(
					phase = %tx.phase,
					hash = %truncate_id(hash),
					"Signature already confirmed; not requesting again"
				);
				continue;
			}

			self.event_bus.publish(RampEvent::SigningPhaseChanged {
				phase: entering,
				progress,
			});

			let hash = match tx.network.family() {
				ChainFamily::Evm => self.wallet.sign_and_submit_evm(tx).await?,
				ChainFamily::Substrate => self.wallet.sign_and_submit_substrate(tx).await?,
				ChainFamily::Stellar => {
					return Err(RampError::UnknownPhase(tx.phase.to_string()));
				}
			};

			tracing::info!(
				phase = %tx.phase,
				nonce = tx.nonce,
				hash = %truncate_id(&hash),
				"User signature collected"
			);

			meta.record(tx.phase, hash);
			progress.current += 1;
			last_phase = Some(entered);
			self.event_bus.publish(RampEvent::SigningPhaseChanged {
				phase: entered,
				progress,
			});

			let mut stored = checkpoint.lock().await;
			stored.meta = meta.clone();
			stored.progress = progress;
			stored.signing_phase = last_phase;
			self.persist(&stored).await?;
		}

		Ok(UserSigningOutcome {
			meta,
			progress,
			last_phase,
		})
	}

	/// Step 6: the execution-start call, made at most once per attempt.
	async fn start(&self, session: &mut RampSession) -> Result<(), RampError> {
		if session.status != RampStatus::Starting {
			RampLifecycleStateMachine::transition(session, RampStatus::Starting)?;
			self.publish_status(session);
		}

		let ramp_id = session
			.ramp_id()
			.map(str::to_string)
			.unwrap_or_else(|| session.id.clone());

		if session.start_invoked {
			tracing::info!(
				ramp_id = %truncate_id(&ramp_id),
				"Start already invoked for this ramp; skipping"
			);
		} else {
			let status = self
				.registrar
				.start_ramp(&ramp_id, &session.signed_txs, &session.meta)
				.await?;
			session.start_invoked = true;
			tracing::info!(
				ramp_id = %truncate_id(&ramp_id),
				status = %status.status,
				"Ramp start accepted"
			);
		}

		RampLifecycleStateMachine::transition(session, RampStatus::Started)?;
		self.publish_status(session);
		self.event_bus.publish(RampEvent::Started {
			ramp_id: ramp_id.clone(),
		});
		self.persist(&session.snapshot()).await?;

		Ok(())
	}

	async fn persist(&self, stored: &StoredRampState) -> Result<(), RampError> {
		self.storage
			.store(StorageKey::Sessions, &stored.quote_id, stored)
			.await?;
		Ok(())
	}

	fn publish_status(&self, session: &RampSession) {
		self.event_bus.publish(RampEvent::StatusChanged {
			status: session.status.to_string(),
		});
	}
}

/// Assembles the rail-specific additional data for registration.
fn build_additional_data(input: &ramp_types::ExecutionInput) -> AdditionalData {
	let mut data = AdditionalData::default();
	match input.quote.direction {
		RampDirection::Onramp => {
			data.destination_address = input.wallet_address.clone();
		}
		RampDirection::Offramp => {
			data.wallet_address = input.wallet_address.clone();
		}
	}
	data.tax_id = input.tax_id.clone();
	match input.rail {
		ramp_types::Rail::Pix => {
			data.receiver_tax_id = input.tax_id.clone();
			data.pix_destination = input.payout_key.clone();
		}
		ramp_types::Rail::Bank => {
			data.payment_data = input.payment_data.clone();
		}
		ramp_types::Rail::Card => {}
	}
	data
}

#[cfg(test)]
mod tests {
	use super::*;
	use ramp_types::{
		EphemeralAccount, EphemeralAccountSet, ExecutionInput, FeeBreakdown, Network, Quote, Rail,
		SecretString,
	};
	use rust_decimal::Decimal;

	fn input(rail: Rail, direction: RampDirection) -> ExecutionInput {
		let account = |addr: &str| EphemeralAccount {
			secret: SecretString::from("secret"),
			address: addr.to_string(),
		};
		ExecutionInput {
			quote: Quote {
				id: "q-1".into(),
				direction,
				input_amount: Decimal::new(100, 0),
				output_amount: Decimal::new(95, 0),
				input_currency: "usdc".into(),
				output_currency: "brl".into(),
				fee: FeeBreakdown {
					network: Decimal::ZERO,
					provider: Decimal::ZERO,
					partner_markup: Decimal::ZERO,
					fixed: Decimal::ZERO,
					anchor: Decimal::ZERO,
					total: Decimal::ZERO,
				},
				expires_at: chrono::Utc::now(),
			},
			on_chain_token: "usdc".into(),
			fiat_token: "brl".into(),
			rail,
			wallet_address: Some("0xabc".into()),
			network: Network::Polygon,
			tax_id: Some("12345678900".into()),
			payout_key: Some("pix-key".into()),
			ephemerals: EphemeralAccountSet {
				stellar: account("GA.."),
				substrate: account("6c.."),
				evm: account("0x.."),
			},
			payment_data: None,
		}
	}

	#[test]
	fn test_additional_data_for_pix_offramp() {
		let data = build_additional_data(&input(Rail::Pix, RampDirection::Offramp));
		assert_eq!(data.wallet_address.as_deref(), Some("0xabc"));
		assert_eq!(data.receiver_tax_id.as_deref(), Some("12345678900"));
		assert_eq!(data.pix_destination.as_deref(), Some("pix-key"));
		assert!(data.destination_address.is_none());
	}

	#[test]
	fn test_additional_data_for_onramp_targets_wallet() {
		let data = build_additional_data(&input(Rail::Pix, RampDirection::Onramp));
		assert_eq!(data.destination_address.as_deref(), Some("0xabc"));
		assert!(data.wallet_address.is_none());
	}
}
