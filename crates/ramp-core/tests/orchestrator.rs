//! End-to-end orchestrator tests against scripted service mocks.
//!
//! The registration service hands back a route mixing user-owned EVM
//! transactions with ephemeral-owned substrate, payment-ledger and EVM
//! transactions; the tests drive the full pipeline and assert the
//! partition, the signing order, the phase projection and the
//! exactly-once start call.

use async_trait::async_trait;
use extrinsics::encode_unsigned_extrinsic;
use ramp_core::{EventBus, RampError, RampSession, RampStatus, SigningOrchestrator};
use ramp_services::{
	AdditionalData, RampProcess, RampStatus as RampStatusResponse, RegistrarApi, RegistrarError,
	WalletCapability, WalletError,
};
use ramp_signing::{EphemeralSigningService, EvmSigner, StellarSigner, SubstrateChainContext, SubstrateSigner};
use ramp_storage::{MemoryStorage, StorageKey, StorageService};
use ramp_types::{
	EphemeralAccountSet, EvmCallData, ExecutionInput, FeeBreakdown, Network, PhaseTag, Quote,
	Rail, RampDirection, RampEvent, SignedTx, SigningAccount, SigningPhase, TxHash, TxPayload,
	UnsignedTx, UserSigningMeta,
};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use substrate_stellar_sdk::types::Preconditions;
use substrate_stellar_sdk::{Asset, Operation, SecretKey, StroopAmount, Transaction, XdrCodec};

const WALLET: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";
const TEST_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Builds the hex of a minimal unsigned v4 extrinsic around raw call bytes.
mod extrinsics {
	use parity_scale_codec::{Compact, Encode};

	pub fn encode_unsigned_extrinsic(call: &[u8]) -> String {
		let mut xt = vec![0x04u8];
		xt.extend_from_slice(call);
		let mut out = Vec::new();
		Compact(xt.len() as u32).encode_to(&mut out);
		out.extend_from_slice(&xt);
		format!("0x{}", hex::encode(out))
	}
}

fn stellar_envelope(ephemerals: &EphemeralAccountSet, sequence: i64) -> String {
	let source = SecretKey::from_encoding(ephemerals.stellar.secret.expose())
		.unwrap()
		.get_public()
		.clone();
	let mut tx = Transaction::new(
		source.clone(),
		sequence,
		Some(100),
		Preconditions::PrecondNone,
		None,
	)
	.unwrap();
	tx.append_operation(
		Operation::new_payment(source, Asset::AssetTypeNative, StroopAmount(100)).unwrap(),
	)
	.unwrap();
	String::from_utf8(tx.into_transaction_envelope().to_base64_xdr()).unwrap()
}

fn evm_call() -> TxPayload {
	TxPayload::Evm(EvmCallData {
		to: "0x1111111111111111111111111111111111111111".into(),
		data: "0x095ea7b3".into(),
		value: "0".into(),
		gas: "150000".into(),
		max_fee_per_gas: Some("30000000000".into()),
		max_priority_fee_per_gas: Some("1500000000".into()),
	})
}

fn route(ephemerals: &EphemeralAccountSet) -> Vec<UnsignedTx> {
	vec![
		// User side, returned out of nonce order on purpose.
		UnsignedTx {
			network: Network::Polygon,
			signer: WALLET.into(),
			nonce: 1,
			phase: PhaseTag::SquidrouterSwap,
			tx_data: evm_call(),
		},
		UnsignedTx {
			network: Network::Polygon,
			signer: WALLET.into(),
			nonce: 0,
			phase: PhaseTag::SquidrouterApprove,
			tx_data: evm_call(),
		},
		// Ephemeral side across all three families.
		UnsignedTx {
			network: Network::Pendulum,
			signer: ephemerals.substrate.address.clone(),
			nonce: 0,
			phase: PhaseTag::NablaApprove,
			tx_data: TxPayload::SubstrateExtrinsic(encode_unsigned_extrinsic(&[0x0a, 0x01])),
		},
		UnsignedTx {
			network: Network::Pendulum,
			signer: ephemerals.substrate.address.clone(),
			nonce: 1,
			phase: PhaseTag::NablaSwap,
			tx_data: TxPayload::SubstrateExtrinsic(encode_unsigned_extrinsic(&[0x0a, 0x02])),
		},
		UnsignedTx {
			network: Network::Stellar,
			signer: ephemerals.stellar.address.clone(),
			nonce: 2,
			phase: PhaseTag::StellarPayment,
			tx_data: TxPayload::StellarEnvelope(stellar_envelope(ephemerals, 2)),
		},
		UnsignedTx {
			network: Network::Moonbeam,
			signer: ephemerals.evm.address.clone(),
			nonce: 0,
			phase: PhaseTag::BrlaPayoutOnMoonbeam,
			tx_data: evm_call(),
		},
	]
}

#[derive(Default)]
struct MockRegistrar {
	unsigned_txs: Mutex<Vec<UnsignedTx>>,
	register_calls: AtomicUsize,
	start_calls: AtomicUsize,
	started_with: Mutex<Option<(Vec<SignedTx>, UserSigningMeta)>>,
}

#[async_trait]
impl RegistrarApi for MockRegistrar {
	async fn register_ramp(
		&self,
		_quote_id: &str,
		signing_accounts: &[SigningAccount],
		_additional_data: &AdditionalData,
	) -> Result<RampProcess, RegistrarError> {
		assert_eq!(signing_accounts.len(), 3);
		self.register_calls.fetch_add(1, Ordering::SeqCst);
		Ok(RampProcess {
			id: "ramp-1".into(),
			unsigned_txs: self.unsigned_txs.lock().unwrap().clone(),
		})
	}

	async fn start_ramp(
		&self,
		ramp_id: &str,
		signed_txs: &[SignedTx],
		meta: &UserSigningMeta,
	) -> Result<RampStatusResponse, RegistrarError> {
		self.start_calls.fetch_add(1, Ordering::SeqCst);
		*self.started_with.lock().unwrap() = Some((signed_txs.to_vec(), meta.clone()));
		Ok(RampStatusResponse {
			id: ramp_id.into(),
			status: "started".into(),
		})
	}

	async fn get_status(&self, ramp_id: &str) -> Result<RampStatusResponse, RegistrarError> {
		Ok(RampStatusResponse {
			id: ramp_id.into(),
			status: "started".into(),
		})
	}
}

struct MockWallet {
	signed: Mutex<Vec<(PhaseTag, u64)>>,
	reject_phase: Option<PhaseTag>,
}

impl MockWallet {
	fn new() -> Self {
		Self {
			signed: Mutex::new(Vec::new()),
			reject_phase: None,
		}
	}

	fn rejecting(phase: PhaseTag) -> Self {
		Self {
			signed: Mutex::new(Vec::new()),
			reject_phase: Some(phase),
		}
	}

	fn record(&self, tx: &UnsignedTx) -> Result<TxHash, WalletError> {
		if self.reject_phase == Some(tx.phase) {
			return Err(WalletError::Rejected);
		}
		self.signed.lock().unwrap().push((tx.phase, tx.nonce));
		Ok(format!("0xhash{}", tx.nonce))
	}
}

#[async_trait]
impl WalletCapability for MockWallet {
	async fn address(&self) -> Option<String> {
		Some(WALLET.to_string())
	}

	async fn sign_and_submit_evm(&self, tx: &UnsignedTx) -> Result<TxHash, WalletError> {
		self.record(tx)
	}

	async fn sign_and_submit_substrate(&self, tx: &UnsignedTx) -> Result<TxHash, WalletError> {
		self.record(tx)
	}

	async fn sign_raw(&self, _payload: &[u8]) -> Result<Vec<u8>, WalletError> {
		Ok(vec![0u8; 64])
	}
}

fn execution_input(rail: Rail) -> ExecutionInput {
	ExecutionInput {
		quote: Quote {
			id: "quote-1".into(),
			direction: RampDirection::Offramp,
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
			expires_at: chrono::Utc::now() + chrono::Duration::minutes(10),
		},
		on_chain_token: "usdc".into(),
		fiat_token: "brl".into(),
		rail,
		wallet_address: Some(WALLET.into()),
		network: Network::Polygon,
		tax_id: Some("12345678900".into()),
		payout_key: Some("pix-key".into()),
		ephemerals: ramp_keys::create_ephemeral_set().unwrap(),
		payment_data: None,
	}
}

fn orchestrator(
	registrar: Arc<MockRegistrar>,
	wallet: Arc<MockWallet>,
	storage: Arc<StorageService>,
	event_bus: EventBus,
) -> SigningOrchestrator {
	SigningOrchestrator::new(
		registrar,
		wallet,
		EphemeralSigningService::new(
			StellarSigner::new(TEST_PASSPHRASE),
			SubstrateSigner::new(SubstrateChainContext::default()),
			EvmSigner::new(),
		),
		storage,
		event_bus,
	)
}

fn memory_storage() -> Arc<StorageService> {
	Arc::new(StorageService::new(Box::new(MemoryStorage::new())))
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_full_pipeline_signs_partitions_and_starts_once() {
	init_tracing();
	let input = execution_input(Rail::Card);
	let registrar = Arc::new(MockRegistrar::default());
	*registrar.unsigned_txs.lock().unwrap() = route(&input.ephemerals);
	let wallet = Arc::new(MockWallet::new());
	let storage = memory_storage();
	let event_bus = EventBus::new(64);
	let mut events = event_bus.subscribe();

	let orchestrator = orchestrator(registrar.clone(), wallet.clone(), storage, event_bus);
	let mut session = RampSession::new(input);

	orchestrator.execute(&mut session).await.unwrap();

	assert_eq!(session.status, RampStatus::Started);
	assert_eq!(registrar.register_calls.load(Ordering::SeqCst), 1);
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 1);

	// The wallet saw exactly the user-owned transactions, in nonce order.
	assert_eq!(
		*wallet.signed.lock().unwrap(),
		vec![
			(PhaseTag::SquidrouterApprove, 0),
			(PhaseTag::SquidrouterSwap, 1)
		]
	);

	// The start call carried the four ephemeral-signed transactions and
	// the recorded per-phase hashes.
	let (signed_txs, meta) = registrar.started_with.lock().unwrap().clone().unwrap();
	assert_eq!(signed_txs.len(), 4);
	assert!(signed_txs.iter().all(|tx| tx.signer != WALLET));
	assert_eq!(meta.squid_router_approve_hash.as_deref(), Some("0xhash0"));
	assert_eq!(meta.squid_router_swap_hash.as_deref(), Some("0xhash1"));

	assert_eq!(session.signing_phase, Some(SigningPhase::Finished));
	assert_eq!(session.progress.current, 2);
	assert_eq!(session.progress.max, 2);

	// The phase projection walked started -> approved -> finished.
	let mut phases = Vec::new();
	while let Ok(event) = events.try_recv() {
		if let RampEvent::SigningPhaseChanged { phase, .. } = event {
			phases.push(phase);
		}
	}
	assert_eq!(
		phases,
		vec![
			SigningPhase::Started,
			SigningPhase::Approved,
			SigningPhase::Approved,
			SigningPhase::Finished
		]
	);
}

#[tokio::test]
async fn test_start_is_invoked_at_most_once_per_ramp() {
	let input = execution_input(Rail::Card);
	let registrar = Arc::new(MockRegistrar::default());
	*registrar.unsigned_txs.lock().unwrap() = route(&input.ephemerals);
	let wallet = Arc::new(MockWallet::new());
	let storage = memory_storage();

	let orchestrator =
		orchestrator(registrar.clone(), wallet.clone(), storage.clone(), EventBus::new(64));
	let mut session = RampSession::new(input);
	orchestrator.execute(&mut session).await.unwrap();
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 1);

	// Same session again: terminal state, no second submission.
	orchestrator.execute(&mut session).await.unwrap();
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 1);

	// A fresh session for the same quote restores the persisted state
	// and also refuses to double-start.
	let mut reloaded = RampSession::new(execution_input(Rail::Card));
	orchestrator.execute(&mut reloaded).await.unwrap();
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 1);
	assert_eq!(reloaded.status, RampStatus::Started);
	assert!(wallet.signed.lock().unwrap().len() == 2);
}

#[tokio::test]
async fn test_unknown_user_phase_is_fatal() {
	let input = execution_input(Rail::Card);
	let registrar = Arc::new(MockRegistrar::default());
	// A user-owned transaction with a route step the wallet never signs.
	*registrar.unsigned_txs.lock().unwrap() = vec![UnsignedTx {
		network: Network::Polygon,
		signer: WALLET.into(),
		nonce: 0,
		phase: PhaseTag::NablaSwap,
		tx_data: evm_call(),
	}];
	let wallet = Arc::new(MockWallet::new());
	let storage = memory_storage();

	let orchestrator = orchestrator(registrar.clone(), wallet, storage, EventBus::new(64));
	let mut session = RampSession::new(input);

	let error = orchestrator.execute(&mut session).await.unwrap_err();
	assert!(matches!(error, RampError::UnknownPhase(_)));
	assert_eq!(session.status, RampStatus::Failed);
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_wallet_rejection_fails_then_retry_skips_confirmed_signatures() {
	let input = execution_input(Rail::Card);
	let registrar = Arc::new(MockRegistrar::default());
	*registrar.unsigned_txs.lock().unwrap() = route(&input.ephemerals);
	let storage = memory_storage();
	let event_bus = EventBus::new(64);

	// First attempt: the user approves the first transaction but rejects
	// the swap.
	let rejecting = Arc::new(MockWallet::rejecting(PhaseTag::SquidrouterSwap));
	let orchestrator_failing = orchestrator(
		registrar.clone(),
		rejecting.clone(),
		storage.clone(),
		event_bus.clone(),
	);
	let mut session = RampSession::new(input);
	let error = orchestrator_failing.execute(&mut session).await.unwrap_err();
	assert!(matches!(error, RampError::Wallet(WalletError::Rejected)));
	assert_eq!(session.status, RampStatus::Failed);
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 0);
	assert_eq!(rejecting.signed.lock().unwrap().len(), 1);

	// Retry with a cooperative wallet: the approval hash collected before
	// the failure is not requested again.
	let cooperative = Arc::new(MockWallet::new());
	let orchestrator_retry =
		orchestrator(registrar.clone(), cooperative.clone(), storage, event_bus);
	orchestrator_retry.execute(&mut session).await.unwrap();

	assert_eq!(session.status, RampStatus::Started);
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 1);
	assert_eq!(
		*cooperative.signed.lock().unwrap(),
		vec![(PhaseTag::SquidrouterSwap, 1)]
	);
}

#[tokio::test]
async fn test_resume_at_start_never_rerequests_signatures() {
	let input = execution_input(Rail::Card);
	let registrar = Arc::new(MockRegistrar::default());
	*registrar.unsigned_txs.lock().unwrap() = route(&input.ephemerals);
	let wallet = Arc::new(MockWallet::new());
	let storage = memory_storage();

	// Persist a checkpoint as a reloaded page would find it: signing done,
	// start still pending.
	let mut checkpoint = RampSession::new(execution_input(Rail::Card));
	checkpoint.ramp = Some(RampProcess {
		id: "ramp-1".into(),
		unsigned_txs: registrar.unsigned_txs.lock().unwrap().clone(),
	});
	checkpoint.status = RampStatus::Starting;
	checkpoint.meta.record(PhaseTag::SquidrouterApprove, "0xaaa".into());
	checkpoint.meta.record(PhaseTag::SquidrouterSwap, "0xbbb".into());
	checkpoint.signed_txs = vec![SignedTx {
		network: Network::Pendulum,
		signer: "ephemeral".into(),
		nonce: 0,
		phase: PhaseTag::NablaSwap,
		tx_data: "0xsigned".into(),
	}];
	storage
		.store(StorageKey::Sessions, "quote-1", &checkpoint.snapshot())
		.await
		.unwrap();

	let orchestrator = orchestrator(registrar.clone(), wallet.clone(), storage, EventBus::new(64));
	let mut session = RampSession::new(input);
	orchestrator.execute(&mut session).await.unwrap();

	assert_eq!(session.status, RampStatus::Started);
	assert_eq!(registrar.start_calls.load(Ordering::SeqCst), 1);
	// No wallet interaction happened at all.
	assert!(wallet.signed.lock().unwrap().is_empty());

	let (signed_txs, meta) = registrar.started_with.lock().unwrap().clone().unwrap();
	assert_eq!(signed_txs.len(), 1);
	assert_eq!(meta.squid_router_approve_hash.as_deref(), Some("0xaaa"));
}

#[tokio::test]
async fn test_blocked_gate_never_reaches_signing() {
	let mut input = execution_input(Rail::Card);
	input.quote.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
	let registrar = Arc::new(MockRegistrar::default());
	let wallet = Arc::new(MockWallet::new());
	let storage = memory_storage();
	let event_bus = EventBus::new(64);
	let mut events = event_bus.subscribe();

	let orchestrator = orchestrator(registrar.clone(), wallet, storage, event_bus);
	let mut session = RampSession::new(input);

	let gate = ramp_gate::GateContext {
		kyc: None,
		remaining_limit: None,
		anchor_confirmation: None,
	};
	let error = orchestrator
		.execute_checked(&mut session, &gate, chrono::Utc::now())
		.await
		.unwrap_err();

	assert!(matches!(error, RampError::Blocked(ramp_gate::Blocked::QuoteExpired)));
	assert_eq!(session.status, RampStatus::Idle);
	assert_eq!(registrar.register_calls.load(Ordering::SeqCst), 0);
	assert!(matches!(
		events.try_recv().unwrap(),
		RampEvent::Blocked { .. }
	));
}
