//! Substrate signer: SCALE-encoded extrinsics.
//!
//! The registration service delivers substrate transactions as the hex
//! encoding of an unsigned (version 4) extrinsic. Signing derives the
//! sr25519 keypair from the ephemeral secret, rebuilds the signing payload
//! with the transaction's declared nonce and an immortal era, signs it and
//! assembles the signed extrinsic. The chain binding (genesis hash and
//! runtime versions) comes from configuration rather than a live node, so
//! signing itself performs no I/O.

use crate::{ChainSigner, SigningError};
use async_trait::async_trait;
use parity_scale_codec::{Compact, Decode, Encode};
use ramp_types::{ChainFamily, EphemeralAccount, SignedTx, TxPayload, UnsignedTx};
use sp_core::hashing::blake2_256;
use sp_core::sr25519;
use sp_core::Pair as _;

/// Extrinsic format version understood by this signer.
const EXTRINSIC_VERSION: u8 = 4;
/// High bit of the version byte marks a signed extrinsic.
const SIGNED_BIT: u8 = 0b1000_0000;
/// `MultiAddress::Id` discriminant.
const MULTI_ADDRESS_ID: u8 = 0x00;
/// `MultiSignature::Sr25519` discriminant.
const MULTI_SIGNATURE_SR25519: u8 = 0x01;
/// Payloads longer than this are signed through their blake2-256 hash.
const PAYLOAD_HASH_THRESHOLD: usize = 256;

/// Chain binding for extrinsic signing.
///
/// Mirrors what a live node connection would provide: the genesis hash
/// doubles as the era checkpoint because ephemeral extrinsics are signed
/// with an immortal era.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstrateChainContext {
	pub genesis_hash: [u8; 32],
	pub spec_version: u32,
	pub transaction_version: u32,
}

/// Signer for the substrate family.
pub struct SubstrateSigner {
	context: SubstrateChainContext,
}

impl SubstrateSigner {
	pub fn new(context: SubstrateChainContext) -> Self {
		Self { context }
	}

	/// Extracts the call bytes from an unsigned extrinsic hex encoding.
	fn decode_call(&self, tx: &UnsignedTx, extrinsic_hex: &str) -> Result<Vec<u8>, SigningError> {
		let bytes = hex::decode(extrinsic_hex.trim_start_matches("0x"))
			.map_err(|e| SigningError::failed(tx, format!("extrinsic hex decode: {e}")))?;

		let mut input = &bytes[..];
		let length: Compact<u32> = Decode::decode(&mut input)
			.map_err(|e| SigningError::failed(tx, format!("extrinsic length prefix: {e}")))?;
		if length.0 as usize != input.len() {
			return Err(SigningError::failed(tx, "extrinsic length mismatch"));
		}

		match input.split_first() {
			Some((&version, call)) if version == EXTRINSIC_VERSION => Ok(call.to_vec()),
			Some((&version, _)) => Err(SigningError::failed(
				tx,
				format!("unexpected extrinsic version byte: {version:#x}"),
			)),
			None => Err(SigningError::failed(tx, "empty extrinsic")),
		}
	}

	/// Builds the payload the signature commits to: call, extra (immortal
	/// era, nonce, zero tip) and the chain binding.
	fn signing_payload(&self, call: &[u8], nonce: u32) -> Vec<u8> {
		let mut payload = Vec::with_capacity(call.len() + 80);
		payload.extend_from_slice(call);
		payload.push(0x00); // immortal era
		Compact(nonce).encode_to(&mut payload);
		Compact(0u128).encode_to(&mut payload); // tip
		self.context.spec_version.encode_to(&mut payload);
		self.context.transaction_version.encode_to(&mut payload);
		payload.extend_from_slice(&self.context.genesis_hash);
		payload.extend_from_slice(&self.context.genesis_hash); // era checkpoint
		payload
	}

	/// Assembles the signed extrinsic around the original call.
	fn assemble(
		&self,
		public: &sr25519::Public,
		signature: &sr25519::Signature,
		nonce: u32,
		call: &[u8],
	) -> Vec<u8> {
		let mut xt = Vec::with_capacity(call.len() + 110);
		xt.push(EXTRINSIC_VERSION | SIGNED_BIT);
		xt.push(MULTI_ADDRESS_ID);
		xt.extend_from_slice(public.as_ref());
		xt.push(MULTI_SIGNATURE_SR25519);
		xt.extend_from_slice(signature.as_ref());
		xt.push(0x00); // immortal era
		Compact(nonce).encode_to(&mut xt);
		Compact(0u128).encode_to(&mut xt);
		xt.extend_from_slice(call);

		let mut out = Vec::with_capacity(xt.len() + 5);
		Compact(xt.len() as u32).encode_to(&mut out);
		out.extend_from_slice(&xt);
		out
	}
}

#[async_trait]
impl ChainSigner for SubstrateSigner {
	fn family(&self) -> ChainFamily {
		ChainFamily::Substrate
	}

	async fn sign(
		&self,
		tx: &UnsignedTx,
		key: &EphemeralAccount,
	) -> Result<SignedTx, SigningError> {
		let TxPayload::SubstrateExtrinsic(extrinsic_hex) = &tx.tx_data else {
			return Err(SigningError::failed(tx, "payload is not an extrinsic"));
		};

		let call = self.decode_call(tx, extrinsic_hex)?;

		let seed = key
			.secret
			.with_exposed(|s| hex::decode(s.trim_start_matches("0x")))
			.map_err(|e| SigningError::failed(tx, format!("secret decode: {e}")))?;
		let pair = sr25519::Pair::from_seed_slice(&seed)
			.map_err(|e| SigningError::failed(tx, format!("keypair derivation: {e:?}")))?;

		let nonce = u32::try_from(tx.nonce)
			.map_err(|_| SigningError::failed(tx, "nonce exceeds u32 range"))?;
		let payload = self.signing_payload(&call, nonce);
		let signature = if payload.len() > PAYLOAD_HASH_THRESHOLD {
			pair.sign(&blake2_256(&payload))
		} else {
			pair.sign(&payload)
		};

		let signed = self.assemble(&pair.public(), &signature, nonce, &call);
		Ok(SignedTx::from_unsigned(tx, format!("0x{}", hex::encode(signed))))
	}
}
