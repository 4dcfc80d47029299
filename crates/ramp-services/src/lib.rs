//! Clients for the external collaborators of the ramp pipeline.
//!
//! Everything the pipeline consumes over the network is behind a trait in
//! this crate: the registration/execution service, the KYC status
//! service, the anchor redemption protocol and the connected wallet. The
//! traits carry the contract; the `Http…` types carry the request
//! shaping. Tests and embeddings supply their own implementations.

pub mod anchor;
pub mod kyc;
pub mod registrar;
pub mod wallet;

pub use anchor::{AnchorApi, AnchorError, HttpAnchor};
pub use kyc::{HttpKycService, KycApi, KycError, RemainingLimits};
pub use registrar::{
	AdditionalData, HttpRegistrar, RampProcess, RampStatus, RegistrarApi, RegistrarError,
};
pub use wallet::{WalletCapability, WalletError};
