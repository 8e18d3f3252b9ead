//! # Adapters Layer
//!
//! Implementations of the outbound ports for in-process wiring and tests.

mod broadcaster;
mod notifier;
mod reporter;
mod signer;
mod store;

pub use broadcaster::ChannelBroadcaster;
pub use notifier::TracingNotifier;
pub use reporter::BroadcastAttestationReporter;
pub use signer::{EcdsaSignatureVerifier, Secp256k1GuardianSigner};
pub use store::InMemoryAttestationStore;
