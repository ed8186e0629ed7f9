//! From-scratch implementation of `Noise_NNpsk0_25519_ChaChaPoly_SHA256`.
//!
//! The native API's encrypted transport rides on the Noise Protocol
//! Framework: [`CipherState`] handles AEAD with per-direction nonce
//! counters, [`SymmetricState`] the chaining-key/transcript mixing, and
//! [`HandshakeState`] the two NNpsk0 pattern messages. After the split the
//! handshake state is dropped and only the two transport ciphers survive
//! for the session.

mod cipher;
mod handshake;
mod symmetric;

pub use cipher::CipherState;
pub use handshake::{HandshakeState, Role, TransportCiphers};
pub use symmetric::SymmetricState;
