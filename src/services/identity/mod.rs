pub mod factory;
pub mod firebase;
pub mod keys;
pub mod verifier;

pub use factory::build_identity_verifier;
pub use firebase::FirebaseTokenVerifier;
pub use keys::PublicKeyCache;
pub use verifier::{AuthError, IdentityVerifier, VerifiedIdentity};
