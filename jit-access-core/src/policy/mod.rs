//! Trust-policy document handling: wire codec and principal-set editing.

pub mod codec;
pub mod editor;

pub use codec::{decode, encode, PolicyError, PrincipalSet, TrustPolicyDocument};
pub use editor::{apply, EditError};
