pub mod entity;
pub mod error;
pub mod port;

pub use entity::{CREDENTIAL_STORAGE_KEY, Credential};
pub use error::CredentialError;
pub use port::CredentialStore;
