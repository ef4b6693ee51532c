pub mod credential;

pub use credential::SqliteCredentialStore;
