pub mod entity;
pub mod error;
pub mod port;
pub mod prompt;
pub mod schema;
