pub mod credentials;
pub mod token;

pub use credentials::Credentials;
pub use token::{SessionToken, TokenProvider};
