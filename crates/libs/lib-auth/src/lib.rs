//! # Authentication Library
//!
//! Bearer token verification for the chat API. Tokens are issued by the
//! external account service; this crate only shares its signing secret.

pub mod token;

// Re-export commonly used types
pub use token::{Claims, TokenError, encode_jwt, decode_jwt};
