//! # Model Layer
//!
//! Database rows, creation types, and repositories.

pub mod store;
