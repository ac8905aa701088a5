//! Credential store layer.

pub mod memory;

pub use memory::{NewUser, RotateError, UserStore};
