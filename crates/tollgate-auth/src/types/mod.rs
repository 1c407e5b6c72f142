//! Domain types consumed by the authorization server core.

pub mod client;
pub mod token;

pub use client::{Client, ClientType, ClientValidationError, GrantType, ResponseType};
pub use token::{BEARER, Token};
