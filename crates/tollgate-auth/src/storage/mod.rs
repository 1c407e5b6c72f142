//! Service contracts consumed by the authorization server core.
//!
//! The core owns the protocol state machines but none of the durable state
//! behind them: token minting and validation, client registrations, and
//! resource-owner credentials are all reached through the async traits in
//! this module, composed as `Arc<dyn Trait>`. The [`memory`] module provides
//! in-process implementations used by tests and demos.

pub mod client;
pub mod memory;
pub mod resource_owner;
pub mod token;

pub use client::ClientRegistry;
pub use memory::{MemoryClientRegistry, MemoryTokenStore, MemoryUserStore};
pub use resource_owner::ResourceOwnerAuthenticator;
pub use token::TokenStore;
