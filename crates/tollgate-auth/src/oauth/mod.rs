//! OAuth 2.0 protocol state machines and wire formatting.

pub mod authorize;
pub mod authorize_endpoint;
pub mod client_auth;
pub mod redirect;
pub mod session;
pub mod token;
pub mod token_endpoint;

pub use authorize::{AuthorizationRequest, AuthorizeOutcome, ConsentDecision, ParameterPlacement};
pub use authorize_endpoint::AuthorizationEndpoint;
pub use redirect::RedirectionUri;
pub use session::{AuthorizationSession, SessionRegistry};
pub use token::{TokenEndpointReply, TokenRequest, TokenResponse};
pub use token_endpoint::TokenEndpoint;
