//! Authentication: access-credential verification at the request boundary
//! and the orchestrator behind the `/auth` flows.
//!
//! Dual-credential scheme: short-lived signed access tokens (stateless,
//! verified by signature + expiry) and long-lived opaque refresh tokens
//! (one database row per device, revocable, rotated by replacement).

mod errors;
mod extractors;
mod service;
mod state;

pub use errors::AuthError;
pub use extractors::{AuthRejection, AuthUser, bearer_token};
pub use service::{AuthService, LoginTokens};
pub use state::HasAuthState;
