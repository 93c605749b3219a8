//! Authentication state trait.

use crate::jwt::JwtConfig;

/// Trait for router state types that can verify access credentials.
pub trait HasAuthState {
    fn jwt(&self) -> &JwtConfig;
}
