mod bearer;

pub use bearer::{bearer_guard, require_scopes, AuthContext, BearerError, ScopeError};
