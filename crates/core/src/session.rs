//! Session-scoped user context threaded through every sync call.

/// Reserved store scope for data recorded before sign-in.
pub const GUEST_SCOPE: &str = "guest";

/// Identifies whose data a call operates on.
///
/// Passed explicitly into every engine operation instead of living in a
/// process-wide "current user" global, so concurrent sessions and tests
/// never leak state into each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: Option<String>,
}

impl SessionContext {
    /// Context for the pre-authentication guest scope.
    pub fn guest() -> Self {
        Self { user_id: None }
    }

    /// Context for an authenticated user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// The authenticated user id, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Store scope key: the user id, or the reserved guest scope.
    pub fn scope(&self) -> &str {
        self.user_id.as_deref().unwrap_or(GUEST_SCOPE)
    }
}
