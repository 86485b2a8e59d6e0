use recall_core::model::UserId;

/// Seam for the ambient authentication context.
///
/// The save protocol requires a resolved identity; callers without one are
/// rejected before any I/O happens.
pub trait IdentityProvider: Send + Sync {
    /// Returns the currently authenticated user, if any.
    fn current_user(&self) -> Option<UserId>;
}

/// Provider with a fixed user, for binaries and tests that resolved
/// authentication out of band.
#[derive(Clone, Debug)]
pub struct StaticIdentity {
    user: UserId,
}

impl StaticIdentity {
    #[must_use]
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        Some(self.user.clone())
    }
}

/// Provider that never yields a user.
#[derive(Clone, Copy, Debug, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_user(&self) -> Option<UserId> {
        None
    }
}
