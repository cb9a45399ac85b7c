use anyhow::Result;

use crate::auth::SharedSession;

use super::routes::{RouteDescriptor, HOME_PATH, LOGIN_PATH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

/// Decide a single navigation attempt.
///
/// Protected routes without a token go to login, and the login page with a
/// token goes home. The login route never requires auth, so the two
/// redirect rules cannot both apply.
pub fn decide(to: &RouteDescriptor, authenticated: bool) -> GuardDecision {
    if to.requires_auth && !authenticated {
        GuardDecision::Redirect(LOGIN_PATH)
    } else if to.is_login() && authenticated {
        GuardDecision::Redirect(HOME_PATH)
    } else {
        GuardDecision::Allow
    }
}

/// Authentication guard consulted on every navigation.
///
/// Holds no state of its own: the session is read again on each check.
#[derive(Clone)]
pub struct RouteGuard {
    session: SharedSession,
}

impl RouteGuard {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    pub fn check(&self, to: &RouteDescriptor) -> Result<GuardDecision> {
        Ok(decide(to, self.session.is_authenticated()?))
    }
}
