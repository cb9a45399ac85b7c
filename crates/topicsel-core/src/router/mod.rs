//! Client-side routing with an authentication guard.
//!
//! `Router` resolves a path against the static route table and runs the
//! guard on it. Redirects issued by the guard are followed, and the guard
//! runs again on each redirect target.

pub mod guard;
pub mod routes;

use anyhow::{anyhow, bail, Result};
use tracing::debug;

use crate::auth::SharedSession;

pub use guard::{decide, GuardDecision, RouteGuard};
pub use routes::{RouteDescriptor, RouteTable, HOME_PATH, LOGIN_PATH, ROUTES};

/// Upper bound on guard redirects followed for a single navigation.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Navigation lands on `route`. `redirected_from` is the originally
    /// requested path when the guard sent the user elsewhere.
    Proceed {
        route: RouteDescriptor,
        redirected_from: Option<String>,
    },
    NotFound(String),
}

impl Navigation {
    pub fn route(&self) -> Option<&RouteDescriptor> {
        match self {
            Navigation::Proceed { route, .. } => Some(route),
            Navigation::NotFound(_) => None,
        }
    }

    pub fn path(&self) -> Option<&'static str> {
        self.route().map(|r| r.path)
    }

    pub fn was_redirected(&self) -> bool {
        matches!(self, Navigation::Proceed { redirected_from: Some(_), .. })
    }
}

#[derive(Clone)]
pub struct Router {
    table: RouteTable,
    guard: RouteGuard,
}

impl Router {
    pub fn new(session: SharedSession) -> Self {
        Self::with_table(RouteTable::default(), session)
    }

    pub fn with_table(table: RouteTable, session: SharedSession) -> Self {
        Self {
            table,
            guard: RouteGuard::new(session),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve a navigation attempt to `path`.
    pub fn navigate(&self, path: &str) -> Result<Navigation> {
        let Some(mut target) = self.table.find(path) else {
            debug!(path = path, "No route matches");
            return Ok(Navigation::NotFound(path.to_string()));
        };
        let mut redirected_from: Option<String> = None;

        for _ in 0..=MAX_REDIRECTS {
            match self.guard.check(target)? {
                GuardDecision::Allow => {
                    return Ok(Navigation::Proceed {
                        route: *target,
                        redirected_from,
                    });
                }
                GuardDecision::Redirect(next) => {
                    debug!(from = target.path, to = next, "Guard redirect");
                    redirected_from.get_or_insert_with(|| path.to_string());
                    target = self
                        .table
                        .find(next)
                        .ok_or_else(|| anyhow!("Redirect target {} is not in the route table", next))?;
                }
            }
        }

        bail!("Too many redirects navigating to {}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::{MemoryTokenStore, TokenStore};

    fn router(token: Option<&str>) -> (Router, Arc<MemoryTokenStore>) {
        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        (Router::new(store.clone()), store)
    }

    #[test]
    fn test_requires_auth_without_token_lands_on_login() {
        let (router, _) = router(None);
        let nav = router.navigate("/individual-selection").unwrap();
        assert_eq!(nav.path(), Some("/login"));
        assert!(nav.was_redirected());
        assert_eq!(
            nav,
            Navigation::Proceed {
                route: *router.table().find("/login").unwrap(),
                redirected_from: Some("/individual-selection".to_string()),
            }
        );
    }

    #[test]
    fn test_login_with_token_lands_on_home() {
        let (router, _) = router(Some("tok"));
        let nav = router.navigate("/login").unwrap();
        assert_eq!(nav.path(), Some("/"));
        assert!(nav.was_redirected());
    }

    #[test]
    fn test_public_route_without_token_unchanged() {
        let (router, _) = router(None);
        let nav = router.navigate("/login").unwrap();
        assert_eq!(nav.path(), Some("/login"));
        assert!(!nav.was_redirected());
    }

    #[test]
    fn test_protected_route_with_token_unchanged() {
        let (router, _) = router(Some("tok"));
        let nav = router.navigate("/success").unwrap();
        assert_eq!(nav.path(), Some("/success"));
        assert!(!nav.was_redirected());
    }

    #[test]
    fn test_empty_token_treated_as_logged_out() {
        let (router, _) = router(Some(""));
        assert_eq!(router.navigate("/").unwrap().path(), Some("/login"));
    }

    #[test]
    fn test_guard_rereads_session_each_navigation() {
        let (router, store) = router(None);
        assert_eq!(router.navigate("/").unwrap().path(), Some("/login"));

        store.set("fresh").unwrap();
        assert_eq!(router.navigate("/").unwrap().path(), Some("/"));
        assert_eq!(router.navigate("/login").unwrap().path(), Some("/"));

        store.clear().unwrap();
        assert_eq!(router.navigate("/team-selection").unwrap().path(), Some("/login"));
    }

    #[test]
    fn test_unknown_path_not_found() {
        let (router, _) = router(Some("tok"));
        assert_eq!(
            router.navigate("/nowhere").unwrap(),
            Navigation::NotFound("/nowhere".to_string())
        );
    }

    #[test]
    fn test_redirect_loop_is_an_error() {
        // A table whose login page itself requires auth never settles
        let table = RouteTable::new(vec![RouteDescriptor {
            path: LOGIN_PATH,
            name: "Login",
            component: "Login",
            requires_auth: true,
        }]);
        let router = Router::with_table(table, Arc::new(MemoryTokenStore::new()));
        assert!(router.navigate(LOGIN_PATH).is_err());
    }

    #[test]
    fn test_missing_redirect_target_is_an_error() {
        let table = RouteTable::new(vec![RouteDescriptor {
            path: "/private",
            name: "Private",
            component: "Private",
            requires_auth: true,
        }]);
        let router = Router::with_table(table, Arc::new(MemoryTokenStore::new()));
        let err = router.navigate("/private").unwrap_err();
        assert!(err.to_string().contains("/login"));
    }
}
