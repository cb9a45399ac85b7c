/// Path of the login page; the guard sends unauthenticated users here.
pub const LOGIN_PATH: &str = "/login";

/// Path of the home page; authenticated users visiting login land here.
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: &'static str,
    pub name: &'static str,
    /// Name of the view rendered for this route. Opaque to the router.
    pub component: &'static str,
    pub requires_auth: bool,
}

impl RouteDescriptor {
    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }
}

/// The application's routes, in matching order.
pub const ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor {
        path: HOME_PATH,
        name: "Home",
        component: "Home",
        requires_auth: true,
    },
    RouteDescriptor {
        path: LOGIN_PATH,
        name: "Login",
        component: "Login",
        requires_auth: false,
    },
    RouteDescriptor {
        path: "/individual-selection",
        name: "IndividualSelection",
        component: "IndividualSelection",
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/team-selection",
        name: "TeamSelection",
        component: "TeamSelection",
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/success",
        name: "Success",
        component: "Success",
        requires_auth: true,
    },
];

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(ROUTES.to_vec())
    }
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    /// Look up a route by path. Query string, fragment and a trailing slash
    /// are ignored.
    pub fn find(&self, path: &str) -> Option<&RouteDescriptor> {
        let path = normalize_path(path);
        self.routes.iter().find(|r| r.path == path)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.name == name)
    }
}

fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        HOME_PATH
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_route_does_not_require_auth() {
        let table = RouteTable::default();
        let login = table.find(LOGIN_PATH).unwrap();
        assert!(login.is_login());
        assert!(!login.requires_auth);
    }

    #[test]
    fn test_every_other_route_requires_auth() {
        let table = RouteTable::default();
        assert!(table
            .iter()
            .filter(|r| !r.is_login())
            .all(|r| r.requires_auth));
    }

    #[test]
    fn test_find_normalizes_path() {
        let table = RouteTable::default();
        assert_eq!(table.find("/success/").unwrap().name, "Success");
        assert_eq!(table.find("/team-selection?thesis=3").unwrap().name, "TeamSelection");
        assert_eq!(table.find("/login#top").unwrap().name, "Login");
        assert_eq!(table.find("").unwrap().name, "Home");
        assert_eq!(table.find("/?tab=2").unwrap().name, "Home");
        assert!(table.find("/admin").is_none());
    }

    #[test]
    fn test_find_by_name() {
        let table = RouteTable::default();
        assert_eq!(table.find_by_name("IndividualSelection").unwrap().path, "/individual-selection");
        assert!(table.find_by_name("Missing").is_none());
    }
}
