//! Route table of the admin console.

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";
/// Where a signed-in user lands by default.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Per-route metadata consumed by the navigation guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    /// Display title of the view.
    pub title: Option<String>,
    /// Whether the view may only mount with an active session.
    pub requires_auth: bool,
}

/// A single route. Segments starting with `:` match any value.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub meta: Option<RouteMeta>,
    /// Path to redirect to instead of mounting.
    pub redirect: Option<String>,
}

impl Route {
    pub fn new(path: &str, name: &str) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            meta: None,
            redirect: None,
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.meta.get_or_insert_with(RouteMeta::default).title = Some(title.to_string());
        self
    }

    pub fn protected(mut self) -> Self {
        self.meta.get_or_insert_with(RouteMeta::default).requires_auth = true;
        self
    }

    pub fn redirect_to(mut self, path: &str) -> Self {
        self.redirect = Some(path.to_string());
        self
    }

    pub fn requires_auth(&self) -> bool {
        self.meta.as_ref().map(|m| m.requires_auth).unwrap_or(false)
    }

    pub fn title(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.title.as_deref())
    }

    fn matches(&self, path: &str) -> bool {
        let pattern: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        pattern.len() == actual.len()
            && pattern
                .iter()
                .zip(&actual)
                .all(|(p, a)| p.starts_with(':') || p == a)
    }
}

/// Ordered route table; the first matching route wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Routes of the WAF admin console.
    pub fn admin_console() -> Self {
        Self::new(vec![
            Route::new(LOGIN_PATH, "login").titled("Login"),
            Route::new("/", "root").redirect_to(DASHBOARD_PATH),
            Route::new(DASHBOARD_PATH, "dashboard")
                .titled("Dashboard")
                .protected(),
            Route::new("/rules", "rules").titled("Rules").protected(),
            Route::new("/rules/:id", "rule-detail")
                .titled("Rule Detail")
                .protected(),
            Route::new("/logs", "logs").titled("Attack Logs").protected(),
            Route::new("/logs/:id", "log-detail")
                .titled("Attack Log Detail")
                .protected(),
            Route::new("/policies", "policies")
                .titled("Policies")
                .protected(),
            Route::new("/domains", "domains").titled("Domains").protected(),
            Route::new("/blacklists", "blacklists")
                .titled("Blacklists")
                .protected(),
            Route::new("/whitelists", "whitelists")
                .titled("Whitelists")
                .protected(),
            Route::new("/settings", "settings")
                .titled("Settings")
                .protected(),
        ])
    }

    /// Find the route for a path, if any.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(path))
    }
}
