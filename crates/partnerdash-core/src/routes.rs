// ── Route table ──
//
// Static navigation targets with their title and access requirements.
// Patterns are literal segments or `:param` captures.

use std::collections::BTreeMap;

use crate::error::NavigationError;

pub const SIGN_IN_ROUTE: &str = "signin";
pub const FORBIDDEN_ROUTE: &str = "forbidden";

/// One navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    name: String,
    path: String,
    title: String,
    permission: Option<String>,
    role: Option<String>,
}

impl RouteDef {
    pub fn new(name: impl Into<String>, path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            title: title.into(),
            permission: None,
            role: None,
        }
    }

    /// Require a permission to enter.
    #[must_use]
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Require a role to enter.
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn required_permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn required_role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Match a concrete path, returning captured `:param` values.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut pattern = segments(&self.path);
        let mut actual = segments(path);

        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return Some(params),
                (Some(p), Some(a)) => {
                    if let Some(key) = p.strip_prefix(':') {
                        params.insert(key.to_owned(), a.to_owned());
                    } else if p != a {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Drop query string and fragment.
fn strip_suffixes(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    route: RouteDef,
    path: String,
    params: BTreeMap<String, String>,
}

impl Location {
    fn new(route: RouteDef, path: &str, params: BTreeMap<String, String>) -> Self {
        Self {
            route,
            path: path.to_owned(),
            params,
        }
    }

    pub fn route(&self) -> &RouteDef {
        &self.route
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

/// Ordered set of routes. The first matching pattern wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
    sign_in: RouteDef,
    forbidden: RouteDef,
}

impl RouteTable {
    pub fn new(sign_in: RouteDef, forbidden: RouteDef, routes: Vec<RouteDef>) -> Self {
        Self {
            routes,
            sign_in,
            forbidden,
        }
    }

    /// The partner dashboard's routes.
    pub fn dashboard() -> Self {
        let routes = vec![
            RouteDef::new("eCommerce", "/", "Dashboard"),
            RouteDef::new("calendar", "/calendar", "Calendar"),
            RouteDef::new("profile", "/profile", "Profile"),
            RouteDef::new("formElements", "/forms/form-elements", "Form Elements"),
            RouteDef::new("formLayout", "/forms/form-layout", "Form Layout"),
            RouteDef::new("tables", "/tables", "Tables"),
            RouteDef::new("settings", "/pages/settings", "Settings"),
            RouteDef::new("basicChart", "/charts/basic-chart", "Basic Chart"),
            RouteDef::new("alerts", "/ui-elements/alerts", "Alerts"),
            RouteDef::new("buttons", "/ui-elements/buttons", "Buttons"),
            RouteDef::new("signup", "/register", "Signup"),
            RouteDef::new("products.index", "/products", "Products"),
            RouteDef::new("products.create", "/product/create", "Vytvoriť produkt"),
            RouteDef::new("products.edit", "/product/edit/:id", "Upraviť produkt"),
            RouteDef::new("shops.index", "/shops", "Moje e-shopy").permission("view shop"),
        ];
        Self::new(
            RouteDef::new(SIGN_IN_ROUTE, "/login", "Signin"),
            RouteDef::new(FORBIDDEN_ROUTE, "/403", "Forbidden"),
            routes,
        )
    }

    pub fn sign_in(&self) -> &RouteDef {
        &self.sign_in
    }

    pub fn forbidden(&self) -> &RouteDef {
        &self.forbidden
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDef> {
        [&self.sign_in, &self.forbidden]
            .into_iter()
            .chain(self.routes.iter())
    }

    pub fn by_name(&self, name: &str) -> Option<&RouteDef> {
        self.iter().find(|r| r.name() == name)
    }

    /// Resolve a concrete path to a route.
    pub fn resolve(&self, path: &str) -> Result<Location, NavigationError> {
        let clean = strip_suffixes(path);
        self.iter()
            .find_map(|route| {
                route
                    .matches(clean)
                    .map(|params| Location::new(route.clone(), clean, params))
            })
            .ok_or_else(|| NavigationError::NotFound {
                path: path.to_owned(),
            })
    }

    pub(crate) fn sign_in_location(&self) -> Location {
        Location::new(self.sign_in.clone(), &self.sign_in.path, BTreeMap::new())
    }

    pub(crate) fn forbidden_location(&self) -> Location {
        Location::new(self.forbidden.clone(), &self.forbidden.path, BTreeMap::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_routes_match_exactly() {
        let route = RouteDef::new("tables", "/tables", "Tables");
        assert!(route.matches("/tables").is_some());
        assert!(route.matches("/tables/").is_some());
        assert!(route.matches("/tables/1").is_none());
        assert!(route.matches("/table").is_none());
    }

    #[test]
    fn root_matches_only_root() {
        let route = RouteDef::new("home", "/", "Dashboard");
        assert!(route.matches("/").is_some());
        assert!(route.matches("").is_some());
        assert!(route.matches("/shops").is_none());
    }

    #[test]
    fn params_are_captured() {
        let table = RouteTable::dashboard();
        let location = table.resolve("/product/edit/42?tab=images#top").unwrap();
        assert_eq!(location.route().name(), "products.edit");
        assert_eq!(location.path(), "/product/edit/42");
        assert_eq!(location.param("id"), Some("42"));
    }

    #[test]
    fn literal_wins_over_later_param() {
        let table = RouteTable::dashboard();
        let location = table.resolve("/product/create").unwrap();
        assert_eq!(location.route().name(), "products.create");
        assert!(location.params().is_empty());
    }

    #[test]
    fn unknown_path_is_not_found() {
        let table = RouteTable::dashboard();
        let err = table.resolve("/nowhere").unwrap_err();
        assert!(matches!(err, NavigationError::NotFound { ref path } if path == "/nowhere"));
    }

    #[test]
    fn dashboard_requirements() {
        let table = RouteTable::dashboard();
        let shops = table.by_name("shops.index").unwrap();
        assert_eq!(shops.required_permission(), Some("view shop"));
        assert_eq!(shops.required_role(), None);
        assert_eq!(table.sign_in().path(), "/login");
        assert_eq!(table.forbidden().path(), "/403");
        assert_eq!(table.resolve("/403").unwrap().route().name(), FORBIDDEN_ROUTE);
    }

    #[test]
    fn builder_sets_role() {
        let route = RouteDef::new("admin", "/admin", "Admin").role("admin");
        assert_eq!(route.required_role(), Some("admin"));
    }
}
