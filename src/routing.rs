//! Route table, header-visibility policy and the authenticated-route guard.

use crate::store::{Action, UiState};

/// Path prefixes on which the header/footer chrome is hidden.
pub const NO_CHROME_PREFIXES: [&str; 3] = ["/login", "/signup", "/404"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    /// The store mutation that applies this decision.
    pub fn action(self) -> Action {
        match self {
            Visibility::Visible => Action::ShowHeader,
            Visibility::Hidden => Action::HideHeader,
        }
    }
}

/// Decide whether the chrome shows on `path`.
///
/// Prefix match, so `/login/extra` is hidden too.
pub fn header_visibility(path: &str) -> Visibility {
    if NO_CHROME_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        Visibility::Hidden
    } else {
        Visibility::Visible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Signup,
    Dashboard,
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        match path.trim_end_matches('/') {
            "" => Route::Root,
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/dashboard" => Route::Dashboard,
            _ => Route::NotFound,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Dashboard => "/dashboard",
            Route::NotFound => "/404",
        }
    }

    pub fn requires_session(self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// Outcome of guarding a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect { from: Route, to: Route },
}

impl Resolution {
    /// The route that ends up on screen.
    pub fn route(self) -> Route {
        match self {
            Resolution::Render(r) => r,
            Resolution::Redirect { to, .. } => to,
        }
    }
}

/// Checks session presence before rendering authenticated routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn resolve(&self, route: Route, state: &UiState) -> Resolution {
        match route {
            Route::Root => Resolution::Redirect {
                from: route,
                to: Route::Login,
            },
            r if r.requires_session() && !state.is_authenticated() => Resolution::Redirect {
                from: r,
                to: Route::Login,
            },
            r => Resolution::Render(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{reduce, SessionToken, User};

    #[test]
    fn deny_list_prefixes_hide_chrome() {
        for path in ["/login", "/signup", "/404", "/login/extra", "/signup?ref=x", "/404/deep"] {
            assert_eq!(header_visibility(path), Visibility::Hidden, "{path}");
        }
    }

    #[test]
    fn other_paths_show_chrome() {
        for path in ["/", "/dashboard", "/dashboard/settings", "/profile", ""] {
            assert_eq!(header_visibility(path), Visibility::Visible, "{path}");
        }
    }

    #[test]
    fn prefix_match_is_plain_string_prefix() {
        assert_eq!(header_visibility("/loginhelp"), Visibility::Hidden);
        assert_eq!(header_visibility("/x/login"), Visibility::Visible);
    }

    #[test]
    fn visibility_maps_to_store_actions() {
        assert_eq!(Visibility::Visible.action(), Action::ShowHeader);
        assert_eq!(Visibility::Hidden.action(), Action::HideHeader);
    }

    #[test]
    fn route_parsing() {
        assert_eq!(Route::parse("/"), Route::Root);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/signup/"), Route::Signup);
        assert_eq!(Route::parse("/dashboard?x=1"), Route::Dashboard);
        assert_eq!(Route::parse("/nope"), Route::NotFound);
    }

    #[test]
    fn root_redirects_to_login() {
        let r = RouteGuard.resolve(Route::Root, &UiState::default());
        assert_eq!(r.route(), Route::Login);
    }

    #[test]
    fn dashboard_requires_session() {
        let guard = RouteGuard;
        let anonymous = UiState::default();
        assert_eq!(
            guard.resolve(Route::Dashboard, &anonymous),
            Resolution::Redirect {
                from: Route::Dashboard,
                to: Route::Login
            }
        );

        let signed_in = reduce(
            &anonymous,
            &Action::SetUser(User::new("a@b.c"), Some(SessionToken::new("t"))),
        );
        assert_eq!(
            guard.resolve(Route::Dashboard, &signed_in),
            Resolution::Render(Route::Dashboard)
        );
    }

    #[test]
    fn public_routes_render_for_anyone() {
        for route in [Route::Login, Route::Signup, Route::NotFound] {
            assert_eq!(
                RouteGuard.resolve(route, &UiState::default()),
                Resolution::Render(route)
            );
        }
    }
}
