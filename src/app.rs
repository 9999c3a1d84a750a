//! Application shell: the store, the current page and the auth flows.
//!
//! [`App`] is the one place that ties navigation to the store. Every
//! navigation goes through the [`RouteGuard`], then applies the header
//! policy for the page that actually ends up on screen.

use crate::api::ApiClient;
use crate::auth::{AuthService, Credentials, SignupPayload};
use crate::config::ClientConfig;
use crate::error::{ApiError, AuthError};
use crate::layout::{Layout, Screen};
use crate::notify::{NotificationLevel, SharedNotifier};
use crate::routing::{header_visibility, Resolution, Route, RouteGuard};
use crate::session::SessionStorage;
use crate::store::{Action, SessionToken, Store, UiState, User};
use crate::workflow::ConversionWorkflow;
use tracing::{debug, info, warn};

pub const TOAST_LOGIN_OK: &str = "Login successful!";
pub const TOAST_SIGNUP_OK: &str = "Account created successfully!";

/// Per-page form status: the inline error and whether a submit is pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub error: Option<String>,
    pub loading: bool,
}

pub struct App<S: SessionStorage> {
    config: ClientConfig,
    auth: AuthService,
    store: Store<S>,
    guard: RouteGuard,
    route: Route,
    form: FormState,
    notifier: SharedNotifier,
    workflow: ConversionWorkflow,
}

impl<S: SessionStorage> App<S> {
    /// Restore the session from `storage` and land on `/`.
    pub fn new(
        config: ClientConfig,
        storage: S,
        notifier: SharedNotifier,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let workflow = ConversionWorkflow::new(api.clone(), config.clone(), notifier.clone());

        let mut app = Self {
            auth: AuthService::new(api),
            store: Store::restore(storage),
            guard: RouteGuard,
            route: Route::Root,
            form: FormState::default(),
            config,
            notifier,
            workflow,
        };
        app.navigate(Route::Root.path());
        Ok(app)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &UiState {
        self.store.state()
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn workflow(&self) -> &ConversionWorkflow {
        &self.workflow
    }

    pub fn workflow_mut(&mut self) -> &mut ConversionWorkflow {
        &mut self.workflow
    }

    /// Go to `path`: guard, header policy, then record the page.
    pub fn navigate(&mut self, path: &str) -> Resolution {
        let resolution = self.guard.resolve(Route::parse(path), self.store.state());
        if let Resolution::Redirect { from, to } = resolution {
            debug!("Redirect {} → {}", from.path(), to.path());
        }

        let route = resolution.route();
        self.store
            .dispatch(header_visibility(route.path()).action());
        if route != self.route {
            self.form = FormState::default();
        }
        self.route = route;
        resolution
    }

    /// Sign in and, on success, go to the dashboard.
    ///
    /// The token is stored only when the server sent one. On failure the page
    /// stays where it is and [`FormState::error`] carries the message.
    pub async fn sign_in(&mut self, credentials: &Credentials) -> Result<Resolution, AuthError> {
        self.form = FormState {
            error: None,
            loading: true,
        };
        let result = self.auth.login(credentials).await;
        self.form.loading = false;

        match result {
            Ok(response) => {
                let token = response
                    .token
                    .filter(|t| !t.is_empty())
                    .map(SessionToken::new);
                if token.is_none() {
                    warn!("Sign-in succeeded without a token; session will not persist");
                }
                self.store
                    .dispatch(Action::SetUser(User::new(&credentials.email), token));
                info!("Signed in as {}", credentials.email);
                self.notifier
                    .notify(NotificationLevel::Success, TOAST_LOGIN_OK);
                Ok(self.navigate(Route::Dashboard.path()))
            }
            Err(e) => Err(self.form_failure(e)),
        }
    }

    /// Register and, on success, go to the sign-in page.
    pub async fn sign_up(&mut self, payload: &SignupPayload) -> Result<Resolution, AuthError> {
        self.form = FormState {
            error: None,
            loading: true,
        };
        let result = self.auth.signup(payload).await;
        self.form.loading = false;

        match result {
            Ok(_) => {
                info!("Registered {}", payload.email);
                self.notifier
                    .notify(NotificationLevel::Success, TOAST_SIGNUP_OK);
                Ok(self.navigate(Route::Login.path()))
            }
            Err(e) => Err(self.form_failure(e)),
        }
    }

    /// Forget the user and token, drop any dashboard state, go to sign-in.
    pub fn sign_out(&mut self) -> Resolution {
        self.store.dispatch(Action::ClearUser);
        self.workflow.clear();
        info!("Signed out");
        self.navigate(Route::Login.path())
    }

    /// Wrap `content` in the layout shell for the current header setting.
    pub fn screen<I, L>(&self, content: I) -> Screen
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Layout::compose(self.store.state(), content)
    }

    fn form_failure(&mut self, e: AuthError) -> AuthError {
        let message = e.message();
        warn!("{}", e);
        self.notifier.notify(NotificationLevel::Error, &message);
        self.form.error = Some(message);
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoopNotifier;
    use crate::session::{MemorySessionStorage, TOKEN_KEY, USER_KEY};
    use std::sync::Arc;

    fn app_with(storage: MemorySessionStorage) -> App<MemorySessionStorage> {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        App::new(config, storage, Arc::new(NoopNotifier)).unwrap()
    }

    #[test]
    fn starts_on_login_without_chrome() {
        let app = app_with(MemorySessionStorage::new());
        assert_eq!(app.route(), Route::Login);
        assert!(!app.state().layout.header_visible);
        assert!(!app.screen(["Sign in"]).has_chrome());
    }

    #[test]
    fn dashboard_without_session_redirects() {
        let mut app = app_with(MemorySessionStorage::new());
        let res = app.navigate("/dashboard");
        assert_eq!(
            res,
            Resolution::Redirect {
                from: Route::Dashboard,
                to: Route::Login
            }
        );
        assert_eq!(app.route(), Route::Login);
    }

    #[test]
    fn restored_session_reaches_dashboard_with_chrome() {
        let mut storage = MemorySessionStorage::new();
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, r#"{"email":"a@b.c"}"#).unwrap();

        let mut app = app_with(storage);
        assert_eq!(app.navigate("/dashboard"), Resolution::Render(Route::Dashboard));
        assert!(app.state().layout.header_visible);
        assert!(app.screen(["x"]).to_string().contains("a@b.c"));
    }

    #[test]
    fn sign_out_clears_storage_and_returns_to_login() {
        let mut storage = MemorySessionStorage::new();
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, r#"{"email":"a@b.c"}"#).unwrap();

        let mut app = app_with(storage.clone());
        app.navigate("/dashboard");
        let res = app.sign_out();

        assert_eq!(res.route(), Route::Login);
        assert!(storage.snapshot().is_empty());
        assert!(!app.state().is_authenticated());
    }

    #[test]
    fn signup_page_hides_chrome() {
        let mut app = app_with(MemorySessionStorage::new());
        assert_eq!(app.navigate("/signup"), Resolution::Render(Route::Signup));
        assert!(!app.state().layout.header_visible);
    }
}
