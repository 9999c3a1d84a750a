//! Application-wide UI state: who is signed in and whether page chrome shows.
//!
//! State transitions and persistence are separate:
//!
//! * [`reduce`] is a pure function `(&UiState, &Action) → UiState`.
//! * [`Action::effect`] describes what, if anything, must be written to or
//!   removed from [`SessionStorage`].
//! * [`Store::dispatch`] composes the two: reduce first, then apply the
//!   effect. Persistence is best-effort; a storage failure is logged and the
//!   in-memory state stands.
//!
//! The store is an ordinary value passed to whoever needs it; there is no
//! process-global instance.

use crate::error::StorageError;
use crate::session::{SessionStorage, TOKEN_KEY, USER_KEY};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Signed-in user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }
}

/// Opaque authentication token. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} chars>)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutSettings {
    pub header_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    pub user: Option<User>,
    pub token: Option<SessionToken>,
    pub layout: LayoutSettings,
}

impl UiState {
    /// True when a session token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// The four store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetUser(User, Option<SessionToken>),
    ClearUser,
    ShowHeader,
    HideHeader,
}

/// Side effect an action has on persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceEffect {
    /// Write the user entry and, when present, the token entry.
    Save {
        user: User,
        token: Option<SessionToken>,
    },
    /// Remove both the user and the token entries.
    Clear,
}

impl Action {
    pub fn effect(&self) -> Option<PersistenceEffect> {
        match self {
            Action::SetUser(user, token) => Some(PersistenceEffect::Save {
                user: user.clone(),
                token: token.clone(),
            }),
            Action::ClearUser => Some(PersistenceEffect::Clear),
            Action::ShowHeader | Action::HideHeader => None,
        }
    }
}

/// Pure state transition.
pub fn reduce(state: &UiState, action: &Action) -> UiState {
    let mut next = state.clone();
    match action {
        Action::SetUser(user, token) => {
            next.user = Some(user.clone());
            if token.is_some() {
                next.token = token.clone();
            }
        }
        Action::ClearUser => {
            next.user = None;
            next.token = None;
        }
        Action::ShowHeader => next.layout.header_visible = true,
        Action::HideHeader => next.layout.header_visible = false,
    }
    next
}

impl PersistenceEffect {
    /// Apply this effect to `storage`.
    pub fn apply<S: SessionStorage + ?Sized>(&self, storage: &mut S) -> Result<(), StorageError> {
        match self {
            PersistenceEffect::Save { user, token } => {
                let json = serde_json::to_string(user).map_err(|source| StorageError::Encode {
                    key: USER_KEY.into(),
                    source,
                })?;
                storage.set(USER_KEY, &json)?;
                if let Some(token) = token {
                    storage.set(TOKEN_KEY, token.as_str())?;
                }
                Ok(())
            }
            PersistenceEffect::Clear => {
                storage.remove(USER_KEY)?;
                storage.remove(TOKEN_KEY)
            }
        }
    }
}

/// State container owning its persistence backend.
pub struct Store<S: SessionStorage> {
    state: UiState,
    storage: S,
}

impl<S: SessionStorage> Store<S> {
    /// Start from the initial state (signed out, header hidden).
    pub fn new(storage: S) -> Self {
        Self {
            state: UiState::default(),
            storage,
        }
    }

    /// Start from whatever session `storage` already holds.
    ///
    /// Unreadable or malformed entries are logged and treated as absent.
    pub fn restore(storage: S) -> Self {
        let mut state = UiState::default();

        match storage.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => state.user = Some(user),
                Err(e) => warn!("Ignoring malformed stored user: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Could not read stored user: {}", e),
        }
        match storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => state.token = Some(SessionToken::new(token)),
            Ok(_) => {}
            Err(e) => warn!("Could not read stored token: {}", e),
        }

        debug!("Restored session: authenticated={}", state.is_authenticated());
        Self { state, storage }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Apply `action`: pure transition first, then its persistence effect.
    pub fn dispatch(&mut self, action: Action) {
        debug!("dispatch {:?}", action);
        self.state = reduce(&self.state, &action);
        if let Some(effect) = action.effect() {
            if let Err(e) = effect.apply(&mut self.storage) {
                warn!("Session persistence failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStorage;

    fn signed_in() -> Action {
        Action::SetUser(User::new("a@b.c"), Some(SessionToken::new("tok")))
    }

    #[test]
    fn initial_state_hides_header() {
        let state = UiState::default();
        assert!(!state.layout.header_visible);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn reduce_is_pure() {
        let before = UiState::default();
        let after = reduce(&before, &signed_in());
        assert_eq!(before, UiState::default());
        assert_eq!(after.user, Some(User::new("a@b.c")));
        assert!(after.is_authenticated());
    }

    #[test]
    fn header_actions_toggle_flag_without_effect() {
        let shown = reduce(&UiState::default(), &Action::ShowHeader);
        assert!(shown.layout.header_visible);
        assert!(!reduce(&shown, &Action::HideHeader).layout.header_visible);
        assert_eq!(Action::ShowHeader.effect(), None);
        assert_eq!(Action::HideHeader.effect(), None);
    }

    #[test]
    fn set_user_without_token_keeps_existing_token() {
        let state = reduce(&UiState::default(), &signed_in());
        let renamed = reduce(&state, &Action::SetUser(User::new("x@y.z"), None));
        assert_eq!(renamed.token, Some(SessionToken::new("tok")));
    }

    #[test]
    fn effects_apply_to_any_storage() {
        let mut storage = MemorySessionStorage::new();
        signed_in().effect().unwrap().apply(&mut storage).unwrap();
        let saved = storage.snapshot();
        assert_eq!(saved.get(TOKEN_KEY).map(String::as_str), Some("tok"));
        assert!(saved.get(USER_KEY).unwrap().contains("a@b.c"));

        Action::ClearUser.effect().unwrap().apply(&mut storage).unwrap();
        assert!(storage.snapshot().is_empty());
    }

    #[test]
    fn dispatch_persists_and_clear_removes() {
        let probe = MemorySessionStorage::new();
        let mut store = Store::new(probe.clone());

        store.dispatch(signed_in());
        assert_eq!(probe.snapshot().len(), 2);

        store.dispatch(Action::ClearUser);
        assert!(probe.snapshot().is_empty());
        assert_eq!(store.state().user, None);
        assert_eq!(store.state().token, None);
    }

    #[test]
    fn restore_reads_back_persisted_session() {
        let probe = MemorySessionStorage::new();
        Store::new(probe.clone()).dispatch(signed_in());

        let restored = Store::restore(probe);
        assert_eq!(restored.state().user, Some(User::new("a@b.c")));
        assert!(restored.state().is_authenticated());
        assert!(!restored.state().layout.header_visible);
    }

    #[test]
    fn restore_ignores_malformed_user() {
        let mut storage = MemorySessionStorage::new();
        storage.set(USER_KEY, "{not json").unwrap();
        let store = Store::restore(storage);
        assert_eq!(store.state().user, None);
    }

    #[test]
    fn token_debug_is_redacted() {
        let dbg = format!("{:?}", SessionToken::new("secret"));
        assert!(!dbg.contains("secret"));
    }
}
