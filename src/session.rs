//! Login session: one bearer token, persisted between runs.
//!
//! [`SessionStore`] is the single owner of the token. Code that needs to talk
//! to the API borrows the token from it; nothing reads the persisted file
//! directly.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, CampaignApi};
use crate::models::Credentials;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Login failed: {0}")]
    Login(#[from] ApiError),

    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Token storage error: {0}")]
    Storage(#[from] io::Error),
}

impl SessionError {
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, SessionError::Login(ApiError::InvalidCredentials))
    }
}

/// Durable home of the session token
pub trait TokenStore: Send {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&mut self, token: &str) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
}

/// Token kept in a single file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        fs::write(&self.path, token)
    }

    fn clear(&mut self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Token kept only for the life of the process
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.token = None;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { token: String },
}

pub struct SessionStore {
    state: SessionState,
    store: Box<dyn TokenStore>,
}

impl SessionStore {
    /// Start from whatever token the store already holds
    pub fn open(store: impl TokenStore + 'static) -> Result<Self, SessionError> {
        let state = match store.load()? {
            Some(token) => {
                info!("Restored saved session");
                SessionState::Authenticated { token }
            }
            None => SessionState::Anonymous,
        };
        Ok(Self {
            state,
            store: Box::new(store),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// Bearer token to attach to API calls, if any
    pub fn token(&self) -> Option<&str> {
        match self.state {
            SessionState::Authenticated { ref token } => Some(token.as_str()),
            SessionState::Anonymous => None,
        }
    }

    /// Exchange credentials for a token. On failure the previous state is
    /// left untouched.
    pub async fn login<A: CampaignApi + ?Sized>(
        &mut self,
        api: &A,
        username: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let response = api
            .login(&Credentials::new(username.trim(), password))
            .await?;

        if let Err(e) = self.store.save(&response.access_token) {
            warn!("Session token could not be saved, it will not survive a restart: {}", e);
        }
        self.state = SessionState::Authenticated {
            token: response.access_token,
        };
        info!("Session started for {}", username.trim());
        Ok(())
    }

    /// Drop the session whatever state it is in
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear saved session token: {}", e);
        }
        if self.is_authenticated() {
            info!("Session ended");
        }
        self.state = SessionState::Anonymous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryCampaignApi;
    use tempfile::TempDir;

    fn api() -> InMemoryCampaignApi {
        InMemoryCampaignApi::new().with_user("admin", "admin123")
    }

    #[tokio::test]
    async fn test_login_persists_token() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        let mut session = SessionStore::open(FileTokenStore::new(&path)).unwrap();
        assert_eq!(session.state(), &SessionState::Anonymous);

        session.login(&api(), "admin", "admin123").await.unwrap();

        assert!(session.is_authenticated());
        let saved = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Some(saved.as_str()), session.token());
    }

    #[tokio::test]
    async fn test_invalid_credentials_stay_anonymous() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        let mut session = SessionStore::open(FileTokenStore::new(&path)).unwrap();

        let err = session.login(&api(), "admin", "wrong").await.unwrap_err();

        assert!(err.is_invalid_credentials());
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_blank_credentials_never_reach_the_api() {
        let mut session = SessionStore::open(MemoryTokenStore::default()).unwrap();
        let err = session.login(&api(), "  ", "admin123").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingCredentials));
    }

    #[test]
    fn test_session_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        std::fs::write(&path, "abc\n").unwrap();

        let session = SessionStore::open(FileTokenStore::new(&path)).unwrap();
        assert_eq!(session.token(), Some("abc"));
    }

    #[test]
    fn test_logout_clears_from_any_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        std::fs::write(&path, "abc").unwrap();

        let mut session = SessionStore::open(FileTokenStore::new(&path)).unwrap();
        session.logout();
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(!path.exists());

        // Logging out again is harmless
        session.logout();
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_empty_token_file_is_anonymous() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();

        let session = SessionStore::open(FileTokenStore::new(&path)).unwrap();
        assert!(!session.is_authenticated());
    }
}
