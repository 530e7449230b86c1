//! Access tokens, the one-shot bootstrap credential, and the session slot
//!
//! A bootstrap credential can be supplied through configuration so the app
//! is usable without going through the OAuth flow. It is handed out exactly
//! once; after that, signing out really signs out.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::config::AuthConfig;

/// OAuth access token for the Graph API
///
/// The value is zeroed on drop and never shown by `Debug`.
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for AccessToken {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Credential used to sign in without the OAuth flow
#[derive(Debug, Clone)]
pub struct BootstrapCredential {
    pub access_token: AccessToken,
    pub user_id: Option<String>,
}

/// Owner of the bootstrap credential
#[derive(Debug, Default)]
pub struct AuthContext {
    bootstrap: Option<BootstrapCredential>,
}

impl AuthContext {
    pub fn new(bootstrap: Option<BootstrapCredential>) -> Self {
        Self { bootstrap }
    }

    /// Bootstrap credential from configuration
    ///
    /// Both the token and the user id are required; with only one of them
    /// there is no bootstrap credential.
    pub fn from_config(config: &AuthConfig) -> Self {
        let token = config
            .initial_access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty());
        let user_id = config
            .initial_user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let bootstrap = match (token, user_id) {
            (Some(token), Some(user_id)) => Some(BootstrapCredential {
                access_token: AccessToken::new(token),
                user_id: Some(user_id.to_string()),
            }),
            (Some(_), None) => {
                tracing::warn!("Initial access token set without initial user id; ignoring it");
                None
            }
            _ => None,
        };
        Self { bootstrap }
    }

    pub fn has_bootstrap(&self) -> bool {
        self.bootstrap.is_some()
    }

    /// Hand out the bootstrap credential; later calls return `None`
    pub fn take_bootstrap(&mut self) -> Option<BootstrapCredential> {
        self.bootstrap.take()
    }
}

/// The signed-in user's credentials
#[derive(Debug, Default)]
pub struct Session {
    access_token: Option<AccessToken>,
    user_id: Option<String>,
}

impl Session {
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn sign_in(&mut self, credential: BootstrapCredential) {
        self.access_token = Some(credential.access_token);
        self.user_id = credential.user_id;
    }

    pub fn clear(&mut self) {
        self.access_token = None;
        self.user_id = None;
    }

    /// Token for the current request, signing in with the bootstrap
    /// credential if nobody is signed in yet
    pub fn resolve(&mut self, auth: &mut AuthContext) -> Option<AccessToken> {
        if self.access_token.is_none() {
            if let Some(credential) = auth.take_bootstrap() {
                tracing::info!("Signing in with bootstrap credential");
                self.sign_in(credential);
            }
        }
        self.access_token.clone()
    }
}
