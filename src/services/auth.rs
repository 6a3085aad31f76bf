use std::sync::Arc;

use chrono::Duration;
use url::Url;

use crate::{
    config::Config,
    constants::MIN_PASSWORD_LENGTH,
    cryptography::{generate_access_token, hash_password, verify_password},
    error::{Error, HtmlError},
    jwt::{generate_jwt_session, verify_jwt_session},
    middleware::clear_session_cookie,
    schema::User,
    store::UserStore,
};

const SIGN_IN_FAILED: &str = "Erreur de connexion. Vérifiez vos identifiants.";
const SIGN_UP_FAILED: &str = "Erreur lors de l'inscription. Veuillez réessayer.";
const GOOGLE_FAILED: &str = "Erreur lors de la connexion avec Google";
const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl TryFrom<&str> for OAuthProvider {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "google" => Ok(Self::Google),
            _ => Err(HtmlError::InvalidRequest.new("Unsupported OAuth provider")),
        }
    }
}

/// Where to send the browser, plus the `state` to check on the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub url: String,
    pub state: String,
}

/// Checks the password policy, returning the first violated rule.
pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(HtmlError::InvalidRequest.new(&format!(
            "Le mot de passe doit contenir au moins {MIN_PASSWORD_LENGTH} caractères"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(HtmlError::InvalidRequest.new(
            "Le mot de passe doit contenir au moins 1 chiffre",
        ));
    }

    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: Arc<Config>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: Arc<Config>) -> Self {
        Self { users, config }
    }

    /// Signing secret, in the shape the warp session filters take.
    pub fn secret(&self) -> Arc<str> {
        Arc::from(self.config.jwt_secret.as_str())
    }

    fn session_lifetime(&self) -> Duration {
        Duration::hours(self.config.session_hours)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, Error> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(HtmlError::InvalidRequest.new("Adresse email invalide"));
        }
        validate_password(password)?;

        let hash = hash_password(password)?;
        match self.users.register_user(&email, Some(&hash)).await {
            Ok(Some(user)) => {
                log::info!("> Registered user {}", user.id);
                Ok(user)
            }
            Ok(None) => {
                log::warn!("> Sign up with an already registered email");
                Err(HtmlError::InvalidRequest.new(SIGN_UP_FAILED))
            }
            Err(e) => {
                log::error!("> Sign up failed: {e}");
                Err(HtmlError::InternalServerError.new(SIGN_UP_FAILED))
            }
        }
    }

    /// Returns a session token for valid credentials.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, Error> {
        let user = match self.users.get_user_by_email(&normalize_email(email)).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                log::warn!("> Sign in with an unknown email");
                return Err(HtmlError::InvalidSession.new(SIGN_IN_FAILED));
            }
            Err(e) => {
                log::error!("> Sign in lookup failed: {e}");
                return Err(HtmlError::InvalidSession.new(SIGN_IN_FAILED));
            }
        };

        let verified = user
            .password
            .as_deref()
            .map(|hash| verify_password(password, hash))
            .unwrap_or(false);
        if !verified {
            log::warn!("> Sign in with a wrong password for {}", user.id);
            return Err(HtmlError::InvalidSession.new(SIGN_IN_FAILED));
        }

        generate_jwt_session(&user, &self.config.jwt_secret, self.session_lifetime())
            .map_err(|_| HtmlError::InternalServerError.new(SIGN_IN_FAILED))
    }

    /// The signed-in user, or `None` for a missing, invalid or expired token.
    pub async fn get_user(&self, token: Option<&str>) -> Option<User> {
        let session = verify_jwt_session(token?, &self.config.jwt_secret).ok()?;

        match self.users.get_user_by_id(session.user_id).await {
            Ok(user) => user,
            Err(e) => {
                log::error!("> Failed to load session user: {e}");
                None
            }
        }
    }

    /// Sessions are stateless; signing out only clears the cookie.
    pub fn sign_out(&self) -> String {
        clear_session_cookie()
    }

    pub fn sign_in_with_oauth(&self, provider: OAuthProvider) -> Result<OAuthRedirect, Error> {
        match provider {
            OAuthProvider::Google => {
                let client_id = self.config.google_client_id.as_deref().ok_or_else(|| {
                    log::error!("> GOOGLE_CLIENT_ID is not configured");
                    HtmlError::InternalServerError.new(GOOGLE_FAILED)
                })?;
                let state = generate_access_token(32);

                let mut url = Url::parse(GOOGLE_AUTHORIZE_URL)
                    .map_err(|_| HtmlError::InternalServerError.new(GOOGLE_FAILED))?;
                url.query_pairs_mut()
                    .append_pair("client_id", client_id)
                    .append_pair("redirect_uri", &self.config.oauth_redirect_url())
                    .append_pair("response_type", "code")
                    .append_pair("scope", "openid email")
                    .append_pair("state", &state);

                Ok(OAuthRedirect {
                    url: url.to_string(),
                    state,
                })
            }
        }
    }
}
