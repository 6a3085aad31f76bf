use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use log::{info, warn};

use crate::error::{Error, HtmlError};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_hours: i64,
    pub app_origin: String,
    pub image_dir: PathBuf,
    pub image_public_url: String,
    pub google_client_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::from("postgres://localhost/foodflow"),
            jwt_secret: String::from("development-secret"),
            session_hours: 1,
            app_origin: String::from("http://localhost:3000"),
            image_dir: PathBuf::from("./uploads"),
            image_public_url: String::from("http://localhost:3000/uploads"),
            google_client_id: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        let app_origin: String = try_load("APP_ORIGIN", "http://localhost:3000")?;
        let image_public_url = try_load("IMAGE_PUBLIC_URL", &format!("{app_origin}/uploads"))?;

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            jwt_secret: var("JWT_SECRET").or_else(|_| read_secret("JWT_SECRET"))?,
            session_hours: try_load("SESSION_HOURS", "1")?,
            image_dir: try_load("IMAGE_DIR", "./uploads")?,
            image_public_url,
            google_client_id: var("GOOGLE_CLIENT_ID").ok(),
            app_origin,
        })
    }

    pub fn oauth_redirect_url(&self) -> String {
        format!("{}/auth/callback", self.app_origin.trim_end_matches('/'))
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not found");
    })
}

fn require(key: &str) -> Result<String, Error> {
    var(key).map_err(|_| {
        HtmlError::InternalServerError.new(&format!("Environment misconfigured: {key} is required"))
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, Error>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            HtmlError::InternalServerError.new(&format!("Environment misconfigured: {key}"))
        })
}

fn read_secret(secret_name: &str) -> Result<String, Error> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            HtmlError::InternalServerError.new(&format!("Secrets misconfigured: {secret_name}"))
        })
}
