use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use crate::constants::SESSION_COOKIE;

use super::jwt::{verify_jwt_session, SessionData};

pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}")
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

pub fn with_auth(secret: Arc<str>) -> impl Filter<Extract = ((),), Error = Rejection> + Clone {
    with_session(secret).map(|_session: SessionData| ())
}

pub fn with_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::<String>(SESSION_COOKIE).and_then(move |session: String| {
        let secret = secret.clone();
        async move {
            verify_jwt_session(&session, &secret)
                .map(SessionData::from)
                .map_err(warp::reject::custom)
        }
    })
}

pub fn with_possible_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(move |session: Option<String>| {
        session
            .and_then(|session| verify_jwt_session(&session, &secret).ok())
            .map(SessionData::from)
    })
    .and_then(|session: Option<SessionData>| async move { Ok::<_, Rejection>(session) })
}
