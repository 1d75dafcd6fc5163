use argon2::{self, Config};
use chrono::prelude::*;

use rand::Rng;
use std::future;
use tracing::{Level, event, instrument};
use warp::Filter;
use warp::http::StatusCode;

use crate::store::Store;
use crate::types::account::{Profile, ProfileId, Session};

/// Symmetric key for PASETO local tokens. Always 32 bytes.
#[derive(Clone)]
pub struct TokenKey(Vec<u8>);

impl TokenKey {
    pub const LENGTH: usize = 32;

    pub fn new(key: &str) -> Result<Self, handle_errors::Error> {
        if key.len() != Self::LENGTH {
            return Err(handle_errors::Error::ConfigError(format!(
                "PASETO_KEY must be exactly {} bytes long",
                Self::LENGTH
            )));
        }
        Ok(TokenKey(key.as_bytes().to_vec()))
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("TokenKey(..)")
    }
}

pub fn verify_token(token: String, key: &TokenKey) -> Result<Session, handle_errors::Error> {
    let token = paseto::tokens::validate_local_token(
        &token,
        None,
        &key.0,
        &paseto::tokens::TimeBackend::Chrono,
    )
    .map_err(|_| handle_errors::Error::CannotDecryptToken)?;

    serde_json::from_value::<Session>(token).map_err(|_| handle_errors::Error::CannotDecryptToken)
}

#[instrument(skip(store, profile), fields(username = %profile.username))]
pub async fn register(store: Store, profile: Profile) -> Result<impl warp::Reply, warp::Rejection> {
    let hashed_password = hash_password(profile.password.as_bytes())?;

    let profile = Profile {
        id: profile.id,
        username: profile.username,
        password: hashed_password,
    };

    match store.add_profile(profile).await {
        Ok(_) => Ok(warp::reply::with_status("Profile added", StatusCode::OK)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}

pub fn hash_password(password: &[u8]) -> Result<String, handle_errors::Error> {
    let salt = rand::thread_rng().r#gen::<[u8; 32]>();
    let config = Config::default();
    argon2::hash_encoded(password, &salt, &config).map_err(handle_errors::Error::ArgonLibraryError)
}

#[instrument(skip(store, key, login), fields(username = %login.username))]
pub async fn login(
    store: Store,
    key: TokenKey,
    login: Profile,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = store
        .get_profile(login.username)
        .await
        .map_err(|e| match e {
            handle_errors::Error::DatabaseQueryError(sqlx::Error::RowNotFound) => {
                event!(Level::WARN, "unknown profile");
                warp::reject::custom(handle_errors::Error::WrongPassword)
            }
            e => warp::reject::custom(e),
        })?;

    match verify_password(&profile.password, login.password.as_bytes()) {
        Ok(true) => {
            let profile_id = profile
                .id
                .ok_or_else(|| warp::reject::custom(handle_errors::Error::CannotIssueToken))?;
            Ok(warp::reply::json(&issue_token(profile_id, &key)?))
        }
        Ok(false) => Err(warp::reject::custom(handle_errors::Error::WrongPassword)),
        Err(e) => Err(warp::reject::custom(
            handle_errors::Error::ArgonLibraryError(e),
        )),
    }
}

fn verify_password(hash: &str, password: &[u8]) -> Result<bool, argon2::Error> {
    argon2::verify_encoded(hash, password)
}

/// Issues a token valid for one day for `profile_id`.
pub fn issue_token(profile_id: ProfileId, key: &TokenKey) -> Result<String, handle_errors::Error> {
    let current_date_time = Utc::now();
    let dt = current_date_time + chrono::Duration::days(1);

    paseto::tokens::PasetoBuilder::new()
        .set_encryption_key(&key.0)
        .set_expiration(&dt)
        .set_not_before(&current_date_time)
        .set_claim("profile_id", serde_json::json!(profile_id))
        .build()
        .map_err(|_| handle_errors::Error::CannotIssueToken)
}

pub fn auth(key: TokenKey) -> impl Filter<Extract = (Session,), Error = warp::Rejection> + Clone {
    warp::header::<String>("Authorization").and_then(move |token: String| {
        let session = match verify_token(token, &key) {
            Ok(session) => Ok(session),
            Err(e) => Err(warp::reject::custom(e)),
        };

        future::ready(session)
    })
}

/// Deletes the caller's profile; its questions go with it.
#[instrument(skip(store))]
pub async fn delete_profile(
    session: Session,
    store: Store,
) -> Result<impl warp::Reply, warp::Rejection> {
    match store.delete_profile(session.profile_id).await {
        Ok(true) => Ok(warp::reply::with_status("Profile deleted", StatusCode::OK)),
        Ok(false) => Err(warp::reject::custom(handle_errors::Error::Unauthorized)),
        Err(e) => Err(warp::reject::custom(e)),
    }
}
