use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// Claims carried by a login token.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    pub exp: DateTime<Utc>,
    pub profile_id: ProfileId,
    pub nbf: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Profile {
    pub id: Option<ProfileId>,
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileId(pub i32);
