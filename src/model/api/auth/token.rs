use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use mongodb::bson::doc;
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{db::admin::Admin, mongodb::Coll};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";
const BEARER_PREFIX: &str = "Bearer ";

/// Proof that the request was made by a logged-in admin. Used as a request
/// guard on every admin-only route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    pub admin_id: String,
}

/// Returned by a successful admin login, alongside the cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

impl AuthToken {
    pub fn new(admin: &Admin) -> Self {
        Self {
            admin_id: admin.admin_id.clone(),
        }
    }

    /// Sign this token into a JWT that expires after the configured TTL.
    pub fn encode(&self, config: &Config) -> Result<String> {
        let claims = Claims {
            token: self.clone(),
            expire_at: Utc::now() + config.auth_ttl(),
        };
        let jwt = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(jwt)
    }

    /// Verify a JWT and extract the token from it.
    pub fn decode(jwt: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            jwt,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }

    /// Wrap a signed JWT in the auth cookie.
    pub fn cookie(jwt: String, config: &Config) -> Cookie<'static> {
        Cookie::build(AUTH_TOKEN_COOKIE, jwt)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .finish()
    }
}

/// JWT claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Collect the raw JWTs on offer: the cookie first, then the `Authorization` header.
fn raw_tokens(req: &Request<'_>) -> Vec<String> {
    let cookie = req
        .cookies()
        .get(AUTH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let header = req
        .headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix(BEARER_PREFIX))
        .map(|jwt| jwt.trim().to_string());
    cookie.into_iter().chain(header).collect()
}

/// Decode the first JWT that verifies. If none does, the last error is kept.
fn decode_any(jwts: &[String], config: &Config) -> Result<AuthToken> {
    let mut outcome = Err(Error::Unauthorized("Admin login required".to_string()));
    for jwt in jwts {
        outcome = AuthToken::decode(jwt, config);
        if outcome.is_ok() {
            break;
        }
    }
    outcome
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the request and check the admin still exists.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let token = match decode_any(&raw_tokens(req), config) {
            Ok(token) => token,
            Err(e) => return Outcome::Failure((Status::Unauthorized, e)),
        };

        let admins = req.guard::<Coll<Admin>>().await.unwrap();
        match admins.find_one(doc! { "_id": &token.admin_id }, None).await {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Failure((
                Status::Unauthorized,
                Error::Unauthorized(format!("Admin '{}' no longer exists", token.admin_id)),
            )),
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_round_trip() {
        let config = Config::example();
        let token = AuthToken {
            admin_id: "coordinator".to_string(),
        };
        let jwt = token.encode(&config).unwrap();
        assert_eq!(AuthToken::decode(&jwt, &config).unwrap(), token);
    }

    #[test]
    fn tampered_jwt_is_rejected() {
        let config = Config::example();
        let token = AuthToken {
            admin_id: "coordinator".to_string(),
        };
        let mut jwt = token.encode(&config).unwrap();
        jwt.push('x');
        let err = AuthToken::decode(&jwt, &config).unwrap_err();
        assert_eq!(err.status(), Status::Unauthorized);
    }

    #[test]
    fn stale_cookie_falls_back_to_header() {
        let config = Config::example();
        let token = AuthToken {
            admin_id: "coordinator".to_string(),
        };
        let jwts = vec!["expired-or-foreign".to_string(), token.encode(&config).unwrap()];
        assert_eq!(decode_any(&jwts, &config).unwrap(), token);

        let err = decode_any(&jwts[..1], &config).unwrap_err();
        assert!(matches!(err, Error::Jwt(_)));
        let err = decode_any(&[], &config).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = AuthToken::decode("not-a-jwt", &Config::example()).unwrap_err();
        assert!(matches!(err, Error::Jwt(_)));
    }
}
