use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rocket::http::{CookieJar, Status};
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use serde::{Deserialize, Serialize};

use crate::permission::Permissions;
use crate::resp::problem::{problems, Problem};
use crate::security::Security;

pub static AUTH_COOKIE_NAME: &str = "jwt_auth";

/// Authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.permissions.as_ref().map_or(false, |p| p.admin)
    }

    /// Guard every mutating handler calls before touching the store.
    pub fn require_admin(&self) -> Result<(), Problem> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::debug!("rejected non-admin user: {:?}", self.user);
            Err(problems::admin_required())
        }
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // `exp` is still checked when a token carries one.
    validation.required_spec_claims.clear();
    validation
}

pub fn decode_identity(token: &str, secret: impl AsRef<[u8]>) -> Result<Identity, Problem> {
    decode::<Identity>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation(),
    )
    .map(|data| data.claims)
    .map_err(Problem::from)
}

fn extract_token(req: &Request<'_>, cookies: &CookieJar<'_>) -> Result<String, Problem> {
    if let Some(header) = req.headers().get_one("Authorization") {
        return match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(problems::unauthorized(
                "Format is Authorization: Bearer [token]",
            )),
        };
    }

    match cookies.get(AUTH_COOKIE_NAME) {
        Some(jwt) => {
            tracing::debug!("extracted jwt auth from cookie");
            Ok(jwt.value().to_owned())
        }
        None => Err(problems::unauthorized("No authorization token was found")),
    }
}

fn reject(req: &Request<'_>, problem: Problem) -> request::Outcome<Identity, Problem> {
    // The 401 catcher only sees the status; leave the reason where it can find it.
    req.local_cache(|| Some(problem.clone()));
    Outcome::Error((Status::Unauthorized, problem))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let security = match req.rocket().state::<Security>() {
            Some(it) => it,
            None => {
                tracing::error!("security state isn't managed");
                return Outcome::Error((Status::InternalServerError, Problem::default()));
            }
        };

        tracing::trace!("extracting identity from request");
        let token = match extract_token(req, req.cookies()) {
            Ok(it) => it,
            Err(e) => return reject(req, e),
        };

        match decode_identity(&token, &security.jwt_secret) {
            Ok(identity) => {
                tracing::debug!(
                    "decoded identity for user {:?} ({})",
                    identity.user,
                    identity.permissions.unwrap_or_default()
                );
                Outcome::Success(identity)
            }
            Err(e) => {
                tracing::debug!("unable to decode bearer token: {}", e);
                reject(req, e)
            }
        }
    }
}

pub mod doc {
    use utoipa::openapi::security::*;
    use utoipa::openapi::ComponentsBuilder;

    #[derive(Clone, Copy)]
    pub struct JwtAuth;

    impl utoipa::Modify for JwtAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build();
            openapi
                .components
                .get_or_insert_with(|| ComponentsBuilder::new().build())
                .add_security_scheme("jwt", SecurityScheme::Http(scheme));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::{Duration, Utc};

    #[test]
    fn admin_flag_round_trips_through_token() {
        let token = testing::token(true);
        let identity = decode_identity(&token, testing::SECRET).expect("token should decode");

        assert!(identity.is_admin());
        assert!(identity.require_admin().is_ok());
    }

    #[test]
    fn missing_permissions_mean_no_admin() {
        let identity = Identity {
            user: Some("5f1b2c3d4e5f6a7b8c9d0e1f".to_string()),
            ..Default::default()
        };
        let token = testing::encode(&identity);
        let decoded = decode_identity(&token, testing::SECRET).expect("token should decode");

        assert!(!decoded.is_admin());
        let problem = decoded.require_admin().unwrap_err();
        assert_eq!(problem.status, Status::Forbidden);
        assert_eq!(problem.title, "Admin authorization required");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = testing::token(true);
        let problem = decode_identity(&token, "not the secret").unwrap_err();

        assert_eq!(problem.status, Status::Unauthorized);
    }

    #[test]
    fn expired_token_is_rejected() {
        let identity = Identity {
            permissions: Some(Permissions { admin: true }),
            exp: Some((Utc::now() - Duration::hours(2)).timestamp()),
            ..Default::default()
        };
        let problem = decode_identity(&testing::encode(&identity), testing::SECRET).unwrap_err();

        assert_eq!(problem.status, Status::Unauthorized);
        assert_eq!(problem.detail.as_deref(), Some("Expired JWT signature."));
    }
}
