//! Bearer credential resolution.
//!
//! Turns the value of an `Authorization` header into the identity of the
//! calling user. Resolution never fails loudly: a missing header, a header
//! without the `Bearer ` prefix and a token that does not verify all yield
//! `None`, and the caller answers `401 UNAUTHORIZED` for each of them alike.

use beacon_config::AuthConfig;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

/// Resolves bearer credentials to identities.
pub trait IdentityResolver: Send + Sync {
    /// Verifies a bare token.
    fn verify_token(&self, token: &str) -> Option<Identity>;

    /// Resolves a raw `Authorization` header value.
    fn resolve(&self, authorization: Option<&str>) -> Option<Identity> {
        let token = bearer_token(authorization?)?;
        self.verify_token(token)
    }
}

/// Extracts the token from a `Bearer <token>` header value.
///
/// The token is the text right after the single space that follows
/// `Bearer`, up to the next space. Extra spaces leave it empty.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")?
        .split(' ')
        .next()
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
}

/// HS256 JWT verification against a shared secret.
///
/// The user id is read from the `user_id` claim, falling back to `sub`.
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityResolver {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn verify_token(&self, token: &str) -> Option<Identity> {
        let data = match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                debug!("Bearer token rejected: {}", e);
                return None;
            }
        };

        data.claims
            .user_id
            .or(data.claims.sub)
            .filter(|id| !id.is_empty())
            .map(|user_id| Identity { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.to_string(),
            issuer: None,
            audience: None,
            leeway_secs: 0,
        }
    }

    fn mint(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn exp_in(secs: i64) -> i64 {
        chrono::Utc::now().timestamp() + secs
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Token abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn token_must_follow_a_single_space() {
        assert_eq!(bearer_token("Bearer  abc"), None);
        assert_eq!(bearer_token("Bearer abc extra"), Some("abc"));
    }

    #[test]
    fn resolves_user_id_claim() {
        let resolver = JwtIdentityResolver::new(&config());
        let token = mint(json!({"user_id": "alice", "sub": "x", "exp": exp_in(600)}), SECRET);
        let identity = resolver.resolve(Some(&format!("Bearer {}", token)));
        assert_eq!(
            identity,
            Some(Identity {
                user_id: "alice".to_string()
            })
        );
    }

    #[test]
    fn falls_back_to_sub() {
        let resolver = JwtIdentityResolver::new(&config());
        let token = mint(json!({"sub": "bob", "exp": exp_in(600)}), SECRET);
        assert_eq!(resolver.verify_token(&token).unwrap().user_id, "bob");
    }

    #[test]
    fn rejects_bad_tokens() {
        let resolver = JwtIdentityResolver::new(&config());
        let wrong_key = mint(json!({"user_id": "alice", "exp": exp_in(600)}), "other-secret");
        let expired = mint(json!({"user_id": "alice", "exp": exp_in(-600)}), SECRET);
        let no_subject = mint(json!({"exp": exp_in(600)}), SECRET);

        assert!(resolver.verify_token(&wrong_key).is_none());
        assert!(resolver.verify_token(&expired).is_none());
        assert!(resolver.verify_token(&no_subject).is_none());
        assert!(resolver.verify_token("not-a-jwt").is_none());
        assert!(resolver.resolve(None).is_none());
    }

    #[test]
    fn enforces_configured_audience() {
        let mut cfg = config();
        cfg.audience = Some("authenticated".to_string());
        let resolver = JwtIdentityResolver::new(&cfg);

        let good = mint(
            json!({"sub": "carol", "aud": "authenticated", "exp": exp_in(600)}),
            SECRET,
        );
        let bad = mint(
            json!({"sub": "carol", "aud": "anon", "exp": exp_in(600)}),
            SECRET,
        );
        assert!(resolver.verify_token(&good).is_some());
        assert!(resolver.verify_token(&bad).is_none());
    }
}
