//! HS256 bearer tokens signed with the configured [`TokenSecret`].
//!
//! Expiry is checked against the injected clock rather than the system
//! clock so tests can move time deterministically.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use crate::domain::ports::{IssuedToken, TokenError, TokenService};
use crate::domain::{User, UserId};

use super::TokenSecret;

/// Registered claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a decimal string.
    pub sub: String,
    /// `tipo_usuarios` id at issue time.
    pub role: i32,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// [`TokenService`] backed by `jsonwebtoken`.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    /// Build a service signing tokens valid for `ttl`.
    #[must_use]
    pub fn new(secret: &TokenSecret, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.id(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::issue(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| TokenError::invalid(err.to_string()))?;
        let claims = data.claims;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| TokenError::invalid("exp out of range"))?;
        if self.clock.utc() >= expires_at {
            return Err(TokenError::expired());
        }

        claims
            .sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| TokenError::invalid("sub is not a user id"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, Local};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::UserRole;
    use crate::domain::fixtures;

    struct SteppingClock(Mutex<DateTime<Utc>>);

    impl SteppingClock {
        fn advance(&self, delta: Duration) {
            match self.0.lock() {
                Ok(mut now) => *now += delta,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Clock for SteppingClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            match self.0.lock() {
                Ok(now) => *now,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    struct Harness {
        clock: Arc<SteppingClock>,
        service: JwtTokenService,
    }

    #[fixture]
    fn harness() -> Harness {
        let clock = Arc::new(SteppingClock(Mutex::new(fixtures::timestamp())));
        let secret = TokenSecret::from_bytes(vec![7; 32]);
        let service = JwtTokenService::new(&secret, Duration::hours(1), clock.clone());
        Harness { clock, service }
    }

    #[rstest]
    fn issued_token_verifies_to_its_user(harness: Harness) {
        let user = fixtures::user(42, UserRole::Seller);
        let issued = harness.service.issue(&user).expect("issue");

        assert_eq!(issued.expires_at, fixtures::timestamp() + Duration::hours(1));
        assert_eq!(harness.service.verify(&issued.token), Ok(UserId::new(42)));
    }

    #[rstest]
    fn claims_carry_role_and_times(harness: Harness) {
        let user = fixtures::user(5, UserRole::Admin);
        let issued = harness.service.issue(&user).expect("issue");
        let data = decode::<Claims>(
            &issued.token,
            &harness.service.decoding,
            &harness.service.validation,
        )
        .expect("decode");

        assert_eq!(data.claims.sub, "5");
        assert_eq!(data.claims.role, UserRole::Admin.id());
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
    }

    #[rstest]
    fn tokens_expire_with_the_clock(harness: Harness) {
        let issued = harness
            .service
            .issue(&fixtures::user(1, UserRole::Client))
            .expect("issue");
        harness.clock.advance(Duration::hours(1));

        assert_eq!(harness.service.verify(&issued.token), Err(TokenError::Expired));
    }

    #[rstest]
    fn tokens_signed_with_another_secret_are_invalid(harness: Harness) {
        let other = JwtTokenService::new(
            &TokenSecret::from_bytes(vec![9; 32]),
            Duration::hours(1),
            harness.clock.clone(),
        );
        let issued = other
            .issue(&fixtures::user(1, UserRole::Client))
            .expect("issue");

        assert!(matches!(
            harness.service.verify(&issued.token),
            Err(TokenError::Invalid { .. })
        ));
    }

    #[rstest]
    #[case("")]
    #[case("not.a.token")]
    fn garbage_is_invalid(harness: Harness, #[case] token: &str) {
        assert!(matches!(
            harness.service.verify(token),
            Err(TokenError::Invalid { .. })
        ));
    }
}
