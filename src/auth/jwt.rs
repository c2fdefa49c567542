use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;

/// Session tokens expire this long after issuance.
pub const TOKEN_TTL: Duration = Duration::days(7);

/// Signs and verifies session JWTs with the process-wide HS256 secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> anyhow::Result<String> {
        self.issue_at(user_id, email, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user_id: &str, email: &str, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TOKEN_TTL;
        let claims = Claims {
            user_id: user_id.to_owned(),
            email: email.to_owned(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_token() {
        let issuer = TokenIssuer::new("dev-secret");
        let token = issuer.issue("user-123", "a@b.com").expect("issue");
        let claims = issuer.verify(&token).expect("verify");
        assert_eq!(claims.user_id, "user-123");
        assert_eq!(claims.email, "a@b.com");
    }

    #[test]
    fn expiry_is_seven_days_after_issuance() {
        let issuer = TokenIssuer::new("dev-secret");
        let token = issuer.issue("user-1", "a@b.com").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn payload_uses_camel_case_claim_names() {
        let claims = Claims {
            user_id: "user-1".into(),
            email: "a@b.com".into(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn verify_rejects_token_signed_with_other_secret() {
        let good = TokenIssuer::new("same-app-secret");
        let bad = TokenIssuer::new("someone-elses-secret");
        let token = good.issue("user-1", "a@b.com").unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let issuer = TokenIssuer::new("dev-secret");
        let long_ago = OffsetDateTime::now_utc() - Duration::days(30);
        let token = issuer.issue_at("user-1", "a@b.com", long_ago).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let issuer = TokenIssuer::new("dev-secret");
        assert!(issuer.verify("not.a.jwt").is_err());
    }
}
