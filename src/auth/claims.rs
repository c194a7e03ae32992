use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Payload of the backend's access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,                // user ID
    #[serde(default)]
    pub roles: Vec<String>,         // e.g. "ROLE_USER"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Reads the claims without checking the signature; the client holds no key.
    pub fn peek(token: &str) -> anyhow::Result<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.exp
            .and_then(|exp| OffsetDateTime::from_unix_timestamp(exp).ok())
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at().map(|exp| exp <= now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::Duration;

    fn sign(claims: &TokenClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"server-only-secret"),
        )
        .expect("sign")
    }

    #[test]
    fn peek_reads_claims_signed_with_unknown_key() {
        let now = OffsetDateTime::now_utc();
        let token = sign(&TokenClaims {
            sub: "42".into(),
            roles: vec!["ROLE_ADMIN".into()],
            iat: Some(now.unix_timestamp()),
            exp: Some((now + Duration::hours(1)).unix_timestamp()),
        });
        let claims = TokenClaims::peek(&token).expect("peek");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.roles, vec!["ROLE_ADMIN".to_string()]);
        assert!(!claims.is_expired_at(now));
        assert!(claims.is_expired_at(now + Duration::hours(2)));
    }

    #[test]
    fn peek_accepts_token_without_exp() {
        let token = sign(&TokenClaims {
            sub: "1".into(),
            roles: vec![],
            iat: None,
            exp: None,
        });
        let claims = TokenClaims::peek(&token).expect("peek");
        assert!(claims.expires_at().is_none());
        assert!(!claims.is_expired_at(OffsetDateTime::now_utc()));
    }

    #[test]
    fn peek_rejects_garbage() {
        assert!(TokenClaims::peek("not-a-jwt").is_err());
    }
}
