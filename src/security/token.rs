//! Signed, time-limited bearer tokens (HS256 JWTs).
//!
//! A token carries `sub` (the username), `iat` and `exp`, both in epoch
//! seconds. Validity depends only on the signature and the expiry; nothing
//! is stored server-side.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// HS256 needs at least 256 bits of key material.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], expiry: Duration) -> anyhow::Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!(
                "token secret must be at least {} bytes, got {}",
                MIN_SECRET_LEN,
                secret.len()
            );
        }
        // Claims are in whole seconds.
        if expiry.num_seconds() < 1 {
            anyhow::bail!(
                "token expiry must be at least one second, got {}ms",
                expiry.num_milliseconds()
            );
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            expiry,
        })
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn issue(&self, username: &str) -> anyhow::Result<String> {
        self.issue_at(username, Utc::now())
    }

    pub fn issue_at(&self, username: &str, issued_at: DateTime<Utc>) -> anyhow::Result<String> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat,
            exp: iat + self.expiry.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign token")
    }

    /// Checks signature, algorithm and `exp > now`. Never errors: anything
    /// wrong with the token reads as `false`.
    pub fn verify(&self, token: &str) -> bool {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims.exp > Utc::now().timestamp(),
            Err(e) => {
                tracing::debug!(error = %e, "token rejected");
                false
            }
        }
    }

    /// Reads `sub` without checking signature or expiry.
    ///
    /// Only use the result for security decisions after [`verify`] returned
    /// `true` for the same token.
    ///
    /// [`verify`]: TokenService::verify
    pub fn subject_of(&self, token: &str) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const OTHER_SECRET: &[u8] = b"fedcba9876543210fedcba9876543210";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::milliseconds(60_000)).unwrap()
    }

    #[test]
    fn issued_token_verifies_and_carries_subject() {
        let tokens = service();
        let token = tokens.issue("alice").unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(tokens.verify(&token));
        assert_eq!(tokens.subject_of(&token).as_deref(), Some("alice"));
    }

    #[test]
    fn claims_hold_issue_and_expiry_seconds() {
        let tokens = service();
        let issued_at = Utc::now();
        let token = tokens.issue_at("alice", issued_at).unwrap();

        let data = decode::<Claims>(&token, &DecodingKey::from_secret(SECRET), &tokens.validation)
            .unwrap();
        assert_eq!(data.claims.iat, issued_at.timestamp());
        assert_eq!(data.claims.exp, issued_at.timestamp() + 60);
    }

    #[test]
    fn expired_token_fails_but_subject_is_still_readable() {
        let tokens = service();
        let token = tokens
            .issue_at("alice", Utc::now() - Duration::minutes(5))
            .unwrap();
        assert!(!tokens.verify(&token));
        assert_eq!(tokens.subject_of(&token).as_deref(), Some("alice"));
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_at("alice", Utc::now() - tokens.expiry())
            .unwrap();
        assert!(!tokens.verify(&token));
    }

    #[test]
    fn any_single_altered_byte_is_rejected() {
        let tokens = service();
        let token = tokens.issue("alice").unwrap();

        for (i, c) in token.char_indices() {
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + c.len_utf8(), &replacement.to_string());
            assert!(!tokens.verify(&tampered), "tampered byte {} still verified", i);
        }
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let ours = service();
        let theirs = TokenService::new(OTHER_SECRET, Duration::milliseconds(60_000)).unwrap();
        let token = theirs.issue("alice").unwrap();
        assert!(theirs.verify(&token));
        assert!(!ours.verify(&token));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "alice".into(),
            iat: now,
            exp: now + 60,
        };
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert!(!tokens.verify(&hs512));

        // {"alg":"none","typ":"JWT"} with a genuine payload and no signature
        let payload = tokens.issue("alice").unwrap();
        let payload = payload.split('.').nth(1).unwrap();
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", payload);
        assert!(!tokens.verify(&unsigned));
    }

    #[test]
    fn garbage_is_invalid_not_an_error() {
        let tokens = service();
        for junk in ["", "abc", "a.b.c", "...", "Bearer x.y.z"] {
            assert!(!tokens.verify(junk));
            assert_eq!(tokens.subject_of(junk), None);
        }
    }

    #[test]
    fn short_secret_is_refused() {
        assert!(TokenService::new(b"too-short", Duration::hours(1)).is_err());
    }

    #[test]
    fn non_positive_expiry_is_refused() {
        assert!(TokenService::new(SECRET, Duration::zero()).is_err());
        assert!(TokenService::new(SECRET, Duration::milliseconds(-1)).is_err());
    }

    #[test]
    fn sub_second_expiry_is_refused() {
        assert!(TokenService::new(SECRET, Duration::milliseconds(500)).is_err());
        assert!(TokenService::new(SECRET, Duration::milliseconds(999)).is_err());
    }

    #[test]
    fn shortest_lifetime_still_verifies_right_after_issue() {
        let tokens = TokenService::new(SECRET, Duration::seconds(1)).unwrap();
        for _ in 0..40 {
            let token = tokens.issue("alice").unwrap();
            assert!(tokens.verify(&token));
            std::thread::sleep(std::time::Duration::from_millis(37));
        }
    }

    #[test]
    fn expiry_is_counted_from_the_issue_second() {
        let tokens = TokenService::new(SECRET, Duration::milliseconds(1_500)).unwrap();
        let issued_at = Utc::now();
        let token = tokens.issue_at("alice", issued_at).unwrap();

        let data = decode::<Claims>(&token, &DecodingKey::from_secret(SECRET), &tokens.validation)
            .unwrap();
        assert_eq!(data.claims.exp, data.claims.iat + 1);
    }
}
