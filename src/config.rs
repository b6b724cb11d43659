use anyhow::Context;

pub const MAX_POST_LENGTH: usize = 1000;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 20;

pub const DEFAULT_TOKEN_EXPIRATION_MS: i64 = 24 * 60 * 60 * 1000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Process-lifetime settings, read once at startup.
#[derive(Clone)]
pub struct Settings {
    pub jwt_secret: Vec<u8>,
    pub token_expiration_ms: i64,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("BOARD_JWT_SECRET")
            .context("BOARD_JWT_SECRET must be set")?
            .into_bytes();

        let token_expiration_ms = match std::env::var("BOARD_JWT_EXPIRATION_MS") {
            Ok(v) => v
                .parse::<i64>()
                .with_context(|| format!("BOARD_JWT_EXPIRATION_MS is not an integer: {v}"))?,
            Err(_) => DEFAULT_TOKEN_EXPIRATION_MS,
        };

        let bind_addr = std::env::var("BOARD_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            jwt_secret,
            token_expiration_ms,
            bind_addr,
        })
    }

    pub fn token_expiration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.token_expiration_ms)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("jwt_secret", &"<redacted>")
            .field("token_expiration_ms", &self.token_expiration_ms)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiration_is_read_in_milliseconds() {
        let settings = Settings {
            jwt_secret: b"0123456789abcdef0123456789abcdef".to_vec(),
            token_expiration_ms: 1_500,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        };
        assert_eq!(settings.token_expiration().num_milliseconds(), 1_500);
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let settings = Settings {
            jwt_secret: b"super-secret-signing-key-material".to_vec(),
            token_expiration_ms: DEFAULT_TOKEN_EXPIRATION_MS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        };
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
