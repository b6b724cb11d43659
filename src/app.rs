use crate::auth::AuthService;
use crate::config::Settings;
use crate::core::db::Database;
use crate::security::password::PasswordHasher;
use crate::security::pipeline::AuthenticationPipeline;
use crate::security::token::TokenService;

/// Everything a request needs, built once at startup and shared read-only.
pub struct App<D: Database> {
    pub db: D,
    pub auth: AuthService,
    pub pipeline: AuthenticationPipeline,
}

impl<D: Database> App<D> {
    pub fn new(db: D, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            db,
            pipeline: AuthenticationPipeline::new(tokens.clone()),
            auth: AuthService::new(hasher, tokens),
        }
    }

    pub fn from_settings(db: D, settings: &Settings) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&settings.jwt_secret, settings.token_expiration())?;
        Ok(Self::new(db, PasswordHasher::default(), tokens))
    }
}
