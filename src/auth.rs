use crate::config::{MAX_PASSWORD_LENGTH, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH};
use crate::core::db::{Database, Repository, UsernameExists};
use crate::core::errors::BoardError;
use crate::models::dto::LoginResponse;
use crate::models::models::{NewUser, User};
use crate::security::password::PasswordHasher;
use crate::security::token::TokenService;

/// Signup and login on top of the password hasher, the user store and the
/// token service.
pub struct AuthService {
    hasher: PasswordHasher,
    tokens: TokenService,
}

fn validate_signup(username: &str, password: &str) -> Result<(), BoardError> {
    if username.trim().is_empty() {
        return Err(BoardError::Validation("Username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(BoardError::Validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    let password_len = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&password_len) {
        return Err(BoardError::Validation(format!(
            "Password must be {}-{} characters",
            MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

impl AuthService {
    pub fn new(hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self { hasher, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Hashing runs with no connection held, so the store stays available
    /// to other requests while it does. A concurrent signup that wins the
    /// race for the same name still ends as `UsernameTaken`.
    pub fn register_user<D: Database>(
        &self,
        db: &D,
        username: &str,
        password: &str,
    ) -> Result<User, BoardError> {
        validate_signup(username, password)?;

        if db.connect()?.find_user_by_username(username)?.is_some() {
            return Err(BoardError::UsernameTaken);
        }

        let password_hash = self.hasher.hash(password)?;

        let user = db
            .connect()?
            .save_user(NewUser {
                username: username.to_string(),
                password_hash,
            })
            .map_err(|e| {
                if e.is::<UsernameExists>() {
                    BoardError::UsernameTaken
                } else {
                    BoardError::Internal(e)
                }
            })?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub fn login<D: Database>(
        &self,
        db: &D,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, BoardError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(BoardError::InvalidCredentials);
        }

        let found = db.connect()?.find_user_by_username(username)?;
        let user = match found {
            Some(user) => user,
            None => {
                self.hasher.verify_dummy(password);
                tracing::warn!(%username, "login failed");
                return Err(BoardError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::warn!(%username, "login failed");
            return Err(BoardError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.username)?;
        tracing::info!(username = %user.username, "token issued");
        Ok(LoginResponse::bearer(token, user.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryDatabase;
    use crate::security::password::fast_hasher;
    use chrono::Duration;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    fn service() -> AuthService {
        let tokens =
            TokenService::new(b"0123456789abcdef0123456789abcdef", Duration::hours(1)).unwrap();
        AuthService::new(fast_hasher(), tokens)
    }

    #[test]
    fn register_then_login_yields_token_for_user() {
        let auth = service();
        let db = MemoryDatabase::new();

        let user = auth.register_user(&db, "alice", "secret123").unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "secret123");

        let login = auth.login(&db, "alice", "secret123").unwrap();
        assert_eq!(login.username, "alice");
        assert_eq!(login.token_type, "Bearer");
        assert!(auth.tokens().verify(&login.access_token));
        assert_eq!(
            auth.tokens().subject_of(&login.access_token).as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn duplicate_username_is_taken_and_not_stored_twice() {
        let auth = service();
        let db = MemoryDatabase::new();

        let first = auth.register_user(&db, "alice", "secret123").unwrap();
        let err = auth.register_user(&db, "alice", "another1").unwrap_err();
        assert!(matches!(err, BoardError::UsernameTaken));

        let stored = db.connect().unwrap().find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(stored, first);
        assert!(auth.login(&db, "alice", "secret123").is_ok());
        assert!(auth.login(&db, "alice", "another1").is_err());
    }

    #[test]
    fn losing_a_signup_race_is_username_taken() {
        let auth = service();
        let db = MemoryDatabase::new();

        let barrier = std::sync::Barrier::new(2);
        let results: Vec<Result<User, BoardError>> = thread::scope(|s| {
            let handles: Vec<_> = ["secret123", "secret456"]
                .into_iter()
                .map(|password| {
                    let (auth, db, barrier) = (&auth, &db, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        auth.register_user(db, "alice", password)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(BoardError::UsernameTaken))));
    }

    #[test]
    fn store_stays_available_while_a_password_is_hashed() {
        let hasher = PasswordHasher::default();
        let started = Instant::now();
        hasher.hash("secret123").unwrap();
        let hash_time = started.elapsed();

        let auth = AuthService::new(
            hasher,
            TokenService::new(b"0123456789abcdef0123456789abcdef", Duration::hours(1)).unwrap(),
        );
        let db = MemoryDatabase::new();
        let (done_tx, done_rx) = mpsc::channel();

        let longest_wait = thread::scope(|s| {
            let (auth, db) = (&auth, &db);
            s.spawn(move || {
                auth.register_user(db, "alice", "secret123").unwrap();
                done_tx.send(()).unwrap();
            });

            let mut longest_wait = std::time::Duration::ZERO;
            while matches!(done_rx.try_recv(), Err(mpsc::TryRecvError::Empty)) {
                let asked = Instant::now();
                let conn = db.connect().unwrap();
                longest_wait = longest_wait.max(asked.elapsed());
                conn.list_posts_newest_first().unwrap();
                drop(conn);
                thread::sleep(std::time::Duration::from_millis(1));
            }
            longest_wait
        });

        assert!(
            longest_wait < hash_time / 2,
            "connect waited {:?}, one hash takes {:?}",
            longest_wait,
            hash_time
        );
        assert!(db.connect().unwrap().find_user_by_username("alice").unwrap().is_some());
    }

    #[test]
    fn usernames_differing_in_case_are_distinct() {
        let auth = service();
        let db = MemoryDatabase::new();

        auth.register_user(&db, "alice", "secret123").unwrap();
        assert!(auth.register_user(&db, "Alice", "secret123").is_ok());
    }

    #[test]
    fn wrong_password_and_unknown_user_look_the_same() {
        let auth = service();
        let db = MemoryDatabase::new();
        auth.register_user(&db, "alice", "secret123").unwrap();

        let wrong_password = auth.login(&db, "alice", "secret999").unwrap_err();
        let unknown_user = auth.login(&db, "mallory", "secret123").unwrap_err();

        assert!(matches!(wrong_password, BoardError::InvalidCredentials));
        assert!(matches!(unknown_user, BoardError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[test]
    fn signup_validation() {
        let auth = service();
        let db = MemoryDatabase::new();

        for (username, password) in [
            ("", "secret123"),
            ("   ", "secret123"),
            ("alice", "short"),
            ("alice", "this-password-is-way-too-long"),
        ] {
            let err = auth.register_user(&db, username, password).unwrap_err();
            assert!(matches!(err, BoardError::Validation(_)), "{username:?}/{password:?}");
        }
        let long_name = "a".repeat(MAX_USERNAME_LENGTH + 1);
        assert!(auth.register_user(&db, &long_name, "secret123").is_err());
        assert!(db.connect().unwrap().find_user_by_username("alice").unwrap().is_none());
    }

    #[test]
    fn blank_login_fields_are_invalid_credentials() {
        let auth = service();
        let db = MemoryDatabase::new();
        auth.register_user(&db, "alice", "secret123").unwrap();

        for (username, password) in [("", "secret123"), ("alice", ""), ("alice", "   ")] {
            assert!(matches!(
                auth.login(&db, username, password).unwrap_err(),
                BoardError::InvalidCredentials
            ));
        }
    }
}
