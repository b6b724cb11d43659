//! Per-request authentication.
//!
//! Runs before any handler and never produces a response itself. A missing,
//! malformed, invalid or orphaned token leaves the request anonymous; routes
//! that need an identity reject it later.

use crate::core::db::Repository;
use crate::security::identity::{AuthenticatedIdentity, RequestContext};
use crate::security::token::TokenService;

const BEARER_PREFIX: &str = "Bearer ";

/// How a request's credential was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// No bearer token was presented.
    Anonymous,
    /// A token was presented but did not yield an identity.
    Rejected(RejectReason),
    Resolved(AuthenticatedIdentity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidToken,
    UnknownUser,
    LookupFailed,
}

impl Authentication {
    pub fn into_context(self) -> RequestContext {
        match self {
            Authentication::Resolved(identity) => RequestContext::authenticated(identity),
            Authentication::Anonymous | Authentication::Rejected(_) => RequestContext::anonymous(),
        }
    }
}

/// Extracts the token from an `Authorization` header value. The prefix is
/// case-sensitive with exactly one space.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix(BEARER_PREFIX)
}

#[derive(Clone)]
pub struct AuthenticationPipeline {
    tokens: TokenService,
}

impl AuthenticationPipeline {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    pub fn authenticate<R: Repository + ?Sized>(
        &self,
        authorization: Option<&str>,
        repo: &R,
    ) -> Authentication {
        let Some(token) = bearer_token(authorization) else {
            return Authentication::Anonymous;
        };

        if !self.tokens.verify(token) {
            tracing::debug!(
                subject = ?self.tokens.subject_of(token),
                "ignoring invalid bearer token"
            );
            return Authentication::Rejected(RejectReason::InvalidToken);
        }

        let Some(username) = self.tokens.subject_of(token) else {
            return Authentication::Rejected(RejectReason::InvalidToken);
        };

        match repo.find_user_by_username(&username) {
            Ok(Some(user)) => Authentication::Resolved(AuthenticatedIdentity::user(user.username)),
            Ok(None) => {
                tracing::debug!(%username, "token subject has no user");
                Authentication::Rejected(RejectReason::UnknownUser)
            }
            Err(e) => {
                tracing::warn!(%username, error = ?e, "cannot set user authentication");
                Authentication::Rejected(RejectReason::LookupFailed)
            }
        }
    }

    /// Convenience wrapper returning only the context handlers consume.
    pub fn resolve<R: Repository + ?Sized>(
        &self,
        authorization: Option<&str>,
        repo: &R,
    ) -> RequestContext {
        self.authenticate(authorization, repo).into_context()
    }
}
