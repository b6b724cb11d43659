use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Authority {
    /// Granted to every authenticated request.
    User,
}

/// Who a request is acting as, resolved from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub username: String,
    pub authorities: BTreeSet<Authority>,
}

impl AuthenticatedIdentity {
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authorities: BTreeSet::from([Authority::User]),
        }
    }

    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }
}

/// Per-request security context, handed explicitly to every handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub identity: Option<AuthenticatedIdentity>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: AuthenticatedIdentity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        self.identity.as_ref()
    }
}
