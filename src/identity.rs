//! Bind identities: the credentials a physical session is authenticated as

/// The (principal, secret) pair a handle group is currently bound under.
///
/// Both sides are optional; a fully absent identity is the anonymous bind.
/// Two identities match when their principals compare equal ignoring case,
/// their secrets compare byte for byte, and absence only equals absence.
///
/// # Examples
///
/// ```
/// use ldappool::BindIdentity;
///
/// let a = BindIdentity::new("cn=Admin,dc=example,dc=com", b"secret");
/// let b = BindIdentity::new("cn=admin,dc=example,dc=com", b"secret");
/// assert!(a.matches(&b));
///
/// let c = BindIdentity::new("cn=admin,dc=example,dc=com", b"other");
/// assert!(!a.matches(&c));
/// assert!(BindIdentity::anonymous().matches(&BindIdentity::anonymous()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindIdentity {
    principal: Option<String>,
    secret: Option<Vec<u8>>,
}

impl BindIdentity {
    /// Create an identity from a principal DN and a secret.
    pub fn new(principal: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            principal: Some(principal.into()),
            secret: Some(secret.into()),
        }
    }

    /// The anonymous identity: no principal, no secret.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Build an identity from already-optional parts.
    pub fn from_parts(principal: Option<String>, secret: Option<Vec<u8>>) -> Self {
        Self { principal, secret }
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn secret(&self) -> Option<&[u8]> {
        self.secret.as_deref()
    }

    /// Identity equality as used for pool lookups: case-insensitive
    /// principal compare, exact secret compare, absent == absent.
    pub fn matches(&self, other: &BindIdentity) -> bool {
        let principal_eq = match (&self.principal, &other.principal) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };
        principal_eq && self.secret == other.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_compare_ignores_case() {
        let a = BindIdentity::new("CN=Alice", b"pw");
        let b = BindIdentity::new("cn=alice", b"pw");
        assert!(a.matches(&b));
        assert!(b.matches(&a));
    }

    #[test]
    fn secret_compare_is_exact() {
        let a = BindIdentity::new("cn=alice", b"pw");
        let b = BindIdentity::new("cn=alice", b"PW");
        assert!(!a.matches(&b));
    }

    #[test]
    fn absent_sides_only_match_absent() {
        let anon = BindIdentity::anonymous();
        let named = BindIdentity::new("cn=alice", b"pw");
        let unauthenticated = BindIdentity::from_parts(Some("cn=alice".into()), None);

        assert!(anon.matches(&BindIdentity::anonymous()));
        assert!(!anon.matches(&named));
        assert!(!named.matches(&unauthenticated));
    }
}
