//! Splitting of JIDs into localpart, domainpart and resourcepart.
//!
//! This is deliberately lenient: stanzas arrive from the network with
//! whatever `from` the server relayed, and a missing separator simply means
//! the corresponding part is absent. No stringprep or length validation is
//! performed.
//!
//! ```rust
//! use waddle_stanza::jid::JidParts;
//!
//! let parts = JidParts::split("juliet@capulet.lit/balcony");
//! assert_eq!(parts.user.as_deref(), Some("juliet"));
//! assert_eq!(parts.domain.as_deref(), Some("capulet.lit"));
//! assert_eq!(parts.resource.as_deref(), Some("balcony"));
//! ```

/// The parts of a JID as received on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JidParts {
    /// Localpart, before the first `@` of the bare JID
    pub user: Option<String>,
    /// Domainpart
    pub domain: Option<String>,
    /// Resourcepart, everything after the first `/`
    pub resource: Option<String>,
}

impl JidParts {
    /// Split a JID string.
    ///
    /// The resource is separated at the first `/` (a resourcepart may itself
    /// contain `/`), then the remaining bare JID is separated at the first
    /// `@`. Empty parts are reported as `None`.
    pub fn split(jid: &str) -> Self {
        let (bare, resource) = match jid.split_once('/') {
            Some((bare, resource)) => (bare, non_empty(resource)),
            None => (jid, None),
        };

        let (user, domain) = match bare.split_once('@') {
            Some((user, domain)) => (non_empty(user), non_empty(domain)),
            None => (None, non_empty(bare)),
        };

        Self {
            user,
            domain,
            resource,
        }
    }

    /// The bare JID (`user@domain`, or just `domain`), if a domain is present.
    pub fn bare(&self) -> Option<String> {
        let domain = self.domain.as_deref()?;
        Some(match self.user.as_deref() {
            Some(user) => format!("{}@{}", user, domain),
            None => domain.to_string(),
        })
    }
}

fn non_empty(part: &str) -> Option<String> {
    if part.is_empty() {
        None
    } else {
        Some(part.to_string())
    }
}
