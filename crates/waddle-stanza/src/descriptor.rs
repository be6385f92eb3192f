//! The flat routing/error summary of a single stanza.

use std::convert::Infallible;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::ParseError;
use crate::jid::JidParts;

/// Stanza category, derived from the local name of the top-level element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StanzaKind {
    /// `<message/>`
    Message,
    /// `<presence/>`
    Presence,
    /// `<iq/>`
    Iq,
    /// Any other top-level element
    #[default]
    Unknown,
}

impl StanzaKind {
    /// Map an element local name to a stanza kind.
    pub fn from_element_name(name: &str) -> Self {
        match name {
            "message" => StanzaKind::Message,
            "presence" => StanzaKind::Presence,
            "iq" => StanzaKind::Iq,
            _ => StanzaKind::Unknown,
        }
    }
}

impl FromStr for StanzaKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_element_name(s))
    }
}

impl std::fmt::Display for StanzaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StanzaKind::Message => write!(f, "message"),
            StanzaKind::Presence => write!(f, "presence"),
            StanzaKind::Iq => write!(f, "iq"),
            StanzaKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Routing and error information of one stanza.
///
/// Produced once per parse and immutable afterwards. All fields other than
/// [`kind`](Self::kind) are optional; an absent attribute or JID part is
/// `None`, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StanzaDescriptor {
    pub(crate) kind: StanzaKind,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) stanza_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) resource: Option<String>,
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub(crate) idval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error_reason: Option<String>,
}

impl StanzaDescriptor {
    /// Build a descriptor from already-tokenized top-level attributes.
    ///
    /// `element_name` is the local name of the stanza element. Only the
    /// `type`, `from`, `to` and `id` keys are used; anything else is ignored.
    /// Error fields are never populated on this path since the `<error>`
    /// child is not part of the attribute mapping.
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use waddle_stanza::{StanzaDescriptor, StanzaKind};
    ///
    /// let attrs = HashMap::from([("from", "a@b.com/phone"), ("type", "chat")]);
    /// let stanza = StanzaDescriptor::from_attributes("message", attrs);
    /// assert_eq!(stanza.kind(), StanzaKind::Message);
    /// assert_eq!(stanza.resource(), Some("phone"));
    /// ```
    pub fn from_attributes<I, K, V>(element_name: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut descriptor = Self::for_element(element_name);
        for (name, value) in attributes {
            descriptor.capture_attribute(name.as_ref(), value.into());
        }
        descriptor.finish()
    }

    /// Parse one top-level stanza from raw bytes.
    ///
    /// See [`crate::parser::parse_stanza`].
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        crate::parser::parse_stanza(data)
    }

    pub(crate) fn for_element(element_name: &str) -> Self {
        let kind = StanzaKind::from_element_name(element_name);
        if kind == StanzaKind::Unknown {
            debug!(element = %element_name, "Unrecognized top-level element");
        }
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Record a top-level attribute. Returns false for attributes that carry
    /// no routing information.
    pub(crate) fn capture_attribute(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "type" => &mut self.stanza_type,
            "from" => &mut self.from,
            "to" => &mut self.to,
            "id" => &mut self.idval,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Derive the JID parts of `from`.
    pub(crate) fn finish(mut self) -> Self {
        if let Some(from) = self.from.as_deref() {
            let parts = JidParts::split(from);
            self.user = parts.user;
            self.domain = parts.domain;
            self.resource = parts.resource;
        }
        self
    }

    /// Stanza category.
    pub fn kind(&self) -> StanzaKind {
        self.kind
    }

    /// The `type` attribute (`chat`, `error`, `subscribe`, ...).
    pub fn stanza_type(&self) -> Option<&str> {
        self.stanza_type.as_deref()
    }

    /// Full sender JID as sent from the server.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Full recipient JID as sent from the server.
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// Localpart of `from`.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Domainpart of `from`.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Resourcepart of `from`.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// The stanza `id` attribute.
    pub fn idval(&self) -> Option<&str> {
        self.idval.as_deref()
    }

    /// The `type` attribute of the `<error/>` child (`cancel`, `auth`, ...).
    pub fn error_class(&self) -> Option<&str> {
        self.error_class.as_deref()
    }

    /// Local name of the defined condition inside `<error/>`.
    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref()
    }

    /// Human readable error text, trimmed.
    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    /// Whether the stanza reports an error.
    pub fn is_error(&self) -> bool {
        self.stanza_type.as_deref() == Some("error") || self.error_type.is_some()
    }
}
