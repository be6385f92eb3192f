//! # waddle-stanza
//!
//! Stanza routing summaries and server endpoint selection for Waddle Social
//! XMPP clients.
//!
//! ## Architecture
//!
//! - **Parser**: quick-xml events drive a per-stanza state machine that
//!   produces a flat [`StanzaDescriptor`] (kind, type, addressing, id and
//!   stanza error condition/text)
//! - **Endpoint**: [`ServerEndpoint`] keeps the configured host/port while the
//!   transport tries resolved addresses per connection attempt
//! - **Resolve**: client SRV lookup feeding endpoint overrides
//!
//! Parsing is synchronous and holds no shared state; descriptors can be
//! produced on any number of worker threads at once.
//!
//! ```rust
//! use waddle_stanza::{parse_stanza, StanzaKind};
//!
//! let stanza = parse_stanza(
//!     br#"<iq type="error" id="5"><error type="cancel"><item-not-found/><text>Not found</text></error></iq>"#,
//! )
//! .unwrap();
//!
//! assert_eq!(stanza.kind(), StanzaKind::Iq);
//! assert_eq!(stanza.error_type(), Some("item-not-found"));
//! assert_eq!(stanza.error_reason(), Some("Not found"));
//! ```

pub mod config;
pub mod descriptor;
pub mod endpoint;
pub mod jid;
pub mod parser;
pub mod resolve;

mod error;

pub use config::ServerConfig;
pub use descriptor::{StanzaDescriptor, StanzaKind};
pub use endpoint::ServerEndpoint;
pub use error::{ConfigError, ParseError};
pub use jid::JidParts;
pub use parser::{parse_events, parse_stanza, Flow, ParserState, StanzaBuilder, XmlEvent};
pub use resolve::{ClientSrvResolver, DnsError, ResolvedTarget};
