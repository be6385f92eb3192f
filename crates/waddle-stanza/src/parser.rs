//! Stanza parsing as an explicit state machine over XML events.
//!
//! The tokenizer (quick-xml for the byte-buffer path) is reduced to a small
//! [`XmlEvent`] vocabulary that is pushed into a [`StanzaBuilder`]. The
//! builder tracks where in the stanza we are so that attributes and character
//! data land on the right field:
//!
//! ```text
//! AwaitingRoot --<stanza>--> InStanza --<error>--> InError --<child>--> InErrorChild
//!                               |  ^                  |  ^                   |
//!                               |  +----</error>------+  +-----</child>------+
//!                               +--</stanza>--> Complete
//! ```
//!
//! A builder lives for exactly one stanza. Once the root element closes it
//! ignores everything else it is given.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, instrument, trace};

use crate::descriptor::StanzaDescriptor;
use crate::error::ParseError;

/// Element name of the stanza error child (RFC 6120 Section 8.3).
const ERROR_ELEMENT: &str = "error";

/// Element name of the human readable error description.
const TEXT_ELEMENT: &str = "text";

/// Depth of the root element.
const ROOT_DEPTH: usize = 1;

/// Depth of a direct child of the root, where `<error/>` is recognized.
const ERROR_DEPTH: usize = 2;

/// Depth of the children of `<error/>`.
const ERROR_CHILD_DEPTH: usize = 3;

/// Tokenizer event, reduced to what stanza parsing needs.
///
/// Element names are local names (any namespace prefix stripped). End events
/// carry no name: the tokenizer is responsible for proper nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start of an element, with its raw attribute names and unescaped values
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// End of the most recently started element
    End,
    /// Unescaped character data
    Text(String),
}

impl XmlEvent {
    /// Convenience constructor for a start event.
    pub fn start<N, I, K, V>(name: N, attributes: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        XmlEvent::Start {
            name: name.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn from_quick_xml(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = std::str::from_utf8(start.local_name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(XmlEvent::Start { name, attributes })
    }
}

/// Position of the parser within the stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// No element seen yet
    AwaitingRoot,
    /// Inside the stanza element, outside of `<error/>`
    InStanza,
    /// Directly inside `<error/>`
    InError,
    /// Inside a child of `<error/>` (or one of its descendants)
    InErrorChild,
    /// The stanza element has been closed
    Complete,
}

/// Whether a builder wants more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep feeding events
    Continue,
    /// The stanza is complete; further events are ignored
    Complete,
}

/// Role of the `<error/>` child currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorChild {
    /// `<text/>` description
    Text,
    /// The defined condition that supplied `error_type`
    Condition,
    /// Any further child (application-specific conditions, duplicates)
    Other,
}

/// Per-stanza parsing state.
///
/// Feed events with [`handle`](Self::handle), then call
/// [`finish`](Self::finish) to obtain the descriptor.
#[derive(Debug)]
pub struct StanzaBuilder {
    state: ParserState,
    depth: usize,
    root: Option<String>,
    descriptor: StanzaDescriptor,
    error_child: Option<ErrorChild>,
    buffer: String,
    text_reason: Option<String>,
    condition_text: Option<String>,
    text_before_root: bool,
}

impl StanzaBuilder {
    /// Create a builder awaiting the root element.
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingRoot,
            depth: 0,
            root: None,
            descriptor: StanzaDescriptor::default(),
            error_child: None,
            buffer: String::new(),
            text_reason: None,
            condition_text: None,
            text_before_root: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Apply one event.
    pub fn handle(&mut self, event: XmlEvent) -> Flow {
        if self.state == ParserState::Complete {
            trace!(?event, "Ignoring event after stanza end");
            return Flow::Complete;
        }

        match event {
            XmlEvent::Start { name, attributes } => self.on_start(name, attributes),
            XmlEvent::End => self.on_end(),
            XmlEvent::Text(text) => match self.state {
                ParserState::InErrorChild => self.buffer.push_str(&text),
                // Only whitespace may precede the document element
                ParserState::AwaitingRoot if !text.trim().is_empty() => {
                    self.text_before_root = true;
                }
                _ => {}
            },
        }

        if self.state == ParserState::Complete {
            Flow::Complete
        } else {
            Flow::Continue
        }
    }

    fn on_start(&mut self, name: String, attributes: Vec<(String, String)>) {
        self.depth += 1;

        match self.state {
            ParserState::AwaitingRoot => {
                let mut descriptor = StanzaDescriptor::for_element(&name);
                for (key, value) in attributes {
                    descriptor.capture_attribute(&key, value);
                }
                self.descriptor = descriptor;
                self.root = Some(name);
                self.transition(ParserState::InStanza);
            }
            ParserState::InStanza => {
                if self.depth == ERROR_DEPTH && name == ERROR_ELEMENT {
                    if self.descriptor.error_class.is_none() {
                        self.descriptor.error_class = attributes
                            .into_iter()
                            .find(|(key, _)| key == "type")
                            .map(|(_, value)| value);
                    }
                    self.transition(ParserState::InError);
                }
            }
            ParserState::InError => {
                let role = if name == TEXT_ELEMENT {
                    ErrorChild::Text
                } else if self.descriptor.error_type.is_none() {
                    self.descriptor.error_type = Some(name);
                    ErrorChild::Condition
                } else {
                    ErrorChild::Other
                };
                self.error_child = Some(role);
                self.buffer.clear();
                self.transition(ParserState::InErrorChild);
            }
            // Descendants of an error child only contribute text
            ParserState::InErrorChild | ParserState::Complete => {}
        }
    }

    fn on_end(&mut self) {
        match self.state {
            ParserState::InStanza if self.depth == ROOT_DEPTH => {
                self.transition(ParserState::Complete);
            }
            ParserState::InError if self.depth == ERROR_DEPTH => {
                self.transition(ParserState::InStanza);
            }
            ParserState::InErrorChild if self.depth == ERROR_CHILD_DEPTH => {
                self.close_error_child();
                self.transition(ParserState::InError);
            }
            _ => {}
        }

        self.depth = self.depth.saturating_sub(1);
    }

    fn close_error_child(&mut self) {
        let text = self.buffer.trim();
        if text.is_empty() {
            return;
        }

        let slot = match self.error_child.take() {
            Some(ErrorChild::Text) => &mut self.text_reason,
            Some(ErrorChild::Condition) => &mut self.condition_text,
            Some(ErrorChild::Other) | None => return,
        };
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    fn transition(&mut self, next: ParserState) {
        trace!(from = ?self.state, to = ?next, depth = self.depth, "Parser transition");
        self.state = next;
    }

    /// Finalize the descriptor.
    ///
    /// Fails if the root element never started or never ended, or if
    /// non-whitespace character data came before it.
    pub fn finish(self) -> Result<StanzaDescriptor, ParseError> {
        if self.text_before_root {
            return Err(ParseError::TextOutsideRoot);
        }

        match self.state {
            ParserState::Complete => {}
            ParserState::AwaitingRoot => return Err(ParseError::NoRootElement),
            _ => return Err(ParseError::Incomplete(self.root.unwrap_or_default())),
        }

        let mut descriptor = self.descriptor;
        descriptor.error_reason = self.text_reason.or(self.condition_text);
        Ok(descriptor.finish())
    }
}

impl Default for StanzaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a descriptor from an already tokenized event sequence.
///
/// Stops consuming the iterator as soon as the root element closes.
pub fn parse_events<I>(events: I) -> Result<StanzaDescriptor, ParseError>
where
    I: IntoIterator<Item = XmlEvent>,
{
    let mut builder = StanzaBuilder::new();
    for event in events {
        if builder.handle(event) == Flow::Complete {
            break;
        }
    }
    builder.finish()
}

/// Parse one top-level stanza from a UTF-8 byte buffer.
///
/// XML declarations, comments, processing instructions and DOCTYPE are
/// skipped. Anything after the end of the first top-level element is not
/// read. Malformed XML, or input ending before the root element closes,
/// yields a [`ParseError`] and no descriptor.
///
/// ```rust
/// use waddle_stanza::{parse_stanza, StanzaKind};
///
/// let stanza = parse_stanza(br#"<presence from="a@b.com/phone" type="unavailable"/>"#).unwrap();
/// assert_eq!(stanza.kind(), StanzaKind::Presence);
/// assert_eq!(stanza.user(), Some("a"));
/// ```
#[instrument(skip_all, name = "stanza.parse", fields(len = data.len()))]
pub fn parse_stanza(data: &[u8]) -> Result<StanzaDescriptor, ParseError> {
    let mut reader = Reader::from_reader(data);
    let mut builder = StanzaBuilder::new();

    loop {
        let flow = match reader.read_event()? {
            Event::Start(start) => builder.handle(XmlEvent::from_quick_xml(&start)?),
            Event::Empty(start) => {
                builder.handle(XmlEvent::from_quick_xml(&start)?);
                builder.handle(XmlEvent::End)
            }
            Event::End(_) => builder.handle(XmlEvent::End),
            Event::Text(text) => builder.handle(XmlEvent::Text(text.unescape()?.into_owned())),
            Event::CData(cdata) => {
                builder.handle(XmlEvent::Text(std::str::from_utf8(&cdata)?.to_string()))
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, DOCTYPE
            _ => Flow::Continue,
        };

        if flow == Flow::Complete {
            break;
        }
    }

    let descriptor = builder.finish()?;
    debug!(
        kind = %descriptor.kind(),
        id = descriptor.idval().unwrap_or_default(),
        error = descriptor.error_type().unwrap_or_default(),
        "Parsed stanza"
    );
    Ok(descriptor)
}
