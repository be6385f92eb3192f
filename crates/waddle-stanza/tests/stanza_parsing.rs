//! End-to-end parsing of raw stanza bytes into descriptors.

use std::collections::HashMap;

use waddle_stanza::{parse_stanza, ParseError, StanzaDescriptor, StanzaKind};

/// Initialize test environment.
fn init_test() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// Routing attributes
// =============================================================================

#[test]
fn test_chat_message() {
    init_test();
    let stanza =
        parse_stanza(br#"<message type="chat" from="a@b.com/phone" to="c@d.com" id="123"/>"#)
            .unwrap();

    assert_eq!(stanza.kind(), StanzaKind::Message);
    assert_eq!(stanza.stanza_type(), Some("chat"));
    assert_eq!(stanza.from(), Some("a@b.com/phone"));
    assert_eq!(stanza.to(), Some("c@d.com"));
    assert_eq!(stanza.user(), Some("a"));
    assert_eq!(stanza.resource(), Some("phone"));
    assert_eq!(stanza.idval(), Some("123"));
    assert_eq!(stanza.error_type(), None);
    assert_eq!(stanza.error_reason(), None);
    assert!(!stanza.is_error());
}

#[test]
fn test_from_without_resource() {
    init_test();
    let stanza = parse_stanza(
        b"<presence xmlns='jabber:client' from='juliet@capulet.lit' type='subscribe'/>",
    )
    .unwrap();

    assert_eq!(stanza.kind(), StanzaKind::Presence);
    assert_eq!(stanza.user(), Some("juliet"));
    assert_eq!(stanza.domain(), Some("capulet.lit"));
    assert_eq!(stanza.resource(), None);
}

#[test]
fn test_jid_parts_for_many_senders() {
    init_test();
    let senders = [
        ("romeo", "montague.lit", "orchard"),
        ("nurse", "capulet.lit", "kitchen"),
        ("benvolio", "example.org", "laptop"),
    ];

    for (user, domain, resource) in senders {
        let xml = format!("<message from='{user}@{domain}/{resource}'><body>hi</body></message>");
        let stanza = parse_stanza(xml.as_bytes()).unwrap();
        assert_eq!(stanza.user(), Some(user));
        assert_eq!(stanza.domain(), Some(domain));
        assert_eq!(stanza.resource(), Some(resource));
    }
}

#[test]
fn test_no_from_attribute() {
    init_test();
    let stanza = parse_stanza(b"<iq type='result' id='bind_1'/>").unwrap();
    assert_eq!(stanza.from(), None);
    assert_eq!(stanza.user(), None);
    assert_eq!(stanza.resource(), None);
}

#[test]
fn test_payload_does_not_leak_into_routing() {
    init_test();
    let xml = b"<message xmlns='jabber:client' from='me@example.com' to='me@example.com/phone' type='chat'>\
        <sent xmlns='urn:xmpp:carbons:2'>\
          <forwarded xmlns='urn:xmpp:forward:0'>\
            <message from='me@example.com/laptop' to='you@example.org' id='inner' type='normal'>\
              <body>hello</body>\
              <error type='modify'><bad-request/></error>\
            </message>\
          </forwarded>\
        </sent>\
      </message>";

    let stanza = parse_stanza(xml).unwrap();
    assert_eq!(stanza.from(), Some("me@example.com"));
    assert_eq!(stanza.to(), Some("me@example.com/phone"));
    assert_eq!(stanza.stanza_type(), Some("chat"));
    assert_eq!(stanza.idval(), None);
    assert_eq!(stanza.resource(), None);
    assert_eq!(stanza.error_type(), None);
}

// =============================================================================
// Stanza errors
// =============================================================================

#[test]
fn test_iq_error_condition_and_text() {
    init_test();
    let stanza = parse_stanza(
        br#"<iq type="error" id="5"><error type="cancel"><item-not-found/><text>Not found</text></error></iq>"#,
    )
    .unwrap();

    assert_eq!(stanza.kind(), StanzaKind::Iq);
    assert_eq!(stanza.stanza_type(), Some("error"));
    assert_eq!(stanza.idval(), Some("5"));
    assert_eq!(stanza.error_type(), Some("item-not-found"));
    assert_eq!(stanza.error_reason(), Some("Not found"));
    assert_eq!(stanza.error_class(), Some("cancel"));
    assert!(stanza.is_error());
}

#[test]
fn test_error_attributes_are_not_top_level() {
    init_test();
    let stanza = parse_stanza(
        b"<message type='error' id='m1'>\
            <error type='cancel' by='example.com' id='bogus'>\
              <service-unavailable xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
            </error>\
          </message>",
    )
    .unwrap();

    assert_eq!(stanza.stanza_type(), Some("error"));
    assert_eq!(stanza.idval(), Some("m1"));
    assert_eq!(stanza.error_class(), Some("cancel"));
    assert_eq!(stanza.error_type(), Some("service-unavailable"));
}

#[test]
fn test_namespaced_error_with_pretty_printed_text() {
    init_test();
    let stanza = parse_stanza(
        b"<presence from='room@muc.example.com/nick' type='error'>
            <error type='cancel'>
              <conflict xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>
              <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas' xml:lang='en'>
                That nickname is already in use
              </text>
            </error>
          </presence>",
    )
    .unwrap();

    assert_eq!(stanza.kind(), StanzaKind::Presence);
    assert_eq!(stanza.resource(), Some("nick"));
    assert_eq!(stanza.error_type(), Some("conflict"));
    assert_eq!(
        stanza.error_reason(),
        Some("That nickname is already in use")
    );
}

#[test]
fn test_error_without_text() {
    init_test();
    let stanza =
        parse_stanza(b"<iq type='error' id='q'><error type='auth'><forbidden/></error></iq>")
            .unwrap();
    assert_eq!(stanza.error_type(), Some("forbidden"));
    assert_eq!(stanza.error_reason(), None);
}

// =============================================================================
// Tolerated anomalies
// =============================================================================

#[test]
fn test_unknown_top_level_element() {
    init_test();
    let stanza = parse_stanza(b"<ping/>").unwrap();
    assert_eq!(stanza.kind(), StanzaKind::Unknown);
    assert_eq!(stanza, StanzaDescriptor::default());
}

#[test]
fn test_unknown_element_keeps_attributes() {
    init_test();
    let stanza = parse_stanza(b"<a xmlns='urn:xmpp:sm:3' h='3' id='sm'/>").unwrap();
    assert_eq!(stanza.kind(), StanzaKind::Unknown);
    assert_eq!(stanza.idval(), Some("sm"));
}

#[test]
fn test_trailing_elements_are_ignored() {
    init_test();
    let stanza = parse_stanza(b"<message id='1'/><message id='2'/>").unwrap();
    assert_eq!(stanza.idval(), Some("1"));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_unterminated_tag_fails() {
    init_test();
    assert!(parse_stanza(br#"<message type="chat" from="a@b.com"#).is_err());
}

#[test]
fn test_unclosed_root_fails() {
    init_test();
    let result = parse_stanza(b"<iq type='get' id='1'><query xmlns='jabber:iq:roster'/>");
    assert!(result.is_err());
}

#[test]
fn test_mismatched_nesting_fails() {
    init_test();
    let result = parse_stanza(b"<iq type='error'><error><conflict></error></iq>");
    assert!(result.is_err());
}

#[test]
fn test_empty_input_fails() {
    init_test();
    assert!(matches!(parse_stanza(b""), Err(ParseError::NoRootElement)));
    assert!(matches!(parse_stanza(b"   \n"), Err(ParseError::NoRootElement)));
}

#[test]
fn test_leading_text_fails() {
    init_test();
    let result = parse_stanza(b"junk<message id='1'/>");
    assert!(matches!(result, Err(ParseError::TextOutsideRoot)));
}

#[test]
fn test_leading_whitespace_is_tolerated() {
    init_test();
    let stanza = parse_stanza(b"\r\n  \t<message id='1'/>").unwrap();
    assert_eq!(stanza.kind(), StanzaKind::Message);
    assert_eq!(stanza.idval(), Some("1"));
}

#[test]
fn test_invalid_utf8_fails() {
    init_test();
    assert!(parse_stanza(b"<message from='\xff\xfe@example.com'/>").is_err());
}

// =============================================================================
// Mapping fast path and determinism
// =============================================================================

#[test]
fn test_mapping_matches_byte_parse() {
    init_test();
    let parsed =
        parse_stanza(br#"<message type="chat" from="a@b.com/phone" to="c@d.com" id="123"/>"#)
            .unwrap();

    let attrs = HashMap::from([
        ("type", "chat"),
        ("from", "a@b.com/phone"),
        ("to", "c@d.com"),
        ("id", "123"),
    ]);
    let mapped = StanzaDescriptor::from_attributes("message", attrs);

    assert_eq!(parsed, mapped);
}

#[test]
fn test_parsing_is_idempotent() {
    init_test();
    let xml: &[u8] = br#"<iq type="error" id="5" from="pubsub.example.com"><error type="cancel"><item-not-found/><text>Not found</text></error></iq>"#;
    assert_eq!(parse_stanza(xml).unwrap(), parse_stanza(xml).unwrap());
}

#[test]
fn test_concurrent_parsing() {
    init_test();
    let stanzas: Vec<String> = (0..16)
        .map(|i| format!("<message from='user{i}@example.com/res{i}' id='m{i}' type='chat'/>"))
        .collect();

    let results: Vec<StanzaDescriptor> = std::thread::scope(|scope| {
        let handles: Vec<_> = stanzas
            .iter()
            .map(|xml| scope.spawn(move || parse_stanza(xml.as_bytes()).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, stanza) in results.iter().enumerate() {
        assert_eq!(stanza.user(), Some(format!("user{i}").as_str()));
        assert_eq!(stanza.resource(), Some(format!("res{i}").as_str()));
        assert_eq!(stanza.idval(), Some(format!("m{i}").as_str()));
    }
}
