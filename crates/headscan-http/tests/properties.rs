//! Property-based tests for the request head parser.
//!
//! Generates well-formed request heads from small alphabets and checks the
//! parser's structural guarantees: truncation, body offset, header order and
//! reuse.

use headscan_http::{HttpParser, ParseError};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("DELETE".to_string()),
        "[A-Z]{1,10}",
    ]
}

fn path() -> impl Strategy<Value = String> {
    "/[a-zA-Z0-9/_.~-]{0,40}(\\?[a-z0-9=&]{0,20})?"
}

fn header_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9-]{0,20}"
}

fn header_value() -> impl Strategy<Value = String> {
    "[!-~]([ !-~]{0,30}[!-~])?"
}

fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((header_name(), header_value()), 0..24)
}

fn line_ending() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("\r\n"), Just("\n")]
}

fn render(
    method: &str,
    path: &str,
    headers: &[(String, String)],
    eol: &str,
    body: &[u8],
) -> Vec<u8> {
    let mut out = format!("{method} {path} HTTP/1.1{eol}");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}{eol}"));
    }
    out.push_str(eol);
    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

fn head_len(method: &str, path: &str, headers: &[(String, String)], eol: &str) -> usize {
    render(method, path, headers, eol, b"").len()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn offset_is_end_of_head(
        method in method(),
        path in path(),
        headers in headers(),
        eol in line_ending(),
        body in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let buffer = render(&method, &path, &headers, eol, &body);
        let mut parser = HttpParser::new();

        let offset = parser.parse(&buffer).unwrap();
        prop_assert_eq!(offset, head_len(&method, &path, &headers, eol));
        prop_assert_eq!(&buffer[offset..], &body[..]);
    }

    #[test]
    fn every_strict_prefix_needs_more_data(
        method in method(),
        path in path(),
        headers in prop::collection::vec((header_name(), header_value()), 0..6),
        eol in line_ending(),
    ) {
        let buffer = render(&method, &path, &headers, eol, b"");
        let mut parser = HttpParser::new();

        for end in 0..buffer.len() {
            prop_assert_eq!(parser.parse(&buffer[..end]), Err(ParseError::MissingData));
        }
        prop_assert_eq!(parser.parse(&buffer), Ok(buffer.len()));
    }

    #[test]
    fn headers_keep_document_order(
        headers in headers(),
        capacity in 1usize..6,
    ) {
        let buffer = render("GET", "/", &headers, "\r\n", b"");
        let mut parser = HttpParser::with_capacity(capacity);
        let head = parser.parse_head(&buffer).unwrap();

        prop_assert_eq!(head.header_count(), headers.len());
        for (header, (name, value)) in head.headers().zip(&headers) {
            prop_assert_eq!(header.name(), name.as_bytes());
            prop_assert_eq!(header.value(), value.as_bytes());
        }
    }

    #[test]
    fn request_line_fields_round_trip(
        method in method(),
        path in path(),
        eol in line_ending(),
    ) {
        let buffer = render(&method, &path, &[], eol, b"");
        let mut parser = HttpParser::new();
        let head = parser.parse_head(&buffer).unwrap();

        prop_assert_eq!(head.method(), method.as_bytes());
        prop_assert_eq!(head.path(), path.as_bytes());
        prop_assert_eq!(head.version(), b"HTTP/1.1");
    }

    #[test]
    fn subscription_stores_only_allowed_names(headers in headers()) {
        let buffer = render("GET", "/", &headers, "\r\n", b"");
        let mut parser = HttpParser::new();
        parser.subscribe_all_headers(false);
        parser.subscribe_header("Host");
        let head = parser.parse_head(&buffer).unwrap();

        let expected = headers
            .iter()
            .filter(|(name, _)| name == "Host" || name == "Content-Length")
            .count();
        prop_assert_eq!(head.header_count(), expected);
    }

    #[test]
    fn reuse_matches_fresh_parser(
        first in headers(),
        second in headers(),
    ) {
        let a = render("POST", "/a", &first, "\r\n", b"");
        let b = render("GET", "/b", &second, "\r\n", b"");

        let mut reused = HttpParser::new();
        reused.parse(&a).unwrap();
        reused.reset();
        let reused_head = reused.parse_head(&b).unwrap();

        let mut fresh = HttpParser::new();
        let fresh_head = fresh.parse_head(&b).unwrap();

        prop_assert_eq!(reused_head.header_count(), fresh_head.header_count());
        prop_assert_eq!(reused_head.host(), fresh_head.host());
        prop_assert_eq!(reused_head.content_length(), fresh_head.content_length());
        let reused_pairs: Vec<_> = reused_head.headers().map(|h| h.as_bytes_pair()).collect();
        let fresh_pairs: Vec<_> = fresh_head.headers().map(|h| h.as_bytes_pair()).collect();
        prop_assert_eq!(reused_pairs, fresh_pairs);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut parser = HttpParser::new();
        if let Ok(head) = parser.parse_head(&bytes) {
            let _ = head.host();
            let _ = head.content_length();
            let _ = head.find_all_headers("x");
        }
    }
}
