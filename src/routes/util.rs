//! Shared URL/form parsing and HTML helpers for route handlers.

/// Parse URL-encoded form body into key-value pairs.
/// Handles `key=value&key2=value2` format (from HTMX POST bodies).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((percent_decode(key), percent_decode(val)))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Multi-byte UTF-8 sequences are
/// reassembled; invalid sequences become U+FFFD.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                out.push((hex_val(bytes[i + 1]) << 4) | hex_val(bytes[i + 2]));
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Helper to get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// The `state` payload of a persistence request. A body that is itself a
/// JSON record is taken verbatim; otherwise it is form-parsed and the `state`
/// field is used, falling back to the trimmed body.
pub fn state_payload(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }
    let params = parse_form_body(trimmed);
    get_param(&params, "state").unwrap_or(trimmed).to_string()
}

/// Client timestamp or seed parameter. Accepts `Date.now()`-style floats.
pub fn get_u64(params: &[(String, String)], key: &str) -> Option<u64> {
    let raw = get_param(params, key)?.trim();
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    })
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode a string as a JavaScript string literal safe to embed in a
/// `<script>` element.
pub fn js_string_literal(input: &str) -> String {
    serde_json::to_string(input)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_form_body_works() {
        let pairs = parse_form_body("now=1500&seed=42&action=next");
        assert_eq!(pairs.len(), 3);
        assert_eq!(get_param(&pairs, "now"), Some("1500"));
        assert_eq!(get_param(&pairs, "seed"), Some("42"));
    }

    #[test]
    fn parse_form_body_empty() {
        let pairs = parse_form_body("");
        assert!(pairs.is_empty());
    }

    #[test]
    fn percent_decode_plus_as_space() {
        assert_eq!(percent_decode("hello+world"), "hello world");
    }

    #[test]
    fn percent_decode_hex() {
        assert_eq!(percent_decode("hello%20world"), "hello world");
    }

    #[test]
    fn percent_decode_multibyte() {
        assert_eq!(percent_decode("%E5%AE%9D%E8%97%8F"), "宝藏");
    }

    #[test]
    fn percent_decode_keeps_malformed_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn parse_query_strips_prefix() {
        let pairs = parse_query("?foo=bar");
        assert_eq!(get_param(&pairs, "foo"), Some("bar"));
    }

    #[test]
    fn state_payload_keeps_raw_json_intact() {
        let json = r#"{"nickname":"Tom&state=x"}"#;
        assert_eq!(state_payload(json), json);
        assert_eq!(state_payload("state=abc%2D"), "abc-");
        assert_eq!(state_payload("  "), "");
    }

    #[test]
    fn get_u64_accepts_floats() {
        let pairs = parse_form_body("now=1700000000123&seed=12.7&bad=-4");
        assert_eq!(get_u64(&pairs, "now"), Some(1_700_000_000_123));
        assert_eq!(get_u64(&pairs, "seed"), Some(12));
        assert_eq!(get_u64(&pairs, "bad"), None);
        assert_eq!(get_u64(&pairs, "missing"), None);
    }

    #[test]
    fn escape_html_covers_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn js_literal_breaks_closing_tags() {
        let lit = js_string_literal(r#"{"a":"</script>"}"#);
        assert!(lit.starts_with('"'));
        assert!(!lit.contains("</"));
    }
}
