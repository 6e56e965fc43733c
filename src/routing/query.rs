//! Query string and form body parsing
//!
//! Parsing is total: an entry whose percent-encoding is malformed keeps its
//! raw text instead of failing the request.

use super::Params;

/// Decode `%XX` escapes. `None` on a bad escape or non-UTF-8 result.
pub fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied().and_then(hex_value)?;
            let lo = bytes.get(i + 2).copied().and_then(hex_value)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Percent-decode, keeping `raw` untouched when it is malformed
pub fn decode_or_raw(raw: &str) -> String {
    percent_decode(raw).unwrap_or_else(|| raw.to_string())
}

/// Form-style decoding: `+` is a space, then `%XX` escapes
fn decode_form_component(raw: &str) -> String {
    if raw.contains('+') {
        percent_decode(&raw.replace('+', " ")).unwrap_or_else(|| raw.to_string())
    } else {
        decode_or_raw(raw)
    }
}

/// Parse a raw query string (without the leading `?`)
///
/// Entries are split on `&`, then on the first `=`. A key without `=` maps to
/// an empty string and the last occurrence of a duplicated key wins.
pub fn parse_query(raw: &str) -> Params {
    let mut params = Params::new();
    for entry in raw.split('&').filter(|e| !e.is_empty()) {
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
        params.insert(decode_form_component(key), decode_form_component(value));
    }
    params
}

/// Parse an `application/x-www-form-urlencoded` body
pub fn parse_form(body: &[u8]) -> Params {
    parse_query(&String::from_utf8_lossy(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &str) -> String {
        s.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{b:02X}"),
            })
            .collect()
    }

    fn serialize(params: &Params) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    #[test]
    fn test_basic_pairs() {
        let params = parse_query("first=John&last=Doe");
        assert_eq!(params.get("first").map(String::as_str), Some("John"));
        assert_eq!(params.get("last").map(String::as_str), Some("Doe"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_entry_without_equals_is_empty() {
        let params = parse_query("flag&x=1");
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.get("x").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_splits_on_first_equals_only() {
        let params = parse_query("expr=a=b");
        assert_eq!(params.get("expr").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let params = parse_query("first=A&first=B&first=C");
        assert_eq!(params.get("first").map(String::as_str), Some("C"));
    }

    #[test]
    fn test_decodes_keys_and_values() {
        let params = parse_query("full%20name=Jane+Q%2E+Doe&caf%C3%A9=ok");
        assert_eq!(params.get("full name").map(String::as_str), Some("Jane Q. Doe"));
        assert_eq!(params.get("café").map(String::as_str), Some("ok"));
    }

    #[test]
    fn test_malformed_entry_keeps_raw_text() {
        let params = parse_query("bad=%zz&trunc=%4&good=%41&utf=%FF");
        assert_eq!(params.get("bad").map(String::as_str), Some("%zz"));
        assert_eq!(params.get("trunc").map(String::as_str), Some("%4"));
        assert_eq!(params.get("good").map(String::as_str), Some("A"));
        assert_eq!(params.get("utf").map(String::as_str), Some("%FF"));
    }

    #[test]
    fn test_empty_and_stray_separators() {
        assert!(parse_query("").is_empty());
        let params = parse_query("&&a=1&&");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_roundtrip_well_formed() {
        let mut params = Params::new();
        params.insert("first".to_string(), "John".to_string());
        params.insert("last name".to_string(), "Doe & Sons".to_string());
        params.insert("emoji".to_string(), "✓=yes".to_string());
        params.insert("empty".to_string(), String::new());
        assert_eq!(parse_query(&serialize(&params)), params);
    }

    #[test]
    fn test_form_body() {
        let params = parse_form(b"first=Ada&last=Lovelace");
        assert_eq!(params.get("first").map(String::as_str), Some("Ada"));
        assert_eq!(params.get("last").map(String::as_str), Some("Lovelace"));
    }

    #[test]
    fn test_percent_decode_strict() {
        assert_eq!(percent_decode("a%2Fb").as_deref(), Some("a/b"));
        assert_eq!(percent_decode("100%"), None);
        assert_eq!(decode_or_raw("100%"), "100%");
    }
}
