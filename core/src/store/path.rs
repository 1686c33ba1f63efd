/// Percent-encodes a single path segment.
///
/// Every byte outside `A-Z a-z 0-9 - _ . * ~` is escaped, so `/` inside a
/// title cannot introduce a directory level. Equal inputs always give equal
/// outputs.
pub fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Joins a base path and a relative name with a single `/`.
///
/// An empty base yields `name` unchanged (repository root).
pub fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_spaces_and_reserved_characters() {
        assert_eq!(encode_segment("Report v1"), "Report%20v1");
        assert_eq!(encode_segment("a/b?c#d"), "a%2Fb%3Fc%23d");
        assert_eq!(encode_segment("plain-name_1.pdf"), "plain-name_1.pdf");
    }

    #[test]
    fn encodes_non_ascii_as_utf8_bytes() {
        assert_eq!(encode_segment("Bericht ü"), "Bericht%20%C3%BC");
    }

    #[test]
    fn join_handles_empty_and_slashed_bases() {
        assert_eq!(join_path("", "index.json"), "index.json");
        assert_eq!(join_path("/docs/", "index.json"), "docs/index.json");
        assert_eq!(join_path("docs/2024", "a"), "docs/2024/a");
    }
}
