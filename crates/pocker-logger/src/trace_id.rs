//! Decimal rendering of hex trace and span ids.

/// Renders the low 64 bits of a hex id as an unsigned decimal string.
///
/// Ids shorter than 16 characters, or whose tail is not plain hex digits, yield
/// an empty string. Longer ids keep only the characters from position 16 on.
pub fn convert_trace_id(id: &str) -> String {
    if id.len() < 16 {
        return String::new();
    }
    let tail = if id.len() > 16 { id.get(16..) } else { Some(id) };
    tail.filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|hex| u64::from_str_radix(hex, 16).ok())
        .map(|value| value.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_uses_low_64_bits() {
        assert_eq!(
            convert_trace_id("4bf92f3577b34da6a3ce929d0e0e4736"),
            "11803532876627986230"
        );
    }

    #[test]
    fn test_span_id_converts_whole_value() {
        assert_eq!(convert_trace_id("00f067aa0ba902b7"), "67667974448284343");
        assert_eq!(convert_trace_id("ffffffffffffffff"), "18446744073709551615");
    }

    #[test]
    fn test_short_or_malformed_ids_are_empty() {
        assert_eq!(convert_trace_id("abc"), "");
        assert_eq!(convert_trace_id(""), "");
        assert_eq!(convert_trace_id("zzzzzzzzzzzzzzzz"), "");
        assert_eq!(convert_trace_id("+fffffffffffffff"), "");
        assert_eq!(convert_trace_id("0000000000000000+fffffffffffffff"), "");
        assert_eq!(convert_trace_id("00000000000000001234567890abcdefff"), "");
    }
}
