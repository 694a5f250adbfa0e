//! Quoting decisions and byte-level writing for the unparser.

/// True if `field` needs wrapping in `quote` given `delimiter`: it contains
/// the delimiter, the quote character itself, or a CR/LF.
pub fn field_needs_quoting(field: &[u8], delimiter: u8, quote: u8) -> bool {
    field
        .iter()
        .any(|&b| b == delimiter || b == quote || b == b'\r' || b == b'\n')
}

/// Write `field` wrapped in `quote`, doubling every occurrence of `quote`
/// with `escape` (normally the same byte).
pub fn write_quoted_field(out: &mut Vec<u8>, field: &[u8], quote: u8, escape: u8) {
    out.push(quote);
    for &b in field {
        if b == quote {
            out.push(escape);
        }
        out.push(b);
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_need_for_quoting() {
        assert!(field_needs_quoting(b"a,b", b',', b'"'));
        assert!(field_needs_quoting(b"a\"b", b',', b'"'));
        assert!(field_needs_quoting(b"a\nb", b',', b'"'));
        assert!(!field_needs_quoting(b"abc", b',', b'"'));
    }

    #[test]
    fn doubles_quote_char_on_write() {
        let mut out = Vec::new();
        write_quoted_field(&mut out, b"a\"b", b'"', b'"');
        assert_eq!(out, b"\"a\"\"b\"");
    }
}
