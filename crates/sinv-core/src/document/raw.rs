//! Degraded-mode PDF text recovery from raw content streams.
//!
//! This is not a PDF parser. It looks for `stream ... endstream` bodies in the
//! file bytes and keeps whatever reads as text. Compressed streams yield
//! nothing useful, and the output is noisy; callers must tolerate that.

use std::path::Path;

use lazy_static::lazy_static;
use regex::bytes::Regex;
use tracing::trace;

use super::Result;
use super::pdf::PdfTextExtractor;

lazy_static! {
    static ref STREAM_BODY: Regex =
        Regex::new(r"(?s-u)\bstream\r?\n(.*?)endstream").unwrap();

    static ref STRING_LITERAL: Regex =
        Regex::new(r"(?s-u)\(((?:[^()\\]|\\.)*)\)").unwrap();

    static ref SHOW_TEXT_OP: Regex =
        Regex::new(r#"(?-u)(?:\)\s*(?:Tj|'|")|\]\s*TJ)"#).unwrap();
}

/// Built-in fallback extractor that scans raw content streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawStreamScan;

impl PdfTextExtractor for RawStreamScan {
    fn name(&self) -> &'static str {
        "raw-stream-scan"
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        Ok(scan_bytes(&data))
    }
}

/// Recover text lines from the content streams of a PDF byte buffer.
///
/// Streams that show text through string literals contribute one line per
/// text-showing line of the stream. Other streams contribute their printable
/// characters.
pub fn scan_bytes(data: &[u8]) -> String {
    let mut lines = Vec::new();

    for caps in STREAM_BODY.captures_iter(data) {
        let body = &caps[1];
        let before = lines.len();

        if SHOW_TEXT_OP.is_match(body) {
            for line in body.split(|&b| b == b'\n' || b == b'\r') {
                if !SHOW_TEXT_OP.is_match(line) {
                    continue;
                }
                let text: String = STRING_LITERAL
                    .captures_iter(line)
                    .map(|c| unescape_literal(&c[1]))
                    .collect();
                let text = collapse_whitespace(&text);
                if !text.is_empty() {
                    lines.push(text);
                }
            }
        } else {
            for line in body.split(|&b| b == b'\n' || b == b'\r') {
                let text = collapse_whitespace(&printable(line));
                if !text.is_empty() {
                    lines.push(text);
                }
            }
        }

        trace!("Stream of {} bytes gave {} lines", body.len(), lines.len() - before);
    }

    lines.join("\n")
}

/// Decode the escapes of a PDF literal string body.
fn unescape_literal(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let b = raw[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }

        let Some(&next) = raw.get(i) else {
            break;
        };
        match next {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' | b'f' => out.push(b' '),
            b'0'..=b'7' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 3 && i < raw.len() && (b'0'..=b'7').contains(&raw[i]) {
                    value = value * 8 + (raw[i] - b'0') as u32;
                    i += 1;
                    digits += 1;
                }
                out.push((value & 0xff) as u8);
                continue;
            }
            // Backslash-newline continues the string on the next line.
            b'\n' | b'\r' => {}
            other => out.push(other),
        }
        i += 1;
    }

    printable(&out)
}

/// Replace every non-printable byte with a space.
fn printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { ' ' })
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_showing_streams() {
        let pdf = b"%PDF-1.4\n1 0 obj << /Length 99 >>\nstream\n\
BT /F1 10 Tf 50 700 Td (ITEMS START) Tj ET\n\
BT 50 680 Td (AB-1  Widget   2   $10.00) Tj ET\n\
BT 50 660 Td [(CD-)-20(2 Gadget 1 $5.50)] TJ ET\n\
BT 50 640 Td (ITEMS END) Tj ET\n\
endstream\nendobj\n%%EOF";

        assert_eq!(
            scan_bytes(pdf),
            "ITEMS START\nAB-1 Widget 2 $10.00\nCD-2 Gadget 1 $5.50\nITEMS END"
        );
    }

    #[test]
    fn test_plain_streams_keep_printable_text() {
        let pdf = b"stream\r\nHello\x01\x02 world\t\t!\r\n\xff\xfe\r\nSecond line\r\nendstream";
        assert_eq!(scan_bytes(pdf), "Hello world !\nSecond line");
    }

    #[test]
    fn test_endstream_is_not_a_stream_start() {
        let pdf = b"stream\n(A) Tj\nendstream\nstream\n(B) Tj\nendstream";
        assert_eq!(scan_bytes(pdf), "A\nB");
    }

    #[test]
    fn test_unescape_literal() {
        assert_eq!(unescape_literal(br"Price \(USD\)"), "Price (USD)");
        assert_eq!(unescape_literal(br"A\101B"), "AAB");
        assert_eq!(unescape_literal(br"tab\there"), "tab here");
        assert_eq!(unescape_literal(b"back\\\\slash"), "back\\slash");
    }

    #[test]
    fn test_no_streams_no_text() {
        assert_eq!(scan_bytes(b"%PDF-1.4 nothing here"), "");
    }
}
