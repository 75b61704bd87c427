//! Streaming record splitter for the bulk export.

use std::io::{self, BufRead};

/// One brace-delimited object cut out of the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Zero-based position of the chunk in the export.
    pub index: usize,
    /// Byte offset of the opening brace.
    pub offset: u64,
    /// Decoded text of the object, braces included.
    pub text: String,
    /// Whether the input ended before the object was closed.
    pub truncated: bool,
}

/// Splits an export into top-level JSON objects in a single pass.
///
/// The export is not valid JSON as a whole (and not line-delimited either), so
/// objects are found by counting braces outside string values. Braces inside
/// a string are ignored. A `"` inside a string closes it only when the next
/// non-whitespace byte is `,` `:` `}` or `]`, the same rule
/// [`repair`](super::repair::repair) applies, so an unescaped quote inside a
/// value does not flip the scanner out of sync. Anything between objects
/// (commas, array brackets, whitespace, a BOM) is skipped.
///
/// Chunks are decoded as UTF-8, falling back to Latin-1 for exports written
/// by the older till software.
pub struct ExportReader<R> {
    inner: R,
    offset: u64,
    index: usize,
    done: bool,
}

impl<R: BufRead> ExportReader<R> {
    /// Wrap a buffered reader.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            index: 0,
            done: false,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    fn next_chunk(&mut self) -> io::Result<Option<RawChunk>> {
        let mut bytes = Vec::new();
        let mut scanner = Scanner::default();
        let mut start = None;

        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                return Ok(start.map(|offset| self.emit(offset, bytes, true)));
            }

            let mut consumed = 0_usize;
            let mut closed = false;

            for &byte in available {
                consumed += 1;
                if start.is_none() {
                    if byte != b'{' {
                        continue;
                    }
                    start = Some(self.offset + consumed as u64 - 1);
                }
                bytes.push(byte);
                if scanner.feed(byte) {
                    closed = true;
                    break;
                }
            }

            self.inner.consume(consumed);
            self.offset += consumed as u64;

            if closed {
                let offset = start.unwrap_or_default();
                return Ok(Some(self.emit(offset, bytes, false)));
            }
        }
    }

    fn emit(&mut self, offset: u64, bytes: Vec<u8>, truncated: bool) -> RawChunk {
        let index = self.index;
        self.index += 1;
        RawChunk {
            index,
            offset,
            text: decode(bytes),
            truncated,
        }
    }
}

impl<R: BufRead> Iterator for ExportReader<R> {
    type Item = io::Result<RawChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Lexeme {
    #[default]
    Structure,
    Text,
    Escape,
    /// A `"` inside a string, pending the next significant byte.
    Quote,
}

/// Brace and string state for one object.
#[derive(Debug, Default)]
struct Scanner {
    depth: usize,
    lexeme: Lexeme,
}

impl Scanner {
    /// Feed one byte of the object, returning `true` once it is closed.
    fn feed(&mut self, byte: u8) -> bool {
        let lexeme = match self.lexeme {
            Lexeme::Quote if byte.is_ascii_whitespace() => return false,
            Lexeme::Quote if matches!(byte, b',' | b':' | b'}' | b']') => Lexeme::Structure,
            Lexeme::Quote => Lexeme::Text,
            other => other,
        };

        let mut closed = false;
        self.lexeme = match (lexeme, byte) {
            (Lexeme::Structure, b'"') => Lexeme::Text,
            (Lexeme::Structure, b'{') => {
                self.depth += 1;
                Lexeme::Structure
            }
            (Lexeme::Structure, b'}') => {
                self.depth = self.depth.saturating_sub(1);
                closed = self.depth == 0;
                Lexeme::Structure
            }
            (Lexeme::Text, b'\\') => Lexeme::Escape,
            (Lexeme::Text, b'"') => Lexeme::Quote,
            (Lexeme::Escape, _) => Lexeme::Text,
            (other, _) => other,
        };
        closed
    }
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::io::{BufReader, Cursor};

    use super::*;

    fn chunks(input: &[u8]) -> Vec<RawChunk> {
        ExportReader::new(Cursor::new(input.to_vec()))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_splits_concatenated_objects() {
        let out = chunks(b"{\"a\":\"1\"}{\"a\":\"2\"}\n{\"a\":\"3\"}");
        let texts: Vec<_> = out.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["{\"a\":\"1\"}", "{\"a\":\"2\"}", "{\"a\":\"3\"}"]);
        assert_eq!(out[2].index, 2);
        assert!(out.iter().all(|c| !c.truncated));
    }

    #[test]
    fn test_skips_array_wrapper_and_separators() {
        let out = chunks(b"\xEF\xBB\xBF[\n  {\"a\":1},\n  {\"a\":2}\n]\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].offset, 7);
        assert_eq!(out[1].text, "{\"a\":2}");
    }

    #[test]
    fn test_nested_objects_stay_together() {
        let out = chunks(b"{\"a\":{\"b\":{}}} {\"c\":1}");
        assert_eq!(out[0].text, "{\"a\":{\"b\":{}}}");
        assert_eq!(out[1].text, "{\"c\":1}");
    }

    #[test]
    fn test_stray_quote_does_not_merge_records() {
        let out = chunks(b"{\"email\":\"a\"b@x.it\"}\n{\"email\":\"c@x.it\"}");
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].text, "{\"email\":\"c@x.it\"}");
    }

    #[test]
    fn test_open_brace_in_value_does_not_swallow_records() {
        let out = chunks(concat!(
            r#"{"card_number":"1","indirizzo":"VIA ROMA {INT 3","nome":"A"}"#,
            "\n",
            r#"{"card_number":"2"}"#,
            "\n",
            r#"{"card_number":"3"}"#,
        ).as_bytes());
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|c| !c.truncated));
        assert_eq!(
            out[0].text,
            r#"{"card_number":"1","indirizzo":"VIA ROMA {INT 3","nome":"A"}"#
        );
        assert_eq!(out[2].text, r#"{"card_number":"3"}"#);
    }

    #[test]
    fn test_close_brace_in_value_stays_in_record() {
        let out = chunks(concat!(
            r#"{"card_number":"1","note":"a} b","nome":"A"}"#,
            r#"{"card_number":"2"}"#,
        ).as_bytes());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, r#"{"card_number":"1","note":"a} b","nome":"A"}"#);
        assert_eq!(out[1].offset, 44);
    }

    #[test]
    fn test_escaped_quote_and_brace_in_value() {
        let out = chunks(br#"{"note":"say "}" ","x":"y" } {"a":1}"#);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, r#"{"note":"say "}" ","x":"y" }"#);
    }

    #[test]
    fn test_stray_quote_before_brace_in_value() {
        let out = chunks(b"{\"nome\":\"A\"B {C\",\"n\":1}\n{\"n\":2}");
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].text, "{\"n\":2}");
    }

    #[test]
    fn test_truncated_tail() {
        let out = chunks(b"{\"a\":1}\n{\"a\":");
        assert_eq!(out.len(), 2);
        assert!(!out[0].truncated);
        assert!(out[1].truncated);
        assert_eq!(out[1].text, "{\"a\":");
    }

    #[test]
    fn test_latin1_fallback() {
        let out = chunks(b"{\"localita\":\"CANT\xD9\"}");
        assert_eq!(out[0].text, "{\"localita\":\"CANTÙ\"}");
    }

    #[test]
    fn test_small_buffer_boundaries() {
        let input = b"{\"a\":\"x\"} {\"b\":{\"c\":\"y\"}}".to_vec();
        let reader = ExportReader::new(BufReader::with_capacity(3, Cursor::new(input)));
        let out: Vec<_> = reader.collect::<io::Result<_>>().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].text, "{\"b\":{\"c\":\"y\"}}");
        assert_eq!(out[1].offset, 10);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunks(b"  \n").is_empty());
    }
}
