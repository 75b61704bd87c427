//! Best-effort repair of malformed export objects.
//!
//! Applied only after a chunk fails to parse. The rules are lexical and
//! conservative:
//!
//! - a `"` inside a string is a closing quote only when the next
//!   non-whitespace character is `,` `:` `}` `]` or the end of input;
//!   otherwise it is escaped (`"email":"mario"rossi@x.it"` keeps the quote as
//!   part of the value)
//! - raw control characters inside strings are escaped
//! - a backslash that does not start a valid JSON escape is doubled
//! - a trailing comma before `}` or `]` is dropped

/// Repair `text`, returning `None` when none of the rules changed anything.
#[must_use]
pub fn repair(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut changed = false;
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        if in_string {
            match c {
                '\\' => match chars.get(i + 1) {
                    Some(&next) if is_escape(next) => {
                        out.push('\\');
                        out.push(next);
                        i += 1;
                    }
                    _ => {
                        out.push_str("\\\\");
                        changed = true;
                    }
                },
                '"' => {
                    if closes_string(&chars, i + 1) {
                        in_string = false;
                        out.push('"');
                    } else {
                        out.push_str("\\\"");
                        changed = true;
                    }
                }
                '\n' => {
                    out.push_str("\\n");
                    changed = true;
                }
                '\r' => {
                    out.push_str("\\r");
                    changed = true;
                }
                '\t' => {
                    out.push_str("\\t");
                    changed = true;
                }
                c if c.is_control() => {
                    out.push_str(&format!("\\u{:04x}", u32::from(c)));
                    changed = true;
                }
                c => out.push(c),
            }
        } else {
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                ',' if matches!(next_significant(&chars, i + 1), Some('}' | ']')) => {
                    changed = true;
                }
                c => out.push(c),
            }
        }
        i += 1;
    }

    changed.then_some(out)
}

const fn is_escape(c: char) -> bool {
    matches!(c, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars
        .get(from..)
        .and_then(|rest| rest.iter().copied().find(|c| !c.is_whitespace()))
}

fn closes_string(chars: &[char], from: usize) -> bool {
    matches!(
        next_significant(chars, from),
        None | Some(',' | ':' | '}' | ']')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_escapes_stray_quote_in_email() {
        let broken = r#"{"card_number":"2020000028284","email":"mario"rossi@example.it","nome":"MARIO"}"#;
        assert!(serde_json::from_str::<Value>(broken).is_err());

        let fixed = repair(broken).unwrap();
        let value = parse(&fixed);

        assert_eq!(value["email"], "mario\"rossi@example.it");
        assert_eq!(value["nome"], "MARIO");
    }

    #[test]
    fn test_escapes_control_characters() {
        let fixed = repair("{\"indirizzo\":\"VIA ROMA\n1\",\"cap\":\"\t20121\"}").unwrap();
        let value = parse(&fixed);
        assert_eq!(value["indirizzo"], "VIA ROMA\n1");
        assert_eq!(value["cap"], "\t20121");
    }

    #[test]
    fn test_doubles_invalid_backslash() {
        let fixed = repair(r#"{"note":"C:\dati\x","ok":"a\"b"}"#).unwrap();
        let value = parse(&fixed);
        assert_eq!(value["note"], r"C:\dati\x");
        assert_eq!(value["ok"], "a\"b");
    }

    #[test]
    fn test_drops_trailing_commas() {
        let fixed = repair("{\"a\":[1,2,],\"b\":\"x\",\n}").unwrap();
        assert_eq!(parse(&fixed), parse("{\"a\":[1,2],\"b\":\"x\"}"));
    }

    #[test]
    fn test_valid_json_is_untouched() {
        assert_eq!(repair(r#"{"a":"b, c","d":["e"]}"#), None);
    }

    #[test]
    fn test_commas_inside_strings_are_kept() {
        assert_eq!(repair(r#"{"a":"x,}"}"#), None);
    }
}
