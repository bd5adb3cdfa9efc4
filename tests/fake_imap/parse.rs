//! Minimal line tokenizer for the two commands the server parses by
//! hand instead of through `imap-codec`'s typed decoder: `CREATE` and
//! `APPEND`. Both carry a folder name that may be quoted and, for
//! `APPEND`, a parenthesized flag list, a quoted date, and a trailing
//! literal-length marker -- exactly the shapes this crate's own
//! [`crate::imap::client::ImapClient`] writes on the wire.

/// Split a command's argument text into tokens, treating
/// double-quoted spans and parenthesized spans as single tokens with
/// their delimiters stripped (quotes) or kept (parens), respectively.
pub fn tokenize(args: &str) -> Vec<String> {
    let chars: Vec<char> = args.trim().chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            ' ' => i += 1,
            '"' => {
                let mut j = i + 1;
                let mut s = String::new();
                while j < chars.len() && chars[j] != '"' {
                    s.push(chars[j]);
                    j += 1;
                }
                tokens.push(s);
                i = j + 1;
            }
            '(' => {
                let mut depth = 1;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && depth > 0 {
                    match chars[j] {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    j += 1;
                }
                let inner: String = chars[start..j.saturating_sub(1)].iter().collect();
                tokens.push(format!("({inner})"));
                i = j;
            }
            _ => {
                let start = i;
                while i < chars.len() && chars[i] != ' ' {
                    i += 1;
                }
                tokens.push(chars[start..i].iter().collect());
            }
        }
    }
    tokens
}

/// The literal byte count a line requests, if its last non-CRLF
/// character is a `}` closing a `{N}` or `{N+}` marker.
pub fn literal_len(line: &str) -> Option<usize> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if !trimmed.ends_with('}') {
        return None;
    }
    let start = trimmed.rfind('{')?;
    let inner = trimmed[start + 1..trimmed.len() - 1].trim_end_matches('+');
    inner.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_quoted_folder_flags_and_date() {
        let tokens = tokenize(r#""INBOX.Archive" (\Seen \Answered) "01-Jan-2024 00:00:00 +0000" {1024}"#);
        assert_eq!(
            tokens,
            vec![
                "INBOX.Archive".to_string(),
                "(\\Seen \\Answered)".to_string(),
                "01-Jan-2024 00:00:00 +0000".to_string(),
                "{1024}".to_string(),
            ]
        );
    }

    #[test]
    fn tokenizes_unquoted_folder_name() {
        let tokens = tokenize("Archive () {0}");
        assert_eq!(tokens, vec!["Archive".to_string(), "()".to_string(), "{0}".to_string()]);
    }

    #[test]
    fn literal_len_parses_plain_marker() {
        assert_eq!(literal_len("APPEND INBOX {42}\r\n"), Some(42));
    }

    #[test]
    fn literal_len_parses_non_synchronizing_marker() {
        assert_eq!(literal_len("APPEND INBOX {42+}\r\n"), Some(42));
    }

    #[test]
    fn literal_len_none_without_marker() {
        assert_eq!(literal_len("LOGOUT\r\n"), None);
    }
}
