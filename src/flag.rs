//! IMAP flag atom validation.
//!
//! The transfer engine carries flags as plain `String`s end to end
//! (see [`crate::imap::Message`]) rather than a typed enum, since the
//! destination only needs to reproduce whatever atoms the source
//! reported -- it never inspects or branches on their meaning. The
//! one place that matters is the wire: IMAP flag atoms are a
//! restricted character class (RFC 3501 `atom` / `flag`), and a flag
//! string containing whitespace or parentheses would corrupt the
//! `APPEND` command line it's embedded in. [`is_atom`] is the check
//! that draws that line, so callers can reject or warn instead of
//! sending a malformed command.

/// Whether `flag` is safe to embed as a single IMAP flag atom: a
/// leading `\` or `$` (both legal with the subsequent characters
/// unrestricted for this purpose) is allowed, but no whitespace,
/// parentheses, braces, percent, quote, or control characters.
#[must_use]
pub fn is_atom(flag: &str) -> bool {
    let Some(first) = flag.chars().next() else {
        return false;
    };
    let rest_ok = flag.chars().skip(1).all(|c| c != '\\' && !is_invalid_atom_char(c));
    rest_ok && (first == '\\' || !is_invalid_atom_char(first))
}

fn is_invalid_atom_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '{' | '}' | '%' | '"') || c.is_control()
}
