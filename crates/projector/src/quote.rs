//! String quoting for the device command grammar
//!
//! Property values that reach the device inside a command line must be
//! wrapped in quotes and have grammar characters escaped. The device rejects
//! commands whose length changed underneath it, so unprintable characters
//! are replaced with a placeholder instead of being removed.

/// Quote character of the command grammar
const QUOTE: char = '"';

/// Replacement for control characters that have no escape sequence
const PLACEHOLDER: char = '.';

/// Characters that may legally follow a backslash in an escape sequence
fn is_escapable(c: char) -> bool {
    matches!(
        c,
        'r' | 'n' | 't' | 'f' | 'b' | '\\' | '*' | '"' | ';' | '$' | '[' | ']' | '{' | '}'
    )
}

/// Wrap `raw` in command-grammar quotes, escaping everything the grammar
/// treats specially.
///
/// Escaped: CR, LF, TAB, form-feed, backspace, backslash, the glob
/// character `*`, the quote character, and the structural characters
/// `;` `$` `[` `]` `{` `}`. Remaining control characters become `.`.
///
/// Idempotent: input already starting with the quote character is returned
/// unchanged, and well-formed escape sequences in the input are preserved
/// rather than re-escaped.
pub fn quote(raw: &str) -> String {
    if raw.starts_with(QUOTE) {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len() + 2);
    out.push(QUOTE);

    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '\u{8}' => out.push_str("\\b"),
            '\\' => match chars.peek() {
                // An existing escape sequence stays as it is
                Some(&next) if is_escapable(next) => {
                    chars.next();
                    out.push('\\');
                    out.push(next);
                }
                _ => out.push_str("\\\\"),
            },
            '*' | '"' | ';' | '$' | '[' | ']' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push(PLACEHOLDER),
            c => out.push(c),
        }
    }

    out.push(QUOTE);
    out
}

/// Remove the surrounding quote characters from a quoted string
///
/// Returns the input unchanged if it is not wrapped in quotes.
pub fn strip_quotes(quoted: &str) -> &str {
    quoted
        .strip_prefix(QUOTE)
        .and_then(|s| s.strip_suffix(QUOTE))
        .unwrap_or(quoted)
}
