//! Command-line tokenizer.
//!
//! Splits a raw command line into whitespace-delimited tokens:
//!
//! - `'...'` and `"..."` group whitespace into a single token; the quote characters are
//!   stripped from the emitted token;
//! - inside quotes, `\` followed by the active quote character or another `\` yields that
//!   character literally; before any other character the backslash is kept as-is;
//! - outside quotes, `\'`, `\"` and `\\` likewise yield the literal character;
//! - a trailing `\` at the end of input is a literal backslash.

use crate::parser::ParseError;

/// Split `input` into tokens.
///
/// Fails with [`ParseError::UnclosedQuote`] if a quote is opened and never closed.
///
/// # Example
///
/// ```rust
/// use mindmap_core::tokenize;
///
/// assert_eq!(
///     tokenize(r#"rename --text "Quarterly plan" --nodeId n1"#).unwrap(),
///     vec!["rename", "--text", "Quarterly plan", "--nodeId", "n1"]
/// );
/// assert!(tokenize("a 'b c").is_err());
/// ```
pub fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A quoted empty string (`''`) still produces a token.
    let mut in_token = false;
    let mut quote: Option<(char, usize)> = None;
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if let Some((active, _)) = quote {
            if ch == '\\' {
                match chars.peek() {
                    Some(&(_, next)) if next == active || next == '\\' => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                }
            } else if ch == active {
                quote = None;
            } else {
                current.push(ch);
            }
            continue;
        }

        match ch {
            '\\' => {
                match chars.peek() {
                    Some(&(_, next)) if matches!(next, '\'' | '"' | '\\') => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                }
                in_token = true;
            }
            '\'' | '"' => {
                quote = Some((ch, offset));
                in_token = true;
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if let Some((quote, position)) = quote {
        return Err(ParseError::UnclosedQuote { quote, position });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words_round_trip() {
        for input in ["delete", "down --count 5", "center node-123", "a b c d"] {
            assert_eq!(tokenize(input).unwrap().join(" "), input);
        }
    }

    #[test]
    fn test_collapses_repeated_whitespace() {
        assert_eq!(tokenize("  up \t  --count   2 ").unwrap(), vec!["up", "--count", "2"]);
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_quotes_group_and_are_stripped() {
        assert_eq!(tokenize("a 'b c'").unwrap(), vec!["a", "b c"]);
        assert_eq!(tokenize(r#"a "b  c" d"#).unwrap(), vec!["a", "b  c", "d"]);
        assert_eq!(tokenize(r#"say "it's""#).unwrap(), vec!["say", "it's"]);
        assert_eq!(tokenize("pre'fix suf'fix").unwrap(), vec!["prefix suffix"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_token() {
        assert_eq!(tokenize("rename --text ''").unwrap(), vec!["rename", "--text", ""]);
    }

    #[test]
    fn test_unclosed_quote() {
        assert_eq!(
            tokenize("a 'b c").unwrap_err(),
            ParseError::UnclosedQuote {
                quote: '\'',
                position: 2
            }
        );
        assert!(tokenize(r#"say "hi"#).is_err());
    }

    #[test]
    fn test_escapes() {
        assert_eq!(tokenize(r#"say \"hi\""#).unwrap(), vec!["say", "\"hi\""]);
        assert_eq!(tokenize(r#"say "\"hi\"""#).unwrap(), vec!["say", "\"hi\""]);
        assert_eq!(tokenize(r"say 'it\'s'").unwrap(), vec!["say", "it's"]);
        assert_eq!(tokenize(r#"path "a\\b""#).unwrap(), vec!["path", r"a\b"]);
    }

    #[test]
    fn test_backslash_before_other_chars_is_kept() {
        assert_eq!(tokenize(r"a\nb").unwrap(), vec![r"a\nb"]);
        // Inside double quotes, `\'` is not the active quote: the backslash stays.
        assert_eq!(tokenize(r#""it\'s""#).unwrap(), vec![r"it\'s"]);
    }

    #[test]
    fn test_trailing_backslash_is_literal() {
        assert_eq!(tokenize(r"end\").unwrap(), vec![r"end\"]);
        assert!(tokenize("'open\\").is_err());
    }
}
