//! Text sanitization applied to every model output (spec §4.2 step 3).

/// Strip outer quotes, collapse internal whitespace, trim, and ensure the
/// string ends in `.`, `!` or `?` (appending `.` otherwise).
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = strip_outer_quotes(trimmed);
    let collapsed = unquoted.split_whitespace().collect::<Vec<_>>().join(" ");
    ensure_terminal_punctuation(collapsed)
}

fn strip_outer_quotes(s: &str) -> &str {
    let pairs = [('"', '"'), ('\'', '\'')];
    for (open, close) in pairs {
        if s.len() >= 2 {
            let mut chars = s.chars();
            if chars.next() == Some(open) && chars.next_back() == Some(close) {
                return &s[open.len_utf8()..s.len() - close.len_utf8()];
            }
        }
    }
    s
}

fn ensure_terminal_punctuation(mut s: String) -> String {
    match s.chars().last() {
        Some('.') | Some('!') | Some('?') => s,
        _ => {
            s.push('.');
            s
        }
    }
}

/// Whitespace-delimited word count, used by the timing validator.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_outer_double_quotes() {
        assert_eq!(sanitize("\"Get ready!\""), "Get ready!");
    }

    #[test]
    fn strips_outer_single_quotes() {
        assert_eq!(sanitize("'Get ready'"), "Get ready.");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(sanitize("Get   ready\tnow"), "Get ready now.");
    }

    #[test]
    fn leaves_existing_terminal_punctuation() {
        assert_eq!(sanitize("Is it ready?"), "Is it ready?");
    }

    #[test]
    fn word_count_is_whitespace_delimited() {
        assert_eq!(word_count("one two three"), 3);
        assert_eq!(word_count("  one   two  "), 2);
    }
}
