use super::{Measure, TextStyle};

/// Greedily wraps `text` so that no line is wider than `max_width`.
///
/// Explicit line breaks are kept, blank lines included.  Words wider than the
/// limit are split between characters rather than allowed to overflow.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    measure: &dyn Measure,
    style: TextStyle,
) -> Vec<String> {
    let fits = |candidate: &str| measure.text_width(candidate, style) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_owned()
            } else {
                format!("{line} {word}")
            };

            if fits(candidate.as_str()) {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            if fits(word) {
                line = word.to_owned();
            } else {
                let mut pieces = split_word(word, &fits);
                line = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        lines.push(line);
    }

    lines
}

fn split_word(word: &str, fits: &dyn Fn(&str) -> bool) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for ch in word.chars() {
        piece.push(ch);
        if !fits(piece.as_str()) && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::replace(&mut piece, ch.to_string()));
        }
    }

    pieces.push(piece);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FixedPitch;

    fn wrap(text: &str, width: f64) -> Vec<String> {
        wrap_text(text, width, &FixedPitch::new(1.0), TextStyle::body())
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap("replace kitchen faucet", 150.0), ["replace kitchen faucet"]);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap("the quick brown fox jumps", 10.0),
            ["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn keeps_explicit_breaks() {
        assert_eq!(wrap("first\n\nsecond", 50.0), ["first", "", "second"]);
    }

    #[test]
    fn splits_words_wider_than_the_limit() {
        assert_eq!(wrap("abcdefghij xy", 4.0), ["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn no_line_exceeds_the_width() {
        let text = "Remove existing cabinets, patch drywall, prime and paint two coats, \
                    install new hardware and haul away all debris from the site.";
        for line in wrap(text, 30.0) {
            assert!(line.chars().count() <= 30, "line too wide: {line:?}");
        }
    }
}
