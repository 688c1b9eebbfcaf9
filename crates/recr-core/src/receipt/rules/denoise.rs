//! Transcript denoising.
//!
//! OCR output arrives with ragged spacing and digit/letter confusions that
//! corrupt price columns. Normalization is deliberately narrow: whitespace is
//! collapsed per line, and the classic confusions (`l`→`1`, `O`→`0`, `S`→`5`)
//! are fixed only when the character sits next to a digit and not inside an
//! alphabetic word, so item names come through untouched.

/// Normalize a raw OCR transcript, preserving line breaks.
pub fn denoise(transcript: &str) -> String {
    transcript
        .lines()
        .map(|line| fix_digit_confusions(&collapse_spaces(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_spaces(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fix_digit_confusions(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());

    for (i, &c) in chars.iter().enumerate() {
        let replacement = match c {
            'l' => '1',
            'O' => '0',
            'S' => '5',
            _ => {
                out.push(c);
                continue;
            }
        };

        let prev = i.checked_sub(1).and_then(|p| chars.get(p).copied());
        let next = chars.get(i + 1).copied();
        let digit_adjacent = prev.is_some_and(|p| p.is_ascii_digit())
            || next.is_some_and(|n| n.is_ascii_digit());
        let in_word =
            prev.is_some_and(|p| p.is_alphabetic()) || next.is_some_and(|n| n.is_alphabetic());

        if digit_adjacent && !in_word {
            out.push(replacement);
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_runs_of_spaces_and_tabs() {
        assert_eq!(denoise("4\tCheese  Burger    5.99\t23.96"), "4 Cheese Burger 5.99 23.96");
    }

    #[test]
    fn test_preserves_line_breaks() {
        assert_eq!(denoise("a  b\nc\td"), "a b\nc d");
    }

    #[test]
    fn test_fixes_confusions_next_to_digits() {
        assert_eq!(denoise("$1O.99"), "$10.99");
        assert_eq!(denoise("l2.45"), "12.45");
        assert_eq!(denoise("5.9S"), "5.95");
        assert_eq!(denoise("1l.00"), "11.00");
    }

    #[test]
    fn test_leaves_alphabetic_words_alone() {
        assert_eq!(denoise("Oatmeal Stack 5.99"), "Oatmeal Stack 5.99");
        assert_eq!(denoise("SODA lime"), "SODA lime");
        // adjacent digit but still inside a word
        assert_eq!(denoise("5Off coupon"), "5Off coupon");
    }

    #[test]
    fn test_case_and_punctuation_untouched() {
        assert_eq!(denoise("MILK, 2%:  $3.99"), "MILK, 2%: $3.99");
    }
}
