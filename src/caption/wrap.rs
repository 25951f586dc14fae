//! Greedy width-constrained line wrapping.
//!
//! Each `\n`-separated paragraph is wrapped on its own. Within a paragraph
//! the scan moves forward over whitespace runs, keeping the longest prefix
//! that fits; earlier breaks are never revisited. A token wider than the
//! limit on its own still gets its own line rather than being split.

use super::font::FontMetrics;

/// Wrap `text` into lines no wider than `max_width` as measured by `font`.
///
/// Paragraph edges are trimmed; whitespace between words inside a line is
/// kept as written. An empty paragraph yields an empty line.
pub fn wrap(max_width: f32, text: &str, font: &dyn FontMetrics) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut rest = paragraph.trim();
        if rest.is_empty() {
            lines.push(String::new());
            continue;
        }
        while !rest.is_empty() {
            let (line, next) = take_line(max_width, rest, font);
            lines.push(line.to_string());
            rest = next;
        }
    }
    lines
}

/// Split `text` (trimmed, non-empty) into the next line and the remainder.
fn take_line<'a>(max_width: f32, text: &'a str, font: &dyn FontMetrics) -> (&'a str, &'a str) {
    if font.measure_width(text) <= max_width {
        return (text, "");
    }

    let runs = whitespace_runs(text);
    let mut cut = None;
    for &(start, end) in &runs {
        if font.measure_width(&text[..start]) > max_width {
            break;
        }
        cut = Some((start, end));
    }

    // Nothing fits: the first token goes out alone
    let (start, end) = cut
        .or_else(|| runs.first().copied())
        .unwrap_or((text.len(), text.len()));
    (&text[..start], &text[end..])
}

/// Byte ranges of maximal whitespace runs.
fn whitespace_runs(text: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                runs.push((start, i));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        runs.push((start, text.len()));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FixedWidthFont;

    /// One pixel per char, so widths equal char counts.
    fn unit() -> FixedWidthFont {
        FixedWidthFont::new(1.0, 1)
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap(80.0, "a short caption", &unit()), vec!["a short caption"]);
    }

    #[test]
    fn breaks_at_last_fitting_space() {
        let lines = wrap(11.0, "the quick brown fox jumps", &unit());
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn exact_fit_is_not_broken() {
        assert_eq!(wrap(9.0, "the quick", &unit()), vec!["the quick"]);
    }

    #[test]
    fn newline_always_breaks() {
        let lines = wrap(100.0, "first\nsecond", &unit());
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn empty_paragraph_is_empty_line() {
        let lines = wrap(100.0, "one\n\ntwo", &unit());
        assert_eq!(lines, vec!["one", "", "two"]);
        assert_eq!(wrap(100.0, "", &unit()), vec![""]);
    }

    #[test]
    fn paragraph_edges_are_trimmed() {
        assert_eq!(wrap(100.0, "   padded   ", &unit()), vec!["padded"]);
    }

    #[test]
    fn lone_long_token_overflows_on_its_own_line() {
        let lines = wrap(5.0, "a supercalifragilistic b", &unit());
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn leading_long_token_is_emitted_whole() {
        let lines = wrap(3.0, "unbreakable", &unit());
        assert_eq!(lines, vec!["unbreakable"]);
    }

    #[test]
    fn inner_whitespace_is_preserved_and_breaks_consume_runs() {
        let lines = wrap(6.0, "ab  cd   efgh", &unit());
        assert_eq!(lines, vec!["ab  cd", "efgh"]);
    }

    #[test]
    fn lines_never_exceed_width_except_lone_tokens() {
        let text = "Stars are born in dense clouds of gas and dust, collapsing \
                    under gravity until nuclear fusion ignites in their cores.\n\
                    Photodissociation regions glow brightly.";
        for max in [4.0, 8.0, 13.0, 20.0, 37.0, 200.0] {
            for line in wrap(max, text, &unit()) {
                let fits = line.chars().count() as f32 <= max;
                let lone = !line.contains(char::is_whitespace);
                assert!(fits || lone, "width {max}: {line:?}");
            }
        }
    }

    #[test]
    fn wrapping_loses_no_words() {
        let text = "one two three four five six seven eight nine ten";
        let lines = wrap(9.0, text, &unit());
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn scaled_advance_changes_breaks() {
        let wide = FixedWidthFont::new(10.0, 12);
        assert_eq!(wrap(50.0, "abc def", &wide), vec!["abc", "def"]);
        assert_eq!(wrap(70.0, "abc def", &wide), vec!["abc def"]);
    }
}
