use super::font::FontHandle;

/// Greedy word wrap against measured advance widths.
///
/// Words wider than `max_width` are broken between characters.
pub fn wrap(font: &FontHandle, text: &str, max_width: u32) -> Vec<String> {
    let max_width = max_width as f32;
    let fits = |line: &str| font.measure(line, 0.0) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate =
            if current.is_empty() { word.to_owned() } else { format!("{current} {word}") };
        if fits(&candidate) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if fits(word) {
            current = word.to_owned();
            continue;
        }

        for ch in word.chars() {
            current.push(ch);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, ch.to_string()));
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::{BuiltinFace, FontFace};

    fn font() -> FontHandle {
        // 10 px per character.
        FontFace::Builtin(BuiltinFace::Regular).at(20)
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap(&font(), "recorded live in the laundry room", 120);
        assert_eq!(lines, ["recorded", "live in the", "laundry room"]);
    }

    #[test]
    fn breaks_overlong_words() {
        let lines = wrap(&font(), "abcdefghij xy", 40);
        assert_eq!(lines, ["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn blank_text_has_no_lines() {
        assert!(wrap(&font(), "   ", 100).is_empty());
    }
}
