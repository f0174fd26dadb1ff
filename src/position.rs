//! Translation between (line, character) positions and byte offsets
//!
//! Lines and characters are 0-based, matching the editor protocol. All
//! offsets are byte offsets into the document text.

/// Convert a (line, character) position to a byte offset.
///
/// Positions past the end of a line clamp to the end of that line;
/// lines past the end of the text clamp to the end of the text.
pub fn offset_at(text: &str, line: u32, character: u32) -> usize {
    let mut current_line = 0u32;
    let mut line_start = 0usize;

    if line > 0 {
        let mut found = false;
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                current_line += 1;
                if current_line == line {
                    line_start = i + 1;
                    found = true;
                    break;
                }
            }
        }
        if !found {
            return text.len();
        }
    }

    let line_end = text[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(text.len());

    (line_start + character as usize).min(line_end)
}

/// Convert a byte offset to a (line, character) position.
pub fn position_at(text: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(text.len());
    let mut line = 0u32;
    let mut line_start = 0usize;

    for (i, b) in text.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }

    (line, (offset - line_start) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_at_start() {
        assert_eq!(offset_at("hello\nworld", 0, 0), 0);
    }

    #[test]
    fn test_offset_at_second_line() {
        assert_eq!(offset_at("hello\nworld", 1, 0), 6);
        assert_eq!(offset_at("hello\nworld", 1, 3), 9);
    }

    #[test]
    fn test_offset_at_clamps_to_line_end() {
        assert_eq!(offset_at("hi\nworld", 0, 99), 2);
    }

    #[test]
    fn test_offset_at_clamps_to_text_end() {
        assert_eq!(offset_at("hi\nworld", 9, 0), 8);
    }

    #[test]
    fn test_position_at() {
        let text = "hello\nworld\n";
        assert_eq!(position_at(text, 0), (0, 0));
        assert_eq!(position_at(text, 5), (0, 5));
        assert_eq!(position_at(text, 6), (1, 0));
        assert_eq!(position_at(text, 9), (1, 3));
    }

    #[test]
    fn test_position_at_past_end() {
        assert_eq!(position_at("ab", 99), (0, 2));
    }

    #[test]
    fn test_round_trip() {
        let text = "{% assign x = 1 %}\n{{ x }}\n";
        for offset in [0, 5, 18, 19, 26] {
            let (line, character) = position_at(text, offset);
            assert_eq!(offset_at(text, line, character), offset);
        }
    }
}
