use crate::fonts::ResolvedFont;

/// One wrapped line of text with its measured width in px.
#[derive(Clone, Debug, PartialEq)]
pub struct LaidLine {
    pub text: String,
    pub width: f32,
}

/// Greedy word wrap against the font's real advance widths. Hard breaks
/// (`\n`) always start a new line; a single word wider than `max_width` is
/// placed alone on its line and allowed to overflow horizontally rather
/// than being broken mid-word.
pub fn wrap_text(text: &str, font: &ResolvedFont, px: f32, max_width: f32) -> Vec<LaidLine> {
    let space_w = font.space_width(px);
    let mut lines: Vec<LaidLine> = Vec::new();

    for hard_line in text.split('\n') {
        let hard_line = hard_line.trim_end();
        if hard_line.trim().is_empty() {
            if !text.trim().is_empty() {
                lines.push(LaidLine {
                    text: String::new(),
                    width: 0.0,
                });
            }
            continue;
        }

        let mut current = String::new();
        let mut current_w: f32 = 0.0;

        for word in hard_line.split_whitespace() {
            let word_w = font.text_width(word, px);
            if current.is_empty() {
                current.push_str(word);
                current_w = word_w;
                continue;
            }
            if current_w + space_w + word_w > max_width {
                lines.push(LaidLine {
                    text: std::mem::take(&mut current),
                    width: current_w,
                });
                current.push_str(word);
                current_w = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + word_w;
            }
        }

        if !current.is_empty() {
            lines.push(LaidLine {
                text: current,
                width: current_w,
            });
        }
    }

    lines
}
