const TAB_WIDTH: usize = 4;

/// Break `text` into the lines drawn in the bubble.
///
/// Existing newlines are always kept. With a width, each paragraph is
/// greedily filled with whole words, and words longer than the width are
/// split.
pub fn wrap_text(text: &str, width: Option<usize>) -> Vec<String> {
    let text = text.replace('\t', &" ".repeat(TAB_WIDTH));
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        match width {
            Some(width) if width > 0 => wrap_paragraph(paragraph, width, &mut lines),
            _ => lines.push(paragraph.trim_end().to_string()),
        }
    }
    lines
}

fn wrap_paragraph(paragraph: &str, width: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if word.is_empty() {
            continue;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }

    if current_len > 0 || lines.is_empty() || paragraph.trim().is_empty() {
        lines.push(current);
    }
}
