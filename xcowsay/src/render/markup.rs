use thiserror::Error;

const KNOWN_TAGS: &[&str] = &[
    "b", "big", "i", "s", "small", "span", "sub", "sup", "tt", "u",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unterminated tag at offset {0}")]
    UnterminatedTag(usize),
    #[error("unknown tag <{0}>")]
    UnknownTag(String),
    #[error("unexpected closing tag </{0}>")]
    UnexpectedClose(String),
    #[error("tag <{0}> is never closed")]
    Unclosed(String),
    #[error("invalid entity at offset {0}")]
    BadEntity(usize),
}

/// Remove the formatting tags from `text` and decode its entities.
pub fn strip_markup(text: &str) -> Result<String, MarkupError> {
    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&str> = Vec::new();
    let mut rest = text;

    while let Some(idx) = rest.find(['<', '&']) {
        out.push_str(&rest[..idx]);
        let offset = text.len() - rest.len() + idx;
        let tail = &rest[idx..];

        if tail.starts_with('<') {
            let end = tail.find('>').ok_or(MarkupError::UnterminatedTag(offset))?;
            let body = &tail[1..end];
            if let Some(name) = body.strip_prefix('/') {
                let name = name.trim();
                match open.pop() {
                    Some(top) if top == name => {}
                    _ => return Err(MarkupError::UnexpectedClose(name.to_string())),
                }
            } else {
                let self_closing = body.ends_with('/');
                let body = body.trim_end_matches('/');
                let name = body.split_whitespace().next().unwrap_or("");
                if !KNOWN_TAGS.contains(&name) {
                    return Err(MarkupError::UnknownTag(name.to_string()));
                }
                if !self_closing {
                    open.push(name);
                }
            }
            rest = &tail[end + 1..];
        } else {
            let end = tail.find(';').ok_or(MarkupError::BadEntity(offset))?;
            let ch = decode_entity(&tail[1..end]).ok_or(MarkupError::BadEntity(offset))?;
            out.push(ch);
            rest = &tail[end + 1..];
        }
    }
    out.push_str(rest);

    match open.pop() {
        Some(tag) => Err(MarkupError::Unclosed(tag.to_string())),
        None => Ok(out),
    }
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Plain text to draw for a message: markup stripped when it parses,
/// otherwise the message exactly as given.
pub fn display_text(text: &str) -> String {
    match strip_markup(text) {
        Ok(plain) => plain,
        Err(e) => {
            tracing::warn!("Failed to parse markup ({}), showing text as-is", e);
            text.to_string()
        }
    }
}
