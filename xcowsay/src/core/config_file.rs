use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::{OptionValue, Settings, SettingsError};

const CONFIG_FILE_NAME: &str = ".xcowsayrc";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("line {line}: illegal character '{ch}'")]
    IllegalCharacter { line: usize, ch: char },
    #[error("line {line}: expected {expected} but found {found}")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("line {line}: {source}")]
    Option {
        line: usize,
        #[source]
        source: SettingsError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Equals,
}

impl Token<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Token::Word(_) => "token",
            Token::Equals => "'='",
        }
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_value_char(ch: char) -> bool {
    is_name_char(ch) || matches!(ch, '-' | '.' | '/' | ':' | '~' | '+')
}

fn tokenize(line: &str, lineno: usize) -> Result<Vec<Token<'_>>, ConfigError> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in line.char_indices() {
        if is_value_char(ch) {
            start.get_or_insert(idx);
            continue;
        }

        if let Some(s) = start.take() {
            tokens.push(Token::Word(&line[s..idx]));
        }

        match ch {
            '#' => return Ok(tokens),
            '=' => tokens.push(Token::Equals),
            c if c.is_whitespace() => {}
            c => return Err(ConfigError::IllegalCharacter { line: lineno, ch: c }),
        }
    }

    if let Some(s) = start {
        tokens.push(Token::Word(&line[s..]));
    }
    Ok(tokens)
}

/// Parse one line into an option assignment. Blank and comment-only lines
/// yield `None`.
pub fn parse_line(line: &str, lineno: usize) -> Result<Option<(String, OptionValue)>, ConfigError> {
    let tokens = tokenize(line, lineno)?;
    let unexpected = |expected, found| ConfigError::Unexpected {
        line: lineno,
        expected,
        found,
    };

    let mut it = tokens.iter();
    let name = match it.next() {
        None => return Ok(None),
        Some(Token::Word(name)) => *name,
        Some(tok) => return Err(unexpected("option name", tok.describe())),
    };
    if let Some(ch) = name.chars().find(|c| !is_name_char(*c)) {
        return Err(ConfigError::IllegalCharacter { line: lineno, ch });
    }

    match it.next() {
        Some(Token::Equals) => {}
        Some(tok) => return Err(unexpected("'='", tok.describe())),
        None => return Err(unexpected("'='", "newline")),
    }

    let value = match it.next() {
        Some(Token::Word(value)) => *value,
        Some(tok) => return Err(unexpected("token", tok.describe())),
        None => return Err(unexpected("token", "newline")),
    };

    if let Some(tok) = it.next() {
        return Err(unexpected("newline", tok.describe()));
    }

    Ok(Some((name.to_string(), OptionValue::infer(value))))
}

/// Apply every assignment in `source` to `settings`, stopping at the first
/// malformed line. Assignments from earlier lines stay applied.
/// Returns the number of options applied.
pub fn apply_config(settings: &mut Settings, source: impl AsRef<[u8]>) -> Result<usize, ConfigError> {
    let mut applied = 0;
    for (idx, raw) in source.as_ref().split(|b| *b == b'\n').enumerate() {
        let lineno = idx + 1;
        let line = std::str::from_utf8(raw).map_err(|_| ConfigError::IllegalCharacter {
            line: lineno,
            ch: char::REPLACEMENT_CHARACTER,
        })?;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some((name, value)) = parse_line(line, lineno)? {
            settings
                .set(&name, value)
                .map_err(|source| ConfigError::Option {
                    line: lineno,
                    source,
                })?;
            applied += 1;
        }
    }
    Ok(applied)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Load options from a config file and return how many were applied.
/// Nothing here is fatal: an unreadable file is skipped and a bad line stops
/// reading, keeping the options applied before it.
pub fn load_config_file(settings: &mut Settings, path: &Path) -> usize {
    let source = match std::fs::read(path) {
        Ok(source) => source,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("No config file at {:?}", path);
            return 0;
        }
        Err(e) => {
            tracing::warn!("Cannot read config file {}: {}", path.display(), e);
            return 0;
        }
    };

    match apply_config(settings, &source) {
        Ok(applied) => {
            tracing::debug!("Applied {} options from {:?}", applied, path);
            applied
        }
        Err(e) => {
            tracing::warn!("{}: {} (ignoring the rest of the file)", path.display(), e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::keys;

    fn scratch_settings() -> Settings {
        let mut settings = Settings::new();
        settings.define("a", OptionValue::Int(0));
        settings.define("b", OptionValue::Bool(false));
        settings.define("c", OptionValue::Str(String::new()));
        settings
    }

    #[test]
    fn test_values_are_auto_typed() {
        let mut settings = scratch_settings();
        let applied = apply_config(&mut settings, "a=1\nb=true\nc=hello\n").unwrap();

        assert_eq!(applied, 3);
        assert_eq!(settings.int("a").unwrap(), 1);
        assert!(settings.bool("b").unwrap());
        assert_eq!(settings.string("c").unwrap(), "hello");
    }

    #[test]
    fn test_illegal_character_stops_parsing() {
        let mut settings = scratch_settings();
        let err = apply_config(&mut settings, "a=7\nb=tr!ue\nc=late\n").unwrap_err();

        assert_eq!(err, ConfigError::IllegalCharacter { line: 2, ch: '!' });
        assert_eq!(settings.int("a").unwrap(), 7);
        assert!(!settings.bool("b").unwrap());
        assert_eq!(settings.string("c").unwrap(), "");
    }

    #[test]
    fn test_missing_equals_stops_parsing() {
        let mut settings = scratch_settings();
        let err = apply_config(&mut settings, "a 3\nc=late\n").unwrap_err();

        assert_eq!(
            err,
            ConfigError::Unexpected {
                line: 1,
                expected: "'='",
                found: "token",
            }
        );
        assert_eq!(settings.int("a").unwrap(), 0);
        assert_eq!(settings.string("c").unwrap(), "");
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let err = parse_line("a =", 4).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Unexpected {
                line: 4,
                expected: "token",
                found: "newline",
            }
        );
    }

    #[test]
    fn test_trailing_token_is_an_error() {
        let err = parse_line("a = 1 2", 1).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Unexpected {
                expected: "newline",
                ..
            }
        ));
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let mut settings = scratch_settings();
        let source = "# xcowsay settings\n\n   \na = 5   # five\n#c=skipped\n";
        let applied = apply_config(&mut settings, source).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(settings.int("a").unwrap(), 5);
        assert_eq!(settings.string("c").unwrap(), "");
    }

    #[test]
    fn test_whitespace_around_equals() {
        assert_eq!(
            parse_line("  a\t=  12  ", 1).unwrap(),
            Some(("a".to_string(), OptionValue::Int(12)))
        );
        assert_eq!(
            parse_line("a=12", 1).unwrap(),
            Some(("a".to_string(), OptionValue::Int(12)))
        );
    }

    #[test]
    fn test_name_rejects_value_only_characters() {
        let err = parse_line("cow.size = med", 3).unwrap_err();
        assert_eq!(err, ConfigError::IllegalCharacter { line: 3, ch: '.' });
    }

    #[test]
    fn test_paths_are_string_values() {
        let mut settings = Settings::with_defaults();
        apply_config(&mut settings, "alt_image = /usr/share/pixmaps/sheep.png\n").unwrap();
        assert_eq!(
            settings.string(keys::ALT_IMAGE).unwrap(),
            "/usr/share/pixmaps/sheep.png"
        );
    }

    #[test]
    fn test_negative_display_time_means_auto() {
        let mut settings = Settings::with_defaults();
        apply_config(&mut settings, "display_time=5000\ndisplay_time=-1\n").unwrap();
        assert_eq!(settings.int(keys::DISPLAY_TIME).unwrap(), -1);
    }

    #[test]
    fn test_unknown_option_stops_parsing() {
        let mut settings = Settings::with_defaults();
        let err = apply_config(&mut settings, "reading_speed=100\ncolour=brown\nleft=true\n")
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Option {
                line: 2,
                source: SettingsError::UnknownOption(_),
            }
        ));
        assert_eq!(settings.int(keys::READING_SPEED).unwrap(), 100);
        assert!(!settings.bool(keys::LEFT).unwrap());
    }

    #[test]
    fn test_font_option_is_accepted() {
        let mut settings = Settings::with_defaults();
        let applied =
            apply_config(&mut settings, "reading_speed=100\nfont=Sans\nleft=true\n").unwrap();

        assert_eq!(applied, 3);
        assert_eq!(settings.string(keys::FONT).unwrap(), "Sans");
        assert!(settings.bool(keys::LEFT).unwrap());
    }

    #[test]
    fn test_type_mismatch_stops_parsing() {
        let mut settings = Settings::with_defaults();
        let err = apply_config(&mut settings, "wrap=40\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Option {
                line: 1,
                source: SettingsError::TypeMismatch { .. },
            }
        ));
        assert!(settings.bool(keys::WRAP).unwrap());
    }

    #[test]
    fn test_load_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::with_defaults();
        let applied = load_config_file(&mut settings, &dir.path().join("nope"));
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_load_file_keeps_options_before_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsayrc");
        std::fs::write(&path, "reading_speed = 300\ncow_size = large\n$$$\nleft = true\n")
            .unwrap();

        let mut settings = Settings::with_defaults();
        load_config_file(&mut settings, &path);

        assert_eq!(settings.int(keys::READING_SPEED).unwrap(), 300);
        assert_eq!(settings.string(keys::COW_SIZE).unwrap(), "large");
        assert!(!settings.bool(keys::LEFT).unwrap());
    }

    #[test]
    fn test_invalid_utf8_line_stops_parsing() {
        let mut settings = Settings::with_defaults();
        let err = apply_config(&mut settings, b"reading_speed = 300\n# caf\xe9\nleft = true\n")
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::IllegalCharacter {
                line: 2,
                ch: char::REPLACEMENT_CHARACTER,
            }
        );
        assert_eq!(settings.int(keys::READING_SPEED).unwrap(), 300);
        assert!(!settings.bool(keys::LEFT).unwrap());
    }

    #[test]
    fn test_load_file_with_invalid_utf8_keeps_earlier_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xcowsayrc");
        std::fs::write(&path, b"reading_speed = 300\n# caf\xe9\nleft = true\n").unwrap();

        let mut settings = Settings::with_defaults();
        assert_eq!(load_config_file(&mut settings, &path), 0);
        assert_eq!(settings.int(keys::READING_SPEED).unwrap(), 300);
        assert!(!settings.bool(keys::LEFT).unwrap());
    }

    #[test]
    fn test_load_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::with_defaults();

        assert_eq!(load_config_file(&mut settings, dir.path()), 0);
        assert_eq!(settings.int(keys::READING_SPEED).unwrap(), 250);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut settings = scratch_settings();
        let applied = apply_config(&mut settings, "a=3\r\nb=true\r\n").unwrap();
        assert_eq!(applied, 2);
        assert_eq!(settings.int("a").unwrap(), 3);
        assert!(settings.bool("b").unwrap());
    }
}
