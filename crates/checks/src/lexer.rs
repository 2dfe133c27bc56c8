// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX-ish shell-word tokenization for exec check commands, supporting
//! an optional trailing `[ ... ]` default-args group.
//!
//! No crate in the reference stack does shell tokenization (none of the
//! candidate repos pull in `shell-words`/`shlex`), so this is hand-rolled,
//! matching how `oddjobs` hand-rolls its own small parsers elsewhere.

use warden_core::Error;

/// A command split into its base argv and an optional trailing
/// default-args group (`[ … ]`), which callers append to the base argv
/// to build the final argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedCommand {
    pub base: Vec<String>,
    pub defaults: Vec<String>,
}

impl TokenizedCommand {
    pub fn argv(&self) -> Vec<String> {
        let mut v = self.base.clone();
        v.extend(self.defaults.iter().cloned());
        v
    }
}

/// Tokenize `input` into words, honoring single quotes (no escapes),
/// double quotes (backslash escapes `"` `\` `$` and newline), and
/// backslash escapes outside quotes. A literal `[` token not inside a
/// quoted word opens a default-args group that must run to the end of
/// the string and close with `]`.
pub fn tokenize(input: &str) -> Result<TokenizedCommand, Error> {
    let words = split_words(input)?;

    let bracket_start = words.iter().position(|w| w == "[");
    let Some(start) = bracket_start else {
        return Ok(TokenizedCommand { base: words, defaults: Vec::new() });
    };

    if words.last().map(String::as_str) != Some("]") {
        return Err(Error::FormatError(
            "unterminated default-args group: expected trailing ']'".to_string(),
        ));
    }
    let base = words[..start].to_vec();
    let defaults = words[start + 1..words.len() - 1].to_vec();
    if defaults.iter().any(|w| w == "[" || w == "]") {
        return Err(Error::FormatError(
            "default-args group must not be nested".to_string(),
        ));
    }
    if base.is_empty() {
        return Err(Error::FormatError("command has no base tokens".to_string()));
    }
    Ok(TokenizedCommand { base, defaults })
}

fn split_words(input: &str) -> Result<Vec<String>, Error> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        None => {
                            return Err(Error::FormatError(
                                "unterminated double-quoted string".to_string(),
                            ))
                        }
                        Some('"') => break,
                        Some('\\') => match chars.peek() {
                            Some('"') | Some('\\') | Some('$') | Some('\n') => {
                                current.push(chars.next().unwrap())
                            }
                            _ => current.push('\\'),
                        },
                        Some(c) => current.push(c),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => {
                        return Err(Error::FormatError(
                            "trailing backslash with nothing to escape".to_string(),
                        ))
                    }
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
