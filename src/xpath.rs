//! Rewrites namespace prefixes embedded in an XPath expression (C3).
//!
//! The reference implementation scans right-to-left into growable
//! character buffers. A left-to-right scan that records each candidate
//! prefix's run and looks ahead for the following `:`/`::` is equivalent
//! under §4.4.5's semantics and is the shape used here, since it reads
//! naturally against a `&str` without hand-rolled buffer growth.

use crate::error::{Error, Result};

fn is_ncname_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[derive(PartialEq)]
enum State {
    Common,
    Single,
    Double,
}

/// Rewrites every namespace prefix in `text` that precedes a single `:`
/// (an axis separator `::` is left untouched) using `resolve`, which maps
/// an old prefix to its replacement spelling — identity in non-sequential
/// mode, the `n<k>` rewrite in sequential mode.
///
/// Returns [`Error::BadXpath`] if a quoted string literal is never closed.
pub fn rewrite(text: &str, mut resolve: impl FnMut(&str) -> Result<String>) -> Result<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = State::Common;
    let mut i = 0;
    while i < chars.len() {
        match state {
            State::Common => match chars[i] {
                '\'' => {
                    out.push('\'');
                    state = State::Single;
                    i += 1;
                }
                '"' => {
                    out.push('"');
                    state = State::Double;
                    i += 1;
                }
                c if is_ncname_char(c) => {
                    let start = i;
                    while i < chars.len() && is_ncname_char(chars[i]) {
                        i += 1;
                    }
                    let run: String = chars[start..i].iter().collect();
                    if i < chars.len() && chars[i] == ':' {
                        if i + 1 < chars.len() && chars[i + 1] == ':' {
                            out.push_str(&run);
                            out.push_str("::");
                            i += 2;
                        } else {
                            out.push_str(&resolve(&run)?);
                            out.push(':');
                            i += 1;
                        }
                    } else {
                        out.push_str(&run);
                    }
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            },
            State::Single => {
                out.push(chars[i]);
                if chars[i] == '\'' {
                    state = State::Common;
                }
                i += 1;
            }
            State::Double => {
                out.push(chars[i]);
                if chars[i] == '"' {
                    state = State::Common;
                }
                i += 1;
            }
        }
    }
    if state != State::Common {
        return Err(Error::BadXpath { position: i });
    }
    Ok(out)
}

/// Collects, without rewriting, every prefix `rewrite` would resolve — used
/// to compute namespace visibility for a QName-aware-XPath element's text
/// before the element's start tag has been emitted.
pub fn referenced_prefixes(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut prefixes = Vec::new();
    let mut state = State::Common;
    let mut i = 0;
    while i < chars.len() {
        match state {
            State::Common => match chars[i] {
                '\'' => {
                    state = State::Single;
                    i += 1;
                }
                '"' => {
                    state = State::Double;
                    i += 1;
                }
                c if is_ncname_char(c) => {
                    let start = i;
                    while i < chars.len() && is_ncname_char(chars[i]) {
                        i += 1;
                    }
                    if i < chars.len() && chars[i] == ':' {
                        if i + 1 < chars.len() && chars[i + 1] == ':' {
                            i += 2;
                        } else {
                            let run: String = chars[start..i].iter().collect();
                            prefixes.push(run);
                            i += 1;
                        }
                    }
                }
                _ => i += 1,
            },
            State::Single => {
                if chars[i] == '\'' {
                    state = State::Common;
                }
                i += 1;
            }
            State::Double => {
                if chars[i] == '"' {
                    state = State::Common;
                }
                i += 1;
            }
        }
    }
    prefixes
}
