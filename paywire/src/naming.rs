//! Wire naming policy.
//!
//! The API speaks lower-snake-case. Rust field identifiers are usually
//! snake_case already, but field names that come from acronyms or
//! `#[serde(rename)]` attributes (`"IsJSONProperty"`, `"URLValue"`) still need
//! converting, and converting an already-converted name must be a no-op.
//!
//! # Examples
//!
//! ```
//! use paywire::naming::to_wire_name;
//!
//! assert_eq!(to_wire_name("IsJSONProperty"), "is_json_property");
//! assert_eq!(to_wire_name("is_json_property"), "is_json_property");
//! ```

use std::borrow::Cow;

const SEPARATOR: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Lower,
    Upper,
    NewWord,
}

/// Converts an identifier to its lower-snake-case wire name.
///
/// Word boundaries are placed before a capital that follows a lowercase letter
/// or digit, before the last capital of an acronym run that is followed by a
/// lowercase letter, and wherever whitespace separated two words. Whitespace
/// itself is dropped; runs of it collapse to a single separator. Underscores
/// and punctuation are kept verbatim.
///
/// The conversion is idempotent: `to_wire_name(&to_wire_name(x)) == to_wire_name(x)`.
#[must_use]
pub fn to_wire_name(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut out = String::with_capacity(identifier.len() + 4);
    let mut state = State::Start;

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            if state != State::Start {
                state = State::NewWord;
            }
        } else if c.is_uppercase() {
            match state {
                State::Upper => {
                    // Last capital of an acronym starts the next word: "JSONProperty".
                    if let Some(&next) = chars.get(i + 1)
                        && next.is_lowercase()
                    {
                        out.push(SEPARATOR);
                    }
                }
                State::Lower | State::NewWord => out.push(SEPARATOR),
                State::Start => {}
            }
            out.extend(c.to_lowercase());
            state = State::Upper;
        } else if c == SEPARATOR {
            out.push(SEPARATOR);
            state = State::Start;
        } else {
            if state == State::NewWord {
                out.push(SEPARATOR);
            }
            out.push(c);
            state = State::Lower;
        }
    }

    out
}

/// Like [`to_wire_name`], but borrows when the identifier is already a wire name.
///
/// Most Rust field names are already snake_case, so this avoids an allocation
/// on the hot serialization path.
#[must_use]
pub fn wire_name(identifier: &str) -> Cow<'_, str> {
    if is_wire_name(identifier) {
        Cow::Borrowed(identifier)
    } else {
        Cow::Owned(to_wire_name(identifier))
    }
}

fn is_wire_name(identifier: &str) -> bool {
    identifier
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == SEPARATOR)
}
