//! Skill string parsing
//!
//! A skill string describes one invocation: `name{key1="val1",key2="val2"}`.
//! Skiller logs often carry line breaks and indentation inside the braces,
//! so every whitespace character is removed before the grammar applies.
//!
//! Grammar (after whitespace removal):
//!
//! ```text
//! skill    := word '{' body '}' trailing
//! body     := ( pair | ',' )*
//! pair     := word '=' '"' word '"' ','?
//! word     := [alphanumeric _ -]+
//! trailing := any text, ignored
//! ```
//!
//! The body ends at the last `}`; anything after it is ignored. Text between
//! pairs other than commas makes the string malformed. When that stray text
//! leaves an odd number of key/value tokens, the error says so instead.

use crate::error::{Result, SkillTimeError};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A skill invocation split into its name and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSkill {
    pub name: String,
    /// Argument mapping; a repeated key keeps the last value
    pub args: BTreeMap<String, String>,
}

/// One piece of the argument body as seen by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment {
    /// A well-formed `key="value"` pair
    Pair(String, String),
    /// Leftover text that is not a pure comma separator
    Stray(String),
}

impl Fragment {
    fn token_count(&self) -> usize {
        match self {
            Fragment::Pair(..) => 2,
            Fragment::Stray(_) => 1,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Length of the word run starting at `start`
fn word_len(chars: &[char], start: usize) -> usize {
    chars[start..].iter().take_while(|c| is_word_char(**c)).count()
}

/// Try to match `key="value"` (plus an optional trailing comma) at `start`.
///
/// Returns the key, the value and the index just past the match.
fn match_pair(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let key_len = word_len(chars, start);
    if key_len == 0 {
        return None;
    }
    let mut pos = start + key_len;
    if chars.get(pos) != Some(&'=') || chars.get(pos + 1) != Some(&'"') {
        return None;
    }
    pos += 2;
    let value_len = word_len(chars, pos);
    if value_len == 0 || chars.get(pos + value_len) != Some(&'"') {
        return None;
    }
    let key: String = chars[start..start + key_len].iter().collect();
    let value: String = chars[pos..pos + value_len].iter().collect();
    pos += value_len + 1;
    if chars.get(pos) == Some(&',') {
        pos += 1;
    }
    Some((key, value, pos))
}

/// Split the argument body into pairs and stray fragments
fn scan_arguments(body: &[char]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut pending = String::new();
    let mut pos = 0;

    while pos < body.len() {
        if let Some((key, value, end)) = match_pair(body, pos) {
            flush_pending(&mut pending, &mut fragments);
            fragments.push(Fragment::Pair(key, value));
            pos = end;
        } else {
            pending.push(body[pos]);
            pos += 1;
        }
    }
    flush_pending(&mut pending, &mut fragments);

    fragments
}

fn flush_pending(pending: &mut String, fragments: &mut Vec<Fragment>) {
    if !pending.is_empty() && !pending.chars().all(|c| c == ',') {
        fragments.push(Fragment::Stray(pending.clone()));
    }
    pending.clear();
}

/// Parse a skill string into name and arguments
///
/// # Errors
///
/// - [`SkillTimeError::MalformedSkillString`] when the `name{...}` shape is missing
/// - [`SkillTimeError::OddArgumentTokens`] when the argument body leaves an
///   unpaired token
///
/// # Example
///
/// ```
/// use skilltime::skill_string::parse_skill_string;
///
/// let skill = parse_skill_string(r#"goto{place="M-BS-I", x="1"}"#).unwrap();
/// assert_eq!(skill.name, "goto");
/// assert_eq!(skill.args["place"], "M-BS-I");
/// ```
pub fn parse_skill_string(input: &str) -> Result<ParsedSkill> {
    let chars: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    let malformed = |reason: &str| SkillTimeError::MalformedSkillString {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let name_len = word_len(&chars, 0);
    if name_len == 0 {
        return Err(malformed("expected skill name"));
    }
    if chars.get(name_len) != Some(&'{') {
        return Err(malformed("expected '{' after skill name"));
    }
    let close = chars
        .iter()
        .rposition(|c| *c == '}')
        .filter(|pos| *pos > name_len)
        .ok_or_else(|| malformed("expected closing '}'"))?;
    if close + 1 < chars.len() {
        tracing::trace!(input, "ignoring text after closing brace");
    }

    let name: String = chars[..name_len].iter().collect();
    let fragments = scan_arguments(&chars[name_len + 1..close]);

    let count: usize = fragments.iter().map(Fragment::token_count).sum();
    if count % 2 != 0 {
        return Err(SkillTimeError::OddArgumentTokens {
            input: input.to_string(),
            count,
        });
    }

    let mut args = BTreeMap::new();
    for fragment in fragments {
        match fragment {
            Fragment::Pair(key, value) => {
                args.insert(key, value);
            }
            Fragment::Stray(text) => {
                return Err(malformed(&format!("unexpected text {:?} in arguments", text)));
            }
        }
    }

    Ok(ParsedSkill { name, args })
}

impl FromStr for ParsedSkill {
    type Err = SkillTimeError;

    fn from_str(s: &str) -> Result<Self> {
        parse_skill_string(s)
    }
}

impl fmt::Display for ParsedSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.name)?;
        for (i, (key, value)) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}=\"{}\"", key, value)?;
        }
        write!(f, "}}")
    }
}
