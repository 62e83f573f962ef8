//! # Version Spec Parser
//!
//! Parses the compact version-addressing grammar `NAME SPECIFIER*` where each
//! `SPECIFIER` is `#TOKEN` (absolute id), `:TOKEN` (staging label), `~` or
//! `~N` (shift). See the resolver in [`crate::resolver`] for how a parsed
//! [`Spec`] is turned into a concrete revision.

use crate::error::{Result, SuveError};
use std::fmt;

/// At most one of an absolute version id or a staging label anchors a
/// [`Spec`] before any shift is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absolute {
    Id(String),
    Label(String),
}

/// The parsed address of a revision. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    pub name: String,
    pub absolute: Option<Absolute>,
    pub shift: u64,
}

impl Spec {
    /// A bare spec naming only `name`, anchored at latest with no shift.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            absolute: None,
            shift: 0,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match &self.absolute {
            Some(Absolute::Id(id)) => Some(id),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.absolute {
            Some(Absolute::Label(label)) => Some(label),
            _ => None,
        }
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match &self.absolute {
            Some(Absolute::Id(id)) => write!(f, "#{id}")?,
            Some(Absolute::Label(label)) => write!(f, ":{label}")?,
            None => {}
        }
        if self.shift > 0 {
            write!(f, "~{}", self.shift)?;
        }
        Ok(())
    }
}

/// `true` iff `s` begins with one of the specifier sigils, meaning it is a
/// bare specifier that needs a name prepended (used by the diff-args parser).
pub fn starts_with_specifier(s: &str) -> bool {
    matches!(s.chars().next(), Some('#') | Some(':') | Some('~'))
}

/// Parse `input` into a canonical [`Spec`]. Total on well-formed input: the
/// result never has duplicate fields and `shift >= 0`.
pub fn parse(input: &str) -> Result<Spec> {
    if input.is_empty() {
        return Err(SuveError::InvalidSpec("empty version spec".to_string()));
    }

    let mut chars = input.char_indices().peekable();
    let name_end = loop {
        match chars.peek() {
            None => break input.len(),
            Some(&(idx, c)) if matches!(c, '#' | ':' | '~') => break idx,
            Some(_) => {
                chars.next();
            }
        }
    };
    let name = &input[..name_end];
    let mut rest = &input[name_end..];

    let mut absolute: Option<Absolute> = None;
    let mut shift: u64 = 0;

    while !rest.is_empty() {
        let sigil = rest.chars().next().expect("rest is non-empty");
        rest = &rest[sigil.len_utf8()..];
        match sigil {
            '#' | ':' => {
                let token_end = rest.find(['#', ':', '~']).unwrap_or(rest.len());
                let token = &rest[..token_end];
                if token.is_empty() {
                    return Err(SuveError::InvalidSpec(format!(
                        "{sigil} must be followed by a token"
                    )));
                }
                if absolute.is_some() {
                    return Err(SuveError::InvalidSpec(
                        "a spec may carry at most one of #id or :label".to_string(),
                    ));
                }
                absolute = Some(if sigil == '#' {
                    Absolute::Id(token.to_string())
                } else {
                    Absolute::Label(token.to_string())
                });
                rest = &rest[token_end..];
            }
            '~' => {
                let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                let digits = &rest[..digits_end];
                let n: u64 = if digits.is_empty() {
                    1
                } else {
                    digits.parse().map_err(|_| {
                        SuveError::InvalidSpec(format!("~{digits} is not a valid shift"))
                    })?
                };
                shift = shift.checked_add(n).ok_or_else(|| {
                    SuveError::InvalidSpec("shift overflowed".to_string())
                })?;
                rest = &rest[digits_end..];
            }
            other => unreachable!("unexpected sigil {other:?}"),
        }
    }

    if name.is_empty() {
        return Err(SuveError::InvalidSpec(
            "a version spec must name an entry".to_string(),
        ));
    }

    Ok(Spec {
        name: name.to_string(),
        absolute,
        shift,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name() {
        let spec = parse("n").unwrap();
        assert_eq!(spec, Spec::named("n"));
    }

    #[test]
    fn bare_shift_defaults_to_one() {
        let spec = parse("n~").unwrap();
        assert_eq!(spec.shift, 1);
        assert_eq!(spec.name, "n");
        assert!(spec.absolute.is_none());
    }

    #[test]
    fn numeric_shift() {
        let spec = parse("n~3").unwrap();
        assert_eq!(spec.shift, 3);
    }

    #[test]
    fn shifts_accumulate() {
        let spec = parse("n~2~3").unwrap();
        assert_eq!(spec.shift, 5);
    }

    #[test]
    fn parses_id() {
        let spec = parse("n#abc123").unwrap();
        assert_eq!(spec.id(), Some("abc123"));
        assert_eq!(spec.shift, 0);
    }

    #[test]
    fn parses_label() {
        let spec = parse("n:AWSCURRENT").unwrap();
        assert_eq!(spec.label(), Some("AWSCURRENT"));
    }

    #[test]
    fn parses_label_then_shift() {
        let spec = parse("n:AWSCURRENT~2").unwrap();
        assert_eq!(spec.label(), Some("AWSCURRENT"));
        assert_eq!(spec.shift, 2);
    }

    #[test]
    fn name_may_contain_other_characters() {
        let spec = parse("my/secret-name.v2").unwrap();
        assert_eq!(spec.name, "my/secret-name.v2");
    }

    #[test]
    fn trailing_hash_fails() {
        let err = parse("n#").unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
    }

    #[test]
    fn trailing_colon_fails() {
        let err = parse("n:").unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
    }

    #[test]
    fn both_id_and_label_fails() {
        let err = parse("n#id:label").unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
    }

    #[test]
    fn two_hashes_fails() {
        let err = parse("n#a#b").unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
    }

    #[test]
    fn empty_input_fails() {
        let err = parse("").unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
    }

    #[test]
    fn round_trips_through_display() {
        for s in ["n", "n~3", "n#abc", "n:LBL", "n:LBL~2"] {
            let spec = parse(s).unwrap();
            assert_eq!(parse(&spec.to_string()).unwrap(), spec);
        }
    }

    #[test]
    fn specifier_sigil_detection() {
        assert!(starts_with_specifier("#abc"));
        assert!(starts_with_specifier(":LBL"));
        assert!(starts_with_specifier("~2"));
        assert!(!starts_with_specifier("name"));
        assert!(!starts_with_specifier(""));
    }
}
