//! # Diff-Args Parser
//!
//! Normalizes 1-3 positional CLI arguments into a pair of [`Spec`] values for
//! `diff`. See SPEC_FULL.md §4.3.

use crate::error::{Result, SuveError};
use crate::spec::{self, starts_with_specifier, Spec};

/// Parse the positional arguments of `diff` into `(spec1, spec2)`.
pub fn parse_diff_args(args: &[String]) -> Result<(Spec, Spec)> {
    match args.len() {
        0 => Err(SuveError::UsageError(
            "diff requires at least one argument".to_string(),
        )),
        1 => {
            let spec1 = spec::parse(&args[0])?;
            let spec2 = Spec::named(spec1.name.clone());
            Ok((spec1, spec2))
        }
        2 => {
            let spec1 = spec::parse(&args[0])?;
            let second_raw = if starts_with_specifier(&args[1]) {
                format!("{}{}", spec1.name, args[1])
            } else {
                args[1].clone()
            };
            let spec2 = spec::parse(&second_raw)?;
            Ok((spec1, spec2))
        }
        3 => {
            let name = &args[0];
            for arg in &args[1..3] {
                if !starts_with_specifier(arg) {
                    return Err(SuveError::UsageError(format!(
                        "'{arg}' must start with #, :, or ~ when a name is given separately"
                    )));
                }
            }
            let spec1 = spec::parse(&format!("{name}{}", args[1]))?;
            let spec2 = spec::parse(&format!("{name}{}", args[2]))?;
            Ok((spec1, spec2))
        }
        _ => Err(SuveError::UsageError(
            "diff takes at most 3 arguments".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn zero_args_fails() {
        let err = parse_diff_args(&[]).unwrap_err();
        assert_eq!(err.kind(), "UsageError");
    }

    #[test]
    fn one_arg_defaults_second_to_latest_same_name() {
        let (s1, s2) = parse_diff_args(&args(&["n:L1"])).unwrap();
        assert_eq!(s1.name, "n");
        assert_eq!(s1.label(), Some("L1"));
        assert_eq!(s2, crate::spec::Spec::named("n"));
    }

    #[test]
    fn two_args_with_bare_specifiers_share_name() {
        let (s1, s2) = parse_diff_args(&args(&["n", ":L1"])).unwrap();
        assert_eq!(s1.name, "n");
        assert_eq!(s2.name, "n");
        assert_eq!(s2.label(), Some("L1"));
    }

    #[test]
    fn two_args_both_full_names() {
        let (s1, s2) = parse_diff_args(&args(&["n#a", "n#b"])).unwrap();
        assert_eq!(s1.id(), Some("a"));
        assert_eq!(s2.id(), Some("b"));
    }

    #[test]
    fn two_args_second_is_shift() {
        let (s1, s2) = parse_diff_args(&args(&["n", "~"])).unwrap();
        assert_eq!(s1, crate::spec::Spec::named("n"));
        assert_eq!(s2.shift, 1);
        assert_eq!(s2.name, "n");
    }

    #[test]
    fn three_args_prepend_name_to_each_specifier() {
        let (s1, s2) = parse_diff_args(&args(&["n", ":AWSPREVIOUS", ":AWSCURRENT"])).unwrap();
        assert_eq!(s1.name, "n");
        assert_eq!(s1.label(), Some("AWSPREVIOUS"));
        assert_eq!(s2.name, "n");
        assert_eq!(s2.label(), Some("AWSCURRENT"));
    }

    #[test]
    fn three_args_non_specifier_second_arg_fails() {
        let err = parse_diff_args(&args(&["n", "other", ":AWSCURRENT"])).unwrap_err();
        assert_eq!(err.kind(), "UsageError");
    }

    #[test]
    fn four_args_fails() {
        let err = parse_diff_args(&args(&["a", "b", "c", "d"])).unwrap_err();
        assert_eq!(err.kind(), "UsageError");
    }

    #[test]
    fn propagates_parse_errors() {
        let err = parse_diff_args(&args(&["n#"])).unwrap_err();
        assert_eq!(err.kind(), "InvalidSpec");
    }
}
