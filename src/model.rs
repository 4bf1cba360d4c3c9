use std::fmt;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

/// Errors raised while declaring parameters, before any parsing takes place.
///
/// These indicate a defect in the program setup, not in the command line input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("Malformed flag '{0}'.")]
    MalformedFlag(String),

    #[error("Cannot duplicate the flag '{0}'.")]
    DuplicateFlag(String),
}

/// The immutable description of a declared parameter.
///
/// Built once at declaration time and never mutated while parsing.
/// Parse errors carry the definition of the offending parameter when it is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDefinition {
    name: String,
    flags: Vec<String>,
    help: String,
    takes_arg: bool,
}

impl ArgumentDefinition {
    pub(crate) fn option(flags: Vec<String>, help: impl Into<String>, takes_arg: bool) -> Self {
        Self {
            name: String::default(),
            flags,
            help: help.into(),
            takes_arg,
        }
    }

    pub(crate) fn positional(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: Vec::default(),
            help: help.into(),
            takes_arg: false,
        }
    }

    /// The declared name; empty for options, which are identified by their flags.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every declared spelling, dashes included (ex: `["--name", "-n"]`).
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// The help message for this parameter.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Whether this parameter consumes a value from the command line.
    pub fn takes_arg(&self) -> bool {
        self.takes_arg
    }
}

impl fmt::Display for ArgumentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.flags.first() {
            Some(flag) => write!(f, "{flag}"),
            None => write!(f, "{name}", name = self.name),
        }
    }
}

/// The inclusive range of values a collecting parameter may receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    minimum: usize,
    maximum: usize,
}

impl Arity {
    pub(crate) fn new(range: impl RangeBounds<usize>) -> Self {
        let minimum = match range.start_bound() {
            Bound::Included(n) => *n,
            Bound::Excluded(n) => n + 1,
            Bound::Unbounded => 0,
        };
        let maximum = match range.end_bound() {
            Bound::Included(n) => *n,
            Bound::Excluded(n) => n.saturating_sub(1),
            Bound::Unbounded => usize::MAX,
        };

        Self { minimum, maximum }
    }

    pub fn minimum(&self) -> usize {
        self.minimum
    }

    pub fn maximum(&self) -> usize {
        self.maximum
    }

    pub(crate) fn is_open(&self, count: usize) -> bool {
        count < self.maximum
    }

    pub(crate) fn contains(&self, count: usize) -> bool {
        (self.minimum..=self.maximum).contains(&count)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.maximum == usize::MAX {
            write!(f, "{minimum}..", minimum = self.minimum)
        } else {
            write!(
                f,
                "{minimum}..={maximum}",
                minimum = self.minimum,
                maximum = self.maximum
            )
        }
    }
}

/// Split a declaration such as `"--name | -n"` into validated flag spellings.
pub(crate) fn parse_flag_string(flags: &str) -> Result<Vec<String>, DeclarationError> {
    flags
        .split('|')
        .map(|spelling| {
            let spelling = spelling.trim();

            if valid_flag(spelling) {
                Ok(spelling.to_string())
            } else {
                Err(DeclarationError::MalformedFlag(spelling.to_string()))
            }
        })
        .collect()
}

fn valid_flag(flag: &str) -> bool {
    let body = match flag.strip_prefix("--") {
        Some(body) => body,
        None => match flag.strip_prefix('-') {
            Some(body) => body,
            None => return false,
        },
    };

    !body.is_empty()
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '?'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("-n")]
    #[case("--name")]
    #[case("-?")]
    #[case("--dry-run")]
    #[case("--snake_case")]
    #[case("--v2")]
    fn flag_valid(#[case] flag: &str) {
        assert!(valid_flag(flag));
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("--")]
    #[case("name")]
    #[case("--name=x")]
    #[case("--na me")]
    #[case("-é")]
    fn flag_invalid(#[case] flag: &str) {
        assert!(!valid_flag(flag));
    }

    #[test]
    fn flag_string_split() {
        assert_eq!(
            parse_flag_string("--name | -n").unwrap(),
            vec!["--name".to_string(), "-n".to_string()]
        );
        assert_eq!(parse_flag_string("-x").unwrap(), vec!["-x".to_string()]);
        assert_eq!(
            parse_flag_string("--help | -? | -h").unwrap(),
            vec!["--help".to_string(), "-?".to_string(), "-h".to_string()]
        );
    }

    #[test]
    fn flag_string_malformed() {
        assert_eq!(
            parse_flag_string("--name | n").unwrap_err(),
            DeclarationError::MalformedFlag("n".to_string())
        );
    }

    #[rstest]
    #[case(Arity::new(..), 0, usize::MAX)]
    #[case(Arity::new(1..), 1, usize::MAX)]
    #[case(Arity::new(1..=2), 1, 2)]
    #[case(Arity::new(0..3), 0, 2)]
    fn arity_bounds(#[case] arity: Arity, #[case] minimum: usize, #[case] maximum: usize) {
        assert_eq!(arity.minimum(), minimum);
        assert_eq!(arity.maximum(), maximum);
    }

    #[test]
    fn arity_contains() {
        let arity = Arity::new(1..=2);
        assert!(!arity.contains(0));
        assert!(arity.contains(1));
        assert!(arity.contains(2));
        assert!(!arity.contains(3));

        assert!(arity.is_open(1));
        assert!(!arity.is_open(2));
    }

    #[test]
    fn arity_display() {
        assert_eq!(Arity::new(1..=2).to_string(), "1..=2");
        assert_eq!(Arity::new(3..).to_string(), "3..");
        assert_eq!(Arity::new(..).to_string(), "0..");
    }

    #[test]
    fn definition_display() {
        let option = ArgumentDefinition::option(
            vec!["--name".to_string(), "-n".to_string()],
            "the name",
            true,
        );
        assert_eq!(option.to_string(), "--name");

        let positional = ArgumentDefinition::positional("item", "");
        assert_eq!(positional.to_string(), "item");
    }
}
