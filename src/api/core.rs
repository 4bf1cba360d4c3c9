use std::collections::HashMap;
use std::rc::Rc;

use crate::api::handle::{Flag, Scalar};
use crate::model::{parse_flag_string, ArgumentDefinition, DeclarationError};
use crate::parser::{Binding, Driver, ParseError};
use crate::printer::Printer;
use crate::store::{link, Store};

/// The declaration facade: declare flags, options, and positionals, then
/// `parse` once and read the results through the handles.
///
/// Flag spellings are validated and claimed at declaration time, so a
/// malformed or duplicated spelling surfaces as a [`DeclarationError`] before
/// any command line input is ever processed.
pub struct Clingon {
    lookup: HashMap<String, usize>,
    options: Vec<Binding>,
    positionals: Vec<Binding>,
}

impl Clingon {
    pub fn new() -> Self {
        Self {
            lookup: HashMap::default(),
            options: Vec::default(),
            positionals: Vec::default(),
        }
    }

    /// Declare a no-value flag (ex: `"--verbose | -v"`).
    ///
    /// The flag is simply present or absent on the command line; chain
    /// [`Flag::count`] to count repeated occurrences instead.
    pub fn flag(
        &mut self,
        flags: &str,
        help: impl Into<String>,
    ) -> Result<Flag, DeclarationError> {
        let spellings = parse_flag_string(flags)?;
        self.claim(&spellings)?;

        let head = link(Store::Presence {
            seen: false,
            next: None,
        });
        let definition = ArgumentDefinition::option(spellings, help, false);
        self.options
            .push(Binding::presence(definition, Rc::clone(&head)));

        Ok(Flag::head(head))
    }

    /// Declare a value-taking option (ex: `"--name | -n"`).
    ///
    /// The returned handle reads the raw string; chain `map`, `default`,
    /// `require`, `collect`, or `count` to change the accumulation policy.
    pub fn option(
        &mut self,
        flags: &str,
        help: impl Into<String>,
    ) -> Result<Scalar<String>, DeclarationError> {
        let spellings = parse_flag_string(flags)?;
        self.claim(&spellings)?;

        let head = link(Store::Single {
            value: None,
            enforce_single: true,
            next: None,
        });
        let definition = ArgumentDefinition::option(spellings, help, true);
        self.options
            .push(Binding::value(definition, Rc::clone(&head)));

        Ok(Scalar::head(head))
    }

    /// Declare the next positional slot. Slots fill strictly left-to-right.
    pub fn positional(&mut self, name: impl Into<String>, help: impl Into<String>) -> Scalar<String> {
        let head = link(Store::Single {
            value: None,
            enforce_single: true,
            next: None,
        });
        let definition = ArgumentDefinition::positional(name, help);
        self.positionals
            .push(Binding::value(definition, Rc::clone(&head)));

        Scalar::head(head)
    }

    /// Parse the argument strings, accumulating values into the declared
    /// store chains.
    ///
    /// Consumes the parser; the declarations cannot be parsed twice. On error
    /// the accumulated state is unspecified and the handles must not be read.
    pub fn parse<I, S>(self, args: I) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = args.into_iter().map(Into::into).collect();
        Driver::new(self.lookup, self.options, self.positionals).parse(args)
    }

    /// Render the help message for this set of declarations.
    pub fn help(&self, program: impl Into<String>) -> String {
        Printer::terminal(parameters(&self.options), parameters(&self.positionals))
            .render(program)
    }

    fn claim(&mut self, spellings: &[String]) -> Result<(), DeclarationError> {
        let index = self.options.len();

        for spelling in spellings {
            if self.lookup.insert(spelling.clone(), index).is_some() {
                return Err(DeclarationError::DuplicateFlag(spelling.clone()));
            }
        }

        Ok(())
    }
}

impl Default for Clingon {
    fn default() -> Self {
        Self::new()
    }
}

fn parameters(bindings: &[Binding]) -> Vec<(ArgumentDefinition, bool)> {
    bindings
        .iter()
        .map(|binding| (binding.definition().clone(), binding.is_aggregate()))
        .collect()
}
