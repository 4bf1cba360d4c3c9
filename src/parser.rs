use std::collections::HashMap;
use thiserror::Error;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::model::{ArgumentDefinition, Arity};
use crate::store::{Link, StoreError};
use crate::tokens::{Token, Tokenizer};

/// Errors raised while parsing the command line input.
///
/// Every variant carries the offending parameter's definition when it is known.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown flag '{0}'.")]
    UnknownFlag(String),

    #[error("The flag '{0}' requires a value.")]
    MissingValue(ArgumentDefinition),

    #[error("The flag '{0}' does not accept a value.")]
    UnexpectedValueForFlag(ArgumentDefinition),

    #[error("Only a single value is expected for '{0}'.")]
    DuplicateValue(ArgumentDefinition),

    #[error("The parameter '{0}' is required.")]
    MissingRequired(ArgumentDefinition),

    #[error("Received {count} values for '{definition}', outside the arity {arity}.")]
    ArityViolation {
        definition: ArgumentDefinition,
        arity: Arity,
        count: usize,
    },

    #[error("Unexpected positional argument '{0}'.")]
    TooManyPositionals(String),
}

/// The store chain head behind a binding: either a value chain fed with the
/// literal strings the tokenizer reads, or a presence chain fed on sight.
enum Head {
    Value(Link<String>),
    Presence(Link<bool>),
}

/// A declared parameter bound to the head of its store chain.
///
/// The binding attributes any error surfaced by the chain to its definition.
pub(crate) struct Binding {
    definition: ArgumentDefinition,
    head: Head,
}

impl Binding {
    pub(crate) fn value(definition: ArgumentDefinition, head: Link<String>) -> Self {
        Self {
            definition,
            head: Head::Value(head),
        }
    }

    pub(crate) fn presence(definition: ArgumentDefinition, head: Link<bool>) -> Self {
        Self {
            definition,
            head: Head::Presence(head),
        }
    }

    pub(crate) fn definition(&self) -> &ArgumentDefinition {
        &self.definition
    }

    /// Whether any node in this binding's chain aggregates values.
    pub(crate) fn is_aggregate(&self) -> bool {
        match &self.head {
            Head::Value(link) => link.borrow().has_aggregate(),
            Head::Presence(link) => link.borrow().has_aggregate(),
        }
    }

    fn will_accept_value(&self) -> bool {
        match &self.head {
            Head::Value(link) => link.borrow().will_accept_value(),
            Head::Presence(link) => link.borrow().will_accept_value(),
        }
    }

    fn store(&self, value: String) -> Result<(), ParseError> {
        match &self.head {
            Head::Value(link) => link.borrow_mut().store_value(value),
            Head::Presence(_) => {
                unreachable!("internal error - a presence binding takes no value")
            }
        }
        .map_err(|error| self.attribute(error))
    }

    fn mark_present(&self) -> Result<(), ParseError> {
        match &self.head {
            Head::Presence(link) => link.borrow_mut().store_value(true),
            Head::Value(_) => {
                unreachable!("internal error - a value binding cannot mark presence")
            }
        }
        .map_err(|error| self.attribute(error))
    }

    fn on_pre_parse(&self) {
        match &self.head {
            Head::Value(link) => link.borrow_mut().on_pre_parse(),
            Head::Presence(link) => link.borrow_mut().on_pre_parse(),
        }
    }

    fn on_post_parse(&self) -> Result<(), ParseError> {
        match &self.head {
            Head::Value(link) => link.borrow_mut().on_post_parse(),
            Head::Presence(link) => link.borrow_mut().on_post_parse(),
        }
        .map_err(|error| self.attribute(error))
    }

    fn attribute(&self, error: StoreError) -> ParseError {
        let definition = self.definition.clone();

        match error {
            StoreError::DuplicateValue => ParseError::DuplicateValue(definition),
            StoreError::MissingRequired => ParseError::MissingRequired(definition),
            StoreError::OutOfRange { arity, count } => ParseError::ArityViolation {
                definition,
                arity,
                count,
            },
        }
    }
}

/// Orchestrates the tokenizer against the declared bindings.
///
/// Flag tokens resolve through the spelling table; positional tokens fill the
/// ordered positional bindings through a forward-only cursor. Whether an
/// option keeps consuming values is decided by the chain's own backpressure
/// (`will_accept_value`), never by the driver guessing at declaration shapes.
pub(crate) struct Driver {
    lookup: HashMap<String, usize>,
    options: Vec<Binding>,
    positionals: Vec<Binding>,
    positional_cursor: usize,
}

impl Driver {
    pub(crate) fn new(
        lookup: HashMap<String, usize>,
        options: Vec<Binding>,
        positionals: Vec<Binding>,
    ) -> Self {
        Self {
            lookup,
            options,
            positionals,
            positional_cursor: 0,
        }
    }

    pub(crate) fn parse(mut self, args: Vec<String>) -> Result<(), ParseError> {
        for binding in self.options.iter().chain(self.positionals.iter()) {
            binding.on_pre_parse();
        }

        let mut tokenizer = Tokenizer::new(args);
        let mut terminated = false;

        while tokenizer.has_next() {
            if terminated {
                let value = tokenizer.read_positional();
                self.store_positional(value)?;
                continue;
            }

            match tokenizer.peek_kind() {
                Token::ShortFlag => {
                    let flag = tokenizer.read_short_flag();
                    self.apply_flag(format!("-{flag}"), &mut tokenizer)?;
                }
                Token::LongFlag => {
                    let name = tokenizer.read_flag();
                    self.apply_flag(format!("--{name}"), &mut tokenizer)?;
                }
                Token::Positional => {
                    let value = tokenizer.read_positional();
                    self.store_positional(value)?;
                }
                Token::OptionTerminator => {
                    tokenizer.read_positional();
                    terminated = true;
                }
                Token::OptionArgument => {
                    unreachable!("internal error - a dangling option argument at the top level")
                }
            }
        }

        for binding in self.options.iter().chain(self.positionals.iter()) {
            binding.on_post_parse()?;
        }

        Ok(())
    }

    fn apply_flag(&self, spelling: String, tokenizer: &mut Tokenizer) -> Result<(), ParseError> {
        let index = match self.lookup.get(&spelling) {
            Some(index) => *index,
            None => return Err(ParseError::UnknownFlag(spelling)),
        };
        let binding = &self.options[index];

        #[cfg(feature = "tracing_debug")]
        {
            debug!(
                "Matched '{spelling}' to '{definition}'.",
                definition = binding.definition()
            );
        }

        if binding.definition().takes_arg() {
            if !tokenizer.has_next() {
                return Err(ParseError::MissingValue(binding.definition().clone()));
            }

            binding.store(tokenizer.read_option_argument())?;

            // Keep feeding the same option while its chain stays hungry and the
            // next token still looks like a bare value rather than a new flag.
            while tokenizer.has_next()
                && binding.will_accept_value()
                && matches!(
                    tokenizer.peek_kind(),
                    Token::Positional | Token::OptionArgument
                )
            {
                binding.store(tokenizer.read_option_argument())?;
            }
        } else {
            if tokenizer.has_next() && matches!(tokenizer.peek_kind(), Token::OptionArgument) {
                return Err(ParseError::UnexpectedValueForFlag(
                    binding.definition().clone(),
                ));
            }

            binding.mark_present()?;
        }

        Ok(())
    }

    fn store_positional(&mut self, value: String) -> Result<(), ParseError> {
        while let Some(binding) = self.positionals.get(self.positional_cursor) {
            if binding.will_accept_value() {
                return binding.store(value);
            }

            self.positional_cursor += 1;
        }

        Err(ParseError::TooManyPositionals(value))
    }
}
