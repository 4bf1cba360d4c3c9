//! `clingon` is a chainable, store-driven command line argument parser.
//!
//! Every declared parameter is backed by a chain of value stores.
//! The base store holds the raw string from the command line; chaining methods such as `map`, `default`, `require`, `collect`, and `count` grow the chain, and each link applies its own accumulation policy before forwarding onward.
//! The parse loop never inspects the shape of a declaration - it simply asks each chain "will you accept another value right now?" and feeds tokens accordingly.
//! This keeps multi-value options, occurrence counting, and defaulting composable rather than special-cased.
//!
//! # Usage
//! Declare parameters on a [`Clingon`], keep the returned handles, `parse`, then read the typed results through the handles:
//!
//! ```
//! use clingon::Clingon;
//!
//! let mut cli = Clingon::new();
//! let verbose = cli.flag("--verbose | -v", "Enable verbose output.").unwrap();
//! let name = cli
//!     .option("--name | -n", "The name to greet.")
//!     .unwrap()
//!     .require();
//! let count = cli
//!     .positional("count", "How many times to greet.")
//!     .map(|value| value.parse::<u32>().unwrap());
//!
//! cli.parse(["--name=ringo", "3"]).unwrap();
//!
//! assert!(!verbose.is_set());
//! assert_eq!(name.value(), Some("ringo".to_string()));
//! assert_eq!(count.value(), Some(3));
//! ```
//!
//! Multi-value options collect within an arity range, expressed as any range of `usize`:
//!
//! ```
//! use clingon::Clingon;
//!
//! let mut cli = Clingon::new();
//! let tags = cli.option("--tag | -t", "Tags to apply.").unwrap().collect(..);
//!
//! cli.parse(["-t", "a", "b", "--tag", "c"]).unwrap();
//!
//! assert_eq!(tags.values(), vec!["a".to_string(), "b".to_string(), "c".to_string()]);
//! ```
//!
//! # Cli Semantics
//! `clingon` parses the command line tokens according to the following set of rules.
//! * Long options match `--name value` or `--name=value`.
//! * Short options match `-n value`, `-nvalue`, or `-n=value`.
//! * Multiple short flags may be bundled into a single token.
//! For example, `-abc` is equivalent to `-a -b -c`.
//! An attached value may follow the *final* flag of a bundle: `-abcHello` binds `Hello` to `-c` when `-c` takes a value.
//! * A value-taking option keeps consuming subsequent value-looking tokens while its store chain accepts them.
//! For example, `-i a b c -o d` binds `a b c` to a collecting `-i`, stopping at the `-o` flag.
//! * The bare `--` token terminates option matching; every following token is positional, dashes or not.
//! * Positional slots fill strictly left-to-right, each consuming values until its chain stops accepting.
//!
//! # Errors
//! Declaration mistakes (malformed or duplicated flag spellings) surface as [`DeclarationError`] before any parsing takes place; they indicate a defect in the program, not its input.
//! Parse failures surface as [`ParseError`], carrying the [`ArgumentDefinition`] of the offending parameter when known.
//! After a failed parse the store state is unspecified - do not read the handles.
//!
//! # Features
//! * `tracing_debug`: Emit `tracing` debug events from the parse loop.
mod api;
mod model;
mod parser;
mod printer;
mod store;
mod tokens;

pub use api::*;
pub use model::{ArgumentDefinition, Arity, DeclarationError};
pub use parser::ParseError;
