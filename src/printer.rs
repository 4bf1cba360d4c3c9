use terminal_size::{terminal_size, Width};

use crate::model::ArgumentDefinition;

// Assuming an average word length of 5, this fits 3 words per wrapped line.
const MINIMUM_DESCRIPTION_WIDTH: usize = 17;
const FALLBACK_WIDTH: usize = 80;
const PADDING: usize = 2;

/// Renders the help message: a usage summary line, then the
/// `positional arguments:` and `options:` sections with aligned columns.
///
/// Descriptions wrap to the terminal width, falling back to 80 columns when
/// the width cannot be determined.
pub(crate) struct Printer {
    options: Vec<(ArgumentDefinition, bool)>,
    positionals: Vec<(ArgumentDefinition, bool)>,
    total_width: usize,
}

impl Printer {
    pub(crate) fn terminal(
        options: Vec<(ArgumentDefinition, bool)>,
        positionals: Vec<(ArgumentDefinition, bool)>,
    ) -> Self {
        let total_width = if let Some((Width(total_width), _)) = terminal_size() {
            total_width as usize
        } else {
            FALLBACK_WIDTH
        };

        Self::new(options, positionals, total_width)
    }

    pub(crate) fn new(
        options: Vec<(ArgumentDefinition, bool)>,
        positionals: Vec<(ArgumentDefinition, bool)>,
        total_width: usize,
    ) -> Self {
        Self {
            options,
            positionals,
            total_width,
        }
    }

    pub(crate) fn render(&self, program: impl Into<String>) -> String {
        let mut summary = Vec::default();
        let mut option_rows = Vec::default();
        let mut positional_rows = Vec::default();

        for (definition, aggregate) in &self.options {
            let first = definition
                .flags()
                .first()
                .expect("internal error - an option must have at least one flag");
            let grammar = if definition.takes_arg() {
                let placeholder = placeholder(first);

                if *aggregate {
                    format!(" [{placeholder} ...]")
                } else {
                    format!(" {placeholder}")
                }
            } else {
                String::default()
            };

            summary.push(format!("[{first}{grammar}]"));
            option_rows.push((
                format!("{flags}{grammar}", flags = definition.flags().join(", ")),
                definition.help().to_string(),
            ));
        }

        for (definition, aggregate) in &self.positionals {
            let grammar = if *aggregate {
                format!("[{} ...]", placeholder(definition.name()))
            } else {
                placeholder(definition.name())
            };

            summary.push(grammar.clone());
            positional_rows.push((grammar, definition.help().to_string()));
        }

        let column_width = option_rows
            .iter()
            .chain(positional_rows.iter())
            .map(|(left, _)| left.len())
            .max()
            .unwrap_or(0)
            + PADDING;

        let program = program.into();
        let mut lines = if summary.is_empty() {
            vec![format!("usage: {program}")]
        } else {
            vec![format!("usage: {program} {s}", s = summary.join(" "))]
        };

        if !positional_rows.is_empty() {
            lines.push(String::default());
            lines.push("positional arguments:".to_string());

            for (left, help) in &positional_rows {
                self.render_row(&mut lines, left, help, column_width);
            }
        }

        if !option_rows.is_empty() {
            lines.push(String::default());
            lines.push("options:".to_string());

            for (left, help) in &option_rows {
                self.render_row(&mut lines, left, help, column_width);
            }
        }

        lines.join("\n")
    }

    fn render_row(&self, lines: &mut Vec<String>, left: &str, help: &str, column_width: usize) {
        if help.is_empty() {
            lines.push(format!(" {left}"));
            return;
        }

        let description_width = std::cmp::max(
            self.total_width.saturating_sub(column_width + 1),
            MINIMUM_DESCRIPTION_WIDTH,
        );
        let mut segments = wrap(help, description_width).into_iter();
        let first = segments
            .next()
            .expect("internal error - a non-empty description must wrap");
        lines.push(format!(" {left:column_width$}{first}"));

        for segment in segments {
            lines.push(format!(" {:column_width$}{segment}", ""));
        }
    }
}

/// The upper-cased value placeholder for a flag or positional name.
fn placeholder(name: &str) -> String {
    name.trim_start_matches('-')
        .to_ascii_uppercase()
        .replace('-', "_")
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut segments = Vec::default();
    let mut current = String::default();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            segments.push(current);
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(flags: &[&str], help: &str, takes_arg: bool) -> ArgumentDefinition {
        ArgumentDefinition::option(
            flags.iter().map(|f| f.to_string()).collect(),
            help,
            takes_arg,
        )
    }

    #[test]
    fn render_empty() {
        let printer = Printer::new(Vec::default(), Vec::default(), 80);

        assert_eq!(printer.render("program"), "usage: program");
    }

    #[test]
    fn render_sections() {
        let printer = Printer::new(
            vec![
                (option(&["--verbose", "-v"], "Enable verbose output.", false), false),
                (option(&["--name", "-n"], "The name.", true), false),
            ],
            vec![
                (ArgumentDefinition::positional("first", "The first."), false),
                (ArgumentDefinition::positional("item", "The items."), true),
            ],
            80,
        );

        assert_eq!(
            printer.render("program"),
            "\
usage: program [--verbose] [--name NAME] FIRST [ITEM ...]

positional arguments:
 FIRST            The first.
 [ITEM ...]       The items.

options:
 --verbose, -v    Enable verbose output.
 --name, -n NAME  The name."
        );
    }

    #[test]
    fn render_collecting_option() {
        let printer = Printer::new(
            vec![(option(&["--tag"], "", true), true)],
            Vec::default(),
            80,
        );

        assert_eq!(
            printer.render("program"),
            "\
usage: program [--tag [TAG ...]]

options:
 --tag [TAG ...]"
        );
    }

    #[test]
    fn render_wraps_descriptions() {
        let printer = Printer::new(
            vec![(
                option(&["-x"], "A very long description which cannot fit.", false),
                false,
            )],
            Vec::default(),
            24,
        );

        assert_eq!(
            printer.render("p"),
            "\
usage: p [-x]

options:
 -x  A very long
     description which
     cannot fit."
        );
    }

    #[test]
    fn placeholder_upper_cases() {
        assert_eq!(placeholder("--dry-run"), "DRY_RUN");
        assert_eq!(placeholder("-n"), "N");
        assert_eq!(placeholder("item"), "ITEM");
    }

    #[test]
    fn wrap_splits_on_words() {
        assert_eq!(wrap("a bb ccc", 4), vec!["a bb", "ccc"]);
        assert_eq!(wrap("a bb ccc", 8), vec!["a bb ccc"]);
        assert_eq!(wrap("", 8), Vec::<String>::new());
    }
}
