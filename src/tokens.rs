/// Classification of the token at the tokenizer's cursor.
///
/// Carries no payload; the matching `read_*` operation returns the literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    ShortFlag,
    LongFlag,
    OptionArgument,
    Positional,
    OptionTerminator,
}

/// Where the cursor sits within the current argument string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// At the start of an argument string.
    TopLevel,
    /// Inside a run of bundled short flags (ex: past the `a` of `-ab`).
    ShortCluster,
    /// Just past a long flag name, with an `=value` remaining.
    PendingValue,
}

/// A cursor over an immutable sequence of argument strings.
///
/// Dashes, bundling, and `=` delimiters are encoded as cursor modes rather than
/// by re-splitting the strings up front, so one argument string (ex: `-abcHello`)
/// is consumed flag-by-flag with O(1) state per step, and an attached value is
/// read the same way regardless of which short flag preceded it.
///
/// The tokenizer knows nothing about declared parameters; resolving a flag
/// character or name against the declarations is the driver's job.
pub(crate) struct Tokenizer {
    args: Vec<String>,
    arg_index: usize,
    // Byte offset into the current argument string; only meaningful outside
    // `TopLevel`, and always on a char boundary.
    char_index: usize,
    mode: Mode,
}

impl Tokenizer {
    pub(crate) fn new(args: Vec<String>) -> Self {
        Self {
            args,
            arg_index: 0,
            char_index: 0,
            mode: Mode::TopLevel,
        }
    }

    /// True while unconsumed argument strings remain.
    pub(crate) fn has_next(&self) -> bool {
        self.arg_index < self.args.len()
    }

    /// Classify the cursor position without consuming anything.
    pub(crate) fn peek_kind(&self) -> Token {
        let arg = self.current();

        match self.mode {
            Mode::TopLevel => classify(arg),
            Mode::ShortCluster => {
                if arg[self.char_index..].starts_with('=') {
                    Token::OptionArgument
                } else {
                    Token::ShortFlag
                }
            }
            Mode::PendingValue => Token::OptionArgument,
        }
    }

    /// Consume exactly one short flag character.
    ///
    /// When more of the argument string remains, the cursor enters the cluster
    /// so a follow-up read can see another bundled flag or an attached value.
    pub(crate) fn read_short_flag(&mut self) -> char {
        match self.mode {
            Mode::TopLevel => {
                let (flag, width, arg_length) = {
                    let arg = self.current();
                    let flag = arg[1..]
                        .chars()
                        .next()
                        .expect("internal error - short flag read on a bare dash");
                    (flag, 1 + flag.len_utf8(), arg.len())
                };

                if width == arg_length {
                    self.advance();
                } else {
                    self.char_index = width;
                    self.mode = Mode::ShortCluster;
                }

                flag
            }
            Mode::ShortCluster => {
                let (flag, next_index, arg_length) = {
                    let arg = self.current();
                    let flag = arg[self.char_index..]
                        .chars()
                        .next()
                        .expect("internal error - short flag cluster read past the end");
                    (flag, self.char_index + flag.len_utf8(), arg.len())
                };

                if next_index < arg_length {
                    self.char_index = next_index;
                } else {
                    self.advance();
                }

                flag
            }
            Mode::PendingValue => {
                panic!("internal error - cannot read a short flag while a value is pending")
            }
        }
    }

    /// Consume a long flag name, up to (not including) an `=` or the end of the
    /// argument string. An `=` leaves the cursor pending on the attached value.
    pub(crate) fn read_flag(&mut self) -> String {
        if !matches!(self.mode, Mode::TopLevel) {
            panic!(
                "internal error - cannot read a long flag in mode {mode:?}",
                mode = self.mode
            );
        }

        let (name, pending) = {
            let arg = self.current();
            let body = &arg[2..];

            match body.find('=') {
                Some(offset) => (body[..offset].to_string(), Some(2 + offset)),
                None => (body.to_string(), None),
            }
        };

        match pending {
            Some(char_index) => {
                self.char_index = char_index;
                self.mode = Mode::PendingValue;
            }
            None => self.advance(),
        }

        name
    }

    /// Consume the remainder of the current argument string as an option value,
    /// skipping a leading `=`. In `TopLevel` mode, consume the entire argument
    /// string instead (a value supplied as its own token).
    pub(crate) fn read_option_argument(&mut self) -> String {
        let value = {
            let arg = self.current();

            match self.mode {
                Mode::TopLevel => arg.to_string(),
                Mode::ShortCluster | Mode::PendingValue => {
                    let remainder = &arg[self.char_index..];
                    remainder.strip_prefix('=').unwrap_or(remainder).to_string()
                }
            }
        };

        self.advance();
        value
    }

    /// Consume the whole current argument string.
    pub(crate) fn read_positional(&mut self) -> String {
        if !matches!(self.mode, Mode::TopLevel) {
            panic!(
                "internal error - cannot read a positional in mode {mode:?}",
                mode = self.mode
            );
        }

        let value = self.current().to_string();
        self.advance();
        value
    }

    fn current(&self) -> &str {
        self.args
            .get(self.arg_index)
            .expect("internal error - tokenizer read past the end of input")
    }

    fn advance(&mut self) {
        self.arg_index += 1;
        self.char_index = 0;
        self.mode = Mode::TopLevel;
    }
}

fn classify(arg: &str) -> Token {
    if !arg.starts_with('-') {
        return Token::Positional;
    }

    // All-dash strings: a bare `-` is a conventional stdin positional, `--` is
    // the terminator, and anything longer names no flag.
    if arg.chars().all(|c| c == '-') {
        return match arg.len() {
            2 => Token::OptionTerminator,
            _ => Token::Positional,
        };
    }

    match arg.strip_prefix("--") {
        Some(body) => {
            if valid_body(body) {
                Token::LongFlag
            } else {
                Token::Positional
            }
        }
        None => {
            if valid_body(&arg[1..]) {
                Token::ShortFlag
            } else {
                Token::Positional
            }
        }
    }
}

fn valid_body(body: &str) -> bool {
    body.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '?' | '='))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tokenizer(args: &[&str]) -> Tokenizer {
        Tokenizer::new(args.iter().map(|s| s.to_string()).collect())
    }

    #[rstest]
    #[case("value", Token::Positional)]
    #[case("a-b", Token::Positional)]
    #[case("-", Token::Positional)]
    #[case("--", Token::OptionTerminator)]
    #[case("---", Token::Positional)]
    #[case("----", Token::Positional)]
    #[case("-a", Token::ShortFlag)]
    #[case("-abc", Token::ShortFlag)]
    #[case("-d10", Token::ShortFlag)]
    #[case("-a=1", Token::ShortFlag)]
    #[case("-123", Token::ShortFlag)]
    #[case("--name", Token::LongFlag)]
    #[case("--name=val", Token::LongFlag)]
    #[case("--dry-run", Token::LongFlag)]
    #[case("--na me", Token::Positional)]
    #[case("-café", Token::Positional)]
    fn classify_top_level(#[case] arg: &str, #[case] expected: Token) {
        let tokenizer = tokenizer(&[arg]);
        assert_eq!(tokenizer.peek_kind(), expected);
    }

    #[test]
    fn peek_is_idempotent() {
        let tokenizer = tokenizer(&["-abc"]);

        for _ in 0..3 {
            assert_eq!(tokenizer.peek_kind(), Token::ShortFlag);
        }
    }

    #[test]
    fn short_flag_single() {
        let mut tokenizer = tokenizer(&["-a"]);

        assert_eq!(tokenizer.read_short_flag(), 'a');
        assert!(!tokenizer.has_next());
    }

    #[test]
    fn short_flag_cluster() {
        let mut tokenizer = tokenizer(&["-abc"]);

        assert_eq!(tokenizer.read_short_flag(), 'a');
        assert_eq!(tokenizer.peek_kind(), Token::ShortFlag);
        assert_eq!(tokenizer.read_short_flag(), 'b');
        assert_eq!(tokenizer.peek_kind(), Token::ShortFlag);
        assert_eq!(tokenizer.read_short_flag(), 'c');
        assert!(!tokenizer.has_next());
    }

    #[test]
    fn short_flag_cluster_resumes_across_arguments() {
        let mut tokenizer = tokenizer(&["-ab", "-c"]);

        assert_eq!(tokenizer.read_short_flag(), 'a');
        assert_eq!(tokenizer.read_short_flag(), 'b');
        assert_eq!(tokenizer.peek_kind(), Token::ShortFlag);
        assert_eq!(tokenizer.read_short_flag(), 'c');
        assert!(!tokenizer.has_next());
    }

    #[rstest]
    #[case("-d10", "10")]
    #[case("-d=10", "10")]
    #[case("-d=", "")]
    fn short_flag_attached_value(#[case] arg: &str, #[case] expected: &str) {
        let mut tokenizer = tokenizer(&[arg]);

        assert_eq!(tokenizer.read_short_flag(), 'd');
        assert_eq!(tokenizer.read_option_argument(), expected);
        assert!(!tokenizer.has_next());
    }

    #[test]
    fn short_flag_cluster_attached_value() {
        let mut tokenizer = tokenizer(&["-abcHello"]);

        assert_eq!(tokenizer.read_short_flag(), 'a');
        assert_eq!(tokenizer.read_short_flag(), 'b');
        assert_eq!(tokenizer.read_short_flag(), 'c');
        assert_eq!(tokenizer.read_option_argument(), "Hello");
        assert!(!tokenizer.has_next());
    }

    #[test]
    fn short_flag_cluster_equals_classifies_as_value() {
        let mut tokenizer = tokenizer(&["-x=5"]);

        assert_eq!(tokenizer.read_short_flag(), 'x');
        assert_eq!(tokenizer.peek_kind(), Token::OptionArgument);
        assert_eq!(tokenizer.read_option_argument(), "5");
    }

    #[rstest]
    #[case("--name=val", "name", "val")]
    #[case("--name=", "name", "")]
    #[case("--name=a=b", "name", "a=b")]
    fn long_flag_attached_value(#[case] arg: &str, #[case] name: &str, #[case] value: &str) {
        let mut tokenizer = tokenizer(&[arg]);

        assert_eq!(tokenizer.read_flag(), name);
        assert_eq!(tokenizer.peek_kind(), Token::OptionArgument);
        assert_eq!(tokenizer.read_option_argument(), value);
        assert!(!tokenizer.has_next());
    }

    #[test]
    fn long_flag_detached_value() {
        let mut tokenizer = tokenizer(&["--name", "val"]);

        assert_eq!(tokenizer.read_flag(), "name");
        assert_eq!(tokenizer.peek_kind(), Token::Positional);
        assert_eq!(tokenizer.read_option_argument(), "val");
        assert!(!tokenizer.has_next());
    }

    #[test]
    fn positional_consumes_whole_argument() {
        let mut tokenizer = tokenizer(&["hello", "world"]);

        assert_eq!(tokenizer.read_positional(), "hello");
        assert_eq!(tokenizer.read_positional(), "world");
        assert!(!tokenizer.has_next());
    }

    #[test]
    fn terminator_classification() {
        let mut tokenizer = tokenizer(&["--", "-v"]);

        assert_eq!(tokenizer.peek_kind(), Token::OptionTerminator);
        assert_eq!(tokenizer.read_positional(), "--");
        // The driver forces everything after the terminator down the
        // positional path; the tokenizer itself still classifies.
        assert_eq!(tokenizer.peek_kind(), Token::ShortFlag);
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn positional_read_rejected_mid_cluster() {
        let mut tokenizer = tokenizer(&["-ab"]);

        tokenizer.read_short_flag();
        tokenizer.read_positional();
    }

    #[test]
    #[should_panic(expected = "internal error")]
    fn short_flag_read_rejected_while_value_pending() {
        let mut tokenizer = tokenizer(&["--name=val"]);

        tokenizer.read_flag();
        tokenizer.read_short_flag();
    }
}
