/*!
Low-level classification of single command-line arguments. Takes care of the
distinctions between keys, positionals, the `--` separator and the
`--key=value` form. No type handling happens here.
*/

/// A bare `--`. Every argument after it is treated as a positional.
pub const SEPARATOR: &str = "--";

/// The spellings that request a usage message, when help is enabled.
pub const HELP_KEYS: [&str; 2] = ["-h", "--help"];

/// The prefix that marks an argument as a key rather than a value.
pub const FLAG_PREFIX: char = '-';

/// Split a `--key=value` argument into its key (including the leading dashes)
/// and its value. Returns `None` for anything that isn't a long option with
/// an `=`.
#[inline]
#[must_use]
pub fn split_long(argument: &str) -> Option<(&str, &str)> {
    if !argument.starts_with("--") {
        return None;
    }

    memchr::memchr(b'=', argument.as_bytes())
        .map(|idx| (&argument[..idx], &argument[idx + 1..]))
}

/// True if the argument is shaped like a negative number, such as `-5` or
/// `-.5`.
#[must_use]
pub fn is_negative_number(argument: &str) -> bool {
    match argument.as_bytes() {
        [b'-', b'0'..=b'9', ..] => true,
        [b'-', b'.', b'0'..=b'9', ..] => true,
        _ => false,
    }
}

/// True if the argument can be consumed as a positional value. A lone `-` is
/// positional (it conventionally means stdin); negative numbers are
/// positional only if `negative_numbers` is set.
#[must_use]
pub fn looks_positional(argument: &str, negative_numbers: bool) -> bool {
    match argument.strip_prefix(FLAG_PREFIX) {
        None => true,
        Some("") => true,
        Some(_) => negative_numbers && is_negative_number(argument),
    }
}

/// The long spelling of a field name: `my_value` becomes `--my-value`.
#[must_use]
pub fn long_key(field: &str) -> String {
    format!("--{}", display_name(field))
}

/// The negated long spelling of a field name: `my_value` becomes
/// `--no-my-value`.
#[must_use]
pub fn false_key(field: &str) -> String {
    format!("--no-{}", display_name(field))
}

/// `-c` for a short alias `c`
#[must_use]
pub fn short_key(short: char) -> String {
    format!("-{short}")
}

/// `-no-c` for a short alias `c`
#[must_use]
pub fn false_short_key(short: char) -> String {
    format!("-no-{short}")
}

/// The user-facing form of a field name, used for positionals and in
/// messages: `my_value` becomes `my-value`.
#[must_use]
pub fn display_name(field: &str) -> String {
    field.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("--repeat=3", Some(("--repeat", "3")))]
    #[case("--repeat=", Some(("--repeat", "")))]
    #[case("--expr=a=b", Some(("--expr", "a=b")))]
    #[case("--repeat", None)]
    #[case("-r=3", None)]
    #[case("name=value", None)]
    fn split_long_cases(#[case] argument: &str, #[case] expected: Option<(&str, &str)>) {
        assert_eq!(split_long(argument), expected);
    }

    #[rstest]
    #[case("Ada", true, true)]
    #[case("-", true, true)]
    #[case("-5", true, true)]
    #[case("-5", false, false)]
    #[case("-.5", true, true)]
    #[case("-v", true, false)]
    #[case("--verbose", true, false)]
    #[case("--", true, false)]
    fn positional_shapes(
        #[case] argument: &str,
        #[case] negative_numbers: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(looks_positional(argument, negative_numbers), expected);
    }

    #[test]
    fn key_spellings() {
        assert_eq!(long_key("my_value"), "--my-value");
        assert_eq!(false_key("my_value"), "--no-my-value");
        assert_eq!(short_key('m'), "-m");
        assert_eq!(false_short_key('m'), "-no-m");
        assert_eq!(display_name("my_value"), "my-value");
    }
}
