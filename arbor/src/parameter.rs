use core::{fmt::Display, str::FromStr};

use crate::schema::ValueType;

/**
A parameter is a type that can be constructed from the text of a single
command-line argument.

The parameter trait is the "type" part of a field: it's independent of whether
the field is a positional, a keyword, or an element of a collection. The
binder hands it the raw text the user typed and reports any error it returns
against that text, so the error should describe what's wrong with the value
rather than repeat it.

For most types it makes more sense to implement [`ParsedValue`], which
derives a [`Parameter`] implementation from [`FromStr`].
*/
pub trait Parameter: Sized {
    /// The kind of value this is, as reported in usage messages
    const TYPE: ValueType;

    /// If this type only accepts a fixed set of spellings, those spellings.
    /// The binder checks arguments against this set before calling
    /// [`from_arg`][Parameter::from_arg].
    #[inline]
    #[must_use]
    fn choices() -> Option<&'static [&'static str]> {
        None
    }

    /// Parse this type from the text of an argument
    fn from_arg(arg: &str) -> Result<Self, String>;
}

/// For types with a [`FromStr`] implementation, [`ParsedValue`] automatically
/// gives them a [`Parameter`] implementation so that they can be used as
/// command line arguments.
pub trait ParsedValue: FromStr {
    const TYPE: ValueType = ValueType::String;
}

impl<T> Parameter for T
where
    T: ParsedValue,
    T::Err: Display,
{
    const TYPE: ValueType = <T as ParsedValue>::TYPE;

    #[inline]
    fn from_arg(arg: &str) -> Result<Self, String> {
        arg.parse().map_err(|err: T::Err| err.to_string())
    }
}

macro_rules! from_str {
    ($(
        $kind:ident => [$($type:ty),* $(,)?]
    )*) => {
        $($(
            impl ParsedValue for $type {
                const TYPE: ValueType = ValueType::$kind;
            }
        )*)*
    };
}

from_str! {
    Integer => [i8, i16, i32, i64, i128, isize]
    NonNegativeInteger => [u8, u16, u32, u64, u128, usize]
    Float => [f32, f64]
    String => [
        char,
        String,
        std::net::Ipv4Addr,
        std::net::Ipv6Addr,
        std::net::IpAddr,
        std::net::SocketAddrV4,
        std::net::SocketAddrV6,
        std::net::SocketAddr,
    ]
    Path => [std::path::PathBuf]
}

/// Booleans given as values (rather than as flags) accept the usual
/// spellings, case-insensitively.
impl Parameter for bool {
    const TYPE: ValueType = ValueType::Boolean;

    fn from_arg(arg: &str) -> Result<Self, String> {
        match arg.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err("expected a boolean such as `true` or `false`".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("yes", Ok(true))]
    #[case("FALSE", Ok(false))]
    #[case("0", Ok(false))]
    #[case("maybe", Err("expected a boolean such as `true` or `false`".to_owned()))]
    fn bool_spellings(#[case] arg: &str, #[case] expected: Result<bool, String>) {
        assert_eq!(bool::from_arg(arg), expected);
    }

    #[test]
    fn parse_errors_become_reasons() {
        assert_eq!(u32::from_arg("12"), Ok(12));
        assert_eq!(
            i32::from_arg("twelve"),
            Err("invalid digit found in string".to_owned())
        );
    }

    #[test]
    fn value_types() {
        assert_eq!(<i64 as Parameter>::TYPE, ValueType::Integer);
        assert_eq!(<u8 as Parameter>::TYPE, ValueType::NonNegativeInteger);
        assert_eq!(<std::path::PathBuf as Parameter>::TYPE, ValueType::Path);
        assert_eq!(<String as Parameter>::choices(), None);
    }
}
