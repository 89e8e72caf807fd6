//! Number selection for the `numbers` command.

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// One integer, optionally followed by a non-digit separator and a second integer.
/// Anchored at the start.
static LEADING_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+)(?:\D+?(-?\d+))?").expect("hardcoded range regex")
});

const DEFAULT_MAX: i64 = 999;

/// Integers found at the start of the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSpec {
    /// No argument: `[0, 999]`.
    Default,
    /// `N`: `[0, N]`.
    UpTo(i64),
    /// `A ... B`: `[A, B]`.
    Between(i64, i64),
    /// Non-numeric text, mapped to a fixed value.
    Text(i64),
}

impl NumberSpec {
    pub fn parse(arg: Option<&str>) -> Self {
        let Some(arg) = arg.map(str::trim).filter(|arg| !arg.is_empty()) else {
            return NumberSpec::Default;
        };

        let captures = LEADING_RANGE.captures(arg);
        let first = captures
            .as_ref()
            .and_then(|captures| captures.get(1))
            .and_then(|m| m.as_str().parse::<i64>().ok());
        let second = captures
            .as_ref()
            .and_then(|captures| captures.get(2))
            .and_then(|m| m.as_str().parse::<i64>().ok());

        match (first, second) {
            (Some(low), Some(high)) => NumberSpec::Between(low, high),
            (Some(max), None) => NumberSpec::UpTo(max),
            _ => NumberSpec::Text(text_number(arg)),
        }
    }

    /// Draw a value, or `None` when the range is empty or reversed.
    pub fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> Option<i64> {
        match self {
            NumberSpec::Default => Some(rng.random_range(0..=DEFAULT_MAX)),
            NumberSpec::UpTo(max) if max >= 0 => Some(rng.random_range(0..=max)),
            NumberSpec::UpTo(_) => None,
            NumberSpec::Between(low, high) if low < high => Some(rng.random_range(low..=high)),
            NumberSpec::Between(..) => None,
            NumberSpec::Text(value) => Some(value),
        }
    }
}

/// Map text to `[0, 999]` with 64-bit FNV-1a over its UTF-8 bytes. Stable across runs.
pub fn text_number(text: &str) -> i64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = text.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    });
    (hash % (DEFAULT_MAX as u64 + 1)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    fn draws(arg: Option<&str>) -> Vec<Option<i64>> {
        let mut rng = StdRng::seed_from_u64(42);
        let spec = NumberSpec::parse(arg);
        (0..200).map(|_| spec.pick(&mut rng)).collect()
    }

    #[test]
    fn single_number_bounds_the_range() {
        assert_eq!(NumberSpec::parse(Some("5")), NumberSpec::UpTo(5));
        for value in draws(Some("5")) {
            assert!((0..=5).contains(&value.unwrap()));
        }
    }

    #[test]
    fn two_numbers_form_a_range() {
        assert_eq!(NumberSpec::parse(Some("3 to 9")), NumberSpec::Between(3, 9));
        assert_eq!(NumberSpec::parse(Some("-4..4")), NumberSpec::Between(-4, 4));
        assert_eq!(NumberSpec::parse(Some("1 100")), NumberSpec::Between(1, 100));
        assert_eq!(NumberSpec::parse(Some("10 20")), NumberSpec::Between(10, 20));
        assert_eq!(NumberSpec::parse(Some("5 to -2")), NumberSpec::Between(5, -2));
        assert_eq!(NumberSpec::parse(Some("123")), NumberSpec::UpTo(123));
        for value in draws(Some("3 to 9")) {
            assert!((3..=9).contains(&value.unwrap()));
        }
        for value in draws(Some("10 20")) {
            assert!((10..=20).contains(&value.unwrap()));
        }
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(draws(Some("9 to 3")).iter().all(Option::is_none));
        assert!(draws(Some("4 and 4")).iter().all(Option::is_none));
        assert!(draws(Some("-3")).iter().all(Option::is_none));
    }

    #[test]
    fn absent_argument_uses_default_range() {
        assert_eq!(NumberSpec::parse(None), NumberSpec::Default);
        assert_eq!(NumberSpec::parse(Some("  ")), NumberSpec::Default);
        for value in draws(None) {
            assert!((0..=999).contains(&value.unwrap()));
        }
    }

    #[test]
    fn text_maps_to_a_fixed_value() {
        let first = draws(Some("hello"));
        let value = first[0].unwrap();
        assert!((0..=999).contains(&value));
        assert!(first.iter().all(|draw| *draw == Some(value)));
        assert_eq!(NumberSpec::parse(Some("hello")), NumberSpec::parse(Some("hello")));
    }

    #[test]
    fn numbers_after_text_are_not_ranges() {
        assert!(matches!(NumberSpec::parse(Some("pick 5")), NumberSpec::Text(_)));
    }

    #[test]
    fn fnv_matches_reference_vectors() {
        // FNV-1a 64 of "a" is 0xaf63dc4c8601ec8c.
        assert_eq!(text_number("a"), (0xaf63_dc4c_8601_ec8c_u64 % 1000) as i64);
        assert_eq!(text_number(""), (0xcbf2_9ce4_8422_2325_u64 % 1000) as i64);
    }
}
