//! Rendering of numbers with Bengali digits.

const BANGLA_DIGITS: [char; 10] = ['০', '১', '২', '৩', '৪', '৫', '৬', '৭', '৮', '৯'];

/// Swap every ASCII digit for its Bengali counterpart. Everything else,
/// including signs and separators, passes through untouched.
pub fn to_bangla_digits(text: &str) -> String {
    text.chars()
        .map(|ch| match ch.to_digit(10) {
            Some(digit) if ch.is_ascii_digit() => BANGLA_DIGITS[digit as usize],
            _ => ch,
        })
        .collect()
}

/// Inverse of [`to_bangla_digits`], so typed input in either script parses.
pub fn to_ascii_digits(text: &str) -> String {
    text.chars()
        .map(|ch| match BANGLA_DIGITS.iter().position(|&d| d == ch) {
            Some(digit) => char::from(b'0' + digit as u8),
            None => ch,
        })
        .collect()
}

/// Integers that know how to print themselves with Bengali digits.
pub trait BanglaNumeral {
    fn to_bangla(&self) -> String;
}

macro_rules! impl_bangla_numeral {
    ($($ty:ty),*) => {
        $(
            impl BanglaNumeral for $ty {
                fn to_bangla(&self) -> String {
                    to_bangla_digits(&self.to_string())
                }
            }
        )*
    };
}

impl_bangla_numeral!(i32, i64, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_integers() {
        assert_eq!(1905.to_bangla(), "১৯০৫");
        assert_eq!(0i64.to_bangla(), "০");
        assert_eq!((-42i32).to_bangla(), "-৪২");
        assert_eq!(12usize.to_bangla(), "১২");
    }

    #[test]
    fn leaves_non_digits_untouched() {
        assert_eq!(to_bangla_digits("ওরা 11 জন"), "ওরা ১১ জন");
        assert_eq!(to_bangla_digits("১৯৭১"), "১৯৭১");
        assert_eq!(to_bangla_digits(""), "");
    }

    #[test]
    fn reads_bangla_digits_back() {
        assert_eq!(to_ascii_digits("১৯৭১"), "1971");
        assert_eq!(to_ascii_digits("১9৮3"), "1983");
        assert_eq!(to_ascii_digits("সাল"), "সাল");
    }
}
