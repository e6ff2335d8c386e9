//! Kubernetes resource quantities.
//!
//! A quantity is a signed decimal number followed by an optional suffix: a
//! binary SI suffix (`Ki`, `Mi`, ...), a decimal SI suffix (`n`, `m`, `k`,
//! `M`, ...) or a decimal exponent (`e3`, `E-2`). Values are kept exact as
//! `mantissa * 10^exp10 * 2^exp2` and only rounded when scaled to an integer.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("quantity `{0}` has no digits")]
    NoDigits(String),

    #[error("quantity `{0}` has an unknown suffix")]
    UnknownSuffix(String),

    #[error("quantity `{0}` is out of range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    mantissa: i128,
    exp10: i32,
    exp2: u32,
}

/// Largest number of significant digits kept in the mantissa.
const MAX_DIGITS: usize = 36;

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }
        let out_of_range = || QuantityError::OutOfRange(s.to_owned());

        let (negative, rest) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(QuantityError::NoDigits(s.to_owned()));
        }

        let digits = format!("{int_part}{frac_part}");
        let digits = digits.trim_start_matches('0');
        if digits.len() > MAX_DIGITS {
            return Err(out_of_range());
        }
        let mut mantissa = if digits.is_empty() {
            0
        } else {
            digits.parse::<i128>().map_err(|_| out_of_range())?
        };
        if negative {
            mantissa = -mantissa;
        }

        let frac_len = i32::try_from(frac_part.len()).map_err(|_| out_of_range())?;
        let (suffix_exp10, exp2) =
            parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix(s.to_owned()))?;
        let exp10 = suffix_exp10.checked_sub(frac_len).ok_or_else(out_of_range)?;

        Ok(Self {
            mantissa,
            exp10,
            exp2,
        })
    }
}

/// Returns the base-10 and base-2 exponents a suffix stands for.
fn parse_suffix(suffix: &str) -> Option<(i32, u32)> {
    let exps = match suffix {
        "" => (0, 0),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        "Ki" => (0, 10),
        "Mi" => (0, 20),
        "Gi" => (0, 30),
        "Ti" => (0, 40),
        "Pi" => (0, 50),
        "Ei" => (0, 60),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (exponent.parse().ok()?, 0)
        }
    };
    Some(exps)
}

impl Quantity {
    /// The value multiplied by `10^scale`, rounded away from zero.
    fn scaled(&self, scale: i32) -> Option<i128> {
        if self.mantissa == 0 {
            return Some(0);
        }
        let sign = self.mantissa.signum();
        let magnitude = self
            .mantissa
            .checked_abs()?
            .checked_mul(2i128.checked_pow(self.exp2)?)?;
        let exp = self.exp10.checked_add(scale)?;

        let scaled = if exp >= 0 {
            magnitude.checked_mul(10i128.checked_pow(exp.unsigned_abs())?)?
        } else {
            match 10i128.checked_pow(exp.unsigned_abs()) {
                Some(divisor) => {
                    let quotient = magnitude / divisor;
                    if magnitude % divisor == 0 {
                        quotient
                    } else {
                        quotient + 1
                    }
                }
                // Any nonzero magnitude is below one unit at this scale.
                None => 1,
            }
        };
        Some(sign * scaled)
    }

    /// Integer value, rounded up.
    pub fn value(&self) -> Option<i64> {
        self.scaled(0).and_then(|v| i64::try_from(v).ok())
    }

    /// Value in thousandths, rounded up.
    pub fn milli_value(&self) -> Option<i64> {
        self.scaled(3).and_then(|v| i64::try_from(v).ok())
    }
}

/// CPU usage in millicores.
pub fn cpu_millis(raw: &str) -> Result<i64, QuantityError> {
    raw.parse::<Quantity>()?
        .milli_value()
        .ok_or_else(|| QuantityError::OutOfRange(raw.to_owned()))
}

/// Memory usage in whole mebibytes, truncated.
pub fn memory_mebibytes(raw: &str) -> Result<i64, QuantityError> {
    let bytes = raw
        .parse::<Quantity>()?
        .value()
        .ok_or_else(|| QuantityError::OutOfRange(raw.to_owned()))?;
    Ok(bytes / (1024 * 1024))
}
