//! Numeric values with integer/float semantics.

use super::CalculationError;

/// Result of an arithmetic evaluation.
///
/// Integer arithmetic stays integral until it overflows `i64`, at which
/// point it continues in floating point. Division always yields a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    pub fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 + b as f64)),
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_sub(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 - b as f64)),
            (a, b) => Number::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_mul(b)
                .map(Number::Int)
                .unwrap_or(Number::Float(a as f64 * b as f64)),
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    pub fn div(self, rhs: Number) -> Result<Number, CalculationError> {
        if rhs.is_zero() {
            return Err(CalculationError::DivisionByZero);
        }
        Ok(Number::Float(self.as_f64() / rhs.as_f64()))
    }

    pub fn neg(self) -> Number {
        match self {
            Number::Int(i) => i
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(i as f64))),
            Number::Float(f) => Number::Float(-f),
        }
    }

    pub fn pow(self, rhs: Number) -> Result<Number, CalculationError> {
        if let (Number::Int(base), Number::Int(exp)) = (self, rhs) {
            if exp >= 0 {
                if let Ok(exp) = u32::try_from(exp)
                    && let Some(value) = base.checked_pow(exp)
                {
                    return Ok(Number::Int(value));
                }
            } else if base == 0 {
                return Err(CalculationError::DivisionByZero);
            }
        }

        let (base, exp) = (self.as_f64(), rhs.as_f64());
        if base == 0.0 && exp < 0.0 {
            return Err(CalculationError::DivisionByZero);
        }
        if base < 0.0 && exp.fract() != 0.0 {
            return Err(CalculationError::Complex);
        }
        let value = base.powf(exp);
        if value.is_infinite() && base.is_finite() && exp.is_finite() {
            return Err(CalculationError::Overflow);
        }
        Ok(Number::Float(value))
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", format_float(*x)),
        }
    }
}

/// Shortest round-trip float text, always marked as a float.
///
/// `2.0` keeps its fraction, magnitudes from `1e16` up and below `1e-4`
/// switch to exponent notation with a signed two-digit exponent.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let magnitude = value.abs();
    if (1e-4..1e16).contains(&magnitude) {
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        }
    } else {
        let text = format!("{:e}", value);
        match text.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => text,
        }
    }
}
