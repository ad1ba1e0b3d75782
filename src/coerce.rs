//! Numeric coercion for string fields reported by the array.
//!
//! ONTAP reports counters and sizes as strings. Anything that does not parse
//! as a finite decimal number becomes `0.0`; the caller never sees an error
//! and nothing is logged, so a single malformed field costs one zero sample
//! instead of the whole metric.

/// Parses `raw` as a decimal number, falling back to `0.0`.
pub fn to_f64(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Canonical gauge value for a binary state field.
pub fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
