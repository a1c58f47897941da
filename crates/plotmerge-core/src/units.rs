//! Numeric helpers shared by the post-processing crates
//!
//! Height comparisons use a small tolerance band so that values which went
//! through a text round trip (`8` vs `7.99999`) do not flap between states.
//! Formatting keeps emitted G-code words short: `1000` rather than `1000.000`.

/// Tolerance used whenever two heights are compared.
pub const FLOAT_EPS: f64 = 1e-4;

/// Returns true when `a` and `b` are within [`FLOAT_EPS`] of each other.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_EPS
}

/// Formats a G-code word value with the shortest exact representation.
///
/// Negative zero is printed as `0` so that a computed `-0.0` never ends up
/// as `Z-0` in the output.
pub fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}
