// src/tools.rs - Small numeric helpers shared by the drive code

/// Truncates `number` into `[lowest, highest]`.
pub fn limit(number: f64, lowest: f64, highest: f64) -> f64 {
    if number > highest {
        highest
    } else if number < lowest {
        lowest
    } else {
        number
    }
}

/// Maps `number` from the raw range onto the adjusted range.
///
/// The input is clamped into `[raw_min, raw_max]` first, so
/// `coerce(3.0, 0.0, 10.0, 0.0, 100.0)` is `30.0` and
/// `coerce(42.0, 0.0, 10.0, 0.0, 100.0)` is `100.0`.
pub fn coerce(number: f64, raw_min: f64, raw_max: f64, adjusted_min: f64, adjusted_max: f64) -> f64 {
    let number = limit(number, raw_min, raw_max);
    let percentage = (number - raw_min) / (raw_max - raw_min);
    percentage * (adjusted_max - adjusted_min) + adjusted_min
}

/// Parses an operator-entered number. Returns `None` for anything that is
/// not a finite float.
pub fn parse_number(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Sign of `x` as `-1.0`, `0.0` or `1.0`.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
