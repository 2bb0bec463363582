//! Point rounding and display helpers

/// Round `value` to `digits` decimal places
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits.max(0));
    (value * factor).round() / factor
}

/// Render points the way scoreboards show them.
///
/// Values that are whole after rounding to `digits` drop their decimals;
/// everything else keeps exactly `digits` decimals.
pub fn format_points(value: f64, digits: i32) -> String {
    let digits = digits.max(0);
    let rounded = round_to(value, digits);

    if rounded.fract() == 0.0 {
        // Avoid rendering "-0"
        let whole = if rounded == 0.0 { 0.0 } else { rounded };
        format!("{:.0}", whole)
    } else {
        format!("{:.*}", digits as usize, rounded)
    }
}
