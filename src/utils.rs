/// Rounds to the given number of decimals, resolving exact halves to the even neighbour
/// (the behaviour of numpy's `round`).
///
/// # Arguments
/// * `value` - Value to round
/// * `decimals` - Number of decimal places to keep
///
pub fn round_to_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Mass difference expressed in parts per million of `target_mass`.
///
/// # Arguments
/// * `difference` - Absolute mass difference (Da)
/// * `target_mass` - Reference mass (Da)
///
pub fn ppm_error(difference: f64, target_mass: f64) -> f64 {
    difference * 1e6 / target_mass
}

/// Largest absolute mass difference accepted for `target_mass` at `tolerance_ppm`.
pub fn ppm_window(target_mass: f64, tolerance_ppm: f64) -> f64 {
    target_mass * tolerance_ppm * 1e-6
}
