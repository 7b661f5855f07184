use crate::{
    configuration::MatchPolicy,
    peak_set::{Peak, PeakSet},
    reference::ReferenceTable,
    utils::{ppm_error, ppm_window, round_to_decimals},
};

/// A peak found within tolerance of a reference mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Distance to the reference mass in ppm, rounded to 2 decimals
    pub ppm_error: f64,
    pub matched_mass: f64,
    pub matched_intensity: f64,
}

/// One reference gene found in a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedGene {
    pub genus: String,
    pub species: String,
    pub gene_name: String,
    pub ppm_error: f64,
    pub matched_mass: f64,
    pub matched_intensity: f64,
}

/// Returns the peak matching `target_mass`, i.e. a peak with an absolute mass difference strictly below
/// `target_mass * tolerance_ppm * 1e-6`. With `MatchPolicy::FirstInOrder` the first such peak in peak set
/// order is returned even if a later one is closer.
///
/// # Arguments
/// * `peak_set` - Filtered peaks of the sample
/// * `target_mass` - Reference mass to look up
/// * `tolerance_ppm` - Tolerance in parts per million
/// * `policy` - Which peak wins when several are within tolerance
///
pub fn find_nearest(
    peak_set: &PeakSet,
    target_mass: f64,
    tolerance_ppm: f64,
    policy: MatchPolicy,
) -> Option<MatchResult> {
    let window = ppm_window(target_mass, tolerance_ppm);

    let mut within_tolerance = peak_set
        .iter()
        .map(|peak| (peak, (peak.mass - target_mass).abs()))
        .filter(|(_, difference)| *difference < window);

    let (peak, difference): (&Peak, f64) = match policy {
        MatchPolicy::FirstInOrder => within_tolerance.next()?,
        MatchPolicy::Closest => within_tolerance.fold(None, |best: Option<(&Peak, f64)>, current| {
            match best {
                Some(best) if best.1 <= current.1 => Some(best),
                _ => Some(current),
            }
        })?,
    };

    Some(MatchResult {
        ppm_error: round_to_decimals(ppm_error(difference, target_mass), 2),
        matched_mass: peak.mass,
        matched_intensity: peak.intensity,
    })
}

/// Matches every reference row of `species` against the sample. Rows without a matching peak are left out.
///
/// # Arguments
/// * `peak_set` - Filtered peaks of the sample
/// * `table` - Reference table of one genus
/// * `species` - Species within the genus
/// * `tolerance_ppm` - Tolerance in parts per million
/// * `policy` - Which peak wins when several are within tolerance
///
pub fn match_reference_table(
    peak_set: &PeakSet,
    table: &ReferenceTable,
    species: &str,
    tolerance_ppm: f64,
    policy: MatchPolicy,
) -> Vec<MatchedGene> {
    table
        .rows_for_species(species)
        .filter_map(|row| {
            let matched = find_nearest(peak_set, row.expected_weight, tolerance_ppm, policy)?;
            Some(MatchedGene {
                genus: table.genus().to_string(),
                species: row.species.clone(),
                gene_name: row.gene_name.clone(),
                ppm_error: matched.ppm_error,
                matched_mass: matched.matched_mass,
                matched_intensity: matched.matched_intensity,
            })
        })
        .collect()
}
