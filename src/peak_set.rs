use ndarray::Array1;

use crate::error::Error;

/// Intensities above this maximum are scaled by the observed maximum.
const RELATIVE_SCALE_LIMIT: f64 = 100.0;

/// Intensities above this maximum (and up to `RELATIVE_SCALE_LIMIT`) are percentages.
const PERCENT_SCALE_LIMIT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub mass: f64,
    pub intensity: f64,
}

/// Normalized and intensity filtered peaks of one sample, in input order.
/// Duplicate masses are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakSet {
    peaks: Vec<Peak>,
}

impl PeakSet {
    /// Normalizes the intensities and keeps peaks with a normalized intensity strictly above `threshold`.
    ///
    /// # Arguments
    /// * `masses` - Observed masses
    /// * `intensities` - Raw intensities, same length as `masses`
    /// * `threshold` - Normalized intensity threshold
    ///
    pub fn build(
        masses: &Array1<f64>,
        intensities: &Array1<f64>,
        threshold: f64,
    ) -> Result<Self, Error> {
        if masses.len() != intensities.len() {
            return Err(Error::PeakListShape(masses.len(), intensities.len()));
        }

        let normalized = normalize_intensities(intensities);

        let peaks = masses
            .iter()
            .zip(normalized.iter())
            .filter(|(_, &intensity)| intensity > threshold)
            .map(|(&mass, &intensity)| Peak { mass, intensity })
            .collect();

        Ok(Self { peaks })
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }
}

impl<'a> IntoIterator for &'a PeakSet {
    type Item = &'a Peak;
    type IntoIter = std::slice::Iter<'a, Peak>;

    fn into_iter(self) -> Self::IntoIter {
        self.peaks.iter()
    }
}

/// Scales intensities into [0, 1].
///
/// Exactly one rule applies:
/// * max > 100: divide by the maximum
/// * 1 < max <= 100: divide by 100
/// * otherwise: unchanged
///
pub fn normalize_intensities(intensities: &Array1<f64>) -> Array1<f64> {
    let max_intensity = intensities
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));

    if max_intensity > RELATIVE_SCALE_LIMIT {
        intensities / max_intensity
    } else if max_intensity > PERCENT_SCALE_LIMIT {
        intensities / RELATIVE_SCALE_LIMIT
    } else {
        intensities.clone()
    }
}
