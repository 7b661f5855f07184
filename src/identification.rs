use std::time::Instant;

use crate::{
    configuration::Configuration,
    error::Error,
    identification_result::{Identification, IdentificationResult},
    io::Sample,
    peak_matcher::{match_reference_table, MatchedGene},
    peak_set::PeakSet,
    reference::{Candidate, ReferenceModel, ReferenceTable},
    scoring::{Decision, ScoringEngine},
};

/// Identifies samples against a shared reference model. Holds no state between calls, so one pipeline
/// (or several) can be used from multiple threads at once.
pub struct IdentificationPipeline<'a> {
    config: &'a Configuration,
    model: &'a ReferenceModel,
}

impl IdentificationPipeline<'_> {
    /// Creates a new IdentificationPipeline instance.
    ///
    /// Arguments:
    /// * `config` - Thresholds, tolerance and match policy
    /// * `model` - Reference model to identify against
    ///
    pub fn new<'a>(
        config: &'a Configuration,
        model: &'a ReferenceModel,
    ) -> IdentificationPipeline<'a> {
        IdentificationPipeline { config, model }
    }

    pub fn peak_set(&self, sample: &Sample) -> Result<PeakSet, Error> {
        PeakSet::build(
            &sample.masses,
            &sample.intensities,
            self.config.intensity_threshold,
        )
    }

    /// Identifies genus and species of a sample.
    ///
    /// # Arguments
    /// * `sample` - Raw peak list
    ///
    pub fn identify(&self, sample: &Sample) -> Result<Identification, Error> {
        let start = Instant::now();

        let peak_set = self.peak_set(sample)?;
        if peak_set.is_empty() {
            log::debug!(
                "{}: no peaks above intensity threshold {}",
                sample.source.display(),
                self.config.intensity_threshold
            );
        }

        let (score, tied) = match ScoringEngine::new(self.config, self.model).score(&peak_set) {
            Decision::BelowThreshold { score } => {
                log::debug!("{}: unidentified, score {score}", sample.source.display());
                return Ok(Identification::Unidentified { score });
            }
            Decision::Identified { score, candidates } => (score, candidates),
        };

        let candidates: Vec<&Candidate> = tied
            .iter()
            .filter_map(|candidate| self.model.candidate(candidate.index))
            .collect();

        let genus = candidates
            .first()
            .map(|candidate| candidate.genus.clone())
            .unwrap_or_default();

        let mut species: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if !species.contains(&candidate.species) {
                species.push(candidate.species.clone());
            }
        }

        let result = IdentificationResult {
            score,
            genus,
            species,
            candidates: candidates.iter().map(|candidate| candidate.id.clone()).collect(),
            elapsed: start.elapsed(),
            source: sample.source.clone(),
        };
        log::debug!(
            "{}: {} {:?}, score {} in {:?}",
            result.source.display(),
            result.genus,
            result.species,
            result.score,
            result.elapsed
        );

        Ok(Identification::Identified(result))
    }

    /// Reference genes of `species` found in the sample, see [`match_reference_table`].
    ///
    /// # Arguments
    /// * `sample` - Raw peak list
    /// * `table` - Reference table of the genus
    /// * `species` - Species within the genus
    ///
    pub fn matched_genes(
        &self,
        sample: &Sample,
        table: &ReferenceTable,
        species: &str,
    ) -> Result<Vec<MatchedGene>, Error> {
        let peak_set = self.peak_set(sample)?;
        Ok(match_reference_table(
            &peak_set,
            table,
            species,
            self.config.tolerance_ppm,
            self.config.match_policy,
        ))
    }
}
