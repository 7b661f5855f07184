use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use ndarray::{Array1, Array2};

use crate::{
    configuration::{Configuration, MatchPolicy},
    peak_matcher::find_nearest,
    peak_set::PeakSet,
    reference::ReferenceModel,
    utils::round_to_decimals,
};

/// Number of best ranked candidates the final score is chosen from.
pub const PANEL_SIZE: usize = 4;

/// Similarity of the sample to the candidate at `index` of the reference model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub index: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Final score reached the score threshold. `candidates` holds every panel entry with exactly that score.
    Identified {
        score: f64,
        candidates: Vec<CandidateScore>,
    },
    /// Final score is below the score threshold (or there was nothing to score).
    BelowThreshold { score: f64 },
}

/// Missing reference weights take part in the lookup as 0.
fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        0.0
    } else {
        weight
    }
}

pub struct ScoringEngine<'a> {
    config: &'a Configuration,
    model: &'a ReferenceModel,
}

impl ScoringEngine<'_> {
    /// Creates a new ScoringEngine instance.
    ///
    /// Arguments:
    /// * `config` - Tolerance, match policy and score threshold
    /// * `model` - Reference model to score against, shared read-only
    ///
    pub fn new<'a>(config: &'a Configuration, model: &'a ReferenceModel) -> ScoringEngine<'a> {
        ScoringEngine { config, model }
    }

    /// Distinct expected weights over all candidates and discriminative genes, in row-major order of first
    /// appearance. Each weight only needs to be matched once.
    ///
    pub fn distinct_weights(model: &ReferenceModel) -> Vec<f64> {
        let mut seen: HashSet<u64> = HashSet::new();
        model
            .gene_weights()
            .iter()
            .map(|&weight| sanitize_weight(weight))
            .filter(|weight| seen.insert(weight.to_bits()))
            .collect()
    }

    /// Closeness of `weight` to the sample: `exp(-d * 1e3 / weight)` rounded to 2 decimals, where `d` is the
    /// absolute mass difference (Da) to the matched peak. 0 if no peak matches.
    ///
    /// Note: `d * 1e3 / weight` equals the ppm error divided by 1000. The scaling is kept as is to reproduce
    /// established scores, it is not claimed to be principled.
    ///
    /// # Arguments
    /// * `peak_set` - Filtered peaks of the sample
    /// * `weight` - Expected weight
    /// * `tolerance_ppm` - Tolerance in parts per million
    /// * `policy` - Which peak wins when several are within tolerance
    ///
    pub fn closeness_score(
        peak_set: &PeakSet,
        weight: f64,
        tolerance_ppm: f64,
        policy: MatchPolicy,
    ) -> f64 {
        match find_nearest(peak_set, weight, tolerance_ppm, policy) {
            Some(matched) => {
                let difference = (matched.matched_mass - weight).abs();
                round_to_decimals((-difference * 1e3 / weight).exp(), 2)
            }
            None => 0.0,
        }
    }

    /// Closeness score for every distinct reference weight, keyed by the weight's bit pattern.
    pub fn closeness_scores(&self, peak_set: &PeakSet) -> HashMap<u64, f64> {
        let weights = Self::distinct_weights(self.model);
        log::trace!("matching {} distinct reference weights", weights.len());

        weights
            .into_iter()
            .map(|weight| {
                let score = Self::closeness_score(
                    peak_set,
                    weight,
                    self.config.tolerance_ppm,
                    self.config.match_policy,
                );
                (weight.to_bits(), score)
            })
            .collect()
    }

    /// The gene weight matrix with every weight replaced by its closeness score.
    pub fn closeness_matrix(&self, peak_set: &PeakSet) -> Array2<f64> {
        let scores = self.closeness_scores(peak_set);
        self.model.gene_weights().mapv(|weight| {
            scores
                .get(&sanitize_weight(weight).to_bits())
                .copied()
                .unwrap_or(0.0)
        })
    }

    /// Weighted similarity per candidate: closeness matrix times the discriminative gene values.
    pub fn similarity(&self, peak_set: &PeakSet) -> Array1<f64> {
        self.closeness_matrix(peak_set).dot(self.model.gene_values())
    }

    /// All candidates sorted ascending by similarity. Equal similarities keep model order.
    pub fn score_candidates(&self, peak_set: &PeakSet) -> Vec<CandidateScore> {
        let mut ranking: Vec<CandidateScore> = self
            .similarity(peak_set)
            .iter()
            .enumerate()
            .map(|(index, &score)| CandidateScore { index, score })
            .collect();

        ranking.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
        ranking
    }

    /// The `PANEL_SIZE` best candidates of an ascending ranking, still ascending.
    pub fn top_panel(ranking: &[CandidateScore]) -> &[CandidateScore] {
        &ranking[ranking.len().saturating_sub(PANEL_SIZE)..]
    }

    /// Most frequent score of the panel. With several modes the largest one is returned, `None` if no score
    /// occurs more than once.
    ///
    pub fn panel_mode(panel: &[CandidateScore]) -> Option<f64> {
        let mut counts: Vec<(f64, usize)> = Vec::with_capacity(panel.len());
        for candidate in panel {
            match counts.iter_mut().find(|(score, _)| *score == candidate.score) {
                Some((_, count)) => *count += 1,
                None => counts.push((candidate.score, 1)),
            }
        }

        let max_count = counts.iter().map(|(_, count)| *count).max()?;
        if max_count < 2 {
            return None;
        }

        counts
            .into_iter()
            .filter(|(_, count)| *count == max_count)
            .map(|(score, _)| score)
            .reduce(f64::max)
    }

    /// Final score of a panel: its mode, or the maximum if all scores are distinct.
    pub fn select_score(panel: &[CandidateScore]) -> Option<f64> {
        Self::panel_mode(panel).or_else(|| {
            panel
                .iter()
                .map(|candidate| candidate.score)
                .reduce(f64::max)
        })
    }

    /// Applies the score threshold to the panel of an ascending ranking.
    pub fn decide(&self, ranking: &[CandidateScore]) -> Decision {
        let panel = Self::top_panel(ranking);
        let score = match Self::select_score(panel) {
            Some(score) => score,
            None => return Decision::BelowThreshold { score: 0.0 },
        };
        log::debug!("panel {panel:?} selected score {score}");

        if score.is_nan() || score < self.config.score_threshold {
            return Decision::BelowThreshold { score };
        }

        let candidates = panel
            .iter()
            .filter(|candidate| candidate.score == score)
            .copied()
            .collect();

        Decision::Identified { score, candidates }
    }

    /// Ranks all candidates for the sample and decides.
    pub fn score(&self, peak_set: &PeakSet) -> Decision {
        let ranking = self.score_candidates(peak_set);
        self.decide(&ranking)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::reference::Candidate;

    fn panel(scores: &[f64]) -> Vec<CandidateScore> {
        scores
            .iter()
            .enumerate()
            .map(|(index, &score)| CandidateScore { index, score })
            .collect()
    }

    fn model() -> ReferenceModel {
        ReferenceModel::new(
            vec![
                Candidate::new("bacillus", "subtilis"),
                Candidate::new("escherichia", "coli"),
                Candidate::new("staphylococcus", "aureus"),
            ],
            vec!["rplL".to_string(), "rpmD".to_string()],
            array![[5000.1, 7000.0], [5380.0, 7000.0], [f64::NAN, 8000.0]],
            array![0.6, 0.4],
        )
        .unwrap()
    }

    fn peak_set() -> PeakSet {
        PeakSet::build(&array![5000.0, 7000.0], &array![0.5, 0.9], 0.12).unwrap()
    }

    #[test]
    fn test_distinct_weights() {
        assert_eq!(
            ScoringEngine::distinct_weights(&model()),
            vec![5000.1, 7000.0, 5380.0, 0.0, 8000.0]
        );
    }

    /// The closeness formula is reproduced as established: `exp(-d * 1e3 / w)` with `d` in Da.
    #[test]
    fn test_closeness_score() {
        let peaks = peak_set();
        assert_eq!(
            ScoringEngine::closeness_score(&peaks, 5000.1, 1000.0, MatchPolicy::FirstInOrder),
            0.98
        );
        assert_eq!(
            ScoringEngine::closeness_score(&peaks, 7000.0, 1000.0, MatchPolicy::FirstInOrder),
            1.0
        );
        assert_eq!(
            ScoringEngine::closeness_score(&peaks, 6000.0, 1000.0, MatchPolicy::FirstInOrder),
            0.0
        );
        assert_eq!(
            ScoringEngine::closeness_score(&peaks, 0.0, 1000.0, MatchPolicy::FirstInOrder),
            0.0
        );
    }

    #[test]
    fn test_closeness_matrix_and_similarity() {
        let config = Configuration::default();
        let model = model();
        let engine = ScoringEngine::new(&config, &model);
        let peaks = peak_set();

        assert_eq!(
            engine.closeness_matrix(&peaks),
            array![[0.98, 1.0], [0.0, 1.0], [0.0, 0.0]]
        );

        let similarity = engine.similarity(&peaks);
        assert!((similarity[0] - 0.988).abs() < 1e-12);
        assert!((similarity[1] - 0.4).abs() < 1e-12);
        assert_eq!(similarity[2], 0.0);
    }

    #[test]
    fn test_score_candidates_ascending() {
        let config = Configuration::default();
        let model = model();
        let engine = ScoringEngine::new(&config, &model);

        let ranking = engine.score_candidates(&peak_set());
        let order: Vec<usize> = ranking.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_empty_peak_set_scores_zero() {
        let config = Configuration::default();
        let model = model();
        let engine = ScoringEngine::new(&config, &model);

        let similarity = engine.similarity(&PeakSet::default());
        assert_eq!(similarity, array![0.0, 0.0, 0.0]);
        assert_eq!(
            engine.score(&PeakSet::default()),
            Decision::BelowThreshold { score: 0.0 }
        );
    }

    #[test]
    fn test_top_panel() {
        let ranking = panel(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let top = ScoringEngine::top_panel(&ranking);
        assert_eq!(top.len(), PANEL_SIZE);
        assert_eq!(top[0].score, 0.3);

        let ranking = panel(&[0.1, 0.2]);
        assert_eq!(ScoringEngine::top_panel(&ranking).len(), 2);
    }

    #[test]
    fn test_select_score_mode() {
        let top = panel(&[0.7, 0.85, 0.9, 0.9]);
        assert_eq!(ScoringEngine::panel_mode(&top), Some(0.9));
        assert_eq!(ScoringEngine::select_score(&top), Some(0.9));
    }

    #[test]
    fn test_select_score_no_mode_falls_back_to_max() {
        let top = panel(&[0.8, 0.85, 0.9, 0.95]);
        assert_eq!(ScoringEngine::panel_mode(&top), None);
        assert_eq!(ScoringEngine::select_score(&top), Some(0.95));
    }

    #[test]
    fn test_select_score_several_modes_takes_largest() {
        let top = panel(&[0.8, 0.8, 0.9, 0.9]);
        assert_eq!(ScoringEngine::select_score(&top), Some(0.9));

        // A mode wins over a larger single score
        let top = panel(&[0.6, 0.6, 0.7, 0.95]);
        assert_eq!(ScoringEngine::select_score(&top), Some(0.6));
        assert_eq!(ScoringEngine::select_score(&[]), None);
    }

    #[test]
    fn test_decide_returns_all_ties() {
        let config = Configuration::default();
        let model = model();
        let engine = ScoringEngine::new(&config, &model);

        let ranking = panel(&[0.1, 0.7, 0.85, 0.9, 0.9]);
        assert_eq!(
            engine.decide(&ranking),
            Decision::Identified {
                score: 0.9,
                candidates: vec![
                    CandidateScore {
                        index: 3,
                        score: 0.9
                    },
                    CandidateScore {
                        index: 4,
                        score: 0.9
                    },
                ],
            }
        );
    }

    #[test]
    fn test_decide_below_threshold() {
        let config = Configuration::default();
        let model = model();
        let engine = ScoringEngine::new(&config, &model);

        let ranking = panel(&[0.5, 0.6, 0.7, 0.8]);
        assert_eq!(
            engine.decide(&ranking),
            Decision::BelowThreshold { score: 0.8 }
        );
        assert_eq!(engine.decide(&[]), Decision::BelowThreshold { score: 0.0 });
    }
}
