use std::{path::PathBuf, time::Duration};

use crate::reference::CandidateId;

#[derive(Debug, Clone)]
pub struct IdentificationResult {
    pub score: f64,
    pub genus: String,
    /// Species of all candidates tied at `score`, deduplicated, in ranking order
    pub species: Vec<String>,
    pub candidates: Vec<CandidateId>,
    pub elapsed: Duration,
    /// Where the peak list came from
    pub source: PathBuf,
}

/// Outcome of one identification. A score below the threshold is a regular outcome, not an error.
#[derive(Debug, Clone)]
pub enum Identification {
    Identified(IdentificationResult),
    Unidentified { score: f64 },
}

impl Identification {
    pub fn is_identified(&self) -> bool {
        matches!(self, Identification::Identified(_))
    }

    pub fn score(&self) -> f64 {
        match self {
            Identification::Identified(result) => result.score,
            Identification::Unidentified { score } => *score,
        }
    }

    pub fn genus(&self) -> Option<&str> {
        match self {
            Identification::Identified(result) => Some(result.genus.as_str()),
            Identification::Unidentified { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&IdentificationResult> {
        match self {
            Identification::Identified(result) => Some(result),
            Identification::Unidentified { .. } => None,
        }
    }
}
