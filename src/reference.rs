use std::{collections::HashMap, fmt};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Expected molecular weight of one gene product of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub genus: String,
    pub species: String,
    pub gene_name: String,
    pub expected_weight: f64,
}

impl ReferenceRow {
    pub fn new(genus: &str, species: &str, gene_name: &str, expected_weight: f64) -> Self {
        Self {
            genus: genus.to_string(),
            species: species.to_string(),
            gene_name: gene_name.to_string(),
            expected_weight,
        }
    }
}

/// Reference rows of a single genus.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    genus: String,
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn new(genus: &str, rows: Vec<ReferenceRow>) -> Self {
        Self {
            genus: genus.to_string(),
            rows,
        }
    }

    pub fn genus(&self) -> &str {
        &self.genus
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn rows_for_species<'a>(
        &'a self,
        species: &'a str,
    ) -> impl Iterator<Item = &'a ReferenceRow> + 'a {
        self.rows.iter().filter(move |row| row.species == species)
    }
}

/// Join key between the gene weight matrix and the genus/species a row stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(genus: &str, species: &str) -> Self {
        Self(format!("{genus}_{species}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub genus: String,
    pub species: String,
}

impl Candidate {
    pub fn new(genus: &str, species: &str) -> Self {
        Self {
            id: CandidateId::new(genus, species),
            genus: genus.to_string(),
            species: species.to_string(),
        }
    }
}

/// Pre-built identification model: expected weights of the discriminative genes for every candidate and the
/// per-gene values used to combine closeness scores.
///
/// Row `i` of `gene_weights` always belongs to `candidates[i]`, column `j` to `genes[j]` and `gene_values[j]`.
/// Missing weights are stored as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceModel {
    candidates: Vec<Candidate>,
    genes: Vec<String>,
    gene_weights: Array2<f64>,
    gene_values: Array1<f64>,
}

impl ReferenceModel {
    /// Creates a new model and checks that all dimensions agree.
    ///
    /// # Arguments
    /// * `candidates` - One candidate per matrix row
    /// * `genes` - Discriminative gene names, one per matrix column
    /// * `gene_weights` - Expected weight per (candidate, gene)
    /// * `gene_values` - Discriminative value per gene
    ///
    pub fn new(
        candidates: Vec<Candidate>,
        genes: Vec<String>,
        gene_weights: Array2<f64>,
        gene_values: Array1<f64>,
    ) -> Result<Self, Error> {
        if candidates.is_empty() {
            return Err(Error::EmptyReferenceModel);
        }

        let (rows, columns) = gene_weights.dim();
        if rows != candidates.len() {
            return Err(Error::CandidateCount {
                rows,
                candidates: candidates.len(),
            });
        }
        if columns != genes.len() || columns != gene_values.len() {
            return Err(Error::GeneCount {
                columns,
                genes: genes.len(),
                values: gene_values.len(),
            });
        }

        Ok(Self {
            candidates,
            genes,
            gene_weights,
            gene_values,
        })
    }

    /// Pivots reference rows into a model. Candidates are ordered by first appearance. If a candidate lists a
    /// gene more than once the first weight is used; genes a candidate does not list are NaN.
    ///
    /// # Arguments
    /// * `rows` - Reference rows, may span several genera
    /// * `genes` - Discriminative gene names
    /// * `gene_values` - Discriminative value per gene
    ///
    pub fn from_rows(
        rows: &[ReferenceRow],
        genes: Vec<String>,
        gene_values: Array1<f64>,
    ) -> Result<Self, Error> {
        let gene_columns: HashMap<&str, usize> = genes
            .iter()
            .enumerate()
            .map(|(column, gene)| (gene.as_str(), column))
            .collect();

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut candidate_rows: HashMap<CandidateId, usize> = HashMap::new();
        let mut cells: Vec<(usize, usize, f64)> = Vec::new();

        for row in rows {
            let Some(&column) = gene_columns.get(row.gene_name.as_str()) else {
                continue;
            };
            let id = CandidateId::new(&row.genus, &row.species);
            let candidate_row = *candidate_rows.entry(id).or_insert_with(|| {
                candidates.push(Candidate::new(&row.genus, &row.species));
                candidates.len() - 1
            });
            cells.push((candidate_row, column, row.expected_weight));
        }
        drop(gene_columns);

        let mut gene_weights = Array2::from_elem((candidates.len(), genes.len()), f64::NAN);
        for (candidate_row, column, weight) in cells {
            if gene_weights[[candidate_row, column]].is_nan() {
                gene_weights[[candidate_row, column]] = weight;
            }
        }

        Self::new(candidates, genes, gene_weights, gene_values)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn gene_weights(&self) -> &Array2<f64> {
        &self.gene_weights
    }

    pub fn gene_values(&self) -> &Array1<f64> {
        &self.gene_values
    }
}
