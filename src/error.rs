use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("masses ({0}) and intensities ({1}) arrays must have the same length")]
    PeakListShape(usize, usize),
    #[error("Invalid peak list line {line}: {content:?}")]
    InvalidPeakLine { line: usize, content: String },
    #[error("Cannot read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid reference table: {0}")]
    ReferenceTable(#[from] csv::Error),
    #[error("Gene weight matrix has {rows} rows but {candidates} candidates were given")]
    CandidateCount { rows: usize, candidates: usize },
    #[error("Gene weight matrix has {columns} columns but {genes} genes and {values} gene values were given")]
    GeneCount {
        columns: usize,
        genes: usize,
        values: usize,
    },
    #[error("Empty reference model")]
    EmptyReferenceModel,
}
