pub mod configuration;
pub mod error;
/// Whole sample identification
pub mod identification;
pub mod identification_result;
// Peak list and reference table input
pub mod io;
pub mod peak_matcher;
pub mod peak_set;
pub mod reference;
pub mod scoring;
// Various utilities
pub mod utils;
