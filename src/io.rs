use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use ndarray::Array1;
use serde::Deserialize;

use crate::{
    error::Error,
    reference::{ReferenceRow, ReferenceTable},
};

/// Raw peak list of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub source: PathBuf,
    pub masses: Array1<f64>,
    pub intensities: Array1<f64>,
}

impl Sample {
    pub fn new(source: impl Into<PathBuf>, masses: Array1<f64>, intensities: Array1<f64>) -> Self {
        Self {
            source: source.into(),
            masses,
            intensities,
        }
    }

    /// Reads a whitespace separated `<mass> <intensity>` peak list.
    ///
    /// # Arguments
    /// * `path` - Peak list file, also kept as the sample's source
    ///
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let (masses, intensities) = parse_peak_list(reader)?;
        Ok(Self::new(path, masses, intensities))
    }
}

/// Parses a peak list with one `<mass> <intensity>` pair per line. Blank lines are skipped, additional
/// columns are ignored.
///
/// # Arguments
/// * `reader` - Peak list text
///
pub fn parse_peak_list<R: BufRead>(reader: R) -> Result<(Array1<f64>, Array1<f64>), Error> {
    let mut masses: Vec<f64> = Vec::new();
    let mut intensities: Vec<f64> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (mass, intensity) = match (fields.next(), fields.next()) {
            (None, _) => continue,
            (Some(mass), Some(intensity)) => (mass.parse::<f64>(), intensity.parse::<f64>()),
            (Some(_), None) => return Err(invalid_line(index, &line)),
        };
        match (mass, intensity) {
            (Ok(mass), Ok(intensity)) => {
                masses.push(mass);
                intensities.push(intensity);
            }
            _ => return Err(invalid_line(index, &line)),
        }
    }

    Ok((Array1::from(masses), Array1::from(intensities)))
}

fn invalid_line(index: usize, line: &str) -> Error {
    Error::InvalidPeakLine {
        line: index + 1,
        content: line.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ReferenceRecord {
    species: String,
    #[serde(alias = "gene_name")]
    gn: String,
    #[serde(alias = "expected_weight")]
    mw: String,
}

/// Reads the reference table of one genus from CSV. The header must contain `species`, `gn` and `mw`
/// (`gene_name` and `expected_weight` are accepted as well), other columns are ignored.
/// Rows with a weight that is not a finite number are dropped.
///
/// # Arguments
/// * `reader` - CSV data
/// * `genus` - Genus the table belongs to
///
pub fn read_reference_table<R: Read>(reader: R, genus: &str) -> Result<ReferenceTable, Error> {
    let genus = genus.to_lowercase();
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows: Vec<ReferenceRow> = Vec::new();
    for (index, record) in csv_reader.deserialize::<ReferenceRecord>().enumerate() {
        let record = record?;
        match record.mw.parse::<f64>() {
            Ok(weight) if weight.is_finite() => rows.push(ReferenceRow::new(
                &genus,
                &record.species.to_lowercase(),
                &record.gn,
                weight,
            )),
            _ => log::warn!(
                "dropping reference row {} ({} {} {}): invalid weight {:?}",
                index + 1,
                genus,
                record.species,
                record.gn,
                record.mw
            ),
        }
    }

    Ok(ReferenceTable::new(&genus, rows))
}

/// Reads `<directory>/<genus>.csv`.
pub fn read_reference_table_from_dir(
    directory: impl AsRef<Path>,
    genus: &str,
) -> Result<ReferenceTable, Error> {
    let path = directory
        .as_ref()
        .join(format!("{}.csv", genus.to_lowercase()));
    read_reference_table(File::open(path)?, genus)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_parse_peak_list() {
        let text = "4365.2 15.5\n\n  5000.0\t500  extra\n7000 9.1e2\n";
        let (masses, intensities) = parse_peak_list(text.as_bytes()).unwrap();
        assert_eq!(masses, Array1::from(vec![4365.2, 5000.0, 7000.0]));
        assert_eq!(intensities, Array1::from(vec![15.5, 500.0, 910.0]));
    }

    #[test]
    fn test_parse_peak_list_invalid() {
        let result = parse_peak_list("4365.2 15.5\n5000.0 abc\n".as_bytes());
        assert!(matches!(
            result,
            Err(Error::InvalidPeakLine { line: 2, .. })
        ));

        let result = parse_peak_list("4365.2\n".as_bytes());
        assert!(matches!(
            result,
            Err(Error::InvalidPeakLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_sample_from_path() {
        let sample = Sample::from_path("test_files/bacillus_subtilis_sample.txt").unwrap();
        assert_eq!(
            sample.source,
            PathBuf::from("test_files/bacillus_subtilis_sample.txt")
        );
        assert_eq!(sample.masses.len(), 8);
        assert_eq!(sample.masses.len(), sample.intensities.len());

        assert!(matches!(
            Sample::from_path("test_files/does_not_exist.txt"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_read_reference_table() {
        let csv = ",species,gn,mw,length\n\
                   0,Subtilis,rplL,12600.5,123\n\
                   1,subtilis,rpmD,,61\n\
                   2,subtilis,rpsT,abc,88\n\
                   3,cereus,rplL,12610.0,123\n";
        let table = read_reference_table(csv.as_bytes(), "Bacillus").unwrap();

        assert_eq!(table.genus(), "bacillus");
        assert_eq!(
            table.rows(),
            &[
                ReferenceRow::new("bacillus", "subtilis", "rplL", 12600.5),
                ReferenceRow::new("bacillus", "cereus", "rplL", 12610.0),
            ]
        );
    }

    #[test]
    fn test_read_reference_table_aliases() {
        let csv = "species,gene_name,expected_weight\nsubtilis,rplL,12600.5\n";
        let table = read_reference_table(csv.as_bytes(), "bacillus").unwrap();
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_read_reference_table_missing_column() {
        let csv = "species,gn\nsubtilis,rplL\n";
        assert!(matches!(
            read_reference_table(csv.as_bytes(), "bacillus"),
            Err(Error::ReferenceTable(_))
        ));
    }

    #[test]
    fn test_read_reference_table_from_dir() {
        let table = read_reference_table_from_dir("test_files", "Bacillus").unwrap();
        assert_eq!(table.rows_for_species("subtilis").count(), 4);
        assert_eq!(table.rows_for_species("cereus").count(), 3);
    }
}
