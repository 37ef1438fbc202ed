//! Error types for the recodon pipeline
//!
//! `RecodonError` covers everything that aborts a run or skips a protein.
//! `MappingError` is returned per matched peptide by the coordinate mapper;
//! the combine stage reports it and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// How the pipeline reacts to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or missing inputs, abort before writing anything
    Configuration,
    /// Input file integrity is broken, abort
    Format,
    /// A single protein cannot be used, skip it
    SkippableRecord,
    /// A single match cannot be placed on its protein, skip it
    Mapping,
    /// Underlying I/O failure, abort
    Io,
}

#[derive(Debug, Error)]
pub enum RecodonError {
    #[error("{0} is not a valid codon")]
    InvalidCodon(String),

    #[error("{0:?} invalid amino acids")]
    InvalidResidue(Vec<String>),

    #[error("file {} does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("duplicate FASTA header {header} in {}", path.display())]
    DuplicateHeader { header: String, path: PathBuf },

    #[error("column {column:?} not found in header of {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("malformed protein identifier {0:?}")]
    MalformedProteinId(String),

    #[error("malformed field {field:?} -> {value:?} for record {record}")]
    MalformedField {
        field: String,
        value: String,
        record: String,
    },

    #[error("cannot split cDNA of {id} into codons -> length {len} is not a multiple of 3")]
    IncompleteCodons { id: String, len: usize },

    #[error("could not place evidence {evidence_id} -> {source}")]
    Mapping {
        evidence_id: String,
        #[source]
        source: MappingError,
    },

    #[error("I/O failure on {} -> {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecodonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecodonError::InvalidCodon(_)
            | RecodonError::InvalidResidue(_)
            | RecodonError::MissingInput(_) => ErrorKind::Configuration,
            RecodonError::DuplicateHeader { .. }
            | RecodonError::MissingColumn { .. }
            | RecodonError::MalformedProteinId(_)
            | RecodonError::MalformedField { .. } => ErrorKind::Format,
            RecodonError::IncompleteCodons { .. } => ErrorKind::SkippableRecord,
            RecodonError::Mapping { .. } => ErrorKind::Mapping,
            RecodonError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Wraps an I/O error with the path it happened on
    pub fn io<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RecodonError::Io { path, source }
    }
}

/// Failure to place a matched peptide on its originating protein
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("protein identifier {0:?} does not name a database protein")]
    MalformedProteinId(String),

    #[error("protein {0} is not listed in the header map or cDNA file")]
    UnknownProtein(String),

    #[error("region [{start}, {stop}] is out of bounds for {protein} with {len} codons")]
    RegionOutOfBounds {
        protein: String,
        start: usize,
        stop: usize,
        len: usize,
    },

    #[error("peptide {peptide} not found in region [{start}, {stop}] of {protein}")]
    PeptideNotFound {
        protein: String,
        peptide: String,
        start: usize,
        stop: usize,
    },

    #[error("peptide {peptide} occurs {count} times in region [{start}, {stop}] of {protein}")]
    AmbiguousPeptide {
        protein: String,
        peptide: String,
        start: usize,
        stop: usize,
        count: usize,
    },
}

pub type Result<T> = std::result::Result<T, RecodonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RecodonError::InvalidCodon("XYZ".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            RecodonError::DuplicateHeader {
                header: "h1".into(),
                path: PathBuf::from("in.fa"),
            }
            .kind(),
            ErrorKind::Format
        );
        assert_eq!(
            RecodonError::IncompleteCodons {
                id: "h1".into(),
                len: 4
            }
            .kind(),
            ErrorKind::SkippableRecord
        );
    }

    #[test]
    fn test_messages_carry_identifiers() {
        let err = RecodonError::Mapping {
            evidence_id: "63".into(),
            source: MappingError::PeptideNotFound {
                protein: "g1".into(),
                peptide: "PEPTIDE".into(),
                start: 0,
                stop: 10,
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("63"));
        assert!(msg.contains("g1"));
        assert_eq!(err.kind(), ErrorKind::Mapping);

        let err = RecodonError::MissingInput(PathBuf::from("/no/such/file.fa"));
        assert!(err.to_string().contains("/no/such/file.fa"));
    }

    #[test]
    fn test_messages_leave_level_to_logger() {
        let errors = [
            RecodonError::InvalidCodon("XYZ".into()),
            RecodonError::IncompleteCodons {
                id: "h1".into(),
                len: 4,
            },
            RecodonError::Mapping {
                evidence_id: "7".into(),
                source: MappingError::MalformedProteinId(String::new()),
            },
        ];

        for err in errors {
            let msg = err.to_string();
            assert!(!msg.starts_with("ERROR"), "{msg}");
            assert!(!msg.starts_with("WARN"), "{msg}");
        }
    }
}
