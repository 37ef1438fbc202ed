//! Genetic code lookups and codon-level sequence handling
//!
//! Every translation in the pipeline goes through [`translate_codon`], either
//! directly or through [`CodonSequence::translate`], which optionally swaps
//! one codon for a substituted amino acid.

use std::fmt;
use std::str::{from_utf8, FromStr};

use crate::consts::*;
use crate::error::RecodonError;

/// Translates a codon into an amino acid.
///
/// # Arguments
///
/// * `codon` - The codon to translate.
///
/// # Returns
///
/// The one-letter amino acid, `*` for stop codons or `X` for anything not in
/// the standard genetic code.
///
/// # Example
///
/// ```rust, ignore
/// assert_eq!(translate_codon(b"ATG"), b'M');
/// assert_eq!(translate_codon(b"NNN"), b'X');
/// ```
pub fn translate_codon(codon: &[u8]) -> u8 {
    for (table_codon, amino_acid) in &CODON_TABLE {
        if codon == table_codon.as_slice() {
            return *amino_acid;
        }
    }

    UNKNOWN_RESIDUE
}

/// Checks whether a one-letter code is one of the 20 canonical amino acids
pub fn is_amino_acid(residue: u8) -> bool {
    AMINO_ACIDS.contains(&residue)
}

/// A validated nucleotide triplet from the standard genetic code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codon([u8; 3]);

impl Codon {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // INFO: only ever built from table codons -> always ASCII
        from_utf8(&self.0).unwrap_or_default()
    }

    pub fn amino_acid(&self) -> u8 {
        translate_codon(&self.0)
    }
}

impl FromStr for Codon {
    type Err = RecodonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();

        CODON_TABLE
            .iter()
            .find(|(codon, _)| codon.as_slice() == upper.as_bytes())
            .map(|(codon, _)| Codon(**codon))
            .ok_or_else(|| RecodonError::InvalidCodon(s.to_string()))
    }
}

impl fmt::Display for Codon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Residues after which the protease cleaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleavageSpec {
    residues: Vec<u8>,
}

impl CleavageSpec {
    pub fn new(residues: &[u8]) -> Result<Self, RecodonError> {
        let invalid = residues
            .iter()
            .filter(|r| !is_amino_acid(**r))
            .map(|r| (*r as char).to_string())
            .collect::<Vec<_>>();

        if !invalid.is_empty() {
            return Err(RecodonError::InvalidResidue(invalid));
        }

        let mut residues = residues.to_vec();
        residues.sort_unstable();
        residues.dedup();

        Ok(Self { residues })
    }

    pub fn cleaves_after(&self, residue: u8) -> bool {
        self.residues.contains(&residue)
    }

    pub fn residues(&self) -> &[u8] {
        &self.residues
    }
}

impl Default for CleavageSpec {
    fn default() -> Self {
        Self {
            residues: vec![b'K', b'R'],
        }
    }
}

impl FromStr for CleavageSpec {
    type Err = RecodonError;

    // INFO: K,R -> [K, R]; every entry must be a single canonical code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entries = s
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect::<Vec<_>>();

        let invalid = entries
            .iter()
            .filter(|e| e.len() != 1 || !is_amino_acid(e.as_bytes()[0]))
            .map(|e| e.to_string())
            .collect::<Vec<_>>();

        if !invalid.is_empty() || entries.is_empty() {
            return Err(RecodonError::InvalidResidue(if invalid.is_empty() {
                vec![s.to_string()]
            } else {
                invalid
            }));
        }

        let residues = entries.iter().map(|e| e.as_bytes()[0]).collect::<Vec<_>>();
        Self::new(&residues)
    }
}

impl fmt::Display for CleavageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let residues = self
            .residues
            .iter()
            .map(|r| (*r as char).to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", residues.join(","))
    }
}

/// Amino acids a target codon gets translated into.
///
/// Isoleucine and leucine share a mass, so a search engine cannot tell the
/// two apart; Ile is left out unless asked for.
///
/// # Example
///
/// ```rust, ignore
/// assert_eq!(substitution_amino_acids(true).len(), 19);
/// assert_eq!(substitution_amino_acids(false).len(), 20);
/// ```
pub fn substitution_amino_acids(omit_ile: bool) -> Vec<u8> {
    AMINO_ACIDS
        .iter()
        .copied()
        .filter(|aa| !(omit_ile && *aa == ISOLEUCINE))
        .collect()
}

/// A cDNA split into codons; length is always a multiple of three
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodonSequence {
    bases: Vec<u8>,
}

impl CodonSequence {
    /// Builds a codon sequence from a cDNA.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier of the cDNA, used in the error message.
    /// * `cdna` - The nucleotide sequence, any case.
    ///
    /// # Returns
    ///
    /// The upper-cased codon sequence, or `IncompleteCodons` if the cDNA
    /// length is not a multiple of three.
    pub fn new(id: &str, cdna: &[u8]) -> Result<Self, RecodonError> {
        if cdna.len() % 3 != 0 {
            return Err(RecodonError::IncompleteCodons {
                id: id.to_string(),
                len: cdna.len(),
            });
        }

        Ok(Self {
            bases: cdna.to_ascii_uppercase(),
        })
    }

    /// Number of codons
    pub fn len(&self) -> usize {
        self.bases.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn codon(&self, idx: usize) -> &[u8] {
        &self.bases[idx * 3..idx * 3 + 3]
    }

    pub fn codons(&self) -> std::slice::ChunksExact<'_, u8> {
        self.bases.chunks_exact(3)
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Nucleotides of codons `start..=stop`, `None` if out of bounds
    pub fn slice(&self, start: usize, stop: usize) -> Option<&[u8]> {
        if start > stop || stop >= self.len() {
            return None;
        }
        Some(&self.bases[start * 3..(stop + 1) * 3])
    }

    /// Drops a single trailing stop codon, if present
    pub fn without_trailing_stop(mut self) -> Self {
        if !self.is_empty() && translate_codon(self.codon(self.len() - 1)) == STOP {
            self.bases.truncate(self.bases.len() - 3);
        }
        self
    }

    /// Indices of every codon equal to `codon`
    pub fn positions_of(&self, codon: &Codon) -> Vec<usize> {
        self.codons()
            .enumerate()
            .filter(|(_, c)| *c == codon.as_bytes())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Translates codons `start..=stop`.
    ///
    /// # Arguments
    ///
    /// * `start` - First codon index.
    /// * `stop` - Last codon index, inclusive.
    /// * `substitution` - When set, every occurrence of the codon is
    ///   translated into the given amino acid instead of the standard one.
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let seq = CodonSequence::new("h1", b"ATGCTGAAA").unwrap();
    /// let codon = "CTG".parse::<Codon>().unwrap();
    /// assert_eq!(seq.translate(0, 2, Some((&codon, b'S'))), "MSK");
    /// ```
    pub fn translate(&self, start: usize, stop: usize, substitution: Option<(&Codon, u8)>) -> String {
        let mut aa = String::with_capacity(stop + 1 - start);

        for idx in start..=stop {
            let codon = self.codon(idx);
            let residue = match substitution {
                Some((target, sub)) if codon == target.as_bytes() => sub,
                _ => translate_codon(codon),
            };
            aa.push(residue as char);
        }

        aa
    }

    /// Translates the whole sequence with the standard genetic code
    pub fn translate_all(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        self.translate(0, self.len() - 1, None)
    }
}
