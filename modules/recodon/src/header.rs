//! Synthetic protein identifiers
//!
//! Every record written to the search database carries its origin in the
//! header: `<gene>_<start>_<stop>` for plain translations and
//! `<gene>_<start>_<stop>-<codon>-<aa>` for substituted ones. The search
//! engine copies the header into the `Proteins` column, which is how matches
//! find their way back to the cDNA.

use smol_str::SmolStr;

use std::fmt;
use std::str::FromStr;

use crate::codon::{is_amino_acid, Codon};
use crate::consts::UNKNOWN_RESIDUE;
use crate::error::RecodonError;

/// A codon translated into a non-standard amino acid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Substitution {
    pub codon: Codon,
    pub amino_acid: u8,
}

impl Substitution {
    pub fn new(codon: Codon, amino_acid: u8) -> Self {
        Self { codon, amino_acid }
    }

    pub fn as_pair(&self) -> (&Codon, u8) {
        (&self.codon, self.amino_acid)
    }
}

/// Header of a synthetic protein record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProteinId {
    pub gene: SmolStr,
    pub start: usize,
    pub stop: usize,
    pub substitution: Option<Substitution>,
}

impl ProteinId {
    pub fn new(gene: &str, start: usize, stop: usize, substitution: Option<Substitution>) -> Self {
        Self {
            gene: SmolStr::new(gene),
            start,
            stop,
            substitution,
        }
    }

    pub fn substitution_pair(&self) -> Option<(&Codon, u8)> {
        self.substitution.as_ref().map(Substitution::as_pair)
    }
}

impl fmt::Display for ProteinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.gene, self.start, self.stop)?;
        if let Some(sub) = &self.substitution {
            write!(f, "-{}-{}", sub.codon, sub.amino_acid as char)?;
        }
        Ok(())
    }
}

impl FromStr for ProteinId {
    type Err = RecodonError;

    /// Parses `g1_102_127` or `g1_102_127-CTG-S`.
    ///
    /// The gene id may itself contain underscores; start and stop are always
    /// the last two `_`-separated fields before the substitution suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RecodonError::MalformedProteinId(s.to_string());

        let mut parts = s.trim().split('-');
        let region = parts.next().ok_or_else(malformed)?;

        let substitution = match (parts.next(), parts.next(), parts.next()) {
            (None, None, None) => None,
            (Some(codon), Some(aa), None) => {
                let codon = codon.parse::<Codon>().map_err(|_| malformed())?;
                let amino_acid = match aa.as_bytes() {
                    [residue] if is_amino_acid(*residue) || *residue == UNKNOWN_RESIDUE => *residue,
                    _ => return Err(malformed()),
                };
                Some(Substitution::new(codon, amino_acid))
            }
            _ => return Err(malformed()),
        };

        let mut fields = region.rsplitn(3, '_');
        let stop = fields.next().and_then(|f| f.parse::<usize>().ok());
        let start = fields.next().and_then(|f| f.parse::<usize>().ok());
        let gene = fields.next().filter(|g| !g.is_empty());

        match (gene, start, stop) {
            (Some(gene), Some(start), Some(stop)) if start <= stop => {
                Ok(ProteinId::new(gene, start, stop, substitution))
            }
            _ => Err(malformed()),
        }
    }
}
