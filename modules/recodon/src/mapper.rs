//! Back-mapping of matched peptides onto cDNA coordinates
//!
//! A synthetic protein header only names the coarse segment a peptide was
//! found in. Re-translating that segment under the same substitution and
//! locating the peptide inside it yields the exact codon range and the
//! positions of the target codon within the peptide.

use crate::codon::{Codon, CodonSequence};
use crate::error::MappingError;
use crate::header::ProteinId;

/// Exact location of a peptide on its originating protein
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinMatch {
    /// First codon of the peptide, 0-indexed on the protein
    pub peptide_start: usize,
    /// Last codon of the peptide, inclusive
    pub peptide_stop: usize,
    /// Peptide-local positions translated from the target codon
    pub codon_positions: Vec<usize>,
}

#[allow(clippy::len_without_is_empty)]
impl ProteinMatch {
    pub fn len(&self) -> usize {
        self.peptide_stop + 1 - self.peptide_start
    }

    /// Protein-level index of a peptide-local position
    pub fn protein_position(&self, peptide_pos: usize) -> usize {
        self.peptide_start + peptide_pos
    }
}

/// Places a peptide on the protein it was matched to.
///
/// # Arguments
///
/// * `protein` - Name of the protein, used in error messages.
/// * `codons` - The protein's codon sequence.
/// * `region` - The synthetic header the peptide was matched to.
/// * `peptide` - The matched peptide, unknown residues written as `X`.
/// * `target` - The codon whose positions are reported.
///
/// # Returns
///
/// A `ProteinMatch`, or a `MappingError` if the region does not fit the
/// protein or the peptide does not occur in it exactly once.
///
/// # Example
///
/// ```rust, ignore
/// let region = "g1_102_127-CTG-S".parse::<ProteinId>()?;
/// let hit = map_peptide("g1", &codons, &region, "AAAASGAALAPQR", &ctg)?;
/// assert_eq!((hit.peptide_start, hit.peptide_stop), (110, 122));
/// ```
pub fn map_peptide(
    protein: &str,
    codons: &CodonSequence,
    region: &ProteinId,
    peptide: &str,
    target: &Codon,
) -> Result<ProteinMatch, MappingError> {
    if region.stop >= codons.len() {
        return Err(MappingError::RegionOutOfBounds {
            protein: protein.to_string(),
            start: region.start,
            stop: region.stop,
            len: codons.len(),
        });
    }

    let translated = codons.translate(region.start, region.stop, region.substitution_pair());
    let offsets = find_all(translated.as_bytes(), peptide.as_bytes());

    let offset = match offsets.as_slice() {
        [offset] => *offset,
        [] => {
            return Err(MappingError::PeptideNotFound {
                protein: protein.to_string(),
                peptide: peptide.to_string(),
                start: region.start,
                stop: region.stop,
            })
        }
        _ => {
            return Err(MappingError::AmbiguousPeptide {
                protein: protein.to_string(),
                peptide: peptide.to_string(),
                start: region.start,
                stop: region.stop,
                count: offsets.len(),
            })
        }
    };

    let peptide_start = region.start + offset;
    let peptide_stop = peptide_start + peptide.len() - 1;

    let codon_positions = (peptide_start..=peptide_stop)
        .filter(|&idx| codons.codon(idx) == target.as_bytes())
        .map(|idx| idx - peptide_start)
        .collect();

    Ok(ProteinMatch {
        peptide_start,
        peptide_stop,
        codon_positions,
    })
}

/// Start offsets of every occurrence of `needle`, overlapping ones included
fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }

    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(offset, _)| offset)
        .collect()
}
