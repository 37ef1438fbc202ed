//! Combinatorial search database
//!
//! Every cDNA is partitioned into cleavage-bounded segments. Static segments
//! are written once with the standard translation; dynamic segments are
//! written once per substituted amino acid. Proteins get short ids
//! (`g1`, `g2`, ...) in input order and the header map records where each
//! one came from.

use hashbrown::HashSet;
use log::{debug, info, warn};

use std::io::Write;

use crate::cli::DatabaseArgs;
use crate::codon::{substitution_amino_acids, CleavageSpec, Codon, CodonSequence};
use crate::consts::SHORT_ID_PREFIX;
use crate::error::{ErrorKind, RecodonError, Result};
use crate::header::{ProteinId, Substitution};
use crate::partition::{partition, SegmentKind};
use crate::utils::{create_file, ensure_exists, parse_fa, write_fasta, write_header_map};

/// One record of the search database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticProtein {
    pub id: ProteinId,
    pub sequence: String,
}

/// Builds the database records of one protein.
///
/// # Arguments
///
/// * `gene` - The short id of the protein.
/// * `cdna` - The protein-coding sequence; a trailing stop codon is dropped.
/// * `cleavage` - Residues after which the protease cuts.
/// * `target` - The codon to translate combinatorially.
/// * `amino_acids` - The amino acids the target codon is translated into.
///
/// # Returns
///
/// The records in segment order, substituted variants alphabetical.
/// Records repeating an earlier sequence of the same protein are dropped.
/// Fails with `IncompleteCodons` if the cDNA cannot be split into codons.
///
/// # Example
///
/// ```rust, ignore
/// let aas = substitution_amino_acids(true);
/// let records = synthetic_proteins("g1", cdna, &CleavageSpec::default(), &ctg, &aas)?;
/// ```
pub fn synthetic_proteins(
    gene: &str,
    cdna: &[u8],
    cleavage: &CleavageSpec,
    target: &Codon,
    amino_acids: &[u8],
) -> Result<Vec<SyntheticProtein>> {
    let codons = CodonSequence::new(gene, cdna)?.without_trailing_stop();
    let segments = partition(&codons, cleavage, target).segments();

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    let mut keep = |id: ProteinId, sequence: String| {
        if seen.insert(sequence.clone()) {
            records.push(SyntheticProtein { id, sequence });
        } else {
            debug!("Dropping {id} -> sequence already in database");
        }
    };

    for segment in segments {
        match segment.kind {
            SegmentKind::Static => {
                let sequence = codons.translate(segment.start, segment.stop, None);
                keep(
                    ProteinId::new(gene, segment.start, segment.stop, None),
                    sequence,
                );
            }
            SegmentKind::Dynamic => {
                for &aa in amino_acids {
                    let substitution = Substitution::new(*target, aa);
                    let sequence =
                        codons.translate(segment.start, segment.stop, Some(substitution.as_pair()));
                    keep(
                        ProteinId::new(gene, segment.start, segment.stop, Some(substitution)),
                        sequence,
                    );
                }
            }
        }
    }

    Ok(records)
}

/// Writes the combinatorial database and the header map.
///
/// Proteins whose cDNA cannot be split into codons are skipped with a
/// warning but still listed in the header map, so short ids stay stable.
pub fn run_database(args: DatabaseArgs) -> Result<()> {
    ensure_exists(&args.cdna)?;

    let proteins = parse_fa(&args.cdna)?;
    info!(
        "Read {} cDNA sequences from {}",
        proteins.len(),
        args.cdna.display()
    );

    let amino_acids = substitution_amino_acids(!args.ile);
    info!(
        "Translating {} into {} amino acids, cleaving after {}",
        args.codon,
        amino_acids.len(),
        args.cleavage
    );

    let mut database = create_file(&args.output)?;
    let mut map = create_file(&args.map)?;

    let mut written = 0;
    let mut skipped = 0;

    for (idx, protein) in proteins.iter().enumerate() {
        let gene = format!("{SHORT_ID_PREFIX}{}", idx + 1);
        write_header_map(&mut map, &protein.header, &gene).map_err(RecodonError::io(&args.map))?;

        let records = match synthetic_proteins(
            &gene,
            &protein.seq,
            &args.cleavage,
            &args.codon,
            &amino_acids,
        ) {
            Ok(records) => records,
            Err(e) if e.kind() == ErrorKind::SkippableRecord => {
                warn!("{e} -> skipping {}", protein.header);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        for record in &records {
            write_fasta(&mut database, &record.id.to_string(), record.sequence.as_bytes())
                .map_err(RecodonError::io(&args.output))?;
        }
        written += records.len();
    }

    database.flush().map_err(RecodonError::io(&args.output))?;
    map.flush().map_err(RecodonError::io(&args.map))?;

    info!(
        "Wrote {written} records for {} proteins to {} ({skipped} skipped)",
        proteins.len() - skipped,
        args.output.display()
    );

    Ok(())
}
