//! Statistics over mapped matches
//!
//! General counts (PSMs, peptides, proteins, mass error) use every match of
//! the enriched table. Codon counts only use matches where at least one
//! target-codon position is supported by b/y-type fragment ions, and are
//! broken down per translated amino acid.

use hashbrown::HashSet;
use log::{info, warn};
use smol_str::SmolStr;

use std::collections::BTreeMap;
use std::io::Write;

use crate::cli::StatsArgs;
use crate::codon::{Codon, CodonSequence};
use crate::consts::{ISOLEUCINE, LEUCINE, REPORT_AMINO_ACIDS};
use crate::error::{RecodonError, Result};
use crate::tables::{EnrichedColumns, EnrichedEvidenceRow, TableReader};
use crate::utils::{create_file, ensure_exists, parse_fa, FastaRecord};

const NOT_AVAILABLE: &str = "NA";

/// Arithmetic mean, `None` for an empty set
pub fn mean(values: &[f64]) -> Option<f64> {
    fraction(values.iter().sum(), values.len() as f64)
}

/// Median, `None` for an empty set
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let middle = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        n if n % 2 == 0 => mean(&sorted[middle - 1..=middle]),
        _ => Some(sorted[middle]),
    }
}

/// `num / denom`, `None` when `denom` is zero
pub fn fraction(num: f64, denom: f64) -> Option<f64> {
    if denom == 0.0 {
        None
    } else {
        Some(num / denom)
    }
}

pub fn percentage(num: usize, total: usize) -> Option<f64> {
    fraction(num as f64, total as f64).map(|f| f * 100.0)
}

/// Rounds to `digits` decimals, `NA` when undefined
fn format_stat(value: Option<f64>, digits: i32) -> String {
    match value {
        Some(v) => {
            let scale = 10f64.powi(digits);
            format!("{}", (v * scale).round() / scale)
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// A residue position on a database protein
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProteinPosition {
    pub protein: SmolStr,
    pub position: usize,
}

impl ProteinPosition {
    pub fn new(protein: &str, position: usize) -> Self {
        Self {
            protein: SmolStr::new(protein),
            position,
        }
    }
}

/// Peptides observed at one codon position, per translated amino acid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionObservations {
    by_amino_acid: BTreeMap<u8, Vec<String>>,
}

impl PositionObservations {
    pub fn add(&mut self, amino_acid: u8, peptide: &str) {
        self.by_amino_acid
            .entry(amino_acid)
            .or_default()
            .push(peptide.to_string());
    }

    /// Peptides of every PSM where the position was read as `amino_acid`
    pub fn psms(&self, amino_acid: u8) -> &[String] {
        self.by_amino_acid
            .get(&amino_acid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn psm_count(&self) -> usize {
        self.by_amino_acid.values().map(Vec::len).sum()
    }

    pub fn translations(&self) -> usize {
        self.by_amino_acid.len()
    }

    /// Read as more than one amino acid
    pub fn is_ambiguous(&self) -> bool {
        self.translations() > 1
    }
}

/// Per-PSM outcome written to the PSM table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsmSummary {
    pub peptide: String,
    pub mass_error: String,
    pub translations: Vec<u8>,
    pub has_supported_codon: bool,
}

impl PsmSummary {
    pub fn csv_line(&self) -> String {
        let translations = self
            .translations
            .iter()
            .map(|aa| (*aa as char).to_string())
            .collect::<Vec<_>>()
            .join("/");

        format!(
            "{},{},{},{}",
            self.peptide, self.mass_error, translations, self.has_supported_codon
        )
    }
}

/// Header of the PSM table
pub fn psm_csv_header(codon: &Codon) -> String {
    format!("PSM,Mass error [ppm],{codon} translation(s),Has b/y supported {codon} position?")
}

/// Running counts over an enriched evidence table
#[derive(Debug, Clone)]
pub struct CodonStatistics {
    codon: Codon,
    total_proteins: usize,
    proteins_with_codon: usize,
    total_codon_positions: usize,
    psms: Vec<String>,
    mass_errors: Vec<f64>,
    proteins: HashSet<SmolStr>,
    psms_with_codon: Vec<String>,
    mass_errors_with_codon: Vec<f64>,
    proteins_hit_at_codon: HashSet<SmolStr>,
    positions: BTreeMap<ProteinPosition, PositionObservations>,
}

impl CodonStatistics {
    /// Starts the counts from the cDNA the database was built from.
    ///
    /// # Arguments
    ///
    /// * `codon` - The combinatorially translated codon.
    /// * `cdna` - Every protein of the cDNA input.
    ///
    /// Proteins that cannot be split into codons count as proteins but
    /// contribute no codon positions.
    pub fn new(codon: Codon, cdna: &[FastaRecord]) -> Self {
        let mut proteins_with_codon = 0;
        let mut total_codon_positions = 0;

        for record in cdna {
            match CodonSequence::new(&record.header, &record.seq) {
                Ok(codons) => {
                    let positions = codons.positions_of(&codon).len();
                    total_codon_positions += positions;
                    if positions > 0 {
                        proteins_with_codon += 1;
                    }
                }
                Err(e) => warn!("{e} -> no {codon} positions counted"),
            }
        }

        Self {
            codon,
            total_proteins: cdna.len(),
            proteins_with_codon,
            total_codon_positions,
            psms: Vec::new(),
            mass_errors: Vec::new(),
            proteins: HashSet::new(),
            psms_with_codon: Vec::new(),
            mass_errors_with_codon: Vec::new(),
            proteins_hit_at_codon: HashSet::new(),
            positions: BTreeMap::new(),
        }
    }

    /// Counts one mapped match.
    ///
    /// A target-codon position counts when it is also supported by
    /// fragment ions; its translation is the peptide residue at that
    /// position.
    pub fn add(&mut self, row: &EnrichedEvidenceRow<'_>) -> Result<PsmSummary> {
        let evidence = row.evidence();
        let peptide = evidence.peptide();
        let protein = row.database_protein_id()?.gene;
        let mass_error = evidence.mass_error()?;

        self.psms.push(peptide.to_string());
        self.proteins.insert(protein.clone());
        if let Some(error) = mass_error {
            self.mass_errors.push(error);
        }

        let supported = row.supported_positions()?;
        let supported_codons = row
            .codon_positions()?
            .into_iter()
            .filter(|pos| supported.contains(pos))
            .collect::<Vec<_>>();

        let mut translations = Vec::with_capacity(supported_codons.len());

        if !supported_codons.is_empty() {
            self.psms_with_codon.push(peptide.to_string());
            self.proteins_hit_at_codon.insert(protein);
            if let Some(error) = mass_error {
                self.mass_errors_with_codon.push(error);
            }

            for pos in supported_codons {
                let amino_acid = *peptide.as_bytes().get(pos).ok_or_else(|| {
                    RecodonError::MalformedField {
                        field: "codon position".to_string(),
                        value: pos.to_string(),
                        record: evidence.evidence_id().to_string(),
                    }
                })?;

                self.positions
                    .entry(row.protein_position(pos)?)
                    .or_default()
                    .add(amino_acid, peptide);
                translations.push(amino_acid);
            }
        }

        Ok(PsmSummary {
            peptide: peptide.to_string(),
            mass_error: evidence.mass_error_text().to_string(),
            has_supported_codon: !translations.is_empty(),
            translations,
        })
    }

    pub fn psm_count(&self) -> usize {
        self.psms.len()
    }

    pub fn covered_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn observations(&self, position: &ProteinPosition) -> Option<&PositionObservations> {
        self.positions.get(position)
    }

    /// Writes the plain-text report.
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let mut out = Vec::new();
    /// stats.write_report(&mut out)?;
    /// println!("{}", String::from_utf8(out)?);
    /// ```
    pub fn write_report<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let codon = &self.codon;

        writeln!(w, "Total number of PSMs: {}", self.psms.len())?;
        writeln!(
            w,
            "Total number of non-redundant peptides: {}",
            distinct(&self.psms)
        )?;
        writeln!(
            w,
            "Mass error (mean / median): {} / {}",
            format_stat(mean(&self.mass_errors), 4),
            format_stat(median(&self.mass_errors), 4)
        )?;
        writeln!(w, "Number of identified proteins: {}", self.proteins.len())?;
        writeln!(
            w,
            "Percentage of identified proteins: {}",
            format_stat(percentage(self.proteins.len(), self.total_proteins), 2)
        )?;
        writeln!(w)?;

        writeln!(
            w,
            "The following counts are based on those PSMs where {codon}"
        )?;
        writeln!(w, "position is supported by b/y-type ions")?;
        writeln!(w)?;

        writeln!(
            w,
            "Total number of PSMs containing {codon}: {}",
            self.psms_with_codon.len()
        )?;
        writeln!(
            w,
            "Total number of non-redundant peptides containing {codon}: {}",
            distinct(&self.psms_with_codon)
        )?;
        writeln!(
            w,
            "Mass error (mean / median) of PSMs containing {codon}: {} / {}",
            format_stat(mean(&self.mass_errors_with_codon), 4),
            format_stat(median(&self.mass_errors_with_codon), 4)
        )?;
        writeln!(
            w,
            "Number of identified proteins containing {codon}: {}",
            self.proteins_hit_at_codon.len()
        )?;
        writeln!(
            w,
            "Percentage of identified proteins containing {codon}: {}",
            format_stat(
                percentage(self.proteins_hit_at_codon.len(), self.proteins_with_codon),
                2
            )
        )?;
        writeln!(w)?;

        writeln!(
            w,
            "Number of {codon} positions covered by PSMs: {}",
            self.positions.len()
        )?;
        writeln!(
            w,
            "Total number of {codon} positions: {}",
            self.total_codon_positions
        )?;
        writeln!(
            w,
            "Percentage of recovered {codon} positions: {}",
            format_stat(
                percentage(self.positions.len(), self.total_codon_positions),
                2
            )
        )?;
        writeln!(w)?;

        let psms_per_position = self
            .positions
            .values()
            .map(|obs| obs.psm_count() as f64)
            .collect::<Vec<_>>();
        writeln!(
            w,
            "Number of PSMs per recovered {codon} position (mean / median): {} / {}",
            format_stat(mean(&psms_per_position), 4),
            format_stat(median(&psms_per_position), 4)
        )?;
        writeln!(w)?;

        writeln!(
            w,
            "The following counts are broken down to individual translations"
        )?;
        writeln!(
            w,
            "Translation\t#PSMs\t# non-redundant peptides\t{codon} positions\t{codon} positions found with additional translations"
        )?;

        // WARN: Ile and Leu share a mass -> reported together as L/I
        for aa in REPORT_AMINO_ACIDS.iter().filter(|aa| **aa != ISOLEUCINE) {
            let mut n_psms = 0;
            let mut n_peptides = 0;
            let mut n_positions = 0;
            let mut n_ambiguous = 0;

            for obs in self.positions.values() {
                let psms = obs.psms(*aa);
                n_psms += psms.len();
                n_peptides += distinct(psms);

                if !psms.is_empty() {
                    n_positions += 1;
                    if obs.is_ambiguous() {
                        n_ambiguous += 1;
                    }
                }
            }

            let label = if *aa == LEUCINE {
                "L/I".to_string()
            } else {
                (*aa as char).to_string()
            };

            writeln!(
                w,
                "{label}\t{n_psms}\t{n_peptides}\t{n_positions}\t{n_ambiguous}"
            )?;
        }

        Ok(())
    }
}

fn distinct(values: &[String]) -> usize {
    values.iter().collect::<HashSet<_>>().len()
}

/// Writes the statistics report and the PSM table.
///
/// # Arguments
///
/// * `args` - The enriched evidence table, the cDNA input, the codon and
///   the two output paths.
pub fn run_stats(args: StatsArgs) -> Result<()> {
    ensure_exists(&args.input)?;
    ensure_exists(&args.cdna)?;

    let cdna = parse_fa(&args.cdna)?;
    let mut stats = CodonStatistics::new(args.codon, &cdna);

    let (columns, reader) = TableReader::open(&args.input)?;
    let enriched = EnrichedColumns::new(&columns)?;

    let mut psm_writer = create_file(&args.psm)?;
    writeln!(psm_writer, "{}", psm_csv_header(&args.codon)).map_err(RecodonError::io(&args.psm))?;

    for row in reader {
        let row = row?;
        let summary = stats.add(&enriched.row(&row))?;
        writeln!(psm_writer, "{}", summary.csv_line()).map_err(RecodonError::io(&args.psm))?;
    }
    psm_writer.flush().map_err(RecodonError::io(&args.psm))?;

    let mut report = create_file(&args.output)?;
    stats
        .write_report(&mut report)
        .and_then(|_| report.flush())
        .map_err(RecodonError::io(&args.output))?;

    info!(
        "Counted {} PSMs covering {} {} positions -> {}",
        stats.psm_count(),
        stats.covered_positions(),
        args.codon,
        args.output.display()
    );

    Ok(())
}
