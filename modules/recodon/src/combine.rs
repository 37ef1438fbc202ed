//! Merging of search engine tables with cDNA coordinates
//!
//! The msms table is loaded first into an index keyed by evidence id. The
//! evidence table is then streamed once: decoys are dropped, every other
//! match is placed on its cDNA and written out with the computed columns in
//! front of the original ones.

use hashbrown::HashMap;
use log::{debug, info, warn};
use smol_str::SmolStr;

use std::collections::BTreeSet;
use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use crate::cli::CombineArgs;
use crate::codon::{Codon, CodonSequence};
use crate::consts::{ENRICHED_COLUMNS, LIST_SEPARATOR};
use crate::error::{MappingError, RecodonError, Result};
use crate::mapper::map_peptide;
use crate::tables::{Columns, EvidenceColumns, EvidenceRow, MsmsColumns, Row, TableReader};
use crate::utils::{create_file, ensure_exists, parse_fa, read_header_map, FastaRecord};

/// Fragment-ion evidence of one match, across all of its spectra
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectrumSupport {
    pub supported_positions: BTreeSet<usize>,
    pub scan_numbers: Vec<SmolStr>,
}

/// Msms spectra grouped by evidence id
#[derive(Debug, Clone, Default)]
pub struct MsmsIndex {
    by_evidence: HashMap<SmolStr, SpectrumSupport>,
}

impl MsmsIndex {
    /// Reads the msms table.
    ///
    /// Supported positions of spectra sharing an evidence id are merged;
    /// scan numbers keep their file order.
    pub fn load(path: &Path) -> Result<Self> {
        let (columns, reader) = TableReader::open(path)?;
        let msms = MsmsColumns::new(&columns)?;

        let mut index = Self::default();
        for row in reader {
            let row = row?;
            let spectrum = msms.row(&row);
            index.insert(
                spectrum.evidence_id(),
                spectrum.scan_number(),
                spectrum.supported_positions(),
            );
        }

        Ok(index)
    }

    pub fn insert(&mut self, evidence_id: &str, scan_number: &str, positions: Vec<usize>) {
        let entry = self
            .by_evidence
            .entry(SmolStr::new(evidence_id))
            .or_default();
        entry.supported_positions.extend(positions);
        entry.scan_numbers.push(SmolStr::new(scan_number));
    }

    pub fn get(&self, evidence_id: &str) -> Option<&SpectrumSupport> {
        self.by_evidence.get(evidence_id)
    }

    pub fn len(&self) -> usize {
        self.by_evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_evidence.is_empty()
    }
}

/// Original name and codons of every database protein, by short id
#[derive(Debug, Clone, Default)]
pub struct ProteinCatalog {
    proteins: HashMap<SmolStr, (SmolStr, CodonSequence)>,
}

impl ProteinCatalog {
    /// Joins the cDNA records with the header map.
    ///
    /// Proteins whose cDNA cannot be split into codons are left out, so
    /// matches on them fail as unknown proteins.
    pub fn new(cdna: &[FastaRecord], header_map: &HashMap<SmolStr, SmolStr>) -> Self {
        let by_header = cdna
            .iter()
            .map(|record| (record.header.as_str(), record.seq.as_slice()))
            .collect::<HashMap<_, _>>();

        let mut proteins = HashMap::new();
        for (short, original) in header_map {
            let Some(seq) = by_header.get(original.as_str()) else {
                warn!("{original} is listed in the header map but not in the cDNA file");
                continue;
            };

            match CodonSequence::new(original, seq) {
                Ok(codons) => {
                    proteins.insert(short.clone(), (original.clone(), codons));
                }
                Err(e) => warn!("{e} -> matches on {short} cannot be mapped"),
            }
        }

        Self { proteins }
    }

    pub fn get(&self, short: &str) -> std::result::Result<(&str, &CodonSequence), MappingError> {
        self.proteins
            .get(short)
            .map(|(original, codons)| (original.as_str(), codons))
            .ok_or_else(|| MappingError::UnknownProtein(short.to_string()))
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }
}

/// Counts of one combine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineSummary {
    pub written: usize,
    pub decoys: usize,
    pub unmapped: usize,
}

fn join_list<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Header line of the enriched table
pub fn enriched_header(evidence: &Columns) -> String {
    format!("{}\t{}", ENRICHED_COLUMNS.join("\t"), evidence.header())
}

/// Computes the enriched line of one evidence record.
///
/// # Arguments
///
/// * `evidence` - The match to place.
/// * `row` - The raw evidence line, appended after the computed columns.
/// * `catalog` - Database proteins by short id.
/// * `msms` - Fragment-ion support by evidence id.
/// * `target` - The combinatorially translated codon.
///
/// # Returns
///
/// The tab-separated line, or a `Mapping` error naming the evidence id when
/// the peptide cannot be placed on its protein.
pub fn enrich(
    evidence: &EvidenceRow<'_>,
    row: &Row,
    catalog: &ProteinCatalog,
    msms: &MsmsIndex,
    target: &Codon,
) -> Result<String> {
    let mapping_error = |source: MappingError| RecodonError::Mapping {
        evidence_id: evidence.evidence_id().to_string(),
        source,
    };
    let region = evidence.database_protein_id().map_err(|_| {
        mapping_error(MappingError::MalformedProteinId(
            evidence.proteins().to_string(),
        ))
    })?;

    let (original, codons) = catalog.get(&region.gene).map_err(mapping_error)?;
    let hit = map_peptide(
        &region.gene,
        codons,
        &region,
        &evidence.peptide_with_unknown_as_x(),
        target,
    )
    .map_err(mapping_error)?;

    // INFO: the mapper already checked the range against the protein
    let cdna = codons
        .slice(hit.peptide_start, hit.peptide_stop)
        .map(String::from_utf8_lossy)
        .unwrap_or_default();

    let (supported, scans) = match msms.get(evidence.evidence_id()) {
        Some(support) => (
            join_list(&support.supported_positions),
            join_list(&support.scan_numbers),
        ),
        None => {
            debug!("No spectra for evidence {}", evidence.evidence_id());
            (String::new(), String::new())
        }
    };

    Ok(format!(
        "{cdna}\t{}\t{}\t{}\t{original}\t{supported}\t{scans}\t{}",
        hit.peptide_start,
        hit.peptide_stop,
        join_list(&hit.codon_positions),
        row.line()
    ))
}

/// Streams the evidence table into the enriched table.
pub fn combine_tables<W: Write>(
    evidence_path: &Path,
    catalog: &ProteinCatalog,
    msms: &MsmsIndex,
    target: &Codon,
    writer: &mut W,
) -> Result<CombineSummary> {
    let (columns, reader) = TableReader::open(evidence_path)?;
    let layout = EvidenceColumns::new(&columns)?;

    let io_error = |e: std::io::Error| RecodonError::Io {
        path: evidence_path.to_path_buf(),
        source: e,
    };
    writeln!(writer, "{}", enriched_header(&columns)).map_err(io_error)?;

    let mut summary = CombineSummary::default();
    for row in reader {
        let row = row?;
        let evidence = layout.row(&row);

        if evidence.is_decoy() {
            debug!("Skipping decoy match {}", evidence.evidence_id());
            summary.decoys += 1;
            continue;
        }

        match enrich(&evidence, &row, catalog, msms, target) {
            Ok(line) => {
                writeln!(writer, "{line}").map_err(io_error)?;
                summary.written += 1;
            }
            Err(e @ RecodonError::Mapping { .. }) => {
                warn!("{e}");
                summary.unmapped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

/// Writes the enriched evidence table.
///
/// Unmappable matches are logged with their evidence id and left out; the
/// run continues.
pub fn run_combine(args: CombineArgs) -> Result<()> {
    for path in [&args.evidence, &args.msms, &args.cdna, &args.map] {
        ensure_exists(path)?;
    }

    let msms = MsmsIndex::load(&args.msms)?;
    info!(
        "Indexed spectra of {} matches from {}",
        msms.len(),
        args.msms.display()
    );

    let catalog = ProteinCatalog::new(&parse_fa(&args.cdna)?, &read_header_map(&args.map)?);
    info!("Loaded {} database proteins", catalog.len());

    let mut writer = create_file(&args.output)?;
    let summary = combine_tables(&args.evidence, &catalog, &msms, &args.codon, &mut writer)?;
    writer.flush().map_err(RecodonError::io(&args.output))?;

    info!(
        "Wrote {} matches to {} ({} decoys skipped, {} unmapped)",
        summary.written,
        args.output.display(),
        summary.decoys,
        summary.unmapped
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::EnrichedColumns;
    use tempfile::TempDir;

    const EVIDENCE_HEADER: &str =
        "Sequence\tProteins\tScore\tMass error [ppm]\tReverse\tPotential contaminant\tid";
    const MSMS_HEADER: &str = "Sequence\tProteins\tEvidence ID\tMatches\tScan number";
    const FULL_COVERAGE_IONS: &str = "y1;y3;y4;y5;y6;y7;y8;y9;y10;y11;y1-NH3;y3-NH3;y4-NH3;y9-H2O;y9-NH3;y10-H2O;y10(2+);y12(2+);a2;b2;b3;b4;b6;b6-H2O;b7;b7-H2O;b8;b11";

    // INFO: GGT x 102, ATG x 8, AAAALGAALAPQR, TGG x 5
    fn protein_cdna() -> String {
        [
            "GGT".repeat(102),
            "ATG".repeat(8),
            "GCCGCCGCAGCACTGGGGGCTGCGCTTGCGCCGCAGCGC".to_string(),
            "TGG".repeat(5),
        ]
        .concat()
    }

    fn ctg() -> Codon {
        "CTG".parse().unwrap()
    }

    #[test]
    fn test_msms_index_merges_spectra() {
        let mut index = MsmsIndex::default();
        index.insert("7", "300", vec![2, 4]);
        index.insert("7", "100", vec![1, 2]);
        index.insert("8", "200", vec![]);

        let support = index.get("7").unwrap();
        assert_eq!(
            support.supported_positions.iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 4]
        );
        assert_eq!(support.scan_numbers, vec!["300", "100"]);
        assert_eq!(index.len(), 2);
        assert!(index.get("9").is_none());
    }

    #[test]
    fn test_catalog_unknown_protein() {
        let records = vec![FastaRecord {
            header: SmolStr::new("prot"),
            seq: b"ATGAAA".to_vec(),
        }];
        let map = HashMap::from([
            (SmolStr::new("g1"), SmolStr::new("prot")),
            (SmolStr::new("g2"), SmolStr::new("absent")),
        ]);
        let catalog = ProteinCatalog::new(&records, &map);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("g1").unwrap().0, "prot");
        assert_eq!(
            catalog.get("g2").unwrap_err(),
            MappingError::UnknownProtein("g2".into())
        );
    }

    #[test]
    fn test_run_combine() {
        let dir = TempDir::new().unwrap();
        let path = |name: &str| dir.path().join(name);

        std::fs::write(
            path("cdna.fa"),
            format!(">sp|P1 first\n{}\n>second\nATGAAA\n", protein_cdna()),
        )
        .unwrap();
        std::fs::write(path("map.txt"), "sp|P1 first;g1\nsecond;g2\n").unwrap();

        let evidence = [
            EVIDENCE_HEADER,
            "AAAASGAALAPQR\tg1_102_127-CTG-S;g1_102_127-CTG-T\t120.5\t0.8\t\t\t63",
            "RQPALAAGSAAAA\tREV__g1_102_127-CTG-S\t10\t1.0\t+\t\t64",
            "PEPTIDE\tg1_102_127-CTG-S\t15\tNaN\t\t\t65",
            "WWWWW\tg1_102_127-CTG-S\t15\tNaN\t\t\t66",
        ]
        .join("\n");
        std::fs::write(path("evidence.txt"), evidence).unwrap();

        let msms = [
            MSMS_HEADER.to_string(),
            format!("AAAASGAALAPQR\tg1_102_127-CTG-S\t63\t{FULL_COVERAGE_IONS}\t1201"),
            "AAAASGAALAPQR\tg1_102_127-CTG-S\t63\tb2\t1187".to_string(),
            "WWWWW\tg1_102_127-CTG-S\t66\t\t1300".to_string(),
        ]
        .join("\n");
        std::fs::write(path("msms.txt"), msms).unwrap();

        let args = CombineArgs {
            evidence: path("evidence.txt"),
            msms: path("msms.txt"),
            cdna: path("cdna.fa"),
            map: path("map.txt"),
            output: path("enriched.tsv"),
            codon: ctg(),
        };
        run_combine(args).unwrap();

        let (columns, reader) = TableReader::open(&path("enriched.tsv")).unwrap();
        assert!(columns.header().starts_with(
            "cDNA\tStart pos in protein\tEnd pos in protein\tCodon pos\tOriginal protein name"
        ));

        let enriched = EnrichedColumns::new(&columns).unwrap();
        let rows = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(rows.len(), 2);

        let hit = enriched.row(&rows[0]);
        assert_eq!(hit.evidence().evidence_id(), "63");
        assert_eq!(hit.peptide_start().unwrap(), 110);
        assert_eq!(hit.peptide_stop().unwrap(), 122);
        assert_eq!(hit.codon_positions().unwrap(), vec![4]);
        assert_eq!(hit.original_protein_name(), "sp|P1 first");
        assert_eq!(
            hit.supported_positions().unwrap(),
            (0..=12).collect::<Vec<_>>()
        );
        assert_eq!(hit.scan_numbers(), vec!["1201", "1187"]);
        assert_eq!(
            hit.codons().unwrap().bases(),
            b"GCCGCCGCAGCACTGGGGGCTGCGCTTGCGCCGCAGCGC"
        );

        // INFO: "WWWWW" occurs once at the end of the region
        let tail = enriched.row(&rows[1]);
        assert_eq!(tail.evidence().evidence_id(), "66");
        assert_eq!(tail.peptide_start().unwrap(), 123);
        assert!(tail.codon_positions().unwrap().is_empty());
        assert_eq!(tail.scan_numbers(), vec!["1300"]);
    }

    #[test]
    fn test_combine_counts_skipped_matches() {
        let dir = TempDir::new().unwrap();
        let evidence_path = dir.path().join("evidence.txt");
        std::fs::write(
            &evidence_path,
            [
                EVIDENCE_HEADER,
                "MKGW\tg1_0_3\t1\t0.1\t\t\t1",
                "MKGW\tCON__P02768-1\t1\t0.1\t\t+\t2",
                "MKGW\tg9_0_3\t1\t0.1\t\t\t3",
                "MKGW\tg1_0_9\t1\t0.1\t\t\t4",
                "MKGW\t\t1\t0.1\t\t\t5",
                "MKGW\tP02768\t1\t0.1\t\t\t6",
            ]
            .join("\n"),
        )
        .unwrap();

        let records = vec![FastaRecord {
            header: SmolStr::new("plain"),
            seq: b"ATGAAAGGTTGG".to_vec(),
        }];
        let map = HashMap::from([(SmolStr::new("g1"), SmolStr::new("plain"))]);
        let catalog = ProteinCatalog::new(&records, &map);

        let mut out = Vec::new();
        let summary =
            combine_tables(&evidence_path, &catalog, &MsmsIndex::default(), &ctg(), &mut out)
                .unwrap();

        assert_eq!(
            summary,
            CombineSummary {
                written: 1,
                decoys: 1,
                unmapped: 4,
            }
        );

        let text = String::from_utf8(out).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "ATGAAAGGTTGG\t0\t3\t\tplain\t\t\tMKGW\tg1_0_3\t1\t0.1\t\t\t1"
        );
    }

    #[test]
    fn test_combine_missing_input() {
        let dir = TempDir::new().unwrap();
        let args = CombineArgs {
            evidence: dir.path().join("evidence.txt"),
            msms: dir.path().join("msms.txt"),
            cdna: dir.path().join("cdna.fa"),
            map: dir.path().join("map.txt"),
            output: dir.path().join("out.tsv"),
            codon: ctg(),
        };

        assert!(matches!(
            run_combine(args),
            Err(RecodonError::MissingInput(_))
        ));
    }
}
