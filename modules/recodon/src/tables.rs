//! Tab-separated match tables
//!
//! The search engine writes one header line followed by one record per
//! line. Columns are looked up by name once, and every table gets its own
//! typed accessors on top of the shared `Columns`/`Row` primitives.

use hashbrown::HashMap;

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::codon::CodonSequence;
use crate::consts::*;
use crate::error::{RecodonError, Result};
use crate::header::ProteinId;
use crate::ions::{supported_positions, FragmentIons};
use crate::stats::ProteinPosition;

const FIELD_SEPARATOR: char = '\t';
const UNSPECIFIED_MASS_ERROR: &str = "NaN";
const FLAG_SET: &str = "+";

/// Column name -> index lookup of one table
#[derive(Debug, Clone)]
pub struct Columns {
    header: String,
    index: HashMap<String, usize>,
    path: PathBuf,
}

impl Columns {
    pub fn parse(header: &str, path: &Path) -> Self {
        let header = header.trim_end_matches(['\n', '\r']).to_string();

        let mut index = HashMap::new();
        for (idx, name) in header.split(FIELD_SEPARATOR).enumerate() {
            // INFO: first occurrence wins on repeated names
            index.entry(name.trim().to_string()).or_insert(idx);
        }

        Self {
            header,
            index,
            path: path.to_path_buf(),
        }
    }

    /// The header line as read, without line break
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.find(name).ok_or_else(|| self.missing(name))
    }

    /// Index of the first name present, in the given order
    pub fn require_any(&self, names: &[&str]) -> Result<usize> {
        names
            .iter()
            .find_map(|name| self.find(name))
            .ok_or_else(|| self.missing(&names.join(" | ")))
    }

    /// Index of the left-most column whose name ends with `suffix`
    pub fn find_suffix(&self, suffix: &str) -> Option<usize> {
        self.index
            .iter()
            .filter(|(name, _)| name.ends_with(suffix))
            .map(|(_, idx)| *idx)
            .min()
    }

    fn missing(&self, name: &str) -> RecodonError {
        RecodonError::MissingColumn {
            column: name.to_string(),
            path: self.path.clone(),
        }
    }
}

/// Fields of one table line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    pub fn parse(line: &str) -> Self {
        Self {
            fields: line
                .trim_end_matches(['\n', '\r'])
                .split(FIELD_SEPARATOR)
                .map(String::from)
                .collect(),
        }
    }

    /// Field at `idx`; missing trailing fields read as empty
    pub fn get(&self, idx: usize) -> &str {
        self.fields.get(idx).map_or("", String::as_str)
    }

    /// The line as read, without line break
    pub fn line(&self) -> String {
        self.fields.join("\t")
    }
}

/// Streams the records of a table after its header line
pub struct TableReader<R> {
    lines: Lines<R>,
    path: PathBuf,
}

impl TableReader<BufReader<File>> {
    /// Opens a table and reads its header.
    ///
    /// # Returns
    ///
    /// The parsed header and a reader over the remaining records. An empty
    /// file yields an empty header, so every column lookup fails.
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let (columns, reader) = TableReader::open(Path::new("evidence.txt"))?;
    /// let evidence = EvidenceColumns::new(&columns)?;
    /// for row in reader {
    ///     let row = row?;
    ///     println!("{}", evidence.row(&row).peptide());
    /// }
    /// ```
    pub fn open(path: &Path) -> Result<(Columns, Self)> {
        let file = File::open(path).map_err(RecodonError::io(path))?;
        let mut lines = BufReader::new(file).lines();

        let header = match lines.next() {
            Some(line) => line.map_err(RecodonError::io(path))?,
            None => String::new(),
        };

        Ok((
            Columns::parse(&header, path),
            Self {
                lines,
                path: path.to_path_buf(),
            },
        ))
    }
}

impl<R: BufRead> Iterator for TableReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(RecodonError::io(self.path.clone())(e))),
            };

            if !line.trim().is_empty() {
                return Some(Ok(Row::parse(&line)));
            }
        }
    }
}

fn parse_field<T: FromStr>(field: &str, value: &str, record: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| RecodonError::MalformedField {
            field: field.to_string(),
            value: value.to_string(),
            record: record.to_string(),
        })
}

/// Parses a `;`-joined position list; an empty field is an empty list
fn parse_positions(field: &str, value: &str, record: &str) -> Result<Vec<usize>> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse_field(field, v, record))
        .collect()
}

/// Column layout of the evidence table
#[derive(Debug, Clone)]
pub struct EvidenceColumns {
    peptide: usize,
    proteins: usize,
    id: usize,
    score: usize,
    mass_error: usize,
    reverse: usize,
    contaminant: usize,
}

impl EvidenceColumns {
    pub fn new(columns: &Columns) -> Result<Self> {
        Ok(Self {
            peptide: columns.require(COL_SEQUENCE)?,
            proteins: columns.require(COL_PROTEINS)?,
            id: columns.require(COL_ID)?,
            score: columns.require(COL_SCORE)?,
            mass_error: columns.require_any(&COL_MASS_ERROR)?,
            reverse: columns.require(COL_REVERSE)?,
            contaminant: columns.require(COL_CONTAMINANT)?,
        })
    }

    pub fn row<'a>(&'a self, row: &'a Row) -> EvidenceRow<'a> {
        EvidenceRow { columns: self, row }
    }
}

/// One peptide-spectrum match of the evidence table
#[derive(Debug, Clone, Copy)]
pub struct EvidenceRow<'a> {
    columns: &'a EvidenceColumns,
    row: &'a Row,
}

impl<'a> EvidenceRow<'a> {
    pub fn peptide(&self) -> &'a str {
        self.row.get(self.columns.peptide)
    }

    /// The peptide as translated from the database, `U` -> `X`
    pub fn peptide_with_unknown_as_x(&self) -> String {
        self.peptide()
            .replace(SEARCH_ENGINE_UNKNOWN_RESIDUE as char, &(UNKNOWN_RESIDUE as char).to_string())
    }

    pub fn evidence_id(&self) -> &'a str {
        self.row.get(self.columns.id)
    }

    pub fn proteins(&self) -> &'a str {
        self.row.get(self.columns.proteins)
    }

    /// First protein of the `Proteins` field, the synthetic database header
    pub fn database_protein_id(&self) -> Result<ProteinId> {
        let proteins = self.proteins();
        let first = proteins.split(LIST_SEPARATOR).next().unwrap_or_default();

        first.parse::<ProteinId>().map_err(|_| RecodonError::MalformedField {
            field: COL_PROTEINS.to_string(),
            value: proteins.to_string(),
            record: self.evidence_id().to_string(),
        })
    }

    pub fn score(&self) -> Result<f64> {
        parse_field(COL_SCORE, self.row.get(self.columns.score), self.evidence_id())
    }

    pub fn mass_error_text(&self) -> &'a str {
        self.row.get(self.columns.mass_error)
    }

    /// Mass error in ppm, `None` when the search engine left it unspecified
    pub fn mass_error(&self) -> Result<Option<f64>> {
        match self.mass_error_text().trim() {
            UNSPECIFIED_MASS_ERROR => Ok(None),
            text => parse_field(COL_MASS_ERROR[0], text, self.evidence_id()).map(Some),
        }
    }

    /// Reverse-database or contaminant hit
    pub fn is_decoy(&self) -> bool {
        self.row.get(self.columns.reverse) == FLAG_SET
            || self.row.get(self.columns.contaminant) == FLAG_SET
    }
}

/// Column layout of the msms table
#[derive(Debug, Clone)]
pub struct MsmsColumns {
    peptide: usize,
    evidence_id: usize,
    matches: usize,
    scan_number: usize,
}

impl MsmsColumns {
    pub fn new(columns: &Columns) -> Result<Self> {
        // INFO: required for layout validation only
        columns.require(COL_PROTEINS)?;

        Ok(Self {
            peptide: columns.require(COL_SEQUENCE)?,
            evidence_id: columns.require(COL_EVIDENCE_ID)?,
            matches: columns.require(COL_MATCHES)?,
            scan_number: columns.require(COL_SCAN_NUMBER)?,
        })
    }

    pub fn row<'a>(&'a self, row: &'a Row) -> MsmsRow<'a> {
        MsmsRow { columns: self, row }
    }
}

/// One spectrum of the msms table
#[derive(Debug, Clone, Copy)]
pub struct MsmsRow<'a> {
    columns: &'a MsmsColumns,
    row: &'a Row,
}

impl<'a> MsmsRow<'a> {
    pub fn peptide(&self) -> &'a str {
        self.row.get(self.columns.peptide)
    }

    pub fn evidence_id(&self) -> &'a str {
        self.row.get(self.columns.evidence_id)
    }

    pub fn matched_ions(&self) -> FragmentIons {
        FragmentIons::parse(self.row.get(self.columns.matches))
    }

    pub fn scan_number(&self) -> &'a str {
        self.row.get(self.columns.scan_number)
    }

    /// Peptide positions supported by this spectrum's fragment ions
    pub fn supported_positions(&self) -> Vec<usize> {
        supported_positions(self.peptide(), &self.matched_ions())
    }
}

/// Column layout of the enriched evidence table
#[derive(Debug, Clone)]
pub struct EnrichedColumns {
    evidence: EvidenceColumns,
    cdna: usize,
    codon_pos: usize,
    start: usize,
    stop: usize,
    original_name: usize,
    supported_pos: usize,
    scan_numbers: usize,
}

impl EnrichedColumns {
    pub fn new(columns: &Columns) -> Result<Self> {
        let codon_pos = match columns.find(COL_CODON_POS) {
            Some(idx) => idx,
            None => columns
                .find_suffix(COL_CODON_POS_SUFFIX)
                .ok_or_else(|| RecodonError::MissingColumn {
                    column: COL_CODON_POS.to_string(),
                    path: columns.path().to_path_buf(),
                })?,
        };

        Ok(Self {
            evidence: EvidenceColumns::new(columns)?,
            cdna: columns.require(COL_CDNA)?,
            codon_pos,
            start: columns.require(COL_START_POS)?,
            stop: columns.require(COL_END_POS)?,
            original_name: columns.require(COL_ORIGINAL_NAME)?,
            supported_pos: columns.require(COL_SUPPORTED_POS)?,
            scan_numbers: columns.require(COL_SCAN_NUMBERS)?,
        })
    }

    pub fn row<'a>(&'a self, row: &'a Row) -> EnrichedEvidenceRow<'a> {
        EnrichedEvidenceRow {
            evidence: self.evidence.row(row),
            columns: self,
            row,
        }
    }
}

/// One mapped match of the enriched evidence table
#[derive(Debug, Clone, Copy)]
pub struct EnrichedEvidenceRow<'a> {
    evidence: EvidenceRow<'a>,
    columns: &'a EnrichedColumns,
    row: &'a Row,
}

impl<'a> EnrichedEvidenceRow<'a> {
    /// Accessors of the underlying evidence record
    pub fn evidence(&self) -> &EvidenceRow<'a> {
        &self.evidence
    }

    pub fn codons(&self) -> Result<CodonSequence> {
        CodonSequence::new(self.evidence.evidence_id(), self.row.get(self.columns.cdna).as_bytes())
    }

    /// Peptide-local positions of the target codon
    pub fn codon_positions(&self) -> Result<Vec<usize>> {
        parse_positions(
            COL_CODON_POS,
            self.row.get(self.columns.codon_pos),
            self.evidence.evidence_id(),
        )
    }

    pub fn peptide_start(&self) -> Result<usize> {
        parse_field(COL_START_POS, self.row.get(self.columns.start), self.evidence.evidence_id())
    }

    pub fn peptide_stop(&self) -> Result<usize> {
        parse_field(COL_END_POS, self.row.get(self.columns.stop), self.evidence.evidence_id())
    }

    /// Protein-level key of a peptide-local position
    pub fn protein_position(&self, peptide_pos: usize) -> Result<ProteinPosition> {
        let protein = self.database_protein_id()?;
        Ok(ProteinPosition::new(
            protein.gene.as_str(),
            self.peptide_start()? + peptide_pos,
        ))
    }

    pub fn original_protein_name(&self) -> &'a str {
        self.row.get(self.columns.original_name)
    }

    pub fn database_protein_id(&self) -> Result<ProteinId> {
        self.evidence.database_protein_id()
    }

    pub fn supported_positions(&self) -> Result<Vec<usize>> {
        parse_positions(
            COL_SUPPORTED_POS,
            self.row.get(self.columns.supported_pos),
            self.evidence.evidence_id(),
        )
    }

    pub fn scan_numbers(&self) -> Vec<&'a str> {
        self.row
            .get(self.columns.scan_numbers)
            .split(LIST_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EVIDENCE_HEADER: &str =
        "Sequence\tProteins\tScore\tMass error [ppm]\tReverse\tPotential contaminant\tid";

    fn columns(header: &str) -> Columns {
        Columns::parse(header, Path::new("table.txt"))
    }

    #[test]
    fn test_columns_lookup() {
        let columns = columns("a\tb\tCTG codon pos\tb\n");

        assert_eq!(columns.find("a"), Some(0));
        assert_eq!(columns.find("b"), Some(1));
        assert_eq!(columns.find("c"), None);
        assert_eq!(columns.find_suffix(COL_CODON_POS_SUFFIX), Some(2));
        assert_eq!(columns.require_any(&["c", "b"]).unwrap(), 1);
        assert_eq!(columns.header(), "a\tb\tCTG codon pos\tb");

        match columns.require("missing") {
            Err(RecodonError::MissingColumn { column, path }) => {
                assert_eq!(column, "missing");
                assert_eq!(path, PathBuf::from("table.txt"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_row_missing_trailing_fields() {
        let row = Row::parse("x\ty\r\n");
        assert_eq!(row.get(1), "y");
        assert_eq!(row.get(5), "");
        assert_eq!(row.line(), "x\ty");
    }

    #[test]
    fn test_evidence_row() {
        let columns = columns(EVIDENCE_HEADER);
        let evidence = EvidenceColumns::new(&columns).unwrap();

        let row = Row::parse("AUKR\tg3_10_30-CTG-S;g3_10_30-CTG-A\t88.5\t-1.25\t\t\t63");
        let record = evidence.row(&row);

        assert_eq!(record.peptide(), "AUKR");
        assert_eq!(record.peptide_with_unknown_as_x(), "AXKR");
        assert_eq!(record.evidence_id(), "63");
        assert_eq!(record.score().unwrap(), 88.5);
        assert_eq!(record.mass_error().unwrap(), Some(-1.25));
        assert!(!record.is_decoy());

        let id = record.database_protein_id().unwrap();
        assert_eq!(id.to_string(), "g3_10_30-CTG-S");
    }

    #[test]
    fn test_evidence_row_decoys_and_nan() {
        let columns = columns(EVIDENCE_HEADER);
        let evidence = EvidenceColumns::new(&columns).unwrap();

        let reverse = Row::parse("PEPK\tREV__g1_0_8\t1\tNaN\t+\t\t1");
        assert!(evidence.row(&reverse).is_decoy());
        assert_eq!(evidence.row(&reverse).mass_error().unwrap(), None);

        let contaminant = Row::parse("PEPK\tCON__P02768-1\t1\t0.5\t\t+\t2");
        assert!(evidence.row(&contaminant).is_decoy());
        assert!(evidence.row(&contaminant).database_protein_id().is_err());

        let broken = Row::parse("PEPK\tg1_0_8\t1\tabc\t\t\t3");
        assert!(matches!(
            evidence.row(&broken).mass_error(),
            Err(RecodonError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_evidence_alternative_mass_error_column() {
        let layout = columns(
            "Sequence\tProteins\tScore\tMass Error [ppm]\tReverse\tPotential contaminant\tid",
        );
        assert!(EvidenceColumns::new(&layout).is_ok());

        let layout = columns("Sequence\tProteins\tScore\tReverse\tPotential contaminant\tid");
        assert!(matches!(
            EvidenceColumns::new(&layout),
            Err(RecodonError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_msms_row() {
        let columns = columns("Sequence\tProteins\tEvidence ID\tMatches\tScan number");
        let msms = MsmsColumns::new(&columns).unwrap();

        let row = Row::parse("PEPTIDE\tg1_0_8\t63\tb3;y3\t1204");
        let record = msms.row(&row);

        assert_eq!(record.peptide(), "PEPTIDE");
        assert_eq!(record.evidence_id(), "63");
        assert_eq!(record.scan_number(), "1204");
        assert_eq!(record.matched_ions().len(), 2);
        assert_eq!(record.supported_positions(), vec![3]);
    }

    #[test]
    fn test_enriched_row() {
        let header = format!(
            "cDNA\tStart pos in protein\tEnd pos in protein\tCTG codon pos\tOriginal protein name\tb/y-ion supported pos\tCorresponding scan numbers\t{EVIDENCE_HEADER}"
        );
        let columns = columns(&header);
        let enriched = EnrichedColumns::new(&columns).unwrap();

        let row = Row::parse(
            "ATGCTGAAA\t110\t112\t1\tsp|P1 desc\t0;1;2\t11;12\tMSK\tg1_102_127-CTG-S\t1\t0.1\t\t\t7",
        );
        let record = enriched.row(&row);

        assert_eq!(record.codons().unwrap().len(), 3);
        assert_eq!(record.codon_positions().unwrap(), vec![1]);
        assert_eq!(record.peptide_start().unwrap(), 110);
        assert_eq!(record.peptide_stop().unwrap(), 112);
        assert_eq!(record.original_protein_name(), "sp|P1 desc");
        assert_eq!(record.supported_positions().unwrap(), vec![0, 1, 2]);
        assert_eq!(record.scan_numbers(), vec!["11", "12"]);
        assert_eq!(record.evidence().peptide(), "MSK");
        assert_eq!(
            record.protein_position(1).unwrap(),
            ProteinPosition::new("g1", 111)
        );
    }

    #[test]
    fn test_enriched_row_empty_lists() {
        let header = format!(
            "cDNA\tStart pos in protein\tEnd pos in protein\tCodon pos\tOriginal protein name\tb/y-ion supported pos\tCorresponding scan numbers\t{EVIDENCE_HEADER}"
        );
        let columns = columns(&header);
        let enriched = EnrichedColumns::new(&columns).unwrap();

        let row = Row::parse("ATG\t0\t0\t\tp\t\t\tM\tg1_0_0\t1\t0.1\t\t\t8");
        let record = enriched.row(&row);

        assert!(record.codon_positions().unwrap().is_empty());
        assert!(record.supported_positions().unwrap().is_empty());
        assert!(record.scan_numbers().is_empty());
    }

    #[test]
    fn test_table_reader_skips_blank_lines() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "{EVIDENCE_HEADER}\nPEPK\tg1_0_8\t1\t0.5\t\t\t1\n\nAK\tg1_0_8\t1\t0.5\t\t\t2\n")
            .unwrap();
        tmp.flush().unwrap();

        let (columns, reader) = TableReader::open(tmp.path()).unwrap();
        let evidence = EvidenceColumns::new(&columns).unwrap();
        let rows = reader.collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(evidence.row(&rows[1]).evidence_id(), "2");
    }
}
