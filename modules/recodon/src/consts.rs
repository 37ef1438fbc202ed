//! Constants shared by the database, combine and statistics stages.
//!
//! The genetic code lives here as a plain `const` table: it is read-only,
//! process-wide data and every translation in the crate goes through it.

pub const STOP: u8 = b'*';
pub const UNKNOWN_RESIDUE: u8 = b'X';
// INFO: the search engine reports database 'X' residues as 'U'
pub const SEARCH_ENGINE_UNKNOWN_RESIDUE: u8 = b'U';

pub const MIN_SEGMENT_LEN: usize = 6;
// INFO: 2 missed cleavages -> the 3rd site since the last boundary closes a segment
pub const CLEAVAGE_SITES_PER_BOUNDARY: usize = 3;

pub const FASTA_LINE_WIDTH: usize = 80;
pub const SHORT_ID_PREFIX: &str = "g";
pub const MAP_SEPARATOR: char = ';';
pub const LIST_SEPARATOR: &str = ";";

pub const DEFAULT_CODON: &str = "CTG";
pub const DEFAULT_CLEAVAGE: &str = "K,R";

pub const ISOLEUCINE: u8 = b'I';
pub const LEUCINE: u8 = b'L';

/// Canonical one-letter amino acid codes, alphabetical
pub const AMINO_ACIDS: [u8; 20] = *b"ACDEFGHIKLMNPQRSTVWY";

/// Amino acids in genetic-code order, used for the per-translation report
pub const REPORT_AMINO_ACIDS: [u8; 20] = *b"FLIMVSPTYAHQNKDECWRG";

// INFO: evidence table
pub const COL_SEQUENCE: &str = "Sequence";
pub const COL_PROTEINS: &str = "Proteins";
pub const COL_ID: &str = "id";
pub const COL_SCORE: &str = "Score";
pub const COL_MASS_ERROR: [&str; 2] = ["Mass error [ppm]", "Mass Error [ppm]"];
pub const COL_REVERSE: &str = "Reverse";
pub const COL_CONTAMINANT: &str = "Potential contaminant";

// INFO: msms table
pub const COL_EVIDENCE_ID: &str = "Evidence ID";
pub const COL_MATCHES: &str = "Matches";
pub const COL_SCAN_NUMBER: &str = "Scan number";

// INFO: enriched evidence table, in output order
pub const COL_CDNA: &str = "cDNA";
pub const COL_START_POS: &str = "Start pos in protein";
pub const COL_END_POS: &str = "End pos in protein";
pub const COL_CODON_POS: &str = "Codon pos";
pub const COL_CODON_POS_SUFFIX: &str = " codon pos";
pub const COL_ORIGINAL_NAME: &str = "Original protein name";
pub const COL_SUPPORTED_POS: &str = "b/y-ion supported pos";
pub const COL_SCAN_NUMBERS: &str = "Corresponding scan numbers";

pub const ENRICHED_COLUMNS: [&str; 7] = [
    COL_CDNA,
    COL_START_POS,
    COL_END_POS,
    COL_CODON_POS,
    COL_ORIGINAL_NAME,
    COL_SUPPORTED_POS,
    COL_SCAN_NUMBERS,
];

pub const CODON_TABLE: [(&[u8; 3], u8); 64] = [
    // Phenylalanine (F)
    (b"TTT", b'F'),
    (b"TTC", b'F'),
    // Leucine (L)
    (b"TTA", b'L'),
    (b"TTG", b'L'),
    (b"CTT", b'L'),
    (b"CTC", b'L'),
    (b"CTA", b'L'),
    (b"CTG", b'L'),
    // Isoleucine (I)
    (b"ATT", b'I'),
    (b"ATC", b'I'),
    (b"ATA", b'I'),
    // Methionine (M)
    (b"ATG", b'M'),
    // Valine (V)
    (b"GTT", b'V'),
    (b"GTC", b'V'),
    (b"GTA", b'V'),
    (b"GTG", b'V'),
    // Serine (S)
    (b"TCT", b'S'),
    (b"TCC", b'S'),
    (b"TCA", b'S'),
    (b"TCG", b'S'),
    (b"AGT", b'S'),
    (b"AGC", b'S'),
    // Proline (P)
    (b"CCT", b'P'),
    (b"CCC", b'P'),
    (b"CCA", b'P'),
    (b"CCG", b'P'),
    // Threonine (T)
    (b"ACT", b'T'),
    (b"ACC", b'T'),
    (b"ACA", b'T'),
    (b"ACG", b'T'),
    // Tyrosine (Y)
    (b"TAT", b'Y'),
    (b"TAC", b'Y'),
    // Alanine (A)
    (b"GCT", b'A'),
    (b"GCC", b'A'),
    (b"GCA", b'A'),
    (b"GCG", b'A'),
    // Histidine (H)
    (b"CAT", b'H'),
    (b"CAC", b'H'),
    // Glutamine (Q)
    (b"CAA", b'Q'),
    (b"CAG", b'Q'),
    // Asparagine (N)
    (b"AAT", b'N'),
    (b"AAC", b'N'),
    // Lysine (K)
    (b"AAA", b'K'),
    (b"AAG", b'K'),
    // Aspartic acid (D)
    (b"GAT", b'D'),
    (b"GAC", b'D'),
    // Glutamic acid (E)
    (b"GAA", b'E'),
    (b"GAG", b'E'),
    // Cysteine (C)
    (b"TGT", b'C'),
    (b"TGC", b'C'),
    // Tryptophan (W)
    (b"TGG", b'W'),
    // Arginine (R)
    (b"CGT", b'R'),
    (b"CGC", b'R'),
    (b"CGA", b'R'),
    (b"CGG", b'R'),
    (b"AGA", b'R'),
    (b"AGG", b'R'),
    // Glycine (G)
    (b"GGT", b'G'),
    (b"GGC", b'G'),
    (b"GGA", b'G'),
    (b"GGG", b'G'),
    // Stop codons (*)
    (b"TAA", STOP),
    (b"TAG", STOP),
    (b"TGA", STOP),
];
