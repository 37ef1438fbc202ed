//! Cleavage-aware partitioning of a protein into translation segments
//!
//! A protein is scanned once from N- to C-terminus. Stretches without the
//! target codon become `Static` segments and are translated once; stretches
//! around the target codon become `Dynamic` segments and are translated once
//! per substituted amino acid. Dynamic segments reach back and forward far
//! enough to allow two missed cleavages on either side of the codon, so any
//! tryptic peptide covering the codon is fully contained in one of them.

use crate::codon::{translate_codon, CleavageSpec, Codon, CodonSequence};
use crate::consts::{CLEAVAGE_SITES_PER_BOUNDARY, MIN_SEGMENT_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Translated with the standard genetic code only
    Static,
    /// Translated once per substituted amino acid
    Dynamic,
}

/// Inclusive codon range `[start, stop]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub start: usize,
    pub stop: usize,
    pub kind: SegmentKind,
}

#[allow(clippy::len_without_is_empty)]
impl Segment {
    pub fn new(start: usize, stop: usize, kind: SegmentKind) -> Self {
        Self { start, stop, kind }
    }

    pub fn len(&self) -> usize {
        self.stop + 1 - self.start
    }
}

/// Result of partitioning one protein
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub without_codon: Vec<Segment>,
    pub with_codon: Vec<Segment>,
}

impl Partition {
    /// All segments ordered by start
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = self
            .without_codon
            .iter()
            .chain(self.with_codon.iter())
            .copied()
            .collect::<Vec<_>>();
        segments.sort_by_key(|s| s.start);
        segments
    }

    fn push(&mut self, segment: Segment) {
        match segment.kind {
            SegmentKind::Static => self.without_codon.push(segment),
            SegmentKind::Dynamic => self.with_codon.push(segment),
        }
    }

    /// Removes the most recent segment, the one with the larger start
    fn pop_latest(&mut self) -> Option<Segment> {
        let last_static = self.without_codon.last().map(|s| s.start);
        let last_dynamic = self.with_codon.last().map(|s| s.start);

        match (last_static, last_dynamic) {
            (Some(s), Some(d)) if s > d => self.without_codon.pop(),
            (_, Some(_)) => self.with_codon.pop(),
            (Some(_), None) => self.without_codon.pop(),
            (None, None) => None,
        }
    }
}

/// Scanner state while walking a protein
struct Scanner {
    range_start: usize,
    sites: Vec<usize>,
    dynamic: bool,
    partition: Partition,
}

impl Scanner {
    fn new() -> Self {
        Self {
            range_start: 0,
            sites: Vec::new(),
            dynamic: false,
            partition: Partition::default(),
        }
    }

    fn close(&mut self, stop: usize, kind: SegmentKind) {
        self.partition
            .push(Segment::new(self.range_start, stop, kind));
        self.range_start = stop + 1;
        self.sites.clear();
    }

    fn on_cleavage_site(&mut self, idx: usize) {
        self.sites.push(idx);

        if self.dynamic
            && self.sites.len() >= CLEAVAGE_SITES_PER_BOUNDARY
            && idx + 1 - self.range_start >= MIN_SEGMENT_LEN
        {
            self.close(idx, SegmentKind::Dynamic);
            self.dynamic = false;
        }
    }

    fn on_target_codon(&mut self) {
        // INFO: keep 2 missed cleavages upstream of the codon inside the dynamic range
        if !self.dynamic && self.sites.len() >= CLEAVAGE_SITES_PER_BOUNDARY {
            let boundary = self.sites[self.sites.len() - CLEAVAGE_SITES_PER_BOUNDARY];
            if boundary + 1 - self.range_start >= MIN_SEGMENT_LEN {
                self.close(boundary, SegmentKind::Static);
            }
        }

        self.dynamic = true;
        self.sites.clear();
    }

    fn finish(mut self, len: usize) -> Partition {
        if self.range_start >= len {
            return self.partition;
        }

        let remainder_kind = if self.dynamic {
            SegmentKind::Dynamic
        } else {
            SegmentKind::Static
        };

        if len - self.range_start < MIN_SEGMENT_LEN {
            if let Some(target) = self.partition.pop_latest() {
                // WARN: a remainder carrying the codon must stay dynamic
                let kind = match remainder_kind {
                    SegmentKind::Dynamic => SegmentKind::Dynamic,
                    SegmentKind::Static => target.kind,
                };
                self.partition
                    .push(Segment::new(target.start, len - 1, kind));
                return self.partition;
            }
        }

        self.partition
            .push(Segment::new(self.range_start, len - 1, remainder_kind));
        self.partition
    }
}

/// Splits a protein into static and dynamic segments.
///
/// # Arguments
///
/// * `codons` - The protein-coding sequence, trailing stop already removed.
/// * `cleavage` - Residues after which the protease cuts.
/// * `target` - The codon to be translated combinatorially.
///
/// # Returns
///
/// A `Partition` whose segments cover `0..codons.len()` exactly once. When
/// the target codon never occurs, the whole protein is one static segment.
///
/// # Example
///
/// ```rust, ignore
/// let codons = CodonSequence::new("h1", cdna)?.without_trailing_stop();
/// let partition = partition(&codons, &CleavageSpec::default(), &"CTG".parse()?);
///
/// for segment in partition.segments() {
///     println!("{:?} {}-{}", segment.kind, segment.start, segment.stop);
/// }
/// ```
pub fn partition(codons: &CodonSequence, cleavage: &CleavageSpec, target: &Codon) -> Partition {
    let mut scanner = Scanner::new();

    for (idx, codon) in codons.codons().enumerate() {
        if codon == target.as_bytes() {
            scanner.on_target_codon();
        } else if cleavage.cleaves_after(translate_codon(codon)) {
            scanner.on_cleavage_site(idx);
        }
    }

    scanner.finish(codons.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codons_of(codons: &[&str]) -> CodonSequence {
        CodonSequence::new("test", codons.concat().as_bytes()).unwrap()
    }

    fn ctg() -> Codon {
        "CTG".parse().unwrap()
    }

    // MSDTLYSQREHQNNQKFEQLASTLHQFRTTVDHDIHNNVQQENSLLDSLNDSFNSLMVLVKQTSGELRTVMNRNASLTRIVGMILLGFFIIWMLYKLI
    const SINGLE_CTG_CDNA: &str = "ATGTCAGATACATTATATTCTCAAAGAGAACATCAGAACAATCAGAAATTTGAACAATTAGCTTCAACTTTACACCAATTCAGAACCACCGTAGATCATGATATTCACAATAATGTTCAACAAGAAAACTCCCTACTAGATTCATTGAATGATAGTTTCAATTCTTTAATGGTGCTGGTTAAACAAACTTCTGGAGAATTAAGAACAGTTATGAATAGAAATGCTAGTCTTACTCGAATAGTAGGAATGATATTGCTTGGATTCTTTATAATTTGGATGTTGTATAAATTAATATAA";

    #[test]
    fn test_partition_single_codon_protein() {
        let codons = CodonSequence::new("h1", SINGLE_CTG_CDNA.as_bytes())
            .unwrap()
            .without_trailing_stop();
        assert_eq!(codons.len(), 98);

        let partition = partition(&codons, &CleavageSpec::default(), &ctg());

        assert_eq!(
            partition.without_codon,
            vec![
                Segment::new(0, 8, SegmentKind::Static),
                Segment::new(73, 97, SegmentKind::Static)
            ]
        );
        assert_eq!(
            partition.with_codon,
            vec![Segment::new(9, 72, SegmentKind::Dynamic)]
        );

        assert_eq!(codons.translate(0, 8, None), "MSDTLYSQR");
        assert_eq!(
            codons.translate(9, 72, None),
            "EHQNNQKFEQLASTLHQFRTTVDHDIHNNVQQENSLLDSLNDSFNSLMVLVKQTSGELRTVMNR"
        );
        assert_eq!(codons.translate(73, 97, None), "NASLTRIVGMILLGFFIIWMLYKLI");
    }

    #[test]
    fn test_partition_without_target_codon() {
        let codons = codons_of(&["ATG", "AAA", "GCT", "CGT", "GGT", "AAA", "TTT", "CGC"]);
        let partition = partition(&codons, &CleavageSpec::default(), &ctg());

        assert!(partition.with_codon.is_empty());
        assert_eq!(
            partition.without_codon,
            vec![Segment::new(0, 7, SegmentKind::Static)]
        );
    }

    #[test]
    fn test_partition_short_remainder_merges_into_dynamic() {
        // A A A A A L(CTG) A K R K | G G
        let codons = codons_of(&[
            "GCT", "GCT", "GCT", "GCT", "GCT", "CTG", "GCT", "AAA", "CGT", "AAA", "GGT", "GGT",
        ]);
        let partition = partition(&codons, &CleavageSpec::default(), &ctg());

        assert!(partition.without_codon.is_empty());
        assert_eq!(
            partition.with_codon,
            vec![Segment::new(0, 11, SegmentKind::Dynamic)]
        );
    }

    #[test]
    fn test_partition_dynamic_remainder_never_loses_codon() {
        // A A A A A A K R K | L(CTG) G
        let codons = codons_of(&[
            "GCT", "GCT", "GCT", "GCT", "GCT", "GCT", "AAA", "CGT", "AAA", "CTG", "GGT",
        ]);
        let partition = partition(&codons, &CleavageSpec::default(), &ctg());

        assert!(partition.without_codon.is_empty());
        assert_eq!(
            partition.with_codon,
            vec![Segment::new(0, 10, SegmentKind::Dynamic)]
        );
    }

    #[test]
    fn test_partition_two_missed_cleavages_each_side() {
        // K1 K2 K3 K4 | K5 K6 L K7 K8 K9 | rest
        let mut codons = vec!["GCT", "AAA", "GCT", "AAA", "GCT", "AAA", "GCT", "AAA"];
        codons.extend(["GCT", "AAA", "GCT", "AAA", "CTG", "GCT", "AAA", "GCT", "AAA"]);
        codons.extend(["GCT", "AAA", "GGT", "GGT", "GGT", "GGT", "GGT", "GGT"]);
        let codons = codons_of(&codons);

        let partition = partition(&codons, &CleavageSpec::default(), &ctg());

        // INFO: sites before CTG at 1,3,5,7,9,11 -> static ends at 3rd-from-last (7)
        assert_eq!(
            partition.without_codon,
            vec![
                Segment::new(0, 7, SegmentKind::Static),
                Segment::new(19, 24, SegmentKind::Static)
            ]
        );
        // INFO: sites after CTG at 14,16,18 -> dynamic closes at 18
        assert_eq!(
            partition.with_codon,
            vec![Segment::new(8, 18, SegmentKind::Dynamic)]
        );
    }

    #[test]
    fn test_partition_custom_cleavage() {
        let codons = codons_of(&[
            "GCT", "GAA", "GCT", "GAA", "GCT", "GAA", "GCT", "GCT", "CTG", "GCT", "GAA", "GCT",
            "GAA", "GCT", "GAA", "GCT", "GGT", "GGT", "GGT", "GGT", "GGT",
        ]);
        let cleavage = "E".parse::<CleavageSpec>().unwrap();

        let partition = partition(&codons, &cleavage, &ctg());

        assert_eq!(
            partition.with_codon,
            vec![Segment::new(0, 14, SegmentKind::Dynamic)]
        );
        assert_eq!(
            partition.without_codon,
            vec![Segment::new(15, 20, SegmentKind::Static)]
        );

        let with_kr = super::partition(&codons, &CleavageSpec::default(), &ctg());
        assert_eq!(
            with_kr.with_codon,
            vec![Segment::new(0, 20, SegmentKind::Dynamic)]
        );
    }

    #[test]
    fn test_partition_target_codon_is_not_a_cleavage_site() {
        // A R A R A R A A K(AAA) A R A R A R | A A A A A A
        let mut codons = vec!["GCT", "CGT", "GCT", "CGT", "GCT", "CGT", "GCT", "GCT", "AAA"];
        codons.extend(["GCT", "CGT", "GCT", "CGT", "GCT", "CGT"]);
        codons.extend(["GCT"; 6]);
        let codons = codons_of(&codons);
        let target = "AAA".parse::<Codon>().unwrap();

        let partition = partition(&codons, &CleavageSpec::default(), &target);

        // INFO: counting AAA as a site would close the dynamic range at 12
        assert_eq!(
            partition.with_codon,
            vec![Segment::new(0, 14, SegmentKind::Dynamic)]
        );
        assert_eq!(
            partition.without_codon,
            vec![Segment::new(15, 20, SegmentKind::Static)]
        );
    }

    #[test]
    fn test_partition_empty_sequence() {
        let codons = CodonSequence::new("empty", b"").unwrap();
        assert_eq!(
            partition(&codons, &CleavageSpec::default(), &ctg()),
            Partition::default()
        );
    }

    fn codon_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            4 => Just("GCT"),
            2 => Just("AAA"),
            2 => Just("CGT"),
            1 => Just("CTG"),
            1 => Just("GGT"),
            1 => Just("TTT"),
        ]
    }

    proptest! {
        #[test]
        fn test_partition_covers_every_codon_once(
            codons in proptest::collection::vec(codon_strategy(), 0..120)
        ) {
            let seq = codons_of(&codons);
            let partition = partition(&seq, &CleavageSpec::default(), &ctg());

            let mut next = 0;
            for segment in partition.segments() {
                prop_assert_eq!(segment.start, next);
                prop_assert!(segment.stop >= segment.start);
                next = segment.stop + 1;
            }
            prop_assert_eq!(next, seq.len());
        }

        #[test]
        fn test_partition_segment_invariants(
            codons in proptest::collection::vec(codon_strategy(), 6..120)
        ) {
            let seq = codons_of(&codons);
            let cleavage = CleavageSpec::default();
            let partition = partition(&seq, &cleavage, &ctg());
            let segments = partition.segments();

            for segment in &partition.with_codon {
                prop_assert!(segment.len() >= MIN_SEGMENT_LEN);
            }

            // INFO: every target codon ends up in a dynamic segment
            for idx in seq.positions_of(&ctg()) {
                prop_assert!(partition
                    .with_codon
                    .iter()
                    .any(|s| s.start <= idx && idx <= s.stop));
            }

            for segment in segments.iter().take(segments.len().saturating_sub(1)) {
                prop_assert!(cleavage.cleaves_after(translate_codon(seq.codon(segment.stop))));
            }
        }
    }
}
