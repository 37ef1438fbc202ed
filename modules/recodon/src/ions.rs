//! Fragment-ion support of peptide positions
//!
//! A residue is considered spectrally supported when the fragment ions on
//! both of its sides were matched, either within the same series (`b` or
//! `y`) or across series. Neutral losses and doubly charged variants of an
//! ion count as the ion itself.

use hashbrown::HashSet;

use crate::consts::LIST_SEPARATOR;

const B_SERIES: char = 'b';
const Y_SERIES: char = 'y';
const ION_VARIANTS: [&str; 4] = ["", "-NH3", "-H2O", "(2+)"];

/// Matched fragment-ion labels of one spectrum
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentIons {
    labels: HashSet<String>,
}

impl FragmentIons {
    /// Parses the `;`-separated label list of a `Matches` field
    pub fn parse(field: &str) -> Self {
        Self::from_labels(field.split(LIST_SEPARATOR))
    }

    pub fn from_labels<'a, I: IntoIterator<Item = &'a str>>(labels: I) -> Self {
        Self {
            labels: labels
                .into_iter()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether ion `<series><index>` or one of its variants was matched.
    ///
    /// Index 0 denotes a fragment that does not exist and is never matched.
    pub fn is_matched(&self, series: char, index: usize) -> bool {
        if index == 0 {
            return false;
        }

        let ion = format!("{series}{index}");
        ION_VARIANTS
            .iter()
            .any(|variant| self.labels.contains(&format!("{ion}{variant}")))
    }
}

/// Finds the peptide positions supported by fragment ions.
///
/// For position `i` of a peptide of length `n`, the ions flanking the residue
/// are `b(i)`/`b(i+1)` on the N-terminal side and `y(n-i-1)`/`y(n-i)` on the
/// C-terminal side. The full-length fragments `y(n)` at the first position and
/// `b(n)` at the last position are implied by the precursor and always count
/// as matched.
///
/// # Arguments
///
/// * `peptide` - The matched peptide sequence.
/// * `ions` - The matched fragment ions of the spectrum.
///
/// # Returns
///
/// The supported 0-indexed positions, ascending.
///
/// # Example
///
/// ```rust, ignore
/// let ions = FragmentIons::parse("b1;b2;y5");
/// let positions = supported_positions("PEPTIDE", &ions);
/// ```
pub fn supported_positions(peptide: &str, ions: &FragmentIons) -> Vec<usize> {
    let n = peptide.len();

    (0..n)
        .filter(|&i| {
            let mut b = ions.is_matched(B_SERIES, i + 1);
            let b_prev = ions.is_matched(B_SERIES, i);
            let mut y = ions.is_matched(Y_SERIES, n - i);
            let y_prev = ions.is_matched(Y_SERIES, n - i - 1);

            if i == 0 {
                y = true;
            }
            if i == n - 1 {
                b = true;
            }

            (y_prev && y) || (b_prev && b) || (b && y) || (y_prev && b_prev)
        })
        .collect()
}
