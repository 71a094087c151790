use std::cmp::Ordering;

use crate::entry::DirEntry;
use crate::unit::NameUnit;

/// Compare entry names unit by unit (byte order for narrow names, UTF-16
/// code unit order for wide ones). No locale is consulted.
pub fn alphasort<C: NameUnit>(a: &DirEntry<C>, b: &DirEntry<C>) -> Ordering {
    C::collate(a.name(), b.name())
}

/// Compare entry names as version strings, see [`strverscmp`].
pub fn versionsort<C: NameUnit>(a: &DirEntry<C>, b: &DirEntry<C>) -> Ordering {
    strverscmp(a.name(), b.name())
}

pub fn walphasort(a: &DirEntry<u16>, b: &DirEntry<u16>) -> Ordering {
    alphasort(a, b)
}

pub fn wversionsort(a: &DirEntry<u16>, b: &DirEntry<u16>) -> Ordering {
    versionsort(a, b)
}

/// Version-aware string comparison.
///
/// Digit runs compare by numeric magnitude (`img2 < img10`), except that a
/// run with leading zeros is treated as a fraction and sorts before the
/// same prefix without them (`a01 < a1`, `v001 < v01`).
pub fn strverscmp<C: NameUnit>(a: &[C], b: &[C]) -> Ordering {
    // Slices end with an implicit terminator
    let at = |s: &[C], i: usize| s.get(i).copied().unwrap_or(C::NUL);

    let mut i = 0;
    while at(a, i) == at(b, i) {
        if at(a, i) == C::NUL {
            return Ordering::Equal;
        }
        i += 1;
    }

    // Back up to the start of the digit run containing the difference
    let mut j = i;
    while j > 0 && at(a, j - 1).is_digit() {
        j -= 1;
    }

    if at(a, j).is_zero() || at(b, j).is_zero() {
        while at(a, j).is_zero() && at(a, j) == at(b, j) {
            j += 1;
        }
        if at(a, j).is_digit() {
            if !at(b, j).is_digit() {
                return Ordering::Less;
            }
        } else if at(b, j).is_digit() {
            return Ordering::Greater;
        }
    } else if at(a, j).is_digit() && at(b, j).is_digit() {
        let run = |s: &[C]| (j..).take_while(|&k| at(s, k).is_digit()).count();
        match run(a).cmp(&run(b)) {
            Ordering::Equal => {}
            longer_or_shorter => return longer_or_shorter,
        }
    }

    at(a, i).cmp(&at(b, i))
}
