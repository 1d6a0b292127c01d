//! RPM-style name/epoch/version/release/arch types and comparison.
//!
//! [`Evr`] implements the classic `rpmvercmp` segment comparison used by
//! every RPM-family tool to order package versions; [`Nevra`] is the
//! `name-version-release.arch` specifier format used throughout the
//! selection engine ([`crate::selection`]) and in textual output.

use std::cmp::Ordering;
use std::fmt;

/// Epoch/version/release triple, compared the way `rpmvercmp` compares it:
/// epoch first (numeric, missing == 0), then version, then release, each
/// using segment-wise alnum comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Evr {
    pub epoch: u32,
    pub version: String,
    pub release: String,
}

impl Evr {
    pub fn new(epoch: u32, version: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            epoch,
            version: version.into(),
            release: release.into(),
        }
    }

    /// Parse `[epoch:]version-release`. Missing epoch defaults to 0.
    pub fn parse(s: &str) -> Option<Self> {
        let (epoch, rest) = match s.split_once(':') {
            Some((e, rest)) => (e.parse().ok()?, rest),
            None => (0, s),
        };
        let (version, release) = rest.rsplit_once('-')?;
        Some(Self::new(epoch, version, release))
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}-{}", self.version, self.release)
    }
}

impl PartialOrd for Evr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Evr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| rpmvercmp(&self.version, &other.version))
            .then_with(|| rpmvercmp(&self.release, &other.release))
    }
}

/// Segment a version string into alternating runs of digits and
/// non-digits, the way `rpmvercmp` does, dropping anything that is
/// neither (separators like `.` and `_`).
fn segments(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            out.push(&s[start..i]);
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            out.push(&s[start..i]);
        } else {
            i += 1;
        }
    }
    out
}

/// Compare two RPM version/release strings using the classic segment
/// algorithm: numeric segments compare numerically (leading zeros
/// stripped, longer wins ties), alphabetic segments compare lexically,
/// and a numeric segment always outranks an alphabetic one. A string
/// that runs out of segments first is older.
fn rpmvercmp(a: &str, b: &str) -> Ordering {
    let sa = segments(a);
    let sb = segments(b);
    let mut i = 0;
    loop {
        match (sa.get(i), sb.get(i)) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let x_num = x.as_bytes()[0].is_ascii_digit();
                let y_num = y.as_bytes()[0].is_ascii_digit();
                let ord = match (x_num, y_num) {
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (true, true) => {
                        let xn = x.trim_start_matches('0');
                        let yn = y.trim_start_matches('0');
                        xn.len().cmp(&yn.len()).then_with(|| xn.cmp(yn))
                    }
                    (false, false) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        i += 1;
    }
}

/// A fully qualified `name-version-release.arch` specifier, as accepted
/// by the selection engine's exact-NEVRA match and emitted in output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nevra {
    pub name: String,
    pub evr: Evr,
    pub arch: String,
}

impl fmt::Display for Nevra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.evr, self.arch)
    }
}

impl Nevra {
    /// Parse `name-[epoch:]version-release.arch`. Returns `None` if the
    /// string doesn't have enough `-`/`.` separated components.
    pub fn parse(s: &str) -> Option<Self> {
        let (rest, arch) = s.rsplit_once('.')?;
        let (name_version, release) = rest.rsplit_once('-')?;
        let (name, version) = name_version.rsplit_once('-')?;
        let (epoch, version) = match version.split_once(':') {
            Some((e, v)) => (e.parse().ok()?, v),
            None => (0, version),
        };
        Some(Self {
            name: name.to_string(),
            evr: Evr::new(epoch, version, release),
            arch: arch.to_string(),
        })
    }
}

/// Shell-style glob matching (`*` and `?` only, no character classes),
/// sufficient for the selection engine's glob specifiers.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    fn rec(p: &[u8], t: &[u8]) -> bool {
        match p.first() {
            None => t.is_empty(),
            Some(b'*') => rec(&p[1..], t) || (!t.is_empty() && rec(p, &t[1..])),
            Some(b'?') => !t.is_empty() && rec(&p[1..], &t[1..]),
            Some(&c) => !t.is_empty() && t[0] == c && rec(&p[1..], &t[1..]),
        }
    }
    rec(pattern.as_bytes(), text.as_bytes())
}
