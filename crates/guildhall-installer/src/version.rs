use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric dotted version as reported by a database engine.
///
/// Only the leading `digits(.digits)*` run is significant, so
/// `10.6.12-MariaDB-1` parses as `10.6.12`. Missing trailing components
/// compare as zero: `9.6 == 9.6.0`.
#[derive(Debug, Clone)]
pub struct DatabaseVersion {
    raw: String,
    parts: Vec<u64>,
}

impl DatabaseVersion {
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    fn component(&self, i: usize) -> u64 {
        self.parts.get(i).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVersion(pub String);

impl fmt::Display for InvalidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a version number: {:?}", self.0)
    }
}

impl std::error::Error for InvalidVersion {}

impl FromStr for DatabaseVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let numeric: &str = trimmed
            .split(|c: char| !c.is_ascii_digit() && c != '.')
            .next()
            .unwrap_or("");

        let parts = numeric
            .split('.')
            .take_while(|p| !p.is_empty())
            .map(|p| p.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| InvalidVersion(s.to_string()))?;

        if parts.is_empty() {
            return Err(InvalidVersion(s.to_string()));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            parts,
        })
    }
}

impl PartialEq for DatabaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DatabaseVersion {}

impl PartialOrd for DatabaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DatabaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for DatabaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
