// Season codes and the previous/current period split.
//
// Season text shows up in several spellings across the exports ("25S",
// "25SS", "25F", "25FW"). Everything is funneled through `normalize` so the
// rest of the code only ever compares the short form.
use crate::error::{ReportError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    Spring,
    Fall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Season {
    pub year: u8,
    pub half: Half,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Previous,
    Current,
}

/// Uppercase, trim, and collapse the long suffixes: `25SS` -> `25S`,
/// `25FW` -> `25F`. Unknown strings pass through uppercased.
pub fn normalize(raw: &str) -> String {
    let s = raw.trim().to_uppercase();
    if let Some(stem) = s.strip_suffix("SS") {
        return format!("{}S", stem);
    }
    if let Some(stem) = s.strip_suffix("FW") {
        return format!("{}F", stem);
    }
    s
}

impl Season {
    pub fn parse(raw: &str) -> Result<Season> {
        let s = normalize(raw);
        let invalid = || ReportError::InvalidSeason(raw.to_string());
        let (digits, half) = if let Some(d) = s.strip_suffix('S') {
            (d, Half::Spring)
        } else if let Some(d) = s.strip_suffix('F') {
            (d, Half::Fall)
        } else {
            return Err(invalid());
        };
        if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = digits.parse::<u8>().map_err(|_| invalid())?;
        Ok(Season { year, half })
    }

    pub fn previous(&self) -> Option<Season> {
        self.year.checked_sub(1).map(|year| Season {
            year,
            half: self.half,
        })
    }

    /// Long form used in output file names (`26SS`, `25FW`).
    pub fn long_code(&self) -> String {
        match self.half {
            Half::Spring => format!("{:02}SS", self.year),
            Half::Fall => format!("{:02}FW", self.year),
        }
    }

    /// Folder names under the data root that may hold this season's files,
    /// most specific first.
    pub fn folder_candidates(&self) -> Vec<String> {
        vec![self.long_code(), self.to_string()]
    }

    pub fn file_candidates(&self, brand: &str) -> Vec<String> {
        vec![
            format!("{}_{}.csv", brand, self),
            format!("{}_{}.csv", brand, self.long_code()),
        ]
    }

    pub fn matches(&self, raw: &str) -> bool {
        normalize(raw) == self.to_string()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.half {
            Half::Spring => 'S',
            Half::Fall => 'F',
        };
        write!(f, "{:02}{}", self.year, suffix)
    }
}

impl Period {
    pub fn classify(raw: &str, current: Season, previous: Option<Season>) -> Option<Period> {
        if current.matches(raw) {
            return Some(Period::Current);
        }
        match previous {
            Some(prev) if prev.matches(raw) => Some(Period::Previous),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(Season::parse("25F").unwrap(), Season { year: 25, half: Half::Fall });
        assert_eq!(Season::parse(" 25fw ").unwrap(), Season { year: 25, half: Half::Fall });
        assert_eq!(Season::parse("26SS").unwrap(), Season { year: 26, half: Half::Spring });
        assert_eq!(Season::parse("26S").unwrap().to_string(), "26S");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Season::parse("").is_err());
        assert!(Season::parse("2025F").is_err());
        assert!(Season::parse("25X").is_err());
        assert!(Season::parse("AAS").is_err());
    }

    #[test]
    fn previous_keeps_half() {
        let s = Season::parse("26SS").unwrap();
        assert_eq!(s.previous().unwrap().to_string(), "25S");
        assert_eq!(Season::parse("00F").unwrap().previous(), None);
    }

    #[test]
    fn classify_uses_normalized_text() {
        let cur = Season::parse("25F").unwrap();
        let prev = cur.previous();
        assert_eq!(Period::classify("25FW", cur, prev), Some(Period::Current));
        assert_eq!(Period::classify("24f", cur, prev), Some(Period::Previous));
        assert_eq!(Period::classify("25S", cur, prev), None);
    }

    #[test]
    fn candidates_cover_both_layouts() {
        let s = Season::parse("26S").unwrap();
        assert_eq!(s.folder_candidates(), vec!["26SS", "26S"]);
        assert_eq!(s.file_candidates("M"), vec!["M_26S.csv", "M_26SS.csv"]);
    }
}
