//! Structural ranks.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Deepest section nesting below a chapter-ranked element.
pub const MAX_SECTION_NESTING_LEVEL: u8 = 3;

/// Coarse structural importance of a document-structure element.
///
/// Ordered from least to most important: a deeper section has a *lower* rank,
/// so `rank >= threshold` selects the threshold level and everything above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Simplesect,
    Section3,
    Section2,
    Section1,
    Chapter,
    Part,
    Book,
}

impl Rank {
    /// Rank of a section nested `level` deep under a chapter-ranked element
    /// (1-based).
    pub fn section(level: u8) -> Option<Rank> {
        match level {
            1 => Some(Rank::Section1),
            2 => Some(Rank::Section2),
            3 => Some(Rank::Section3),
            _ => None,
        }
    }

    /// Nesting level for section ranks, 0 for anything else.
    pub fn section_level(self) -> u8 {
        match self {
            Rank::Section1 => 1,
            Rank::Section2 => 2,
            Rank::Section3 => 3,
            _ => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Simplesect => "simplesect",
            Rank::Section3 => "section3",
            Rank::Section2 => "section2",
            Rank::Section1 => "section1",
            Rank::Chapter => "chapter",
            Rank::Part => "part",
            Rank::Book => "book",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simplesect" => Ok(Rank::Simplesect),
            "section3" => Ok(Rank::Section3),
            "section2" => Ok(Rank::Section2),
            "section1" => Ok(Rank::Section1),
            "chapter" => Ok(Rank::Chapter),
            "part" => Ok(Rank::Part),
            "book" => Ok(Rank::Book),
            other => Err(Error::Config(format!(
                "unknown rank {other:?}; expected one of \"simplesect\", \"section3\", \
                 \"section2\", \"section1\", \"chapter\", \"part\", \"book\""
            ))),
        }
    }
}

#[cfg(feature = "cli")]
impl<'de> serde::Deserialize<'de> for Rank {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "cli")]
impl serde::Serialize for Rank {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Rank::Simplesect < Rank::Section3);
        assert!(Rank::Section3 < Rank::Section2);
        assert!(Rank::Section2 < Rank::Section1);
        assert!(Rank::Section1 < Rank::Chapter);
        assert!(Rank::Chapter < Rank::Part);
        assert!(Rank::Part < Rank::Book);
    }

    #[test]
    fn test_section_levels() {
        for level in 1..=MAX_SECTION_NESTING_LEVEL {
            let rank = Rank::section(level).unwrap();
            assert_eq!(rank.section_level(), level);
        }
        assert_eq!(Rank::section(0), None);
        assert_eq!(Rank::section(MAX_SECTION_NESTING_LEVEL + 1), None);
        assert_eq!(Rank::Chapter.section_level(), 0);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("section2".parse::<Rank>().unwrap(), Rank::Section2);
        assert_eq!(" Chapter ".parse::<Rank>().unwrap(), Rank::Chapter);
        assert_eq!(Rank::Section1.to_string(), "section1");
        assert!(matches!("sect1".parse::<Rank>(), Err(Error::Config(_))));
    }
}
