use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Media category of an indexed file
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    EnumIter,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MediaType {
    Video,
    Document,
    Photo,
    Audio,
    Animation,
    #[default]
    Unknown,
}

impl MediaType {
    /// Parse raw upstream type text, degrading anything unrecognized to `Unknown`
    pub fn parse_lossy(raw: &str) -> Self {
        MediaType::from_str(raw.trim()).unwrap_or(MediaType::Unknown)
    }

    /// Types that take part in discovery (everything except `Unknown`)
    pub fn eligible() -> Vec<MediaType> {
        MediaType::iter().filter(|t| t.is_eligible()).collect()
    }

    pub fn is_eligible(&self) -> bool {
        !matches!(self, MediaType::Unknown)
    }

    /// Ranking bonus used by the random discovery quality score
    pub fn type_bonus(&self) -> f64 {
        match self {
            MediaType::Video | MediaType::Animation => 2.0,
            MediaType::Document => 1.5,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lossy() {
        assert_eq!(MediaType::parse_lossy("video"), MediaType::Video);
        assert_eq!(MediaType::parse_lossy(" Document "), MediaType::Document);
        assert_eq!(MediaType::parse_lossy("ANIMATION"), MediaType::Animation);
        assert_eq!(MediaType::parse_lossy("sticker"), MediaType::Unknown);
        assert_eq!(MediaType::parse_lossy(""), MediaType::Unknown);
    }

    #[test]
    fn test_eligible_excludes_unknown() {
        let eligible = MediaType::eligible();
        assert_eq!(eligible.len(), 5);
        assert!(!eligible.contains(&MediaType::Unknown));
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(MediaType::Photo.to_string(), "photo");
        assert_eq!(MediaType::Unknown.to_string(), "unknown");
    }
}
