//! Tags derived from message text: cited legal sources and topic categories.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SOURCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bSection \d+[A-Z]*",
        r"(?i)\bMotor Vehicles? Act,? \d{4}",
        r"(?i)\bCentral Motor Vehicle Rules,? \d{4}",
        r"(?i)\bRule \d+",
        r"(?i)\bArticle \d+",
        r"(?i)\bChapter [IVX]+\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Legal references in `text`, de-duplicated, in the order they first appear.
pub fn extract_legal_sources(text: &str) -> Vec<String> {
    let mut matches: Vec<(usize, &str)> = SOURCE_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(text).map(|m| (m.start(), m.as_str())))
        .collect();
    // Stable, so a tie on position keeps pattern order.
    matches.sort_by_key(|(start, _)| *start);

    let mut sources: Vec<String> = Vec::new();
    for (_, source) in matches {
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }
    sources
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalCategory {
    TrafficViolations,
    FinesPenalties,
    LicenseRegistration,
    Insurance,
    Accidents,
    Documents,
    PoliceProcedures,
    CourtLegal,
}

impl LegalCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrafficViolations => "traffic_violations",
            Self::FinesPenalties => "fines_penalties",
            Self::LicenseRegistration => "license_registration",
            Self::Insurance => "insurance",
            Self::Accidents => "accidents",
            Self::Documents => "documents",
            Self::PoliceProcedures => "police_procedures",
            Self::CourtLegal => "court_legal",
        }
    }
}

const CATEGORY_KEYWORDS: &[(LegalCategory, &[&str])] = &[
    (
        LegalCategory::TrafficViolations,
        &["speed", "red light", "signal", "violation", "challan"],
    ),
    (
        LegalCategory::FinesPenalties,
        &["fine", "penalty", "amount", "pay", "fee"],
    ),
    (
        LegalCategory::LicenseRegistration,
        &["license", "licence", "registration", "rc", "dl", "permit"],
    ),
    (
        LegalCategory::Insurance,
        &["insurance", "claim", "policy", "coverage"],
    ),
    (
        LegalCategory::Accidents,
        &["accident", "crash", "collision", "hit", "damage"],
    ),
    (
        LegalCategory::Documents,
        &["documents", "papers", "certificate", "proof"],
    ),
    (
        LegalCategory::PoliceProcedures,
        &["police", "officer", "stop", "check", "procedure"],
    ),
    (
        LegalCategory::CourtLegal,
        &["court", "legal", "lawyer", "case", "hearing"],
    ),
];

// Keywords match at a word start, so "dl" does not fire inside "handle".
static CATEGORY_PATTERNS: LazyLock<Vec<(LegalCategory, Regex)>> = LazyLock::new(|| {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"(?i)\b(?:{})", alternation)).expect("static regex");
            (*category, re)
        })
        .collect()
});

/// Topic categories mentioned in `text`, in table order.
pub fn extract_legal_categories(text: &str) -> Vec<LegalCategory> {
    CATEGORY_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(category, _)| *category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_are_deduplicated_in_order() {
        let text = "Under Section 129 of the Motor Vehicles Act, 1988 and section 129 again, \
                    see Rule 138 of the Central Motor Vehicle Rules 1989. Section 194D applies.";
        assert_eq!(
            extract_legal_sources(text),
            vec![
                "Section 129",
                "Motor Vehicles Act, 1988",
                "section 129",
                "Rule 138",
                "Central Motor Vehicle Rules 1989",
                "Section 194D",
            ]
        );
    }

    #[test]
    fn test_chapter_and_article() {
        assert_eq!(
            extract_legal_sources("Chapter VIII read with Article 21"),
            vec!["Chapter VIII", "Article 21"]
        );
    }

    #[test]
    fn test_sources_follow_text_position_across_patterns() {
        let text = "Rule 3 and Article 14, then Section 5, then Rule 3 again and Article 14.";
        assert_eq!(
            extract_legal_sources(text),
            vec!["Rule 3", "Article 14", "Section 5"]
        );
    }

    #[test]
    fn test_categories() {
        let categories =
            extract_legal_categories("The police officer gave me a challan; how do I pay the fine?");
        assert_eq!(
            categories,
            vec![
                LegalCategory::TrafficViolations,
                LegalCategory::FinesPenalties,
                LegalCategory::PoliceProcedures,
            ]
        );
    }

    #[test]
    fn test_keywords_match_at_word_start() {
        assert!(extract_legal_categories("How do I handle this?").is_empty());
        assert_eq!(
            extract_legal_categories("My DL expired"),
            vec![LegalCategory::LicenseRegistration]
        );
    }
}
