//! Canonical CV record — the single structured shape every extraction path produces.
//!
//! Absence is always an empty string or empty vector. Every field carries
//! `#[serde(default)]` so a record serialized by an older build still loads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extraction::document::DocumentFormat;

/// How a record was produced. Selected per invocation, never persisted by the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    HeuristicOnly,
    AiOnly,
    AiAugmented,
}

impl ExtractionStrategy {
    pub const ALL: [ExtractionStrategy; 3] = [
        ExtractionStrategy::HeuristicOnly,
        ExtractionStrategy::AiOnly,
        ExtractionStrategy::AiAugmented,
    ];

    /// Short name accepted on the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::HeuristicOnly => "heuristic",
            ExtractionStrategy::AiOnly => "ai",
            ExtractionStrategy::AiAugmented => "augmented",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "heuristic_only" | "heuristiconly" => Some(Self::HeuristicOnly),
            "ai" | "ai_only" | "aionly" => Some(Self::AiOnly),
            "augmented" | "ai_augmented" | "aiaugmented" => Some(Self::AiAugmented),
            _ => None,
        }
    }

    pub fn uses_ai(&self) -> bool {
        !matches!(self, ExtractionStrategy::HeuristicOnly)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    /// Salutation such as "M.", "Mme", "Dr".
    pub title: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub id: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub field: String,
    pub year: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Technical,
    Soft,
    Tool,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub level: String,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    pub id: String,
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    /// Character count of `raw_text` (Unicode scalar values, not bytes).
    pub character_count: usize,
    pub extracted_at: DateTime<Utc>,
    pub source_format: DocumentFormat,
    #[serde(default)]
    pub strategy: ExtractionStrategy,
    /// Degraded outcomes worth surfacing, e.g. an AI fallback under `AiAugmented`.
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvRecord {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub interests: Vec<Interest>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    pub raw_text: String,
    pub metadata: RecordMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CvRecord {
        CvRecord {
            personal_info: PersonalInfo {
                full_name: "Jean Dupont".to_string(),
                email: "jean.dupont@example.com".to_string(),
                ..Default::default()
            },
            experience: vec![ExperienceEntry {
                id: "exp-1".to_string(),
                company: "Google".to_string(),
                position: "Développeur Senior".to_string(),
                start_date: "2020".to_string(),
                end_date: "2023".to_string(),
                ..Default::default()
            }],
            education: vec![],
            skills: vec![Skill {
                id: "s-1".to_string(),
                name: "Rust".to_string(),
                level: String::new(),
                category: SkillCategory::Technical,
            }],
            languages: vec![],
            interests: vec![],
            projects: vec![],
            certifications: vec![],
            raw_text: "Jean Dupont\njean.dupont@example.com".to_string(),
            metadata: RecordMetadata {
                character_count: 35,
                extracted_at: Utc::now(),
                source_format: DocumentFormat::Pdf,
                strategy: ExtractionStrategy::HeuristicOnly,
                warnings: vec![],
            },
        }
    }

    #[test]
    fn test_record_json_roundtrip_keeps_empty_arrays() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();

        assert!(json["education"].as_array().unwrap().is_empty());
        assert!(json["certifications"].as_array().unwrap().is_empty());
        assert_eq!(json["personalInfo"]["phone"], "");

        let back: CvRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_personal_info_uses_camel_case_keys() {
        let json = serde_json::to_value(PersonalInfo::default()).unwrap();
        assert!(json.get("fullName").is_some());
        assert!(json.get("birthDate").is_some());
        assert!(json.get("full_name").is_none());
    }

    #[test]
    fn test_unspecified_skill_category_serializes_as_empty_string() {
        let json = serde_json::to_value(Skill::default()).unwrap();
        assert_eq!(json["category"], "");
        let skill: Skill = serde_json::from_value(json).unwrap();
        assert_eq!(skill.category, SkillCategory::Unspecified);
    }

    #[test]
    fn test_strategy_parse_accepts_short_and_long_names() {
        assert_eq!(
            ExtractionStrategy::parse("augmented"),
            Some(ExtractionStrategy::AiAugmented)
        );
        assert_eq!(
            ExtractionStrategy::parse("AI_ONLY"),
            Some(ExtractionStrategy::AiOnly)
        );
        assert_eq!(ExtractionStrategy::parse("magic"), None);
        for strategy in ExtractionStrategy::ALL {
            assert_eq!(ExtractionStrategy::parse(strategy.as_str()), Some(strategy));
        }
    }
}
