//! AI Extraction Client — asks the completion service for a whole record and
//! validates the answer before anything downstream sees it.
//!
//! The response is untrusted input. It is decoded in two steps: text to JSON
//! (failure means the service misbehaved, `Unknown`) and JSON to the wire
//! schema (failure is a `Validation` error). Every top-level collection is a
//! required key; scalar leaves are lenient about `null` and numbers.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::extraction::contact::{AddressParts, NameParts, ProfileLinks};
use crate::extraction::heuristics::PartialField;
use crate::extraction::prompts::{
    CV_EXTRACT_PROMPT, CV_EXTRACT_SYSTEM, CV_REFINE_PROMPT, CV_SCHEMA,
};
use crate::extraction::vocabulary::skill_category;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::{strip_json_fences, AiServiceErrorKind, CompletionService, LlmError};
use crate::models::cv::{
    Certification, CvRecord, EducationEntry, ExperienceEntry, Interest, Language, Project, Skill,
    SkillCategory,
};

/// Longest CV text sent to the model, in chars.
const MAX_PROMPT_TEXT_CHARS: usize = 24_000;

#[derive(Debug, Error)]
pub enum AiExtractionError {
    #[error("AI service error ({kind}): {1}", kind = .0.as_str())]
    Service(AiServiceErrorKind, String),

    #[error("AI response does not match the CV schema: {0}")]
    Validation(String),
}

impl From<LlmError> for AiExtractionError {
    fn from(e: LlmError) -> Self {
        AiExtractionError::Service(e.kind(), e.to_string())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WirePersonalInfo {
    #[serde(deserialize_with = "lenient_string")]
    title: String,
    #[serde(deserialize_with = "lenient_string")]
    full_name: String,
    #[serde(deserialize_with = "lenient_string")]
    first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    email: String,
    #[serde(deserialize_with = "lenient_string")]
    phone: String,
    #[serde(deserialize_with = "lenient_string")]
    birth_date: String,
    #[serde(deserialize_with = "lenient_string")]
    address: String,
    #[serde(deserialize_with = "lenient_string")]
    city: String,
    #[serde(deserialize_with = "lenient_string")]
    postal_code: String,
    #[serde(deserialize_with = "lenient_string")]
    country: String,
    #[serde(deserialize_with = "lenient_string")]
    linkedin: String,
    #[serde(deserialize_with = "lenient_string")]
    github: String,
    #[serde(deserialize_with = "lenient_string")]
    website: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireExperience {
    #[serde(deserialize_with = "lenient_string")]
    company: String,
    #[serde(deserialize_with = "lenient_string")]
    position: String,
    #[serde(deserialize_with = "lenient_string")]
    location: String,
    #[serde(deserialize_with = "lenient_string")]
    start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    end_date: String,
    #[serde(deserialize_with = "lenient_string")]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireEducation {
    #[serde(deserialize_with = "lenient_string")]
    degree: String,
    #[serde(deserialize_with = "lenient_string")]
    institution: String,
    #[serde(deserialize_with = "lenient_string")]
    field: String,
    #[serde(deserialize_with = "lenient_string")]
    year: String,
    #[serde(deserialize_with = "lenient_string")]
    location: String,
    #[serde(deserialize_with = "lenient_string")]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSkillObject {
    #[serde(deserialize_with = "lenient_string")]
    name: String,
    #[serde(deserialize_with = "lenient_string")]
    level: String,
    #[serde(deserialize_with = "lenient_string")]
    category: String,
}

/// Models answer either `"Rust"` or `{"name": "Rust", ...}` for list items.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireSkill {
    Name(String),
    Full(WireSkillObject),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireLanguageObject {
    #[serde(deserialize_with = "lenient_string")]
    name: String,
    #[serde(deserialize_with = "lenient_string")]
    level: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireLanguage {
    Name(String),
    Full(WireLanguageObject),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireInterestObject {
    #[serde(deserialize_with = "lenient_string")]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireInterest {
    Name(String),
    Full(WireInterestObject),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireProject {
    #[serde(deserialize_with = "lenient_string")]
    name: String,
    #[serde(deserialize_with = "lenient_string")]
    description: String,
    #[serde(deserialize_with = "lenient_strings")]
    technologies: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    url: String,
    #[serde(deserialize_with = "lenient_string")]
    start_date: String,
    #[serde(deserialize_with = "lenient_string")]
    end_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireCertification {
    #[serde(deserialize_with = "lenient_string")]
    name: String,
    #[serde(deserialize_with = "lenient_string")]
    issuer: String,
    #[serde(deserialize_with = "lenient_string")]
    date: String,
}

/// The answer as the model must shape it. Top-level keys are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    personal_info: WirePersonalInfo,
    experience: Vec<WireExperience>,
    education: Vec<WireEducation>,
    skills: Vec<WireSkill>,
    languages: Vec<WireLanguage>,
    interests: Vec<WireInterest>,
    projects: Vec<WireProject>,
    certifications: Vec<WireCertification>,
}

fn parse_category(raw: &str, name: &str) -> SkillCategory {
    match raw.to_ascii_lowercase().as_str() {
        "technical" | "technique" => SkillCategory::Technical,
        "soft" => SkillCategory::Soft,
        "tool" | "tools" | "outil" => SkillCategory::Tool,
        _ => skill_category(name),
    }
}

impl WireRecord {
    /// Converts to partial fields. Items without a name are dropped.
    fn into_fields(self) -> Vec<PartialField> {
        let p = self.personal_info;
        vec![
            PartialField::Name(NameParts {
                title: p.title,
                full_name: p.full_name,
                first_name: p.first_name,
                last_name: p.last_name,
            }),
            PartialField::Email(p.email),
            PartialField::Phone(p.phone),
            PartialField::BirthDate(p.birth_date),
            PartialField::Address(AddressParts {
                street: p.address,
                postal_code: p.postal_code,
                city: p.city,
                country: p.country,
            }),
            PartialField::Links(ProfileLinks {
                linkedin: p.linkedin,
                github: p.github,
                website: p.website,
            }),
            PartialField::Experience(
                self.experience
                    .into_iter()
                    .filter(|e| !(e.company.is_empty() && e.position.is_empty()))
                    .map(|e| ExperienceEntry {
                        id: String::new(),
                        company: e.company,
                        position: e.position,
                        location: e.location,
                        start_date: e.start_date,
                        end_date: e.end_date,
                        description: e.description,
                    })
                    .collect(),
            ),
            PartialField::Education(
                self.education
                    .into_iter()
                    .filter(|e| !(e.degree.is_empty() && e.institution.is_empty()))
                    .map(|e| EducationEntry {
                        degree: e.degree,
                        institution: e.institution,
                        field: e.field,
                        year: e.year,
                        location: e.location,
                        description: e.description,
                    })
                    .collect(),
            ),
            PartialField::Skills(
                self.skills
                    .into_iter()
                    .map(|s| match s {
                        WireSkill::Name(name) => WireSkillObject {
                            name: name.trim().to_string(),
                            ..Default::default()
                        },
                        WireSkill::Full(full) => full,
                    })
                    .filter(|s| !s.name.is_empty())
                    .map(|s| Skill {
                        id: String::new(),
                        category: parse_category(&s.category, &s.name),
                        name: s.name,
                        level: s.level,
                    })
                    .collect(),
            ),
            PartialField::Languages(
                self.languages
                    .into_iter()
                    .map(|l| match l {
                        WireLanguage::Name(name) => WireLanguageObject {
                            name: name.trim().to_string(),
                            ..Default::default()
                        },
                        WireLanguage::Full(full) => full,
                    })
                    .filter(|l| !l.name.is_empty())
                    .map(|l| Language {
                        id: String::new(),
                        name: l.name,
                        level: l.level,
                    })
                    .collect(),
            ),
            PartialField::Interests(
                self.interests
                    .into_iter()
                    .map(|i| match i {
                        WireInterest::Name(name) => name.trim().to_string(),
                        WireInterest::Full(full) => full.name,
                    })
                    .filter(|name| !name.is_empty())
                    .map(|name| Interest {
                        id: String::new(),
                        name,
                    })
                    .collect(),
            ),
            PartialField::Projects(
                self.projects
                    .into_iter()
                    .filter(|p| !p.name.is_empty())
                    .map(|p| Project {
                        id: String::new(),
                        name: p.name,
                        description: p.description,
                        technologies: p.technologies,
                        url: p.url,
                        start_date: p.start_date,
                        end_date: p.end_date,
                    })
                    .collect(),
            ),
            PartialField::Certifications(
                self.certifications
                    .into_iter()
                    .filter(|c| !c.name.is_empty())
                    .map(|c| Certification {
                        id: String::new(),
                        name: c.name,
                        issuer: c.issuer,
                        date: c.date,
                    })
                    .collect(),
            ),
        ]
    }
}

/// Decodes and validates one model answer.
pub fn parse_response(text: &str) -> Result<Vec<PartialField>, AiExtractionError> {
    let value: Value = serde_json::from_str(strip_json_fences(text)).map_err(|e| {
        AiExtractionError::Service(
            AiServiceErrorKind::Unknown,
            format!("AI response is not JSON: {e}"),
        )
    })?;
    if !value.is_object() {
        return Err(AiExtractionError::Validation(
            "expected a JSON object at the top level".to_string(),
        ));
    }
    let record: WireRecord =
        serde_json::from_value(value).map_err(|e| AiExtractionError::Validation(e.to_string()))?;
    Ok(record.into_fields())
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The draft as shown to the model: field values only, no ids or metadata.
fn draft_json(draft: &CvRecord) -> String {
    let value = json!({
        "personalInfo": draft.personal_info,
        "experience": draft.experience.iter().map(|e| json!({
            "company": e.company, "position": e.position, "location": e.location,
            "startDate": e.start_date, "endDate": e.end_date, "description": e.description,
        })).collect::<Vec<_>>(),
        "education": draft.education,
        "skills": draft.skills.iter().map(|s| json!({
            "name": s.name, "level": s.level, "category": s.category,
        })).collect::<Vec<_>>(),
        "languages": draft.languages.iter().map(|l| json!({"name": l.name, "level": l.level})).collect::<Vec<_>>(),
        "interests": draft.interests.iter().map(|i| json!({"name": i.name})).collect::<Vec<_>>(),
        "projects": draft.projects.iter().map(|p| json!({
            "name": p.name, "description": p.description, "technologies": p.technologies,
            "url": p.url, "startDate": p.start_date, "endDate": p.end_date,
        })).collect::<Vec<_>>(),
        "certifications": draft.certifications.iter().map(|c| json!({
            "name": c.name, "issuer": c.issuer, "date": c.date,
        })).collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// Fills `{name}` placeholders in one pass over the template. Inserted values
/// are never rescanned, so braces in the CV text or the draft stay literal.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let known = tail.find('}').and_then(|close| {
            values
                .iter()
                .find(|(name, _)| *name == &tail[1..close])
                .map(|(_, value)| (*value, close))
        });
        match known {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn fill_prompt(template: &str, text: &str, draft: &str) -> String {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    fill_placeholders(
        template,
        &[
            ("schema", CV_SCHEMA),
            ("no_invention", NO_INVENTION_INSTRUCTION.trim()),
            ("today", today.as_str()),
            ("raw_text", truncate_chars(text, MAX_PROMPT_TEXT_CHARS)),
            ("draft", draft),
        ],
    )
}

/// Sends CV text to the completion service and validates the structured answer.
/// No retries here; the orchestrator owns the retry policy.
#[derive(Clone)]
pub struct AiExtractionClient {
    service: Arc<dyn CompletionService>,
}

impl AiExtractionClient {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    fn system_prompt() -> String {
        format!("{CV_EXTRACT_SYSTEM} {JSON_ONLY_SYSTEM}")
    }

    /// Full extraction from text alone.
    pub async fn extract(&self, text: &str) -> Result<Vec<PartialField>, AiExtractionError> {
        let prompt = fill_prompt(CV_EXTRACT_PROMPT, text, "");
        let answer = self.service.complete(&Self::system_prompt(), &prompt).await?;
        debug!("AI extraction answered with {} chars", answer.len());
        parse_response(&answer)
    }

    /// Secondary mode: the model corrects a previously extracted record.
    pub async fn refine(
        &self,
        text: &str,
        draft: &CvRecord,
    ) -> Result<Vec<PartialField>, AiExtractionError> {
        let prompt = fill_prompt(CV_REFINE_PROMPT, text, &draft_json(draft));
        let answer = self.service.complete(&Self::system_prompt(), &prompt).await?;
        debug!("AI refinement answered with {} chars", answer.len());
        parse_response(&answer)
    }
}
