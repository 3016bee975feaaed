//! Folds partial fields into one canonical [`CvRecord`].
//!
//! Deterministic for identical inputs apart from identifiers, which are fresh
//! v4 UUIDs on every run. Extractors never supply identifiers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::extraction::document::DocumentFormat;
use crate::extraction::heuristics::PartialField;
use crate::models::cv::{CvRecord, ExtractionStrategy, PersonalInfo, RecordMetadata};

/// Everything about the run that is not a field value.
#[derive(Debug, Clone)]
pub struct AssemblyContext {
    pub raw_text: String,
    pub source_format: DocumentFormat,
    pub extracted_at: DateTime<Utc>,
    pub strategy: ExtractionStrategy,
    pub warnings: Vec<String>,
}

impl AssemblyContext {
    pub fn new(raw_text: String, source_format: DocumentFormat, strategy: ExtractionStrategy) -> Self {
        AssemblyContext {
            raw_text,
            source_format,
            extracted_at: Utc::now(),
            strategy,
            warnings: Vec::new(),
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Keeps the first item per case-insensitive name.
fn dedup_by_name<T>(items: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = name(item).trim().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

pub fn assemble(fields: Vec<PartialField>, context: AssemblyContext) -> CvRecord {
    let mut record = CvRecord {
        personal_info: PersonalInfo::default(),
        experience: Vec::new(),
        education: Vec::new(),
        skills: Vec::new(),
        languages: Vec::new(),
        interests: Vec::new(),
        projects: Vec::new(),
        certifications: Vec::new(),
        metadata: RecordMetadata {
            character_count: context.raw_text.chars().count(),
            extracted_at: context.extracted_at,
            source_format: context.source_format,
            strategy: context.strategy,
            warnings: context.warnings,
        },
        raw_text: context.raw_text,
    };

    let info = &mut record.personal_info;
    for field in fields {
        match field {
            PartialField::Name(name) => {
                info.title = name.title;
                info.full_name = name.full_name;
                info.first_name = name.first_name;
                info.last_name = name.last_name;
            }
            PartialField::Email(email) => info.email = email,
            PartialField::Phone(phone) => info.phone = phone,
            PartialField::BirthDate(date) => info.birth_date = date,
            PartialField::Address(address) => {
                info.address = address.street;
                info.postal_code = address.postal_code;
                info.city = address.city;
                info.country = address.country;
            }
            PartialField::Links(links) => {
                info.linkedin = links.linkedin;
                info.github = links.github;
                info.website = links.website;
            }
            PartialField::Experience(entries) => record.experience = entries,
            PartialField::Education(entries) => record.education = entries,
            PartialField::Skills(skills) => record.skills = skills,
            PartialField::Languages(languages) => record.languages = languages,
            PartialField::Interests(interests) => record.interests = interests,
            PartialField::Projects(projects) => record.projects = projects,
            PartialField::Certifications(certifications) => record.certifications = certifications,
        }
    }

    if info.full_name.is_empty() && !(info.first_name.is_empty() && info.last_name.is_empty()) {
        info.full_name = format!("{} {}", info.first_name, info.last_name)
            .trim()
            .to_string();
    }

    record.skills = dedup_by_name(std::mem::take(&mut record.skills), |s| &s.name);
    record.languages = dedup_by_name(std::mem::take(&mut record.languages), |l| &l.name);
    record.interests = dedup_by_name(std::mem::take(&mut record.interests), |i| &i.name);

    for entry in &mut record.experience {
        entry.id = new_id();
    }
    for skill in &mut record.skills {
        skill.id = new_id();
    }
    for language in &mut record.languages {
        language.id = new_id();
    }
    for interest in &mut record.interests {
        interest.id = new_id();
    }
    for project in &mut record.projects {
        project.id = new_id();
    }
    for certification in &mut record.certifications {
        certification.id = new_id();
    }

    record
}
