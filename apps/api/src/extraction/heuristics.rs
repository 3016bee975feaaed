//! Heuristic extractor registry.
//!
//! Every extractor is a plain `fn(&str) -> PartialField` with no shared state,
//! so they can run in any order (or in parallel) with identical results. The
//! AI path produces the same [`PartialField`] values, which is what lets the
//! orchestrator merge the two per field.

use tracing::debug;

use crate::extraction::contact::{
    extract_address, extract_birth_date, extract_email, extract_links, extract_name,
    extract_phone, AddressParts, NameParts, ProfileLinks,
};
use crate::extraction::education::extract_education;
use crate::extraction::experience::extract_experience;
use crate::extraction::projects::{extract_certifications, extract_projects};
use crate::extraction::sections::SectionMap;
use crate::extraction::skills::{extract_interests, extract_languages, extract_skills};
use crate::models::cv::{
    Certification, EducationEntry, ExperienceEntry, Interest, Language, Project, Skill,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Name,
    Email,
    Phone,
    BirthDate,
    Address,
    Links,
    Experience,
    Education,
    Skills,
    Languages,
    Interests,
    Projects,
    Certifications,
}

/// Output of one extractor before assembly. May be empty, never absent.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialField {
    Name(NameParts),
    Email(String),
    Phone(String),
    BirthDate(String),
    Address(AddressParts),
    Links(ProfileLinks),
    Experience(Vec<ExperienceEntry>),
    Education(Vec<EducationEntry>),
    Skills(Vec<Skill>),
    Languages(Vec<Language>),
    Interests(Vec<Interest>),
    Projects(Vec<Project>),
    Certifications(Vec<Certification>),
}

impl PartialField {
    pub fn kind(&self) -> FieldKind {
        match self {
            PartialField::Name(_) => FieldKind::Name,
            PartialField::Email(_) => FieldKind::Email,
            PartialField::Phone(_) => FieldKind::Phone,
            PartialField::BirthDate(_) => FieldKind::BirthDate,
            PartialField::Address(_) => FieldKind::Address,
            PartialField::Links(_) => FieldKind::Links,
            PartialField::Experience(_) => FieldKind::Experience,
            PartialField::Education(_) => FieldKind::Education,
            PartialField::Skills(_) => FieldKind::Skills,
            PartialField::Languages(_) => FieldKind::Languages,
            PartialField::Interests(_) => FieldKind::Interests,
            PartialField::Projects(_) => FieldKind::Projects,
            PartialField::Certifications(_) => FieldKind::Certifications,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PartialField::Name(n) => {
                n.full_name.is_empty() && n.first_name.is_empty() && n.last_name.is_empty()
            }
            PartialField::Email(s) | PartialField::Phone(s) | PartialField::BirthDate(s) => {
                s.is_empty()
            }
            PartialField::Address(a) => {
                a.street.is_empty()
                    && a.postal_code.is_empty()
                    && a.city.is_empty()
                    && a.country.is_empty()
            }
            PartialField::Links(l) => {
                l.linkedin.is_empty() && l.github.is_empty() && l.website.is_empty()
            }
            PartialField::Experience(v) => v.is_empty(),
            PartialField::Education(v) => v.is_empty(),
            PartialField::Skills(v) => v.is_empty(),
            PartialField::Languages(v) => v.is_empty(),
            PartialField::Interests(v) => v.is_empty(),
            PartialField::Projects(v) => v.is_empty(),
            PartialField::Certifications(v) => v.is_empty(),
        }
    }

    /// Combines two results for the same field, preferring `self` where it is
    /// non-empty. Composite personal fields merge per sub-field, so an AI
    /// answer with a name but no salutation keeps the heuristic salutation.
    pub fn prefer_over(self, fallback: PartialField) -> PartialField {
        fn pick(preferred: String, fallback: String) -> String {
            if preferred.trim().is_empty() {
                fallback
            } else {
                preferred
            }
        }

        match (self, fallback) {
            (PartialField::Name(a), PartialField::Name(b)) => PartialField::Name(NameParts {
                title: pick(a.title, b.title),
                full_name: pick(a.full_name, b.full_name),
                first_name: pick(a.first_name, b.first_name),
                last_name: pick(a.last_name, b.last_name),
            }),
            (PartialField::Address(a), PartialField::Address(b)) => {
                PartialField::Address(AddressParts {
                    street: pick(a.street, b.street),
                    postal_code: pick(a.postal_code, b.postal_code),
                    city: pick(a.city, b.city),
                    country: pick(a.country, b.country),
                })
            }
            (PartialField::Links(a), PartialField::Links(b)) => PartialField::Links(ProfileLinks {
                linkedin: pick(a.linkedin, b.linkedin),
                github: pick(a.github, b.github),
                website: pick(a.website, b.website),
            }),
            (preferred, fallback) => {
                if preferred.kind() != fallback.kind() || !preferred.is_empty() {
                    preferred
                } else {
                    fallback
                }
            }
        }
    }
}

pub type Extractor = fn(&str) -> PartialField;

fn name(text: &str) -> PartialField {
    PartialField::Name(extract_name(text))
}

fn email(text: &str) -> PartialField {
    PartialField::Email(extract_email(text))
}

fn phone(text: &str) -> PartialField {
    PartialField::Phone(extract_phone(text))
}

fn birth_date(text: &str) -> PartialField {
    PartialField::BirthDate(extract_birth_date(text))
}

fn address(text: &str) -> PartialField {
    PartialField::Address(extract_address(text))
}

fn links(text: &str) -> PartialField {
    PartialField::Links(extract_links(text))
}

fn experience(text: &str) -> PartialField {
    PartialField::Experience(extract_experience(text))
}

fn education(text: &str) -> PartialField {
    PartialField::Education(extract_education(text))
}

fn skills(text: &str) -> PartialField {
    PartialField::Skills(extract_skills(text))
}

fn languages(text: &str) -> PartialField {
    PartialField::Languages(extract_languages(text))
}

fn interests(text: &str) -> PartialField {
    PartialField::Interests(extract_interests(text))
}

fn projects(text: &str) -> PartialField {
    PartialField::Projects(extract_projects(text))
}

fn certifications(text: &str) -> PartialField {
    PartialField::Certifications(extract_certifications(text))
}

/// Every heuristic extractor, one per field.
pub const EXTRACTORS: &[(FieldKind, Extractor)] = &[
    (FieldKind::Name, name),
    (FieldKind::Email, email),
    (FieldKind::Phone, phone),
    (FieldKind::BirthDate, birth_date),
    (FieldKind::Address, address),
    (FieldKind::Links, links),
    (FieldKind::Experience, experience),
    (FieldKind::Education, education),
    (FieldKind::Skills, skills),
    (FieldKind::Languages, languages),
    (FieldKind::Interests, interests),
    (FieldKind::Projects, projects),
    (FieldKind::Certifications, certifications),
];

/// Runs every registered extractor over `text`, in registry order.
pub fn run_heuristics(text: &str) -> Vec<PartialField> {
    debug!(sections = ?SectionMap::parse(text).kinds(), "section headers found");
    EXTRACTORS
        .iter()
        .map(|(kind, extract)| {
            let field = extract(text);
            debug!(?kind, empty = field.is_empty(), "heuristic extractor finished");
            field
        })
        .collect()
}

/// Field-by-field merge: for every kind, the preferred value wins unless empty.
pub fn merge_preferring(
    preferred: Vec<PartialField>,
    fallback: Vec<PartialField>,
) -> Vec<PartialField> {
    let mut preferred: Vec<Option<PartialField>> = preferred.into_iter().map(Some).collect();
    let mut merged: Vec<PartialField> = fallback
        .into_iter()
        .map(|base| {
            let kind = base.kind();
            match preferred
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|p| p.kind() == kind))
                .and_then(Option::take)
            {
                Some(better) => better.prefer_over(base),
                None => base,
            }
        })
        .collect();
    // Kinds only the preferred side produced.
    merged.extend(preferred.into_iter().flatten());
    merged
}
