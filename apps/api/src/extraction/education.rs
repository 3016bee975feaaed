//! Education extractor. Only the education section is read; a CV without one
//! yields no entries.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::sections::{SectionKind, SectionMap};
use crate::extraction::segment::{segment_blocks, split_title, Block};
use crate::extraction::vocabulary::looks_like_institution;
use crate::models::cv::EducationEntry;

/// "Master en Informatique", "BSc in Computer Science", "Licence : Économie".
static DEGREE_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)(?:\s+(?:en|in|of|option|spécialité|specialite)\s+|\s*:\s*)(.+)$")
        .expect("degree field regex")
});

pub fn extract_education(text: &str) -> Vec<EducationEntry> {
    extract_education_at(text, Utc::now().date_naive())
}

pub fn extract_education_at(text: &str, today: NaiveDate) -> Vec<EducationEntry> {
    let sections = SectionMap::parse(text);
    let body = sections.body(SectionKind::Education);

    segment_blocks(&body, today)
        .into_iter()
        .filter(|block| !block.headline.is_empty())
        .map(|block| entry_from_block(&block))
        .collect()
}

fn entry_from_block(block: &Block) -> EducationEntry {
    let parts: Vec<String> = block
        .headline
        .iter()
        .flat_map(|line| split_title(line))
        .flat_map(|part| {
            part.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
        })
        .collect();

    let institution_idx = parts.iter().position(|p| looks_like_institution(p));
    let degree_idx = parts
        .iter()
        .enumerate()
        .position(|(i, _)| Some(i) != institution_idx);

    let mut degree = degree_idx.map(|i| parts[i].clone()).unwrap_or_default();
    let institution = match institution_idx {
        Some(i) => parts[i].clone(),
        // Without a recognisable school name the line after the degree is the school.
        None => degree_idx
            .and_then(|i| parts.get(i + 1))
            .cloned()
            .unwrap_or_default(),
    };
    let location = parts
        .iter()
        .filter(|p| **p != degree && **p != institution)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let mut field = String::new();
    if let Some(caps) = DEGREE_FIELD_RE.captures(&degree) {
        let (head, tail) = (caps[1].trim().to_string(), caps[2].trim().to_string());
        degree = head;
        field = tail;
    }

    EducationEntry {
        degree,
        institution,
        field,
        year: block
            .period
            .as_ref()
            .map(|p| p.end_year())
            .unwrap_or_default(),
        location,
        description: block.description(),
    }
}
