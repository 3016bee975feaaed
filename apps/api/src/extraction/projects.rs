//! Project and certification extractors.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::contact::first_url;
use crate::extraction::sections::{strip_bullet, SectionKind, SectionMap};
use crate::extraction::segment::{find_period, segment_blocks, split_title, Block};
use crate::extraction::skills::split_items;
use crate::extraction::vocabulary::{matches_in_order, TECHNICAL_SKILLS, TOOLS};
use crate::models::cv::{Certification, Project};

static STACK_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:technologies|technos?|stack|tech|outils|environnement)\s*:")
        .expect("stack line regex")
});

/// `AWS Solutions Architect (Amazon)`
static PAREN_ISSUER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s*\(([^)]+)\)$").expect("issuer regex"));

const MAX_CERTIFICATION_WORDS: usize = 14;

pub fn extract_projects(text: &str) -> Vec<Project> {
    extract_projects_at(text, Utc::now().date_naive())
}

pub fn extract_projects_at(text: &str, today: NaiveDate) -> Vec<Project> {
    let sections = SectionMap::parse(text);
    let body = sections.body(SectionKind::Projects);

    segment_blocks(&body, today)
        .into_iter()
        .filter(|block| !block.headline.is_empty())
        .map(|block| project_from_block(&block))
        .collect()
}

fn project_from_block(block: &Block) -> Project {
    let mut parts = block.headline.iter().flat_map(|line| split_title(line));
    let name = parts.next().unwrap_or_default();
    let subtitle = parts.collect::<Vec<_>>().join(" - ");

    let description = if block.details.is_empty() {
        subtitle
    } else {
        block.description()
    };

    let mut technologies: Vec<String> = Vec::new();
    for line in block.details.iter().filter(|l| STACK_LINE_RE.is_match(l)) {
        technologies.extend(split_items(line));
    }
    // Link lines would match "GitHub" and the like.
    let scanned = block
        .text()
        .lines()
        .filter(|line| first_url(line).is_none())
        .collect::<Vec<_>>()
        .join("\n");
    let vocabulary: Vec<&str> = TECHNICAL_SKILLS.iter().chain(TOOLS).copied().collect();
    for term in matches_in_order(&scanned, &vocabulary) {
        if !technologies.iter().any(|t| t.eq_ignore_ascii_case(term)) {
            technologies.push(term.to_string());
        }
    }

    let (start_date, end_date) = block
        .period
        .as_ref()
        .map(|p| (p.start.clone(), p.end.clone()))
        .unwrap_or_default();

    Project {
        id: String::new(),
        name,
        description,
        technologies,
        url: first_url(&block.text()).unwrap_or_default(),
        start_date,
        end_date,
    }
}

pub fn extract_certifications(text: &str) -> Vec<Certification> {
    extract_certifications_at(text, Utc::now().date_naive())
}

/// One certification per line: `Name - Issuer - 2022`, `Name (Issuer), 2022`.
pub fn extract_certifications_at(text: &str, today: NaiveDate) -> Vec<Certification> {
    let sections = SectionMap::parse(text);
    sections
        .body(SectionKind::Certifications)
        .into_iter()
        .map(strip_bullet)
        .filter(|line| !line.is_empty())
        .filter(|line| line.split_whitespace().count() <= MAX_CERTIFICATION_WORDS)
        .filter_map(|line| parse_certification(line, today))
        .collect()
}

fn parse_certification(line: &str, today: NaiveDate) -> Option<Certification> {
    let separators: &[char] = &[' ', '\t', '-', '–', '—', ',', '|', ':'];
    let (label, date) = match find_period(line, today) {
        Some((period, span)) => {
            let label = format!("{} {}", &line[..span.start], &line[span.end..]);
            (label.trim_matches(separators).to_string(), period.start)
        }
        None => (line.trim_matches(separators).to_string(), String::new()),
    };
    if label.is_empty() {
        return None;
    }

    let (name, issuer) = if let Some(caps) = PAREN_ISSUER_RE.captures(&label) {
        (caps[1].trim().to_string(), caps[2].trim().to_string())
    } else {
        let mut parts = split_title(&label).into_iter();
        let name = parts.next().unwrap_or_default();
        (name, parts.collect::<Vec<_>>().join(" - "))
    };

    Some(Certification {
        id: String::new(),
        name,
        issuer,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_projects_with_stack_line_and_url() {
        let text = "Projets personnels\n\
            Application météo\n\
            Site vitrine réalisé avec Next.js et déployé sur Vercel\n\
            Technologies : Next.js, Tailwind\n\
            Bot Discord - modération\n\
            Certifications\n\
            AWS Certified Developer - Amazon - 2022";
        let projects = extract_projects_at(text, today());
        assert_eq!(projects.len(), 2);

        assert_eq!(projects[0].name, "Application météo");
        assert_eq!(projects[0].technologies, vec!["Next.js", "Tailwind"]);
        assert!(projects[0].description.starts_with("Site vitrine"));

        assert_eq!(projects[1].name, "Bot Discord");
        assert_eq!(projects[1].description, "modération");
        assert!(projects[1].technologies.is_empty());
    }

    #[test]
    fn test_project_period_and_url() {
        let text = "Réalisations\n\
            Moteur de recherche | 2022 - 2023\n\
            Indexation plein texte écrite en Rust et Python\n\
            https://github.com/jdupont/search.";
        let projects = extract_projects_at(text, today());
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "Moteur de recherche");
        assert_eq!(projects[0].start_date, "2022");
        assert_eq!(projects[0].end_date, "2023");
        assert_eq!(projects[0].technologies, vec!["Rust", "Python"]);
        assert_eq!(projects[0].url, "https://github.com/jdupont/search");
    }

    #[test]
    fn test_certifications_issuer_shapes() {
        let text = "Certifications\n\
            • AWS Certified Developer - Amazon - 2022\n\
            • Professional Scrum Master (Scrum.org), 2021\n\
            • TOEIC";
        let certifications = extract_certifications_at(text, today());
        assert_eq!(certifications.len(), 3);

        assert_eq!(certifications[0].name, "AWS Certified Developer");
        assert_eq!(certifications[0].issuer, "Amazon");
        assert_eq!(certifications[0].date, "2022");

        assert_eq!(certifications[1].name, "Professional Scrum Master");
        assert_eq!(certifications[1].issuer, "Scrum.org");
        assert_eq!(certifications[1].date, "2021");

        assert_eq!(certifications[2].name, "TOEIC");
        assert_eq!(certifications[2].issuer, "");
        assert_eq!(certifications[2].date, "");
    }

    #[test]
    fn test_no_sections_yield_empty_lists() {
        assert!(extract_projects("").is_empty());
        assert!(extract_certifications("Google\n2020 - 2023").is_empty());
    }
}
