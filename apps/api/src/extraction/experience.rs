//! Work experience extractor.

use chrono::{NaiveDate, Utc};

use crate::extraction::sections::{SectionKind, SectionMap};
use crate::extraction::segment::{segment_blocks, split_title, Block, Shape};
use crate::models::cv::ExperienceEntry;

/// Words that mark a headline part as a job title rather than an employer.
const ROLE_WORDS: &[&str] = &[
    "développeur",
    "développeuse",
    "developpeur",
    "developer",
    "ingénieur",
    "ingénieure",
    "ingenieur",
    "engineer",
    "manager",
    "chef",
    "consultant",
    "consultante",
    "stagiaire",
    "stage",
    "intern",
    "internship",
    "alternant",
    "alternance",
    "apprenti",
    "analyste",
    "analyst",
    "directeur",
    "directrice",
    "director",
    "responsable",
    "assistant",
    "assistante",
    "technicien",
    "technicienne",
    "designer",
    "architecte",
    "architect",
    "lead",
    "head",
    "product owner",
    "scrum master",
    "data scientist",
    "administrateur",
    "administrator",
    "commercial",
    "comptable",
    "vendeur",
    "vendeuse",
];

pub fn looks_like_role(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ROLE_WORDS.iter().any(|word| {
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| token == *word)
            || (word.contains(' ') && lowered.contains(word))
    })
}

pub fn extract_experience(text: &str) -> Vec<ExperienceEntry> {
    extract_experience_at(text, Utc::now().date_naive())
}

/// Experience entries in document order. Without an experience header, only
/// dated blocks among the unclaimed lines count, so contact lines are not
/// mistaken for employers.
pub fn extract_experience_at(text: &str, today: NaiveDate) -> Vec<ExperienceEntry> {
    let sections = SectionMap::parse(text);
    let (body, dated_only) = if sections.has(SectionKind::Experience) {
        (sections.body(SectionKind::Experience), false)
    } else {
        (sections.unclaimed(), true)
    };

    segment_blocks(&body, today)
        .into_iter()
        .filter(|block| !block.headline.is_empty())
        .filter(|block| !dated_only || block.period.is_some())
        .map(|block| entry_from_block(&block))
        .collect()
}

fn entry_from_block(block: &Block) -> ExperienceEntry {
    let parts = headline_parts(block);
    let mut parts = parts.into_iter();
    let first = parts.next().unwrap_or_default();
    let second = parts.next().unwrap_or_default();
    let location = parts.collect::<Vec<_>>().join(", ");

    // Stacked and piped layouts lead with the employer, titled lines with the role.
    let (mut company, mut position) = match block.shape {
        Shape::Stacked | Shape::Piped => (first, second),
        Shape::Titled => (second, first),
    };
    if position.is_empty() && !company.is_empty() && looks_like_role(&company) {
        std::mem::swap(&mut company, &mut position);
    } else if looks_like_role(&company) && !looks_like_role(&position) {
        std::mem::swap(&mut company, &mut position);
    }

    let (start_date, end_date) = block
        .period
        .as_ref()
        .map(|p| (p.start.clone(), p.end.clone()))
        .unwrap_or_default();

    ExperienceEntry {
        id: String::new(),
        company,
        position,
        location,
        start_date,
        end_date,
        description: block.description(),
    }
}

/// A single stacked headline line may still carry "Role chez Company".
fn headline_parts(block: &Block) -> Vec<String> {
    if block.headline.len() == 1 {
        split_title(&block.headline[0])
    } else {
        block.headline.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_stacked_entry_without_section_header() {
        let text = "Google\n\
            Développeur Senior\n\
            Mountain View, Californie\n\
            2020 - 2023\n\
            Développement d'applications web innovantes...";
        let entries = extract_experience_at(text, today());
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.company, "Google");
        assert_eq!(entry.position, "Développeur Senior");
        assert_eq!(entry.location, "Mountain View, Californie");
        assert_eq!(entry.start_date, "2020");
        assert_eq!(entry.end_date, "2023");
        assert!(!entry.description.is_empty());
        assert!(entry.id.is_empty());
    }

    #[test]
    fn test_entries_under_header_keep_document_order() {
        let text = "Jean Dupont\n\
            jean@example.com\n\
            Expérience professionnelle\n\
            Développeur Backend chez Doctolib\n\
            2021 - Présent\n\
            Conception d'APIs de prise de rendez-vous\n\
            Capgemini | Consultant | Paris | 2018 - 2021\n\
            Formation\n\
            Master Informatique - 2018";
        let entries = extract_experience_at(text, today());
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].company, "Doctolib");
        assert_eq!(entries[0].position, "Développeur Backend");
        assert_eq!(entries[0].end_date, "2026-10-17");

        assert_eq!(entries[1].company, "Capgemini");
        assert_eq!(entries[1].position, "Consultant");
        assert_eq!(entries[1].location, "Paris");
        assert_eq!(entries[1].start_date, "2018");
    }

    #[test]
    fn test_role_first_stacked_layout_is_swapped() {
        let text = "Expérience\nIngénieur logiciel\nThales\n2016 - 2019";
        let entries = extract_experience_at(text, today());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].company, "Thales");
        assert_eq!(entries[0].position, "Ingénieur logiciel");
    }

    #[test]
    fn test_titled_line_with_company_above() {
        let text = "Experience\nAirbus\nChef de projet - 2021 - Présent";
        let entries = extract_experience_at(text, today());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position, "Chef de projet");
        assert_eq!(entries[0].company, "Airbus");
    }

    #[test]
    fn test_titles_with_section_words_stay_in_entries() {
        let text = "Expérience\n\
            Airbus\n\
            Ingénieur Projet\n\
            2019 - 2022\n\
            Pilotage de la migration des outils de test\n\
            Thales\n\
            Responsable Formation\n\
            2016 - 2019";
        let entries = extract_experience_at(text, today());
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].company, "Airbus");
        assert_eq!(entries[0].position, "Ingénieur Projet");
        assert_eq!(entries[0].start_date, "2019");
        assert_eq!(entries[0].end_date, "2022");

        assert_eq!(entries[1].company, "Thales");
        assert_eq!(entries[1].position, "Responsable Formation");
        assert_eq!(entries[1].start_date, "2016");
        assert_eq!(entries[1].end_date, "2019");
    }

    #[test]
    fn test_undated_contact_lines_are_not_experience() {
        let text = "Jean Dupont\njean@example.com\n06 12 34 56 78";
        assert!(extract_experience_at(text, today()).is_empty());
    }

    #[test]
    fn test_empty_text_yields_no_entries() {
        assert!(extract_experience("").is_empty());
    }
}
