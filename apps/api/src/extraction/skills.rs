//! Skills, spoken languages and interests: list-shaped sections plus
//! closed-vocabulary matches across the whole text.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::sections::{strip_bullet, SectionKind, SectionMap};
use crate::extraction::vocabulary::{
    find_level, find_term, matches_in_order, skill_category, SOFT_SKILLS, SPOKEN_LANGUAGES,
    TECHNICAL_SKILLS, TOOLS,
};
use crate::models::cv::{Interest, Language, Skill};

/// `Rust (avancé)`, `Python - expert`, `Docker : notions`.
static ITEM_LEVEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s*(?:\(([^)]*)\)|\s[:\-–]\s*(.+)|:\s*(.+))$").expect("item level regex")
});

const ITEM_SEPARATORS: &[char] = &[',', ';', '|', '•', '·', '▪'];
const MAX_ITEM_CHARS: usize = 40;
const MAX_ITEM_WORDS: usize = 5;

/// Splits a list line into items, dropping a leading `Category :` label.
pub fn split_items(line: &str) -> Vec<String> {
    let line = strip_bullet(line);
    let list = match line.split_once(':') {
        Some((label, rest)) if label.split_whitespace().count() <= 3 && !rest.trim().is_empty() => {
            // Keep "Anglais : courant" whole; only a multi-item tail is a labelled list.
            if rest.contains(ITEM_SEPARATORS) {
                rest
            } else {
                line
            }
        }
        _ => line,
    };

    list.split(ITEM_SEPARATORS)
        .map(|item| item.trim().trim_end_matches('.').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_list_item(item: &str) -> bool {
    item.chars().count() <= MAX_ITEM_CHARS && item.split_whitespace().count() <= MAX_ITEM_WORDS
}

/// Splits a trailing proficiency off an item when it names a known level.
fn name_and_level(item: &str) -> (String, String) {
    if let Some(caps) = ITEM_LEVEL_RE.captures(item) {
        let name = caps[1].trim();
        let tail = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        if !name.is_empty() && find_level(tail).is_some() {
            return (name.to_string(), tail.to_string());
        }
    }
    (item.to_string(), String::new())
}

pub fn extract_skills(text: &str) -> Vec<Skill> {
    let sections = SectionMap::parse(text);
    let mut seen = HashSet::new();
    let mut skills = Vec::new();
    let mut push = |name: String, level: String| {
        if seen.insert(name.to_lowercase()) {
            skills.push(Skill {
                id: String::new(),
                category: skill_category(&name),
                name,
                level,
            });
        }
    };

    for line in sections.body(SectionKind::Skills) {
        for item in split_items(line).into_iter().filter(|i| is_list_item(i)) {
            let (name, level) = name_and_level(&item);
            push(name, level);
        }
    }

    let vocabulary: Vec<&str> = TECHNICAL_SKILLS
        .iter()
        .chain(TOOLS)
        .chain(SOFT_SKILLS)
        .copied()
        .collect();
    for term in matches_in_order(text, &vocabulary) {
        push(term.to_string(), String::new());
    }

    skills
}

pub fn extract_languages(text: &str) -> Vec<Language> {
    let sections = SectionMap::parse(text);
    let mut seen = HashSet::new();
    let mut languages = Vec::new();

    for line in sections.body(SectionKind::Languages) {
        for item in split_items(line) {
            let known = SPOKEN_LANGUAGES
                .iter()
                .filter_map(|name| find_term(&item, name).map(|pos| (pos, *name)))
                .min_by_key(|(pos, _)| *pos)
                .map(|(_, name)| name.to_string());
            let (name, level) = match known {
                Some(name) => {
                    let level = find_level(&item).map(str::to_string).unwrap_or_default();
                    (name, level)
                }
                None if is_list_item(&item) => name_and_level(&item),
                None => continue,
            };
            if seen.insert(name.to_lowercase()) {
                languages.push(Language {
                    id: String::new(),
                    name,
                    level,
                });
            }
        }
    }

    // Languages mentioned elsewhere ("Anglais courant" in a profile line).
    for line in text.lines() {
        for name in matches_in_order(line, SPOKEN_LANGUAGES) {
            if seen.insert(name.to_lowercase()) {
                languages.push(Language {
                    id: String::new(),
                    name: name.to_string(),
                    level: find_level(line).map(str::to_string).unwrap_or_default(),
                });
            }
        }
    }

    languages
}

pub fn extract_interests(text: &str) -> Vec<Interest> {
    let sections = SectionMap::parse(text);
    let mut seen = HashSet::new();
    sections
        .body(SectionKind::Interests)
        .into_iter()
        .flat_map(split_items)
        .filter(|item| is_list_item(item))
        .filter(|item| seen.insert(item.to_lowercase()))
        .map(|name| Interest {
            id: String::new(),
            name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::SkillCategory;

    const CV: &str = "Jean Dupont\n\
        Profil\n\
        Développeur bilingue anglais, passionné par Rust.\n\
        Compétences\n\
        Langages : Rust (avancé), Python - expert, TypeScript\n\
        • Docker\n\
        • Gestion de projet\n\
        Langues\n\
        Français : langue maternelle\n\
        Anglais courant (C1), Espagnol notions\n\
        Centres d'intérêt\n\
        Escalade, photographie; échecs\n\
        Bénévolat dans une association d'aide aux devoirs depuis plusieurs années";

    fn names<T>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<&str> {
        items.iter().map(name).collect()
    }

    #[test]
    fn test_split_items_drops_category_label() {
        assert_eq!(
            split_items("Frameworks : React, Django"),
            vec!["React", "Django"]
        );
        assert_eq!(split_items("- Anglais : courant"), vec!["Anglais : courant"]);
        assert_eq!(split_items("CI/CD; Git."), vec!["CI/CD", "Git"]);
    }

    #[test]
    fn test_skills_from_section_with_levels() {
        let skills = extract_skills(CV);
        assert_eq!(
            &names(&skills, |s| s.name.as_str())[..5],
            &["Rust", "Python", "TypeScript", "Docker", "Gestion de projet"]
        );
        assert_eq!(skills[0].level, "avancé");
        assert_eq!(skills[0].category, SkillCategory::Technical);
        assert_eq!(skills[1].level, "expert");
        assert_eq!(skills[3].category, SkillCategory::Tool);
        assert_eq!(skills[4].category, SkillCategory::Soft);
    }

    #[test]
    fn test_skills_vocabulary_hits_outside_sections_are_deduplicated() {
        let skills = extract_skills("J'utilise Docker et Kubernetes, surtout docker.");
        assert_eq!(names(&skills, |s| s.name.as_str()), vec!["Docker", "Kubernetes"]);
        assert!(extract_skills("").is_empty());
    }

    #[test]
    fn test_languages_with_levels() {
        let languages = extract_languages(CV);
        assert_eq!(
            names(&languages, |l| l.name.as_str()),
            vec!["Français", "Anglais", "Espagnol"]
        );
        assert_eq!(languages[0].level, "langue maternelle");
        assert_eq!(languages[1].level, "courant");
        assert_eq!(languages[2].level, "notions");
    }

    #[test]
    fn test_languages_found_by_vocabulary_without_section() {
        let languages = extract_languages("Anglais courant, allemand scolaire");
        assert_eq!(names(&languages, |l| l.name.as_str()), vec!["Anglais", "Allemand"]);
        assert!(extract_languages("").is_empty());
    }

    #[test]
    fn test_interests_skip_prose_lines() {
        let interests = extract_interests(CV);
        assert_eq!(
            names(&interests, |i| i.name.as_str()),
            vec!["Escalade", "photographie", "échecs"]
        );
        assert!(extract_interests("Escalade").is_empty());
    }
}
