//! Closed vocabularies intersected against CV text, plus the term matcher.
//!
//! Matching is case-insensitive and boundary-aware: "Java" does not match inside
//! "JavaScript", but "C++" and "Node.js" match as written.

use crate::models::cv::SkillCategory;

pub const TECHNICAL_SKILLS: &[&str] = &[
    "JavaScript",
    "TypeScript",
    "Python",
    "Java",
    "Kotlin",
    "Swift",
    "Rust",
    "Golang",
    "C++",
    "C#",
    "PHP",
    "Ruby",
    "Scala",
    "Dart",
    "HTML",
    "CSS",
    "SASS",
    "SQL",
    "NoSQL",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "Redis",
    "GraphQL",
    "React",
    "React Native",
    "Angular",
    "Vue.js",
    "Next.js",
    "Node.js",
    "Express",
    "Django",
    "Flask",
    "FastAPI",
    "Symfony",
    "Laravel",
    ".NET",
    "Flutter",
    "TensorFlow",
    "PyTorch",
    "Pandas",
    "Machine Learning",
    "Deep Learning",
    "Data Science",
    "DevOps",
    "CI/CD",
    "Microservices",
    "Agile",
    "Scrum",
];

pub const TOOLS: &[&str] = &[
    "Git",
    "GitHub",
    "GitLab",
    "Docker",
    "Kubernetes",
    "Terraform",
    "Ansible",
    "Jenkins",
    "AWS",
    "Azure",
    "GCP",
    "Linux",
    "Jira",
    "Confluence",
    "Trello",
    "Figma",
    "Photoshop",
    "Illustrator",
    "Excel",
    "PowerPoint",
    "Word",
    "Tableau",
    "Power BI",
    "Postman",
    "VS Code",
    "IntelliJ",
    "Salesforce",
    "SAP",
];

pub const SOFT_SKILLS: &[&str] = &[
    "communication",
    "leadership",
    "travail en équipe",
    "teamwork",
    "autonomie",
    "rigueur",
    "créativité",
    "creativity",
    "adaptabilité",
    "adaptability",
    "gestion de projet",
    "project management",
    "résolution de problèmes",
    "problem solving",
    "esprit d'analyse",
    "analytical thinking",
    "organisation",
    "curiosité",
    "négociation",
    "negotiation",
    "gestion du temps",
    "time management",
];

/// Spoken language names, French then English.
pub const SPOKEN_LANGUAGES: &[&str] = &[
    "Français",
    "Anglais",
    "Espagnol",
    "Allemand",
    "Italien",
    "Portugais",
    "Arabe",
    "Chinois",
    "Mandarin",
    "Japonais",
    "Russe",
    "Néerlandais",
    "Polonais",
    "Turc",
    "Coréen",
    "French",
    "English",
    "Spanish",
    "German",
    "Italian",
    "Portuguese",
    "Arabic",
    "Chinese",
    "Japanese",
    "Russian",
    "Dutch",
    "Polish",
    "Turkish",
    "Korean",
];

/// Proficiency words, longest first so "langue maternelle" wins over "maternelle".
pub const LEVEL_TERMS: &[&str] = &[
    "langue maternelle",
    "native speaker",
    "bilingue",
    "bilingual",
    "maternelle",
    "natif",
    "native",
    "courant",
    "fluent",
    "professionnel",
    "professional",
    "confirmé",
    "expert",
    "avancé",
    "advanced",
    "intermédiaire",
    "intermediate",
    "scolaire",
    "élémentaire",
    "notions",
    "débutant",
    "beginner",
    "basic",
    "C2",
    "C1",
    "B2",
    "B1",
    "A2",
    "A1",
];

pub const INSTITUTION_TERMS: &[&str] = &[
    "université",
    "universite",
    "university",
    "école",
    "ecole",
    "school",
    "institut",
    "institute",
    "college",
    "collège",
    "lycée",
    "lycee",
    "iut",
    "faculté",
    "academy",
    "académie",
    "polytechnique",
    "insa",
    "epitech",
    "epita",
    "sorbonne",
    "hec",
    "essec",
    "mit",
];

pub const COUNTRIES: &[&str] = &[
    "France",
    "Belgique",
    "Suisse",
    "Luxembourg",
    "Canada",
    "Maroc",
    "Algérie",
    "Tunisie",
    "Sénégal",
    "Côte d'Ivoire",
    "Espagne",
    "Allemagne",
    "Italie",
    "Royaume-Uni",
    "États-Unis",
    "Belgium",
    "Switzerland",
    "Germany",
    "Spain",
    "Italy",
    "United Kingdom",
    "United States",
    "USA",
];

/// Byte offset of the first boundary-respecting, case-insensitive occurrence of `term`.
pub fn find_term(haystack: &str, term: &str) -> Option<usize> {
    if term.is_empty() {
        return None;
    }
    let hay = haystack.to_lowercase();
    let needle = term.to_lowercase();
    // Lowercasing can change byte lengths, so offsets refer to the lowered text.
    let mut from = 0;
    while let Some(rel) = hay[from..].find(&needle) {
        let start = from + rel;
        let end = start + needle.len();
        let before_ok = hay[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_term_char(c));
        let after_ok = hay[end..].chars().next().map_or(true, |c| !is_term_char(c));
        if before_ok && after_ok {
            return Some(start);
        }
        from = start + hay[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

pub fn contains_term(haystack: &str, term: &str) -> bool {
    find_term(haystack, term).is_some()
}

fn is_term_char(c: char) -> bool {
    c.is_alphanumeric() || c == '+' || c == '#'
}

/// Every vocabulary member present in `text`, ordered by first occurrence.
pub fn matches_in_order<'v>(text: &str, vocabulary: &[&'v str]) -> Vec<&'v str> {
    let mut hits: Vec<(usize, &'v str)> = vocabulary
        .iter()
        .filter_map(|term| find_term(text, term).map(|pos| (pos, *term)))
        .collect();
    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, term)| term).collect()
}

/// Category of a skill name according to the closed vocabularies.
pub fn skill_category(name: &str) -> SkillCategory {
    let is = |list: &[&str]| list.iter().any(|t| t.eq_ignore_ascii_case(name.trim()));
    if is(TECHNICAL_SKILLS) {
        SkillCategory::Technical
    } else if is(TOOLS) {
        SkillCategory::Tool
    } else if SOFT_SKILLS
        .iter()
        .any(|t| t.to_lowercase() == name.trim().to_lowercase())
    {
        SkillCategory::Soft
    } else {
        SkillCategory::Unspecified
    }
}

/// First proficiency term appearing in `text`, as written in the vocabulary.
pub fn find_level(text: &str) -> Option<&'static str> {
    LEVEL_TERMS.iter().copied().find(|term| {
        // CEFR codes are matched case-sensitively so "a1" in a street number is ignored.
        if term.len() == 2 {
            text.split(|c: char| !c.is_alphanumeric()).any(|w| w == *term)
        } else {
            contains_term(text, term)
        }
    })
}

pub fn looks_like_institution(text: &str) -> bool {
    INSTITUTION_TERMS.iter().any(|t| contains_term(text, t))
}
