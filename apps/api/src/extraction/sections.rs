//! Section detection: finds CV section headers and slices the text into bodies.
//!
//! A header is a short line whose keyword sits in its first two words, unless
//! the line reads as a job title ("Ingénieur Projet"). The keyword table is
//! ordered and the first matching entry wins, so more specific phrases
//! ("compétences linguistiques") are listed before generic ones.

use crate::extraction::experience::looks_like_role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Experience,
    Education,
    Skills,
    Languages,
    Interests,
    Projects,
    Certifications,
    /// A recognized header whose content no extractor claims (profile, contact...).
    Other,
}

const MAX_HEADER_WORDS: usize = 5;
const MAX_HEADER_CHARS: usize = 48;

/// Ordered keyword table. Matching is on the lowercased line.
const SECTION_KEYWORDS: &[(&str, SectionKind)] = &[
    ("compétences linguistiques", SectionKind::Languages),
    ("competences linguistiques", SectionKind::Languages),
    ("programming language", SectionKind::Skills),
    ("langages", SectionKind::Skills),
    ("langage", SectionKind::Skills),
    ("langue", SectionKind::Languages),
    ("language", SectionKind::Languages),
    ("certific", SectionKind::Certifications),
    ("licenses", SectionKind::Certifications),
    ("habilitation", SectionKind::Certifications),
    ("projet", SectionKind::Projects),
    ("project", SectionKind::Projects),
    ("réalisation", SectionKind::Projects),
    ("realisation", SectionKind::Projects),
    ("portfolio", SectionKind::Projects),
    ("centres d'intérêt", SectionKind::Interests),
    ("centre d'intérêt", SectionKind::Interests),
    ("centres d’intérêt", SectionKind::Interests),
    ("centre d’intérêt", SectionKind::Interests),
    ("centres d'interet", SectionKind::Interests),
    ("centre d'interet", SectionKind::Interests),
    ("intérêt", SectionKind::Interests),
    ("interet", SectionKind::Interests),
    ("interest", SectionKind::Interests),
    ("loisir", SectionKind::Interests),
    ("hobb", SectionKind::Interests),
    ("passion", SectionKind::Interests),
    ("formation", SectionKind::Education),
    ("diplôme", SectionKind::Education),
    ("diplome", SectionKind::Education),
    ("éducation", SectionKind::Education),
    ("education", SectionKind::Education),
    ("études", SectionKind::Education),
    ("etudes", SectionKind::Education),
    ("scolarité", SectionKind::Education),
    ("academic", SectionKind::Education),
    ("cursus", SectionKind::Education),
    ("expérience", SectionKind::Experience),
    ("experience", SectionKind::Experience),
    ("parcours professionnel", SectionKind::Experience),
    ("emploi", SectionKind::Experience),
    ("employment", SectionKind::Experience),
    ("work history", SectionKind::Experience),
    ("career", SectionKind::Experience),
    ("carrière", SectionKind::Experience),
    ("compétence", SectionKind::Skills),
    ("competence", SectionKind::Skills),
    ("skill", SectionKind::Skills),
    ("savoir-faire", SectionKind::Skills),
    ("technologies", SectionKind::Skills),
    ("outils", SectionKind::Skills),
    ("profil", SectionKind::Other),
    ("profile", SectionKind::Other),
    ("summary", SectionKind::Other),
    ("résumé", SectionKind::Other),
    ("à propos", SectionKind::Other),
    ("about", SectionKind::Other),
    ("objecti", SectionKind::Other),
    ("contact", SectionKind::Other),
    ("coordonnées", SectionKind::Other),
    ("référence", SectionKind::Other),
    ("reference", SectionKind::Other),
    ("informations personnelles", SectionKind::Other),
    ("personal information", SectionKind::Other),
];

const BULLET_PREFIXES: &[char] = &['•', '-', '*', '▪', '·', '–', '—', '►', '◦', '\u{F0B7}', '➢', '✓'];

/// Returns true for list-item lines ("• Rust", "- Docker").
pub fn is_bullet(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(|c| BULLET_PREFIXES.contains(&c))
}

/// Strips a leading bullet marker and surrounding whitespace.
pub fn strip_bullet(line: &str) -> &str {
    line.trim()
        .trim_start_matches(BULLET_PREFIXES)
        .trim()
}

/// Classifies `line` as a section header. Returns the kind plus any inline
/// content following a colon ("Langues : Anglais, Espagnol").
pub fn classify_header(line: &str) -> Option<(SectionKind, &str)> {
    let line = line.trim();
    if line.is_empty() || is_bullet(line) || line.contains('@') {
        return None;
    }

    let (head, inline) = match line.split_once(':') {
        Some((head, rest)) => (head.trim(), rest.trim()),
        None => (line, ""),
    };
    if head.chars().count() > MAX_HEADER_CHARS
        || head.split_whitespace().count() > MAX_HEADER_WORDS
    {
        return None;
    }

    let lowered = head.to_lowercase();
    for (keyword, kind) in SECTION_KEYWORDS {
        if let Some(pos) = lowered.find(keyword) {
            let words_before = lowered[..pos].split_whitespace().count();
            // "Ingénieur Projet", "Responsable Formation" are job titles.
            if words_before == 1 && looks_like_role(head) {
                return None;
            }
            if words_before <= 1 {
                return Some((*kind, inline));
            }
        }
    }
    None
}

#[derive(Debug, Clone)]
struct Section<'a> {
    kind: SectionKind,
    lines: Vec<&'a str>,
}

/// The text split into an untitled preamble plus titled sections, in document order.
#[derive(Debug, Clone)]
pub struct SectionMap<'a> {
    preamble: Vec<&'a str>,
    sections: Vec<Section<'a>>,
}

impl<'a> SectionMap<'a> {
    pub fn parse(text: &'a str) -> Self {
        let mut preamble = Vec::new();
        let mut sections: Vec<Section<'a>> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some((kind, inline)) = classify_header(trimmed) {
                // "Technologies : Rust, Docker" inside an entry describes that entry.
                let in_entry_section = sections.last().is_some_and(|s| {
                    matches!(s.kind, SectionKind::Experience | SectionKind::Projects)
                });
                if kind == SectionKind::Skills && !inline.is_empty() && in_entry_section {
                    if let Some(section) = sections.last_mut() {
                        section.lines.push(trimmed);
                    }
                    continue;
                }
                let mut lines = Vec::new();
                if !inline.is_empty() {
                    lines.push(inline);
                }
                sections.push(Section { kind, lines });
                continue;
            }
            match sections.last_mut() {
                Some(section) => section.lines.push(trimmed),
                None => preamble.push(trimmed),
            }
        }

        SectionMap { preamble, sections }
    }

    /// Body lines of every section of `kind`, concatenated in document order.
    pub fn body(&self, kind: SectionKind) -> Vec<&'a str> {
        self.sections
            .iter()
            .filter(|s| s.kind == kind)
            .flat_map(|s| s.lines.iter().copied())
            .collect()
    }

    pub fn has(&self, kind: SectionKind) -> bool {
        self.sections.iter().any(|s| s.kind == kind)
    }

    /// Lines no extracting section claims: the preamble plus `Other` bodies.
    pub fn unclaimed(&self) -> Vec<&'a str> {
        let mut lines = self.preamble.clone();
        for section in self.sections.iter().filter(|s| s.kind == SectionKind::Other) {
            lines.extend(section.lines.iter().copied());
        }
        lines
    }

    pub fn kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }
}
