//! Contact field extractors: one regular expression per field, first match in
//! document order wins. None of these fail; "not found" is an empty value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::sections::{classify_header, SectionMap};
use crate::extraction::vocabulary::{contains_term, COUNTRIES};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[ \t.\-]?)?(?:\(\d{1,4}\)[ \t.\-]?)?\d{1,4}(?:[ \t.\-]?\d{2,4}){2,6}")
        .expect("phone regex")
});

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(M\.|Mme\.?|Mlle\.?|Mr\.?|Mrs\.?|Ms\.?|Dr\.?|Pr\.?|Monsieur|Madame)[ \t]+)?(\p{Lu}[\p{L}'’\-]+(?:[ \t]+\p{Lu}[\p{L}'’\-]+){1,3})[ \t]*$",
    )
    .expect("name regex")
});

static BIRTH_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:née?\s+le|date\s+de\s+naissance|naissance|date\s+of\s+birth|birth\s*date|born(?:\s+on)?|dob)\s*:?\s*(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}|\d{1,2}(?:er)?\s+\p{L}+\.?\s+\d{4})",
    )
    .expect("birth date regex")
});

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)(\d{1,4}(?:\s*(?:bis|ter))?,?\s+(?:rue|avenue|av|boulevard|bd|chemin|allée|allee|place|impasse|route|quai|cours|square|street|st|road|rd|lane|drive|way)\.?\s[^,\n]+)(?:,\s*(\d{4,5})?\s*([^,\n\d][^,\n]*))?(?:,\s*([^,\n]+))?",
    )
    .expect("address regex")
});

static POSTAL_CITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d{5})[ \t]+(\p{Lu}[\p{L}'’\- ]+?)[ \t]*$").expect("postal city regex")
});

static LINKEDIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/[^\s,;)]+").expect("linkedin regex")
});

static GITHUB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/[^\s,;)]+").expect("github regex")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhttps?://[^\s,;)]+|\bwww\.[^\s,;)]+").expect("url regex"));

const MIN_PHONE_DIGITS: usize = 9;
const MAX_PHONE_DIGITS: usize = 15;

/// Words that mark a capitalised line as a job title rather than a person.
const NON_NAME_WORDS: &[&str] = &[
    "curriculum",
    "vitae",
    "cv",
    "resume",
    "développeur",
    "developpeur",
    "developer",
    "ingénieur",
    "ingenieur",
    "engineer",
    "manager",
    "consultant",
    "chef",
    "directeur",
    "director",
    "stagiaire",
    "analyste",
    "analyst",
    "designer",
    "senior",
    "junior",
    "architecte",
    "architect",
    "technicien",
    "responsable",
    "assistant",
    "assistante",
    "master",
    "licence",
    "bachelor",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub title: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileLinks {
    pub linkedin: String,
    pub github: String,
    pub website: String,
}

pub fn extract_email(text: &str) -> String {
    EMAIL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .unwrap_or_default()
}

pub fn extract_phone(text: &str) -> String {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
        })
        .map(str::to_string)
        .unwrap_or_default()
}

/// First capitalised 2–4 word line that is neither a header nor a job title.
pub fn extract_name(text: &str) -> NameParts {
    for caps in NAME_RE.captures_iter(text) {
        let Some(full) = caps.get(2).map(|m| m.as_str().trim()) else {
            continue;
        };
        if classify_header(full).is_some() {
            continue;
        }
        let lowered = full.to_lowercase();
        if lowered
            .split_whitespace()
            .any(|word| NON_NAME_WORDS.contains(&word))
        {
            continue;
        }

        let (first_name, last_name) = split_name(full);
        return NameParts {
            title: caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            full_name: full.split_whitespace().collect::<Vec<_>>().join(" "),
            first_name,
            last_name,
        };
    }
    NameParts::default()
}

/// "Jean DUPONT" and "DUPONT Jean" both give first "Jean", last "DUPONT";
/// otherwise the first word is the first name.
fn split_name(full: &str) -> (String, String) {
    let words: Vec<&str> = full.split_whitespace().collect();
    let is_upper = |w: &&str| {
        w.chars().filter(|c| c.is_alphabetic()).count() > 1
            && w.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase)
    };
    let upper: Vec<&str> = words.iter().filter(|w| is_upper(*w)).copied().collect();
    if !upper.is_empty() && upper.len() < words.len() {
        let rest: Vec<&str> = words.iter().filter(|w| !is_upper(*w)).copied().collect();
        return (rest.join(" "), upper.join(" "));
    }
    match words.split_first() {
        Some((first, rest)) => (first.to_string(), rest.join(" ")),
        None => (String::new(), String::new()),
    }
}

pub fn extract_birth_date(text: &str) -> String {
    BIRTH_DATE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

pub fn extract_address(text: &str) -> AddressParts {
    let mut parts = AddressParts::default();
    if let Some(caps) = ADDRESS_RE.captures(text) {
        let group = |i: usize| {
            caps.get(i)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };
        parts.street = group(1);
        parts.postal_code = group(2);
        parts.city = group(3);
        parts.country = group(4);
    }

    if parts.city.is_empty() {
        if let Some(caps) = POSTAL_CITY_RE.captures(text) {
            parts.postal_code = caps[1].to_string();
            parts.city = caps[2].trim().to_string();
        }
    }

    // A country named in the header area, e.g. "Paris, France".
    if parts.country.is_empty() {
        let sections = SectionMap::parse(text);
        let header_area = sections.unclaimed().join("\n");
        if let Some(country) = COUNTRIES.iter().find(|c| contains_term(&header_area, c)) {
            parts.country = country.to_string();
        }
    } else if let Some(country) = COUNTRIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(&parts.country))
    {
        parts.country = country.to_string();
    }

    parts
}

/// First http(s) or www URL in `text`.
pub fn first_url(text: &str) -> Option<String> {
    URL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', '/']).to_string())
}

pub fn extract_links(text: &str) -> ProfileLinks {
    let clean = |s: &str| s.trim_end_matches(['.', '/']).to_string();
    let linkedin = LINKEDIN_RE
        .find(text)
        .map(|m| clean(m.as_str()))
        .unwrap_or_default();
    let github = GITHUB_RE
        .find(text)
        .map(|m| clean(m.as_str()))
        .unwrap_or_default();
    let website = URL_RE
        .find_iter(text)
        .map(|m| clean(m.as_str()))
        .find(|url| {
            let lowered = url.to_lowercase();
            !lowered.contains("linkedin.com") && !lowered.contains("github.com")
        })
        .unwrap_or_default();

    ProfileLinks {
        linkedin,
        github,
        website,
    }
}
