// CV extraction prompt templates.
// All prompts for the extraction module are defined here.

pub const CV_EXTRACT_SYSTEM: &str = "\
You are a precise résumé data extractor. \
Read the plain text of a CV (French or English) and return its content as structured JSON. \
You MUST respond with valid JSON only, no markdown fences, no explanations.";

/// Target shape of every answer, shared by both prompts.
pub const CV_SCHEMA: &str = r#"{
  "personalInfo": {
    "title": "string (M., Mme, Dr...)", "fullName": "string", "firstName": "string",
    "lastName": "string", "email": "string", "phone": "string", "birthDate": "string",
    "address": "string (street)", "city": "string", "postalCode": "string",
    "country": "string", "linkedin": "string", "github": "string", "website": "string"
  },
  "experience": [{"company": "string", "position": "string", "location": "string",
                  "startDate": "YYYY or YYYY-MM", "endDate": "YYYY, YYYY-MM or YYYY-MM-DD if ongoing",
                  "description": "string"}],
  "education": [{"degree": "string", "institution": "string", "field": "string",
                 "year": "YYYY", "location": "string", "description": "string"}],
  "skills": [{"name": "string", "level": "string", "category": "technical" | "soft" | "tool" | ""}],
  "languages": [{"name": "string", "level": "string"}],
  "interests": [{"name": "string"}],
  "projects": [{"name": "string", "description": "string", "technologies": ["string"],
                "url": "string", "startDate": "string", "endDate": "string"}],
  "certifications": [{"name": "string", "issuer": "string", "date": "string"}]
}"#;

pub const CV_EXTRACT_PROMPT: &str = r#"Extract the following CV into a JSON object.

CV TEXT:
{raw_text}

OUTPUT SCHEMA (return exactly this structure, every top-level key present):
{schema}

RULES:
1. Keep entries in the order they appear in the CV.
2. An ongoing position ("Présent", "Present", "aujourd'hui") ends on {today}.
3. Every array must be present, even when empty.
4. {no_invention}
5. Return ONLY the JSON object, nothing else."#;

pub const CV_REFINE_PROMPT: &str = r#"A rule-based parser produced the DRAFT below from the CV TEXT.
Correct and complete the draft using the CV text, and return the full corrected record.

CV TEXT:
{raw_text}

DRAFT:
{draft}

OUTPUT SCHEMA (return exactly this structure, every top-level key present):
{schema}

RULES:
1. Fix fields the parser put in the wrong place (e.g. a job title read as a company).
2. Add entries the draft missed; drop draft entries that are not in the CV text.
3. An ongoing position ("Présent", "Present", "aujourd'hui") ends on {today}.
4. Every array must be present, even when empty.
5. {no_invention}
6. Return ONLY the JSON object, nothing else."#;
