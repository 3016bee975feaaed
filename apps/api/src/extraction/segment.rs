//! Entry segmentation shared by the experience, education and project extractors.
//!
//! A section body is cut into [`Block`]s using line-level shapes:
//! - `Company | Position | Place` opens a piped block
//! - `Title - 2019 - 2021` opens a titled block
//! - a bare period (`2020 - 2023`, `03/2019 - Présent`) closes the pending
//!   header lines into a stacked block, or dates the open block
//! - bullets and lines longer than [`DESCRIPTION_MIN_CHARS`] are details

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::sections::{is_bullet, strip_bullet};

/// Lines longer than this (in chars) read as prose, not as header lines.
pub const DESCRIPTION_MIN_CHARS: usize = 30;
/// A line with a period whose remaining text is longer than this is a sentence.
const MAX_TITLE_CHARS: usize = 60;
/// At most this many pending lines become a block headline.
const MAX_HEADLINE_LINES: usize = 3;

const MONTHS: &[(&str, u32)] = &[
    ("janvier", 1),
    ("janv", 1),
    ("january", 1),
    ("jan", 1),
    ("février", 2),
    ("fevrier", 2),
    ("févr", 2),
    ("february", 2),
    ("feb", 2),
    ("mars", 3),
    ("march", 3),
    ("mar", 3),
    ("avril", 4),
    ("april", 4),
    ("avr", 4),
    ("apr", 4),
    ("mai", 5),
    ("may", 5),
    ("juin", 6),
    ("june", 6),
    ("jun", 6),
    ("juillet", 7),
    ("juil", 7),
    ("july", 7),
    ("jul", 7),
    ("août", 8),
    ("aout", 8),
    ("august", 8),
    ("aug", 8),
    ("septembre", 9),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("octobre", 10),
    ("october", 10),
    ("oct", 10),
    ("novembre", 11),
    ("november", 11),
    ("nov", 11),
    ("décembre", 12),
    ("decembre", 12),
    ("december", 12),
    ("déc", 12),
    ("dec", 12),
];

const MONTH_ALTERNATION: &str = "janvier|janv|january|jan|février|fevrier|févr|february|feb|\
    mars|march|mar|avril|april|avr|apr|mai|may|juin|june|jun|juillet|juil|july|jul|\
    août|aout|august|aug|septembre|september|sept|sep|octobre|october|oct|\
    novembre|november|nov|décembre|decembre|december|déc|dec";

const OPEN_END: &str =
    r"présent|present|aujourd'hui|aujourd’hui|actuellement|actuel|now|current|en cours|ce jour|today";

fn date_pattern() -> String {
    format!(
        r"(?:(?:0?[1-9]|1[0-2])[/.](?:19|20)\d{{2}}|(?:{MONTH_ALTERNATION})\.?\s+(?:19|20)\d{{2}}|(?:19|20)\d{{2}})"
    )
}

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    let date = date_pattern();
    Regex::new(&format!(
        r"(?i)\b({date})\s*(?:(?:-|–|—|/)\s*|\s(?:à|au|to|until|jusqu'à|jusqu'en)\s+)({date}|{OPEN_END})\b"
    ))
    .expect("period range regex")
});

static SINCE_RE: Lazy<Regex> = Lazy::new(|| {
    let date = date_pattern();
    Regex::new(&format!(r"(?i)\b(?:depuis|since)\s+({date})\b")).expect("since regex")
});

static TRAILING_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    let date = date_pattern();
    Regex::new(&format!(r"(?i)(?:^|[\s(,|\-–—])({date})\)?\s*$")).expect("trailing date regex")
});

static TITLE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+[-–—|@]\s+|\s+(?:chez|at)\s+").expect("title separator regex")
});

/// A normalized date range. Open ends carry the processing date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub start: String,
    pub end: String,
}

impl Period {
    /// Four-digit year of the end (or start when the end is empty).
    pub fn end_year(&self) -> String {
        let source = if self.end.is_empty() { &self.start } else { &self.end };
        source.chars().take(4).collect()
    }
}

/// Normalizes one date token: `2020` → `2020`, `03/2020` or `mars 2020` → `2020-03`.
pub fn normalize_date(token: &str, today: NaiveDate) -> String {
    let token = token.trim();
    let lowered = token.to_lowercase();
    if OPEN_END.split('|').any(|open| open == lowered) {
        return today.format("%Y-%m-%d").to_string();
    }

    let year: String = lowered
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let head = lowered[..lowered.len() - year.len()]
        .trim()
        .trim_end_matches(['/', '.'])
        .trim();
    if head.is_empty() {
        return year;
    }

    let month = head.parse::<u32>().ok().or_else(|| {
        let word = head.trim_end_matches('.');
        MONTHS
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(_, m)| *m)
    });
    match month {
        Some(m) => format!("{year}-{m:02}"),
        None => year,
    }
}

/// Finds a period in `line`, returning it with the byte span it covers.
pub fn find_period(line: &str, today: NaiveDate) -> Option<(Period, std::ops::Range<usize>)> {
    if let Some(caps) = RANGE_RE.captures(line) {
        let whole = caps.get(0)?;
        return Some((
            Period {
                start: normalize_date(caps.get(1)?.as_str(), today),
                end: normalize_date(caps.get(2)?.as_str(), today),
            },
            whole.range(),
        ));
    }
    if let Some(caps) = SINCE_RE.captures(line) {
        let whole = caps.get(0)?;
        return Some((
            Period {
                start: normalize_date(caps.get(1)?.as_str(), today),
                end: today.format("%Y-%m-%d").to_string(),
            },
            whole.range(),
        ));
    }
    if let Some(caps) = TRAILING_DATE_RE.captures(line) {
        let date = caps.get(1)?;
        let value = normalize_date(date.as_str(), today);
        return Some((
            Period {
                start: value.clone(),
                end: value,
            },
            date.start()..line.len(),
        ));
    }
    None
}

/// The text around `span`, stripped of separators left behind.
fn remainder(line: &str, span: std::ops::Range<usize>) -> String {
    let separators: &[char] = &['-', '–', '—', '|', ',', '(', ')', ':', ' ', '\t'];
    let before = line[..span.start].trim_matches(separators);
    let after = line[span.end..].trim_matches(separators);
    match (before.is_empty(), after.is_empty()) {
        (true, true) => String::new(),
        (false, true) => before.to_string(),
        (true, false) => after.to_string(),
        (false, false) => format!("{before} | {after}"),
    }
}

/// Splits a title-ish line on `|`, ` - `, ` @ `, ` chez `, ` at `.
pub fn split_title(text: &str) -> Vec<String> {
    TITLE_SPLIT_RE
        .split(text)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Header lines stacked one per line above a period.
    Stacked,
    /// `A | B | C` on one line.
    Piped,
    /// `Title - period` on one line.
    Titled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub shape: Shape,
    pub headline: Vec<String>,
    pub period: Option<Period>,
    pub details: Vec<String>,
    awaiting_headline: bool,
}

impl Block {
    fn new(shape: Shape, headline: Vec<String>) -> Self {
        Block {
            shape,
            headline,
            period: None,
            details: Vec::new(),
            awaiting_headline: false,
        }
    }

    pub fn description(&self) -> String {
        self.details.join("\n")
    }

    /// Every line of the block, for vocabulary scans.
    pub fn text(&self) -> String {
        self.headline
            .iter()
            .chain(self.details.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.headline.is_empty() && self.details.is_empty() && self.period.is_none()
    }
}

enum LineShape {
    Detail(String),
    Period(Period),
    Piped(Vec<String>, Option<Period>),
    Titled(Vec<String>, Period),
    Short(String),
}

fn classify_line(line: &str, today: NaiveDate) -> LineShape {
    let bullet = is_bullet(line);
    let content = strip_bullet(line);
    if bullet {
        return LineShape::Detail(content.to_string());
    }

    if let Some((period, span)) = find_period(content, today) {
        let rest = remainder(content, span.clone());
        // A lone year closing a sentence is prose ("... obtenu en 2019"), unless a
        // separator sets it apart ("Licence, Université de Lyon - 2014").
        let separated = content[..span.start]
            .trim_end()
            .ends_with(['-', '–', '—', '|', ',', '(', ':']);
        let limit = if period.start == period.end && !separated {
            DESCRIPTION_MIN_CHARS
        } else {
            MAX_TITLE_CHARS
        };
        if rest.chars().count() > limit {
            return LineShape::Detail(content.to_string());
        }
        if rest.is_empty() {
            return LineShape::Period(period);
        }
        if rest.contains('|') && content.contains('|') {
            return LineShape::Piped(split_pipes(&rest), Some(period));
        }
        return LineShape::Titled(split_title(&rest), period);
    }

    if content.contains('|') {
        return LineShape::Piped(split_pipes(content), None);
    }
    if content.chars().count() > DESCRIPTION_MIN_CHARS {
        return LineShape::Detail(content.to_string());
    }
    LineShape::Short(content.to_string())
}

fn split_pipes(text: &str) -> Vec<String> {
    text.split('|')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

struct Segmenter {
    blocks: Vec<Block>,
    current: Option<Block>,
    pending: Vec<String>,
}

impl Segmenter {
    fn flush_current(&mut self) {
        if let Some(block) = self.current.take() {
            if !block.is_empty() {
                self.blocks.push(block);
            }
        }
    }

    /// Moves pending lines into a new stacked block. Lines beyond the headline
    /// limit trail the previous entry, so they become its details.
    fn open_from_pending(&mut self) -> Block {
        let overflow = self.pending.len().saturating_sub(MAX_HEADLINE_LINES);
        let headline = self.pending.split_off(overflow);
        let extra = std::mem::take(&mut self.pending);
        match self.current.as_mut() {
            Some(block) => block.details.extend(extra),
            None if !extra.is_empty() => self.blocks.push(Block::new(Shape::Stacked, extra)),
            None => {}
        }
        self.flush_current();
        Block::new(Shape::Stacked, headline)
    }

    fn push_line(&mut self, shape: LineShape) {
        match shape {
            LineShape::Detail(text) => {
                if !self.pending.is_empty() {
                    let mut block = self.open_from_pending();
                    block.details.push(text);
                    self.current = Some(block);
                } else if let Some(block) = self.current.as_mut() {
                    block.awaiting_headline = false;
                    block.details.push(text);
                } else {
                    self.pending.push(text);
                }
            }
            LineShape::Period(period) => {
                if !self.pending.is_empty() {
                    let mut block = self.open_from_pending();
                    block.period = Some(period);
                    self.current = Some(block);
                } else if let Some(block) = self.current.as_mut().filter(|b| b.period.is_none()) {
                    block.period = Some(period);
                } else {
                    self.flush_current();
                    let mut block = Block::new(Shape::Stacked, Vec::new());
                    block.period = Some(period);
                    block.awaiting_headline = true;
                    self.current = Some(block);
                }
            }
            LineShape::Piped(parts, period) => {
                self.close_pending();
                let mut block = Block::new(Shape::Piped, parts);
                block.period = period;
                self.current = Some(block);
            }
            LineShape::Titled(parts, period) => {
                // Short lines right above a titled line usually name its organisation.
                let above = std::mem::take(&mut self.pending);
                self.flush_current();
                let mut headline = parts;
                headline.extend(above);
                let mut block = Block::new(Shape::Titled, headline);
                block.period = Some(period);
                self.current = Some(block);
            }
            LineShape::Short(text) => match self.current.as_mut() {
                Some(block)
                    if block.awaiting_headline
                        && block.details.is_empty()
                        && block.headline.len() < MAX_HEADLINE_LINES =>
                {
                    block.headline.push(text);
                }
                _ => self.pending.push(text),
            },
        }
    }

    /// Pending lines with no period of their own become an undated block.
    fn close_pending(&mut self) {
        if self.pending.is_empty() {
            self.flush_current();
            return;
        }
        let block = self.open_from_pending();
        self.current = Some(block);
        self.flush_current();
    }

    fn finish(mut self) -> Vec<Block> {
        self.close_pending();
        self.flush_current();
        self.blocks
    }
}

/// Cuts section body lines into entry blocks, in document order.
pub fn segment_blocks(lines: &[&str], today: NaiveDate) -> Vec<Block> {
    let mut segmenter = Segmenter {
        blocks: Vec::new(),
        current: None,
        pending: Vec::new(),
    };
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        segmenter.push_line(classify_line(line, today));
    }
    segmenter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_normalize_date_tokens() {
        assert_eq!(normalize_date("2020", today()), "2020");
        assert_eq!(normalize_date("03/2019", today()), "2019-03");
        assert_eq!(normalize_date("Mars 2018", today()), "2018-03");
        assert_eq!(normalize_date("sept. 2017", today()), "2017-09");
        assert_eq!(normalize_date("Présent", today()), "2026-10-17");
        assert_eq!(normalize_date("present", today()), "2026-10-17");
    }

    #[test]
    fn test_find_period_ranges() {
        let (p, _) = find_period("2020 - 2023", today()).unwrap();
        assert_eq!(p, Period { start: "2020".into(), end: "2023".into() });

        let (p, _) = find_period("2021 – Présent", today()).unwrap();
        assert_eq!(p.end, "2026-10-17");

        let (p, _) = find_period("Depuis janvier 2022", today()).unwrap();
        assert_eq!(p.start, "2022-01");
        assert_eq!(p.end, "2026-10-17");

        let (p, _) = find_period("Licence (2016)", today()).unwrap();
        assert_eq!(p, Period { start: "2016".into(), end: "2016".into() });
    }

    #[test]
    fn test_find_period_ignores_plain_text() {
        assert!(find_period("Développeur Senior", today()).is_none());
        assert!(find_period("", today()).is_none());
    }

    #[test]
    fn test_stacked_block_with_description() {
        let lines = [
            "Google",
            "Développeur Senior",
            "Mountain View, Californie",
            "2020 - 2023",
            "Développement d'applications web innovantes...",
        ];
        let blocks = segment_blocks(&lines, today());
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.shape, Shape::Stacked);
        assert_eq!(
            block.headline,
            vec!["Google", "Développeur Senior", "Mountain View, Californie"]
        );
        assert_eq!(
            block.period,
            Some(Period { start: "2020".into(), end: "2023".into() })
        );
        assert_eq!(
            block.description(),
            "Développement d'applications web innovantes..."
        );
    }

    #[test]
    fn test_consecutive_stacked_blocks() {
        let lines = [
            "Google",
            "Développeur Senior",
            "2020 - 2023",
            "Développement d'applications web innovantes",
            "Microsoft",
            "Stagiaire",
            "2018 - 2019",
        ];
        let blocks = segment_blocks(&lines, today());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].headline, vec!["Google", "Développeur Senior"]);
        assert_eq!(blocks[1].headline, vec!["Microsoft", "Stagiaire"]);
        assert_eq!(blocks[1].period.as_ref().unwrap().start, "2018");
        assert!(blocks[1].details.is_empty());
    }

    #[test]
    fn test_piped_and_titled_lines_open_blocks() {
        let lines = [
            "Capgemini | Consultant | Paris",
            "01/2019 - 12/2020",
            "• Migration d'une application vers le cloud",
            "Chef de projet - 2021 - Présent",
            "Pilotage d'une équipe de huit développeurs",
        ];
        let blocks = segment_blocks(&lines, today());
        assert_eq!(blocks.len(), 2);

        assert_eq!(blocks[0].shape, Shape::Piped);
        assert_eq!(blocks[0].headline, vec!["Capgemini", "Consultant", "Paris"]);
        assert_eq!(
            blocks[0].period,
            Some(Period { start: "2019-01".into(), end: "2020-12".into() })
        );
        assert_eq!(
            blocks[0].details,
            vec!["Migration d'une application vers le cloud"]
        );

        assert_eq!(blocks[1].shape, Shape::Titled);
        assert_eq!(blocks[1].headline, vec!["Chef de projet"]);
        assert_eq!(blocks[1].period.as_ref().unwrap().end, "2026-10-17");
        assert_eq!(blocks[1].details.len(), 1);
    }

    #[test]
    fn test_trailing_year_in_prose_is_a_detail() {
        let lines = [
            "Thales",
            "Ingénieur",
            "2016 - 2019",
            "Responsable du passage en production obtenu en 2019",
        ];
        let blocks = segment_blocks(&lines, today());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].details.len(), 1);
    }

    #[test]
    fn test_period_first_layout_fills_headline() {
        let lines = ["2015 - 2018", "Airbus", "Ingénieur"];
        let blocks = segment_blocks(&lines, today());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].headline, vec!["Airbus", "Ingénieur"]);
    }

    #[test]
    fn test_undated_entries_become_blocks() {
        let lines = [
            "Application météo",
            "Site vitrine réalisé avec Next.js et déployé sur Vercel",
            "Bot Discord",
            "Automatisation de la modération d'un serveur de 500 membres",
        ];
        let blocks = segment_blocks(&lines, today());
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].headline, vec!["Application météo"]);
        assert_eq!(blocks[1].headline, vec!["Bot Discord"]);
        assert!(blocks[1].period.is_none());
    }

    #[test]
    fn test_empty_body_yields_no_blocks() {
        assert!(segment_blocks(&[], today()).is_empty());
    }
}
