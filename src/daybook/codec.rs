//! Entry ⇄ document codec.
//!
//! An entry is persisted (remotely and in the local cache) as a Markdown
//! document: a three-dash-delimited metadata block of `key: value` lines,
//! followed by eleven numbered sections. Section 4 holds the five pillar
//! subsections. Decoding matches top-level headings by number and pillar
//! subheadings by name (case-insensitive), so edited titles don't break a
//! document; encoding always emits the canonical titles.
//!
//! Invariant: `decode(encode(entry))` reproduces the entry exactly, modulo
//! insignificant whitespace inside section bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{DaybookError, Result};
use crate::model::{
    Entry, EntryDate, MetaValue, Pillar, ScoreKind, SectionId, CURRENT_SCHEMA_VERSION,
};

pub const SECTION_COUNT: u8 = 11;
const PILLAR_SECTION: u8 = 4;

/// Canonical section titles, emitted on encode. Decoding ignores titles and
/// keys off the section number.
const SECTION_TITLES: [&str; SECTION_COUNT as usize] = [
    "Identity & North Star",
    "Wins",
    "Losses & Lessons",
    "Pillars",
    "Gratitude",
    "Tomorrow's Plan",
    "Ideas",
    "People",
    "Habits & Metrics",
    "Reflections",
    "Notes",
];

static TOP_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\s+(\d{1,2})\.").expect("valid heading pattern"));
static SUB_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^##\s+(.+?)\s*$").expect("valid subheading pattern"));

pub fn section_title(number: u8) -> &'static str {
    SECTION_TITLES[(number - 1) as usize]
}

fn plain_section_id(number: u8) -> Option<SectionId> {
    match number {
        1 => Some(SectionId::Identity),
        2 => Some(SectionId::Wins),
        3 => Some(SectionId::Lessons),
        5 => Some(SectionId::Gratitude),
        6 => Some(SectionId::Plan),
        7 => Some(SectionId::Ideas),
        8 => Some(SectionId::People),
        9 => Some(SectionId::Habits),
        10 => Some(SectionId::Reflections),
        11 => Some(SectionId::Notes),
        _ => None,
    }
}

/// Serialize an entry to its document form.
pub fn encode(entry: &Entry) -> String {
    let mut doc = String::new();

    doc.push_str("---\n");
    doc.push_str(&format!("schema: {}\n", entry.schema_version));
    doc.push_str(&format!("date: {}\n", entry.date));
    for kind in ScoreKind::ALL {
        doc.push_str(&format!("{}: {}\n", kind.key(), entry.scores.get(kind)));
    }
    doc.push_str(&format!("net_worth_delta: {}\n", entry.net_worth_delta));
    doc.push_str("---\n");

    for number in 1..=SECTION_COUNT {
        doc.push('\n');
        doc.push_str(&format!("# {}. {}\n", number, section_title(number)));

        if number == PILLAR_SECTION {
            for pillar in Pillar::ALL {
                doc.push('\n');
                doc.push_str(&format!("## {}\n", pillar.title()));
                push_body(&mut doc, entry.section(SectionId::Pillar(pillar)));
            }
        } else {
            let id = plain_section_id(number).expect("section number in range");
            push_body(&mut doc, entry.section(id));
        }
    }

    doc
}

fn push_body(doc: &mut String, text: &str) {
    if !text.is_empty() {
        doc.push('\n');
        doc.push_str(text);
        doc.push('\n');
    }
}

/// Parse a document back into an entry.
///
/// Lenient by design: missing metadata falls back to defaults (scores 5,
/// net worth delta 0, schema 1), unknown headings are treated as body text,
/// and malformed values are preserved for `validate` to report.
pub fn decode(document: &str) -> Entry {
    let lines: Vec<&str> = document.lines().collect();
    let (meta_lines, body_lines) = split_metadata(&lines);

    let mut meta: HashMap<String, MetaValue> = HashMap::new();
    for line in meta_lines {
        if let Some((key, value)) = line.split_once(':') {
            meta.insert(key.trim().to_string(), MetaValue::parse(value));
        }
    }

    let mut entry = Entry {
        schema_version: meta
            .get("schema")
            .and_then(MetaValue::as_i64)
            .unwrap_or(1),
        date: meta.get("date").map(|v| v.to_string()).unwrap_or_default(),
        scores: Default::default(),
        net_worth_delta: meta
            .remove("net_worth_delta")
            .unwrap_or(MetaValue::Int(0)),
        sections: Default::default(),
    };
    for kind in ScoreKind::ALL {
        if let Some(value) = meta.remove(kind.key()) {
            *entry.scores.get_mut(kind) = value;
        }
    }

    for (number, chunk) in split_sections(&body_lines) {
        if number == PILLAR_SECTION {
            decode_pillars(&mut entry, &chunk);
        } else if let Some(id) = plain_section_id(number) {
            *entry.section_mut(id) = chunk.join("\n").trim().to_string();
        }
    }

    entry
}

/// Split off the first three-dash-delimited block. Returns (metadata lines,
/// body lines); a document with no metadata block is all body.
fn split_metadata<'a>(lines: &[&'a str]) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut start = 0;
    while start < lines.len() && lines[start].trim().is_empty() {
        start += 1;
    }

    if start < lines.len() && lines[start].trim() == "---" {
        if let Some(close) = lines[start + 1..].iter().position(|l| l.trim() == "---") {
            let meta = lines[start + 1..start + 1 + close].to_vec();
            let body = lines[start + close + 2..].to_vec();
            return (meta, body);
        }
    }

    (Vec::new(), lines.to_vec())
}

/// Split the body at `# N.` headings with N in 1..=11. Anything before the
/// first heading, and headings with out-of-range numbers, are not sections.
fn split_sections<'a>(lines: &[&'a str]) -> Vec<(u8, Vec<&'a str>)> {
    let mut headings: Vec<(usize, u8)> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if let Some(caps) = TOP_HEADING.captures(line) {
            if let Ok(number) = caps[1].parse::<u8>() {
                if (1..=SECTION_COUNT).contains(&number) {
                    headings.push((idx, number));
                }
            }
        }
    }

    let mut sections = Vec::with_capacity(headings.len());
    for (i, (idx, number)) in headings.iter().enumerate() {
        let end = headings
            .get(i + 1)
            .map(|(next_idx, _)| *next_idx)
            .unwrap_or(lines.len());
        sections.push((*number, lines[idx + 1..end].to_vec()));
    }
    sections
}

/// Within section 4, split at `##` subheadings whose title names a pillar.
/// Text ahead of the first recognized subheading has no field to land in
/// and is dropped (the encoder never emits any).
fn decode_pillars(entry: &mut Entry, chunk: &[&str]) {
    let mut current: Option<Pillar> = None;
    let mut buf: Vec<&str> = Vec::new();

    let mut flush = |pillar: Option<Pillar>, buf: &mut Vec<&str>, entry: &mut Entry| {
        if let Some(p) = pillar {
            *entry.section_mut(SectionId::Pillar(p)) = buf.join("\n").trim().to_string();
        }
        buf.clear();
    };

    for &line in chunk {
        let matched = SUB_HEADING
            .captures(line)
            .and_then(|caps| Pillar::from_title(&caps[1]));
        if let Some(pillar) = matched {
            flush(current, &mut buf, entry);
            current = Some(pillar);
        } else {
            buf.push(line);
        }
    }
    flush(current, &mut buf, entry);
}

/// Everything wrong with an entry, not just the first problem.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate(entry: &Entry) -> ValidationReport {
    let mut errors = Vec::new();

    if entry.date.parse::<EntryDate>().is_err() {
        errors.push(format!(
            "date must be a valid YYYY-MM-DD date (got \"{}\")",
            entry.date
        ));
    }

    for kind in ScoreKind::ALL {
        let value = entry.scores.get(kind);
        match value.as_f64() {
            Some(n) if (0.0..=10.0).contains(&n) => {}
            Some(n) => errors.push(format!(
                "{} must be between 0 and 10 (got {})",
                kind.key(),
                n
            )),
            None => errors.push(format!(
                "{} must be numeric (got \"{}\")",
                kind.key(),
                value
            )),
        }
    }

    if entry.net_worth_delta.as_f64().is_none() {
        errors.push(format!(
            "net_worth_delta must be numeric (got \"{}\")",
            entry.net_worth_delta
        ));
    }

    ValidationReport { errors }
}

type Migration = fn(Entry) -> Entry;

/// Linear upgrade registry: (source version, step). Each step must advance
/// the schema version by exactly one. Empty while the format is at v1.
const MIGRATIONS: &[(i64, Migration)] = &[];

/// Walk an entry forward to [`CURRENT_SCHEMA_VERSION`]. Entries already at
/// (or past) the current version pass through unchanged.
pub fn migrate(mut entry: Entry) -> Result<Entry> {
    while entry.schema_version < CURRENT_SCHEMA_VERSION {
        let from = entry.schema_version;
        let step = MIGRATIONS
            .iter()
            .find(|(source, _)| *source == from)
            .ok_or_else(|| {
                DaybookError::Validation(format!(
                    "no migration registered for schema version {}",
                    from
                ))
            })?;
        entry = (step.1)(entry);
        if entry.schema_version != from + 1 {
            return Err(DaybookError::Validation(format!(
                "migration from schema version {} must advance to {}, got {}",
                from,
                from + 1,
                entry.schema_version
            )));
        }
    }
    Ok(entry)
}
