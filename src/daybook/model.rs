use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The schema version new entries are written at. `codec::migrate` lifts
/// older entries up to this version.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Calendar date key for an entry, always rendered `YYYY-MM-DD`.
///
/// Parsing goes through the real calendar, so `2025-13-40` is rejected even
/// though it matches the digit pattern.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryDate(NaiveDate);

impl EntryDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for EntryDate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(EntryDate)
            .map_err(|_| format!("Invalid date (expected YYYY-MM-DD): {}", s))
    }
}

/// A scalar from the document metadata block.
///
/// Metadata lines are `key: value` text; values that parse as numbers are
/// coerced, anything else is kept verbatim so `validate` can report it
/// instead of the decoder silently mangling it.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetaValue {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<i64>() {
            return MetaValue::Int(n);
        }
        // Non-finite parses ("NaN", "inf") stay text so validate can
        // reject them instead of them leaking into arithmetic.
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return MetaValue::Float(f);
            }
        }
        MetaValue::Text(raw.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Int(n) => Some(*n as f64),
            MetaValue::Float(f) => Some(*f),
            MetaValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Int(n) => Some(*n),
            MetaValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Int(n) => write!(f, "{}", n),
            // Whole floats keep their decimal point so a reparse stays a
            // float: 7.0 must not come back as the integer 7.
            MetaValue::Float(x) if x.fract() == 0.0 => write!(f, "{:.1}", x),
            MetaValue::Float(x) => write!(f, "{}", x),
            MetaValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Int(n)
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        MetaValue::Float(f)
    }
}

/// The five daily self-ratings, each constrained to [0, 10] by `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Score,
    Discipline,
    Focus,
    Energy,
    Mood,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 5] = [
        ScoreKind::Score,
        ScoreKind::Discipline,
        ScoreKind::Focus,
        ScoreKind::Energy,
        ScoreKind::Mood,
    ];

    /// Metadata key for this score, as written in the document.
    pub fn key(&self) -> &'static str {
        match self {
            ScoreKind::Score => "score",
            ScoreKind::Discipline => "discipline",
            ScoreKind::Focus => "focus",
            ScoreKind::Energy => "energy",
            ScoreKind::Mood => "mood",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSet {
    pub score: MetaValue,
    pub discipline: MetaValue,
    pub focus: MetaValue,
    pub energy: MetaValue,
    pub mood: MetaValue,
}

impl Default for ScoreSet {
    fn default() -> Self {
        Self {
            score: MetaValue::Int(5),
            discipline: MetaValue::Int(5),
            focus: MetaValue::Int(5),
            energy: MetaValue::Int(5),
            mood: MetaValue::Int(5),
        }
    }
}

impl ScoreSet {
    pub fn get(&self, kind: ScoreKind) -> &MetaValue {
        match kind {
            ScoreKind::Score => &self.score,
            ScoreKind::Discipline => &self.discipline,
            ScoreKind::Focus => &self.focus,
            ScoreKind::Energy => &self.energy,
            ScoreKind::Mood => &self.mood,
        }
    }

    pub fn get_mut(&mut self, kind: ScoreKind) -> &mut MetaValue {
        match kind {
            ScoreKind::Score => &mut self.score,
            ScoreKind::Discipline => &mut self.discipline,
            ScoreKind::Focus => &mut self.focus,
            ScoreKind::Energy => &mut self.energy,
            ScoreKind::Mood => &mut self.mood,
        }
    }
}

/// The five named subsections of section 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pillar {
    Health,
    Skill,
    Money,
    Leverage,
    Mind,
}

impl Pillar {
    pub const ALL: [Pillar; 5] = [
        Pillar::Health,
        Pillar::Skill,
        Pillar::Money,
        Pillar::Leverage,
        Pillar::Mind,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Pillar::Health => "Health",
            Pillar::Skill => "Skill",
            Pillar::Money => "Money",
            Pillar::Leverage => "Leverage",
            Pillar::Mind => "Mind",
        }
    }

    /// Case-insensitive title lookup, used when decoding subheadings.
    pub fn from_title(s: &str) -> Option<Pillar> {
        Pillar::ALL
            .into_iter()
            .find(|p| p.title().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pillars {
    pub health: String,
    pub skill: String,
    pub money: String,
    pub leverage: String,
    pub mind: String,
}

impl Pillars {
    pub fn get(&self, pillar: Pillar) -> &str {
        match pillar {
            Pillar::Health => &self.health,
            Pillar::Skill => &self.skill,
            Pillar::Money => &self.money,
            Pillar::Leverage => &self.leverage,
            Pillar::Mind => &self.mind,
        }
    }

    pub fn get_mut(&mut self, pillar: Pillar) -> &mut String {
        match pillar {
            Pillar::Health => &mut self.health,
            Pillar::Skill => &mut self.skill,
            Pillar::Money => &mut self.money,
            Pillar::Leverage => &mut self.leverage,
            Pillar::Mind => &mut self.mind,
        }
    }
}

/// Identifies one addressable body section.
///
/// Sections are numbered 1–11 in the document; section 4 is the pillar
/// block, addressed through its subsection tag. This replaces string-built
/// field keys with something the compiler checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Identity,
    Wins,
    Lessons,
    Pillar(Pillar),
    Gratitude,
    Plan,
    Ideas,
    People,
    Habits,
    Reflections,
    Notes,
}

impl SectionId {
    /// Top-level section number in the document (1–11).
    pub fn number(&self) -> u8 {
        match self {
            SectionId::Identity => 1,
            SectionId::Wins => 2,
            SectionId::Lessons => 3,
            SectionId::Pillar(_) => 4,
            SectionId::Gratitude => 5,
            SectionId::Plan => 6,
            SectionId::Ideas => 7,
            SectionId::People => 8,
            SectionId::Habits => 9,
            SectionId::Reflections => 10,
            SectionId::Notes => 11,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub identity: String,
    pub wins: String,
    pub lessons: String,
    pub pillars: Pillars,
    pub gratitude: String,
    pub plan: String,
    pub ideas: String,
    pub people: String,
    pub habits: String,
    pub reflections: String,
    pub notes: String,
}

/// One dated journal record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub schema_version: i64,
    /// Date string as decoded; validated against the calendar before any
    /// save. Kept raw so `validate` can report a malformed value.
    pub date: String,
    pub scores: ScoreSet,
    pub net_worth_delta: MetaValue,
    pub sections: Sections,
}

impl Entry {
    /// A blank entry for a date that exists neither locally nor remotely.
    pub fn empty(date: &EntryDate) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            date: date.to_string(),
            scores: ScoreSet::default(),
            net_worth_delta: MetaValue::Int(0),
            sections: Sections::default(),
        }
    }

    pub fn section(&self, id: SectionId) -> &str {
        match id {
            SectionId::Identity => &self.sections.identity,
            SectionId::Wins => &self.sections.wins,
            SectionId::Lessons => &self.sections.lessons,
            SectionId::Pillar(p) => self.sections.pillars.get(p),
            SectionId::Gratitude => &self.sections.gratitude,
            SectionId::Plan => &self.sections.plan,
            SectionId::Ideas => &self.sections.ideas,
            SectionId::People => &self.sections.people,
            SectionId::Habits => &self.sections.habits,
            SectionId::Reflections => &self.sections.reflections,
            SectionId::Notes => &self.sections.notes,
        }
    }

    pub fn section_mut(&mut self, id: SectionId) -> &mut String {
        match id {
            SectionId::Identity => &mut self.sections.identity,
            SectionId::Wins => &mut self.sections.wins,
            SectionId::Lessons => &mut self.sections.lessons,
            SectionId::Pillar(p) => self.sections.pillars.get_mut(p),
            SectionId::Gratitude => &mut self.sections.gratitude,
            SectionId::Plan => &mut self.sections.plan,
            SectionId::Ideas => &mut self.sections.ideas,
            SectionId::People => &mut self.sections.people,
            SectionId::Habits => &mut self.sections.habits,
            SectionId::Reflections => &mut self.sections.reflections,
            SectionId::Notes => &mut self.sections.notes,
        }
    }
}

/// Whether the local copy has been confirmed against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    Synced,
    Pending,
}

/// The cache's stored representation of an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Serialized document text, exactly as the codec produced it.
    pub document: String,
    /// Optimistic-concurrency token from the last known remote write.
    /// None means the entry has never been synced.
    pub remote_version_token: Option<String>,
    pub sync_state: SyncState,
    pub last_modified_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn pending(document: String, remote_version_token: Option<String>) -> Self {
        Self {
            document,
            remote_version_token,
            sync_state: SyncState::Pending,
            last_modified_at: Utc::now(),
        }
    }

    pub fn synced(document: String, remote_version_token: String) -> Self {
        Self {
            document,
            remote_version_token: Some(remote_version_token),
            sync_state: SyncState::Synced,
            last_modified_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_date_parsing() {
        assert_eq!(
            "2025-12-25".parse::<EntryDate>().unwrap().to_string(),
            "2025-12-25"
        );
        assert!("2025-13-40".parse::<EntryDate>().is_err());
        assert!("not-a-date".parse::<EntryDate>().is_err());
        assert!("2025-2-5".parse::<EntryDate>().is_err());
    }

    #[test]
    fn test_entry_date_ordering() {
        let a: EntryDate = "2025-01-01".parse().unwrap();
        let b: EntryDate = "2025-06-15".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_meta_value_coercion() {
        assert_eq!(MetaValue::parse("8"), MetaValue::Int(8));
        assert_eq!(MetaValue::parse("-123.45"), MetaValue::Float(-123.45));
        assert_eq!(MetaValue::parse("high"), MetaValue::Text("high".into()));
        assert_eq!(MetaValue::parse(" 10 "), MetaValue::Int(10));
    }

    #[test]
    fn test_meta_value_display_round_trips() {
        for raw in ["1000", "-42", "3.5", "free text"] {
            let value = MetaValue::parse(raw);
            assert_eq!(MetaValue::parse(&value.to_string()), value);
        }
    }

    #[test]
    fn test_pillar_title_lookup_is_case_insensitive() {
        assert_eq!(Pillar::from_title("health"), Some(Pillar::Health));
        assert_eq!(Pillar::from_title("LEVERAGE"), Some(Pillar::Leverage));
        assert_eq!(Pillar::from_title("Wealth"), None);
    }

    #[test]
    fn test_section_access_by_id() {
        let date: EntryDate = "2025-03-01".parse().unwrap();
        let mut entry = Entry::empty(&date);
        *entry.section_mut(SectionId::Pillar(Pillar::Money)) = "saved more".into();
        assert_eq!(entry.section(SectionId::Pillar(Pillar::Money)), "saved more");
        assert_eq!(entry.section(SectionId::Identity), "");
        assert_eq!(SectionId::Pillar(Pillar::Mind).number(), 4);
        assert_eq!(SectionId::Notes.number(), 11);
    }
}
