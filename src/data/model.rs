use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Closed vocabularies – race, gender, borough
// ---------------------------------------------------------------------------

/// Race code of the person stopped.
///
/// Only Black and White are recognised by the aggregate queries; every other
/// code is kept verbatim so it can still be filtered on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Race {
    Black,
    White,
    Other(String),
}

impl Race {
    pub fn code(&self) -> &str {
        match self {
            Race::Black => "B",
            Race::White => "W",
            Race::Other(code) => code,
        }
    }

    /// Case-insensitive comparison against a raw race code.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code().eq_ignore_ascii_case(code)
    }
}

impl From<&str> for Race {
    fn from(code: &str) -> Self {
        if code.eq_ignore_ascii_case("B") {
            Race::Black
        } else if code.eq_ignore_ascii_case("W") {
            Race::White
        } else {
            Race::Other(code.to_string())
        }
    }
}

impl From<String> for Race {
    fn from(code: String) -> Self {
        Race::from(code.as_str())
    }
}

impl From<Race> for String {
    fn from(race: Race) -> Self {
        race.code().to_string()
    }
}

/// Gender code of the person stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Female,
    Male,
    Other(String),
}

impl Gender {
    pub fn code(&self) -> &str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
            Gender::Other(code) => code,
        }
    }
}

impl From<&str> for Gender {
    fn from(code: &str) -> Self {
        if code.eq_ignore_ascii_case("F") {
            Gender::Female
        } else if code.eq_ignore_ascii_case("M") {
            Gender::Male
        } else {
            Gender::Other(code.to_string())
        }
    }
}

impl From<String> for Gender {
    fn from(code: String) -> Self {
        Gender::from(code.as_str())
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        gender.code().to_string()
    }
}

/// The five New York City boroughs, in ranking tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Borough {
    Brooklyn,
    Manhattan,
    Bronx,
    Queens,
    #[serde(rename = "Staten Island")]
    StatenIsland,
}

impl Borough {
    pub const ALL: [Borough; 5] = [
        Borough::Brooklyn,
        Borough::Manhattan,
        Borough::Bronx,
        Borough::Queens,
        Borough::StatenIsland,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Borough::Brooklyn => "Brooklyn",
            Borough::Manhattan => "Manhattan",
            Borough::Bronx => "Bronx",
            Borough::Queens => "Queens",
            Borough::StatenIsland => "Staten Island",
        }
    }

    /// Exact case-insensitive match of a location field against a borough
    /// name. `"brooklyn"` matches, `"Brooklyn North"` does not.
    pub fn from_location(location: &str) -> Option<Borough> {
        Borough::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(location))
    }
}

impl fmt::Display for Borough {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Record – one incident
// ---------------------------------------------------------------------------

/// A single stop-and-frisk incident (one data row of the source file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Free-text crime description.
    pub description: String,
    pub arrested: bool,
    pub frisked: bool,
    pub gender: Gender,
    pub race: Race,
    /// Borough or precinct name as written in the source.
    pub location: String,
}

impl Record {
    pub fn borough(&self) -> Option<Borough> {
        Borough::from_location(&self.location)
    }
}

// ---------------------------------------------------------------------------
// YearGroup – all records of one calendar year
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct YearGroup {
    year: i32,
    records: Vec<Record>,
}

impl YearGroup {
    pub fn new(year: i32) -> Self {
        YearGroup {
            year,
            records: Vec::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Records in input order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, record: Record) {
        self.records.push(record);
    }
}

// ---------------------------------------------------------------------------
// Dataset – year groups keyed by year
// ---------------------------------------------------------------------------

/// The full loaded dataset. Built once, then only read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    groups: HashMap<i32, YearGroup>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `(year, record)` pairs by year, keeping input order within each
    /// year.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (i32, Record)>,
    {
        let mut dataset = Dataset::new();
        for (year, record) in rows {
            dataset.insert(year, record);
        }
        dataset
    }

    /// Append a record to its year group, creating the group on first sight.
    pub(crate) fn insert(&mut self, year: i32, record: Record) {
        self.groups
            .entry(year)
            .or_insert_with(|| {
                log::debug!("creating year group {year}");
                YearGroup::new(year)
            })
            .push(record);
    }

    /// Look up a year group. `None` when the year was never loaded.
    pub fn year(&self, year: i32) -> Option<&YearGroup> {
        self.groups.get(&year)
    }

    /// Loaded years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.groups.keys().copied().collect();
        years.sort_unstable();
        years
    }

    pub fn groups(&self) -> impl Iterator<Item = &YearGroup> {
        self.groups.values()
    }

    /// Number of year groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records across all years.
    pub fn record_count(&self) -> usize {
        self.groups.values().map(YearGroup::len).sum()
    }
}
