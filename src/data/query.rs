use serde::Serialize;

use super::model::{Borough, Dataset, Gender, Race, Record};

/// `part / whole * 100`, or 0 when there is nothing to divide by.
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Share of a year's stops that ended in a frisk and in an arrest, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StopRates {
    pub frisked: f64,
    pub arrested: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasRow {
    Female = 0,
    Male = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasColumn {
    Black = 0,
    White = 1,
    /// Black and White stops together.
    Combined = 2,
}

/// Gender share within each race subpopulation, in percent.
///
/// Row 0 is female, row 1 male; columns are Black, White and Black+White.
/// Each column is its own denominator, so a column sums to 100 unless it has
/// no stops at all, in which case it is all zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenderBias(pub [[f64; 3]; 2]);

impl GenderBias {
    pub fn cell(&self, row: BiasRow, column: BiasColumn) -> f64 {
        self.0[row as usize][column as usize]
    }

    pub fn female(&self) -> [f64; 3] {
        self.0[BiasRow::Female as usize]
    }

    pub fn male(&self) -> [f64; 3] {
        self.0[BiasRow::Male as usize]
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Dataset {
    /// Records of `year` whose race code equals `race`, ignoring case.
    /// Empty for a year that was never loaded.
    pub fn population_stopped(&self, year: i32, race: &str) -> Vec<&Record> {
        self.year(year)
            .map(|group| {
                group
                    .records()
                    .iter()
                    .filter(|r| r.race.matches_code(race))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Frisk and arrest rates for `year`. Both are 0 for an absent or empty year.
    pub fn frisked_vs_arrested(&self, year: i32) -> StopRates {
        let Some(group) = self.year(year) else {
            return StopRates::default();
        };
        let records = group.records();
        let frisked = records.iter().filter(|r| r.frisked).count();
        let arrested = records.iter().filter(|r| r.arrested).count();
        StopRates {
            frisked: percentage(frisked, records.len()),
            arrested: percentage(arrested, records.len()),
        }
    }

    /// Female/male split of Black and White stops in `year`.
    ///
    /// Stops of any other race, and stops whose gender is neither F nor M,
    /// are left out of every total. An absent year gives an all-zero table.
    pub fn gender_bias(&self, year: i32) -> GenderBias {
        let Some(group) = self.year(year) else {
            return GenderBias::default();
        };

        // counts[gender][race]
        let mut counts = [[0usize; 2]; 2];
        for record in group.records() {
            let race = match record.race {
                Race::Black => BiasColumn::Black,
                Race::White => BiasColumn::White,
                Race::Other(_) => continue,
            };
            let gender = match record.gender {
                Gender::Female => BiasRow::Female,
                Gender::Male => BiasRow::Male,
                Gender::Other(_) => continue,
            };
            counts[gender as usize][race as usize] += 1;
        }

        let black = counts[0][0] + counts[1][0];
        let white = counts[0][1] + counts[1][1];
        let both = black + white;

        let mut table = [[0.0; 3]; 2];
        for (row, c) in counts.iter().enumerate() {
            table[row] = [
                percentage(c[0], black),
                percentage(c[1], white),
                percentage(c[0] + c[1], both),
            ];
        }
        GenderBias(table)
    }

    /// Percentage-point change, from `year1` to `year2`, in the share of stops
    /// whose description contains `description` (case-sensitive).
    pub fn crime_increase(&self, description: &str, year1: i32, year2: i32) -> f64 {
        self.description_share(description, year2) - self.description_share(description, year1)
    }

    fn description_share(&self, description: &str, year: i32) -> f64 {
        self.year(year)
            .map(|group| {
                let records = group.records();
                let hits = records
                    .iter()
                    .filter(|r| r.description.contains(description))
                    .count();
                percentage(hits, records.len())
            })
            .unwrap_or(0.0)
    }

    /// Stops per borough in `year`, in [`Borough::ALL`] order.
    pub fn borough_counts(&self, year: i32) -> [(Borough, usize); 5] {
        let mut counts = Borough::ALL.map(|b| (b, 0usize));
        if let Some(group) = self.year(year) {
            for borough in group.records().iter().filter_map(Record::borough) {
                counts[borough as usize].1 += 1;
            }
        }
        counts
    }

    /// Borough with the most stops in `year`; ties go to the borough listed
    /// first in [`Borough::ALL`].
    ///
    /// `None` when the year is absent or none of its locations name a borough.
    pub fn most_common_borough(&self, year: i32) -> Option<Borough> {
        self.year(year)?;
        let mut best: Option<(Borough, usize)> = None;
        for (borough, count) in self.borough_counts(year) {
            if count > 0 && best.map_or(true, |(_, max)| count > max) {
                best = Some((borough, count));
            }
        }
        best.map(|(borough, _)| borough)
    }
}
