//! Numerology attributes fed into rule evaluation, plus the Pythagorean
//! calculators product callers use to derive them. Master numbers 11, 22,
//! and 33 survive digit reduction.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumerologyKey {
    LifePath,
    Expression,
    SoulUrge,
    Personality,
    PersonalYear,
    PersonalMonth,
    PersonalDay,
}

impl NumerologyKey {
    /// Semantic-key parse; unknown keys yield None and are ignored upstream.
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "life_path" => Some(NumerologyKey::LifePath),
            "expression" => Some(NumerologyKey::Expression),
            "soul_urge" => Some(NumerologyKey::SoulUrge),
            "personality" => Some(NumerologyKey::Personality),
            "personal_year" => Some(NumerologyKey::PersonalYear),
            "personal_month" => Some(NumerologyKey::PersonalMonth),
            "personal_day" => Some(NumerologyKey::PersonalDay),
            _ => None,
        }
    }
}

impl fmt::Display for NumerologyKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NumerologyKey::LifePath => "life_path",
            NumerologyKey::Expression => "expression",
            NumerologyKey::SoulUrge => "soul_urge",
            NumerologyKey::Personality => "personality",
            NumerologyKey::PersonalYear => "personal_year",
            NumerologyKey::PersonalMonth => "personal_month",
            NumerologyKey::PersonalDay => "personal_day",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumerologyEntry {
    pub number: u32,
    pub label: String,
}

pub type NumerologyProfile = HashMap<NumerologyKey, NumerologyEntry>;

/// Parses a caller-supplied `{semantic_key -> entry}` map, dropping any
/// keys outside the known vocabulary.
pub fn parse_profile(raw: &HashMap<String, NumerologyEntry>) -> NumerologyProfile {
    raw.iter()
        .filter_map(|(key, entry)| NumerologyKey::parse(key).map(|k| (k, entry.clone())))
        .collect()
}

// ---------------------------
// ## Calculators
// ---------------------------

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Reduces to a single digit, stopping at the master numbers.
pub fn reduce(mut n: u32) -> u32 {
    while n > 9 && n != 11 && n != 22 && n != 33 {
        n = digit_sum(n);
    }
    n
}

/// Life path: reduced sum of the reduced year, month, and day.
pub fn life_path(birth: NaiveDate) -> u32 {
    let year = reduce(digit_sum(birth.year().unsigned_abs()));
    let month = reduce(birth.month());
    let day = reduce(birth.day());
    reduce(year + month + day)
}

/// Personal year: birth month + birth day + current calendar year, reduced.
pub fn personal_year(birth: NaiveDate, today: NaiveDate) -> u32 {
    let year = reduce(digit_sum(today.year().unsigned_abs()));
    reduce(reduce(birth.month()) + reduce(birth.day()) + year)
}

pub fn personal_month(birth: NaiveDate, today: NaiveDate) -> u32 {
    reduce(personal_year(birth, today) + reduce(today.month()))
}

pub fn personal_day(birth: NaiveDate, today: NaiveDate) -> u32 {
    reduce(personal_month(birth, today) + reduce(today.day()))
}

/// Pythagorean letter value, 1..=9. Non-letters contribute nothing.
fn letter_value(c: char) -> u32 {
    match c.to_ascii_lowercase() {
        'a' | 'j' | 's' => 1,
        'b' | 'k' | 't' => 2,
        'c' | 'l' | 'u' => 3,
        'd' | 'm' | 'v' => 4,
        'e' | 'n' | 'w' => 5,
        'f' | 'o' | 'x' => 6,
        'g' | 'p' | 'y' => 7,
        'h' | 'q' | 'z' => 8,
        'i' | 'r' => 9,
        _ => 0,
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

fn name_sum(name: &str, filter: impl Fn(char) -> bool) -> u32 {
    reduce(
        name.chars()
            .filter(|c| c.is_ascii_alphabetic() && filter(*c))
            .map(letter_value)
            .sum(),
    )
}

/// Expression number: every letter of the full name.
pub fn expression(name: &str) -> u32 {
    name_sum(name, |_| true)
}

/// Soul urge: vowels only.
pub fn soul_urge(name: &str) -> u32 {
    name_sum(name, is_vowel)
}

/// Personality: consonants only.
pub fn personality(name: &str) -> u32 {
    name_sum(name, |c| !is_vowel(c))
}

/// Full profile for a subject, labels included, ready for `evaluate`.
pub fn profile_for(name: &str, birth: NaiveDate, today: NaiveDate) -> NumerologyProfile {
    let entry = |key: NumerologyKey, number: u32| {
        (
            key,
            NumerologyEntry {
                number,
                label: key.to_string(),
            },
        )
    };
    [
        entry(NumerologyKey::LifePath, life_path(birth)),
        entry(NumerologyKey::Expression, expression(name)),
        entry(NumerologyKey::SoulUrge, soul_urge(name)),
        entry(NumerologyKey::Personality, personality(name)),
        entry(NumerologyKey::PersonalYear, personal_year(birth, today)),
        entry(NumerologyKey::PersonalMonth, personal_month(birth, today)),
        entry(NumerologyKey::PersonalDay, personal_day(birth, today)),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reduce_preserves_master_numbers() {
        assert_eq!(reduce(11), 11);
        assert_eq!(reduce(22), 22);
        assert_eq!(reduce(33), 33);
        assert_eq!(reduce(29), 11); // 2 + 9
        assert_eq!(reduce(38), 11);
        assert_eq!(reduce(39), 3); // 3 + 9 = 12 -> 3
        assert_eq!(reduce(7), 7);
    }

    #[test]
    fn life_path_classic_example() {
        // 1990-03-15: year 1+9+9+0=19->1, month 3, day 15->6; 1+3+6=10->1
        assert_eq!(life_path(date(1990, 3, 15)), 1);
    }

    #[test]
    fn personal_cycles_chain() {
        let birth = date(1990, 3, 15);
        let today = date(2026, 8, 24);
        let year = personal_year(birth, today);
        let month = personal_month(birth, today);
        let day = personal_day(birth, today);
        for n in [year, month, day] {
            assert!(n >= 1 && (n <= 9 || n == 11 || n == 22 || n == 33));
        }
        assert_eq!(month, reduce(year + reduce(8)));
    }

    #[test]
    fn name_numbers_split_vowels_and_consonants() {
        let name = "Ada Lovelace";
        let all = expression(name);
        let vowels = soul_urge(name);
        let consonants = personality(name);
        assert!(all >= 1);
        // Expression is the reduction of the unreduced vowel+consonant sums,
        // so the parts must themselves be valid numerology numbers.
        for n in [all, vowels, consonants] {
            assert!(n <= 9 || n == 11 || n == 22 || n == 33);
        }
    }

    #[test]
    fn unknown_semantic_keys_are_ignored() {
        let mut raw = HashMap::new();
        raw.insert(
            "life_path".to_string(),
            NumerologyEntry { number: 7, label: "Life Path".to_string() },
        );
        raw.insert(
            "destiny_matrix".to_string(),
            NumerologyEntry { number: 5, label: "Unknown".to_string() },
        );
        let profile = parse_profile(&raw);
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[&NumerologyKey::LifePath].number, 7);
    }
}
