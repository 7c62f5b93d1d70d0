//! US state lookup table.
//!
//! Maps between two-digit FIPS codes, two-letter postal abbreviations and
//! full names for the 50 US states, DC and Puerto Rico. Datasets and
//! boundary files disagree on which of the three they use, so every
//! lookup here accepts any of them.

/// One row of the state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsState {
    /// Two-digit FIPS code (e.g. "06").
    pub fips: &'static str,
    /// Two-letter postal abbreviation (e.g. "CA").
    pub abbr: &'static str,
    /// Full name (e.g. "California").
    pub name: &'static str,
}

const fn state(fips: &'static str, abbr: &'static str, name: &'static str) -> UsState {
    UsState { fips, abbr, name }
}

/// The 50 states, DC and Puerto Rico, ordered by FIPS code.
pub const US_STATES: &[UsState] = &[
    state("01", "AL", "Alabama"),
    state("02", "AK", "Alaska"),
    state("04", "AZ", "Arizona"),
    state("05", "AR", "Arkansas"),
    state("06", "CA", "California"),
    state("08", "CO", "Colorado"),
    state("09", "CT", "Connecticut"),
    state("10", "DE", "Delaware"),
    state("11", "DC", "District of Columbia"),
    state("12", "FL", "Florida"),
    state("13", "GA", "Georgia"),
    state("15", "HI", "Hawaii"),
    state("16", "ID", "Idaho"),
    state("17", "IL", "Illinois"),
    state("18", "IN", "Indiana"),
    state("19", "IA", "Iowa"),
    state("20", "KS", "Kansas"),
    state("21", "KY", "Kentucky"),
    state("22", "LA", "Louisiana"),
    state("23", "ME", "Maine"),
    state("24", "MD", "Maryland"),
    state("25", "MA", "Massachusetts"),
    state("26", "MI", "Michigan"),
    state("27", "MN", "Minnesota"),
    state("28", "MS", "Mississippi"),
    state("29", "MO", "Missouri"),
    state("30", "MT", "Montana"),
    state("31", "NE", "Nebraska"),
    state("32", "NV", "Nevada"),
    state("33", "NH", "New Hampshire"),
    state("34", "NJ", "New Jersey"),
    state("35", "NM", "New Mexico"),
    state("36", "NY", "New York"),
    state("37", "NC", "North Carolina"),
    state("38", "ND", "North Dakota"),
    state("39", "OH", "Ohio"),
    state("40", "OK", "Oklahoma"),
    state("41", "OR", "Oregon"),
    state("42", "PA", "Pennsylvania"),
    state("44", "RI", "Rhode Island"),
    state("45", "SC", "South Carolina"),
    state("46", "SD", "South Dakota"),
    state("47", "TN", "Tennessee"),
    state("48", "TX", "Texas"),
    state("49", "UT", "Utah"),
    state("50", "VT", "Vermont"),
    state("51", "VA", "Virginia"),
    state("53", "WA", "Washington"),
    state("54", "WV", "West Virginia"),
    state("55", "WI", "Wisconsin"),
    state("56", "WY", "Wyoming"),
    state("72", "PR", "Puerto Rico"),
];

/// Finds a state by FIPS code, abbreviation or full name.
///
/// Abbreviations and names match case-insensitively and ignore
/// surrounding whitespace.
#[must_use]
pub fn lookup_state(key: &str) -> Option<&'static UsState> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    US_STATES.iter().find(|s| {
        s.fips == key || s.abbr.eq_ignore_ascii_case(key) || s.name.eq_ignore_ascii_case(key)
    })
}

/// Returns `true` if `a` and `b` identify the same state through the
/// table (e.g. "CA" and "california").
#[must_use]
pub fn same_state(a: &str, b: &str) -> bool {
    match (lookup_state(a), lookup_state(b)) {
        (Some(a), Some(b)) => a.fips == b.fips,
        _ => false,
    }
}
