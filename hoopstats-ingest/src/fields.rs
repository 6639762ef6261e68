//! Field catalog: upstream column names to canonical field names
//!
//! All naming and unit decisions are table-driven from here; nothing infers a
//! unit from a value's magnitude.

/// Mandatory display name attribute
pub const DISPLAY_NAME: &str = "display_name";

/// Per-game career and season columns (`playercareerstats`, PerMode=PerGame)
pub const STAT_COLUMNS: &[(&str, &str)] = &[
    ("GP", "games_played"),
    ("PTS", "points_per_game"),
    ("AST", "assists_per_game"),
    ("REB", "rebounds_per_game"),
    ("STL", "steals"),
    ("BLK", "blocks"),
    ("FG_PCT", "field_goal_pct"),
    ("FG3_PCT", "three_point_pct"),
    ("FT_PCT", "free_throw_pct"),
];

/// Profile columns (`commonplayerinfo`)
pub const PROFILE_COLUMNS: &[(&str, &str)] = &[
    ("DISPLAY_FIRST_LAST", DISPLAY_NAME),
    ("TEAM_NAME", "team"),
    ("TEAM_ABBREVIATION", "team_abbreviation"),
    ("POSITION", "position"),
    ("HEIGHT", "height"),
    ("WEIGHT", "weight"),
    ("COUNTRY", "country"),
    ("BIRTHDATE", "birthdate"),
    ("JERSEY", "jersey"),
];

/// Optional fields every finished record carries, `Unknown` when no tier had them
pub const OPTIONAL_FIELDS: &[&str] = &[
    "team",
    "position",
    "height",
    "weight",
    "country",
    "games_played",
    "points_per_game",
    "assists_per_game",
    "rebounds_per_game",
    "steals",
    "blocks",
    "field_goal_pct",
    "three_point_pct",
    "free_throw_pct",
];

/// Default metric order for side-by-side comparison
pub const DEFAULT_COMPARISON_METRICS: &[&str] = &[
    "games_played",
    "points_per_game",
    "assists_per_game",
    "rebounds_per_game",
    "steals",
    "blocks",
    "field_goal_pct",
    "three_point_pct",
    "free_throw_pct",
];

/// Field name suffixes that mark a 0..1 ratio reported as a percentage
pub const PERCENTAGE_SUFFIXES: &[&str] = &["_pct", "_PCT", "_percentage"];

/// Canonical name for a stat column
pub fn stat_field(column: &str) -> Option<&'static str> {
    lookup(STAT_COLUMNS, column)
}

/// Canonical name for a profile column
pub fn profile_field(column: &str) -> Option<&'static str> {
    lookup(PROFILE_COLUMNS, column)
}

pub fn is_percentage(field: &str) -> bool {
    PERCENTAGE_SUFFIXES.iter().any(|suffix| field.ends_with(suffix))
}

/// Normalize a free-form label (e.g. a page info key) into a field name
pub fn normalize_key(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn lookup(table: &[(&str, &'static str)], column: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(col, _)| *col == column)
        .map(|(_, field)| *field)
}
