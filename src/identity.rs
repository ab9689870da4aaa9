// Player identity resolution across inconsistent name formats.
//
// Historical records are keyed by "Last, First" names; callers arrive with
// short display names ("A. Judge"), canonical full names, or roster
// aliases. Every downstream analyzer resolves through this module so the
// matching semantics stay consistent.

use crate::data::{ArsenalRow, ExitVeloRecord, GameLog, RosterEntry};
use std::collections::BTreeMap;
use strsim::normalized_levenshtein;

/// Fuzzy-match acceptance threshold when a canonical full name is supplied.
const FUZZY_THRESHOLD_FULL: f64 = 0.75;
/// Fuzzy-match acceptance threshold for short display names.
const FUZZY_THRESHOLD_SHORT: f64 = 0.8;
/// Two fuzzy candidates closer than this are considered tied.
const FUZZY_TIE_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Query + record access
// ---------------------------------------------------------------------------

/// A player reference as supplied by a caller: a display name (possibly a
/// short form), an optional canonical full name, and a team code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub name: String,
    pub full_name: Option<String>,
    pub team: String,
}

impl PlayerRef {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        PlayerRef {
            name: name.into(),
            full_name: None,
            team: team.into(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}

/// Anything keyed by a player name + team that the resolver can search.
pub trait NamedRecord {
    fn player_name(&self) -> &str;
    fn player_team(&self) -> &str;
}

impl NamedRecord for ArsenalRow {
    fn player_name(&self) -> &str {
        &self.name
    }
    fn player_team(&self) -> &str {
        &self.team
    }
}

impl NamedRecord for GameLog {
    fn player_name(&self) -> &str {
        &self.name
    }
    fn player_team(&self) -> &str {
        &self.team
    }
}

impl NamedRecord for ExitVeloRecord {
    fn player_name(&self) -> &str {
        &self.name
    }
    fn player_team(&self) -> &str {
        &self.team
    }
}

impl NamedRecord for RosterEntry {
    fn player_name(&self) -> &str {
        &self.name
    }
    fn player_team(&self) -> &str {
        &self.team
    }
}

// ---------------------------------------------------------------------------
// Name canonicalization (pure, idempotent)
// ---------------------------------------------------------------------------

/// Generational suffix tokens normalized to a fixed spelling.
fn normalize_suffix(token: &str) -> Option<&'static str> {
    match token.trim_end_matches('.').to_lowercase().as_str() {
        "jr" => Some("Jr"),
        "sr" => Some("Sr"),
        "ii" => Some("II"),
        "iii" => Some("III"),
        "iv" => Some("IV"),
        _ => None,
    }
}

fn is_suffix(token: &str) -> bool {
    normalize_suffix(token).is_some()
}

/// Title-case a single name token, preserving interior capitalization
/// ("McCutchen" stays intact; "JUDGE" becomes "Judge").
fn title_case_token(token: &str) -> String {
    let mut chars = token.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return String::new(),
    };
    let rest: String = chars.collect();
    let rest = if !rest.is_empty() && rest.chars().all(|c| !c.is_lowercase()) {
        rest.to_lowercase()
    } else {
        rest
    };
    format!("{}{}", first.to_uppercase(), rest)
}

/// Canonicalize a player name into "First Last [Suffix]" form.
///
/// Trims and collapses whitespace, strips periods from initials,
/// title-cases tokens, converts "Last, First" ordering to "First Last",
/// and normalizes suffix tokens. Idempotent: canonicalizing a canonical
/// name returns it unchanged.
pub fn canonical_name(raw: &str) -> String {
    let cleaned = raw.replace('.', " ");
    let (last_part, first_part) = match cleaned.split_once(',') {
        Some((last, first)) => (last.to_string(), first.to_string()),
        None => (String::new(), cleaned),
    };

    let mut tokens: Vec<String> = Vec::new();
    for token in first_part.split_whitespace().chain(last_part.split_whitespace()) {
        match normalize_suffix(token) {
            Some(suffix) => tokens.push(suffix.to_string()),
            None => tokens.push(title_case_token(token)),
        }
    }

    // A suffix belongs at the very end, after the surname.
    let suffixes: Vec<String> = tokens
        .iter()
        .filter(|t| is_suffix(t.as_str()))
        .cloned()
        .collect();
    let mut names: Vec<String> = tokens
        .into_iter()
        .filter(|t| !is_suffix(t.as_str()))
        .collect();
    names.extend(suffixes);
    names.join(" ")
}

/// Convert a name to the "Last, First [Suffix]" record-key form.
/// Accepts either ordering; single-token names pass through unchanged.
pub fn to_last_first(name: &str) -> String {
    let canonical = canonical_name(name);
    let tokens: Vec<&str> = canonical.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.len() < 2 {
        return canonical;
    }

    let (names, suffixes): (Vec<&str>, Vec<&str>) =
        tokens.iter().copied().partition(|t| !is_suffix(t));
    if names.len() < 2 {
        return canonical;
    }
    let last = names[names.len() - 1];
    let firsts = names[..names.len() - 1].join(" ");
    let mut key = format!("{last}, {firsts}");
    for suffix in suffixes {
        key.push(' ');
        key.push_str(suffix);
    }
    key
}

/// Last name of a canonicalized query, used for prefix matching.
fn last_name(name: &str) -> Option<String> {
    let canonical = canonical_name(name);
    canonical
        .split(' ')
        .filter(|t| !t.is_empty() && !is_suffix(t))
        .last()
        .map(|t| t.to_string())
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

fn team_matches(query_team: &str, record_team: &str) -> bool {
    query_team.is_empty()
        || record_team.is_empty()
        || query_team.eq_ignore_ascii_case(record_team)
}

/// Resolve a player reference against a pool of records.
///
/// Strategies in priority order, first hit wins: exact full-name key,
/// exact short-name key, last-name prefix with team disambiguation, then
/// fuzzy similarity. Returns every record under the matched key (a traded
/// player's rows across teams stay together), or an empty vector when no
/// strategy succeeds — never an error; callers treat empty as
/// "insufficient data".
pub fn resolve<'a, R: NamedRecord>(query: &PlayerRef, pool: &'a [R]) -> Vec<&'a R> {
    if pool.is_empty() || query.name.trim().is_empty() {
        return Vec::new();
    }

    // Group the pool by record key; BTreeMap keeps candidate iteration
    // deterministic.
    let mut by_key: BTreeMap<String, Vec<&R>> = BTreeMap::new();
    for record in pool {
        by_key
            .entry(record.player_name().to_string())
            .or_default()
            .push(record);
    }

    // 1. Exact match on the canonical full name.
    if let Some(full) = &query.full_name {
        if let Some(rows) = exact_key_match(&to_last_first(full), &query.team, &by_key) {
            return rows;
        }
    }

    // 2. Exact match on the short name.
    if let Some(rows) = exact_key_match(&to_last_first(&query.name), &query.team, &by_key) {
        return rows;
    }

    // 3. Last-name prefix + team disambiguation.
    let query_last = query
        .full_name
        .as_deref()
        .and_then(last_name)
        .or_else(|| last_name(&query.name));
    if let Some(last) = query_last {
        let prefix = format!("{last},");
        let mut candidates: Vec<&String> = by_key
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .collect();
        if candidates.len() > 1 {
            candidates.retain(|key| {
                by_key[*key]
                    .iter()
                    .any(|r| team_matches(&query.team, r.player_team()))
            });
        }
        if candidates.len() == 1 {
            return by_key[candidates[0]].clone();
        }
    }

    // 4. Fuzzy similarity over canonical forms; ties return no match.
    let threshold = if query.full_name.is_some() {
        FUZZY_THRESHOLD_FULL
    } else {
        FUZZY_THRESHOLD_SHORT
    };
    let query_canonical = canonical_name(
        query.full_name.as_deref().unwrap_or(&query.name),
    );
    let mut best: Option<(&String, f64)> = None;
    let mut tied = false;
    for key in by_key.keys() {
        let score = normalized_levenshtein(&query_canonical, &canonical_name(key));
        match best {
            Some((_, best_score)) if (score - best_score).abs() < FUZZY_TIE_EPSILON => {
                tied = true;
            }
            Some((_, best_score)) if score > best_score => {
                best = Some((key, score));
                tied = false;
            }
            None => {
                best = Some((key, score));
                tied = false;
            }
            _ => {}
        }
    }
    match best {
        Some((key, score)) if !tied && score >= threshold => by_key[key].clone(),
        _ => Vec::new(),
    }
}

fn exact_key_match<'a, R: NamedRecord>(
    key: &str,
    team: &str,
    by_key: &BTreeMap<String, Vec<&'a R>>,
) -> Option<Vec<&'a R>> {
    let rows = by_key.get(key)?;
    if rows.iter().any(|r| team_matches(team, r.player_team())) {
        Some(rows.clone())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
