// Pitch-arsenal matchup scoring.
//
// Builds a pitcher's effective arsenal from multi-year pitch rows, compares
// the batter's history against each pitch type the pitcher actually leans
// on, and reduces the per-pitch advantages to a usage-weighted aggregate.

use crate::config::{LeagueAverages, RecencyWeights};
use crate::data::ArsenalRow;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Per-pitch advantages beyond this magnitude count as key strengths or
/// weaknesses.
const MATERIALITY_THRESHOLD: f64 = 1.0;
/// At most this many strengths/weaknesses are reported.
const KEY_PITCH_LIMIT: usize = 3;

// ---------------------------------------------------------------------------
// Pitch profiles
// ---------------------------------------------------------------------------

/// One pitch type pooled across years. For a pitcher this is a repertoire
/// entry (usage renormalized to sum to 100 across the arsenal); for a
/// batter it is their pooled performance against the pitch and usage is 0.
#[derive(Debug, Clone, Serialize)]
pub struct PitchProfile {
    pub pitch_type: String,
    pub pitch_name: String,
    pub usage_pct: f64,
    pub avg_velocity: f64,
    pub pitches: u32,
    pub pa: u32,
    pub ba: f64,
    pub slg: f64,
    pub woba: f64,
    pub whiff_pct: f64,
    pub hard_hit_rate: f64,
    pub k_rate: f64,
    pub rv100: f64,
}

impl PitchProfile {
    pub fn iso(&self) -> f64 {
        self.slg - self.ba
    }
}

#[derive(Debug, Default, Clone)]
struct PitchAccumulator {
    pitch_name: String,
    usage_sum: f64,
    velocity_sum: f64,
    ba_sum: f64,
    slg_sum: f64,
    woba_sum: f64,
    whiff_sum: f64,
    hard_hit_sum: f64,
    k_rate_sum: f64,
    rv100_sum: f64,
    weight: f64,
    pitches: u32,
    pa: u32,
}

impl PitchAccumulator {
    fn add(&mut self, row: &ArsenalRow, weight: f64) {
        if self.pitch_name.is_empty() && !row.pitch_name.is_empty() {
            self.pitch_name = row.pitch_name.clone();
        }
        self.usage_sum += row.usage_pct * weight;
        self.velocity_sum += row.avg_velocity * weight;
        self.ba_sum += row.ba * weight;
        self.slg_sum += row.slg * weight;
        self.woba_sum += row.woba * weight;
        self.whiff_sum += row.whiff_pct * weight;
        self.hard_hit_sum += row.hard_hit_rate * weight;
        self.k_rate_sum += row.k_rate() * weight;
        self.rv100_sum += row.rv100 * weight;
        self.weight += weight;
        self.pitches += row.pitches;
        self.pa += row.pa;
    }

    fn finish(self, pitch_type: String) -> PitchProfile {
        let w = if self.weight > 0.0 { self.weight } else { 1.0 };
        PitchProfile {
            pitch_name: if self.pitch_name.is_empty() {
                pitch_type.clone()
            } else {
                self.pitch_name
            },
            pitch_type,
            usage_pct: self.usage_sum / w,
            avg_velocity: self.velocity_sum / w,
            pitches: self.pitches,
            pa: self.pa,
            ba: self.ba_sum / w,
            slg: self.slg_sum / w,
            woba: self.woba_sum / w,
            whiff_pct: self.whiff_sum / w,
            hard_hit_rate: self.hard_hit_sum / w,
            k_rate: self.k_rate_sum / w,
            rv100: self.rv100_sum / w,
        }
    }
}

fn pool_by_pitch(rows: &[&ArsenalRow], recency: &RecencyWeights) -> Vec<PitchProfile> {
    let latest = match rows.iter().map(|r| r.year).max() {
        Some(y) => y,
        None => return Vec::new(),
    };
    let mut by_pitch: BTreeMap<String, PitchAccumulator> = BTreeMap::new();
    for row in rows {
        let back = (latest - row.year) as usize;
        let weight = recency.weight(back) * row.pitches.max(1) as f64;
        by_pitch
            .entry(row.pitch_type.clone())
            .or_default()
            .add(row, weight);
    }
    by_pitch
        .into_iter()
        .map(|(pitch_type, acc)| acc.finish(pitch_type))
        .collect()
}

/// Build a pitcher's effective arsenal from their pitch rows.
///
/// Usage is pooled with recency weighting, renormalized so the arsenal sums
/// to 100, and pitches under the usage floor are dropped. Sorted by usage,
/// heaviest first.
pub fn build_arsenal(
    rows: &[&ArsenalRow],
    recency: &RecencyWeights,
    min_usage_pct: f64,
) -> Vec<PitchProfile> {
    let mut arsenal = pool_by_pitch(rows, recency);
    let total_usage: f64 = arsenal.iter().map(|p| p.usage_pct).sum();
    if total_usage > 0.0 {
        for p in &mut arsenal {
            p.usage_pct = p.usage_pct / total_usage * 100.0;
        }
    }
    arsenal.retain(|p| p.usage_pct >= min_usage_pct);
    arsenal.sort_by(|a, b| {
        b.usage_pct
            .partial_cmp(&a.usage_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    arsenal
}

/// Pool a batter's history into per-pitch-type profiles.
pub fn batter_vs_pitch(
    rows: &[&ArsenalRow],
    recency: &RecencyWeights,
) -> HashMap<String, PitchProfile> {
    pool_by_pitch(rows, recency)
        .into_iter()
        .map(|p| (p.pitch_type.clone(), p))
        .collect()
}

// ---------------------------------------------------------------------------
// League baselines per pitch type
// ---------------------------------------------------------------------------

/// League-average performance against one pitch type.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PitchBaseline {
    pub woba: f64,
    pub ba: f64,
    pub whiff_pct: f64,
}

impl PitchBaseline {
    pub fn from_league(league: &LeagueAverages) -> Self {
        PitchBaseline {
            woba: league.woba,
            ba: league.avg,
            whiff_pct: league.whiff_pct,
        }
    }
}

/// PA-weighted league averages against each pitch type, computed from the
/// full batter population for the active years.
pub fn league_pitch_baselines(
    rows: &[ArsenalRow],
    active_years: &[u16],
) -> HashMap<String, PitchBaseline> {
    #[derive(Default)]
    struct Acc {
        woba: f64,
        ba: f64,
        whiff: f64,
        weight: f64,
    }
    let mut by_pitch: HashMap<String, Acc> = HashMap::new();
    for row in rows {
        if !active_years.is_empty() && !active_years.contains(&row.year) {
            continue;
        }
        if row.pa == 0 {
            continue;
        }
        let w = row.pa as f64;
        let acc = by_pitch.entry(row.pitch_type.clone()).or_default();
        acc.woba += row.woba * w;
        acc.ba += row.ba * w;
        acc.whiff += row.whiff_pct * w;
        acc.weight += w;
    }
    by_pitch
        .into_iter()
        .filter(|(_, acc)| acc.weight > 0.0)
        .map(|(pitch, acc)| {
            (
                pitch,
                PitchBaseline {
                    woba: acc.woba / acc.weight,
                    ba: acc.ba / acc.weight,
                    whiff_pct: acc.whiff / acc.weight,
                },
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Matchup scoring
// ---------------------------------------------------------------------------

/// Who a per-pitch advantage favors, on a fixed threshold ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchupEdge {
    StrongHitter,
    Hitter,
    Neutral,
    Pitcher,
    StrongPitcher,
}

impl MatchupEdge {
    pub fn from_advantage(advantage: f64) -> Self {
        if advantage > 2.0 {
            MatchupEdge::StrongHitter
        } else if advantage > 0.5 {
            MatchupEdge::Hitter
        } else if advantage >= -0.5 {
            MatchupEdge::Neutral
        } else if advantage >= -2.0 {
            MatchupEdge::Pitcher
        } else {
            MatchupEdge::StrongPitcher
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchupEdge::StrongHitter => "Strong hitter advantage",
            MatchupEdge::Hitter => "Hitter advantage",
            MatchupEdge::Neutral => "Neutral",
            MatchupEdge::Pitcher => "Pitcher advantage",
            MatchupEdge::StrongPitcher => "Strong pitcher advantage",
        }
    }
}

/// One pitch of the arsenal scored against the batter's history.
#[derive(Debug, Clone, Serialize)]
pub struct PitchMatchup {
    pub pitch_type: String,
    pub pitch_name: String,
    pub usage_pct: f64,
    pub advantage: f64,
    pub edge: MatchupEdge,
    /// Batter PA against this pitch type; 0 means the neutral default was used.
    pub sample_pa: u32,
    pub batter_woba: Option<f64>,
    pub batter_ba: Option<f64>,
    pub batter_whiff_pct: Option<f64>,
}

/// The arsenal-level verdict for one batter.
#[derive(Debug, Clone, Serialize)]
pub struct ArsenalMatchupResult {
    pub pitches: Vec<PitchMatchup>,
    pub overall_advantage: f64,
    pub key_strengths: Vec<String>,
    pub key_weaknesses: Vec<String>,
    pub has_data: bool,
}

impl ArsenalMatchupResult {
    /// Neutral result for a pitcher with no usable pitch-level data.
    pub fn no_data() -> Self {
        ArsenalMatchupResult {
            pitches: Vec::new(),
            overall_advantage: 0.0,
            key_strengths: Vec::new(),
            key_weaknesses: Vec::new(),
            has_data: false,
        }
    }
}

/// Per-pitch advantage: a linear combination of the batter's differentials
/// against the pitch's league average — wOBA x10, BA x5, minus whiff x0.1
/// (whiff in percentage points).
fn pitch_advantage(batter: &PitchProfile, baseline: &PitchBaseline) -> f64 {
    (batter.woba - baseline.woba) * 10.0 + (batter.ba - baseline.ba) * 5.0
        - (batter.whiff_pct - baseline.whiff_pct) * 0.1
}

/// Score a batter against a pitcher's arsenal.
///
/// A pitch the batter has never faced contributes a neutral zero without
/// leaving the usage denominator, so an unknown pitch dilutes rather than
/// inflates the aggregate.
pub fn analyze_arsenal(
    arsenal: &[PitchProfile],
    batter_by_pitch: &HashMap<String, PitchProfile>,
    baselines: &HashMap<String, PitchBaseline>,
    league: &LeagueAverages,
) -> ArsenalMatchupResult {
    if arsenal.is_empty() {
        return ArsenalMatchupResult::no_data();
    }

    let league_baseline = PitchBaseline::from_league(league);
    let mut pitches = Vec::with_capacity(arsenal.len());
    let mut weighted_sum = 0.0;
    let mut usage_sum = 0.0;

    for pitch in arsenal {
        let baseline = baselines
            .get(&pitch.pitch_type)
            .copied()
            .unwrap_or(league_baseline);
        let batter = batter_by_pitch
            .get(&pitch.pitch_type)
            .filter(|b| b.pa > 0);
        let advantage = match batter {
            Some(b) => pitch_advantage(b, &baseline),
            None => 0.0,
        };

        weighted_sum += advantage * pitch.usage_pct;
        usage_sum += pitch.usage_pct;

        pitches.push(PitchMatchup {
            pitch_type: pitch.pitch_type.clone(),
            pitch_name: pitch.pitch_name.clone(),
            usage_pct: pitch.usage_pct,
            advantage,
            edge: MatchupEdge::from_advantage(advantage),
            sample_pa: batter.map(|b| b.pa).unwrap_or(0),
            batter_woba: batter.map(|b| b.woba),
            batter_ba: batter.map(|b| b.ba),
            batter_whiff_pct: batter.map(|b| b.whiff_pct),
        });
    }

    let overall_advantage = if usage_sum > 0.0 {
        weighted_sum / usage_sum
    } else {
        0.0
    };

    let mut material: Vec<&PitchMatchup> = pitches
        .iter()
        .filter(|p| p.advantage.abs() > MATERIALITY_THRESHOLD)
        .collect();
    material.sort_by(|a, b| {
        b.advantage
            .abs()
            .partial_cmp(&a.advantage.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let key_strengths: Vec<String> = material
        .iter()
        .filter(|p| p.advantage > 0.0)
        .take(KEY_PITCH_LIMIT)
        .map(|p| p.pitch_name.clone())
        .collect();
    let key_weaknesses: Vec<String> = material
        .iter()
        .filter(|p| p.advantage < 0.0)
        .take(KEY_PITCH_LIMIT)
        .map(|p| p.pitch_name.clone())
        .collect();

    ArsenalMatchupResult {
        pitches,
        overall_advantage,
        key_strengths,
        key_weaknesses,
        has_data: true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn make_row(
        year: u16,
        pitch: &str,
        pitches: u32,
        usage: f64,
        pa: u32,
        ba: f64,
        woba: f64,
        whiff: f64,
    ) -> ArsenalRow {
        ArsenalRow {
            name: "Cole, Gerrit".to_string(),
            team: "NYY".to_string(),
            year,
            pitch_type: pitch.to_string(),
            pitch_name: format!("{pitch} pitch"),
            pitches,
            usage_pct: usage,
            avg_velocity: 92.0,
            pa,
            ab: pa,
            h: (pa as f64 * ba).round() as u32,
            hr: 0,
            so: 0,
            bb: 0,
            ba,
            slg: ba + 0.150,
            woba,
            whiff_pct: whiff,
            hard_hit_rate: 0.35,
            rv100: 0.0,
        }
    }

    fn profile(pitch: &str, usage: f64, pa: u32, ba: f64, woba: f64, whiff: f64) -> PitchProfile {
        PitchProfile {
            pitch_type: pitch.to_string(),
            pitch_name: format!("{pitch} pitch"),
            usage_pct: usage,
            avg_velocity: 92.0,
            pitches: 100,
            pa,
            ba,
            slg: ba + 0.150,
            woba,
            whiff_pct: whiff,
            hard_hit_rate: 0.35,
            k_rate: 0.22,
            rv100: 0.0,
        }
    }

    fn neutral_baselines() -> HashMap<String, PitchBaseline> {
        HashMap::new()
    }

    // -- Arsenal building --

    #[test]
    fn usage_renormalized_and_floor_applied() {
        let r1 = make_row(2025, "FF", 500, 48.0, 200, 0.250, 0.320, 24.0);
        let r2 = make_row(2025, "SL", 300, 28.0, 120, 0.230, 0.300, 30.0);
        let r3 = make_row(2025, "CH", 30, 4.0, 15, 0.300, 0.360, 20.0);
        let rows = vec![&r1, &r2, &r3];
        let arsenal = build_arsenal(&rows, &RecencyWeights::default(), 5.0);

        // CH sits at 4/80 = 5% exactly after renormalization and survives;
        // the shares sum to 100.
        assert_eq!(arsenal.len(), 3);
        let total: f64 = arsenal.iter().map(|p| p.usage_pct).sum();
        assert!(approx_eq(total, 100.0));
        assert_eq!(arsenal[0].pitch_type, "FF");
        assert!(approx_eq(arsenal[0].usage_pct, 60.0));
    }

    #[test]
    fn rare_pitch_dropped_below_floor() {
        let r1 = make_row(2025, "FF", 500, 58.0, 200, 0.250, 0.320, 24.0);
        let r2 = make_row(2025, "EP", 10, 2.0, 4, 0.500, 0.600, 5.0);
        let rows = vec![&r1, &r2];
        let arsenal = build_arsenal(&rows, &RecencyWeights::default(), 5.0);
        assert_eq!(arsenal.len(), 1);
        assert_eq!(arsenal[0].pitch_type, "FF");
        // Renormalization happens before the floor: FF keeps its 58/60
        // share; the dropped eephus does not inflate the survivor to 100.
        assert!(approx_eq(arsenal[0].usage_pct, 58.0 / 60.0 * 100.0));
        assert!(arsenal[0].usage_pct < 100.0);
    }

    #[test]
    fn multi_year_arsenal_pools_with_recency() {
        let r1 = make_row(2025, "FF", 100, 50.0, 100, 0.300, 0.400, 20.0);
        let r2 = make_row(2024, "FF", 100, 50.0, 100, 0.200, 0.300, 30.0);
        let rows = vec![&r1, &r2];
        let arsenal = build_arsenal(&rows, &RecencyWeights::default(), 5.0);
        assert_eq!(arsenal.len(), 1);
        let expected_ba = (0.300 * 4.0 + 0.200 * 2.0) / 6.0;
        assert!(approx_eq(arsenal[0].ba, expected_ba));
    }

    #[test]
    fn empty_rows_give_empty_arsenal() {
        let arsenal = build_arsenal(&[], &RecencyWeights::default(), 5.0);
        assert!(arsenal.is_empty());
    }

    // -- Advantage math --

    #[test]
    fn advantage_linear_combination() {
        let batter = profile("FF", 0.0, 100, 0.300, 0.400, 20.0);
        let baseline = PitchBaseline {
            woba: 0.320,
            ba: 0.245,
            whiff_pct: 24.0,
        };
        let adv = pitch_advantage(&batter, &baseline);
        // (0.08 * 10) + (0.055 * 5) - (-4 * 0.1) = 0.8 + 0.275 + 0.4
        assert!(approx_eq(adv, 1.475));
    }

    #[test]
    fn weighted_average_identity() {
        // If every per-pitch advantage equals X, the aggregate equals X
        // regardless of the usage distribution.
        let league = LeagueAverages::default();
        let arsenal = vec![
            profile("FF", 55.0, 100, 0.245, 0.320, 24.0),
            profile("SL", 30.0, 100, 0.245, 0.320, 24.0),
            profile("CH", 15.0, 100, 0.245, 0.320, 24.0),
        ];
        // Batter beats the default league baseline identically on each pitch.
        let mut batter = HashMap::new();
        for p in ["FF", "SL", "CH"] {
            batter.insert(p.to_string(), profile(p, 0.0, 80, 0.295, 0.370, 24.0));
        }
        let result = analyze_arsenal(&arsenal, &batter, &neutral_baselines(), &league);
        let expected = (0.370 - 0.320) * 10.0 + (0.295 - 0.245) * 5.0;
        assert!(approx_eq(result.overall_advantage, expected));
        for p in &result.pitches {
            assert!(approx_eq(p.advantage, expected));
        }
    }

    #[test]
    fn unknown_pitch_contributes_neutral_zero() {
        let league = LeagueAverages::default();
        let arsenal = vec![
            profile("FF", 50.0, 100, 0.245, 0.320, 24.0),
            profile("KC", 50.0, 100, 0.245, 0.320, 24.0),
        ];
        let mut batter = HashMap::new();
        batter.insert("FF".to_string(), profile("FF", 0.0, 80, 0.345, 0.420, 24.0));
        let result = analyze_arsenal(&arsenal, &batter, &neutral_baselines(), &league);

        let ff_adv = (0.420 - 0.320) * 10.0 + (0.345 - 0.245) * 5.0;
        // The unseen pitch halves the aggregate instead of being excluded.
        assert!(approx_eq(result.overall_advantage, ff_adv / 2.0));
        assert!(approx_eq(result.pitches[1].advantage, 0.0));
        assert_eq!(result.pitches[1].sample_pa, 0);
    }

    #[test]
    fn empty_arsenal_is_no_data() {
        let league = LeagueAverages::default();
        let result = analyze_arsenal(&[], &HashMap::new(), &neutral_baselines(), &league);
        assert!(!result.has_data);
        assert!(approx_eq(result.overall_advantage, 0.0));
    }

    #[test]
    fn key_strengths_and_weaknesses_sorted_and_capped() {
        let league = LeagueAverages::default();
        let arsenal = vec![
            profile("FF", 30.0, 100, 0.245, 0.320, 24.0),
            profile("SL", 25.0, 100, 0.245, 0.320, 24.0),
            profile("CH", 20.0, 100, 0.245, 0.320, 24.0),
            profile("CU", 15.0, 100, 0.245, 0.320, 24.0),
            profile("SI", 10.0, 100, 0.245, 0.320, 24.0),
        ];
        let mut batter = HashMap::new();
        // Three clear strengths of increasing size, one weakness, one neutral.
        batter.insert("FF".to_string(), profile("FF", 0.0, 80, 0.295, 0.450, 24.0));
        batter.insert("SL".to_string(), profile("SL", 0.0, 80, 0.345, 0.520, 24.0));
        batter.insert("CH".to_string(), profile("CH", 0.0, 80, 0.270, 0.430, 24.0));
        batter.insert("CU".to_string(), profile("CU", 0.0, 80, 0.150, 0.180, 38.0));
        batter.insert("SI".to_string(), profile("SI", 0.0, 80, 0.245, 0.320, 24.0));
        let result = analyze_arsenal(&arsenal, &batter, &neutral_baselines(), &league);

        assert_eq!(result.key_strengths.len(), 3);
        assert_eq!(result.key_strengths[0], "SL pitch");
        assert_eq!(result.key_weaknesses, vec!["CU pitch".to_string()]);
    }

    // -- Edge ladder --

    #[test]
    fn edge_ladder_thresholds() {
        assert_eq!(MatchupEdge::from_advantage(2.5), MatchupEdge::StrongHitter);
        assert_eq!(MatchupEdge::from_advantage(1.0), MatchupEdge::Hitter);
        assert_eq!(MatchupEdge::from_advantage(0.0), MatchupEdge::Neutral);
        assert_eq!(MatchupEdge::from_advantage(-0.5), MatchupEdge::Neutral);
        assert_eq!(MatchupEdge::from_advantage(-1.0), MatchupEdge::Pitcher);
        assert_eq!(MatchupEdge::from_advantage(-2.5), MatchupEdge::StrongPitcher);
    }

    // -- League baselines --

    #[test]
    fn baselines_pa_weighted_and_year_filtered() {
        let rows = vec![
            make_row(2025, "FF", 100, 0.0, 300, 0.300, 0.400, 20.0),
            make_row(2025, "FF", 100, 0.0, 100, 0.200, 0.280, 28.0),
            make_row(2020, "FF", 100, 0.0, 400, 0.150, 0.150, 40.0),
        ];
        let baselines = league_pitch_baselines(&rows, &[2025]);
        let b = baselines.get("FF").unwrap();
        assert!(approx_eq(b.ba, (0.300 * 300.0 + 0.200 * 100.0) / 400.0));
        assert!(approx_eq(b.woba, (0.400 * 300.0 + 0.280 * 100.0) / 400.0));
    }
}
