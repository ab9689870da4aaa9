// The composite scorer: folds the arsenal verdict, overall batter and
// pitcher quality, trend bonuses, contextual factors, and the platoon
// factor into one advantage score, then derives categorical ratings,
// predicted rates, per-game outcome probabilities, and an aggregate
// confidence. Also hosts the HR-specific potential variant.
//
// Components are scored on a 0-100 scale with 50 neutral; a component with
// no data sits exactly at neutral so it can never fail the composite.

use crate::analysis::aggregate::{PlayerProfile, SeasonAggregate};
use crate::analysis::arsenal::{ArsenalMatchupResult, PitchProfile};
use crate::analysis::confidence::{adjust, confidence};
use crate::analysis::ranges::{normalize, MetricRange};
use crate::analysis::trends::{recent_bonus, RecentForm, TrendDirection, TrendResult};
use crate::config::{PlatoonFactors, ScoringConfig};
use crate::data::{ExitVeloRecord, Handedness};
use serde::Serialize;
use std::collections::HashMap;

const NEUTRAL: f64 = 50.0;
/// Arsenal advantage is roughly ±5; this maps it onto the component scale.
const ARSENAL_COMPONENT_SCALE: f64 = 10.0;
/// Signed ISO year-over-year change is scaled by this in the context sum.
const ISO_TREND_SCALE: f64 = 150.0;
/// Recent average this far above the pooled average flags a hot batter.
const HOT_AVG_MARGIN: f64 = 0.030;
/// Recent average this far below the pooled average flags a cold batter.
const COLD_AVG_MARGIN: f64 = 0.050;
/// The contextual sub-scores are bounded to this band around neutral.
const CONTEXT_CLAMP: f64 = 50.0;
/// A pitch with at least this usage share can count as an HR vulnerability.
const VULNERABLE_USAGE_PCT: f64 = 15.0;
/// Batter ISO against a pitch above this multiple of league ISO marks it
/// vulnerable.
const VULNERABLE_ISO_RATIO: f64 = 1.3;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rating {
    High,
    Medium,
    Low,
}

/// Seven-level matchup label derived from the signed advantage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdvantageLabel {
    StrongBatter,
    Batter,
    SlightBatter,
    Neutral,
    SlightPitcher,
    Pitcher,
    StrongPitcher,
}

impl AdvantageLabel {
    pub fn from_advantage(advantage: f64) -> Self {
        if advantage >= 20.0 {
            AdvantageLabel::StrongBatter
        } else if advantage >= 10.0 {
            AdvantageLabel::Batter
        } else if advantage >= 3.0 {
            AdvantageLabel::SlightBatter
        } else if advantage > -3.0 {
            AdvantageLabel::Neutral
        } else if advantage > -10.0 {
            AdvantageLabel::SlightPitcher
        } else if advantage > -20.0 {
            AdvantageLabel::Pitcher
        } else {
            AdvantageLabel::StrongPitcher
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdvantageLabel::StrongBatter => "Strong Batter Advantage",
            AdvantageLabel::Batter => "Batter Advantage",
            AdvantageLabel::SlightBatter => "Slight Batter Advantage",
            AdvantageLabel::Neutral => "Neutral",
            AdvantageLabel::SlightPitcher => "Slight Pitcher Advantage",
            AdvantageLabel::Pitcher => "Pitcher Advantage",
            AdvantageLabel::StrongPitcher => "Strong Pitcher Advantage",
        }
    }
}

/// The six component scores (0-100, 50 neutral) plus the platoon factor
/// applied to their weighted sum.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComponentBreakdown {
    pub arsenal: f64,
    pub batter_overall: f64,
    pub pitcher_overall: f64,
    pub historical: f64,
    pub recent_form: f64,
    pub contextual: f64,
    pub platoon_factor: f64,
}

/// Confidence-adjusted baselines scaled by the matchup advantage and
/// clamped to sane baseball ranges.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PredictedRates {
    pub ba: f64,
    pub slg: f64,
    pub woba: f64,
    pub hr_rate: f64,
    pub k_rate: f64,
}

/// Estimated chance (percent) of at least one such outcome in a game.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutcomeProbabilities {
    pub hr: f64,
    pub hit: f64,
    pub reach_base: f64,
    pub strikeout: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutcomeRatings {
    pub hit: Rating,
    pub hr: Rating,
    pub total_bases: Rating,
    pub strikeout: Rating,
}

/// The final matchup verdict.
#[derive(Debug, Clone, Serialize)]
pub struct MatchupScore {
    pub batter: String,
    pub pitcher: String,
    /// Weighted composite on the 0-100 component scale.
    pub score: f64,
    /// Signed advantage relative to neutral; positive favors the batter.
    pub advantage: f64,
    pub label: AdvantageLabel,
    pub ratings: OutcomeRatings,
    pub predicted: PredictedRates,
    pub probabilities: OutcomeProbabilities,
    pub confidence: f64,
    pub components: ComponentBreakdown,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// "Due for a HR" counters taken from the batter's game logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DueContext {
    pub ab_since_last_hr: Option<u32>,
    pub hits_since_last_hr: Option<u32>,
    pub expected_ab_per_hr: Option<f64>,
}

/// Everything the composite scorer consumes, assembled by the engine from
/// the resolved sub-analyses. All inputs are read-only.
pub struct MatchupContext<'a> {
    pub batter_name: &'a str,
    pub pitcher_name: &'a str,
    pub batter: &'a PlayerProfile,
    pub pitcher: &'a PlayerProfile,
    pub arsenal: &'a ArsenalMatchupResult,
    pub historical: &'a [TrendResult],
    pub iso_trend: Option<&'a TrendResult>,
    pub recent: Option<&'a RecentForm>,
    pub season: Option<&'a SeasonAggregate>,
    pub batter_hand: Option<Handedness>,
    pub pitcher_hand: Option<Handedness>,
    pub batter_exit_velo: Option<&'a ExitVeloRecord>,
    pub due: DueContext,
    pub ranges: &'a HashMap<String, MetricRange>,
}

// ---------------------------------------------------------------------------
// Component scores
// ---------------------------------------------------------------------------

fn range_of(ranges: &HashMap<String, MetricRange>, metric: &str) -> Option<MetricRange> {
    ranges.get(metric).copied()
}

/// Arsenal verdict mapped onto the component scale; neutral without data.
pub fn arsenal_component(result: &ArsenalMatchupResult) -> f64 {
    if !result.has_data {
        return NEUTRAL;
    }
    (NEUTRAL + result.overall_advantage * ARSENAL_COMPONENT_SCALE).clamp(0.0, 100.0)
}

/// Overall batter quality against the active population.
pub fn batter_component(profile: &PlayerProfile, ranges: &HashMap<String, MetricRange>) -> f64 {
    if profile.insufficient_sample {
        return NEUTRAL;
    }
    let scores = [
        normalize(profile.slg, range_of(ranges, "slg"), 100.0, true),
        normalize(profile.iso, range_of(ranges, "iso"), 100.0, true),
        normalize(profile.woba, range_of(ranges, "woba"), 100.0, true),
        normalize(profile.hard_hit_rate, range_of(ranges, "hard_hit"), 100.0, true),
        normalize(profile.k_rate, range_of(ranges, "k_rate"), 100.0, false),
    ];
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Overall pitcher quality, scored from the batter's perspective: a high
/// score means the pitcher is easy to hit.
pub fn pitcher_component(profile: &PlayerProfile, ranges: &HashMap<String, MetricRange>) -> f64 {
    if profile.insufficient_sample {
        return NEUTRAL;
    }
    let scores = [
        normalize(profile.woba, range_of(ranges, "woba"), 100.0, true),
        normalize(profile.hard_hit_rate, range_of(ranges, "hard_hit"), 100.0, true),
        normalize(profile.whiff_pct, range_of(ranges, "whiff"), 100.0, false),
        normalize(profile.rv100, range_of(ranges, "rv100"), 100.0, true),
    ];
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Contextual adjustments: exit-velocity matchup, due-for-HR counters, ISO
/// trajectory, and hot/cold contact flags, bounded around neutral.
pub fn contextual_component(ctx: &MatchupContext, cfg: &ScoringConfig) -> f64 {
    let mut sum = 0.0;

    if let Some(ev) = ctx.batter_exit_velo {
        let batter_hh = normalize(
            ev.hard_hit_rate,
            range_of(ctx.ranges, "hard_hit"),
            100.0,
            true,
        );
        let pitcher_hh = if ctx.pitcher.insufficient_sample {
            NEUTRAL
        } else {
            // Hard contact allowed by the pitcher is good for the batter.
            normalize(
                ctx.pitcher.hard_hit_rate,
                range_of(ctx.ranges, "hard_hit"),
                100.0,
                true,
            )
        };
        sum += batter_hh * 0.6 + pitcher_hh * 0.4 - NEUTRAL;
    }

    if let (Some(ab_since), Some(expected)) =
        (ctx.due.ab_since_last_hr, ctx.due.expected_ab_per_hr)
    {
        if expected > 0.0 {
            let ratio = ab_since as f64 / expected;
            if ratio > 1.25 {
                sum += ((ratio - 1.25) * 20.0).min(25.0);
            }
        }
    }

    if let Some(hits_since) = ctx.due.hits_since_last_hr {
        if cfg.expected_hits_per_hr > 0.0 {
            let ratio = hits_since as f64 / cfg.expected_hits_per_hr;
            if ratio > 1.5 {
                sum += ((ratio - 1.5) * 15.0).min(20.0);
            }
        }
    }

    if let Some(t) = ctx.iso_trend {
        sum += (t.recent - t.early) * ISO_TREND_SCALE;
    }

    if let Some(recent) = ctx.recent {
        if !ctx.batter.insufficient_sample && recent.pa >= cfg.min_recent_pa_for_contact {
            if recent.avg > ctx.batter.ba + HOT_AVG_MARGIN {
                sum += 15.0;
            } else if recent.avg < ctx.batter.ba - COLD_AVG_MARGIN {
                sum -= 20.0;
            }
        }
    }

    NEUTRAL + sum.clamp(-CONTEXT_CLAMP, CONTEXT_CLAMP)
}

/// Fixed handedness multiplier. A switch hitter always takes the favorable
/// factor regardless of the pitcher's hand; unknown hands are neutral.
pub fn platoon_factor(
    batter: Option<Handedness>,
    pitcher: Option<Handedness>,
    factors: &PlatoonFactors,
) -> f64 {
    match (batter, pitcher) {
        (Some(Handedness::Switch), _) => factors.switch_hitter,
        (Some(Handedness::Right), Some(Handedness::Right)) => factors.righty_vs_righty,
        (Some(Handedness::Left), Some(Handedness::Left)) => factors.lefty_vs_lefty,
        (Some(Handedness::Right), Some(Handedness::Left)) => factors.righty_vs_lefty,
        (Some(Handedness::Left), Some(Handedness::Right)) => factors.lefty_vs_righty,
        _ => 1.0,
    }
}

// ---------------------------------------------------------------------------
// Derived outputs
// ---------------------------------------------------------------------------

fn predicted_rates(ctx: &MatchupContext, cfg: &ScoringConfig, advantage: f64) -> PredictedRates {
    let pa = ctx.batter.pa as f64;
    let league = &cfg.league;
    let k = cfg.shrinkage_pa;
    let warn = cfg.low_sample_pa;

    let observed_hr_rate = if ctx.batter.pa > 0 {
        ctx.batter.hr as f64 / pa
    } else {
        0.0
    };

    let adj_ba = adjust(ctx.batter.ba, league.avg, pa, k, warn).value;
    let adj_slg = adjust(ctx.batter.slg, league.slg, pa, k, warn).value;
    let adj_woba = adjust(ctx.batter.woba, league.woba, pa, k, warn).value;
    let adj_hr = adjust(observed_hr_rate, league.hr_per_pa, pa, k, warn).value;
    let adj_k = adjust(ctx.batter.k_rate, league.k_rate, pa, k, warn).value;

    // An advantage of +10 advances every positive rate by 10%.
    let factor = 1.0 + advantage / 100.0;
    PredictedRates {
        ba: (adj_ba * factor).clamp(0.150, 0.400),
        slg: (adj_slg * factor).clamp(0.250, 0.700),
        woba: (adj_woba * factor).clamp(0.200, 0.500),
        hr_rate: (adj_hr * factor).clamp(0.0, 0.150),
        k_rate: (adj_k * (2.0 - factor)).clamp(0.10, 0.45),
    }
}

fn outcome_probabilities(score: f64, sample_pa: f64) -> OutcomeProbabilities {
    // Scale the 0-100 score down to roughly 0-4 so the hand-tuned clamp
    // bands hold their original meaning.
    let base = score / 25.0;
    OutcomeProbabilities {
        hr: (base * 10.0 + sample_pa * 0.005).clamp(0.5, 40.0),
        hit: (base * 20.0 + sample_pa * 0.02).clamp(5.0, 60.0),
        reach_base: (base * 25.0 + sample_pa * 0.03).clamp(8.0, 70.0),
        strikeout: (70.0 - base * 15.0 + sample_pa * 0.01).clamp(10.0, 80.0),
    }
}

fn outcome_ratings(predicted: &PredictedRates) -> OutcomeRatings {
    let hit = if predicted.ba >= 0.280 {
        Rating::High
    } else if predicted.ba >= 0.240 {
        Rating::Medium
    } else {
        Rating::Low
    };
    let hr = if predicted.hr_rate >= 0.050 {
        Rating::High
    } else if predicted.hr_rate >= 0.030 {
        Rating::Medium
    } else {
        Rating::Low
    };
    let total_bases = if predicted.slg >= 0.480 {
        Rating::High
    } else if predicted.slg >= 0.400 {
        Rating::Medium
    } else {
        Rating::Low
    };
    let strikeout = if predicted.k_rate >= 0.280 {
        Rating::High
    } else if predicted.k_rate >= 0.200 {
        Rating::Medium
    } else {
        Rating::Low
    };
    OutcomeRatings {
        hit,
        hr,
        total_bases,
        strikeout,
    }
}

/// Aggregate confidence from the data availability of each sub-analysis.
fn aggregate_confidence(ctx: &MatchupContext, cfg: &ScoringConfig) -> f64 {
    let batter_conf = confidence(ctx.batter.pa as f64, cfg.shrinkage_pa);
    let pitcher_conf = confidence(ctx.pitcher.pa as f64, cfg.shrinkage_pa);

    // Usage share of the arsenal the batter has actually faced.
    let arsenal_conf = if ctx.arsenal.has_data {
        let total: f64 = ctx.arsenal.pitches.iter().map(|p| p.usage_pct).sum();
        if total > 0.0 {
            ctx.arsenal
                .pitches
                .iter()
                .filter(|p| p.sample_pa > 0)
                .map(|p| p.usage_pct)
                .sum::<f64>()
                / total
        } else {
            0.0
        }
    } else {
        0.0
    };

    let historical_conf = if ctx.historical.is_empty() { 0.0 } else { 1.0 };
    let recent_conf = match ctx.recent {
        Some(r) if r.hr_trend.is_some() || r.hit_trend.is_some() => 1.0,
        _ => 0.0,
    };

    (0.35 * batter_conf
        + 0.25 * pitcher_conf
        + 0.20 * arsenal_conf
        + 0.10 * historical_conf
        + 0.10 * recent_conf)
        .clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compute the full matchup verdict. Total for any structurally valid
/// input: missing sub-analyses contribute neutral components and lower
/// confidence, never an error.
pub fn score_matchup(ctx: &MatchupContext, cfg: &ScoringConfig) -> MatchupScore {
    let components = ComponentBreakdown {
        arsenal: arsenal_component(ctx.arsenal),
        batter_overall: batter_component(ctx.batter, ctx.ranges),
        pitcher_overall: pitcher_component(ctx.pitcher, ctx.ranges),
        historical: NEUTRAL + crate::analysis::trends::historical_bonus(ctx.historical),
        recent_form: NEUTRAL + ctx.recent.map(recent_bonus).unwrap_or(0.0),
        contextual: contextual_component(ctx, cfg),
        platoon_factor: platoon_factor(ctx.batter_hand, ctx.pitcher_hand, &cfg.platoon),
    };

    let w = &cfg.weights;
    let weighted = w.arsenal * components.arsenal
        + w.batter_overall * components.batter_overall
        + w.pitcher_overall * components.pitcher_overall
        + w.historical * components.historical
        + w.recent_form * components.recent_form
        + w.contextual * components.contextual;
    let score = (weighted * components.platoon_factor).clamp(0.0, 100.0);
    let advantage = score - NEUTRAL;

    let predicted = predicted_rates(ctx, cfg, advantage);
    let sample_pa = ctx
        .season
        .map(|s| s.pa as f64)
        .unwrap_or_else(|| (ctx.batter.pa as f64).min(700.0));

    let mut warnings = Vec::new();
    if (ctx.batter.pa as f64) < cfg.low_sample_pa {
        warnings.push(format!(
            "small batter sample: {} PA against this pool",
            ctx.batter.pa
        ));
    }
    if (ctx.pitcher.pa as f64) < cfg.low_sample_pa {
        warnings.push(format!(
            "small pitcher sample: {} PA against this pool",
            ctx.pitcher.pa
        ));
    }
    if !ctx.arsenal.has_data {
        warnings.push("no pitch-level arsenal data for this pitcher".to_string());
    }

    MatchupScore {
        batter: ctx.batter_name.to_string(),
        pitcher: ctx.pitcher_name.to_string(),
        score,
        advantage,
        label: AdvantageLabel::from_advantage(advantage),
        ratings: outcome_ratings(&predicted),
        predicted,
        probabilities: outcome_probabilities(score, sample_pa),
        confidence: aggregate_confidence(ctx, cfg),
        components,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// HR potential
// ---------------------------------------------------------------------------

/// HR-specific matchup verdict with human-readable annotations.
#[derive(Debug, Clone, Serialize)]
pub struct HrPotential {
    pub batter: String,
    pub pitcher: String,
    pub score: f64,
    pub rating: Rating,
    pub adjusted_iso: f64,
    pub adjusted_hr_rate: f64,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Inputs for the HR potential variant.
pub struct HrContext<'a> {
    pub batter_name: &'a str,
    pub pitcher_name: &'a str,
    pub batter: &'a PlayerProfile,
    pub arsenal: &'a [PitchProfile],
    pub batter_by_pitch: &'a HashMap<String, PitchProfile>,
    pub batter_exit_velo: Option<&'a ExitVeloRecord>,
    pub iso_trend: Option<&'a TrendResult>,
    pub due: DueContext,
}

/// Score the batter's home run potential against this pitcher.
pub fn score_hr_potential(ctx: &HrContext, cfg: &ScoringConfig) -> HrPotential {
    let league = &cfg.league;
    let pa = ctx.batter.pa as f64;
    let observed_hr_rate = if ctx.batter.pa > 0 {
        ctx.batter.hr as f64 / pa
    } else {
        0.0
    };

    let adj_iso = adjust(ctx.batter.iso, league.iso, pa, cfg.shrinkage_pa, cfg.low_sample_pa);
    let adj_hr = adjust(
        observed_hr_rate,
        league.hr_per_pa,
        pa,
        cfg.shrinkage_pa,
        cfg.low_sample_pa,
    );

    let mut score = 0.0;
    let mut warnings = Vec::new();
    let mut insights = Vec::new();

    if adj_iso.low_sample {
        warnings.push(format!(
            "low sample size: {} PA; estimates shrunk toward league average",
            ctx.batter.pa
        ));
    }

    if adj_iso.value > 0.200 {
        score += 3.0;
    } else if adj_iso.value > 0.150 {
        score += 2.0;
    } else if adj_iso.value > 0.100 {
        score += 1.0;
    }

    if let Some(ev) = ctx.batter_exit_velo {
        let edge = ev.avg_exit_velo - league.exit_velo;
        if edge > 3.0 {
            score += 2.0;
        } else if edge > 1.0 {
            score += 1.0;
        }
        if edge > 2.0 {
            insights.push(format!(
                "exit velocity {:.1} mph runs {:.1} mph above league average",
                ev.avg_exit_velo, edge
            ));
        }
    }

    let vulnerable: Vec<&PitchProfile> = ctx
        .arsenal
        .iter()
        .filter(|pitch| pitch.usage_pct >= VULNERABLE_USAGE_PCT)
        .filter(|pitch| {
            ctx.batter_by_pitch
                .get(&pitch.pitch_type)
                .map(|b| b.pa > 0 && b.iso() > VULNERABLE_ISO_RATIO * league.iso)
                .unwrap_or(false)
        })
        .collect();
    if vulnerable.len() >= 2 {
        score += 1.0;
    }
    for pitch in &vulnerable {
        insights.push(format!(
            "crushes the {} ({:.0}% usage) for power",
            pitch.pitch_name, pitch.usage_pct
        ));
    }

    if let Some(t) = ctx.iso_trend {
        if t.direction == TrendDirection::Improving && t.magnitude > 0.03 {
            score += 1.0;
            insights.push(format!(
                "isolated power trending up year over year (+{:.3})",
                t.magnitude
            ));
        }
    }

    if let (Some(ab_since), Some(expected)) =
        (ctx.due.ab_since_last_hr, ctx.due.expected_ab_per_hr)
    {
        if expected > 0.0 {
            let ratio = ab_since as f64 / expected;
            if ratio > 2.0 {
                score += 0.5;
            }
            if ratio > 1.5 {
                insights.push(format!(
                    "{ab_since} AB since last HR, {:.1}x the usual gap",
                    ratio
                ));
            }
        }
    }

    if adj_iso.confidence < 0.3 {
        score /= 2.0;
    }

    let rating = if score >= 5.0 {
        Rating::High
    } else if score >= 2.5 {
        Rating::Medium
    } else {
        Rating::Low
    };

    let recommendations = vec![match rating {
        Rating::High => "Strong home run candidate in this matchup".to_string(),
        Rating::Medium => "Viable home run threat; worth a look in deeper formats".to_string(),
        Rating::Low => "Better home run options likely available elsewhere".to_string(),
    }];

    HrPotential {
        batter: ctx.batter_name.to_string(),
        pitcher: ctx.pitcher_name.to_string(),
        score,
        rating,
        adjusted_iso: adj_iso.value,
        adjusted_hr_rate: adj_hr.value,
        confidence: adj_iso.confidence,
        warnings,
        insights,
        recommendations,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ranges::builtin_default_ranges;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn empty_profile() -> PlayerProfile {
        PlayerProfile {
            insufficient_sample: true,
            ..PlayerProfile::default()
        }
    }

    fn strong_batter() -> PlayerProfile {
        PlayerProfile {
            pa: 600,
            ab: 520,
            h: 160,
            hr: 40,
            pitches: 2400,
            ba: 0.308,
            slg: 0.600,
            iso: 0.292,
            woba: 0.420,
            whiff_pct: 26.0,
            hard_hit_rate: 0.55,
            k_rate: 0.24,
            rv100: 2.5,
            years: vec![2024, 2025],
            insufficient_sample: false,
        }
    }

    fn ranges() -> HashMap<String, MetricRange> {
        builtin_default_ranges()
    }

    fn neutral_ctx<'a>(
        batter: &'a PlayerProfile,
        pitcher: &'a PlayerProfile,
        arsenal: &'a ArsenalMatchupResult,
        ranges: &'a HashMap<String, MetricRange>,
    ) -> MatchupContext<'a> {
        MatchupContext {
            batter_name: "Aaron Judge",
            pitcher_name: "Gerrit Cole",
            batter,
            pitcher,
            arsenal,
            historical: &[],
            iso_trend: None,
            recent: None,
            season: None,
            batter_hand: None,
            pitcher_hand: None,
            batter_exit_velo: None,
            due: DueContext::default(),
            ranges,
        }
    }

    // -- Platoon factor --

    #[test]
    fn switch_hitter_always_favorable() {
        let f = PlatoonFactors::default();
        for pitcher in [
            Some(Handedness::Right),
            Some(Handedness::Left),
            Some(Handedness::Switch),
            None,
        ] {
            assert!(approx_eq(
                platoon_factor(Some(Handedness::Switch), pitcher, &f),
                1.10
            ));
        }
    }

    #[test]
    fn platoon_table() {
        let f = PlatoonFactors::default();
        assert!(approx_eq(
            platoon_factor(Some(Handedness::Right), Some(Handedness::Right), &f),
            0.95
        ));
        assert!(approx_eq(
            platoon_factor(Some(Handedness::Left), Some(Handedness::Left), &f),
            0.90
        ));
        assert!(approx_eq(
            platoon_factor(Some(Handedness::Right), Some(Handedness::Left), &f),
            1.05
        ));
        assert!(approx_eq(
            platoon_factor(Some(Handedness::Left), Some(Handedness::Right), &f),
            1.10
        ));
        assert!(approx_eq(platoon_factor(None, Some(Handedness::Right), &f), 1.0));
    }

    // -- Components --

    #[test]
    fn arsenal_component_neutral_without_data() {
        assert!(approx_eq(
            arsenal_component(&ArsenalMatchupResult::no_data()),
            50.0
        ));
    }

    #[test]
    fn arsenal_component_scales_and_clamps() {
        let mut res = ArsenalMatchupResult::no_data();
        res.has_data = true;
        res.overall_advantage = 2.0;
        assert!(approx_eq(arsenal_component(&res), 70.0));
        res.overall_advantage = 50.0;
        assert!(approx_eq(arsenal_component(&res), 100.0));
        res.overall_advantage = -50.0;
        assert!(approx_eq(arsenal_component(&res), 0.0));
    }

    #[test]
    fn insufficient_profiles_are_neutral_components() {
        let p = empty_profile();
        let r = ranges();
        assert!(approx_eq(batter_component(&p, &r), 50.0));
        assert!(approx_eq(pitcher_component(&p, &r), 50.0));
    }

    #[test]
    fn strong_batter_scores_above_neutral() {
        let p = strong_batter();
        let r = ranges();
        assert!(batter_component(&p, &r) > 65.0);
    }

    // -- Totality --

    #[test]
    fn empty_everything_is_total_and_low_confidence() {
        let batter = empty_profile();
        let pitcher = empty_profile();
        let arsenal = ArsenalMatchupResult::no_data();
        let r = ranges();
        let ctx = neutral_ctx(&batter, &pitcher, &arsenal, &r);
        let cfg = ScoringConfig::default();
        let score = score_matchup(&ctx, &cfg);

        assert!(score.score.is_finite());
        // All components neutral, platoon unknown: dead-center score.
        assert!(approx_eq(score.score, 50.0));
        assert!(approx_eq(score.advantage, 0.0));
        assert_eq!(score.label, AdvantageLabel::Neutral);
        assert!(score.confidence < 0.05);
        assert!(!score.warnings.is_empty());
        // Predicted rates collapse to clamped league-ish baselines, no NaN.
        assert!(score.predicted.ba.is_finite());
        assert!(score.predicted.ba >= 0.150 && score.predicted.ba <= 0.400);
    }

    #[test]
    fn platoon_factor_shifts_score() {
        let batter = strong_batter();
        let pitcher = empty_profile();
        let arsenal = ArsenalMatchupResult::no_data();
        let r = ranges();
        let cfg = ScoringConfig::default();

        let mut ctx = neutral_ctx(&batter, &pitcher, &arsenal, &r);
        ctx.batter_hand = Some(Handedness::Left);
        ctx.pitcher_hand = Some(Handedness::Right);
        let favorable = score_matchup(&ctx, &cfg);

        ctx.pitcher_hand = Some(Handedness::Left);
        let unfavorable = score_matchup(&ctx, &cfg);

        assert!(favorable.score > unfavorable.score);
        assert!(approx_eq(favorable.components.platoon_factor, 1.10));
        assert!(approx_eq(unfavorable.components.platoon_factor, 0.90));
    }

    // -- Predicted rates --

    #[test]
    fn predicted_rates_clamped() {
        let batter = strong_batter();
        let pitcher = empty_profile();
        let mut arsenal = ArsenalMatchupResult::no_data();
        arsenal.has_data = true;
        arsenal.overall_advantage = 5.0;
        let r = ranges();
        let cfg = ScoringConfig::default();
        let ctx = neutral_ctx(&batter, &pitcher, &arsenal, &r);
        let score = score_matchup(&ctx, &cfg);

        assert!(score.predicted.ba <= 0.400 && score.predicted.ba >= 0.150);
        assert!(score.predicted.slg <= 0.700 && score.predicted.slg >= 0.250);
        assert!(score.predicted.k_rate <= 0.45 && score.predicted.k_rate >= 0.10);
        assert!(score.predicted.hr_rate <= 0.150);
    }

    #[test]
    fn probabilities_within_clamp_bands() {
        for score in [0.0, 25.0, 50.0, 75.0, 100.0] {
            for pa in [0.0, 100.0, 700.0] {
                let p = outcome_probabilities(score, pa);
                assert!((0.5..=40.0).contains(&p.hr));
                assert!((5.0..=60.0).contains(&p.hit));
                assert!((8.0..=70.0).contains(&p.reach_base));
                assert!((10.0..=80.0).contains(&p.strikeout));
            }
        }
    }

    // -- Contextual --

    #[test]
    fn due_for_hr_adds_bounded_bonus() {
        let batter = strong_batter();
        let pitcher = empty_profile();
        let arsenal = ArsenalMatchupResult::no_data();
        let r = ranges();
        let cfg = ScoringConfig::default();

        let mut ctx = neutral_ctx(&batter, &pitcher, &arsenal, &r);
        let baseline = contextual_component(&ctx, &cfg);
        assert!(approx_eq(baseline, 50.0));

        ctx.due = DueContext {
            ab_since_last_hr: Some(30),
            hits_since_last_hr: None,
            expected_ab_per_hr: Some(13.0),
        };
        let with_due = contextual_component(&ctx, &cfg);
        // ratio 30/13 ~ 2.31 -> (2.31 - 1.25) * 20 capped at 25.
        assert!(with_due > baseline);
        assert!(with_due - baseline <= 25.0 + 1e-9);
    }

    #[test]
    fn contextual_sum_is_clamped() {
        let batter = strong_batter();
        let pitcher = empty_profile();
        let arsenal = ArsenalMatchupResult::no_data();
        let r = ranges();
        let cfg = ScoringConfig::default();

        let mut ctx = neutral_ctx(&batter, &pitcher, &arsenal, &r);
        ctx.due = DueContext {
            ab_since_last_hr: Some(500),
            hits_since_last_hr: Some(100),
            expected_ab_per_hr: Some(10.0),
        };
        let iso_up = TrendResult {
            direction: TrendDirection::Improving,
            magnitude: 0.4,
            early: 0.1,
            recent: 0.5,
            consistency: 0.0,
        };
        ctx.iso_trend = Some(&iso_up);
        let c = contextual_component(&ctx, &cfg);
        assert!(approx_eq(c, 100.0));
    }

    // -- Label ladder --

    #[test]
    fn advantage_label_ladder() {
        assert_eq!(AdvantageLabel::from_advantage(25.0), AdvantageLabel::StrongBatter);
        assert_eq!(AdvantageLabel::from_advantage(12.0), AdvantageLabel::Batter);
        assert_eq!(AdvantageLabel::from_advantage(5.0), AdvantageLabel::SlightBatter);
        assert_eq!(AdvantageLabel::from_advantage(0.0), AdvantageLabel::Neutral);
        assert_eq!(AdvantageLabel::from_advantage(-5.0), AdvantageLabel::SlightPitcher);
        assert_eq!(AdvantageLabel::from_advantage(-12.0), AdvantageLabel::Pitcher);
        assert_eq!(AdvantageLabel::from_advantage(-25.0), AdvantageLabel::StrongPitcher);
    }

    // -- HR potential --

    fn hr_ctx<'a>(
        batter: &'a PlayerProfile,
        arsenal: &'a [PitchProfile],
        batter_by_pitch: &'a HashMap<String, PitchProfile>,
        ev: Option<&'a ExitVeloRecord>,
    ) -> HrContext<'a> {
        HrContext {
            batter_name: "Aaron Judge",
            pitcher_name: "Gerrit Cole",
            batter,
            arsenal,
            batter_by_pitch,
            batter_exit_velo: ev,
            iso_trend: None,
            due: DueContext::default(),
        }
    }

    #[test]
    fn elite_power_profile_rates_high() {
        let batter = strong_batter();
        let ev = ExitVeloRecord {
            name: "Judge, Aaron".to_string(),
            team: "NYY".to_string(),
            year: 2025,
            avg_exit_velo: 95.5,
            hard_hit_rate: 0.60,
            barrel_rate: 0.22,
        };
        let arsenal: Vec<PitchProfile> = Vec::new();
        let by_pitch = HashMap::new();
        let ctx = hr_ctx(&batter, &arsenal, &by_pitch, Some(&ev));
        let cfg = ScoringConfig::default();
        let hr = score_hr_potential(&ctx, &cfg);

        // Adjusted ISO well over .200 (+3) and a 7 mph EV edge (+2).
        assert!(hr.score >= 5.0);
        assert_eq!(hr.rating, Rating::High);
        assert!(hr.warnings.is_empty());
    }

    #[test]
    fn low_sample_halves_score_and_warns() {
        let mut batter = strong_batter();
        batter.pa = 10;
        batter.ab = 9;
        let arsenal: Vec<PitchProfile> = Vec::new();
        let by_pitch = HashMap::new();
        let ctx = hr_ctx(&batter, &arsenal, &by_pitch, None);
        let cfg = ScoringConfig::default();
        let hr = score_hr_potential(&ctx, &cfg);

        assert!(hr.confidence < 0.3);
        assert!(!hr.warnings.is_empty());
        // Shrinkage drags the ISO toward league average before the ladder.
        assert!(hr.adjusted_iso < 0.200);
    }

    #[test]
    fn weak_profile_rates_low() {
        let batter = PlayerProfile {
            pa: 500,
            ab: 460,
            h: 100,
            hr: 5,
            pitches: 2000,
            ba: 0.217,
            slg: 0.300,
            iso: 0.083,
            woba: 0.280,
            whiff_pct: 30.0,
            hard_hit_rate: 0.30,
            k_rate: 0.28,
            rv100: -1.0,
            years: vec![2025],
            insufficient_sample: false,
        };
        let arsenal: Vec<PitchProfile> = Vec::new();
        let by_pitch = HashMap::new();
        let ctx = hr_ctx(&batter, &arsenal, &by_pitch, None);
        let cfg = ScoringConfig::default();
        let hr = score_hr_potential(&ctx, &cfg);
        assert_eq!(hr.rating, Rating::Low);
    }
}
