// Sample-size confidence shrinkage.
//
// The single mechanism that keeps small-sample statistics from dominating
// the composite: an observed rate is blended toward a league baseline in
// proportion to plate appearances.

use serde::Serialize;

/// An observed rate shrunk toward its league baseline, with the blend
/// weight exposed for downstream warning logic. Recomputed per query,
/// never persisted.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfidenceAdjustedStat {
    pub value: f64,
    pub confidence: f64,
    pub low_sample: bool,
}

/// Blend weight `PA / (PA + K)`. Zero PA trusts the baseline entirely;
/// the weight approaches 1 as PA grows.
pub fn confidence(pa: f64, shrinkage_pa: f64) -> f64 {
    if pa <= 0.0 {
        return 0.0;
    }
    pa / (pa + shrinkage_pa.max(0.0))
}

/// Shrink an observed rate toward the baseline:
/// `confidence * observed + (1 - confidence) * baseline`.
pub fn adjust(
    observed: f64,
    baseline: f64,
    pa: f64,
    shrinkage_pa: f64,
    low_sample_pa: f64,
) -> ConfidenceAdjustedStat {
    let c = confidence(pa, shrinkage_pa);
    ConfidenceAdjustedStat {
        value: c * observed + (1.0 - c) * baseline,
        confidence: c,
        low_sample: pa < low_sample_pa,
    }
}
