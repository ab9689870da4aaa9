// The matchup analysis pipeline, bottom-up: season aggregation, population
// normalization ranges, sample-size confidence shrinkage, pitch-arsenal
// scoring, trend detection, and the final weighted composite.

pub mod aggregate;
pub mod arsenal;
pub mod composite;
pub mod confidence;
pub mod ranges;
pub mod trends;
