// ⚖️ Input Validation & Confidence Scoring
// Advisory plausibility checks and an out-of-distribution heuristic

use crate::encoders::LabelEncoder;
use crate::rules::ValidationRules;
use serde::{Deserialize, Serialize};

/// Sub-types the model saw most often during training.
pub const COMMON_SUBTYPES: [&str; 3] = ["Flat", "Villa", "Hotel Apartment"];

/// How many leading encoder classes count as "frequently seen" areas.
pub const TOP_AREA_COUNT: usize = 50;

/// Size tolerance around the typical interval before a warning fires.
const SIZE_LOWER_TOLERANCE: f64 = 0.7;
const SIZE_UPPER_TOLERANCE: f64 = 1.5;

// ============================================================================
// VALIDATION WARNINGS
// ============================================================================

/// Check a property description against the rule tables and return advisory
/// warnings. All checks are independent and additive; warnings never block
/// a prediction, and a missing rule table yields no warnings at all.
pub fn validate_inputs(
    area_size: f64,
    bedrooms: u8,
    property_subtype: &str,
    rules: Option<&ValidationRules>,
) -> Vec<String> {
    let mut warnings = Vec::new();

    let Some(rules) = rules else {
        return warnings;
    };

    // 1. Size vs. bedroom bucket
    if let Some(range) = rules.size_range_for(bedrooms) {
        let bucket = ValidationRules::bedroom_key(bedrooms).replace('_', " ");

        if area_size < range.min_typical * SIZE_LOWER_TOLERANCE {
            warnings.push(format!(
                "Size seems too small for {}. Typical range: {:.0}-{:.0} sqm",
                bucket, range.min_typical, range.max_typical
            ));
        } else if area_size > range.max_typical * SIZE_UPPER_TOLERANCE {
            warnings.push(format!(
                "Size seems too large for {}. Typical range: {:.0}-{:.0} sqm",
                bucket, range.min_typical, range.max_typical
            ));
        }
    }

    // 2 & 3. Sub-type specifics: bedroom set, then size range
    if let Some(profile) = rules.subtype_profile(property_subtype) {
        if !profile.typical_bedrooms.is_empty() && !profile.typical_bedrooms.contains(&bedrooms) {
            let lo = profile.typical_bedrooms.iter().min().unwrap();
            let hi = profile.typical_bedrooms.iter().max().unwrap();
            warnings.push(format!(
                "{} typically has {}-{} bedrooms",
                property_subtype, lo, hi
            ));
        }

        if area_size < profile.size_range[0] || area_size > profile.size_range[1] {
            warnings.push(format!(
                "{} typically ranges {:.0}-{:.0} sqm",
                property_subtype, profile.size_range[0], profile.size_range[1]
            ));
        }
    }

    warnings
}

// ============================================================================
// CONFIDENCE SCORING
// ============================================================================

/// Discrete confidence label for one prediction.
///
/// This is a point-deduction heuristic standing in for out-of-distribution
/// risk, not a statistical confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::Low => "Low",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "🟢",
            ConfidenceLevel::Medium => "🟡",
            ConfidenceLevel::Low => "🔴",
        }
    }

    pub fn from_score(score: i32) -> Self {
        if score >= 85 {
            ConfidenceLevel::High
        } else if score >= 70 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Raw deduction score, starting from a perfect 100:
/// -15 area outside the top-50 encoder classes, -10 uncommon sub-type,
/// -20 size outside tolerated bounds (only when rules are loaded),
/// -10 more than 5 bedrooms.
pub fn confidence_score(
    area_size: f64,
    bedrooms: u8,
    area_name: &str,
    subtype: &str,
    area_encoder: &LabelEncoder,
    rules: Option<&ValidationRules>,
) -> i32 {
    let mut score = 100;

    if !area_encoder.in_top(area_name, TOP_AREA_COUNT) {
        score -= 15;
    }

    if !COMMON_SUBTYPES.contains(&subtype) {
        score -= 10;
    }

    if let Some(rules) = rules {
        if let Some(range) = rules.size_range_for(bedrooms) {
            if area_size < range.min_typical * SIZE_LOWER_TOLERANCE
                || area_size > range.max_typical * SIZE_UPPER_TOLERANCE
            {
                score -= 20;
            }
        }
    }

    if bedrooms > 5 {
        score -= 10;
    }

    score
}

pub fn confidence_level(
    area_size: f64,
    bedrooms: u8,
    area_name: &str,
    subtype: &str,
    area_encoder: &LabelEncoder,
    rules: Option<&ValidationRules>,
) -> ConfidenceLevel {
    ConfidenceLevel::from_score(confidence_score(
        area_size,
        bedrooms,
        area_name,
        subtype,
        area_encoder,
        rules,
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{SizeRange, SubtypeProfile};
    use std::collections::HashMap;

    fn sample_rules() -> ValidationRules {
        ValidationRules {
            size_ranges: HashMap::from([
                (
                    "Studio".to_string(),
                    SizeRange {
                        min_typical: 30.0,
                        max_typical: 60.0,
                        average: 45.0,
                    },
                ),
                (
                    "3_bedroom".to_string(),
                    SizeRange {
                        min_typical: 120.0,
                        max_typical: 220.0,
                        average: 170.0,
                    },
                ),
                (
                    "6_bedroom".to_string(),
                    SizeRange {
                        min_typical: 300.0,
                        max_typical: 600.0,
                        average: 450.0,
                    },
                ),
            ]),
            property_subtype_specifics: HashMap::from([(
                "Flat".to_string(),
                SubtypeProfile {
                    typical_bedrooms: vec![0, 1, 2, 3],
                    size_range: [80.0, 200.0],
                },
            )]),
        }
    }

    fn area_encoder() -> LabelEncoder {
        LabelEncoder::new(
            "area",
            vec!["BUSINESS BAY".to_string(), "DUBAI MARINA".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_consistent_input_yields_no_warnings() {
        let rules = sample_rules();
        let warnings = validate_inputs(150.0, 3, "Flat", Some(&rules));
        assert!(warnings.is_empty(), "got: {:?}", warnings);
    }

    #[test]
    fn test_small_size_triggers_bucket_and_subtype_warnings() {
        let rules = sample_rules();
        // 30 sqm is below 0.7 * 120 for a 3-bedroom and below Flat's 80 sqm floor
        let warnings = validate_inputs(30.0, 3, "Flat", Some(&rules));

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("too small for 3 bedroom"));
        assert!(warnings[0].contains("120-220 sqm"));
        assert!(warnings[1].contains("Flat typically ranges 80-200 sqm"));
    }

    #[test]
    fn test_large_size_warning() {
        let rules = sample_rules();
        // 350 sqm > 1.5 * 220 for a 3-bedroom
        let warnings = validate_inputs(350.0, 3, "Villa", Some(&rules));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("too large for 3 bedroom"));
    }

    #[test]
    fn test_size_within_tolerance_does_not_warn() {
        let rules = sample_rules();
        // 0.7 * 120 = 84, so 90 is tolerated even though below min_typical
        let warnings = validate_inputs(90.0, 3, "Villa", Some(&rules));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unusual_bedroom_count_for_subtype() {
        let rules = sample_rules();
        let warnings = validate_inputs(350.0, 6, "Flat", Some(&rules));

        // 6 bedrooms is fine for the bucket (300-600 sqm) but odd for a Flat,
        // and 350 sqm exceeds Flat's size range
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Flat typically has 0-3 bedrooms"));
        assert!(warnings[1].contains("Flat typically ranges"));
    }

    #[test]
    fn test_studio_bucket_name() {
        let rules = sample_rules();
        let warnings = validate_inputs(10.0, 0, "Villa", Some(&rules));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("too small for Studio"));
    }

    #[test]
    fn test_no_rules_means_no_warnings() {
        assert!(validate_inputs(5.0, 9, "Submarine", None).is_empty());
    }

    #[test]
    fn test_unknown_bucket_short_circuits() {
        let rules = sample_rules();
        // No 4_bedroom bucket and no Villa profile: nothing to check
        assert!(validate_inputs(999.0, 4, "Villa", Some(&rules)).is_empty());
    }

    // Confidence heuristic: a proxy for out-of-distribution risk, not a
    // statistical confidence interval.

    #[test]
    fn test_confidence_all_conditions_met_is_high() {
        let rules = sample_rules();
        let enc = area_encoder();
        let score = confidence_score(150.0, 3, "DUBAI MARINA", "Flat", &enc, Some(&rules));
        assert_eq!(score, 100);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::High);
    }

    #[test]
    fn test_confidence_unknown_area_sits_exactly_on_high_threshold() {
        let rules = sample_rules();
        let enc = area_encoder();
        let score = confidence_score(150.0, 3, "NOWHERE", "Flat", &enc, Some(&rules));
        assert_eq!(score, 85);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::High);
    }

    #[test]
    fn test_confidence_crosses_into_medium() {
        let rules = sample_rules();
        let enc = area_encoder();
        // -15 unknown area, -10 uncommon sub-type
        let score = confidence_score(150.0, 3, "NOWHERE", "Office", &enc, Some(&rules));
        assert_eq!(score, 75);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::Medium);
    }

    #[test]
    fn test_confidence_sits_exactly_on_medium_threshold() {
        let rules = sample_rules();
        let enc = area_encoder();
        // -20 size far outside the 6-bedroom bucket, -10 bedrooms > 5
        let score = confidence_score(100.0, 6, "DUBAI MARINA", "Villa", &enc, Some(&rules));
        assert_eq!(score, 70);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::Medium);
    }

    #[test]
    fn test_confidence_low() {
        let rules = sample_rules();
        let enc = area_encoder();
        // -15 area, -10 sub-type, -20 size, -10 bedrooms = 45
        let score = confidence_score(100.0, 6, "NOWHERE", "Office", &enc, Some(&rules));
        assert_eq!(score, 45);
        assert_eq!(ConfidenceLevel::from_score(score), ConfidenceLevel::Low);
    }

    #[test]
    fn test_size_deduction_skipped_without_rules() {
        let enc = area_encoder();
        // Absurd size, but no rules loaded: only the bedroom deduction applies
        let score = confidence_score(2.0, 6, "DUBAI MARINA", "Flat", &enc, None);
        assert_eq!(score, 90);
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(ConfidenceLevel::from_score(85), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(84), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(70), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(69), ConfidenceLevel::Low);
    }
}
