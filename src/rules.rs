// 📏 Rule Tables - Typed Validation, Multiplier, and Form Rules
// Static JSON tables loaded once at startup; all optional, all read-only

use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// VALIDATION RULES
// ============================================================================

/// Typical size interval for one bedroom bucket, in sqm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeRange {
    pub min_typical: f64,
    pub max_typical: f64,
    pub average: f64,
}

/// Typical bedroom counts and size range for one property sub-type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtypeProfile {
    #[serde(default)]
    pub typical_bedrooms: Vec<u8>,

    /// [min, max] in sqm.
    #[serde(default = "default_subtype_size_range")]
    pub size_range: [f64; 2],
}

fn default_subtype_size_range() -> [f64; 2] {
    [0.0, 1000.0]
}

/// Advisory validation rules derived from historical transaction data.
///
/// Keys in `size_ranges` are bedroom buckets: "Studio" or "N_bedroom".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub size_ranges: HashMap<String, SizeRange>,

    #[serde(default)]
    pub property_subtype_specifics: HashMap<String, SubtypeProfile>,
}

impl ValidationRules {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read validation rules: {:?}", path.as_ref()))?;

        let rules: ValidationRules = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse validation rules: {:?}", path.as_ref()))?;

        rules.validate()?;
        Ok(rules)
    }

    /// Reject inverted intervals at load time instead of letting them warp
    /// every warning downstream.
    pub fn validate(&self) -> Result<()> {
        for (bucket, range) in &self.size_ranges {
            if range.min_typical > range.max_typical {
                return Err(anyhow!(
                    "size range for '{}' has min {} > max {}",
                    bucket,
                    range.min_typical,
                    range.max_typical
                ));
            }
        }
        for (subtype, profile) in &self.property_subtype_specifics {
            if profile.size_range[0] > profile.size_range[1] {
                return Err(anyhow!(
                    "size range for sub-type '{}' has min {} > max {}",
                    subtype,
                    profile.size_range[0],
                    profile.size_range[1]
                ));
            }
        }
        Ok(())
    }

    /// Bucket key for a bedroom count: "Studio" or "N_bedroom".
    pub fn bedroom_key(bedrooms: u8) -> String {
        if bedrooms == 0 {
            "Studio".to_string()
        } else {
            format!("{}_bedroom", bedrooms)
        }
    }

    pub fn size_range_for(&self, bedrooms: u8) -> Option<&SizeRange> {
        self.size_ranges.get(&Self::bedroom_key(bedrooms))
    }

    pub fn subtype_profile(&self, subtype: &str) -> Option<&SubtypeProfile> {
        self.property_subtype_specifics.get(subtype)
    }
}

// ============================================================================
// LOCATION MULTIPLIERS
// ============================================================================

/// Price multipliers per location tier. Areas absent from the table (or a
/// missing table altogether) get the neutral multiplier 1.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationMultipliers {
    multipliers: HashMap<String, f64>,
}

impl LocationMultipliers {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read location multipliers: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse location multipliers: {:?}", path.as_ref()))
    }

    pub fn from_map(multipliers: HashMap<String, f64>) -> Self {
        LocationMultipliers { multipliers }
    }

    pub fn multiplier_for(&self, area: &str) -> f64 {
        self.multipliers.get(area).copied().unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.multipliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }

    /// Tier label shown next to a non-neutral multiplier in the dashboard.
    pub fn tier_name(multiplier: f64) -> &'static str {
        if multiplier >= 2.0 {
            "Ultra Luxury"
        } else if multiplier >= 1.5 {
            "Luxury"
        } else if multiplier >= 1.2 {
            "Premium"
        } else if multiplier < 1.0 {
            "Budget"
        } else {
            "Standard"
        }
    }
}

// ============================================================================
// DYNAMIC FORM RULES
// ============================================================================

/// Option tables driving the dashboard's dynamic form. Every field is
/// optional; the form falls back to built-in defaults or encoder classes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormRules {
    #[serde(default)]
    pub property_usage_options: Vec<String>,

    #[serde(default)]
    pub property_type_by_usage: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub property_subtype_by_usage: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub property_subtype_by_type: HashMap<String, Vec<String>>,

    /// Whether a bedroom field applies to a property type (e.g. not Land).
    #[serde(default)]
    pub requires_bedrooms: HashMap<String, bool>,

    #[serde(default)]
    pub typical_registration_types: HashMap<String, Vec<String>>,
}

impl FormRules {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read form rules: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse form rules: {:?}", path.as_ref()))
    }
}

/// Residential/commercial split of the known sub-types, used to filter the
/// form's sub-type options by usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyCategorization {
    #[serde(default)]
    pub residential_subtypes: Vec<String>,

    #[serde(default)]
    pub commercial_subtypes: Vec<String>,
}

impl PropertyCategorization {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read categorization: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse categorization: {:?}", path.as_ref()))
    }

    pub fn subtypes_for_usage(&self, usage: &str) -> Option<&[String]> {
        match usage {
            "Residential" if !self.residential_subtypes.is_empty() => {
                Some(&self.residential_subtypes)
            }
            "Commercial" if !self.commercial_subtypes.is_empty() => {
                Some(&self.commercial_subtypes)
            }
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
