// 📦 Model Artifacts - Loaded-Once Serving Context
// Everything a request needs, constructed once at startup and then read-only

use crate::encoders::LabelEncoder;
use crate::format::{round2, round4};
use crate::model::{ForestModel, PriceModel};
use crate::rules::{FormRules, LocationMultipliers, PropertyCategorization, ValidationRules};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// METADATA
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalMappings {
    pub areas: Vec<String>,
    pub property_subtypes: Vec<String>,
    pub registration_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Training-time facts persisted alongside the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub training_samples: u64,
    pub r2_score: f64,
    pub mae: f64,
    pub categorical_mappings: CategoricalMappings,
    pub price_bounds: PriceBounds,
}

impl ModelMetadata {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read metadata: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metadata: {:?}", path.as_ref()))
    }
}

/// Read-only model summary exposed to callers (API `/model/info`, CLI
/// `info`). Area list is trimmed to the 20 first alphabetically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub training_samples: u64,
    pub r2_score: f64,
    pub mae: f64,
    pub available_areas: Vec<String>,
    pub available_property_subtypes: Vec<String>,
    pub available_registration_types: Vec<String>,
    pub price_range: PriceBounds,
}

/// Liveness report: which artifacts are currently loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
    pub encoders_loaded: bool,
    pub validation_rules_loaded: bool,
    pub location_multipliers_loaded: bool,
}

// ============================================================================
// MODEL CONTEXT
// ============================================================================

/// The immutable serving context: model, encoders, metadata, and optional
/// rule tables. Built once at process start and shared by reference with
/// every request; nothing here mutates after load, so no locking is needed.
pub struct ModelContext {
    pub model: Box<dyn PriceModel + Send + Sync>,
    pub area_encoder: LabelEncoder,
    pub subtype_encoder: LabelEncoder,
    pub regtype_encoder: LabelEncoder,
    pub metadata: ModelMetadata,
    pub validation_rules: Option<ValidationRules>,
    pub location_multipliers: Option<LocationMultipliers>,
    pub form_rules: Option<FormRules>,
    pub categorization: Option<PropertyCategorization>,
}

impl ModelContext {
    pub fn new(
        model: Box<dyn PriceModel + Send + Sync>,
        area_encoder: LabelEncoder,
        subtype_encoder: LabelEncoder,
        regtype_encoder: LabelEncoder,
        metadata: ModelMetadata,
    ) -> Self {
        ModelContext {
            model,
            area_encoder,
            subtype_encoder,
            regtype_encoder,
            metadata,
            validation_rules: None,
            location_multipliers: None,
            form_rules: None,
            categorization: None,
        }
    }

    /// Load all artifacts from a model directory.
    ///
    /// The model, the three encoders, and the metadata are required; a
    /// missing or corrupt file there is fatal. The rule tables are optional
    /// and degrade gracefully: fewer warnings, neutral multipliers, default
    /// form options.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let model = ForestModel::from_file(dir.join("random_forest_model.json"))?;
        let area_encoder = LabelEncoder::from_file("area", dir.join("label_encoder_area.json"))?;
        let subtype_encoder =
            LabelEncoder::from_file("sub-type", dir.join("label_encoder_subtype.json"))?;
        let regtype_encoder =
            LabelEncoder::from_file("registration type", dir.join("label_encoder_regtype.json"))?;
        let metadata = ModelMetadata::from_file(dir.join("metadata.json"))?;

        let mut ctx = ModelContext::new(
            Box::new(model),
            area_encoder,
            subtype_encoder,
            regtype_encoder,
            metadata,
        );

        ctx.validation_rules =
            load_optional("validation rules", dir.join("validation_rules.json"), |p| {
                ValidationRules::from_file(p)
            });
        ctx.location_multipliers = load_optional(
            "location multipliers",
            dir.join("location_multipliers.json"),
            |p| LocationMultipliers::from_file(p),
        );
        ctx.form_rules = load_optional("form rules", dir.join("dynamic_form_rules.json"), |p| {
            FormRules::from_file(p)
        });
        ctx.categorization = load_optional(
            "property categorization",
            dir.join("property_categorization.json"),
            |p| PropertyCategorization::from_file(p),
        );

        Ok(ctx)
    }

    /// Location multiplier for an area; 1.0 when no table is loaded or the
    /// area is unlisted.
    pub fn multiplier_for(&self, area: &str) -> f64 {
        self.location_multipliers
            .as_ref()
            .map(|m| m.multiplier_for(area))
            .unwrap_or(1.0)
    }

    pub fn health(&self) -> HealthStatus {
        // The context cannot be constructed without model and encoders, so
        // a serving process always reports those as loaded.
        HealthStatus {
            status: "healthy".to_string(),
            model_loaded: true,
            encoders_loaded: true,
            validation_rules_loaded: self.validation_rules.is_some(),
            location_multipliers_loaded: self.location_multipliers.is_some(),
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        let mut areas = self.metadata.categorical_mappings.areas.clone();
        areas.sort();
        areas.truncate(20);

        let mut subtypes = self.metadata.categorical_mappings.property_subtypes.clone();
        subtypes.sort();

        let mut regtypes = self
            .metadata
            .categorical_mappings
            .registration_types
            .clone();
        regtypes.sort();

        ModelInfo {
            model_type: self.metadata.model_type.clone(),
            training_samples: self.metadata.training_samples,
            r2_score: round4(self.metadata.r2_score),
            mae: round2(self.metadata.mae),
            available_areas: areas,
            available_property_subtypes: subtypes,
            available_registration_types: regtypes,
            price_range: PriceBounds {
                lower: round2(self.metadata.price_bounds.lower),
                upper: round2(self.metadata.price_bounds.upper),
            },
        }
    }
}

/// Load an optional artifact: missing file → None silently, unreadable
/// file → None with a console warning. Never an error.
fn load_optional<T, F>(name: &str, path: std::path::PathBuf, loader: F) -> Option<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    if !path.exists() {
        return None;
    }
    match loader(&path) {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("Warning: could not load {}: {:#}", name, e);
            None
        }
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================


// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;
    use std::fs;

    #[test]
    fn test_health_reflects_optional_artifacts() {
        let mut ctx = context_with_stub(1.0);
        let health = ctx.health();
        assert_eq!(health.status, "healthy");
        assert!(health.model_loaded);
        assert!(health.encoders_loaded);
        assert!(health.validation_rules_loaded);
        assert!(!health.location_multipliers_loaded);

        ctx.validation_rules = None;
        assert!(!ctx.health().validation_rules_loaded);
    }

    #[test]
    fn test_model_info_rounds_and_sorts() {
        let ctx = context_with_stub(1.0);
        let info = ctx.model_info();

        assert_eq!(info.model_type, "StubRegressor");
        assert_eq!(info.training_samples, 1_500_000);
        assert_eq!(info.r2_score, 0.9123);
        assert_eq!(info.mae, 185_000.46);
        assert_eq!(info.available_areas[0], "BUSINESS BAY");
        assert_eq!(
            info.available_property_subtypes,
            vec!["Flat".to_string(), "Villa".to_string()]
        );
        assert_eq!(info.price_range.lower, 200_000.0);
    }

    #[test]
    fn test_multiplier_defaults_without_table() {
        let ctx = context_with_stub(1.0);
        assert_eq!(ctx.multiplier_for("DUBAI MARINA"), 1.0);
    }

    #[test]
    fn test_load_full_directory() {
        let dir = std::env::temp_dir().join(format!(
            "property-valuation-artifacts-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();

        fs::write(
            dir.join("random_forest_model.json"),
            r#"{"model_type": "RandomForestRegressor", "trees": [
                {"nodes": [{"feature": -1, "threshold": 0.0, "left": 0, "right": 0, "value": 750000.0}]}
            ]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("label_encoder_area.json"),
            r#"{"classes": ["BUSINESS BAY", "DUBAI MARINA"]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("label_encoder_subtype.json"),
            r#"{"classes": ["Flat", "Villa"]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("label_encoder_regtype.json"),
            r#"{"classes": ["Existing Properties", "Off-Plan Properties"]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("metadata.json"),
            r#"{
                "model_type": "RandomForestRegressor",
                "training_samples": 1000,
                "r2_score": 0.9,
                "mae": 100000.0,
                "categorical_mappings": {
                    "areas": ["BUSINESS BAY", "DUBAI MARINA"],
                    "property_subtypes": ["Flat", "Villa"],
                    "registration_types": ["Existing Properties", "Off-Plan Properties"]
                },
                "price_bounds": {"lower": 100000.0, "upper": 10000000.0}
            }"#,
        )
        .unwrap();
        fs::write(
            dir.join("location_multipliers.json"),
            r#"{"DUBAI MARINA": 1.2}"#,
        )
        .unwrap();

        let ctx = ModelContext::load(&dir).unwrap();
        assert_eq!(ctx.model.model_type(), "RandomForestRegressor");
        assert_eq!(ctx.area_encoder.len(), 2);
        assert_eq!(ctx.multiplier_for("DUBAI MARINA"), 1.2);
        // validation_rules.json was not written: degrade, don't fail
        assert!(ctx.validation_rules.is_none());

        let features = [100.0, 2.0, 1.0, 1.0, 1.0, 0.0, 1.0];
        assert_eq!(ctx.model.predict(&features).unwrap(), 750_000.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_required_artifact_is_fatal() {
        let dir = std::env::temp_dir().join(format!(
            "property-valuation-missing-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();

        // Empty directory: no model file
        assert!(ModelContext::load(&dir).is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
