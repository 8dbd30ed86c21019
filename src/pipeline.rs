// 🔮 Prediction Pipeline
// Validate → encode → predict → derive range, confidence, and formatting

use crate::artifacts::ModelContext;
use crate::format::{format_range, format_thousands, round2};
use crate::model::FEATURE_COUNT;
use crate::validation::{confidence_level, validate_inputs, ConfidenceLevel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// One property to be priced. Field names match the CSV/JSON wire format;
/// the parking and project flags are 0/1 on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Property size in square meters.
    pub procedure_area: f64,

    /// Number of bedrooms; 0 means a studio.
    pub bedrooms: u8,

    /// Has parking (0 or 1).
    pub has_parking: u8,

    /// Part of a named project (0 or 1).
    pub has_project: u8,

    /// Location area name.
    pub area_name_en: String,

    /// Property sub-type (e.g. "Flat", "Villa").
    pub property_sub_type_en: String,

    /// Registration type (e.g. "Off-Plan Properties").
    pub reg_type_en: String,
}

impl PropertyDescriptor {
    /// Reject constraint violations before the pipeline runs.
    pub fn check(&self) -> Result<(), PredictionError> {
        if !self.procedure_area.is_finite() || self.procedure_area <= 0.0 {
            return Err(PredictionError::invalid(
                "procedure_area",
                format!("must be greater than 0, got {}", self.procedure_area),
            ));
        }
        if self.procedure_area >= 1000.0 {
            return Err(PredictionError::invalid(
                "procedure_area",
                format!("must be less than 1000 sqm, got {}", self.procedure_area),
            ));
        }
        if self.bedrooms > 10 {
            return Err(PredictionError::invalid(
                "bedrooms",
                format!("must be between 0 and 10, got {}", self.bedrooms),
            ));
        }
        if self.has_parking > 1 {
            return Err(PredictionError::invalid(
                "has_parking",
                format!("must be 0 or 1, got {}", self.has_parking),
            ));
        }
        if self.has_project > 1 {
            return Err(PredictionError::invalid(
                "has_project",
                format!("must be 0 or 1, got {}", self.has_project),
            ));
        }
        for (field, value) in [
            ("area_name_en", &self.area_name_en),
            ("property_sub_type_en", &self.property_sub_type_en),
            ("reg_type_en", &self.reg_type_en),
        ] {
            if value.trim().is_empty() {
                return Err(PredictionError::invalid(field, "must not be empty".to_string()));
            }
        }
        Ok(())
    }
}

/// Symmetric ±10% interval around the point estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRange {
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Structured result of one prediction. Created fresh per request, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Final price estimate in AED, location multiplier applied.
    pub predicted_price: f64,
    pub predicted_price_formatted: String,
    pub price_range: PriceRange,
    pub price_range_formatted: String,
    pub price_per_sqm: f64,
    pub confidence_level: ConfidenceLevel,

    /// Raw model output, before the location multiplier.
    pub base_price: f64,
    pub location_multiplier: f64,

    pub input_features: PropertyDescriptor,
    pub validation_warnings: Vec<String>,
}

/// Ordered batch result: one prediction per input row, input order kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub predictions: Vec<PredictionResult>,
    pub total_properties: usize,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PredictionError {
    /// A required field violated its constraint; rejected before the
    /// pipeline runs.
    #[error("invalid input: {field} {message}")]
    InvalidInput { field: &'static str, message: String },

    /// Unexpected computation failure, caught at the request boundary and
    /// surfaced with the underlying cause attached.
    #[error("prediction error: {0}")]
    Prediction(#[from] anyhow::Error),
}

impl PredictionError {
    fn invalid(field: &'static str, message: String) -> Self {
        PredictionError::InvalidInput { field, message }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PredictionError::InvalidInput { .. })
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Price one property: a stateless pure function of (descriptor, loaded
/// artifacts). Unknown categorical values are downgraded to defaults and
/// surfaced as warnings, never rejected.
pub fn predict(
    ctx: &ModelContext,
    input: &PropertyDescriptor,
) -> Result<PredictionResult, PredictionError> {
    input.check()?;

    let area = ctx.area_encoder.encode_or_default(&input.area_name_en);
    let subtype = ctx
        .subtype_encoder
        .encode_or_default(&input.property_sub_type_en);
    let regtype = ctx.regtype_encoder.encode_or_default(&input.reg_type_en);

    let features: [f64; FEATURE_COUNT] = [
        input.procedure_area,
        input.bedrooms as f64,
        input.has_parking as f64,
        input.has_project as f64,
        area.code as f64,
        subtype.code as f64,
        regtype.code as f64,
    ];

    let base_price = ctx.model.predict(&features)?;

    // Canonical pricing formula: both serving surfaces apply the location
    // multiplier, defaulting to 1.0 when the table or area is absent.
    let multiplier = ctx.multiplier_for(&input.area_name_en);
    let price = base_price * multiplier;

    // Constraint checks keep the area positive, but a zero division would
    // poison the whole response, so guard anyway.
    if input.procedure_area <= 0.0 {
        return Err(PredictionError::Prediction(anyhow::anyhow!(
            "cannot derive price per sqm for zero-size property"
        )));
    }
    let price_per_sqm = price / input.procedure_area;

    let lower_bound = price * 0.90;
    let upper_bound = price * 1.10;

    let mut warnings = validate_inputs(
        input.procedure_area,
        input.bedrooms,
        &input.property_sub_type_en,
        ctx.validation_rules.as_ref(),
    );
    for encoded in [&area, &subtype, &regtype] {
        if let Some(warning) = &encoded.warning {
            warnings.push(warning.clone());
        }
    }

    let confidence = confidence_level(
        input.procedure_area,
        input.bedrooms,
        &input.area_name_en,
        &input.property_sub_type_en,
        &ctx.area_encoder,
        ctx.validation_rules.as_ref(),
    );

    Ok(PredictionResult {
        predicted_price: round2(price),
        predicted_price_formatted: format!("{} AED", format_thousands(price)),
        price_range: PriceRange {
            lower_bound: round2(lower_bound),
            upper_bound: round2(upper_bound),
        },
        price_range_formatted: format!("{} AED", format_range(lower_bound, upper_bound)),
        price_per_sqm: round2(price_per_sqm),
        confidence_level: confidence,
        base_price: round2(base_price),
        location_multiplier: multiplier,
        input_features: input.clone(),
        validation_warnings: warnings,
    })
}

/// Price a list of properties sequentially, preserving input order.
///
/// One malformed row fails the whole batch; callers that want skip-row
/// semantics can filter inputs up front.
pub fn predict_batch(
    ctx: &ModelContext,
    inputs: &[PropertyDescriptor],
) -> Result<BatchPrediction, PredictionError> {
    let mut predictions = Vec::with_capacity(inputs.len());
    for input in inputs {
        predictions.push(predict(ctx, input)?);
    }

    Ok(BatchPrediction {
        total_properties: predictions.len(),
        predictions,
    })
}

// ============================================================================
// TESTS
// ============================================================================
