// Property Valuation System - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod artifacts;
pub mod encoders;
pub mod form;
pub mod format;
pub mod model;
pub mod pipeline;
pub mod rules;
pub mod validation;

// Re-export commonly used types
pub use artifacts::{
    CategoricalMappings, HealthStatus, ModelContext, ModelInfo, ModelMetadata, PriceBounds,
};
pub use encoders::{Encoded, LabelEncoder};
pub use form::FormState;
pub use format::{format_compact, format_range, format_thousands, round2};
pub use model::{ForestModel, PriceModel, FEATURE_COUNT};
pub use pipeline::{
    predict, predict_batch, BatchPrediction, PredictionError, PredictionResult, PriceRange,
    PropertyDescriptor,
};
pub use rules::{
    FormRules, LocationMultipliers, PropertyCategorization, SizeRange, SubtypeProfile,
    ValidationRules,
};
pub use validation::{
    confidence_level, confidence_score, validate_inputs, ConfidenceLevel, COMMON_SUBTYPES,
    TOP_AREA_COUNT,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
