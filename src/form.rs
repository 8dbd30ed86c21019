// 🧾 Dynamic Form State
// Explicit state machine behind the dashboard's smart form: every transition
// recomputes downstream option sets with pure functions of (context, state)

use crate::artifacts::ModelContext;
use crate::pipeline::PropertyDescriptor;

const DEFAULT_USAGES: [&str; 2] = ["Commercial", "Residential"];
const DEFAULT_TYPES: [&str; 4] = ["Building", "Land", "Unit", "Villa"];
const BEDROOM_CHOICES: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];

/// Current form selections plus the option lists they were chosen from.
/// Owned by the UI session; the renderer only reads, key handlers only go
/// through the `set_*` transitions.
#[derive(Debug, Clone)]
pub struct FormState {
    pub usage: String,
    pub property_type: String,
    pub sub_type: String,
    pub bedrooms: u8,
    pub bedrooms_visible: bool,
    pub area_size: f64,
    pub has_parking: bool,
    pub area_name: String,
    pub reg_type: String,

    pub usage_options: Vec<String>,
    pub type_options: Vec<String>,
    pub subtype_options: Vec<String>,
    pub regtype_options: Vec<String>,
}

impl FormState {
    pub fn new(ctx: &ModelContext) -> Self {
        let usage_options = usage_options(ctx);
        let usage = pick_default(&usage_options, "Residential");

        let mut state = FormState {
            usage,
            property_type: String::new(),
            sub_type: String::new(),
            bedrooms: 2,
            bedrooms_visible: true,
            area_size: 100.0,
            has_parking: true,
            area_name: pick_default(&sorted(ctx.area_encoder.classes().to_vec()), "DUBAI MARINA"),
            reg_type: String::new(),
            usage_options,
            type_options: Vec::new(),
            subtype_options: Vec::new(),
            regtype_options: Vec::new(),
        };

        state.recompute_types(ctx);
        state.autofill_size(ctx);
        state
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Changing usage cascades through type, sub-type, and registration
    /// options.
    pub fn set_usage(&mut self, ctx: &ModelContext, usage: &str) {
        if self.usage_options.iter().any(|u| u == usage) {
            self.usage = usage.to_string();
        }
        self.recompute_types(ctx);
    }

    pub fn set_property_type(&mut self, ctx: &ModelContext, property_type: &str) {
        if self.type_options.iter().any(|t| t == property_type) {
            self.property_type = property_type.to_string();
        }
        self.recompute_downstream(ctx);
    }

    pub fn set_subtype(&mut self, subtype: &str) {
        if self.subtype_options.iter().any(|s| s == subtype) {
            self.sub_type = subtype.to_string();
        }
    }

    /// Selecting a bedroom count auto-fills the size field with the
    /// bucket's historical average, when rules are loaded.
    pub fn set_bedrooms(&mut self, ctx: &ModelContext, bedrooms: u8) {
        if !self.bedrooms_visible || !BEDROOM_CHOICES.contains(&bedrooms) {
            return;
        }
        self.bedrooms = bedrooms;
        self.autofill_size(ctx);
    }

    pub fn set_area_size(&mut self, size: f64) {
        self.area_size = size.clamp(10.0, 999.0);
    }

    pub fn set_area_name(&mut self, ctx: &ModelContext, area: &str) {
        if ctx.area_encoder.encode(area).is_some() {
            self.area_name = area.to_string();
        }
    }

    pub fn set_reg_type(&mut self, reg_type: &str) {
        if self.regtype_options.iter().any(|r| r == reg_type) {
            self.reg_type = reg_type.to_string();
        }
    }

    pub fn toggle_parking(&mut self) {
        self.has_parking = !self.has_parking;
    }

    /// Descriptor for the current selections, ready for the pipeline.
    /// The named-project flag is always set; the form does not expose it.
    pub fn descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            procedure_area: self.area_size,
            bedrooms: if self.bedrooms_visible { self.bedrooms } else { 0 },
            has_parking: self.has_parking as u8,
            has_project: 1,
            area_name_en: self.area_name.clone(),
            property_sub_type_en: self.sub_type.clone(),
            reg_type_en: self.reg_type.clone(),
        }
    }

    /// Expected size interval for the current bedroom selection, for the
    /// hint line under the size field.
    pub fn expected_size(&self, ctx: &ModelContext) -> Option<(f64, f64, f64)> {
        if !self.bedrooms_visible {
            return None;
        }
        ctx.validation_rules
            .as_ref()
            .and_then(|r| r.size_range_for(self.bedrooms))
            .map(|r| (r.min_typical, r.max_typical, r.average))
    }

    // ------------------------------------------------------------------
    // Recomputation
    // ------------------------------------------------------------------

    fn recompute_types(&mut self, ctx: &ModelContext) {
        self.type_options = type_options(ctx, &self.usage);
        if !self.type_options.iter().any(|t| t == &self.property_type) {
            self.property_type = pick_default(&self.type_options, "Unit");
        }
        self.recompute_downstream(ctx);
    }

    fn recompute_downstream(&mut self, ctx: &ModelContext) {
        self.subtype_options = subtype_options(ctx, &self.usage, &self.property_type);
        if !self.subtype_options.iter().any(|s| s == &self.sub_type) {
            self.sub_type = pick_default(&self.subtype_options, "Flat");
        }

        self.regtype_options = regtype_options(ctx, &self.property_type);
        if !self.regtype_options.iter().any(|r| r == &self.reg_type) {
            self.reg_type = self.regtype_options.first().cloned().unwrap_or_default();
        }

        self.bedrooms_visible = ctx
            .form_rules
            .as_ref()
            .and_then(|f| f.requires_bedrooms.get(&self.property_type))
            .copied()
            .unwrap_or(true);
    }

    fn autofill_size(&mut self, ctx: &ModelContext) {
        if let Some((_, _, average)) = self.expected_size(ctx) {
            self.area_size = average;
        }
    }
}

// ----------------------------------------------------------------------
// Option providers
// ----------------------------------------------------------------------

fn usage_options(ctx: &ModelContext) -> Vec<String> {
    let options = ctx
        .form_rules
        .as_ref()
        .filter(|f| !f.property_usage_options.is_empty())
        .map(|f| f.property_usage_options.clone())
        .unwrap_or_else(|| DEFAULT_USAGES.iter().map(|s| s.to_string()).collect());
    sorted(options)
}

fn type_options(ctx: &ModelContext, usage: &str) -> Vec<String> {
    let options = ctx
        .form_rules
        .as_ref()
        .and_then(|f| f.property_type_by_usage.get(usage))
        .filter(|t| !t.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_TYPES.iter().map(|s| s.to_string()).collect());
    sorted(options)
}

fn subtype_options(ctx: &ModelContext, usage: &str, property_type: &str) -> Vec<String> {
    let rules = ctx.form_rules.as_ref();

    let mut options = rules
        .and_then(|f| f.property_subtype_by_usage.get(usage))
        .or_else(|| rules.and_then(|f| f.property_subtype_by_type.get(property_type)))
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| ctx.subtype_encoder.classes().to_vec());

    if let Some(allowed) = ctx
        .categorization
        .as_ref()
        .and_then(|c| c.subtypes_for_usage(usage))
    {
        options.retain(|s| allowed.contains(s));
    }

    if options.is_empty() {
        options = ctx.subtype_encoder.classes().iter().take(20).cloned().collect();
    }

    sorted(options)
}

fn regtype_options(ctx: &ModelContext, property_type: &str) -> Vec<String> {
    let options = ctx
        .form_rules
        .as_ref()
        .and_then(|f| f.typical_registration_types.get(property_type))
        .filter(|r| !r.is_empty())
        .cloned()
        .unwrap_or_else(|| ctx.regtype_encoder.classes().to_vec());
    sorted(options)
}

fn sorted(mut options: Vec<String>) -> Vec<String> {
    options.sort();
    options
}

fn pick_default(options: &[String], preferred: &str) -> String {
    if options.iter().any(|o| o == preferred) {
        preferred.to_string()
    } else {
        options.first().cloned().unwrap_or_default()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::test_fixtures::context_with_stub;
    use crate::rules::{FormRules, PropertyCategorization};
    use std::collections::HashMap;

    fn ctx_with_form_rules() -> crate::artifacts::ModelContext {
        let mut ctx = context_with_stub(1_000_000.0);
        ctx.form_rules = Some(FormRules {
            property_usage_options: vec!["Residential".to_string(), "Commercial".to_string()],
            property_type_by_usage: HashMap::from([
                (
                    "Residential".to_string(),
                    vec!["Unit".to_string(), "Villa".to_string()],
                ),
                (
                    "Commercial".to_string(),
                    vec!["Building".to_string(), "Land".to_string()],
                ),
            ]),
            property_subtype_by_usage: HashMap::from([
                (
                    "Residential".to_string(),
                    vec!["Flat".to_string(), "Villa".to_string(), "Hotel Apartment".to_string()],
                ),
                ("Commercial".to_string(), vec!["Office".to_string()]),
            ]),
            property_subtype_by_type: HashMap::new(),
            requires_bedrooms: HashMap::from([
                ("Unit".to_string(), true),
                ("Villa".to_string(), true),
                ("Land".to_string(), false),
                ("Building".to_string(), false),
            ]),
            typical_registration_types: HashMap::from([(
                "Unit".to_string(),
                vec!["Off-Plan Properties".to_string()],
            )]),
        });
        ctx
    }

    #[test]
    fn test_defaults_without_form_rules() {
        let ctx = context_with_stub(1_000_000.0);
        let state = FormState::new(&ctx);

        assert_eq!(state.usage, "Residential");
        assert_eq!(state.property_type, "Unit");
        assert_eq!(state.sub_type, "Flat");
        assert_eq!(state.area_name, "DUBAI MARINA");
        assert!(state.bedrooms_visible);
        // Sub-type options fall back to the encoder classes
        assert_eq!(state.subtype_options.len(), 3);
        // 2-bedroom bucket average from the rules
        assert_eq!(state.area_size, 105.0);
    }

    #[test]
    fn test_usage_change_cascades() {
        let ctx = ctx_with_form_rules();
        let mut state = FormState::new(&ctx);
        assert_eq!(state.type_options, vec!["Unit".to_string(), "Villa".to_string()]);

        state.set_usage(&ctx, "Commercial");

        assert_eq!(state.usage, "Commercial");
        assert_eq!(
            state.type_options,
            vec!["Building".to_string(), "Land".to_string()]
        );
        // Old selection invalid, reset to first option
        assert_eq!(state.property_type, "Building");
        assert_eq!(state.subtype_options, vec!["Office".to_string()]);
        assert_eq!(state.sub_type, "Office");
        // Buildings do not take a bedroom count
        assert!(!state.bedrooms_visible);
    }

    #[test]
    fn test_unknown_usage_ignored() {
        let ctx = ctx_with_form_rules();
        let mut state = FormState::new(&ctx);
        state.set_usage(&ctx, "Interplanetary");
        assert_eq!(state.usage, "Residential");
    }

    #[test]
    fn test_valid_selection_survives_cascade() {
        let ctx = ctx_with_form_rules();
        let mut state = FormState::new(&ctx);

        state.set_subtype("Villa");
        state.set_property_type(&ctx, "Villa");

        // "Villa" is still in the recomputed sub-type list, so it stays
        assert_eq!(state.sub_type, "Villa");
    }

    #[test]
    fn test_bedrooms_autofill_size() {
        let ctx = ctx_with_form_rules();
        let mut state = FormState::new(&ctx);

        state.set_bedrooms(&ctx, 3);
        assert_eq!(state.bedrooms, 3);
        assert_eq!(state.area_size, 170.0);

        // No 4_bedroom bucket in the sample rules: size stays put
        state.set_bedrooms(&ctx, 4);
        assert_eq!(state.bedrooms, 4);
        assert_eq!(state.area_size, 170.0);
    }

    #[test]
    fn test_hidden_bedrooms_report_zero() {
        let ctx = ctx_with_form_rules();
        let mut state = FormState::new(&ctx);
        state.set_usage(&ctx, "Commercial");

        assert!(!state.bedrooms_visible);
        assert_eq!(state.descriptor().bedrooms, 0);
        // Transition is a no-op while the field is hidden
        state.set_bedrooms(&ctx, 3);
        assert_eq!(state.descriptor().bedrooms, 0);
    }

    #[test]
    fn test_categorization_filters_subtypes() {
        let mut ctx = context_with_stub(1_000_000.0);
        ctx.categorization = Some(PropertyCategorization {
            residential_subtypes: vec!["Flat".to_string(), "Villa".to_string()],
            commercial_subtypes: vec![],
        });

        let state = FormState::new(&ctx);
        // "Hotel Apartment" filtered out of the encoder-backed options
        assert_eq!(
            state.subtype_options,
            vec!["Flat".to_string(), "Villa".to_string()]
        );
    }

    #[test]
    fn test_registration_options_follow_type() {
        let ctx = ctx_with_form_rules();
        let state = FormState::new(&ctx);
        assert_eq!(state.regtype_options, vec!["Off-Plan Properties".to_string()]);
        assert_eq!(state.reg_type, "Off-Plan Properties");
    }

    #[test]
    fn test_area_size_clamped() {
        let ctx = ctx_with_form_rules();
        let mut state = FormState::new(&ctx);

        state.set_area_size(5.0);
        assert_eq!(state.area_size, 10.0);
        state.set_area_size(5000.0);
        assert_eq!(state.area_size, 999.0);
    }

    #[test]
    fn test_descriptor_round_trip() {
        let ctx = ctx_with_form_rules();
        let mut state = FormState::new(&ctx);
        state.toggle_parking();

        let d = state.descriptor();
        assert_eq!(d.procedure_area, state.area_size);
        assert_eq!(d.has_parking, 0);
        assert_eq!(d.has_project, 1);
        assert_eq!(d.property_sub_type_en, "Flat");
    }
}
