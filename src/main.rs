// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context as AnyhowContext, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

// Use library instead of local modules
use property_valuation::{predict_batch, ModelContext, PropertyDescriptor};

fn model_dir() -> PathBuf {
    env::var("MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("model"))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("batch") => {
            let input = args
                .get(2)
                .map(PathBuf::from)
                .context("Usage: property-valuation batch <input.csv> [output.csv]")?;
            let output = args.get(3).map(PathBuf::from).unwrap_or_else(|| {
                PathBuf::from(format!(
                    "predictions_{}.csv",
                    chrono::Local::now().format("%Y%m%d_%H%M%S")
                ))
            });
            run_batch(&input, &output)?;
        }
        Some("info") => run_info()?,
        _ => run_ui_mode()?,
    }

    Ok(())
}

fn load_context() -> Result<ModelContext> {
    let dir = model_dir();

    if !dir.exists() {
        eprintln!("❌ Model directory not found at {:?}", dir);
        eprintln!("   Place the trained artifacts there, or set MODEL_DIR.");
        std::process::exit(1);
    }

    println!("📦 Loading model artifacts from {:?}...", dir);
    let ctx = ModelContext::load(&dir)?;
    println!(
        "✓ Loaded {} ({} areas, {} sub-types, {} registration types)",
        ctx.model.model_type(),
        ctx.area_encoder.len(),
        ctx.subtype_encoder.len(),
        ctx.regtype_encoder.len()
    );
    if ctx.validation_rules.is_none() {
        println!("⚠️  No validation rules loaded - predictions will carry no warnings");
    }

    Ok(ctx)
}

// ============================================================================
// Batch prediction from CSV
// ============================================================================

/// CSV row for batch input; same columns the API accepts as JSON.
#[derive(Debug, Deserialize)]
struct BatchRow {
    procedure_area: f64,
    bedrooms: u8,
    has_parking: u8,
    has_project: u8,
    area_name_en: String,
    property_sub_type_en: String,
    reg_type_en: String,
}

impl From<BatchRow> for PropertyDescriptor {
    fn from(row: BatchRow) -> Self {
        PropertyDescriptor {
            procedure_area: row.procedure_area,
            bedrooms: row.bedrooms,
            has_parking: row.has_parking,
            has_project: row.has_project,
            area_name_en: row.area_name_en,
            property_sub_type_en: row.property_sub_type_en,
            reg_type_en: row.reg_type_en,
        }
    }
}

fn run_batch(input: &Path, output: &Path) -> Result<()> {
    println!("🏢 Property Valuation - Batch Prediction");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let ctx = load_context()?;

    println!("\n📂 Reading {:?}...", input);
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to open input CSV: {:?}", input))?;

    let mut descriptors: Vec<PropertyDescriptor> = Vec::new();
    for record in reader.deserialize() {
        let row: BatchRow = record.context("Failed to parse CSV row")?;
        descriptors.push(row.into());
    }
    println!("✓ Loaded {} properties", descriptors.len());

    println!("\n🔮 Predicting...");
    let batch = predict_batch(&ctx, &descriptors)?;

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to create output CSV: {:?}", output))?;
    writer.write_record([
        "procedure_area",
        "bedrooms",
        "has_parking",
        "has_project",
        "area_name_en",
        "property_sub_type_en",
        "reg_type_en",
        "predicted_price",
        "price_per_sqm",
        "confidence_level",
    ])?;
    for result in &batch.predictions {
        let d = &result.input_features;
        writer.write_record([
            d.procedure_area.to_string(),
            d.bedrooms.to_string(),
            d.has_parking.to_string(),
            d.has_project.to_string(),
            d.area_name_en.clone(),
            d.property_sub_type_en.clone(),
            d.reg_type_en.clone(),
            result.predicted_price.to_string(),
            result.price_per_sqm.to_string(),
            result.confidence_level.label().to_string(),
        ])?;
    }
    writer.flush()?;

    // Summary statistics
    let prices: Vec<f64> = batch.predictions.iter().map(|p| p.predicted_price).collect();
    let avg = if prices.is_empty() {
        0.0
    } else {
        prices.iter().sum::<f64>() / prices.len() as f64
    };
    let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Predicted prices for {} properties", batch.total_properties);
    if !prices.is_empty() {
        println!("   Avg: {:.0} AED   Min: {:.0} AED   Max: {:.0} AED", avg, min, max);
    }
    println!("   Results written to {:?}", output);

    Ok(())
}

// ============================================================================
// Model info
// ============================================================================

fn run_info() -> Result<()> {
    let ctx = load_context()?;
    let info = ctx.model_info();

    println!("\n📊 Model Information");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Model type:        {}", info.model_type);
    println!("Training samples:  {}", info.training_samples);
    println!("R² score:          {:.4}", info.r2_score);
    println!("MAE:               {:.2} AED", info.mae);
    println!(
        "Price range:       {:.0} - {:.0} AED",
        info.price_range.lower, info.price_range.upper
    );
    println!("Known areas:       {}", ctx.area_encoder.len());
    println!("Known sub-types:   {}", ctx.subtype_encoder.len());
    println!("Known reg. types:  {}", ctx.regtype_encoder.len());

    Ok(())
}

// ============================================================================
// Dashboard
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    println!("🖥️  Loading Property Valuation Dashboard...\n");

    let ctx = load_context()?;

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(ctx);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin valuation-server --features server");
    std::process::exit(1);
}
