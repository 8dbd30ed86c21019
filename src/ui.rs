// 🖥️ Property Valuation Dashboard
// Interactive smart form over the prediction pipeline

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use property_valuation::{
    format_compact, predict, FormState, LocationMultipliers, ModelContext, PredictionResult,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Usage,
    PropertyType,
    SubType,
    Bedrooms,
    AreaSize,
    Parking,
    Area,
    RegType,
    Predict,
}

impl Field {
    fn label(&self) -> &'static str {
        match self {
            Field::Usage => "🏠 Property Usage",
            Field::PropertyType => "🏗️ Property Type",
            Field::SubType => "🏘️ Property Sub-Type",
            Field::Bedrooms => "🛏️ Bedrooms",
            Field::AreaSize => "📐 Size (sqm)",
            Field::Parking => "🚗 Parking",
            Field::Area => "📍 Location Area",
            Field::RegType => "📋 Registration Type",
            Field::Predict => "🎯 Predict Price",
        }
    }
}

pub struct App {
    ctx: ModelContext,
    pub form: FormState,
    pub selected: usize,
    pub result: Option<PredictionResult>,
    pub error: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(ctx: ModelContext) -> Self {
        let form = FormState::new(&ctx);
        Self {
            ctx,
            form,
            selected: 0,
            result: None,
            error: None,
            should_quit: false,
        }
    }

    /// Fields currently shown, in navigation order. Bedrooms disappears for
    /// property types that do not take a bedroom count.
    pub fn visible_fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::Usage, Field::PropertyType, Field::SubType];
        if self.form.bedrooms_visible {
            fields.push(Field::Bedrooms);
        }
        fields.extend([
            Field::AreaSize,
            Field::Parking,
            Field::Area,
            Field::RegType,
            Field::Predict,
        ]);
        fields
    }

    pub fn selected_field(&self) -> Field {
        let fields = self.visible_fields();
        fields[self.selected.min(fields.len() - 1)]
    }

    pub fn next_field(&mut self) {
        let count = self.visible_fields().len();
        self.selected = (self.selected + 1) % count;
    }

    pub fn previous_field(&mut self) {
        let count = self.visible_fields().len();
        self.selected = (self.selected + count - 1) % count;
    }

    /// Step the selected field's value forward or backward.
    pub fn cycle(&mut self, forward: bool) {
        match self.selected_field() {
            Field::Usage => {
                let next = cycle_option(&self.form.usage_options, &self.form.usage, forward);
                self.form.set_usage(&self.ctx, &next);
            }
            Field::PropertyType => {
                let next =
                    cycle_option(&self.form.type_options, &self.form.property_type, forward);
                self.form.set_property_type(&self.ctx, &next);
            }
            Field::SubType => {
                let next = cycle_option(&self.form.subtype_options, &self.form.sub_type, forward);
                self.form.set_subtype(&next);
            }
            Field::Bedrooms => {
                let next = if forward {
                    (self.form.bedrooms + 1).min(6)
                } else {
                    self.form.bedrooms.saturating_sub(1)
                };
                self.form.set_bedrooms(&self.ctx, next);
            }
            Field::AreaSize => {
                let delta = if forward { 5.0 } else { -5.0 };
                self.form.set_area_size(self.form.area_size + delta);
            }
            Field::Parking => self.form.toggle_parking(),
            Field::Area => {
                let areas: Vec<String> = {
                    let mut a = self.ctx.area_encoder.classes().to_vec();
                    a.sort();
                    a
                };
                let next = cycle_option(&areas, &self.form.area_name, forward);
                self.form.set_area_name(&self.ctx, &next);
            }
            Field::RegType => {
                let next = cycle_option(&self.form.regtype_options, &self.form.reg_type, forward);
                self.form.set_reg_type(&next);
            }
            Field::Predict => {}
        }

        // Field list may have shrunk (bedrooms hidden)
        let count = self.visible_fields().len();
        self.selected = self.selected.min(count - 1);
    }

    pub fn run_prediction(&mut self) {
        match predict(&self.ctx, &self.form.descriptor()) {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }
}

fn cycle_option(options: &[String], current: &str, forward: bool) -> String {
    if options.is_empty() {
        return current.to_string();
    }
    let idx = options.iter().position(|o| o == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % options.len()
    } else {
        (idx + options.len() - 1) % options.len()
    };
    options[next].clone()
}

// ============================================================================
// Event loop
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                    KeyCode::Down | KeyCode::Tab => app.next_field(),
                    KeyCode::Up | KeyCode::BackTab => app.previous_field(),
                    KeyCode::Right => app.cycle(true),
                    KeyCode::Left => app.cycle(false),
                    KeyCode::Enter => {
                        if app.selected_field() == Field::Predict {
                            app.run_prediction();
                        }
                    }
                    KeyCode::Char('p') => app.run_prediction(),
                    _ => {}
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(f.size());

    draw_title(f, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_form(f, body[0], app);
    draw_results(f, body[1], app);
    draw_footer(f, chunks[2], app);
}

fn draw_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new("🏢 Property Price Predictor")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn draw_form(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.selected_field();
    let mut lines: Vec<Line> = Vec::new();

    for field in app.visible_fields() {
        let value = match field {
            Field::Usage => app.form.usage.clone(),
            Field::PropertyType => app.form.property_type.clone(),
            Field::SubType => app.form.sub_type.clone(),
            Field::Bedrooms => {
                if app.form.bedrooms == 0 {
                    "Studio".to_string()
                } else {
                    format!("{}", app.form.bedrooms)
                }
            }
            Field::AreaSize => format!("{:.0}", app.form.area_size),
            Field::Parking => if app.form.has_parking { "Yes" } else { "No" }.to_string(),
            Field::Area => app.form.area_name.clone(),
            Field::RegType => app.form.reg_type.clone(),
            Field::Predict => String::new(),
        };

        let style = if field == selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let marker = if field == selected { "▶ " } else { "  " };
        let text = if field == Field::Predict {
            format!("{}{}", marker, field.label())
        } else {
            format!("{}{:<24} ◀ {} ▶", marker, field.label(), value)
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    // Expected size hint for the current bedroom selection
    if let Some((min, max, avg)) = app.form.expected_size(&app.ctx) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("💡 Expected size: {:.0}-{:.0} sqm (avg {:.0})", min, max, avg),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let form = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Property Details "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(form, area);
}

fn draw_results(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();

    if let Some(error) = &app.error {
        lines.push(Line::from(Span::styled(
            format!("❌ {}", error),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(result) = &app.result {
        lines.push(Line::from(Span::styled(
            "Estimated Price Range",
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(Span::styled(
            result.price_range_formatted.clone(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        let mid = format_compact(result.predicted_price);
        if result.location_multiplier != 1.0 {
            let tier = LocationMultipliers::tier_name(result.location_multiplier);
            lines.push(Line::from(format!(
                "Mid-point: {} AED ({} Location {}x)",
                mid, tier, result.location_multiplier
            )));
        } else {
            lines.push(Line::from(format!("Mid-point: {} AED", mid)));
        }
        lines.push(Line::from(format!(
            "Price per sqm: {} AED",
            format_compact(result.price_per_sqm)
        )));
        lines.push(Line::from(format!(
            "Confidence: {} {}",
            result.confidence_level.badge(),
            result.confidence_level.label()
        )));

        if !result.validation_warnings.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Input Validation Notes:",
                Style::default().fg(Color::Yellow),
            )));
            for warning in &result.validation_warnings {
                lines.push(Line::from(Span::styled(
                    format!("⚠️ {}", warning),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
    } else {
        lines.push(Line::from(
            "Fill in the property details and press Enter on",
        ));
        lines.push(Line::from("Predict Price (or 'p') to see results"));
    }

    let results = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Prediction Results "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(results, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let meta = &app.ctx.metadata;
    let lines = vec![
        Line::from(format!(
            "📊 {} | {} samples | R² {:.4} | MAE {:.0} AED",
            meta.model_type, meta.training_samples, meta.r2_score, meta.mae
        )),
        Line::from("↑/↓ move  ◀/▶ change  Enter predict  q quit"),
    ];

    let footer = Paragraph::new(lines)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
