//! # Group Design CLI
//!
//! Terminal front end for the bridge deck screening form. One-shot
//! subcommands cover each form action; `form` walks through the whole form
//! interactively.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (e.g. `RUST_LOG=bridge_core=debug`).

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bridge_core::calculations::DeckLoadResult;
use bridge_core::export::{self, check_export, ExportCheck, ExportLimits, ExportOutcome, DEFAULT_EXPORT_FILE_NAME};
use bridge_core::geometry::{GeometryEditor, GeometrySpec};
use bridge_core::location::{LoadingRecord, LocationDatabase, SeismicZone};
use bridge_core::materials::{ConcreteGrade, SteelGrade};
use bridge_core::project::{Footpath, LocationMode, Session, StructureType};
use bridge_core::settings::Settings;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bridge deck screening form", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// External location data file (JSON); overrides the settings file
    #[arg(long, global = true)]
    location_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List states and districts in the location database
    Locations,
    /// Show the loading record for a state and district
    Lookup(LookupArgs),
    /// Resolve and commit a girder layout
    Geometry(GeometryArgs),
    /// Calculate deck load effects
    Calculate(ProjectArgs),
    /// Check limits and write the project file
    Export(ExportArgs),
    /// Fill in the form interactively
    Form,
}

#[derive(Args, Debug)]
struct LookupArgs {
    #[arg(long)]
    state: String,
    #[arg(long)]
    district: String,
}

#[derive(Args, Debug)]
struct GeometryArgs {
    /// Carriageway width (m)
    #[arg(long, default_value_t = 10.0)]
    carriageway: f64,
    /// Girder spacing (m); recomputes the girder count
    #[arg(long, conflicts_with_all = ["girders", "overhang"])]
    spacing: Option<f64>,
    /// Number of girders; recomputes the spacing
    #[arg(long)]
    girders: Option<u32>,
    /// Deck overhang (m); applied after --girders, recomputes the spacing
    #[arg(long)]
    overhang: Option<f64>,
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// State; defaults to the first in the database
    #[arg(long)]
    state: Option<String>,
    /// District; defaults to the first in the state
    #[arg(long)]
    district: Option<String>,

    /// Custom basic wind speed (m/s); switches to custom loading
    #[arg(long, requires_all = ["zone", "factor", "temp_max", "temp_min"])]
    wind: Option<f64>,
    /// Custom seismic zone (II, III, IV, V)
    #[arg(long)]
    zone: Option<SeismicZone>,
    /// Custom seismic zone factor
    #[arg(long)]
    factor: Option<f64>,
    /// Custom maximum temperature (°C)
    #[arg(long)]
    temp_max: Option<f64>,
    /// Custom minimum temperature (°C)
    #[arg(long)]
    temp_min: Option<f64>,

    /// Span (m)
    #[arg(long, default_value_t = 30.0)]
    span: f64,
    /// Carriageway width (m)
    #[arg(long, default_value_t = 10.0)]
    carriageway: f64,
    /// Footpath: None, Single-sided, or Both
    #[arg(long, default_value = "None")]
    footpath: Footpath,
    /// Skew angle (degrees)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    skew: f64,
    /// Live load (kN/m)
    #[arg(long, default_value_t = 5.0)]
    live: f64,
    /// Girder count; commits a layout for the carriageway width
    #[arg(long)]
    girders: Option<u32>,

    #[arg(long, default_value = "E250")]
    girder_steel: SteelGrade,
    #[arg(long, default_value = "E250")]
    bracing_steel: SteelGrade,
    #[arg(long, default_value = "M25")]
    deck_concrete: ConcreteGrade,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Output file
    #[arg(long, short, default_value = DEFAULT_EXPORT_FILE_NAME)]
    output: PathBuf,
    /// Accept the skew warning without asking
    #[arg(long)]
    yes: bool,
}

/// Loaded configuration shared by every command
struct AppContext {
    settings: Settings,
    db: LocationDatabase,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = load_context(&cli)?;

    match cli.command {
        Command::Locations => handle_locations(&ctx),
        Command::Lookup(args) => handle_lookup(&ctx, args),
        Command::Geometry(args) => handle_geometry(&ctx, args),
        Command::Calculate(args) => handle_calculate(&ctx, args),
        Command::Export(args) => handle_export(&ctx, args),
        Command::Form => handle_form(&ctx),
    }
}

fn load_context(cli: &Cli) -> Result<AppContext> {
    let settings = Settings::load_or_default(cli.config.as_deref())
        .with_context(|| format!("failed to load settings from {:?}", cli.config))?;
    let db_path = cli.location_db.clone().or_else(|| settings.location_db.clone());
    debug!(?db_path, "Resolving location database");
    let db = LocationDatabase::load(db_path.as_deref());
    Ok(AppContext { settings, db })
}

fn handle_locations(ctx: &AppContext) -> Result<()> {
    for state in ctx.db.states() {
        println!("{}", state);
        for district in ctx.db.districts(state) {
            println!("  {}", district);
        }
    }
    Ok(())
}

fn handle_lookup(ctx: &AppContext, args: LookupArgs) -> Result<()> {
    let record = ctx
        .db
        .lookup(&args.state, &args.district)
        .with_context(|| format!("lookup failed for {} / {}", args.state, args.district))?;
    print_loading(&args.state, &args.district, &record);
    print_json(&record);
    Ok(())
}

fn handle_geometry(ctx: &AppContext, args: GeometryArgs) -> Result<()> {
    let mut editor = GeometryEditor::open(args.carriageway, None, ctx.settings.geometry)?;
    if let Some(spacing) = args.spacing {
        editor.set_spacing(Some(spacing));
    }
    if let Some(girders) = args.girders {
        editor.set_girders(Some(girders));
    }
    if let Some(overhang) = args.overhang {
        editor.set_overhang(Some(overhang));
    }

    let spec = editor.commit().context("geometry could not be committed")?;
    print_geometry(&spec);
    print_json(&spec);
    Ok(())
}

fn handle_calculate(ctx: &AppContext, args: ProjectArgs) -> Result<()> {
    let mut session = build_session(ctx, &args)?;
    let result = session.calculate().context("calculation failed")?;
    print_results(&session, &result);
    print_json(&result);
    Ok(())
}

fn handle_export(ctx: &AppContext, args: ExportArgs) -> Result<()> {
    let session = build_session(ctx, &args.project)?;
    let yes = args.yes;
    let outcome = export::export_project(&session, &args.output, &ctx.settings.export, |skew| {
        yes || confirm(&format!("Skew angle {:.1}° exceeds the warning limit. Continue? (y/n) [n]: ", skew), false)
    })
    .with_context(|| format!("export to {} failed", args.output.display()))?;
    report_export(&outcome);
    Ok(())
}

/// Build a session from command-line inputs.
fn build_session(ctx: &AppContext, args: &ProjectArgs) -> Result<Session> {
    let mut session = Session::new(&ctx.db, ctx.settings.geometry);

    match (&args.state, &args.district) {
        (Some(state), Some(district)) => {
            session.select_location(&ctx.db, state, district)?;
        }
        (Some(state), None) => {
            session.select_state(&ctx.db, state)?;
        }
        (None, Some(_)) => bail!("--district requires --state"),
        (None, None) => {}
    }

    if let (Some(wind), Some(zone), Some(factor), Some(temp_max), Some(temp_min)) =
        (args.wind, args.zone, args.factor, args.temp_max, args.temp_min)
    {
        session
            .apply_custom_loading(LoadingRecord {
                wind_speed_mps: wind,
                seismic_zone: zone,
                seismic_factor: factor,
                temp_max_c: temp_max,
                temp_min_c: temp_min,
            })
            .context("custom loading rejected")?;
    }

    let geometric = &mut session.input.geometric;
    geometric.span_m = args.span;
    geometric.carriageway_width_m = args.carriageway;
    geometric.footpath = args.footpath;
    geometric.skew_deg = args.skew;
    geometric.live_load_kn_per_m = args.live;

    let materials = &mut session.input.materials;
    materials.girder_steel = args.girder_steel;
    materials.bracing_steel = args.bracing_steel;
    materials.deck_concrete = args.deck_concrete;

    if let Some(girders) = args.girders {
        let mut editor = session.open_geometry_editor()?;
        editor.set_girders(Some(girders));
        session.commit_geometry(&editor).context("geometry could not be committed")?;
    }

    Ok(session)
}

fn handle_form(ctx: &AppContext) -> Result<()> {
    println!("Group Design - Bridge Deck Screening");
    println!("====================================");
    println!();

    let mut session = Session::new(&ctx.db, ctx.settings.geometry);

    let structure = prompt_parse("Type of structure (Highway/Other) [Highway]: ", StructureType::Highway);
    session.set_structure_type(structure);
    if !structure.is_supported() {
        println!("Other structures not included.");
        return Ok(());
    }

    let custom = prompt_line("Loading source (location/custom) [location]: ", "location").eq_ignore_ascii_case("custom");
    if custom {
        prompt_custom_loading(&mut session);
    } else {
        prompt_location(ctx, &mut session);
    }

    println!();
    let defaults = session.input.geometric;
    let geometric = &mut session.input.geometric;
    geometric.span_m = prompt_f64(&format!("Span (m) [{}]: ", defaults.span_m), defaults.span_m);
    geometric.carriageway_width_m = prompt_f64(
        &format!("Carriageway width (m) [{}]: ", defaults.carriageway_width_m),
        defaults.carriageway_width_m,
    );
    geometric.footpath = prompt_parse("Footpath (None/Single-sided/Both) [None]: ", defaults.footpath);
    geometric.skew_deg = prompt_f64(&format!("Skew angle (deg) [{}]: ", defaults.skew_deg), defaults.skew_deg);
    geometric.live_load_kn_per_m = prompt_f64(
        &format!("Live load (kN/m) [{}]: ", defaults.live_load_kn_per_m),
        defaults.live_load_kn_per_m,
    );

    let materials = &mut session.input.materials;
    materials.girder_steel = prompt_parse("Girder steel (E250/E350/E450) [E250]: ", materials.girder_steel);
    materials.bracing_steel = prompt_parse("Bracing steel (E250/E350/E450) [E250]: ", materials.bracing_steel);
    materials.deck_concrete = prompt_parse("Deck concrete (M25-M60) [M25]: ", materials.deck_concrete);

    if confirm("Modify additional geometry? (y/n) [n]: ", false) {
        prompt_geometry(&mut session);
    }

    println!();
    match session.calculate() {
        Ok(result) => print_results(&session, &result),
        Err(e) => print_error(&e),
    }

    println!();
    if !confirm("Export project? (y/n) [y]: ", true) {
        return Ok(());
    }
    let path = PathBuf::from(prompt_line(
        &format!("Output file [{}]: ", DEFAULT_EXPORT_FILE_NAME),
        DEFAULT_EXPORT_FILE_NAME,
    ));
    match export_with_prompt(&session, &path, &ctx.settings.export) {
        Ok(outcome) => report_export(&outcome),
        Err(e) => print_error(&e),
    }
    Ok(())
}

fn prompt_location(ctx: &AppContext, session: &mut Session) {
    let states = ctx.db.states();
    println!("States: {}", states.join(", "));
    let state = prompt_line(&format!("State [{}]: ", session.input.state), &session.input.state);

    let districts = ctx.db.districts(&state);
    if districts.is_empty() {
        println!("Unknown state '{}'; keeping {}.", state, session.input.state);
    } else {
        println!("Districts: {}", districts.join(", "));
        let district = prompt_line(&format!("District [{}]: ", districts[0]), districts[0]);
        if let Err(e) = session.select_location(&ctx.db, &state, &district) {
            print_error(&e);
        }
    }

    if let Some(record) = session.input.loading {
        print_loading(&session.input.state, &session.input.district, &record);
    }
}

fn prompt_custom_loading(session: &mut Session) {
    let base = session.input.loading;
    let wind_default = base.map(|r| r.wind_speed_mps).unwrap_or(39.0);
    let factor_default = base.map(|r| r.seismic_factor).unwrap_or(0.16);
    let max_default = base.map(|r| r.temp_max_c).unwrap_or(36.0);
    let min_default = base.map(|r| r.temp_min_c).unwrap_or(18.0);

    let record = LoadingRecord {
        wind_speed_mps: prompt_f64(&format!("Basic wind speed (m/s) [{}]: ", wind_default), wind_default),
        seismic_zone: prompt_parse("Seismic zone (II/III/IV/V) [III]: ", SeismicZone::III),
        seismic_factor: prompt_f64(&format!("Seismic zone factor [{}]: ", factor_default), factor_default),
        temp_max_c: prompt_f64(&format!("Maximum temperature (°C) [{}]: ", max_default), max_default),
        temp_min_c: prompt_f64(&format!("Minimum temperature (°C) [{}]: ", min_default), min_default),
    };
    match session.apply_custom_loading(record) {
        Ok(()) => println!("Custom loading saved."),
        Err(e) => print_error(&e),
    }
}

fn prompt_geometry(session: &mut Session) {
    let mut editor = match session.open_geometry_editor() {
        Ok(editor) => editor,
        Err(e) => {
            print_error(&e);
            return;
        }
    };
    println!("Overall bridge width: {:.2} m", editor.overall_width_m());

    loop {
        let draft = *editor.draft();
        let spacing = prompt_optional_f64("Girder spacing (m)", draft.spacing_m);
        if spacing != draft.spacing_m {
            editor.set_spacing(spacing);
        }

        let draft = *editor.draft();
        let girders = prompt_optional_u32("Number of girders", draft.girders);
        if girders != draft.girders {
            editor.set_girders(girders);
        }

        let draft = *editor.draft();
        let overhang = prompt_optional_f64("Deck overhang (m)", draft.overhang_m);
        if overhang != draft.overhang_m {
            editor.set_overhang(overhang);
        }

        match session.commit_geometry(&editor) {
            Ok(spec) => {
                print_geometry(&spec);
                return;
            }
            Err(e) => {
                print_error(&e);
                if !confirm("Edit again? (y/n) [y]: ", true) {
                    return;
                }
            }
        }
    }
}

fn export_with_prompt(
    session: &Session,
    path: &Path,
    limits: &ExportLimits,
) -> bridge_core::CalcResult<ExportOutcome> {
    if let ExportCheck::NeedsConfirmation { skew_deg } = check_export(session, limits)? {
        println!("Warning: skew angle {:.1}° exceeds {:.0}°.", skew_deg, limits.skew_warning_deg);
    }
    export::export_project(session, path, limits, |_| confirm("Continue with export? (y/n) [n]: ", false))
}

fn print_loading(state: &str, district: &str, record: &LoadingRecord) {
    println!("═══════════════════════════════════════");
    println!("  LOADING: {} / {}", district, state);
    println!("═══════════════════════════════════════");
    println!("  Basic wind speed:    {:.1} m/s", record.wind_speed_mps);
    println!("  Seismic zone:        {}", record.seismic_zone);
    println!("  Seismic zone factor: {:.2}", record.seismic_factor);
    println!("  Temperature:         {:.1} / {:.1} °C", record.temp_max_c, record.temp_min_c);
    println!();
}

fn print_geometry(spec: &GeometrySpec) {
    println!("═══════════════════════════════════════");
    println!("  GIRDER LAYOUT");
    println!("═══════════════════════════════════════");
    println!("  Carriageway:   {:.2} m", spec.carriageway_width_m);
    println!("  Overall width: {:.2} m", spec.overall_width_m);
    println!("  Spacing:       {:.1} m", spec.girder_spacing_m);
    println!("  Girders:       {}", spec.girder_count);
    println!("  Overhang:      {:.1} m", spec.deck_overhang_m);
    println!();
}

fn print_results(session: &Session, result: &DeckLoadResult) {
    let geometric = &session.input.geometric;
    println!("═══════════════════════════════════════");
    println!("  DECK LOAD RESULTS");
    println!("═══════════════════════════════════════");
    println!();
    println!("Input:");
    println!("  Span:        {:.2} m", geometric.span_m);
    println!("  Carriageway: {:.2} m", geometric.carriageway_width_m);
    println!("  Live load:   {:.2} kN/m", geometric.live_load_kn_per_m);
    println!("  Girders:     {}", result.girder_count);
    println!();
    println!("Load Effects:");
    println!("  Self weight     = {:.2} kN", result.self_weight_kn);
    println!("  Uniform load    = {:.2} kN/m", result.uniform_load_kn_per_m);
    println!("  Total moment    = {:.2} kN·m", result.total_moment_knm);
    println!("  Total shear     = {:.2} kN", result.total_shear_kn);
    println!("  Moment / girder = {:.2} kN·m", result.per_girder_moment_knm);
    println!("  Shear / girder  = {:.2} kN", result.per_girder_shear_kn);
    println!();
    if session.input.location_mode == LocationMode::Custom && session.input.loading.is_none() {
        println!("Note: custom loading not entered.");
        println!();
    }
}

fn report_export(outcome: &ExportOutcome) {
    match outcome {
        ExportOutcome::Written(path) => println!("Project exported to {}", path.display()),
        ExportOutcome::Declined => println!("Export cancelled."),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!("JSON Output:");
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

fn print_error(e: &bridge_core::CalcError) {
    eprintln!("Error: {}", e);
    if let Ok(json) = serde_json::to_string_pretty(e) {
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
}

fn prompt_line(prompt: &str, default: &str) -> String {
    print!("{}", prompt);
    if io::stdout().flush().is_err() {
        return default.to_string();
    }

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return default.to_string();
    }

    let trimmed = input.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn prompt_f64(prompt: &str, default: f64) -> f64 {
    prompt_line(prompt, "").parse().unwrap_or(default)
}

fn prompt_parse<T: std::str::FromStr>(prompt: &str, default: T) -> T {
    prompt_line(prompt, "").parse().unwrap_or(default)
}

/// Blank keeps the current value; unparseable input clears the field.
fn prompt_optional_f64(label: &str, current: Option<f64>) -> Option<f64> {
    let shown = current.map(|v| v.to_string()).unwrap_or_default();
    let entered = prompt_line(&format!("{} [{}]: ", label, shown), &shown);
    entered.parse().ok()
}

fn prompt_optional_u32(label: &str, current: Option<u32>) -> Option<u32> {
    let shown = current.map(|v| v.to_string()).unwrap_or_default();
    let entered = prompt_line(&format!("{} [{}]: ", label, shown), &shown);
    entered.parse().ok()
}

fn confirm(prompt: &str, default: bool) -> bool {
    let answer = prompt_line(prompt, if default { "y" } else { "n" });
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}
