// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::filter::EnvFilter;

use enrollment_forms::{
    load_users_csv, roster::parse_role_filter, Association, Entity, EntityId, FormConfig,
    FormSession, FormSnapshot, HeadlessPicker, RosterFilter, RowKind, ScheduleFields,
    SelectionSynchronizer, SubmitOutcome,
};

/// Initialize logging to stderr, `info` unless RUST_LOG says otherwise
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn usage() -> &'static str {
    "Usage:
  enrollment-forms demo
  enrollment-forms validate <form.json> [--config <config.json>]
  enrollment-forms roster <users.csv> [--role <role|all>] [--search <text>]
  enrollment-forms pick <candidates.csv>"
}

/// Value following `--name`, if present
fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("demo") => run_demo(),
        Some("validate") => {
            let path = args.get(2).ok_or_else(|| anyhow!(usage()))?;
            let config = match flag_value(&args, "--config") {
                Some(config_path) => FormConfig::from_file(config_path)?,
                None => FormConfig::default(),
            };
            run_validate(Path::new(path), &config)
        }
        Some("roster") => {
            let path = args.get(2).ok_or_else(|| anyhow!(usage()))?;
            let role = parse_role_filter(flag_value(&args, "--role").unwrap_or("all"))?;
            let search = flag_value(&args, "--search").unwrap_or("");
            run_roster(Path::new(path), RosterFilter::new(role, search))
        }
        Some("pick") => {
            let path = args.get(2).ok_or_else(|| anyhow!(usage()))?;
            run_pick(Path::new(path))
        }
        _ => {
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    }
}

fn run_demo() -> Result<()> {
    println!("🎓 Enrollment form walkthrough");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let candidates = vec![
        Entity::new("1", "Zapata, Ana"),
        Entity::new("2", "Alvarez, Ben"),
        Entity::new("3", "Muñoz, Carla"),
        Entity::new("4", "Díaz, Diego"),
    ];
    let sync = SelectionSynchronizer::new(
        Association::StudentsOfCourse,
        candidates,
        &[EntityId::from("4")],
        HeadlessPicker::new(),
    );
    let mut session: FormSession = FormSession::new(&FormConfig::default()).with_enrollment(sync);

    if let Some(sync) = session.enrollment_mut() {
        println!("\n📋 Picker: {:?}", sync.pool().labels());
        sync.select(&EntityId::from("1"));
        sync.deselect(&EntityId::from("4"));
        println!("✓ Selected Zapata, Ana; returned Díaz, Diego");
        println!("📋 Picker: {:?}", sync.pool().labels());
        println!(
            "📋 Table:  {:?}",
            sync.table().rows().iter().map(|r| r.display_label.as_str()).collect::<Vec<_>>()
        );
    }

    let lab_a = session.add_row(RowKind::Lab);
    let lab_b = session.add_row(RowKind::Lab);
    session.rows_mut(RowKind::Lab).set_lab_name(lab_a, "Redes");
    session.rows_mut(RowKind::Lab).set_lab_name(lab_b, "Redes");

    let slot = session.add_row(RowKind::Schedule);
    session
        .rows_mut(RowKind::Schedule)
        .set_schedule(slot, ScheduleFields::from_form_values("mon", "09:00", "10:00")?);

    println!("\n📝 Submitting with two labs named 'Redes'...");
    print_outcome(&session.submit());

    session.rows_mut(RowKind::Lab).set_lab_name(lab_b, "Bases de Datos");
    println!("\n📝 Renamed the second lab, submitting again...");
    print_outcome(&session.submit());

    Ok(())
}

fn print_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Proceed(payload) => {
            println!("✅ Submitted ({} fields)", payload.fields.len());
            println!("   {}", payload.to_urlencoded());
        }
        SubmitOutcome::Cancelled(violation) => {
            println!("❌ Cancelled: {} (row {})", violation, violation.row());
        }
    }
}

fn run_validate(path: &Path, config: &FormConfig) -> Result<()> {
    let snapshot = FormSnapshot::from_file(path)?;
    let session = snapshot.open(config, HeadlessPicker::new())?;

    let outcome = session.submit();
    print_outcome(&outcome);

    if outcome.is_cancelled() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_roster(path: &Path, filter: RosterFilter) -> Result<()> {
    let users = load_users_csv(path)?;
    let shown = filter.apply(&users);

    println!("👥 {} of {} users", shown.len(), users.len());
    for user in shown {
        println!("  {:<6} {:<30} {:<30} {}", user.id, user.name, user.email, user.role.as_str());
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_pick(path: &Path) -> Result<()> {
    let candidates = enrollment_forms::load_candidates_csv(path)?;
    println!("✓ Loaded {} candidates", candidates.len());

    let mut app = ui::App::new(Association::StudentsOfCourse, candidates, &[]);
    ui::run_ui(&mut app)?;

    let payload: Vec<String> = app
        .sync
        .form_fields()
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    println!("\n✅ Selection: {}", payload.join(" "));

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_pick(_path: &Path) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
