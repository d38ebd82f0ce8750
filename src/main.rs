use anyhow::{anyhow, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use layout_snapshot::settings::{Settings, SETTINGS_FILE};
use layout_snapshot::{logging, LayoutRecord, RecordStore};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "layout-snapshot", version, about = "Capture and restore desktop window layouts")]
struct Cli {
    /// Settings file; the snapshot file is resolved relative to it
    #[arg(long, env = "LAYOUT_SNAPSHOT_SETTINGS", default_value = SETTINGS_FILE)]
    settings: PathBuf,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Capture the current layout and print its id
    Capture,

    /// List stored layouts, oldest first (default)
    List,

    /// Restore a layout by id, or the most recent one
    Restore {
        /// Layout id or `latest`
        id: Option<String>,
    },

    /// Remove a stored layout
    Remove {
        /// Layout id or `latest`
        id: String,
    },

    /// Remove every stored layout
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.settings)
        .with_context(|| format!("loading {}", cli.settings.display()))?;
    logging::init(settings.debug_logging, settings.log_path(&cli.settings));

    let store = RecordStore::open_with(
        settings.snapshots_path(&cli.settings),
        settings.store_options(),
    )?;
    let result = run(&store, cli.cmd.unwrap_or(Command::List));
    store.close();
    result
}

fn run(store: &RecordStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => {
            for record in store.list() {
                println!(
                    "{}  {}  {} windows  {} displays{}",
                    record.id(),
                    record.captured_at().with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                    record.windows().len(),
                    record.display_count(),
                    if record.user_initiated() { "" } else { "  (auto)" },
                );
            }
        }
        Command::Capture => {
            let id = capture(store)?;
            println!("{id}");
        }
        Command::Restore { id } => {
            let record = find(store, id.as_deref())?;
            restore(&record)?;
        }
        Command::Remove { id } => {
            let record = find(store, Some(id.as_str()))?;
            store.remove(&record)?.wait()?;
        }
        Command::Clear => store.clear()?.wait()?,
    }
    Ok(())
}

fn find(store: &RecordStore, argument: Option<&str>) -> anyhow::Result<Arc<LayoutRecord>> {
    match argument {
        None | Some("latest") => store
            .list()
            .pop()
            .ok_or_else(|| anyhow!("no layouts have been captured yet")),
        Some(id) => {
            let id = Uuid::parse_str(id).with_context(|| format!("'{id}' is not a layout id"))?;
            store.get(id).ok_or_else(|| anyhow!("no layout with id {id}"))
        }
    }
}

#[cfg(windows)]
fn capture(store: &RecordStore) -> anyhow::Result<Uuid> {
    use layout_snapshot::desktop::Win32Desktop;
    use layout_snapshot::WindowSurveyor;

    let desktop = Win32Desktop::new();
    let record = WindowSurveyor::new(&desktop).capture(true)?;
    let id = record.id();
    store.add(record)?.wait()?;
    Ok(id)
}

#[cfg(not(windows))]
fn capture(_store: &RecordStore) -> anyhow::Result<Uuid> {
    anyhow::bail!("capturing a layout requires a Windows desktop")
}

#[cfg(windows)]
fn restore(record: &LayoutRecord) -> anyhow::Result<()> {
    use layout_snapshot::desktop::Win32Desktop;
    use layout_snapshot::restore::PlacementResult;
    use layout_snapshot::LayoutRestorer;

    let desktop = Win32Desktop::new();
    let summary = LayoutRestorer::new(&desktop).restore_preserving_foreground(record, || {});
    for entry in &summary.entries {
        if let PlacementResult::Failed(reason) = &entry.result {
            eprintln!("{} {:?}: {reason}", entry.handle, entry.title);
        }
    }
    println!(
        "restored {} windows, {} failed, {} restacked",
        summary.applied_windows, summary.failed_windows, summary.restacked_windows
    );
    Ok(())
}

#[cfg(not(windows))]
fn restore(_record: &LayoutRecord) -> anyhow::Result<()> {
    anyhow::bail!("restoring a layout requires a Windows desktop")
}
