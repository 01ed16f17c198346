use clap::{Parser, Subcommand};
use erdedit::editor::{Editor, EditorInput, EditorState, Notification};
use erdedit::gesture::GestureEvent;
use erdedit::layout::{LayoutError, LayoutModel};
use erdedit::logging;
use erdedit::model::{Position, RelationshipType, Snapshot, TableNode};
use erdedit::persistence::{HttpGateway, MemoryGateway, PersistenceGateway};
use erdedit::proposal::RelationshipProposal;
use erdedit::settings::EditorConfig;
use erdedit::svg::SvgRenderer;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "erdedit")]
#[command(
    about = "Edit and render ER diagrams stored behind a persistence gateway",
    long_about = None
)]
struct Cli {
    /// Config file (default: ./erdedit.toml when present)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Gateway base URL, overrides gateway.base_url
    #[arg(long, conflicts_with = "snapshot")]
    gateway: Option<String>,

    /// Work on a local snapshot file instead of a gateway
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the diagram to SVG
    Render {
        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Highlight a table as selected
        #[arg(long)]
        select: Option<String>,
    },
    /// Show a table's columns and relationships
    Inspect { table: String },
    /// Move a table to a new position
    Move {
        table: String,
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,
    },
    /// Create a relationship between two tables
    Connect {
        from: String,
        to: String,

        /// Source column (default: primary key, else first column)
        #[arg(long)]
        from_column: Option<String>,

        /// Target column (default: primary key, else first column)
        #[arg(long)]
        to_column: Option<String>,

        /// one-to-many, one-to-one, many-to-many or many-to-one
        #[arg(long = "type", value_parser = parse_relationship_type)]
        relationship_type: Option<RelationshipType>,
    },
    /// Delete a relationship by id
    Disconnect { id: String },
    /// Write the whole diagram as snapshot JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Move { .. } | Command::Connect { .. } | Command::Disconnect { .. }
        )
    }
}

fn parse_relationship_type(s: &str) -> Result<RelationshipType, String> {
    RelationshipType::from_str(s).ok_or_else(|| format!("unknown relationship type: {}", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = EditorConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.gateway {
        config.gateway.base_url = url.clone();
    }
    logging::init(&config.log_filter);

    if !run(cli, config).await? {
        process::exit(1);
    }
    Ok(())
}

/// Execute one command. Returns false when a mutating command reported a
/// failure.
async fn run(cli: Cli, config: EditorConfig) -> Result<bool, Box<dyn Error>> {
    let memory = match &cli.snapshot {
        Some(path) => Some(Arc::new(MemoryGateway::new(read_snapshot(path)?))),
        None => None,
    };
    let gateway: Arc<dyn PersistenceGateway> = match &memory {
        Some(memory) => memory.clone(),
        None => Arc::new(HttpGateway::new(&config.gateway)?),
    };

    let mut editor = Editor::new(gateway, config.canvas.clone());
    editor.load().await;
    report(&editor.drain_notifications());

    let mutating = cli.command.is_mutating();
    match cli.command {
        Command::Render { output, select } => {
            if let Some(table) = select {
                editor.dispatch(EditorInput::SelectTable(table));
            }
            let svg = SvgRenderer::default().render(&editor.render());
            write_output(output.as_deref(), &svg)?;
        }
        Command::Inspect { table } => {
            editor.dispatch(EditorInput::SelectTable(table.clone()));
            let details = editor.details().ok_or(LayoutError::UnknownTable(table))?;
            print!("{}", details.to_text());
        }
        Command::Move { table, x, y } => {
            editor.dispatch(GestureEvent::DragStart(table));
            editor.dispatch(GestureEvent::Drop(Position::new(x, y)));
        }
        Command::Connect {
            from,
            to,
            from_column,
            to_column,
            relationship_type,
        } => {
            let layout = &editor.state().layout;
            let mut proposal =
                RelationshipProposal::between(table(layout, &from)?, table(layout, &to)?)
                    .with_columns(from_column, to_column);
            if let Some(relationship_type) = relationship_type {
                proposal = proposal.with_type(relationship_type);
            }
            editor.create_relationship(proposal)?;
        }
        Command::Disconnect { id } => {
            if editor.state().layout.relationship(&id).is_none() {
                return Err(format!("unknown relationship: {}", id).into());
            }
            editor.dispatch(EditorInput::ClickRelationshipLabel(id));
        }
        Command::Export { output } => {
            let snapshot = match &memory {
                Some(memory) => memory.snapshot(),
                None => snapshot_of(editor.state()),
            };
            write_output(output.as_deref(), &snapshot.to_json()?)?;
        }
    }

    editor.settle().await;
    let failed = report(&editor.drain_notifications());
    if !mutating {
        return Ok(true);
    }
    if failed {
        return Ok(false);
    }

    if let (Some(memory), Some(path)) = (&memory, &cli.snapshot) {
        write_snapshot(path, &memory.snapshot())?;
        info!(path = %path.display(), "snapshot updated");
    }
    Ok(true)
}

fn table<'a>(layout: &'a LayoutModel, name: &str) -> Result<&'a TableNode, LayoutError> {
    layout
        .table(name)
        .ok_or_else(|| LayoutError::UnknownTable(name.to_string()))
}

/// Print failures to stderr. Returns true when there were any.
fn report(notifications: &[Notification]) -> bool {
    let mut failed = false;
    for notification in notifications {
        if let Notification::Failure(err) = notification {
            eprintln!("error: {}", err);
            failed = true;
        }
    }
    failed
}

fn snapshot_of(state: &EditorState) -> Snapshot {
    Snapshot {
        tables: state.layout.list_tables().cloned().collect(),
        relationships: state.layout.relationships().cloned().collect(),
        ..Snapshot::default()
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, Box<dyn Error>> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(Snapshot::from_json(&json)
        .map_err(|e| format!("Invalid snapshot {}: {}", path.display(), e))?)
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), Box<dyn Error>> {
    let mut json = snapshot.to_json()?;
    json.push('\n');
    fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => fs::write(path, content)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?,
        None => print!("{}", content),
    }
    Ok(())
}
