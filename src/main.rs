use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ticketflow_backend::{HttpBackend, refresh_preview, save, terminal};
use ticketflow_config::{EditorMode, EditorSettings, Mode};
use ticketflow_editor::{PreviewOutcome, SyncEngine, TerminalCommand, TextSession, gui_payload};
use ticketflow_model::{WorkflowModel, parse_options, render_options, validate};

/// Ticketflow - edit and preview ticket workflows against a workflow admin panel
#[derive(Parser)]
#[command(name = "ticketflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the settings file (default: ~/.ticketflow/settings.json)
  #[arg(long, global = true)]
  settings: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the request payload for a workflow options file
  Payload {
    workflow_file: PathBuf,

    #[arg(long, value_enum, default_value = "update-chart")]
    mode: PayloadMode,
  },

  /// Check a workflow options file the way the backend would
  Validate { workflow_file: PathBuf },

  /// Print a workflow options file in normalized form
  Text { workflow_file: PathBuf },

  /// Render a preview of a workflow and print the image URL
  Preview {
    workflow_file: PathBuf,

    /// Send the file as text instead of as statuses and actions
    #[arg(long)]
    text: bool,
  },

  /// Save a workflow to the backend
  Save {
    workflow_file: PathBuf,

    #[arg(long)]
    text: bool,
  },

  /// Send a reset, init or editor switch command
  Command {
    #[arg(value_enum)]
    command: CommandArg,

    /// Confirm commands that discard the current workflow
    #[arg(long)]
    yes: bool,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum PayloadMode {
  Backup,
  UpdateChart,
  Update,
}

impl From<PayloadMode> for Mode {
  fn from(mode: PayloadMode) -> Self {
    match mode {
      PayloadMode::Backup => Mode::Backup,
      PayloadMode::UpdateChart => Mode::UpdateChart,
      PayloadMode::Update => Mode::Update,
    }
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum CommandArg {
  Reset,
  Init,
  ChangeTextmode,
  ChangeGuimode,
}

impl From<CommandArg> for TerminalCommand {
  fn from(arg: CommandArg) -> Self {
    match arg {
      CommandArg::Reset => TerminalCommand::Reset,
      CommandArg::Init => TerminalCommand::Init,
      CommandArg::ChangeTextmode => TerminalCommand::ChangeTextmode,
      CommandArg::ChangeGuimode => TerminalCommand::ChangeGuimode,
    }
  }
}

fn main() -> Result<()> {
  init_tracing();
  let cli = Cli::parse();
  let settings = load_settings(cli.settings.as_deref())?;
  debug!(endpoint = %settings.endpoint, editor = %settings.default_editor, "settings loaded");

  match cli.command {
    Some(Commands::Payload {
      workflow_file,
      mode,
    }) => {
      let model = load_model(&workflow_file, &settings)?;
      let payload = gui_payload(&model, mode.into());
      println!("{}", serde_json::to_string_pretty(&payload)?);
    }
    Some(Commands::Validate { workflow_file }) => {
      let model = load_model(&workflow_file, &settings)?;
      let issues = validate(&model, &settings.operations, &settings.permissions);
      if !issues.is_empty() {
        for issue in &issues {
          eprintln!("{issue}");
        }
        bail!("{} problem(s) found in {}", issues.len(), workflow_file.display());
      }
      eprintln!("{} is valid", workflow_file.display());
    }
    Some(Commands::Text { workflow_file }) => {
      let model = load_model(&workflow_file, &settings)?;
      print!("{}", render_options(&model));
    }
    Some(Commands::Preview {
      workflow_file,
      text,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(preview(&workflow_file, text, &settings))?;
    }
    Some(Commands::Save {
      workflow_file,
      text,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(save_file(&workflow_file, text, &settings))?;
      eprintln!("Saved {}", workflow_file.display());
    }
    Some(Commands::Command { command, yes }) => {
      let command = TerminalCommand::from(command);
      if command.always_confirms() && !yes {
        bail!("'{command}' replaces the stored workflow; pass --yes to confirm");
      }
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(send_command(command, &settings))?;
      eprintln!("Sent {command}");
    }
    None => {
      println!("ticketflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().compact().with_writer(std::io::stderr))
    .init();
}

fn load_settings(path: Option<&Path>) -> Result<EditorSettings> {
  let path = match path {
    Some(path) => path.to_path_buf(),
    None => {
      let Some(home) = dirs::home_dir() else {
        return Ok(EditorSettings::default());
      };
      let path = home.join(".ticketflow").join("settings.json");
      if !path.exists() {
        return Ok(EditorSettings::default());
      }
      path
    }
  };
  EditorSettings::load(&path)
    .with_context(|| format!("failed to load settings: {}", path.display()))
}

fn read_workflow(path: &Path) -> Result<String> {
  std::fs::read_to_string(path)
    .with_context(|| format!("failed to read workflow file: {}", path.display()))
}

fn load_model(path: &Path, settings: &EditorSettings) -> Result<WorkflowModel> {
  let text = read_workflow(path)?;
  parse_options(&text, settings.max_statuses)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))
}

fn text_session(text: String, settings: &EditorSettings) -> TextSession {
  let idle = settings.auto_update_interval().unwrap_or_default();
  TextSession::new(text, idle, Instant::now())
}

fn report(outcome: PreviewOutcome) -> Result<()> {
  match outcome {
    PreviewOutcome::Rendered { image_url } => {
      println!("{image_url}");
      Ok(())
    }
    PreviewOutcome::Rejected { errors } => {
      for error in &errors {
        eprintln!("{error}");
      }
      bail!("the backend rejected the workflow");
    }
    PreviewOutcome::Failed { message } => bail!("preview failed: {message}"),
    PreviewOutcome::Stale { .. } => bail!("preview response arrived out of order"),
  }
}

async fn preview(path: &Path, text: bool, settings: &EditorSettings) -> Result<()> {
  let backend = HttpBackend::from_settings(settings)?;
  if text {
    let mut session = text_session(read_workflow(path)?, settings);
    let ticket = session.force_preview(Instant::now())?;
    report(refresh_preview(&backend, &mut session, ticket).await)
  } else {
    let mut engine = SyncEngine::load(load_model(path, settings)?)?;
    let ticket = engine.force_preview()?;
    report(refresh_preview(&backend, &mut engine, ticket).await)
  }
}

async fn save_file(path: &Path, text: bool, settings: &EditorSettings) -> Result<()> {
  let backend = HttpBackend::from_settings(settings)?;
  if text {
    let mut session = text_session(read_workflow(path)?, settings);
    save(&backend, &mut session).await?;
  } else {
    let mut engine = SyncEngine::load(load_model(path, settings)?)?;
    save(&backend, &mut engine).await?;
  }
  Ok(())
}

async fn send_command(command: TerminalCommand, settings: &EditorSettings) -> Result<()> {
  let backend = HttpBackend::from_settings(settings)?;
  // A fresh session is never dirty, so the confirmation gate is already settled.
  match settings.default_editor {
    EditorMode::Gui => {
      let mut engine = SyncEngine::load(WorkflowModel::default())?;
      terminal(&backend, &mut engine, command, true).await?;
    }
    EditorMode::Text => {
      let mut session = text_session(String::new(), settings);
      terminal(&backend, &mut session, command, true).await?;
    }
  }
  Ok(())
}
