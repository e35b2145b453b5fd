use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gallery::config::AppConfig;
use gallery::error::PipelineError;
use gallery::state::AppState;
use serde::Serialize;
use serde_json::Value;
use tracing::Level;

/// Manage the image gallery: workspaces, uploads and renames.
#[derive(Parser, Debug)]
#[command(name = "pictura", author, version, about)]
struct Cli {
    /// Config file path without extension.
    #[arg(long, env = "PICTURA_CONFIG", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage workspaces.
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
    /// Manage images.
    #[command(subcommand)]
    Image(ImageCommand),
}

#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
    /// List all workspaces, current first.
    List,
    /// Show the current workspace.
    Current,
    /// Create a workspace.
    Create { name: String },
    /// Make a workspace current.
    Use { name: String },
    /// Delete a workspace with all of its images.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum ImageCommand {
    /// Upload a local file.
    Upload {
        file: PathBuf,
        /// Stored name. Defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        /// Target workspace. Defaults to the current one.
        #[arg(long, short)]
        workspace: Option<String>,
    },
    /// List images of a workspace, newest first.
    List {
        #[arg(long, short)]
        workspace: Option<String>,
    },
    /// Show one image with its prompt and history.
    Show { id: i64 },
    /// Delete an image by object path.
    Delete { path: String },
    /// Rename an image within its workspace.
    Rename {
        path: String,
        new_name: String,
        #[arg(long, short)]
        workspace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let state = AppState::connect(&config).await?;

    match run(&state, cli.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&e.body())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(state: &AppState, command: Command) -> Result<Value, PipelineError> {
    match command {
        Command::Workspace(cmd) => run_workspace(state, cmd).await,
        Command::Image(cmd) => run_image(state, cmd).await,
    }
}

async fn run_workspace(state: &AppState, command: WorkspaceCommand) -> Result<Value, PipelineError> {
    let service = &state.workspaces;
    match command {
        WorkspaceCommand::List => to_json(service.list().await?),
        WorkspaceCommand::Current => to_json(service.current().await?),
        WorkspaceCommand::Create { name } => to_json(service.create(&name).await?),
        WorkspaceCommand::Use { name } => to_json(service.set_current(&name).await?),
        WorkspaceCommand::Delete { name } => {
            service.delete(&name).await?;
            Ok(serde_json::json!({ "deleted": name }))
        }
    }
}

async fn run_image(state: &AppState, command: ImageCommand) -> Result<Value, PipelineError> {
    let pipeline = &state.pipeline;
    match command {
        ImageCommand::Upload {
            file,
            name,
            workspace,
        } => {
            let workspace = workspace_or_current(state, workspace).await?;
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            let data = tokio::fs::read(&file).await.map_err(|e| {
                PipelineError::Validation(format!("cannot read {}: {e}", file.display()))
            })?;
            to_json(pipeline.upload(&workspace, &name, &data).await?)
        }
        ImageCommand::List { workspace } => {
            let workspace = workspace_or_current(state, workspace).await?;
            to_json(pipeline.list(&workspace).await?)
        }
        ImageCommand::Show { id } => to_json(pipeline.image_detail(id).await?),
        ImageCommand::Delete { path } => {
            pipeline.delete(&path).await?;
            Ok(serde_json::json!({ "deleted": path }))
        }
        ImageCommand::Rename {
            path,
            new_name,
            workspace,
        } => {
            let workspace = workspace_or_current(state, workspace).await?;
            to_json(pipeline.rename(&path, &new_name, &workspace).await?)
        }
    }
}

/// The named workspace, or the current one when none is given.
async fn workspace_or_current(
    state: &AppState,
    workspace: Option<String>,
) -> Result<String, PipelineError> {
    if let Some(name) = workspace {
        return Ok(name);
    }
    state
        .workspaces
        .current()
        .await?
        .workspace
        .map(|ws| ws.name)
        .ok_or_else(|| {
            PipelineError::Validation("no workspace given and no workspace is current".into())
        })
}

fn to_json<T: Serialize>(value: T) -> Result<Value, PipelineError> {
    serde_json::to_value(value)
        .map_err(|e| PipelineError::StoreRead(format!("serialize response: {e}")))
}
