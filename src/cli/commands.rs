//! Command dispatch over the application state

use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;
use colored::{ColoredString, Colorize};
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, AppState};
use crate::cli::args::{Cli, Commands, ConfigCommands, ItemOp, ListArg, ModeArg, StatusArg};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{ChildrenType, FieldUpdate, ListField, Node, Status};
use crate::infrastructure::JsonStorage;

pub fn execute_command(cli: &Cli, settings: &Settings) -> CliResult<()> {
    let data_file = cli
        .data_file
        .clone()
        .unwrap_or_else(|| settings.data_file.clone());

    match &cli.command {
        Some(Commands::Tree) => _tree(data_file, settings),
        Some(Commands::Add { name }) => _add(data_file, settings, name),
        Some(Commands::Child { parent_id, mode }) => _child(data_file, settings, parent_id, *mode),
        Some(Commands::Show { id }) => _show(data_file, settings, id),
        Some(Commands::Set {
            id,
            name,
            description,
            status,
            condition,
            progress,
            content,
        }) => _set(
            data_file,
            settings,
            id,
            name.clone(),
            description.clone(),
            *status,
            condition.clone(),
            progress.clone(),
            content.clone(),
        ),
        Some(Commands::Item { id, field, op }) => _item(data_file, settings, id, *field, op),
        Some(Commands::Config { command }) => _config(settings, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "goaltree", &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

fn open_state(data_file: PathBuf, settings: &Settings) -> CliResult<AppState> {
    let storage = JsonStorage::new(data_file, settings.debounce_ms);
    Ok(AppState::new(storage).map_err(ApplicationError::from)?)
}

fn flush(state: &AppState) -> CliResult<()> {
    Ok(state.flush().map_err(ApplicationError::from)?)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn status_label(status: Status) -> ColoredString {
    match status {
        Status::InProgress => status.as_str().cyan(),
        Status::Completed => status.as_str().green(),
        Status::OnHold => status.as_str().yellow(),
        Status::Cancelled => status.as_str().dimmed(),
        Status::Failed => status.as_str().red(),
    }
}

fn mode_tag(children_type: ChildrenType) -> &'static str {
    match children_type {
        ChildrenType::Leaf => "",
        ChildrenType::Rrtd => " [RRTD]",
        ChildrenType::Dapp => " [DAPP]",
    }
}

fn render_node(node: &Node) -> Tree<String> {
    let label = format!(
        "{}{} {} {}",
        node.name().bold(),
        mode_tag(node.children_type()).magenta(),
        status_label(node.status()),
        short_id(node.id()).dimmed()
    );
    let mut tree = Tree::new(label);
    for child in node.children() {
        tree.push(render_node(child));
    }
    tree
}

#[instrument(skip(settings))]
fn _tree(data_file: PathBuf, settings: &Settings) -> CliResult<()> {
    let state = open_state(data_file, settings)?;
    if state.data().roots.is_empty() {
        println!("no goals yet; try: goaltree add \"My first goal\"");
        return Ok(());
    }
    for root in &state.data().roots {
        println!("{}", render_node(root));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _add(data_file: PathBuf, settings: &Settings, name: &str) -> CliResult<()> {
    let mut state = open_state(data_file, settings)?;
    let node = state.add_root_node(name);
    flush(&state)?;
    output::success(&format!("added goal '{}' ({})", node.name(), node.id()));
    Ok(())
}

#[instrument(skip(settings))]
fn _child(data_file: PathBuf, settings: &Settings, parent_id: &str, mode: ModeArg) -> CliResult<()> {
    let mut state = open_state(data_file, settings)?;
    match state.add_child_to_node(parent_id, mode.into()) {
        Some(child) => {
            flush(&state)?;
            output::success(&format!("added '{}' ({})", child.name(), child.id()));
        }
        None => output::warning(&format!("no node with id {}", parent_id)),
    }
    Ok(())
}

#[instrument(skip(settings))]
fn _show(data_file: PathBuf, settings: &Settings, id: &str) -> CliResult<()> {
    let state = open_state(data_file, settings)?;
    let Some(node) = state.find_node_by_id(id) else {
        output::warning(&format!("no node with id {}", id));
        return Ok(());
    };

    output::header(node.name());
    output::action("id", &node.id());
    output::action("status", &status_label(node.status()));
    output::action(
        "children",
        &format!(
            "{}{}",
            node.children().len(),
            mode_tag(node.children_type())
        ),
    );
    output::action("created", &node.created_at().to_rfc3339());
    output::action("updated", &node.updated_at().to_rfc3339());

    let texts = [
        ("description", node.description()),
        ("condition", node.completion_condition()),
        ("progress", node.progress_board()),
        ("content", node.content_board()),
    ];
    for (label, text) in texts {
        if !text.is_empty() {
            output::action(label, &text);
        }
    }

    if let Some(strategy) = node.as_strategy() {
        for field in [ListField::Atp, ListField::Signposts, ListField::Triggers] {
            let entries = strategy.list(field);
            if entries.is_empty() {
                continue;
            }
            output::header(field.as_str());
            for (index, entry) in entries.iter().enumerate() {
                println!("  [{}] {}", index, entry);
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip(settings))]
fn _set(
    data_file: PathBuf,
    settings: &Settings,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    status: Option<StatusArg>,
    condition: Option<String>,
    progress: Option<String>,
    content: Option<String>,
) -> CliResult<()> {
    // (update, refresh_tree): the name shows in the tree view, so it
    // triggers the structural notification class
    let mut updates: Vec<(FieldUpdate, bool)> = Vec::new();
    if let Some(v) = name {
        updates.push((FieldUpdate::Name(v), true));
    }
    if let Some(v) = description {
        updates.push((FieldUpdate::Description(v), false));
    }
    if let Some(v) = status {
        updates.push((FieldUpdate::Status(v.into()), false));
    }
    if let Some(v) = condition {
        updates.push((FieldUpdate::CompletionCondition(v), false));
    }
    if let Some(v) = progress {
        updates.push((FieldUpdate::ProgressBoard(v), false));
    }
    if let Some(v) = content {
        updates.push((FieldUpdate::ContentBoard(v), false));
    }
    if updates.is_empty() {
        return Err(CliError::Usage(
            "nothing to update: pass at least one field option".to_string(),
        ));
    }

    let mut state = open_state(data_file, settings)?;
    if state.find_node_by_id(id).is_none() {
        output::warning(&format!("no node with id {}", id));
        return Ok(());
    }
    let count = updates.len();
    for (update, refresh_tree) in updates {
        state.update_node_field(id, update, refresh_tree);
    }
    flush(&state)?;
    output::success(&format!("updated {} field(s)", count));
    Ok(())
}

#[instrument(skip(settings))]
fn _item(
    data_file: PathBuf,
    settings: &Settings,
    id: &str,
    field: ListArg,
    op: &ItemOp,
) -> CliResult<()> {
    let mut state = open_state(data_file, settings)?;
    let field: ListField = field.into();

    let changed = match op {
        ItemOp::Add { value } => state.push_list_item(id, field, value.clone()),
        ItemOp::Set { index, value } => state.set_list_item(id, field, *index, value.clone()),
        ItemOp::Rm { index } => state.remove_list_item(id, field, *index),
    };

    if changed {
        flush(&state)?;
        output::success(&format!("updated {}", field.as_str()));
    } else {
        debug!("list operation was a no-op");
        output::warning(&format!(
            "no change to {}: missing node, not a strategy node, index out of range, \
             or minimum length reached",
            field.as_str()
        ));
    }
    Ok(())
}

fn _config(settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => println!("{}", path.display()),
                None => output::warning("no config directory available on this platform"),
            }
            Ok(())
        }
    }
}
