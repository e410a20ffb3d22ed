//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::domain::{ChildMode, ListField, Status};

/// Hierarchical goal tracker: decompose goals into subgoals or strategies
#[derive(Parser, Debug)]
#[command(name = "goaltree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Raise log verbosity (-d, -dd, -ddd)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Goal document path (default: platform data dir)
    #[arg(short = 'f', long, global = true)]
    pub data_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the goal forest
    Tree,

    /// Add a root goal
    Add {
        /// Goal name
        #[arg(default_value = "New Goal")]
        name: String,
    },

    /// Add a child under a node (first child locks the decomposition mode)
    Child {
        /// Parent node id
        parent_id: String,
        /// Decomposition mode; advisory once the parent's mode is locked
        #[arg(short, long, value_enum)]
        mode: ModeArg,
    },

    /// Show one node in detail
    Show {
        /// Node id
        id: String,
    },

    /// Update fields of a node
    Set {
        /// Node id
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// New completion condition
        #[arg(long)]
        condition: Option<String>,
        /// New progress board text
        #[arg(long)]
        progress: Option<String>,
        /// New content board text
        #[arg(long)]
        content: Option<String>,
    },

    /// Edit the list fields of a strategy node
    Item {
        /// Node id
        id: String,
        /// Which list to edit
        #[arg(value_enum)]
        field: ListArg,
        #[command(subcommand)]
        op: ItemOp,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// List-item operations
#[derive(Subcommand, Debug)]
pub enum ItemOp {
    /// Append an entry
    Add { value: String },
    /// Replace the entry at INDEX
    Set { index: usize, value: String },
    /// Remove the entry at INDEX (atp always keeps one entry)
    Rm { index: usize },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings as TOML
    Show,
    /// Print the global config file path
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    /// Plain subgoal children
    Subgoals,
    /// Strategy children with ATP/signposts/triggers
    Strategies,
}

impl From<ModeArg> for ChildMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Subgoals => ChildMode::Subgoals,
            ModeArg::Strategies => ChildMode::Strategies,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StatusArg {
    InProgress,
    Completed,
    OnHold,
    Cancelled,
    Failed,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::InProgress => Status::InProgress,
            StatusArg::Completed => Status::Completed,
            StatusArg::OnHold => Status::OnHold,
            StatusArg::Cancelled => Status::Cancelled,
            StatusArg::Failed => Status::Failed,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ListArg {
    Atp,
    Signposts,
    Triggers,
}

impl From<ListArg> for ListField {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Atp => ListField::Atp,
            ListArg::Signposts => ListField::Signposts,
            ListArg::Triggers => ListField::Triggers,
        }
    }
}
