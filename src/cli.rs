//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::services::NotificationEvent;

/// Cuttle Service SDK - call platform services through discovery
#[derive(Parser, Debug)]
#[command(name = "cuttle-sdk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "CUTTLE_SDK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "CUTTLE_SDK_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "CUTTLE_SDK_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List registered instances of a service
    Instances {
        /// Registry name of the service
        #[arg(required = true)]
        service: String,
    },

    /// Datastore commands
    #[command(subcommand)]
    Datastores(DatastoreCommand),

    /// Dictionary cache commands
    #[command(subcommand)]
    Dict(DictCommand),

    /// Send a notification (info unless --event is given)
    Notify {
        /// Notification payload (JSON, or a plain string)
        #[arg(required = true)]
        payload: String,

        /// Notification event
        #[arg(long, value_enum)]
        event: Option<EventArg>,
    },
}

/// Notification event accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventArg {
    /// Informational
    Info,
    /// Needs attention
    Warning,
    /// Failure
    Error,
}

impl From<EventArg> for NotificationEvent {
    fn from(event: EventArg) -> Self {
        match event {
            EventArg::Info => Self::Info,
            EventArg::Warning => Self::Warning,
            EventArg::Error => Self::Error,
        }
    }
}

/// Datastore subcommands
#[derive(Subcommand, Debug)]
pub enum DatastoreCommand {
    /// List datastores
    List,

    /// Show one datastore
    Get {
        /// Datastore id
        #[arg(required = true)]
        id: u64,
    },

    /// Create a datastore from a JSON record
    Create {
        /// Record, e.g. '{"Name":"sales","Datastore":"postgres"}'
        #[arg(required = true)]
        record: String,
    },
}

/// Dictionary subcommands
#[derive(Subcommand, Debug)]
pub enum DictCommand {
    /// Remove the dictionary from every octopus instance
    Remove,
    /// Update the dictionary on every octopus instance
    Update,
}
