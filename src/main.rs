//! Cuttle Service SDK command-line client
//!
//! Runs the SDK's calls against a live registry from the shell.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::error;

use cuttle_sdk::{
    SdkClient,
    cli::{Cli, Command, DatastoreCommand, DictCommand, EventArg},
    config::Config,
    services::{Datastore, Notification, NotificationEvent},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let client = match SdkClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build SDK client");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Instances { service } => client
            .instances(&service)
            .await
            .and_then(|i| print_json(&i)),
        Command::Datastores(cmd) => run_datastore_command(&client, cmd).await,
        Command::Dict(cmd) => run_dict_command(&client, cmd).await,
        Command::Notify { payload, event } => run_notify_command(&client, payload, event).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run datastore commands
async fn run_datastore_command(
    client: &SdkClient,
    cmd: DatastoreCommand,
) -> cuttle_sdk::Result<()> {
    match cmd {
        DatastoreCommand::List => print_json(&client.list_datastores().await?),
        DatastoreCommand::Get { id } => match client.get_datastore(id).await? {
            Some(datastore) => print_json(&datastore),
            None => {
                println!("Datastore {id} not found");
                Ok(())
            }
        },
        DatastoreCommand::Create { record } => {
            let datastore: Datastore = serde_json::from_str(&record)?;
            print_json(&client.create_datastore(&datastore).await?)
        }
    }
}

/// Run dictionary commands
async fn run_dict_command(client: &SdkClient, cmd: DictCommand) -> cuttle_sdk::Result<()> {
    let report = match cmd {
        DictCommand::Remove => client.remove_dict().await?,
        DictCommand::Update => client.update_dict().await?,
    };

    for (instance, envelope) in &report.delivered {
        println!("✅ {instance}: {}", envelope.message);
    }
    for failure in &report.failures {
        println!("❌ {} ({}): {}", failure.instance, failure.stage, failure.error);
    }
    Ok(())
}

/// Send a notification; without an event it goes out as info
async fn run_notify_command(
    client: &SdkClient,
    payload: String,
    event: Option<EventArg>,
) -> cuttle_sdk::Result<()> {
    // Plain strings are sent as JSON strings
    let payload = serde_json::from_str(&payload).unwrap_or(serde_json::Value::String(payload));

    match event {
        Some(event) => {
            client
                .send_notification(&Notification::new(event.into(), payload))
                .await?;
        }
        None => {
            client
                .send_info_notification(Notification::new(NotificationEvent::Info, payload))
                .await?;
        }
    }

    println!("Notification sent");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> cuttle_sdk::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
