//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// mysql-tools - cross-foundation MySQL replication
#[derive(Parser, Debug)]
#[command(name = "mysql-tools")]
#[command(version)]
#[command(about = "Set up and switch over MySQL replication between two Cloud Foundry foundations")]
#[command(
    long_about = "mysql-tools drives the cf CLI against saved foundation targets to configure leader-follower replication between two MySQL service instances and to swap their roles."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// The two instances a replication command operates on.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReplicationArgs {
    /// Saved target of the foundation hosting the primary instance
    #[arg(short = 'P', long)]
    pub primary_target: String,

    /// Name of the primary service instance
    #[arg(short = 'p', long)]
    pub primary_instance: String,

    /// Saved target of the foundation hosting the secondary instance
    #[arg(short = 'S', long)]
    pub secondary_target: String,

    /// Name of the secondary service instance
    #[arg(short = 's', long)]
    pub secondary_instance: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configure the secondary instance to replicate from the primary
    SetupReplication {
        #[command(flatten)]
        instances: ReplicationArgs,
    },

    /// Make the secondary the new primary and the primary the new secondary
    Switchover {
        #[command(flatten)]
        instances: ReplicationArgs,

        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Save the currently targeted cf configuration under a name
    SaveTarget {
        /// Name to save the target as
        #[arg(short, long)]
        name: String,

        /// cf config.json to copy (defaults to the active one)
        #[arg(long)]
        cf_config: Option<PathBuf>,
    },

    /// List saved targets
    ListTargets,

    /// Delete a saved target
    RemoveTarget {
        /// Name of the target to delete
        #[arg(short, long)]
        name: String,
    },

    /// Run a one-off task on an app and wait for it to finish
    RunTask {
        /// Saved target of the foundation hosting the app
        #[arg(short, long)]
        target: String,

        /// App to run the task on
        #[arg(short, long)]
        app: String,

        /// Command to run
        #[arg(short, long)]
        command: String,
    },
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_switchover_short_flags() {
        let cli = Cli::try_parse_from([
            "mysql-tools",
            "switchover",
            "-P",
            "site-a",
            "-p",
            "db0",
            "-S",
            "site-b",
            "-s",
            "db1",
            "-f",
        ])
        .unwrap();

        let Commands::Switchover { instances, force } = cli.command else {
            panic!("expected switchover");
        };
        assert!(force);
        assert_eq!(
            instances,
            ReplicationArgs {
                primary_target: "site-a".to_string(),
                primary_instance: "db0".to_string(),
                secondary_target: "site-b".to_string(),
                secondary_instance: "db1".to_string(),
            }
        );
    }

    #[test]
    fn test_setup_requires_both_instances() {
        let result = Cli::try_parse_from([
            "mysql-tools",
            "setup-replication",
            "--primary-target",
            "site-a",
            "--primary-instance",
            "db0",
        ]);
        assert!(result.is_err());
    }
}
