//! CLI command handlers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use mysql_tools_foundation::{Foundation, FoundationConfig, ServiceControlClient};
use mysql_tools_multisite::{Target, TargetStore, TracingLogger, Workflow};
use tracing::info;

use crate::cli::{Commands, ReplicationArgs};

/// Execute a CLI command.
///
/// # Errors
///
/// Returns the first error of the command, with context naming what failed.
pub async fn execute_command(command: Commands) -> Result<()> {
    let store = TargetStore::default_location(std::env::var_os("CF_PLUGIN_HOME").map(PathBuf::from))
        .context("Failed to locate the saved target directory")?;

    match command {
        Commands::SetupReplication { instances } => cmd_setup_replication(&store, &instances).await,
        Commands::Switchover { instances, force } => {
            let stdin = io::stdin();
            cmd_switchover(&store, &instances, force, &mut stdin.lock(), &mut io::stdout()).await
        }
        Commands::SaveTarget { name, cf_config } => cmd_save_target(&store, &name, cf_config),
        Commands::ListTargets => cmd_list_targets(&store),
        Commands::RemoveTarget { name } => cmd_remove_target(&store, &name),
        Commands::RunTask {
            target,
            app,
            command,
        } => cmd_run_task(&store, &target, &app, &command).await,
    }
}

async fn cmd_setup_replication(store: &TargetStore, instances: &ReplicationArgs) -> Result<()> {
    let workflow = build_workflow(store, instances)?;
    workflow
        .setup_replication(&instances.primary_instance, &instances.secondary_instance)
        .await
        .context("Replication setup failed")
}

async fn cmd_switchover(
    store: &TargetStore,
    instances: &ReplicationArgs,
    force: bool,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    if !force {
        let prompt = format!(
            "When successful, {} will become secondary and {} will become primary. Do you want to continue? [yN]",
            instances.primary_instance, instances.secondary_instance
        );
        if !confirm(input, output, &prompt)? {
            writeln!(output, "Operation cancelled")?;
            return Ok(());
        }
    }

    let workflow = build_workflow(store, instances)?;
    workflow
        .switchover_replication(&instances.primary_instance, &instances.secondary_instance)
        .await
        .context("Switchover failed")
}

fn cmd_save_target(store: &TargetStore, name: &str, cf_config: Option<PathBuf>) -> Result<()> {
    let source = match cf_config {
        Some(path) => path,
        None => active_cf_config()?,
    };
    let target = store
        .save_target(&source, name)
        .with_context(|| format!("Failed to save target '{name}' from {}", source.display()))?;

    println!(
        "Saved target '{}': {} (org {}, space {})",
        target.name, target.api, target.organization, target.space
    );
    Ok(())
}

fn cmd_list_targets(store: &TargetStore) -> Result<()> {
    let targets = store.list_targets().context("Failed to list saved targets")?;
    if targets.is_empty() {
        println!("No saved targets in {}", store.dir().display());
        return Ok(());
    }
    print!("{}", render_targets(&targets));
    Ok(())
}

fn cmd_remove_target(store: &TargetStore, name: &str) -> Result<()> {
    store
        .remove_target(name)
        .with_context(|| format!("Failed to remove target '{name}'"))?;
    println!("Removed target '{name}'");
    Ok(())
}

async fn cmd_run_task(store: &TargetStore, target: &str, app: &str, command: &str) -> Result<()> {
    let foundation = foundation(store, target, &load_config()?)?;
    let task = foundation
        .task_client()
        .run_task(app, command)
        .await
        .with_context(|| format!("Task on app '{app}' failed"))?;

    info!(task = %task.guid, state = %task.state, "Task finished");
    println!("Task {} completed with status {}", task.guid, task.state);
    Ok(())
}

fn load_config() -> Result<FoundationConfig> {
    FoundationConfig::from_env().context("Invalid configuration in environment")
}

fn build_workflow(store: &TargetStore, instances: &ReplicationArgs) -> Result<Workflow> {
    let config = load_config()?;
    let primary_site: Arc<dyn ServiceControlClient> =
        Arc::new(foundation(store, &instances.primary_target, &config)?);
    let secondary_site: Arc<dyn ServiceControlClient> =
        Arc::new(foundation(store, &instances.secondary_target, &config)?);
    Ok(Workflow::new(primary_site, secondary_site, Arc::new(TracingLogger)))
}

fn foundation(store: &TargetStore, target: &str, config: &FoundationConfig) -> Result<Foundation> {
    let home = store.target_home(target)?;
    if !home.join(".cf").join("config.json").is_file() {
        bail!("Target '{target}' is not saved. Log in with cf and run 'mysql-tools save-target --name {target}' first");
    }
    Ok(Foundation::new(target, home, config))
}

/// The cf configuration currently in use: `$CF_HOME/.cf/config.json`, or
/// the one under the home directory.
fn active_cf_config() -> Result<PathBuf> {
    let cf_home = match std::env::var_os("CF_HOME") {
        Some(home) => PathBuf::from(home),
        None => directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .context("Could not determine the home directory")?,
    };
    Ok(cf_home.join(".cf").join("config.json"))
}

/// Ask a yes/no question. Only `y` or `yes` count as consent.
fn confirm(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> io::Result<bool> {
    write!(output, "{prompt} ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn render_targets(targets: &[Target]) -> String {
    let header = ["NAME", "API", "ORGANIZATION", "SPACE"];
    let rows: Vec<[&str; 4]> = targets
        .iter()
        .map(|t| [t.name.as_str(), t.api.as_str(), t.organization.as_str(), t.space.as_str()])
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    std::iter::once(header)
        .chain(rows)
        .map(|row| {
            let line = row
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ");
            format!("{}\n", line.trim_end())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Cursor;

    use super::*;

    fn instances() -> ReplicationArgs {
        ReplicationArgs {
            primary_target: "site-a".to_string(),
            primary_instance: "db0".to_string(),
            secondary_target: "site-b".to_string(),
            secondary_instance: "db1".to_string(),
        }
    }

    #[test]
    fn test_confirm_accepts_only_yes() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("\n", false), ("", false)] {
            let mut output = Vec::new();
            let confirmed = confirm(&mut Cursor::new(answer), &mut output, "Continue? [yN]").unwrap();
            assert_eq!(confirmed, expected, "answer {answer:?}");
            assert_eq!(String::from_utf8(output).unwrap(), "Continue? [yN] ");
        }
    }

    #[tokio::test]
    async fn test_declined_switchover_is_cancelled_without_contacting_foundations() {
        let store = TargetStore::new("/nonexistent/store");
        let mut output = Vec::new();

        cmd_switchover(&store, &instances(), false, &mut Cursor::new("n\n"), &mut output)
            .await
            .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with(
            "When successful, db0 will become secondary and db1 will become primary. Do you want to continue? [yN]"
        ));
        assert!(output.ends_with("Operation cancelled\n"));
    }

    #[tokio::test]
    async fn test_unsaved_target_is_reported() {
        let store = TargetStore::new("/nonexistent/store");
        let mut output = Vec::new();

        let err = cmd_switchover(&store, &instances(), true, &mut Cursor::new(""), &mut output)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Target 'site-a' is not saved"));
        assert!(output.is_empty());
    }

    #[test]
    fn test_render_targets_aligns_columns() {
        let targets = vec![
            Target {
                name: "east".to_string(),
                api: "https://api.east.example.com".to_string(),
                organization: "system".to_string(),
                space: "mysql".to_string(),
            },
            Target {
                name: "west-2".to_string(),
                api: "https://api.west.example.com".to_string(),
                organization: "data".to_string(),
                space: "db".to_string(),
            },
        ];

        assert_eq!(
            render_targets(&targets),
            "NAME    API                           ORGANIZATION  SPACE\n\
             east    https://api.east.example.com  system        mysql\n\
             west-2  https://api.west.example.com  data          db\n"
        );
    }
}
