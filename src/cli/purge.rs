//! The `purge` command.

use super::load_scenario;
use crate::config::RunConfig;
use crate::constants::DEFAULT_USERNAME_PREFIX;
use crate::naming::all_usernames;
use crate::platform::{Retrying, SimulatedPlatform};
use crate::purge::purge_users;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Delete the synthetic users of a run with the given shape.
#[derive(Args, Debug)]
pub struct PurgeCommand {
    /// Prefix of the synthetic usernames.
    #[arg(long = "username", default_value = DEFAULT_USERNAME_PREFIX)]
    username_prefix: String,

    /// Users per worker of the run being purged.
    #[arg(short = 'u', long = "users", default_value_t = 5)]
    users_per_thread: usize,

    /// Workers of the run being purged.
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Scenario file describing the simulated platform.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Additional attempts for each failed delete call.
    #[arg(long, default_value_t = 0)]
    retries: usize,
}

impl PurgeCommand {
    /// Delete every derived username.
    ///
    /// # Errors
    ///
    /// Fails on an invalid prefix, an unreadable scenario, or if any deletion
    /// failed.
    pub async fn execute(self) -> Result<()> {
        RunConfig::new(self.threads, self.users_per_thread, 1)
            .with_username_prefix(&self.username_prefix)
            .validate()?;

        let scenario = load_scenario(self.scenario.as_deref()).await?;
        let platform = Retrying::new(SimulatedPlatform::new(scenario), self.retries);
        let usernames = all_usernames(&self.username_prefix, self.threads, self.users_per_thread);

        info!("Purging {} users", usernames.len());
        let purged = purge_users(&platform, &usernames).await?;
        println!("Purged {purged} users");
        Ok(())
    }
}
