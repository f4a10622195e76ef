//! The `run` command.

use super::load_scenario;
use crate::config::RunConfig;
use crate::constants::{
    DEFAULT_COMPONENT_SOURCE, DEFAULT_QUAY_ORGANIZATION, DEFAULT_REPORT_FILE,
    DEFAULT_USERNAME_PREFIX, QUAY_ORGANIZATION_ENV,
};
use crate::metrics::{RunAggregate, RunProgress};
use crate::naming::all_usernames;
use crate::orchestrator::Orchestrator;
use crate::platform::{Retrying, SimulatedPlatform};
use crate::purge::purge_users;
use crate::report::{LoadTestReport, log_summary};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Run a load test and write its report.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Prefix of the synthetic usernames.
    #[arg(long = "username", default_value = DEFAULT_USERNAME_PREFIX)]
    username_prefix: String,

    /// Users provisioned by each worker.
    #[arg(short = 'u', long = "users", default_value_t = 5)]
    users_per_thread: usize,

    /// Cohort size; must divide --users.
    #[arg(short = 'b', long = "batch", default_value_t = 5)]
    batch_size: usize,

    /// Wait for every component's build pipeline to finish.
    #[arg(short = 'w', long = "waitpipelines")]
    wait_pipelines: bool,

    /// Terminate on the first error.
    #[arg(long)]
    fail_fast: bool,

    /// Number of concurrent workers.
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Where to write the JSON report.
    #[arg(long, default_value = DEFAULT_REPORT_FILE)]
    output: PathBuf,

    /// Scenario file describing the simulated platform.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Delete the synthetic users after the report is written.
    #[arg(long)]
    purge: bool,

    /// Git source of every component.
    #[arg(long, default_value = DEFAULT_COMPONENT_SOURCE)]
    component_source: String,

    /// quay.io organization for component images.
    #[arg(long = "quay-org", env = QUAY_ORGANIZATION_ENV, default_value = DEFAULT_QUAY_ORGANIZATION)]
    quay_organization: String,

    /// Additional attempts for each failed create call.
    #[arg(long, default_value_t = 0)]
    retries: usize,
}

impl RunCommand {
    /// Run configuration from the flags and the environment.
    ///
    /// Explicit flags win over environment variables.
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(self.threads, self.users_per_thread, self.batch_size)
            .with_wait_for_builds(self.wait_pipelines)
            .with_username_prefix(&self.username_prefix)
            .with_env_overrides();
        config.fail_fast = self.fail_fast;
        config.component_source = self.component_source.clone();
        config.quay_organization = self.quay_organization.clone();
        config
    }

    /// Execute the load test.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration (before any user is provisioned), an
    /// unreadable scenario, a report write error, or purge errors.
    pub async fn execute(self) -> Result<()> {
        let config = self.run_config();
        let total_users = config.total_users() as u64;
        let scenario = load_scenario(self.scenario.as_deref()).await?;
        let platform = Arc::new(Retrying::new(SimulatedPlatform::new(scenario), self.retries));

        let orchestrator = Orchestrator::new(config, Arc::clone(&platform))?
            .with_progress(RunProgress::with_display(total_users));

        println!("Provisioning {total_users} users...");
        let started = Utc::now();
        let aggregate = orchestrator.run().await?;
        let finished = Utc::now();

        log_summary(&aggregate);
        print_summary(&aggregate);
        LoadTestReport::new(&aggregate, started, finished).write(&self.output).await?;

        if self.purge {
            let usernames =
                all_usernames(&self.username_prefix, self.threads, self.users_per_thread);
            let purged = purge_users(platform.as_ref(), &usernames).await?;
            println!("Purged {purged} users");
        }
        Ok(())
    }
}

fn print_summary(aggregate: &RunAggregate) {
    let builds = aggregate.builds.unwrap_or_default();
    println!("\n{}", "Load Test Completed!".green().bold());
    println!("  Average time to spin up users: {:.2} s", aggregate.identity.average_secs);
    println!("  Average time to create resources: {:.2} s", aggregate.resources.average_secs);
    println!("  Average time to run pipelines: {:.2} s", builds.average_secs);

    let failures = aggregate.total_failures();
    if failures == 0 {
        println!("  {}", "No failures".green());
        return;
    }
    println!("  {}", format!("{failures} failures").red());
    for occurrence in &aggregate.errors {
        println!(
            "    {} x{}: {}",
            format!("Error #{}", occurrence.error_number).yellow(),
            occurrence.count,
            occurrence.latest_message
        );
    }
}
