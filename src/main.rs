//! tenant-loadgen entry point
//!
//! Parses the command line, applies process-level settings, then runs the
//! selected command on a multi-threaded tokio runtime. Errors are shown with
//! context and suggestions and end the process with status 1.

use anyhow::Result;
use clap::Parser;
use tenant_loadgen::cli;
use tenant_loadgen::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Environment changes must happen before the runtime spawns its threads
    cli.build_config().apply_to_env();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    match runtime.block_on(cli.execute()) {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
