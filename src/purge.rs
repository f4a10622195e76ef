//! Cleanup of synthetic users.
//!
//! Every username a run derives is deleted through
//! [`Platform::delete_identity`], which removes the identity together with
//! everything in its tenant namespace. Users are deleted one after another;
//! a failed deletion is logged and counted, and purging continues.

use crate::core::LoadgenError;
use crate::platform::Platform;
use tracing::{debug, error, info};

/// Delete each of `usernames`.
///
/// Returns the number of deleted users.
///
/// # Errors
///
/// Returns [`LoadgenError::PurgeFailed`] with the number of failed
/// deletions if any deletion failed.
pub async fn purge_users<P: Platform>(
    platform: &P,
    usernames: &[String],
) -> Result<usize, LoadgenError> {
    let mut errors = 0;
    for username in usernames {
        match platform.delete_identity(username).await {
            Ok(()) => debug!("Finished purging user {username}"),
            Err(e) => {
                error!("Error when deleting user signup {username}: {e}");
                errors += 1;
            }
        }
    }

    if errors > 0 {
        return Err(LoadgenError::PurgeFailed { errors });
    }
    info!("No errors when purging resources");
    Ok(usernames.len())
}
