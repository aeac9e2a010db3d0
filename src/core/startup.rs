use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::models::user::UserAccount;
use crate::stores::user_store::UserStore;
use crate::utils::time::current_timestamp_millis;

/// Load accounts from a JSON array file into the store. Accounts that clash
/// with an existing id, username or email are skipped.
pub fn seed_accounts(store: &dyn UserStore, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read account seed file: {}", path.display()))?;

    let accounts: Vec<UserAccount> = serde_json::from_str(&content)
        .context("Failed to parse account seed file")?;

    let total = accounts.len();
    let mut loaded = 0;

    for mut account in accounts {
        if account.created_at == 0 {
            account.created_at = current_timestamp_millis();
        }

        let user_id = account.id;
        match store.insert(account) {
            Ok(()) => loaded += 1,
            Err(e) => {
                warn!(user_id, error = %e, "Skipping seed account");
            }
        }
    }

    info!(
        path = %path.display(),
        accounts = total,
        loaded,
        "Account seed file applied"
    );

    Ok(loaded)
}
