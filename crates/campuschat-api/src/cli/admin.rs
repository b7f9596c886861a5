//! Operator commands: revoke sessions and purge stale challenges.

use anyhow::{Context, Result};
use console::style;

use crate::state::AppState;

/// Revoke every session of the account owning `email`.
///
/// ```bash
/// campuschat revoke-sessions ada@inst.edu
/// ```
pub async fn revoke_sessions(state: &AppState, email: &str) -> Result<()> {
    let email = email.trim().to_lowercase();
    let removed = state
        .sessions
        .revoke_all_sessions(&email)
        .await
        .with_context(|| format!("Failed to revoke sessions for '{email}'"))?;

    println!();
    println!(
        "  {} Revoked {} session(s) for {}",
        style("✓").green().bold(),
        style(removed).bold(),
        style(&email).cyan()
    );
    println!();
    Ok(())
}

/// Delete every expired verification challenge.
pub async fn purge_challenges(state: &AppState) -> Result<()> {
    let purged = state
        .verification
        .purge_expired()
        .await
        .context("Failed to purge expired challenges")?;

    println!();
    if purged == 0 {
        println!("  {} No expired challenges", style("i").blue().bold());
    } else {
        println!(
            "  {} Purged {} expired challenge(s)",
            style("✓").green().bold(),
            style(purged).bold()
        );
    }
    println!();
    Ok(())
}
