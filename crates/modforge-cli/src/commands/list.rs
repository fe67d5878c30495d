//! `modforge list` command implementation.
//!
//! One `author/name version` line per release, in backend order. Backends
//! that cannot enumerate their modules contribute nothing.

use modforge_core::error::ForgeResult;
use modforge_registry::ForgeBackend;

use super::CommandContext;

/// Execute the `modforge list` command
pub async fn execute(ctx: &CommandContext) -> ForgeResult<()> {
    let releases = ctx.forge.get_all_metadata().await?;
    if releases.is_empty() {
        ctx.output.warn("No backend listed any release");
        return Ok(());
    }

    for release in &releases {
        ctx.output.print(&format!("{} {}", release.identity, release.version));
    }
    Ok(())
}
