//! `modforge releases` command implementation.
//!
//! Prints the releases document of a module together with everything its
//! releases depend on, transitively.

use modforge_core::error::ForgeResult;
use modforge_resolver::ReleaseAggregator;

use super::{parse_module, render_json, CommandContext};

/// Execute the `modforge releases` command
pub async fn execute(module: &str, ctx: &CommandContext) -> ForgeResult<()> {
    let root = parse_module(module)?;
    let document = ReleaseAggregator::new(&ctx.forge).releases_document(&root).await?;
    ctx.output.print(&render_json(&document)?);
    Ok(())
}
