//! `modforge metadata` command implementation.

use modforge_core::error::ForgeResult;
use modforge_resolver::module_summary;

use super::{parse_module, render_json, CommandContext};

/// Execute the `modforge metadata` command
pub async fn execute(module: &str, ctx: &CommandContext) -> ForgeResult<()> {
    let identity = parse_module(module)?;
    let summary = module_summary(&ctx.forge, &identity).await?;
    ctx.output.print(&render_json(&summary)?);
    Ok(())
}
