//! `modforge clear-cache` command implementation.

use modforge_core::error::ForgeResult;
use modforge_registry::ForgeBackend;

use super::{parse_module, CommandContext};

/// Execute the `modforge clear-cache` command
pub async fn execute(module: Option<&str>, ctx: &CommandContext) -> ForgeResult<()> {
    let identity = module.map(parse_module).transpose()?;
    ctx.forge.clear_cache(identity.as_ref()).await?;

    match identity {
        Some(identity) => ctx.output.success(&format!("Cleared cached data for {}", identity)),
        None => ctx.output.success("Cleared every cache"),
    }
    Ok(())
}
