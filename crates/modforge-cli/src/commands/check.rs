//! `modforge check` command implementation.
//!
//! Loading the context already validated the configuration; this reports
//! what was loaded.

use modforge_core::error::ForgeResult;
use modforge_registry::ForgeBackend;

use super::CommandContext;

/// Execute the `modforge check` command
pub async fn execute(ctx: &CommandContext) -> ForgeResult<()> {
    if let Some(source) = &ctx.source {
        ctx.output.info(&format!("Configuration: {}", source.path()));
    }
    ctx.output.info(&format!(
        "Mirror cache: {} (refresh every {}s)",
        ctx.config.cache.root_or_default()?,
        ctx.config.cache.ttl().as_secs()
    ));
    for (index, backend) in ctx.forge.backends().iter().enumerate() {
        ctx.output.info(&format!("  {}. {}", index + 1, backend.describe()));
    }
    ctx.output.success("Configuration is valid");
    Ok(())
}
