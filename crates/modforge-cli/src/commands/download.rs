//! `modforge download` command implementation.

use camino::{Utf8Path, Utf8PathBuf};
use modforge_core::error::{ForgeError, ForgeResult};
use modforge_registry::ForgeBackend;

use super::{parse_module, CommandContext};

/// Execute the `modforge download` command
pub async fn execute(
    module: &str,
    version: &str,
    output_dir: Option<&Utf8Path>,
    ctx: &CommandContext,
) -> ForgeResult<()> {
    let identity = parse_module(module)?;
    let archive = ctx
        .forge
        .get_module(&identity, version)
        .await?
        .ok_or_else(|| ForgeError::not_found(format!("release {} {}", identity, version)))?;

    let dir = output_dir.map(Utf8Path::to_path_buf).unwrap_or_else(|| Utf8PathBuf::from("."));
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ForgeError::io(format!("Failed to create {}", dir), e))?;
    let target = dir.join(&archive.file_name);
    tokio::fs::write(&target, &archive.bytes)
        .await
        .map_err(|e| ForgeError::io(format!("Failed to write {}", target), e))?;

    ctx.output.success(&format!("Wrote {} ({} bytes)", target, archive.len()));
    Ok(())
}
