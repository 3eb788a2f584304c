use anyhow::{Context, Result};
use qxbuild_core::relpath::relativize;

/// `qxbuild relpath <target> <base>`
pub fn cmd_relpath(target: &str, base: &str, separator: char, base_is_file: Option<bool>) -> Result<()> {
    let relative = relativize(target, base, separator, base_is_file)
        .with_context(|| format!("relpath {} {}", target, base))?;
    println!("{}", relative);
    Ok(())
}
