//! config command - Get, set, or list configuration values

use std::io::{self, Write};

use crate::cli::Context;
use crate::config::schema::{KEYS, SECRET_KEYS};
use crate::ui::output;
use anyhow::{bail, Context as _, Result};
use console::style;

/// Mask a secret for display, keeping the last four characters of long values.
pub(crate) fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "********".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("********{}", tail)
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    // Known but unset keys print nothing.
    if let Some(value) = ctx.config.file.get(key)? {
        output::result(value);
    }
    Ok(())
}

/// Set a configuration value, prompting for it when omitted.
pub fn set(ctx: &Context, key: &str, value: Option<String>) -> Result<()> {
    if !KEYS.contains(&key) {
        bail!("Unknown configuration key: {}", key);
    }
    let value = match value {
        Some(v) => v,
        None => prompt(ctx, key)?,
    };

    let mut config = ctx.config.clone();
    config.file.set(key, &value)?;
    let path = config.save().context("Failed to write config")?;

    let shown = if SECRET_KEYS.contains(&key) {
        mask(&value)
    } else {
        value
    };
    output::success(
        format!("Set {} = {} in {}", key, shown, path.display()),
        ctx.verbosity(),
    );
    Ok(())
}

fn prompt(ctx: &Context, key: &str) -> Result<String> {
    if ctx.quiet {
        bail!("Value required for {}. Pass it as an argument.", key);
    }
    print!("{}: ", key);
    io::stdout().flush()?;
    let value = rpassword::read_password().context("Failed to read value")?;
    if value.is_empty() {
        bail!("Value cannot be empty.");
    }
    Ok(value)
}

/// List all configuration values, secrets masked.
pub fn list(ctx: &Context) -> Result<()> {
    let source = match ctx.config.loaded_from() {
        Some(p) => p.display().to_string(),
        None => "defaults (no config file)".to_string(),
    };
    output::info(format!("# {}", source), ctx.verbosity());

    for key in KEYS {
        let line = match ctx.config.file.get(key)? {
            Some(v) if SECRET_KEYS.contains(key) => format!("{} = {}", key, mask(&v)),
            Some(v) => format!("{} = {}", key, v),
            None => format!("{} = {}", key, style("(unset)").dim()),
        };
        output::result(line);
    }
    Ok(())
}

/// Print the config file path reads and writes use.
pub fn path(ctx: &Context) -> Result<()> {
    let path = ctx.config.path()?;
    output::result(path.display());
    Ok(())
}
