//! ping command - Liveness check

use crate::ui::output;
use anyhow::Result;

/// Print `pang`.
pub fn ping() -> Result<()> {
    output::result("pang");
    Ok(())
}
