use std::io::IsTerminal;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr; stdout is kept for progress and `extract` output.
/// `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose, quiet)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "jira2clickup=debug,reqwest=info"
    } else {
        "jira2clickup=info"
    }
}

#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("jira2clickup=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_beats_verbose() {
        assert_eq!(default_filter(true, true), "error");
    }

    #[test]
    fn verbose_enables_debug_for_this_crate() {
        assert!(default_filter(true, false).starts_with("jira2clickup=debug"));
        assert_eq!(default_filter(false, false), "jira2clickup=info");
    }
}
