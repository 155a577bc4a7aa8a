// SPDX-License-Identifier: Apache-2.0

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{env_bool, ENV_LOG_JSON, ENV_LOG_LEVEL};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LogFlags {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
}

impl LogFlags {
    fn forced_level(self) -> Option<&'static str> {
        if self.trace || self.verbose > 1 {
            Some("trace")
        } else if self.verbose == 1 {
            Some("debug")
        } else if self.quiet {
            Some("error")
        } else {
            None
        }
    }

    /// Flags win over `UX_GATE_LOG_LEVEL`, which wins over `RUST_LOG`.
    fn filter(self) -> EnvFilter {
        if let Some(level) = self.forced_level() {
            return EnvFilter::new(level);
        }
        EnvFilter::try_from_env(ENV_LOG_LEVEL)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Log lines go to stderr so stdout stays machine readable.
pub(crate) fn init_tracing(flags: LogFlags) {
    let filter = flags.filter();
    let installed = if env_bool(ENV_LOG_JSON, false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_force_levels_in_precedence_order() {
        let flags = |quiet, verbose, trace| LogFlags {
            quiet,
            verbose,
            trace,
        };
        assert_eq!(flags(true, 0, true).forced_level(), Some("trace"));
        assert_eq!(flags(true, 1, false).forced_level(), Some("debug"));
        assert_eq!(flags(false, 2, false).forced_level(), Some("trace"));
        assert_eq!(flags(true, 0, false).forced_level(), Some("error"));
        assert_eq!(flags(false, 0, false).forced_level(), None);
    }
}
