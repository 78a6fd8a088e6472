//! CLI configuration

use crate::commands::Cli;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet - failures only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - per-attempt diagnostics
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Level from the `-q` and `-v` flags
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Configuration from parsed global flags
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbosity: Verbosity::from_flags(cli.quiet, cli.verbose),
            color: cli.color.into(),
        }
    }

    /// Whether styled output is enabled
    #[must_use]
    pub fn use_color(&self) -> bool {
        self.color.should_color()
    }
}
