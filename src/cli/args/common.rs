//! Common CLI types shared across commands

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - indented JSON for reading
    Pretty,
    /// Table format - one row per record
    #[default]
    Table,
    /// JSON format - structured for scripts
    Json,
}
