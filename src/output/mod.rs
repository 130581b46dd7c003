//! Output formatting for CLI results

use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod table;

/// Print an API payload in the requested format
pub fn print_value(data: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", table::format_value(data)),
        _ => print_json(data, format)?,
    }
    Ok(())
}

/// Print JSON: wrapped with metadata for `json`, bare and indented for `pretty`
pub fn print_json<T: Serialize + ?Sized>(data: &T, format: OutputFormat) -> Result<()> {
    let output = match format {
        OutputFormat::Json => json::format_json(data)?,
        _ => serde_json::to_string_pretty(data)?,
    };
    println!("{}", output);
    Ok(())
}
