pub mod chat;
pub mod config;
pub mod draft;
pub mod resource;
pub mod task;
pub mod video;

use serde::Serialize;

use crate::types::Result;

/// Output format shared by listing commands
pub(crate) fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
