//! Driver options.
//!
//! Options are read and written by name:
//!
//! | Name | Value |
//! |------|-------|
//! | `optimal-numbers` | Bool: exact numerics as integers when they fit |
//! | `string-numbers` | Bool: exact numerics as text |
//! | `numeric-numbers` | Bool: exact numerics as [`Number`](sybase_types::Number) |
//! | `timezone` | Text: server time zone (`UTC`, `+HH:MM`, `Europe/Prague`, ...) |
//! | `optimized-date-binds` | Bool |

use sybase_types::{NumericMode, ServerZone, Value};

use crate::error::Error;

/// Per-connection driver options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// How exact numeric columns are returned.
    pub numeric: NumericMode,
    /// Server time zone; the client's local zone when unset.
    pub timezone: Option<ServerZone>,
    /// Whether date binds may skip the absolute-date check.
    pub optimized_date_binds: bool,
}

const NUMERIC_MODES: [NumericMode; 3] = [
    NumericMode::Optimal,
    NumericMode::String,
    NumericMode::Numeric,
];

fn unknown_option(name: &str) -> Error {
    Error::Option(format!("unknown option '{name}'"))
}

impl Options {
    /// The time zone used for date conversions.
    #[must_use]
    pub fn tz(&self) -> ServerZone {
        self.timezone.unwrap_or(ServerZone::Local)
    }

    /// Set an option by name.
    ///
    /// Setting a numeric mode option to a false value restores the default
    /// optimal mode.
    pub fn set(&mut self, name: &str, value: &Value) -> Result<(), Error> {
        let lower = name.to_ascii_lowercase();
        if let Some(mode) = NUMERIC_MODES.iter().find(|m| m.option_name() == lower) {
            self.numeric = if truthy(value) {
                *mode
            } else {
                NumericMode::Optimal
            };
            return Ok(());
        }
        match lower.as_str() {
            "timezone" => {
                self.timezone = match value {
                    Value::Null => None,
                    Value::Text(text) if text.is_empty() => None,
                    Value::Text(text) => Some(
                        ServerZone::parse(text)
                            .map_err(|e| Error::Option(format!("timezone: {e}")))?,
                    ),
                    other => {
                        return Err(Error::Option(format!(
                            "timezone must be a string, got {}",
                            other.type_name()
                        )));
                    }
                };
            }
            "optimized-date-binds" => self.optimized_date_binds = truthy(value),
            _ => return Err(unknown_option(name)),
        }
        tracing::debug!(option = %lower, "driver option set");
        Ok(())
    }

    /// Read an option by name.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        let lower = name.to_ascii_lowercase();
        if let Some(mode) = NUMERIC_MODES.iter().find(|m| m.option_name() == lower) {
            return Ok(Value::Bool(self.numeric == *mode));
        }
        match lower.as_str() {
            "timezone" => Ok(self
                .timezone
                .map_or(Value::Null, |tz| Value::Text(tz.to_string()))),
            "optimized-date-binds" => Ok(Value::Bool(self.optimized_date_binds)),
            _ => Err(unknown_option(name)),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Text(s) => !s.is_empty() && s != "0",
        _ => true,
    }
}
