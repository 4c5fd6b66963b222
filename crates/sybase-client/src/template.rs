//! Query template rewriting.
//!
//! Rewrites the driver's marker syntax into the server's native parameter
//! syntax:
//!
//! | Marker | Rewritten to | Slot |
//! |--------|--------------|------|
//! | `%v` | `@parN` (1-based) | [`SlotKind::Value`] |
//! | `%d` | the argument as a numeric literal | [`SlotKind::Literal`] |
//! | `%s` | the argument as a quoted string literal | [`SlotKind::Literal`] |
//! | `:name` | `@name` | output placeholder `name` |
//!
//! Text inside single or double quotes is copied unchanged.

use sybase_types::Value;
use sybase_types::encode::{numeric_literal, string_literal};

use crate::error::Error;

/// How one positional argument is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Bound as a parameter.
    Value,
    /// Inlined into the query text; skipped when binding.
    Literal,
}

/// A parsed query: rewritten text, bind slots and output placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryTemplate {
    text: String,
    slots: Vec<SlotKind>,
    placeholders: Vec<String>,
}

impl QueryTemplate {
    /// Parse `sql`, inlining literal arguments from `args`.
    pub fn parse(sql: &str, args: &[Value]) -> Result<Self, Error> {
        let mut out = String::with_capacity(sql.len() + 16);
        let mut slots = Vec::new();
        let mut placeholders = Vec::new();
        let mut chars = sql.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            match c {
                '\'' | '"' => {
                    out.push(c);
                    while let Some((_, q)) = chars.next() {
                        out.push(q);
                        if q == '\\' {
                            if let Some((_, escaped)) = chars.next() {
                                out.push(escaped);
                            }
                        } else if q == c {
                            break;
                        }
                    }
                }
                '%' => {
                    let arg = args.get(slots.len()).unwrap_or(&Value::Null);
                    match chars.next().map(|(_, m)| m) {
                        Some('v') => {
                            slots.push(SlotKind::Value);
                            out.push_str("@par");
                            out.push_str(&slots.len().to_string());
                        }
                        Some('d') => {
                            out.push_str(&numeric_literal(arg)?);
                            slots.push(SlotKind::Literal);
                        }
                        Some('s') => {
                            out.push_str(&string_literal(arg)?);
                            slots.push(SlotKind::Literal);
                        }
                        _ => {
                            return Err(Error::Template(
                                "Only %v or %d expected in parameter list".to_string(),
                            ));
                        }
                    }
                }
                ':' => {
                    let start = out.len();
                    while let Some((_, n)) = chars.next_if(|(_, n)| n.is_ascii_alphanumeric() || *n == '_') {
                        out.push(n);
                    }
                    if out.len() == start {
                        return Err(Error::Template(
                            "Placeholder name missing after ':'".to_string(),
                        ));
                    }
                    placeholders.push(out[start..].to_string());
                    out.insert(start, '@');
                }
                other => out.push(other),
            }
        }

        tracing::trace!(
            slots = slots.len(),
            placeholders = placeholders.len(),
            "query template parsed"
        );

        Ok(Self {
            text: out,
            slots,
            placeholders,
        })
    }

    /// Use `sql` unchanged, without markers or arguments.
    #[must_use]
    pub fn raw(sql: &str) -> Self {
        Self {
            text: sql.to_string(),
            ..Self::default()
        }
    }

    /// The rewritten query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bind slots in argument order.
    #[must_use]
    pub fn slots(&self) -> &[SlotKind] {
        &self.slots
    }

    /// Number of arguments bound as parameters.
    #[must_use]
    pub fn value_slots(&self) -> usize {
        self.slots.iter().filter(|s| **s == SlotKind::Value).count()
    }

    /// Output placeholder names in encounter order.
    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Replace the output placeholder names.
    pub fn set_placeholders(&mut self, names: Vec<String>) {
        self.placeholders = names;
    }
}
