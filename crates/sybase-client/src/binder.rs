//! Parameter binding.
//!
//! Converts positional arguments into typed parameter descriptions for
//! `ct_param()`. Only [`SlotKind::Value`] slots are bound; literal slots were
//! already inlined into the query text.

use ctlib_protocol::{Capabilities, DataFormat, Format, WireType};
use encoding_rs::Encoding;
use sybase_types::{ServerZone, Value};
use sybase_types::encode::{encode_datetime, encode_text};

use crate::error::Error;
use crate::template::{QueryTemplate, SlotKind};

/// One parameter ready to be handed to the command handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    /// Parameter description.
    pub format: DataFormat,
    /// Value bytes; `None` binds SQL NULL.
    pub data: Option<Vec<u8>>,
}

/// Builds parameters in the connection's encoding and time zone.
#[derive(Debug, Clone, Copy)]
pub struct ParameterBinder {
    encoding: &'static Encoding,
    tz: ServerZone,
    capabilities: Capabilities,
}

impl ParameterBinder {
    /// Create a binder.
    pub fn new(
        encoding: &'static Encoding,
        tz: impl Into<ServerZone>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            encoding,
            tz: tz.into(),
            capabilities,
        }
    }

    /// Build the parameters for every value slot of `template`.
    ///
    /// Missing arguments bind as NULL; surplus arguments are an error.
    pub fn bind(&self, template: &QueryTemplate, args: &[Value]) -> Result<Vec<BoundParam>, Error> {
        let slots = template.slots();
        if args.len() > slots.len() {
            return Err(Error::Bind(format!(
                "too many arguments passed: {} given, the query has {} bind slot(s)",
                args.len(),
                slots.len()
            )));
        }

        let mut params = Vec::with_capacity(template.value_slots());
        for (i, slot) in slots.iter().enumerate() {
            if *slot == SlotKind::Literal {
                continue;
            }
            let name = format!("@par{}", i + 1);
            let param = self.param(&name, args.get(i).unwrap_or(&Value::Null))?;
            tracing::trace!(
                param = %name,
                datatype = param.format.datatype.name(),
                null = param.data.is_none(),
                "parameter bound"
            );
            params.push(param);
        }
        Ok(params)
    }

    /// Build one parameter.
    pub fn param(&self, name: &str, value: &Value) -> Result<BoundParam, Error> {
        let (format, data) = match value {
            Value::Null => {
                let format = if self.capabilities.contains(Capabilities::NULL_TYPE_HINT) {
                    DataFormat::new(WireType::Char)
                        .with_format(Format::NullTerm)
                        .with_max_length(1)
                } else {
                    DataFormat::new(WireType::Char).with_max_length(0)
                };
                (format, None)
            }
            Value::Text(text) => {
                let bytes = encode_text(text, self.encoding)?;
                (
                    DataFormat::new(WireType::Char).with_max_length(bytes.len()),
                    Some(bytes),
                )
            }
            Value::Number(n) => {
                let text = n.as_str().as_bytes().to_vec();
                (
                    DataFormat::new(WireType::Char)
                        .with_format(Format::NullTerm)
                        .with_max_length(text.len() + 1),
                    Some(text),
                )
            }
            Value::Timestamp(_) | Value::Duration(_) => {
                let bytes = encode_datetime(value, self.tz).map_err(|e| {
                    if e.is_date_error() {
                        Error::Date(e.to_string())
                    } else {
                        Error::Type(e)
                    }
                })?;
                (DataFormat::new(WireType::DateTime), Some(bytes.to_vec()))
            }
            Value::Int(i) => self.int_param(*i),
            Value::Bool(b) => (
                DataFormat::new(WireType::Int),
                Some(i32::from(*b).to_ne_bytes().to_vec()),
            ),
            Value::Float(f) => (
                DataFormat::new(WireType::Float),
                Some(f.to_ne_bytes().to_vec()),
            ),
            Value::Bytes(b) => (
                DataFormat::new(WireType::Binary).with_max_length(b.len()),
                Some(b.to_vec()),
            ),
            Value::List(_) | Value::Hash(_) => {
                return Err(Error::Bind(format!(
                    "do not know how to bind values of type '{}'",
                    value.type_name()
                )));
            }
        };
        Ok(BoundParam {
            format: format.with_name(name),
            data,
        })
    }

    fn int_param(&self, i: i64) -> (DataFormat, Option<Vec<u8>>) {
        if self.capabilities.contains(Capabilities::BIGINT_PARAMS) {
            return (
                DataFormat::new(WireType::BigInt),
                Some(i.to_ne_bytes().to_vec()),
            );
        }
        match i32::try_from(i) {
            Ok(small) if small != i32::MIN => (
                DataFormat::new(WireType::Int),
                Some(small.to_ne_bytes().to_vec()),
            ),
            _ => (
                DataFormat::new(WireType::Float),
                Some((i as f64).to_ne_bytes().to_vec()),
            ),
        }
    }
}
