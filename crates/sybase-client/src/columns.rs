//! Column descriptors and bound row buffers.
//!
//! Described columns are normalized before binding so that every value
//! arrives in a format the row decoder understands:
//!
//! | Reported | Bound as | Format | Length |
//! |----------|----------|--------|--------|
//! | DECIMAL, NUMERIC | CHAR | PadBlank | 50 |
//! | UNICHAR | TEXT | NullTerm | as reported |
//! | CHAR | CHAR | PadBlank | as reported |
//! | LONGCHAR, VARCHAR, TEXT | as reported | NullTerm | doubled for multi-byte encodings |
//! | FLOAT, user type 26 (FreeTDS) | CHAR | NullTerm | 50 |
//! | MONEY, MONEY4 | FLOAT | Unused | as reported |
//! | other | as reported | Unused | as reported |

use ctlib_protocol::{ColumnBuffer, DataFormat, Flavor, Format, WireType, user_type};

use crate::config::defaults::{MIN_BUFFER_LEN, NUMERIC_BUFFER_LEN};

/// One described and normalized result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    format: DataFormat,
}

impl ColumnDescriptor {
    /// Normalize a described column for binding.
    pub fn new(mut format: DataFormat, multi_byte: bool, flavor: Flavor) -> Self {
        format.count = 1;
        format.origin_datatype = format.datatype;
        match format.datatype {
            WireType::Decimal | WireType::Numeric => {
                format.datatype = WireType::Char;
                format.format = Format::PadBlank;
                format.max_length = NUMERIC_BUFFER_LEN;
            }
            WireType::UniChar => {
                format.datatype = WireType::Text;
                format.format = Format::NullTerm;
            }
            WireType::Char => format.format = Format::PadBlank,
            WireType::LongChar | WireType::VarChar | WireType::Text => {
                if multi_byte {
                    format.max_length *= 2;
                }
                format.format = Format::NullTerm;
            }
            WireType::Float
                if flavor == Flavor::FreeTds
                    && format.usertype == user_type::FREETDS_DECIMAL_AS_FLOAT =>
            {
                // really a DECIMAL column
                format.origin_datatype = WireType::Decimal;
                format.datatype = WireType::Char;
                format.format = Format::NullTerm;
                format.max_length = NUMERIC_BUFFER_LEN;
            }
            WireType::Money | WireType::Money4 => {
                format.datatype = WireType::Float;
                format.format = Format::Unused;
            }
            _ => format.format = Format::Unused,
        }
        Self { format }
    }

    /// The format the column is bound with.
    #[must_use]
    pub fn format(&self) -> &DataFormat {
        &self.format
    }

    /// Server-supplied column name; may be empty.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.format.name
    }

    /// Datatype the column is bound as.
    #[must_use]
    pub fn datatype(&self) -> WireType {
        self.format.datatype
    }

    /// Datatype the server reported.
    #[must_use]
    pub fn origin(&self) -> WireType {
        self.format.origin_datatype
    }

    /// Whether the value is exact numeric text.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.format.is_numeric_origin()
    }

    /// Whether trailing blanks are padding rather than data.
    #[must_use]
    pub fn needs_trim(&self, flavor: Flavor) -> bool {
        self.format.format == Format::PadBlank
            || self.format.usertype == user_type::PADDED_CHAR
            || self.format.datatype == WireType::Text
            // Sybase pads LONGCHAR even when bound null-terminated
            || (flavor == Flavor::Sybase && self.format.datatype == WireType::LongChar)
    }

    /// Capacity of the output buffer for this column.
    #[must_use]
    pub fn buffer_len(&self) -> usize {
        let len = match self.format.format {
            Format::NullTerm => self.format.max_length + 1,
            _ => self.format.max_length,
        };
        len.max(MIN_BUFFER_LEN)
    }
}

/// Column descriptor cache of one command.
///
/// The cache is marked dirty at every command boundary, since the next
/// result set may have a different shape.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    descriptors: Vec<ColumnDescriptor>,
    dirty: bool,
}

impl Columns {
    /// Whether the columns must be described before the next fetch.
    #[must_use]
    pub fn needs_describe(&self) -> bool {
        self.dirty || self.descriptors.is_empty()
    }

    /// Mark the cache stale.
    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Store a fresh description.
    pub fn set(&mut self, descriptors: Vec<ColumnDescriptor>) {
        self.descriptors = descriptors;
        self.dirty = false;
    }

    /// Current descriptors.
    #[must_use]
    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    /// Number of described columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no columns are described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Output buffers bound to the current columns, reused across fetches.
#[derive(Debug, Default)]
pub struct RowBuffer {
    buffers: Vec<ColumnBuffer>,
    allocations: usize,
}

impl RowBuffer {
    /// Make the buffers fit `descriptors`.
    ///
    /// Buffers are reallocated only when the column count or a buffer
    /// capacity changes. Returns whether a reallocation took place.
    pub fn prepare(&mut self, descriptors: &[ColumnDescriptor]) -> bool {
        let same_shape = self.buffers.len() == descriptors.len()
            && self
                .buffers
                .iter()
                .zip(descriptors)
                .all(|(buf, desc)| buf.capacity() == desc.buffer_len());
        if same_shape {
            return false;
        }
        self.buffers = descriptors
            .iter()
            .map(|d| ColumnBuffer::with_capacity(d.buffer_len()))
            .collect();
        self.allocations += 1;
        tracing::trace!(columns = descriptors.len(), "row buffers allocated");
        true
    }

    /// The buffers, one per column.
    #[must_use]
    pub fn buffers(&self) -> &[ColumnBuffer] {
        &self.buffers
    }

    /// Mutable buffers for fetching.
    pub fn buffers_mut(&mut self) -> &mut [ColumnBuffer] {
        &mut self.buffers
    }

    /// How many times the buffers were (re)allocated.
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}
