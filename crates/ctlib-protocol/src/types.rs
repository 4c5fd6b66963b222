//! Client library data type definitions.
//!
//! This module defines the datatypes and data formats as they are exchanged
//! with ct-lib through describe, bind and parameter calls.

/// Client library datatype codes (`CS_*_TYPE`).
///
/// These correspond to the `datatype` field of a `CS_DATAFMT` structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum WireType {
    /// Fixed-length character.
    Char = 0,
    /// Fixed-length binary.
    Binary = 1,
    /// Long character.
    LongChar = 2,
    /// Long binary.
    LongBinary = 3,
    /// Text (large character object).
    Text = 4,
    /// Image (large binary object).
    Image = 5,
    /// 8-bit unsigned integer.
    TinyInt = 6,
    /// 16-bit signed integer.
    SmallInt = 7,
    /// 32-bit signed integer.
    Int = 8,
    /// 32-bit floating point.
    Real = 9,
    /// 64-bit floating point.
    Float = 10,
    /// Bit.
    Bit = 11,
    /// 8-byte datetime (days since 1900 + 1/300 s ticks).
    DateTime = 12,
    /// 4-byte small datetime (days since 1900 + minutes).
    DateTime4 = 13,
    /// 8-byte money.
    Money = 14,
    /// 4-byte money.
    Money4 = 15,
    /// Numeric.
    Numeric = 16,
    /// Decimal.
    Decimal = 17,
    /// Variable-length character.
    VarChar = 18,
    /// Variable-length binary.
    VarBinary = 19,
    /// Long integer.
    Long = 20,
    /// Unsigned 16-bit integer.
    UShort = 24,
    /// Unicode character.
    UniChar = 25,
    /// Date (days since 1900).
    Date = 27,
    /// Time of day (1/300 s ticks).
    Time = 28,
    /// Unicode text.
    UniText = 29,
    /// 64-bit signed integer.
    BigInt = 30,
    /// Unsigned small integer.
    USmallInt = 31,
    /// Unsigned integer.
    UInt = 32,
    /// Unsigned big integer.
    UBigInt = 33,
    /// XML.
    Xml = 34,
    /// Microsecond datetime counter since 0000-01-01.
    BigDateTime = 35,
    /// Microsecond time-of-day counter.
    BigTime = 36,
}

impl WireType {
    /// Create a wire type from a raw datatype code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Char),
            1 => Some(Self::Binary),
            2 => Some(Self::LongChar),
            3 => Some(Self::LongBinary),
            4 => Some(Self::Text),
            5 => Some(Self::Image),
            6 => Some(Self::TinyInt),
            7 => Some(Self::SmallInt),
            8 => Some(Self::Int),
            9 => Some(Self::Real),
            10 => Some(Self::Float),
            11 => Some(Self::Bit),
            12 => Some(Self::DateTime),
            13 => Some(Self::DateTime4),
            14 => Some(Self::Money),
            15 => Some(Self::Money4),
            16 => Some(Self::Numeric),
            17 => Some(Self::Decimal),
            18 => Some(Self::VarChar),
            19 => Some(Self::VarBinary),
            20 => Some(Self::Long),
            24 => Some(Self::UShort),
            25 => Some(Self::UniChar),
            27 => Some(Self::Date),
            28 => Some(Self::Time),
            29 => Some(Self::UniText),
            30 => Some(Self::BigInt),
            31 => Some(Self::USmallInt),
            32 => Some(Self::UInt),
            33 => Some(Self::UBigInt),
            34 => Some(Self::Xml),
            35 => Some(Self::BigDateTime),
            36 => Some(Self::BigTime),
            _ => None,
        }
    }

    /// The raw datatype code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Library name of the type, as used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Char => "CS_CHAR",
            Self::Binary => "CS_BINARY",
            Self::LongChar => "CS_LONGCHAR",
            Self::LongBinary => "CS_LONGBINARY",
            Self::Text => "CS_TEXT",
            Self::Image => "CS_IMAGE",
            Self::TinyInt => "CS_TINYINT",
            Self::SmallInt => "CS_SMALLINT",
            Self::Int => "CS_INT",
            Self::Real => "CS_REAL",
            Self::Float => "CS_FLOAT",
            Self::Bit => "CS_BIT",
            Self::DateTime => "CS_DATETIME",
            Self::DateTime4 => "CS_DATETIME4",
            Self::Money => "CS_MONEY",
            Self::Money4 => "CS_MONEY4",
            Self::Numeric => "CS_NUMERIC",
            Self::Decimal => "CS_DECIMAL",
            Self::VarChar => "CS_VARCHAR",
            Self::VarBinary => "CS_VARBINARY",
            Self::Long => "CS_LONG",
            Self::UShort => "CS_USHORT",
            Self::UniChar => "CS_UNICHAR",
            Self::Date => "CS_DATE",
            Self::Time => "CS_TIME",
            Self::UniText => "CS_UNITEXT",
            Self::BigInt => "CS_BIGINT",
            Self::USmallInt => "CS_USMALLINT",
            Self::UInt => "CS_UINT",
            Self::UBigInt => "CS_UBIGINT",
            Self::Xml => "CS_XML",
            Self::BigDateTime => "CS_BIGDATETIME",
            Self::BigTime => "CS_BIGTIME",
        }
    }

    /// Check if this is a character type.
    #[must_use]
    pub const fn is_character(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::LongChar
                | Self::VarChar
                | Self::Text
                | Self::UniChar
                | Self::UniText
                | Self::Xml
        )
    }

    /// Check if this is a binary type.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            Self::Binary | Self::LongBinary | Self::VarBinary | Self::Image
        )
    }

    /// Check if this is an exact numeric type that arrives as a decimal string.
    #[must_use]
    pub const fn is_decimal(self) -> bool {
        matches!(self, Self::Decimal | Self::Numeric)
    }

    /// Size in bytes of fixed-size types; `None` for variable-length types.
    #[must_use]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::TinyInt | Self::Bit => Some(1),
            Self::SmallInt | Self::UShort | Self::USmallInt => Some(2),
            Self::Int | Self::Real | Self::DateTime4 | Self::Money4 | Self::Date | Self::Time => {
                Some(4)
            }
            Self::UInt => Some(4),
            Self::Float
            | Self::DateTime
            | Self::Money
            | Self::BigInt
            | Self::UBigInt
            | Self::Long
            | Self::BigDateTime
            | Self::BigTime => Some(8),
            _ => None,
        }
    }
}

impl std::fmt::Display for WireType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination format of character data (`CS_FMT_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// No special formatting (`CS_FMT_UNUSED`).
    #[default]
    Unused,
    /// Null-terminate character data (`CS_FMT_NULLTERM`).
    NullTerm,
    /// Pad character data with blanks to the full buffer length (`CS_FMT_PADBLANK`).
    PadBlank,
}

/// Parameter status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamStatus {
    /// Input value (`CS_INPUTVALUE`).
    #[default]
    Input,
    /// Return (output) parameter (`CS_RETURN`).
    Return,
}

/// Well-known server user type codes reported by describe.
pub mod user_type {
    /// FreeTDS reports DECIMAL columns as FLOAT with this user type.
    pub const FREETDS_DECIMAL_AS_FLOAT: i32 = 26;
    /// Blank-padded character column (`nchar`).
    pub const PADDED_CHAR: i32 = 34;
    /// Time-of-day column transported as DATETIME.
    pub const TIME_OF_DAY: i32 = 38;
}

/// Column or parameter description (`CS_DATAFMT`).
///
/// Describe calls fill one of these per result column. The driver may
/// normalize `datatype`, `format` and `max_length` before binding; the type
/// the server actually reported stays available in `origin_datatype`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct DataFormat {
    /// Column or parameter name; empty if the server supplied none.
    pub name: String,
    /// Datatype used for binding.
    pub datatype: WireType,
    /// Datatype as reported by the server.
    pub origin_datatype: WireType,
    /// Character data format.
    pub format: Format,
    /// Maximum data length in bytes.
    pub max_length: usize,
    /// Server user type.
    pub usertype: i32,
    /// Parameter status.
    pub status: ParamStatus,
    /// Number of rows transferred per fetch.
    pub count: usize,
    /// Scale of exact numeric types.
    pub scale: u8,
    /// Precision of exact numeric types.
    pub precision: u8,
}

impl DataFormat {
    /// Create a data format for the given datatype.
    pub fn new(datatype: WireType) -> Self {
        Self {
            name: String::new(),
            datatype,
            origin_datatype: datatype,
            format: Format::Unused,
            max_length: datatype.fixed_size().unwrap_or(0),
            usertype: 0,
            status: ParamStatus::Input,
            count: 1,
            scale: 0,
            precision: 0,
        }
    }

    /// Set the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the character format.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the maximum length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Set the user type.
    #[must_use]
    pub fn with_usertype(mut self, usertype: i32) -> Self {
        self.usertype = usertype;
        self
    }

    /// Set precision and scale.
    #[must_use]
    pub fn with_precision_scale(mut self, precision: u8, scale: u8) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Whether the column originated from an exact numeric wire type.
    #[must_use]
    pub fn is_numeric_origin(&self) -> bool {
        self.origin_datatype.is_decimal()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_type_codes_round_trip() {
        for code in -1..40 {
            if let Some(ty) = WireType::from_code(code) {
                assert_eq!(ty.code(), code);
            }
        }
        assert_eq!(WireType::from_code(30), Some(WireType::BigInt));
        assert_eq!(WireType::from_code(21), None);
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(WireType::DateTime.fixed_size(), Some(8));
        assert_eq!(WireType::DateTime4.fixed_size(), Some(4));
        assert_eq!(WireType::VarChar.fixed_size(), None);
    }

    #[test]
    fn test_data_format_defaults() {
        let fmt = DataFormat::new(WireType::Int);
        assert_eq!(fmt.max_length, 4);
        assert_eq!(fmt.count, 1);
        assert_eq!(fmt.origin_datatype, WireType::Int);
        assert!(!fmt.is_numeric_origin());
        assert!(DataFormat::new(WireType::Decimal).is_numeric_origin());
    }
}
