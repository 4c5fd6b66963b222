//! Server character set support.
//!
//! This module maps Sybase character set names (as used by `cs_locale()` and
//! the `interfaces`/`locales.dat` files) and Windows code pages (as reported
//! by MS-SQL `collationproperty(..., 'CodePage')`) to `encoding_rs`
//! encodings.
//!
//! # Supported Character Sets
//!
//! | Sybase name | Code Page | Encoding |
//! |-------------|-----------|----------|
//! | `utf8` | 65001 | UTF-8 |
//! | `iso_1` | - | Windows-1252 (ISO-8859-1 superset) |
//! | `iso15` | - | ISO-8859-15 |
//! | `cp874`, `tis620` | 874 | Windows-874 |
//! | `sjis`, `cp932` | 932 | Shift_JIS |
//! | `eucjis` | - | EUC-JP |
//! | `cp936`, `eucgb`, `gb18030` | 936 | GBK / GB18030 |
//! | `cp949`, `eucksc` | 949 | EUC-KR |
//! | `big5`, `cp950` | 950 | Big5 |
//! | `cp1250` .. `cp1258` | 1250-1258 | Windows-125x |
//! | `koi8` | - | KOI8-R |
//! | `cp866` | 866 | IBM866 |
//! | `mac` | 10000 | macintosh |

use encoding_rs::Encoding;

/// Default Sybase character set name used when the datasource names none.
pub const DEFAULT_CHARSET: &str = "utf8";

/// Code page reported for UTF-8 collations.
pub const CODE_PAGE_UTF8: u16 = 65001;

/// Returns the encoding for a Sybase character set name or a WHATWG label.
///
/// Sybase names are matched case-insensitively first; anything else is
/// resolved as an encoding label (`UTF-8`, `WINDOWS-1252`, `ISO-8859-1`, ...).
pub fn encoding_for_name(name: &str) -> Option<&'static Encoding> {
    let lower = name.trim().to_ascii_lowercase();
    let enc = match lower.as_str() {
        "utf8" | "utf-8" => encoding_rs::UTF_8,
        "iso_1" | "iso88591" | "ascii_8" | "ascii" | "roman8" => encoding_rs::WINDOWS_1252,
        "iso15" | "iso885915" => encoding_rs::ISO_8859_15,
        "iso88592" => encoding_rs::ISO_8859_2,
        "iso88595" => encoding_rs::ISO_8859_5,
        "iso88596" => encoding_rs::ISO_8859_6,
        "iso88597" => encoding_rs::ISO_8859_7,
        "iso88598" => encoding_rs::ISO_8859_8,
        "iso88599" => encoding_rs::WINDOWS_1254,
        "cp874" | "tis620" => encoding_rs::WINDOWS_874,
        "sjis" | "cp932" => encoding_rs::SHIFT_JIS,
        "eucjis" | "deckanji" => encoding_rs::EUC_JP,
        "cp936" | "eucgb" => encoding_rs::GBK,
        "gb18030" => encoding_rs::GB18030,
        "cp949" | "eucksc" => encoding_rs::EUC_KR,
        "big5" | "cp950" => encoding_rs::BIG5,
        "koi8" => encoding_rs::KOI8_R,
        "cp866" => encoding_rs::IBM866,
        "mac" => encoding_rs::MACINTOSH,
        other => {
            if let Some(cp) = other.strip_prefix("cp") {
                return cp.parse().ok().and_then(encoding_for_code_page);
            }
            if let Some(cp) = other.strip_prefix("windows-") {
                return cp.parse().ok().and_then(encoding_for_code_page);
            }
            return Encoding::for_label(other.as_bytes());
        }
    };
    Some(enc)
}

/// Returns the encoding for a Windows code page number, if supported.
pub fn encoding_for_code_page(code_page: u16) -> Option<&'static Encoding> {
    match code_page {
        866 => Some(encoding_rs::IBM866),
        874 => Some(encoding_rs::WINDOWS_874),
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),
        10000 => Some(encoding_rs::MACINTOSH),
        CODE_PAGE_UTF8 => Some(encoding_rs::UTF_8),
        _ => None,
    }
}

/// Returns the Sybase character set name for an encoding, if one exists.
///
/// This is the name handed to `cs_locale(CS_SYB_CHARSET)`.
pub fn sybase_name(encoding: &'static Encoding) -> Option<&'static str> {
    let name = if encoding == encoding_rs::UTF_8 {
        "utf8"
    } else if encoding == encoding_rs::WINDOWS_1252 {
        "iso_1"
    } else if encoding == encoding_rs::ISO_8859_15 {
        "iso15"
    } else if encoding == encoding_rs::SHIFT_JIS {
        "sjis"
    } else if encoding == encoding_rs::EUC_JP {
        "eucjis"
    } else if encoding == encoding_rs::GBK {
        "cp936"
    } else if encoding == encoding_rs::GB18030 {
        "gb18030"
    } else if encoding == encoding_rs::EUC_KR {
        "eucksc"
    } else if encoding == encoding_rs::BIG5 {
        "big5"
    } else if encoding == encoding_rs::KOI8_R {
        "koi8"
    } else if encoding == encoding_rs::IBM866 {
        "cp866"
    } else if encoding == encoding_rs::MACINTOSH {
        "mac"
    } else if encoding == encoding_rs::WINDOWS_874 {
        "cp874"
    } else if encoding == encoding_rs::WINDOWS_1250 {
        "cp1250"
    } else if encoding == encoding_rs::WINDOWS_1251 {
        "cp1251"
    } else if encoding == encoding_rs::WINDOWS_1253 {
        "cp1253"
    } else if encoding == encoding_rs::WINDOWS_1254 {
        "cp1254"
    } else if encoding == encoding_rs::WINDOWS_1255 {
        "cp1255"
    } else if encoding == encoding_rs::WINDOWS_1256 {
        "cp1256"
    } else if encoding == encoding_rs::WINDOWS_1257 {
        "cp1257"
    } else if encoding == encoding_rs::WINDOWS_1258 {
        "cp1258"
    } else {
        return None;
    };
    Some(name)
}

/// Whether characters in this encoding may occupy more than one byte.
///
/// Variable-length character buffers are doubled for such encodings.
#[inline]
pub fn is_multi_byte(encoding: &'static Encoding) -> bool {
    !encoding.is_single_byte()
}
