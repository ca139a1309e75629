//! Core types for the signal manager library
//!
//! This module defines the fixed-width data types a signal can be declared with,
//! the values a signal can hold at runtime, and the error type shared by the
//! signal database, the runtime store and the code generators.

use crate::signals::ValidationIssue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Result type for signal manager operations
pub type Result<T> = std::result::Result<T, SignalError>;

/// Errors that can occur while loading, validating, storing or generating signals
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to parse project file: {0}")]
    ProjectParseError(String),

    #[error("Failed to parse lookup table: {0}")]
    TableParseError(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Signal already exists: {0}")]
    DuplicateSignal(String),

    #[error("Field '{field}' not found in signal '{signal}'")]
    FieldNotFound { signal: String, field: String },

    #[error("Type mismatch for signal '{signal}': expected {expected}, found {found}")]
    TypeMismatch {
        signal: String,
        expected: String,
        found: String,
    },

    #[error("Value {value} is out of range for {data_type} signal '{signal}'")]
    OutOfRange {
        signal: String,
        data_type: DataType,
        value: String,
    },

    #[error("Invalid value for signal '{signal}': {reason}")]
    InvalidValue { signal: String, reason: String },

    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    #[error("Notifiers are disabled for signal '{0}'")]
    NotificationsDisabled(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Signal database has {} validation issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Fixed-width data types of the automotive type set
///
/// Every type has two spellings: the C typedef emitted into generated headers
/// (`uint8`, `bool_t`, ...) and the name used in project files (`UINT8`,
/// `BOOLEAN`, ...). Both are accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    SInt8,
    SInt16,
    SInt32,
    SInt64,
    Float32,
    Float64,
    Char,
    Bool,
}

impl DataType {
    /// All data types, in the order their typedefs appear in a generated header
    pub const ALL: [DataType; 12] = [
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::SInt8,
        DataType::SInt16,
        DataType::SInt32,
        DataType::SInt64,
        DataType::Float32,
        DataType::Float64,
        DataType::Char,
        DataType::Bool,
    ];

    /// C typedef name (e.g. `uint16`, `bool_t`)
    pub fn c_name(self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::SInt8 => "sint8",
            DataType::SInt16 => "sint16",
            DataType::SInt32 => "sint32",
            DataType::SInt64 => "sint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Char => "char_t",
            DataType::Bool => "bool_t",
        }
    }

    /// Underlying C type the typedef aliases
    pub fn c_base_type(self) -> &'static str {
        match self {
            DataType::UInt8 => "unsigned char",
            DataType::UInt16 => "unsigned short",
            DataType::UInt32 => "unsigned int",
            DataType::UInt64 => "unsigned long long",
            DataType::SInt8 => "signed char",
            DataType::SInt16 => "signed short",
            DataType::SInt32 => "signed int",
            DataType::SInt64 => "signed long long",
            DataType::Float32 => "float",
            DataType::Float64 => "double",
            DataType::Char => "char",
            DataType::Bool => "unsigned char",
        }
    }

    /// Name used in project files and lookup tables (e.g. `UINT16`, `BOOLEAN`)
    pub fn database_name(self) -> &'static str {
        match self {
            DataType::UInt8 => "UINT8",
            DataType::UInt16 => "UINT16",
            DataType::UInt32 => "UINT32",
            DataType::UInt64 => "UINT64",
            DataType::SInt8 => "INT8",
            DataType::SInt16 => "INT16",
            DataType::SInt32 => "INT32",
            DataType::SInt64 => "INT64",
            DataType::Float32 => "FLOAT32",
            DataType::Float64 => "FLOAT64",
            DataType::Char => "CHAR",
            DataType::Bool => "BOOLEAN",
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::SInt8 | DataType::SInt16 | DataType::SInt32 | DataType::SInt64
        )
    }

    /// The all-zero value of this type (`ZeroMemory` initialization)
    pub fn zero_value(self) -> SignalValue {
        match self {
            DataType::Bool => SignalValue::Boolean(false),
            DataType::Char => SignalValue::Char('\0'),
            DataType::Float32 | DataType::Float64 => SignalValue::Float(0.0),
            t if t.is_signed() => SignalValue::Signed(0),
            _ => SignalValue::Unsigned(0),
        }
    }

    /// Inclusive value range of an integer type, as i128 so both signednesses fit
    fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            DataType::UInt8 => Some((0, u8::MAX as i128)),
            DataType::UInt16 => Some((0, u16::MAX as i128)),
            DataType::UInt32 => Some((0, u32::MAX as i128)),
            DataType::UInt64 => Some((0, u64::MAX as i128)),
            DataType::SInt8 => Some((i8::MIN as i128, i8::MAX as i128)),
            DataType::SInt16 => Some((i16::MIN as i128, i16::MAX as i128)),
            DataType::SInt32 => Some((i32::MIN as i128, i32::MAX as i128)),
            DataType::SInt64 => Some((i64::MIN as i128, i64::MAX as i128)),
            _ => None,
        }
    }

    /// Check a value against this type's domain and return its canonical form
    ///
    /// Integers may be written with either signedness as long as they fit the
    /// declared width; they are stored as `Unsigned` for `uintN` and `Signed`
    /// for `sintN`. Integers are accepted for float types. `float32` values are
    /// rounded to single precision so that a read returns exactly what the
    /// target would hold.
    pub fn coerce(self, signal: &str, value: &SignalValue) -> Result<SignalValue> {
        let mismatch = || SignalError::TypeMismatch {
            signal: signal.to_string(),
            expected: self.c_name().to_string(),
            found: value.kind_name().to_string(),
        };
        let out_of_range = || SignalError::OutOfRange {
            signal: signal.to_string(),
            data_type: self,
            value: value.to_string(),
        };

        match self {
            DataType::Bool => match value {
                SignalValue::Boolean(b) => Ok(SignalValue::Boolean(*b)),
                _ => Err(mismatch()),
            },
            DataType::Char => match value {
                SignalValue::Char(c) if c.is_ascii() => Ok(SignalValue::Char(*c)),
                SignalValue::Char(_) => Err(out_of_range()),
                _ => Err(mismatch()),
            },
            DataType::Float32 | DataType::Float64 => {
                let v = match value {
                    SignalValue::Float(v) => *v,
                    SignalValue::Signed(v) => *v as f64,
                    SignalValue::Unsigned(v) => *v as f64,
                    _ => return Err(mismatch()),
                };
                if !v.is_finite() {
                    return Err(out_of_range());
                }
                if self == DataType::Float32 {
                    if v.abs() > f32::MAX as f64 {
                        return Err(out_of_range());
                    }
                    Ok(SignalValue::Float(v as f32 as f64))
                } else {
                    Ok(SignalValue::Float(v))
                }
            }
            _ => {
                let raw: i128 = match value {
                    SignalValue::Signed(v) => *v as i128,
                    SignalValue::Unsigned(v) => *v as i128,
                    _ => return Err(mismatch()),
                };
                let (min, max) = self.integer_range().ok_or_else(mismatch)?;
                if raw < min || raw > max {
                    return Err(out_of_range());
                }
                if self.is_unsigned() {
                    Ok(SignalValue::Unsigned(raw as u64))
                } else {
                    Ok(SignalValue::Signed(raw as i64))
                }
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.c_name())
    }
}

impl FromStr for DataType {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let data_type = match upper.as_str() {
            "BOOLEAN" | "BOOL" | "BOOL_T" => DataType::Bool,
            "UINT8" => DataType::UInt8,
            "UINT16" => DataType::UInt16,
            "UINT32" => DataType::UInt32,
            "UINT64" => DataType::UInt64,
            "INT8" | "SINT8" => DataType::SInt8,
            "INT16" | "SINT16" => DataType::SInt16,
            "INT32" | "SINT32" => DataType::SInt32,
            "INT64" | "SINT64" => DataType::SInt64,
            "FLOAT32" | "FLOAT" => DataType::Float32,
            "FLOAT64" | "DOUBLE" => DataType::Float64,
            "CHAR" | "CHAR_T" => DataType::Char,
            _ => return Err(SignalError::UnknownDataType(trimmed.to_string())),
        };
        Ok(data_type)
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.database_name())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A named field value inside a structure value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: SignalValue,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: SignalValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Signal value types held by the runtime store
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    /// Boolean flag (`bool_t`)
    Boolean(bool),
    /// Signed integer (`sintN`)
    Signed(i64),
    /// Unsigned integer (`uintN`)
    Unsigned(u64),
    /// Floating-point value (`float32`/`float64`)
    Float(f64),
    /// Single ASCII character (`char_t`)
    Char(char),
    /// Structure value, fields in declaration order
    Struct(Vec<FieldValue>),
    /// Fixed-size array value
    Array(Vec<SignalValue>),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            SignalValue::Signed(v) => write!(f, "{}", v),
            SignalValue::Unsigned(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{:?}", v),
            SignalValue::Char(c) => write!(f, "{:?}", c),
            SignalValue::Struct(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.value)?;
                }
                write!(f, "}}")
            }
            SignalValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl SignalValue {
    /// Short name of the value's variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            SignalValue::Boolean(_) => "boolean",
            SignalValue::Signed(_) => "signed integer",
            SignalValue::Unsigned(_) => "unsigned integer",
            SignalValue::Float(_) => "float",
            SignalValue::Char(_) => "char",
            SignalValue::Struct(_) => "struct",
            SignalValue::Array(_) => "array",
        }
    }

    /// Look up a field of a structure value by name
    pub fn field(&self, name: &str) -> Option<&SignalValue> {
        match self {
            SignalValue::Struct(fields) => fields.iter().find(|f| f.name == name).map(|f| &f.value),
            _ => None,
        }
    }

    /// Compare two values the way `memcmp` compares their storage
    ///
    /// Floats are equal only if their bit patterns are, so `0.0` and `-0.0`
    /// differ.
    pub fn bitwise_eq(&self, other: &SignalValue) -> bool {
        match (self, other) {
            (SignalValue::Float(a), SignalValue::Float(b)) => a.to_bits() == b.to_bits(),
            (SignalValue::Struct(a), SignalValue::Struct(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|(x, y)| x.name == y.name && x.value.bitwise_eq(&y.value))
            }
            (SignalValue::Array(a), SignalValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.bitwise_eq(y))
            }
            _ => self == other,
        }
    }

    /// Render the value as a C initializer (`1`, `2.5`, `'a'`, `{1, 0}`)
    pub fn to_c_initializer(&self) -> String {
        match self {
            SignalValue::Boolean(v) => if *v { "1" } else { "0" }.to_string(),
            // The literal 9223372036854775808 does not fit any signed type
            SignalValue::Signed(i64::MIN) => "(-9223372036854775807LL - 1)".to_string(),
            SignalValue::Signed(v) => v.to_string(),
            SignalValue::Unsigned(v) => format!("{}u", v),
            SignalValue::Float(v) => format!("{:?}", v),
            SignalValue::Char(c) => c_char_literal(*c),
            SignalValue::Struct(fields) => {
                let parts: Vec<String> = fields.iter().map(|f| f.value.to_c_initializer()).collect();
                format!("{{{}}}", parts.join(", "))
            }
            SignalValue::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_c_initializer()).collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }
}

fn c_char_literal(c: char) -> String {
    match c {
        '\0' => "'\\0'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\r' => "'\\r'".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\'' => "'\\''".to_string(),
        c if c == ' ' || c.is_ascii_graphic() => format!("'{}'", c),
        c => format!("'\\x{:02x}'", c as u32),
    }
}
