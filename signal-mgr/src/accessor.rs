//! Typed access to stored signals
//!
//! [`SignalScalar`] maps Rust primitives onto the fixed-width data types and
//! [`SignalGroup`] binds a Rust struct to a structure signal, so application
//! code can use `store.get_as::<TestDataV1>()` the way C code calls
//! `Get_TestDataV1(&value)`.

use crate::signals::{SignalDefinition, SignalType, StructField};
use crate::store::SignalStore;
use crate::types::{DataType, Result, SignalError, SignalValue};

/// A Rust primitive with a matching signal data type
pub trait SignalScalar: Sized {
    const DATA_TYPE: DataType;

    fn to_value(self) -> SignalValue;

    /// Convert from a stored value, `None` if it does not fit
    fn from_value(value: &SignalValue) -> Option<Self>;
}

macro_rules! impl_unsigned_scalar {
    ($($ty:ty => $data_type:ident),* $(,)?) => {
        $(
            impl SignalScalar for $ty {
                const DATA_TYPE: DataType = DataType::$data_type;

                fn to_value(self) -> SignalValue {
                    SignalValue::Unsigned(self as u64)
                }

                fn from_value(value: &SignalValue) -> Option<Self> {
                    match value {
                        SignalValue::Unsigned(v) => <$ty>::try_from(*v).ok(),
                        SignalValue::Signed(v) => <$ty>::try_from(*v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! impl_signed_scalar {
    ($($ty:ty => $data_type:ident),* $(,)?) => {
        $(
            impl SignalScalar for $ty {
                const DATA_TYPE: DataType = DataType::$data_type;

                fn to_value(self) -> SignalValue {
                    SignalValue::Signed(self as i64)
                }

                fn from_value(value: &SignalValue) -> Option<Self> {
                    match value {
                        SignalValue::Signed(v) => <$ty>::try_from(*v).ok(),
                        SignalValue::Unsigned(v) => <$ty>::try_from(*v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_unsigned_scalar!(u8 => UInt8, u16 => UInt16, u32 => UInt32, u64 => UInt64);
impl_signed_scalar!(i8 => SInt8, i16 => SInt16, i32 => SInt32, i64 => SInt64);

impl SignalScalar for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn to_value(self) -> SignalValue {
        SignalValue::Boolean(self)
    }

    fn from_value(value: &SignalValue) -> Option<Self> {
        match value {
            SignalValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl SignalScalar for f32 {
    const DATA_TYPE: DataType = DataType::Float32;

    fn to_value(self) -> SignalValue {
        SignalValue::Float(self as f64)
    }

    fn from_value(value: &SignalValue) -> Option<Self> {
        match value {
            SignalValue::Float(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl SignalScalar for f64 {
    const DATA_TYPE: DataType = DataType::Float64;

    fn to_value(self) -> SignalValue {
        SignalValue::Float(self)
    }

    fn from_value(value: &SignalValue) -> Option<Self> {
        match value {
            SignalValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl SignalScalar for char {
    const DATA_TYPE: DataType = DataType::Char;

    fn to_value(self) -> SignalValue {
        SignalValue::Char(self)
    }

    fn from_value(value: &SignalValue) -> Option<Self> {
        match value {
            SignalValue::Char(c) => Some(*c),
            _ => None,
        }
    }
}

/// A Rust type bound to one structure signal
///
/// Implementations list their fields in declaration order, which is the
/// order of the generated C struct.
pub trait SignalGroup: Sized {
    /// Name of the bound signal
    const SIGNAL: &'static str;

    /// Declared layout of the signal
    fn signal_type() -> SignalType;

    fn to_value(&self) -> SignalValue;

    fn from_value(value: &SignalValue) -> Result<Self>;

    /// Definition to declare the signal with
    fn definition() -> SignalDefinition {
        SignalDefinition::new(Self::SIGNAL, Self::signal_type())
    }
}

/// Read a typed field out of a structure value
///
/// Helper for [`SignalGroup::from_value`] implementations.
pub fn field_as<T: SignalScalar>(signal: &str, value: &SignalValue, field: &str) -> Result<T> {
    let field_value = value.field(field).ok_or_else(|| SignalError::FieldNotFound {
        signal: signal.to_string(),
        field: field.to_string(),
    })?;
    T::from_value(field_value).ok_or_else(|| SignalError::TypeMismatch {
        signal: format!("{}.{}", signal, field),
        expected: T::DATA_TYPE.c_name().to_string(),
        found: field_value.kind_name().to_string(),
    })
}

/// Layout of a structure whose fields all share one data type
pub fn uniform_struct(fields: &[&str], data_type: DataType) -> SignalType {
    SignalType::Struct(
        fields
            .iter()
            .map(|name| StructField::new(*name, data_type))
            .collect(),
    )
}

impl SignalStore {
    /// Read a structure signal into its bound Rust type
    pub fn get_as<T: SignalGroup>(&self) -> Result<T> {
        self.check_group::<T>()?;
        T::from_value(&self.get(T::SIGNAL)?)
    }

    /// Write a structure signal from its bound Rust type
    pub fn set_from<T: SignalGroup>(&mut self, value: &T) -> Result<bool> {
        self.check_group::<T>()?;
        self.set(T::SIGNAL, value.to_value())
    }

    /// Read a primitive signal as a Rust scalar
    pub fn get_scalar<T: SignalScalar>(&self, name: &str) -> Result<T> {
        self.check_scalar::<T>(name)?;
        let value = self.get(name)?;
        T::from_value(&value).ok_or_else(|| SignalError::TypeMismatch {
            signal: name.to_string(),
            expected: T::DATA_TYPE.c_name().to_string(),
            found: value.kind_name().to_string(),
        })
    }

    /// Write a primitive signal from a Rust scalar
    pub fn set_scalar<T: SignalScalar>(&mut self, name: &str, value: T) -> Result<bool> {
        self.check_scalar::<T>(name)?;
        self.set(name, value.to_value())
    }

    fn check_group<T: SignalGroup>(&self) -> Result<()> {
        let declared = self.signal_type(T::SIGNAL)?;
        if !declared.same_layout(&T::signal_type()) {
            return Err(SignalError::TypeMismatch {
                signal: T::SIGNAL.to_string(),
                expected: declared.c_type_name(T::SIGNAL),
                found: std::any::type_name::<T>().to_string(),
            });
        }
        Ok(())
    }

    fn check_scalar<T: SignalScalar>(&self, name: &str) -> Result<()> {
        let declared = self.signal_type(name)?;
        if !declared.same_layout(&SignalType::Primitive(T::DATA_TYPE)) {
            return Err(SignalError::TypeMismatch {
                signal: name.to_string(),
                expected: declared.c_type_name(name),
                found: T::DATA_TYPE.c_name().to_string(),
            });
        }
        Ok(())
    }
}
