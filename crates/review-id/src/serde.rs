use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SnowflakeId;

impl Serialize for SnowflakeId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_raw().serialize(s)
    }
}

impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        as_native_snow::deserialize(d)
    }
}

fn checked<E: serde::de::Error>(raw: i64) -> Result<SnowflakeId, E> {
    let id = SnowflakeId::from_raw(raw);
    if !id.is_valid() {
        return Err(E::custom(format_args!("negative snowflake ID: {raw}")));
    }
    Ok(id)
}

pub mod as_native_snow {
    use super::{Deserialize, Deserializer, Serialize, Serializer, checked};
    use crate::SnowflakeId;

    /// Serialize a snowflake ID as its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// Deserialize a snowflake ID from its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the value is
    /// negative.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        checked(i64::deserialize(d)?)
    }
}

/// Decimal-string encoding.
///
/// JavaScript consumers cannot hold integers above 2^53, so IDs that leave
/// the backend as JSON are written as strings. Deserialization accepts either
/// form.
pub mod as_string_snow {
    use super::{Deserializer, Serializer, checked};
    use crate::SnowflakeId;

    /// Serialize a snowflake ID as a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// Deserialize a snowflake ID from a decimal string or an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is neither, does not fit an `i64`, or is
    /// negative.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnowVisitor;

        impl serde::de::Visitor<'_> for SnowVisitor {
            type Value = SnowflakeId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a snowflake ID as a decimal string or integer")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let raw = v.trim().parse::<i64>().map_err(E::custom)?;
                checked(raw)
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                checked(v)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let raw = i64::try_from(v).map_err(E::custom)?;
                checked(raw)
            }
        }

        d.deserialize_any(SnowVisitor)
    }
}
