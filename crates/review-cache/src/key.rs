//! Cache keys for paginated listings.
//!
//! A key is the unit of coalescing and the unit of cache storage, so it must
//! encode exactly `(namespace, partition, offset, limit)`: two different
//! queries never share a key, the same query always produces the same one.
//! The textual form is `<namespace>:<partition>:<offset>:<limit>`.

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use crate::error::KeyError;

const DELIMITER: char = ':';

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: Arc<str>,
    partition: i64,
    offset: u32,
    limit: u32,
}

impl CacheKey {
    /// Builds a key.
    ///
    /// # Errors
    ///
    /// Rejects an empty namespace and any namespace containing `:`.
    pub fn new(
        namespace: impl Into<Arc<str>>,
        partition: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Self, KeyError> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(KeyError::EmptyNamespace);
        }
        if namespace.contains(DELIMITER) {
            return Err(KeyError::DelimiterInNamespace {
                namespace: namespace.to_string(),
            });
        }
        Ok(Self {
            namespace,
            partition,
            offset,
            limit,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn partition(&self) -> i64 {
        self.partition
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.namespace, self.partition, self.offset, self.limit
        )
    }
}

impl FromStr for CacheKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(DELIMITER).collect();
        let [namespace, partition, offset, limit] = fields[..] else {
            return Err(KeyError::FieldCount {
                key: s.to_string(),
                found: fields.len(),
            });
        };

        Self::new(
            namespace,
            parse_field("partition", partition)?,
            parse_field("offset", offset)?,
            parse_field("limit", limit)?,
        )
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, KeyError> {
    value.parse().map_err(|_| KeyError::InvalidField {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_four_colon_delimited_fields() {
        let key = CacheKey::new("review", 42, 20, 10).unwrap();
        assert_eq!(key.to_string(), "review:42:20:10");
    }

    #[test]
    fn parses_back_to_the_same_key() {
        let key: CacheKey = "review:-7:0:50".parse().unwrap();
        assert_eq!(key, CacheKey::new("review", -7, 0, 50).unwrap());
        assert_eq!(key.namespace(), "review");
        assert_eq!(key.partition(), -7);
        assert_eq!(key.offset(), 0);
        assert_eq!(key.limit(), 50);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            "review:1:2".parse::<CacheKey>(),
            Err(KeyError::FieldCount {
                key: "review:1:2".to_string(),
                found: 3
            })
        );
        assert!(matches!(
            "review:1:2:3:4".parse::<CacheKey>(),
            Err(KeyError::FieldCount { found: 5, .. })
        ));
        assert!(matches!(
            "".parse::<CacheKey>(),
            Err(KeyError::FieldCount { found: 1, .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_fields() {
        assert_eq!(
            "review:store:0:10".parse::<CacheKey>(),
            Err(KeyError::InvalidField {
                field: "partition",
                value: "store".to_string()
            })
        );
        assert!(matches!(
            "review:1:-1:10".parse::<CacheKey>(),
            Err(KeyError::InvalidField { field: "offset", .. })
        ));
    }

    #[test]
    fn rejects_ambiguous_namespaces() {
        assert_eq!(CacheKey::new("", 1, 0, 10), Err(KeyError::EmptyNamespace));
        assert!(matches!(
            CacheKey::new("a:b", 1, 0, 10),
            Err(KeyError::DelimiterInNamespace { .. })
        ));
        assert!(matches!(
            ":1:0:10".parse::<CacheKey>(),
            Err(KeyError::EmptyNamespace)
        ));
    }

    #[test]
    fn distinct_queries_never_collide() {
        let keys = [
            CacheKey::new("review", 1, 0, 10).unwrap(),
            CacheKey::new("review", 2, 0, 10).unwrap(),
            CacheKey::new("review", 1, 10, 10).unwrap(),
            CacheKey::new("review", 1, 0, 20).unwrap(),
            CacheKey::new("appeal", 1, 0, 10).unwrap(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
                assert_ne!(a.to_string(), b.to_string());
            }
        }
    }
}
