//! The review document model and the "reviews of a store" listing.
//!
//! The search index is fed by a change-data-capture pipeline that writes
//! every integer column as a decimal string, while documents indexed by hand
//! carry plain JSON numbers. [`ReviewRecord`] accepts both.

use std::{fmt::Display, str::FromStr, sync::Arc};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, de};
use tokio_util::sync::CancellationToken;

use crate::{
    error::PageError,
    reader::{PageReader, PageReaderConfig},
    store::{CacheStore, SearchBackend},
};

/// One review as indexed for listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(default, deserialize_with = "lenient_int")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub version: i32,
    #[serde(deserialize_with = "lenient_int")]
    pub review_id: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub score: i32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub service_score: i32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub express_score: i32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub has_media: i32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub order_id: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub sku_id: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub spu_id: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub store_id: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub user_id: i64,
    #[serde(default, deserialize_with = "lenient_int")]
    pub anonymous: i32,
    #[serde(default)]
    pub pic_info: Option<String>,
    #[serde(default)]
    pub video_info: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub status: i32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub is_default: i32,
    #[serde(default, deserialize_with = "lenient_int")]
    pub has_reply: i32,
    #[serde(with = "datetime")]
    pub create_at: NaiveDateTime,
    #[serde(with = "datetime")]
    pub update_at: NaiveDateTime,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrText<T> {
    Int(T),
    Text(String),
}

/// Accepts `7` as well as `"7"`.
fn lenient_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match IntOrText::<T>::deserialize(deserializer)? {
        IntOrText::Int(value) => Ok(value),
        IntOrText::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// `YYYY-MM-DD HH:MM:SS`, no zone.
mod datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, FORMAT).map_err(de::Error::custom)
    }
}

/// Lists the reviews of a store, one page at a time.
///
/// A [`PageReader`] over [`ReviewRecord`]s partitioned by `store_id`.
#[derive(Clone)]
pub struct ReviewLister {
    reader: PageReader<ReviewRecord>,
}

impl ReviewLister {
    /// A lister with the default configuration: namespace and index
    /// `review`, partition field `store_id`, five minute TTL.
    pub fn new(cache: Arc<dyn CacheStore>, search: Arc<dyn SearchBackend>) -> Self {
        Self::with_config(cache, search, PageReaderConfig::default())
    }

    pub fn with_config(
        cache: Arc<dyn CacheStore>,
        search: Arc<dyn SearchBackend>,
        config: PageReaderConfig,
    ) -> Self {
        Self {
            reader: PageReader::new(cache, search, config),
        }
    }

    pub fn reader(&self) -> &PageReader<ReviewRecord> {
        &self.reader
    }

    /// See [`PageReader::fetch_page`].
    pub async fn list_by_store(
        &self,
        store_id: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ReviewRecord>, PageError> {
        self.reader.fetch_page(store_id, offset, limit).await
    }

    /// See [`PageReader::fetch_page_cancellable`].
    pub async fn list_by_store_cancellable(
        &self,
        store_id: i64,
        offset: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReviewRecord>, PageError> {
        self.reader
            .fetch_page_cancellable(store_id, offset, limit, cancel)
            .await
    }
}
