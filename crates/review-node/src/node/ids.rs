use std::io::Write;

use anyhow::bail;
use chrono::{DateTime, SecondsFormat, Utc};
use review_id::{IdGenerator, LockSnowflakeGenerator, SnowflakeId, WallClock};
use serde::Serialize;

use super::config::NodeConfig;

/// One ID and the fields packed into it, printed as a JSON line.
#[derive(Debug, Serialize)]
struct DecodedId {
    id: SnowflakeId,
    /// Same ID as a string, for JSON consumers without 64-bit integers.
    #[serde(with = "review_id::as_string_snow")]
    id_str: SnowflakeId,
    timestamp_ms: i64,
    minted_at: Option<String>,
    datacenter_id: i64,
    worker_id: i64,
    sequence: i64,
}

impl From<SnowflakeId> for DecodedId {
    fn from(id: SnowflakeId) -> Self {
        let timestamp_ms = id.timestamp_millis();
        Self {
            id,
            id_str: id,
            timestamp_ms,
            minted_at: DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            datacenter_id: id.datacenter_id(),
            worker_id: id.worker_id(),
            sequence: id.sequence(),
        }
    }
}

fn print(out: &mut impl Write, id: SnowflakeId) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, &DecodedId::from(id))?;
    writeln!(out)?;
    Ok(())
}

pub fn mint(config: &NodeConfig, count: usize, out: &mut impl Write) -> anyhow::Result<()> {
    let generator = LockSnowflakeGenerator::new(config.worker_id, config.datacenter_id, WallClock)?;
    for id in generator.next_ids(count) {
        print(out, id)?;
    }
    tracing::info!(count, "minted IDs");
    Ok(())
}

pub fn decode(raw: i64, out: &mut impl Write) -> anyhow::Result<()> {
    let id = SnowflakeId::from_raw(raw);
    if !id.is_valid() {
        bail!("{raw} is not a review ID: the sign bit is set");
    }
    print(out, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::config::Command;
    use review_cache::PageReaderConfig;
    use review_id::REVIEW_EPOCH;
    use serde_json::{Value, json};

    fn lines(out: &[u8]) -> Vec<Value> {
        std::str::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn decode_prints_all_fields() {
        let id = SnowflakeId::from_components(1_000, 3, 17, 42);
        let mut out = Vec::new();
        decode(id.to_raw(), &mut out).unwrap();

        assert_eq!(
            lines(&out),
            vec![json!({
                "id": id.to_raw(),
                "id_str": id.to_raw().to_string(),
                "timestamp_ms": REVIEW_EPOCH + 1_000,
                "minted_at": "2023-01-01T00:00:01.000Z",
                "datacenter_id": 3,
                "worker_id": 17,
                "sequence": 42,
            })]
        );
    }

    #[test]
    fn decode_rejects_negative_values() {
        let mut out = Vec::new();
        assert!(decode(-5, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn mint_embeds_configured_identifiers() {
        let config = NodeConfig {
            worker_id: 9,
            datacenter_id: 2,
            reader: PageReaderConfig::default(),
            command: Command::Mint { count: 5 },
        };
        let mut out = Vec::new();
        mint(&config, 5, &mut out).unwrap();

        let minted = lines(&out);
        assert_eq!(minted.len(), 5);
        let ids: Vec<i64> = minted.iter().map(|line| line["id"].as_i64().unwrap()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(minted.iter().all(|line| line["worker_id"] == 9 && line["datacenter_id"] == 2));
    }
}
