//! Persisted per-torrent health records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::health::Classification;

/// Timestamp of a health check.
///
/// Keeps the text it was read from so an untouched record is written back
/// byte-for-byte. Accepts RFC 3339 and naive ISO-8601 (read as UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastChecked {
    at: DateTime<Utc>,
    raw: String,
}

impl LastChecked {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            raw: at.to_rfc3339_opts(SecondsFormat::Micros, true),
            at,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let at = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            dt.with_timezone(&Utc)
        } else {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))?
                .and_utc()
        };

        Ok(Self {
            at,
            raw: raw.to_string(),
        })
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for LastChecked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for LastChecked {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for LastChecked {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        LastChecked::parse(&raw).map_err(de::Error::custom)
    }
}

/// Health record for one torrent, keyed by info hash in [`HealthState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentHealthRecord {
    /// Display name, for logs only.
    #[serde(default)]
    pub name: String,
    /// `None` means never checked.
    #[serde(default)]
    pub last_checked: Option<LastChecked>,
    #[serde(default)]
    pub last_seeder_count: u32,
    #[serde(default)]
    pub last_classification: Option<Classification>,
    /// Fields this version does not know about, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-classification counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub critical: usize,
    pub rare: usize,
    pub low: usize,
    pub healthy: usize,
    /// Records without a (known) classification.
    pub unknown: usize,
}

impl Distribution {
    pub fn add(&mut self, classification: Option<Classification>) {
        match classification {
            Some(Classification::Critical) => self.critical += 1,
            Some(Classification::Rare) => self.rare += 1,
            Some(Classification::Low) => self.low += 1,
            Some(Classification::Healthy) => self.healthy += 1,
            None => self.unknown += 1,
        }
    }

    pub fn get(&self, classification: Classification) -> usize {
        match classification {
            Classification::Critical => self.critical,
            Classification::Rare => self.rare,
            Classification::Low => self.low,
            Classification::Healthy => self.healthy,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.rare + self.low + self.healthy + self.unknown
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CRITICAL={} RARE={} LOW={} HEALTHY={} UNKNOWN={}",
            self.critical, self.rare, self.low, self.healthy, self.unknown
        )
    }
}

/// All health records, as persisted under the top-level `torrents` key.
///
/// Entries for torrents removed from the client are never purged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    #[serde(default)]
    pub torrents: BTreeMap<String, TorrentHealthRecord>,
    /// Other top-level keys (e.g. `last_full_run`), kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hash: &str) -> Option<&TorrentHealthRecord> {
        self.torrents.get(hash)
    }

    pub fn len(&self) -> usize {
        self.torrents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.torrents.is_empty()
    }

    /// When `hash` was last checked, if ever.
    pub fn last_checked(&self, hash: &str) -> Option<DateTime<Utc>> {
        self.torrents
            .get(hash)
            .and_then(|r| r.last_checked.as_ref())
            .map(LastChecked::at)
    }

    /// Store the outcome of a check, keeping any unknown fields of an existing record.
    pub fn record_check(
        &mut self,
        hash: &str,
        name: &str,
        seeder_count: u32,
        classification: Classification,
        now: DateTime<Utc>,
    ) {
        let record = self
            .torrents
            .entry(hash.to_string())
            .or_insert_with(|| TorrentHealthRecord {
                name: String::new(),
                last_checked: None,
                last_seeder_count: 0,
                last_classification: None,
                extra: Map::new(),
            });

        record.name = name.to_string();
        record.last_checked = Some(LastChecked::new(now));
        record.last_seeder_count = seeder_count;
        record.last_classification = Some(classification);
    }

    /// Classification counts over the records of the given hashes.
    ///
    /// Hashes without a record are not counted.
    pub fn distribution<'a, I>(&self, hashes: I) -> Distribution
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut distribution = Distribution::default();
        for hash in hashes {
            if let Some(record) = self.torrents.get(hash) {
                distribution.add(record.last_classification);
            }
        }
        distribution
    }
}
