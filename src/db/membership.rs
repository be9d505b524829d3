//! Membership store - the durable record of who is authorized
//!
//! Two lookups and one write: exact lookup by numeric identity, loose
//! suffix match by phone number (inbound contact payloads vary in country
//! code and formatting), and binding an identity to a matched phone record
//! so later identity lookups succeed against the primary path.

use async_trait::async_trait;
use bson::doc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::{Result, SignpostError};

/// One membership record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Chat identity, absent until the member shares a contact
    pub member_id: Option<i64>,
    /// Phone number as stored, any formatting
    pub phone: String,
    /// Display name, informational only
    #[serde(default)]
    pub name: Option<String>,
}

/// Durable membership lookups and the phone-to-identity bind
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Exact lookup: is this identity a known member?
    async fn contains(&self, identity: i64) -> Result<bool>;

    /// Find a record whose phone ends with `phone_suffix` and bind
    /// `identity` to it. Returns false when nothing matched.
    async fn bind_phone(&self, phone_suffix: &str, identity: i64) -> Result<bool>;
}

// ============================================================================
// MongoDB implementation
// ============================================================================

/// Membership store backed by a MongoDB collection
pub struct MongoMembershipStore {
    members: mongodb::Collection<MemberRecord>,
}

impl MongoMembershipStore {
    const COLLECTION: &'static str = "members";

    /// Connect and verify reachability with a bounded server-selection wait
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        info!(db = db_name, "Connecting to membership store");

        // serverSelectionTimeoutMS keeps an unreachable MongoDB from hanging startup
        let timeout_uri = if uri.contains('?') {
            format!("{uri}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        } else {
            format!("{uri}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000")
        };

        let client = mongodb::Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| SignpostError::Database(format!("connect failed: {e}")))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| SignpostError::Database(format!("ping failed: {e}")))?;

        info!(db = db_name, collection = Self::COLLECTION, "Membership store connected");

        Ok(Self {
            members: client
                .database(db_name)
                .collection::<MemberRecord>(Self::COLLECTION),
        })
    }

    /// Anchored-suffix regex over the phone field; the suffix is digits
    /// from a contact payload, escaped defensively anyway
    fn suffix_filter(phone_suffix: &str) -> bson::Document {
        let escaped: String = phone_suffix
            .chars()
            .flat_map(|c| {
                if c.is_ascii_alphanumeric() {
                    vec![c]
                } else {
                    vec!['\\', c]
                }
            })
            .collect();
        doc! { "phone": { "$regex": format!("{escaped}$") } }
    }
}

#[async_trait]
impl MembershipStore for MongoMembershipStore {
    async fn contains(&self, identity: i64) -> Result<bool> {
        let found = self
            .members
            .find_one(doc! { "member_id": identity })
            .await
            .map_err(|e| SignpostError::Database(format!("identity lookup failed: {e}")))?;
        Ok(found.is_some())
    }

    async fn bind_phone(&self, phone_suffix: &str, identity: i64) -> Result<bool> {
        let result = self
            .members
            .update_one(
                Self::suffix_filter(phone_suffix),
                doc! { "$set": { "member_id": identity } },
            )
            .await
            .map_err(|e| SignpostError::Database(format!("phone bind failed: {e}")))?;

        let matched = result.matched_count > 0;
        debug!(
            identity = identity,
            matched = matched,
            "Phone suffix bind attempted"
        );
        Ok(matched)
    }
}

// ============================================================================
// In-memory implementation (tests, fixtures)
// ============================================================================

/// Membership store held in memory; used by tests and local fixtures
#[derive(Default)]
pub struct MemoryMembershipStore {
    records: RwLock<Vec<MemberRecord>>,
}

impl MemoryMembershipStore {
    pub fn new(records: Vec<MemberRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn contains(&self, identity: i64) -> Result<bool> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .any(|r| r.member_id == Some(identity)))
    }

    async fn bind_phone(&self, phone_suffix: &str, identity: i64) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.phone.ends_with(phone_suffix)) {
            Some(record) => {
                record.member_id = Some(identity);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
