//! Durable stores
//!
//! The membership store is an external collaborator; Signpost only
//! specifies its interface and ships a MongoDB implementation plus an
//! in-memory one for tests.

pub mod membership;

pub use membership::{
    MemberRecord, MembershipStore, MemoryMembershipStore, MongoMembershipStore,
};
