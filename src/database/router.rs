//! Read routing across the primary and its read replicas.
//!
//! Reads that tolerate staleness (directory search) pick a member of the read
//! set uniformly at random. There is no health tracking, retry or failover: a
//! dead member surfaces as a failed query to the caller. Writes and
//! membership checks must use [`ReplicaRouter::primary`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::DbPool;

/// Hit counters for routed reads. Shared by reference so several routers (or
/// a metrics exporter) can observe the same pair.
#[derive(Debug, Default)]
pub struct RouteCounters {
    primary: AtomicU64,
    replica: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStats {
    pub primary: u64,
    pub replica: u64,
    pub total: u64,
}

impl RouteCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, is_primary: bool) {
        if is_primary {
            self.primary.fetch_add(1, Ordering::Relaxed);
        } else {
            self.replica.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> RouteStats {
        let primary = self.primary.load(Ordering::Relaxed);
        let replica = self.replica.load(Ordering::Relaxed);
        RouteStats {
            primary,
            replica,
            total: primary + replica,
        }
    }
}

struct ReadMember {
    pool: DbPool,
    is_primary: bool,
}

/// The member chosen for one read.
pub struct ReadTarget<'a> {
    pub index: usize,
    pub is_primary: bool,
    pub pool: &'a DbPool,
}

pub struct ReplicaRouter {
    primary: DbPool,
    members: Vec<ReadMember>,
    counters: Arc<RouteCounters>,
}

impl ReplicaRouter {
    /// Builds the read set from the replicas, prepending the primary when
    /// `read_from_primary` is set. An empty set falls back to the primary.
    pub fn new(
        primary: DbPool,
        replicas: Vec<DbPool>,
        read_from_primary: bool,
        counters: Arc<RouteCounters>,
    ) -> Self {
        let mut members = Vec::with_capacity(replicas.len() + 1);
        if read_from_primary || replicas.is_empty() {
            members.push(ReadMember {
                pool: primary.clone(),
                is_primary: true,
            });
        }
        members.extend(replicas.into_iter().map(|pool| ReadMember {
            pool,
            is_primary: false,
        }));

        Self {
            primary,
            members,
            counters,
        }
    }

    /// Router with no replicas; every routed read lands on the primary.
    pub fn primary_only(primary: DbPool) -> Self {
        Self::new(primary, Vec::new(), true, Arc::new(RouteCounters::new()))
    }

    pub fn primary(&self) -> &DbPool {
        &self.primary
    }

    pub fn read_set_len(&self) -> usize {
        self.members.len()
    }

    pub fn pick(&self) -> ReadTarget<'_> {
        let index = rand::thread_rng().gen_range(0..self.members.len());
        let member = &self.members[index];
        self.counters.record(member.is_primary);
        ReadTarget {
            index,
            is_primary: member.is_primary,
            pool: &member.pool,
        }
    }

    /// Pool for a staleness-tolerant read.
    pub fn read(&self) -> &DbPool {
        self.pick().pool
    }

    pub fn stats(&self) -> RouteStats {
        self.counters.snapshot()
    }

    pub async fn close(&self) {
        self.primary.close().await;
        for member in self.members.iter().filter(|m| !m.is_primary) {
            member.pool.close().await;
        }
    }
}
