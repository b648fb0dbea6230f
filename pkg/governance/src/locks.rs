use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One exclusive section per zone.
///
/// Placement checks are only recommendations; holding a zone's guard across
/// the check and the VDC write makes the pair atomic with respect to every
/// other caller that also takes the guard.
#[derive(Clone, Default)]
pub struct ZoneLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ZoneLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the guard of `zone_id`.
    pub async fn lock(&self, zone_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(zone_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_zone_is_exclusive() {
        let locks = ZoneLocks::new();
        let guard = locks.lock("z1").await;

        let contender = locks.clone();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), async move { contender.lock("z1").await })
                .await;
        assert!(blocked.is_err());

        drop(guard);
        let _again = locks.lock("z1").await;
    }

    #[tokio::test]
    async fn different_zones_do_not_contend() {
        let locks = ZoneLocks::new();
        let _a = locks.lock("z1").await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock("z2")).await;
        assert!(b.is_ok());
    }
}
