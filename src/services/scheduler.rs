use std::time::Duration;

use tracing::{debug, info};

use crate::cache::QueryCache;

/// Periodically evicts cache entries that have not been read within the
/// cache's gc time.
pub struct CacheSweeper {
    cache: QueryCache,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(cache: QueryCache, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Runs forever; spawn it.
    pub async fn start(self) {
        info!("Starting cache sweeper (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;
            self.run_sweep().await;
        }
    }

    pub async fn run_sweep(&self) -> usize {
        let evicted = self.cache.sweep().await;
        if evicted > 0 {
            info!("Cache sweep evicted {} idle queries", evicted);
        } else {
            debug!("Cache sweep found nothing to evict");
        }
        evicted
    }
}
