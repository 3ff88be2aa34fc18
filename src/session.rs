use std::collections::HashMap;

use crate::config::HarnessConfig;
use crate::error::SnapResult;

/// Bounded pool of reusable capture pixmaps, keyed by dimensions.
///
/// Borrow/release happens once per capture, so hash lookup cost is irrelevant.
pub(crate) struct SurfacePool {
    max_surfaces_per_bucket: usize,
    buckets: HashMap<(u16, u16), Vec<vello_cpu::Pixmap>>,
    retained: usize,
}

impl SurfacePool {
    pub(crate) fn new() -> Self {
        Self {
            max_surfaces_per_bucket: 4,
            buckets: HashMap::new(),
            retained: 0,
        }
    }

    pub(crate) fn borrow(&mut self, width: u16, height: u16) -> vello_cpu::Pixmap {
        if let Some(p) = self
            .buckets
            .get_mut(&(width, height))
            .and_then(|b| b.pop())
        {
            self.retained -= 1;
            return p;
        }
        vello_cpu::Pixmap::new(width, height)
    }

    pub(crate) fn release(&mut self, pixmap: vello_cpu::Pixmap) {
        let key = (pixmap.width(), pixmap.height());
        let bucket = self.buckets.entry(key).or_default();
        if bucket.len() >= self.max_surfaces_per_bucket {
            return;
        }
        bucket.push(pixmap);
        self.retained += 1;
    }

    pub(crate) fn retained(&self) -> usize {
        self.retained
    }

    pub(crate) fn drain(&mut self) {
        self.buckets.clear();
        self.retained = 0;
    }
}

/// Process-scoped shared state for a harness run.
///
/// Owns the immutable [`HarnessConfig`] plus the resources fixtures share
/// across tests (currently the capture pixmap pool). Create one at session
/// start, hand `&mut Session` to each fixture in turn, and drop it at session
/// end. The harness itself is single-threaded per test; a host runner that
/// parallelizes tests gives each worker its own `Session`.
pub struct Session {
    config: HarnessConfig,
    pub(crate) pool: SurfacePool,
}

impl Session {
    pub fn new(config: HarnessConfig) -> SnapResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pool: SurfacePool::new(),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Replace the configuration and drop pooled resources.
    ///
    /// Test-isolation hook: gives a later test group a clean slate without
    /// relying on process-global initialization order.
    pub fn reset_with(&mut self, config: HarnessConfig) -> SnapResult<()> {
        config.validate()?;
        self.config = config;
        self.pool.drain();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;

    #[test]
    fn pool_reuses_released_surfaces() {
        let mut pool = SurfacePool::new();
        let a = pool.borrow(8, 8);
        pool.release(a);
        assert_eq!(pool.retained(), 1);
        let _b = pool.borrow(8, 8);
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn pool_honors_bucket_cap() {
        let mut pool = SurfacePool::new();
        let borrowed: Vec<_> = (0..6).map(|_| pool.borrow(4, 4)).collect();
        for p in borrowed {
            pool.release(p);
        }
        assert_eq!(pool.retained(), 4);
    }

    #[test]
    fn reset_swaps_config_and_drains_pool() {
        let mut s = Session::new(HarnessConfig::new(RunMode::GenerateOnly, "out", "refs")).unwrap();
        let p = s.pool.borrow(8, 8);
        s.pool.release(p);
        assert_eq!(s.pool.retained(), 1);

        s.reset_with(HarnessConfig::new(RunMode::GenerateOnly, "out2", "refs2"))
            .unwrap();
        assert_eq!(s.pool.retained(), 0);
        assert_eq!(s.config().output_dir.to_str(), Some("out2"));
    }
}
