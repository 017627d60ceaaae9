//! # Concurrency
//!
//! Shared domains under concurrent budget traffic, and extraction from one
//! projection on many threads.

#[cfg(test)]
mod tests {
    use crate::fixtures::{merge, ramp};
    use conservation_runtime::{
        BoundaryRegion, ConservationApi, ConservationRuntime, ProjectionKind,
        RuntimeConfigBuilder,
    };
    use std::thread;

    #[test]
    fn test_concurrent_alloc_release_balances() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let domain = runtime.create_domain(4096, 50)?;

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        if runtime.budget_alloc(&domain, 1).is_ok() {
                            runtime.budget_release(&domain, 1).ok();
                        }
                    }
                });
            }
        });

        assert_eq!(domain.budget(), 50);
        let snapshot = runtime.metrics();
        assert_eq!(snapshot.budget_allocations, snapshot.budget_releases);
        assert_eq!(snapshot.budget_allocations, 8000);
        Ok(())
    }

    #[test]
    fn test_concurrent_allocs_never_overdraw() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let domain = runtime.create_domain(4096, 95)?;

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let _ = runtime.budget_alloc(&domain, 1);
                    }
                });
            }
        });

        let snapshot = runtime.metrics();
        assert_eq!(snapshot.budget_allocations, 95);
        assert_eq!(snapshot.budget_rejections, 400 - 95);
        assert_eq!(domain.budget(), 0);
        Ok(())
    }

    #[test]
    fn test_threads_extract_from_shared_projection() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(16 * 1024);
        let projection = runtime.create_projection(ProjectionKind::Linear, &data)?;
        let regions = BoundaryRegion::partition(data.len(), 32)?;

        let mut shards = thread::scope(|s| {
            let handles: Vec<_> = regions
                .chunks(8)
                .map(|chunk| {
                    let projection = &projection;
                    let runtime = &runtime;
                    s.spawn(move || {
                        chunk
                            .iter()
                            .map(|r| runtime.extract(projection, r))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_default())
                .collect::<Result<Vec<_>, _>>()
        })?;

        assert_eq!(shards.len(), 32);
        assert_eq!(runtime.metrics().shards_extracted, 32);
        shards.reverse();
        assert_eq!(merge(&runtime, shards)?, data);
        Ok(())
    }

    #[test]
    fn test_parallel_batch_matches_sequential() -> anyhow::Result<()> {
        let data = ramp(32 * 1024);
        let regions = BoundaryRegion::partition(data.len(), 64)?;

        let sequential = ConservationRuntime::with_config(
            RuntimeConfigBuilder::new()
                .parallel_extraction_threshold(usize::MAX)
                .build()?,
        )?;
        let parallel = ConservationRuntime::with_config(
            RuntimeConfigBuilder::new()
                .parallel_extraction_threshold(1)
                .build()?,
        )?;

        let a = sequential.create_projection(ProjectionKind::Linear, &data)?;
        let b = parallel.create_projection(ProjectionKind::Linear, &data)?;
        let seq = sequential.extract_batch(&a, &regions).into_shards();
        let par = parallel.extract_batch(&b, &regions).into_shards();

        assert_eq!(seq.len(), 64);
        assert_eq!(seq, par);
        Ok(())
    }
}
