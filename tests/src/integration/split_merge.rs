//! # Split / Merge Flows
//!
//! Project a buffer, cut it into shards, ship them, and reassemble.
//!
//! 1. **Halves in reverse order**: the 4096-byte ramp split in two
//! 2. **Random arrival**: many shards, shuffled
//! 3. **Shipping**: shards serialized and deserialized before merge
//! 4. **Overlaps and gaps**: consistent overlaps merge, gaps fail
//! 5. **Injected oracle**: a non-default checksum oracle end to end

#[cfg(test)]
mod tests {
    use crate::fixtures::{merge, ramp, shuffled, split};
    use conservation_runtime::{
        BoundaryRegion, ChecksumOracle, ConservationApi, ConservationPolicy, ConservationRuntime,
        ErrorKind, ModularOracle, ProjectionKind, ReconstructionState, RuntimeConfigBuilder, Shard,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    /// Counts odd bytes.
    struct ParityOracle;

    impl ChecksumOracle for ParityOracle {
        fn classify(&self, byte: u8) -> u8 {
            byte % 2
        }
    }

    #[test]
    fn test_basic_split_merge_reverse_order() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(4096);
        let projection = runtime.create_projection(ProjectionKind::Linear, &data)?;

        let first = runtime.extract(&projection, &BoundaryRegion::new(0, 2048))?;
        let second = runtime.extract(&projection, &BoundaryRegion::new(2048, 4096))?;

        let mut ctx = runtime.begin_reconstruction(2)?;
        ctx.add_shard(second)?;
        ctx.add_shard(first)?;
        assert!(ctx.is_complete());

        let rebuilt = ctx.finalize(ProjectionKind::Linear)?;
        assert_eq!(rebuilt.data(), &data[..]);
        assert!(rebuilt.is_valid());
        Ok(())
    }

    #[test]
    fn test_injected_oracle_round_trip() -> anyhow::Result<()> {
        let config = RuntimeConfigBuilder::new()
            .conservation_policy(ConservationPolicy::Warn)
            .build()?;
        let runtime = ConservationRuntime::with_config(config)?.with_oracle(Arc::new(ParityOracle));
        let data = ramp(4096);
        let projection = runtime.create_projection(ProjectionKind::Linear, &data)?;
        // 2048 odd bytes, 2048 mod 96 = 32.
        assert_eq!(projection.residue(), 32);

        let head = runtime.extract(&projection, &BoundaryRegion::new(0, 10))?;
        assert_eq!(head.checksum(), 5);
        assert!(head.verify());
        assert!(!head.verify_with(&ModularOracle));

        let regions = BoundaryRegion::partition(data.len(), 4)?;
        let shards = regions
            .iter()
            .map(|region| runtime.extract(&projection, region))
            .collect::<Result<Vec<_>, _>>()?;
        // 512 odd bytes per quarter.
        for shard in &shards {
            assert_eq!(shard.checksum(), 32);
            assert!(shard.verify());
        }

        let mut ctx = runtime.begin_reconstruction(4)?;
        for shard in shards.into_iter().rev() {
            ctx.add_shard(shard)?;
        }
        let rebuilt = ctx.finalize(ProjectionKind::Linear)?;
        assert_eq!(rebuilt.data(), &data[..]);
        assert!(rebuilt.is_valid());
        assert_eq!(rebuilt.residue(), 32);

        let report = ctx.report().cloned().unwrap();
        assert_eq!(report.residue, 32);
        assert_eq!(report.cumulative_residue, 32);
        assert!(!report.conserved);
        Ok(())
    }

    #[test]
    fn test_random_arrival_order() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(64 * 1024);
        let mut rng = StdRng::seed_from_u64(7);

        for parts in [1, 3, 16, 100] {
            let shards = split(&runtime, &data, parts)?;
            let rebuilt = merge(&runtime, shuffled(shards, &mut rng))?;
            assert_eq!(rebuilt, data, "parts = {}", parts);
        }
        Ok(())
    }

    #[test]
    fn test_shipped_shards_reassemble() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(4096);
        let shards = split(&runtime, &data, 4)?;

        let wire: Vec<String> = shards
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<_, _>>()?;
        let received: Vec<Shard> = wire
            .iter()
            .rev()
            .map(|s| serde_json::from_str(s))
            .collect::<Result<_, _>>()?;

        assert_eq!(merge(&runtime, received)?, data);
        Ok(())
    }

    #[test]
    fn test_corrupted_in_transit_is_rejected() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(1024);
        let shards = split(&runtime, &data, 2)?;

        let mut json = serde_json::to_value(&shards[1])?;
        json["payload"][10] = serde_json::json!(0);
        let corrupted: Shard = serde_json::from_value(json)?;

        let mut ctx = runtime.begin_reconstruction(2)?;
        ctx.add_shard(shards[0].clone())?;
        let err = ctx.add_shard(corrupted).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!ctx.is_complete());
        Ok(())
    }

    #[test]
    fn test_overlapping_shards_from_one_source() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(2048);
        let projection = runtime.create_projection(ProjectionKind::Linear, &data)?;

        let regions = [
            BoundaryRegion::new(0, 900),
            BoundaryRegion::new(800, 1500),
            BoundaryRegion::new(1000, 1200),
            BoundaryRegion::new(1400, 2048),
        ];
        let batch = runtime.extract_batch(&projection, &regions);
        assert_eq!(batch.succeeded(), 4);

        let mut ctx = runtime.begin_reconstruction(4)?;
        for shard in batch.into_shards() {
            ctx.add_shard(shard)?;
        }
        let rebuilt = ctx.finalize(ProjectionKind::Linear)?;
        assert_eq!(rebuilt.data(), &data[..]);

        let report = ctx.report().cloned().unwrap();
        assert_eq!(report.overlap_pairs_checked, 3);
        assert_eq!(report.overlap_mismatches, 0);
        assert!(report.conserved);
        Ok(())
    }

    #[test]
    fn test_missing_shard_leaves_gap() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(4096);
        let mut shards = split(&runtime, &data, 4)?;
        shards.remove(2);

        let mut ctx = runtime.begin_reconstruction(3)?;
        for shard in shards {
            ctx.add_shard(shard)?;
        }
        let err = ctx.finalize(ProjectionKind::Linear).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReconstructionFailed);
        assert_eq!(ctx.state(), ReconstructionState::Failed);
        assert_eq!(runtime.metrics().reconstructions_failed, 1);
        Ok(())
    }

    #[test]
    fn test_malformed_region_keeps_projection_valid() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(4096);
        let projection = runtime.create_projection(ProjectionKind::Linear, &data)?;

        let inverted = BoundaryRegion {
            start_coord: 3000,
            end_coord: 1000,
            page_count: 8,
            region_class: 0,
            is_conserved: false,
        };
        let err = runtime.extract(&projection, &inverted).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BoundaryInvalid);
        assert!(projection.is_valid());

        let shard = runtime.extract(&projection, &BoundaryRegion::new(0, 4096))?;
        assert_eq!(shard.data(), &data[..]);
        assert_eq!(runtime.metrics().extraction_failures, 1);
        Ok(())
    }

    #[test]
    fn test_frequency_projection_round_trip() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(1024);
        let mut projection = runtime.create_projection(ProjectionKind::FrequencyDomain, &data)?;
        projection.transform_frequency(false)?;
        assert!(projection.spectrum().is_some());

        let regions = BoundaryRegion::partition(data.len(), 4)?;
        let shards = runtime.extract_batch(&projection, &regions).into_shards();
        assert!(shards
            .iter()
            .all(|s| s.source_kind() == ProjectionKind::FrequencyDomain));

        let mut ctx = runtime.begin_reconstruction(4)?;
        for shard in shards.into_iter().rev() {
            ctx.add_shard(shard)?;
        }
        let mut rebuilt = ctx.finalize(ProjectionKind::FrequencyDomain)?;
        assert_eq!(rebuilt.data(), &data[..]);

        rebuilt.transform_frequency(false)?;
        rebuilt.transform_frequency(true)?;
        assert!(rebuilt.spectrum().is_none());
        Ok(())
    }

    #[test]
    fn test_copy_data_truncates() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(512);
        let shard = split(&runtime, &data, 1)?.remove(0);

        let mut out = vec![0u8; 100];
        assert_eq!(shard.copy_data(&mut out)?, 100);
        assert_eq!(&out[..], &data[..100]);

        let mut out = vec![0u8; 1000];
        assert_eq!(shard.copy_data(&mut out)?, 512);
        assert_eq!(&out[..512], &data[..]);
        Ok(())
    }
}
