//! # Properties
//!
//! Randomized checks of the round-trip, budget and fingerprint laws.

#[cfg(test)]
mod tests {
    use crate::fixtures::{conserved_random, merge, shuffled, split};
    use conservation_runtime::{
        residue_of, ConservationApi, ConservationPolicy, ConservationRuntime, RuntimeConfigBuilder,
        Witness,
    };
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lenient_runtime() -> ConservationRuntime {
        let config = RuntimeConfigBuilder::new()
            .conservation_policy(ConservationPolicy::Warn)
            .build()
            .expect("valid config");
        ConservationRuntime::with_config(config).expect("valid runtime")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_round_trip_any_order(
            data in prop::collection::vec(any::<u8>(), 1..4096),
            parts in 1usize..32,
            seed in any::<u64>(),
        ) {
            let parts = parts.min(data.len());
            let runtime = lenient_runtime();
            let shards = split(&runtime, &data, parts).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let rebuilt = merge(&runtime, shuffled(shards, &mut rng)).unwrap();
            prop_assert_eq!(rebuilt, data);
        }

        #[test]
        fn test_strict_round_trip_of_conserved_buffers(
            len in 1usize..4096,
            parts in 1usize..16,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let data = conserved_random(len, &mut rng);
            prop_assert_eq!(residue_of(&data), 0);

            let runtime = ConservationRuntime::new();
            let shards = split(&runtime, &data, parts.min(len)).unwrap();
            let rebuilt = merge(&runtime, shuffled(shards, &mut rng)).unwrap();
            prop_assert_eq!(rebuilt, data);
        }

        #[test]
        fn test_alloc_then_release_restores_budget(budget in 0u8..96, amount in 0u8..96) {
            let runtime = ConservationRuntime::new();
            let domain = runtime.create_domain(1, budget).unwrap();
            if amount <= budget {
                runtime.budget_alloc(&domain, amount).unwrap();
                runtime.budget_release(&domain, amount).unwrap();
            } else {
                prop_assert!(runtime.budget_alloc(&domain, amount).is_err());
            }
            prop_assert_eq!(domain.budget(), budget);
        }

        #[test]
        fn test_budget_stays_in_range(ops in prop::collection::vec((any::<bool>(), 0u8..96), 0..64)) {
            let runtime = ConservationRuntime::new();
            let domain = runtime.create_domain(1, 0).unwrap();
            for (alloc, amount) in ops {
                let _ = if alloc {
                    runtime.budget_alloc(&domain, amount)
                } else {
                    runtime.budget_release(&domain, amount)
                };
                prop_assert!(domain.budget() < 96);
            }
        }

        #[test]
        fn test_witness_catches_single_byte_change(
            data in prop::collection::vec(any::<u8>(), 1..1024),
            index in any::<prop::sample::Index>(),
            delta in 1u8..=255,
        ) {
            let witness = Witness::generate(&data).unwrap();
            prop_assert!(witness.verify(&data));

            let mut tampered = data.clone();
            let i = index.index(tampered.len());
            tampered[i] = tampered[i].wrapping_add(delta);
            prop_assert!(!witness.verify(&tampered));
        }

        #[test]
        fn test_residue_is_sum_mod_96(data in prop::collection::vec(any::<u8>(), 0..2048)) {
            let expected = (data.iter().map(|&b| b as u64).sum::<u64>() % 96) as u8;
            prop_assert_eq!(residue_of(&data), expected);
        }
    }
}
