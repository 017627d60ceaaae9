//! # Domain Lifecycle
//!
//! Create, attach, verify and commit a domain, spend and return budget,
//! and witness the buffer it guards.

#[cfg(test)]
mod tests {
    use crate::fixtures::ramp;
    use conservation_runtime::{
        Blake3Fingerprint, ConservationApi, ConservationError, ConservationRuntime, DomainState,
        ErrorKind, RunningReductionFingerprint,
    };
    use std::sync::Arc;

    #[test]
    fn test_full_lifecycle() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(4096);

        let mut domain = runtime.create_domain(data.len(), 42)?;
        assert_eq!(domain.state(), DomainState::Created);

        domain.attach(&data)?;
        assert!(runtime.verify_domain(&domain)?);
        domain.check()?;

        runtime.budget_alloc(&domain, 40)?;
        runtime.budget_release(&domain, 40)?;
        assert_eq!(domain.budget(), 42);

        domain.commit()?;
        assert!(domain.is_committed());
        assert_eq!(domain.buffer(), Some(&data[..]));
        domain.destroy();

        assert_eq!(data, ramp(4096));
        Ok(())
    }

    #[test]
    fn test_budget_exhaustion() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let domain = runtime.create_domain(64, 10)?;

        let err = runtime.budget_alloc(&domain, 11).unwrap_err();
        assert_eq!(
            err,
            ConservationError::BudgetExceeded {
                requested: 11,
                available: 10
            }
        );
        assert!(err.is_recoverable());
        assert_eq!(domain.budget(), 10);

        runtime.budget_alloc(&domain, 10)?;
        assert_eq!(domain.budget(), 0);
        assert_eq!(
            runtime.budget_alloc(&domain, 1).unwrap_err().kind(),
            ErrorKind::BudgetExceeded
        );
        Ok(())
    }

    #[test]
    fn test_release_wraps_mod_96() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let domain = runtime.create_domain(1, 90)?;
        runtime.budget_release(&domain, 10)?;
        assert_eq!(domain.budget(), 4);
        Ok(())
    }

    #[test]
    fn test_conservation_idempotence() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        for data in [ramp(4096), vec![1, 2, 3], vec![96; 7]] {
            let mut domain = runtime.create_domain(data.len(), 0)?;
            domain.attach(&data)?;
            let first = domain.verify()?;
            let second = domain.verify()?;
            assert_eq!(first, second);
        }
        Ok(())
    }

    #[test]
    fn test_illegal_transitions() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(256);
        let other = ramp(256);

        let mut domain = runtime.create_domain(256, 0)?;
        assert_eq!(domain.commit().unwrap_err().kind(), ErrorKind::StateViolation);
        assert_eq!(domain.verify().unwrap_err().kind(), ErrorKind::InvalidArgument);

        domain.attach(&data)?;
        assert_eq!(
            domain.attach(&other).unwrap_err().kind(),
            ErrorKind::StateViolation
        );

        domain.commit()?;
        assert_eq!(domain.commit().unwrap_err().kind(), ErrorKind::StateViolation);

        // Budget stays usable after commit.
        runtime.budget_alloc(&domain, 0)?;
        Ok(())
    }

    #[test]
    fn test_attach_size_mismatch() -> anyhow::Result<()> {
        let runtime = ConservationRuntime::new();
        let data = ramp(100);
        let mut domain = runtime.create_domain(256, 0)?;
        assert_eq!(
            domain.attach(&data).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(domain.state(), DomainState::Created);
        Ok(())
    }

    #[test]
    fn test_create_rejects_bad_arguments() {
        let runtime = ConservationRuntime::new();
        assert!(runtime.create_domain(0, 0).is_err());
        assert!(runtime.create_domain(16, 96).is_err());
        assert_eq!(runtime.metrics().domains_created, 0);
    }

    #[test]
    fn test_witness_detects_tampering() -> anyhow::Result<()> {
        let data = ramp(4096);
        for runtime in [
            ConservationRuntime::new(),
            ConservationRuntime::new().with_fingerprint(Arc::new(Blake3Fingerprint)),
            ConservationRuntime::new().with_fingerprint(Arc::new(RunningReductionFingerprint)),
        ] {
            let witness = runtime.generate_witness(&data)?;
            runtime.verify_witness(&witness, &data)?;

            let mut tampered = data.clone();
            tampered[1234] = tampered[1234].wrapping_add(1);
            let err = runtime.verify_witness(&witness, &tampered).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::WitnessMismatch, "{}", runtime.fingerprint_name());

            let err = runtime.verify_witness(&witness, &data[..4095]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::WitnessMismatch);
        }
        Ok(())
    }

    #[test]
    fn test_empty_witness_rejected() {
        let runtime = ConservationRuntime::new();
        let err = runtime.generate_witness(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
