//! # Conservation Domain
//!
//! Budget-tracked wrapper around a caller-owned byte buffer.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──attach──▶ Attached ──commit──▶ Committed
//!                       │  ▲                  │
//!                       └──┘ verify (read)    └─ verify still legal
//! ```
//!
//! The buffer is borrowed for `'buf`; dropping the domain never touches it.
//!
//! ## Budget
//!
//! The budget is a residue mod K behind a `parking_lot::Mutex`, so
//! allocation and release take `&self` and are serialized across threads.
//! Release wraps around instead of failing: a release can never be
//! rejected, at the cost of not telling "just under capacity" apart from
//! "over and wrapped".

use super::errors::{ConservationError, Result};
use super::invariants::{invariant_budget_residue, CANONICAL_RESIDUE, CONSERVATION_MODULUS};
use crate::adapters::ModularOracle;
use crate::ports::outbound::ChecksumOracle;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Domain state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DomainState {
    /// Created, no buffer bound yet.
    #[default]
    Created,
    /// Buffer bound.
    Attached,
    /// Durable; no further structural changes.
    Committed,
}

impl DomainState {
    /// Check if transition to next state is valid.
    pub fn can_transition_to(&self, next: DomainState) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Attached) | (Self::Attached, Self::Committed)
        )
    }

    /// Whether a buffer is bound in this state.
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::Attached | Self::Committed)
    }
}

/// Isolated, budget-tracked view over a caller-owned buffer.
pub struct ConservationDomain<'buf> {
    size: usize,
    budget: Mutex<u8>,
    state: DomainState,
    buffer: Option<&'buf [u8]>,
    oracle: Arc<dyn ChecksumOracle>,
}

impl<'buf> ConservationDomain<'buf> {
    /// Create a domain of `size` bytes with `initial_budget` in `[0, K)`.
    pub fn create(size: usize, initial_budget: u8) -> Result<Self> {
        Self::with_oracle(size, initial_budget, Arc::new(ModularOracle))
    }

    /// Create a domain that checks conservation through `oracle`.
    pub fn with_oracle(
        size: usize,
        initial_budget: u8,
        oracle: Arc<dyn ChecksumOracle>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(ConservationError::InvalidArgument(
                "domain size must be non-zero".to_string(),
            ));
        }
        if !invariant_budget_residue(initial_budget) {
            return Err(ConservationError::InvalidArgument(format!(
                "initial budget {} outside [0, {})",
                initial_budget, CONSERVATION_MODULUS
            )));
        }

        debug!(size, initial_budget, "[conservation] Domain created");

        Ok(Self {
            size,
            budget: Mutex::new(initial_budget),
            state: DomainState::Created,
            buffer: None,
            oracle,
        })
    }

    fn transition_to(&mut self, next: DomainState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ConservationError::StateViolation(format!(
                "{:?} -> {:?}",
                self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Bind the domain to `buffer` without copying. Legal exactly once.
    ///
    /// The buffer must be exactly `size` bytes.
    pub fn attach(&mut self, buffer: &'buf [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Err(ConservationError::InvalidArgument(
                "cannot attach an empty buffer".to_string(),
            ));
        }
        if self.state.is_attached() {
            return Err(ConservationError::StateViolation(
                "domain already attached".to_string(),
            ));
        }
        if buffer.len() != self.size {
            return Err(ConservationError::InvalidArgument(format!(
                "buffer length {} does not match domain size {}",
                buffer.len(),
                self.size
            )));
        }

        self.transition_to(DomainState::Attached)?;
        self.buffer = Some(buffer);
        debug!(size = self.size, "[conservation] Domain attached");
        Ok(())
    }

    /// Whether the attached buffer satisfies the conservation invariant.
    ///
    /// Read-only; calling it twice without mutation gives the same answer.
    pub fn verify(&self) -> Result<bool> {
        let buffer = self.attached_buffer()?;
        Ok(self.oracle.residue(buffer) == CANONICAL_RESIDUE)
    }

    /// Like [`verify`](Self::verify), but a non-conserved buffer is an error.
    pub fn check(&self) -> Result<()> {
        let buffer = self.attached_buffer()?;
        let residue = self.oracle.residue(buffer);
        if residue != CANONICAL_RESIDUE {
            return Err(ConservationError::ConservationViolation { residue });
        }
        Ok(())
    }

    /// Mark the domain durable. A second commit is a hard error.
    pub fn commit(&mut self) -> Result<()> {
        match self.state {
            DomainState::Created => Err(ConservationError::StateViolation(
                "cannot commit an unattached domain".to_string(),
            )),
            DomainState::Committed => Err(ConservationError::StateViolation(
                "domain already committed".to_string(),
            )),
            DomainState::Attached => {
                self.transition_to(DomainState::Committed)?;
                debug!(size = self.size, "[conservation] Domain committed");
                Ok(())
            }
        }
    }

    /// Take `amount` from the budget.
    pub fn budget_alloc(&self, amount: u8) -> Result<()> {
        check_amount(amount)?;

        let mut budget = self.budget.lock();
        if *budget < amount {
            debug!(
                requested = amount,
                available = *budget,
                "[conservation] Budget allocation rejected"
            );
            return Err(ConservationError::BudgetExceeded {
                requested: amount,
                available: *budget,
            });
        }
        *budget = (*budget - amount) % CONSERVATION_MODULUS;
        Ok(())
    }

    /// Return `amount` to the budget, wrapping mod K. Never rejected for
    /// capacity.
    pub fn budget_release(&self, amount: u8) -> Result<()> {
        check_amount(amount)?;

        let mut budget = self.budget.lock();
        let wrapped = (u16::from(*budget) + u16::from(amount)) % u16::from(CONSERVATION_MODULUS);
        *budget = wrapped as u8;
        Ok(())
    }

    /// Current budget residue.
    pub fn budget(&self) -> u8 {
        *self.budget.lock()
    }

    /// Requested size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DomainState {
        self.state
    }

    /// Whether a buffer is bound.
    pub fn is_attached(&self) -> bool {
        self.state.is_attached()
    }

    /// Whether the domain has been committed.
    pub fn is_committed(&self) -> bool {
        self.state == DomainState::Committed
    }

    /// The attached buffer, if any.
    pub fn buffer(&self) -> Option<&'buf [u8]> {
        self.buffer
    }

    /// Release the wrapper. The caller's buffer is untouched.
    pub fn destroy(self) {
        debug!(size = self.size, state = ?self.state, "[conservation] Domain destroyed");
    }

    fn attached_buffer(&self) -> Result<&'buf [u8]> {
        self.buffer.ok_or_else(|| {
            ConservationError::InvalidArgument("domain has no attached buffer".to_string())
        })
    }
}

impl fmt::Debug for ConservationDomain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConservationDomain")
            .field("size", &self.size)
            .field("budget", &self.budget())
            .field("state", &self.state)
            .finish()
    }
}

fn check_amount(amount: u8) -> Result<()> {
    if amount >= CONSERVATION_MODULUS {
        return Err(ConservationError::InvalidArgument(format!(
            "budget amount {} outside [0, {})",
            amount, CONSERVATION_MODULUS
        )));
    }
    Ok(())
}
