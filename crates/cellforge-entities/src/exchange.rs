//! Peer-to-peer energy transfer between two entities.
//!
//! A transfer is eligible when the donor holds more than `donor_min` and the
//! recipient holds less than `recipient_max`. The amount moved is
//! `min(donor.energy * share_ratio, max_share)`. Ineligible pairs are a
//! normal outcome, reported as [`TransferResult::Ineligible`] rather than
//! as an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use cellforge_types::Energy;

use crate::entity::Entity;

/// Why a transfer did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibleTransfer {
    /// The donor is at or below the donor floor.
    SourceTooLow {
        /// Donor energy at the time of the attempt.
        energy: f64,
    },
    /// The recipient is at or above the recipient ceiling.
    TargetTooHigh {
        /// Recipient energy at the time of the attempt.
        energy: f64,
    },
    /// Donor and recipient are the same entity.
    SameEntity,
}

impl core::fmt::Display for IneligibleTransfer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SourceTooLow { energy } => write!(f, "source energy {energy:.3} too low"),
            Self::TargetTooHigh { energy } => write!(f, "target energy {energy:.3} too high"),
            Self::SameEntity => f.write_str("source and target are the same entity"),
        }
    }
}

/// Outcome of [`ExchangePolicy::transfer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferResult {
    /// Energy moved from source to target.
    Transferred {
        /// Amount moved.
        amount: f64,
        /// Source energy afterwards.
        source_energy: Energy,
        /// Target energy afterwards.
        target_energy: Energy,
    },
    /// Nothing moved.
    Ineligible(IneligibleTransfer),
}

impl TransferResult {
    /// Returns `true` if energy moved.
    pub const fn is_transferred(&self) -> bool {
        matches!(self, Self::Transferred { .. })
    }
}

/// Thresholds and share size for energy exchange. Lives under the
/// `exchange` key of the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExchangePolicy {
    /// Donor energy must be strictly above this (default: 0.3).
    pub donor_min: f64,
    /// Recipient energy must be strictly below this (default: 0.5).
    pub recipient_max: f64,
    /// Fraction of donor energy offered (default: 0.2).
    pub share_ratio: f64,
    /// Upper bound on a single transfer (default: 0.2).
    pub max_share: f64,
}

impl Default for ExchangePolicy {
    fn default() -> Self {
        Self {
            donor_min: 0.3,
            recipient_max: 0.5,
            share_ratio: 0.2,
            max_share: 0.2,
        }
    }
}

impl ExchangePolicy {
    /// Whether `energy` qualifies an entity as a donor.
    pub fn can_donate(&self, energy: Energy) -> bool {
        energy.value() > self.donor_min
    }

    /// Whether `energy` qualifies an entity as a recipient.
    pub fn can_receive(&self, energy: Energy) -> bool {
        energy.value() < self.recipient_max
    }

    /// Amount a donor at `energy` would give.
    pub fn share_for(&self, energy: Energy) -> f64 {
        (energy.value() * self.share_ratio).min(self.max_share).max(0.0)
    }

    /// Check a pair without moving anything.
    pub fn check(&self, source: Energy, target: Energy) -> Result<f64, IneligibleTransfer> {
        if !self.can_donate(source) {
            return Err(IneligibleTransfer::SourceTooLow {
                energy: source.value(),
            });
        }
        if !self.can_receive(target) {
            return Err(IneligibleTransfer::TargetTooHigh {
                energy: target.value(),
            });
        }
        Ok(self.share_for(source))
    }

    /// Move energy from `source` to `target` if the pair is eligible.
    ///
    /// Never fails; status changes are left to the caller.
    pub fn transfer(&self, source: &mut Entity, target: &mut Entity) -> TransferResult {
        if source.id() == target.id() {
            return TransferResult::Ineligible(IneligibleTransfer::SameEntity);
        }

        let amount = match self.check(source.energy(), target.energy()) {
            Ok(amount) => amount,
            Err(reason) => {
                debug!(
                    source = %source.id(),
                    target = %target.id(),
                    %reason,
                    "Energy transfer skipped"
                );
                return TransferResult::Ineligible(reason);
            }
        };

        let source_energy = source.energy().saturating_sub(amount);
        let target_energy = target.energy().saturating_add(amount);
        source.set_energy(source_energy);
        target.set_energy(target_energy);

        debug!(
            source = %source.id(),
            target = %target.id(),
            amount,
            source_energy = source_energy.value(),
            target_energy = target_energy.value(),
            "Energy transferred"
        );

        TransferResult::Transferred {
            amount,
            source_energy,
            target_energy,
        }
    }

    /// Name of the first field holding an unusable value, if any.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("donor_min", self.donor_min),
            ("recipient_max", self.recipient_max),
            ("share_ratio", self.share_ratio),
            ("max_share", self.max_share),
        ]
        .into_iter()
        .find(|(_, value)| !(value.is_finite() && (0.0..=1.0).contains(value)))
        .map(|(name, _)| name)
    }
}
