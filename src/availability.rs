//! Availability state from currently open injuries
//!
//! A decision table evaluated fresh on every call, first match wins:
//!
//! 1. Any open injury with an HIA/concussion flag, RTP stage off-field, or
//!    Severe severity: **Out**
//! 2. Any open injury with RTP stage modified or non-contact, or Moderate
//!    severity: **Modified**
//! 3. Otherwise (including no injuries): **Healthy**

use crate::models::{InjuryRecord, RtpStage, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AvailabilityState {
    Healthy,
    Modified,
    Out,
}

impl fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityState::Healthy => write!(f, "Healthy"),
            AvailabilityState::Modified => write!(f, "Modified"),
            AvailabilityState::Out => write!(f, "Out"),
        }
    }
}

impl AvailabilityState {
    pub fn description(&self) -> &'static str {
        match self {
            AvailabilityState::Healthy => "Available for full training and selection",
            AvailabilityState::Modified => "Available for modified training only",
            AvailabilityState::Out => "Unavailable for training or selection",
        }
    }
}

fn rules_out(injury: &InjuryRecord) -> bool {
    injury.is_head_impact()
        || injury.rtp_stage == RtpStage::OffField
        || injury.severity == Severity::Severe
}

fn restricts(injury: &InjuryRecord) -> bool {
    matches!(injury.rtp_stage, RtpStage::Modified | RtpStage::NonContact)
        || injury.severity == Severity::Moderate
}

/// Classify availability. Closed injuries are ignored.
pub fn classify_availability(injuries: &[InjuryRecord]) -> AvailabilityState {
    let open: Vec<&InjuryRecord> = injuries.iter().filter(|i| i.is_open()).collect();

    if open.iter().any(|i| rules_out(i)) {
        AvailabilityState::Out
    } else if open.iter().any(|i| restricts(i)) {
        AvailabilityState::Modified
    } else {
        AvailabilityState::Healthy
    }
}

/// The open injury that determined a non-Healthy state
pub fn limiting_injury(injuries: &[InjuryRecord]) -> Option<&InjuryRecord> {
    let open = || injuries.iter().filter(|i| i.is_open());

    open()
        .find(|i| rules_out(i))
        .or_else(|| open().find(|i| restricts(i)))
}
