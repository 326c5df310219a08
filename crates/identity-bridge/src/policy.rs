//! Cross-match decision
//!
//! Authorized iff both sides resolved and their normalized emails are equal.
//! Normalization (trim, lowercase) happens once, in [`IdentityAttribute::parse`];
//! comparison here is exact.

use crate::types::{Decision, DenialReason, IdentityAttribute};

/// Pure, total decision function over the two resolved attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPolicy;

impl MatchPolicy {
    /// Decide from the provider-side and commerce-side attributes
    ///
    /// Absence on either side is a denial, never a wildcard.
    pub fn decide(
        provider: Option<&IdentityAttribute>,
        commerce: Option<&IdentityAttribute>,
    ) -> Decision {
        match (provider, commerce) {
            (None, _) => Decision::Unauthorized(DenialReason::IdentityUnresolved),
            (Some(_), None) => Decision::Unauthorized(DenialReason::RecordUnresolved),
            (Some(a), Some(b)) if a.as_str() == b.as_str() => Decision::Authorized,
            (Some(_), Some(_)) => Decision::Unauthorized(DenialReason::Mismatch),
        }
    }
}
