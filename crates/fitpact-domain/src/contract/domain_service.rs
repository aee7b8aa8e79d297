use rust_decimal::Decimal;

/// The fixed per-day penalty and the indivisible leftover of a deposit
/// split into thirds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltySplit {
    pub violation_penalty: Decimal,
    pub remainder: Decimal,
}

/// Penalty arithmetic for the "thirds" scheme.
/// Pure domain logic without infrastructure dependencies.
pub struct PenaltyPolicy;

impl PenaltyPolicy {
    pub const PENALTY_DIVISOR: u32 = 3;

    /// Split a deposit amount into the flat per-violation penalty and the
    /// remainder. Computed exactly once, at contract creation: the split
    /// satisfies `violation_penalty * 3 + remainder == amount` with no
    /// rounding loss, so replaying every possible penalty never drifts
    /// from the original amount.
    pub fn split(amount: Decimal) -> PenaltySplit {
        let divisor = Decimal::from(Self::PENALTY_DIVISOR);
        let violation_penalty = (amount / divisor).floor();
        let remainder = amount - violation_penalty * divisor;
        PenaltySplit {
            violation_penalty,
            remainder,
        }
    }
}
