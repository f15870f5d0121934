/// Net balance of each person in atomic units (e.g., cents).
/// Positive: is owed money (creditor). Negative: owes money (debtor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonBalance<Id = u64> {
    pub id: Id,
    pub balance: i64,
}

/// A single suggested payment: `from` pays `amount` atomic units to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment<Id = u64> {
    pub from: Id,
    pub to: Id,
    pub amount: i64,
}

/// Atomic units left on either side once one side of the matching ran out.
///
/// Both are zero whenever the input balances summed to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Residual {
    pub unmatched_debt: i128,
    pub unmatched_credit: i128,
}

impl Residual {
    pub fn is_zero(&self) -> bool {
        self.unmatched_debt == 0 && self.unmatched_credit == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matching<Id = u64> {
    pub payments: Vec<Payment<Id>>,
    pub residual: Residual,
    pub debtor_count: usize,
    pub creditor_count: usize,
}
