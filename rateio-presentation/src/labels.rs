pub const PARTICIPANT: &str = "Participant";
pub const PAID: &str = "Paid";
pub const OWED: &str = "Owed";
pub const BALANCE: &str = "Balance";
pub const FROM: &str = "From";
pub const TO: &str = "To";
pub const AMOUNT: &str = "Amount";
pub const ALL_SETTLED: &str = "Everyone is settled up.";
pub const NO_SETTLING_TRANSFERS: &str = "No transfers can settle the remaining balances.";
pub const NO_EXPENSES: &str = "No expenses recorded yet.";
pub const UNMATCHED_DEBT: &str = "Unmatched debt";
pub const UNMATCHED_CREDIT: &str = "Unmatched credit";
