#![warn(clippy::uninlined_format_args)]

pub mod model;
pub mod services;

pub use model::{
    Expense, Ledger, LedgerWarning, MatchingResidual, Money, Participant, ParticipantId,
    ParticipantTotals, Settlement, Share, TotalsReport, Transfer, TransferPlan,
};
pub use services::{
    BalanceCalculator, RoundingMode, SettlementCalculator, SettlementContext, SettlementError,
    SplitError, SplitPolicy,
};
