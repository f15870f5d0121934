pub mod balance_calculator;
pub mod settlement_calculator;
pub mod settlement_context;
pub mod split_policy;

pub use balance_calculator::BalanceCalculator;
pub use settlement_calculator::SettlementCalculator;
pub use settlement_context::{RoundingMode, SettlementContext, SettlementError};
pub use split_policy::{SplitError, SplitPolicy};
