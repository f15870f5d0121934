use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use crate::services::{BalanceCalculator, SettlementCalculator, SettlementContext, SettlementError};

/// Exact decimal amount of currency. Never binary floating point.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// `Money::new(1234, 2)` is `12.34`.
    pub fn new(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    pub fn from_i64(value: i64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn signum(self) -> i64 {
        if self.0.is_zero() {
            0
        } else if self.0.is_sign_negative() {
            -1
        } else {
            1
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Opaque participant identifier assigned by the ledger source.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Display only; not assumed unique.
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(id),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub participant_id: ParticipantId,
    pub amount: Money,
}

impl Share {
    pub fn new(participant_id: impl Into<String>, amount: Money) -> Self {
        Self {
            participant_id: ParticipantId::new(participant_id),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub total_amount: Money,
    pub payer_id: ParticipantId,
    #[serde(default)]
    pub shares: Vec<Share>,
}

impl Expense {
    pub fn shares_sum(&self) -> Money {
        self.shares.iter().map(|share| share.amount).sum()
    }

    /// `shares_sum - total_amount`; positive when the shares over-allocate.
    pub fn share_discrepancy(&self) -> Money {
        self.shares_sum() - self.total_amount
    }

    pub fn is_balanced(&self, tolerance: Money) -> bool {
        self.share_discrepancy().abs() <= tolerance
    }
}

/// Snapshot of everything the ledger source knows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl Ledger {
    pub fn new(participants: Vec<Participant>, expenses: Vec<Expense>) -> Self {
        Self {
            participants,
            expenses,
        }
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id.as_str() == id)
    }

    pub fn totals(&self) -> TotalsReport<'_> {
        BalanceCalculator::default().compute_totals(&self.participants, &self.expenses)
    }

    /// Totals, transfers, warnings and matching residue in one pass.
    pub fn settle(&self, context: SettlementContext) -> Result<Settlement<'_>, SettlementError> {
        let TotalsReport { totals, warnings } = self.totals();
        let TransferPlan {
            transfers,
            residual,
        } = SettlementCalculator.compute_transfers(&totals, context)?;

        Ok(Settlement {
            totals,
            transfers,
            warnings,
            residual,
            context,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantTotals<'a> {
    pub participant_id: &'a ParticipantId,
    pub total_paid: Money,
    pub total_owed: Money,
    /// `total_paid - total_owed`. Positive: is owed money.
    pub net_balance: Money,
}

impl<'a> ParticipantTotals<'a> {
    pub fn new(participant_id: &'a ParticipantId, total_paid: Money, total_owed: Money) -> Self {
        Self {
            participant_id,
            total_paid,
            total_owed,
            net_balance: total_paid - total_owed,
        }
    }

    pub fn is_creditor(&self) -> bool {
        self.net_balance.signum() > 0
    }

    pub fn is_debtor(&self) -> bool {
        self.net_balance.signum() < 0
    }
}

/// `from` owes `to` the `amount`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transfer<'a> {
    pub from: &'a ParticipantId,
    pub to: &'a ParticipantId,
    pub amount: Money,
}

/// Something in the ledger the engine skipped or could not reconcile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerWarning<'a> {
    UnknownPayer {
        expense_id: &'a str,
        payer_id: &'a ParticipantId,
        amount: Money,
    },
    UnknownShareParticipant {
        expense_id: &'a str,
        participant_id: &'a ParticipantId,
        amount: Money,
    },
    UnbalancedExpense {
        expense_id: &'a str,
        total: Money,
        shares_sum: Money,
    },
    NegativeAmount {
        expense_id: &'a str,
        amount: Money,
    },
    /// A later participant reuses an earlier id; both entries get the same totals.
    DuplicateParticipant { participant_id: &'a ParticipantId },
}

impl LedgerWarning<'_> {
    pub fn is_unknown_reference(&self) -> bool {
        matches!(
            self,
            LedgerWarning::UnknownPayer { .. } | LedgerWarning::UnknownShareParticipant { .. }
        )
    }
}

impl fmt::Display for LedgerWarning<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerWarning::UnknownPayer {
                expense_id,
                payer_id,
                amount,
            } => write!(
                f,
                "expense '{expense_id}': payer '{payer_id}' is not a participant; {amount} ignored"
            ),
            LedgerWarning::UnknownShareParticipant {
                expense_id,
                participant_id,
                amount,
            } => write!(
                f,
                "expense '{expense_id}': share for '{participant_id}' is not a participant; {amount} ignored"
            ),
            LedgerWarning::UnbalancedExpense {
                expense_id,
                total,
                shares_sum,
            } => write!(
                f,
                "expense '{expense_id}': shares add up to {shares_sum} but the total is {total}"
            ),
            LedgerWarning::NegativeAmount { expense_id, amount } => {
                write!(f, "expense '{expense_id}': negative amount {amount}")
            }
            LedgerWarning::DuplicateParticipant { participant_id } => {
                write!(f, "participant id '{participant_id}' is used more than once")
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TotalsReport<'a> {
    /// One entry per participant, in participant order.
    pub totals: Vec<ParticipantTotals<'a>>,
    pub warnings: Vec<LedgerWarning<'a>>,
}

impl TotalsReport<'_> {
    pub fn unknown_reference_count(&self) -> usize {
        self.warnings
            .iter()
            .filter(|warning| warning.is_unknown_reference())
            .count()
    }

    pub fn net_sum(&self) -> Money {
        self.totals.iter().map(|t| t.net_balance).sum()
    }
}

/// Amount the matching could not pair up; zero for a zero-sum ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchingResidual {
    pub unmatched_debt: Money,
    pub unmatched_credit: Money,
}

impl MatchingResidual {
    pub fn is_zero(&self) -> bool {
        self.unmatched_debt.is_zero() && self.unmatched_credit.is_zero()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferPlan<'a> {
    pub transfers: Vec<Transfer<'a>>,
    pub residual: MatchingResidual,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settlement<'a> {
    pub totals: Vec<ParticipantTotals<'a>>,
    pub transfers: Vec<Transfer<'a>>,
    pub warnings: Vec<LedgerWarning<'a>>,
    pub residual: MatchingResidual,
    /// Atomic unit the transfers were matched in.
    pub context: SettlementContext,
}

impl<'a> Settlement<'a> {
    /// Net balances, rounded to the atomic unit, once every suggested transfer
    /// has been paid. Only the residual is left over.
    pub fn balances_after_transfers(
        &self,
    ) -> Result<IndexMap<&'a ParticipantId, Money>, SettlementError> {
        let mut balances: IndexMap<&'a ParticipantId, Money> = IndexMap::new();
        for t in &self.totals {
            *balances.entry(t.participant_id).or_insert(Money::ZERO) +=
                self.context.quantize(t.net_balance)?;
        }
        for transfer in &self.transfers {
            *balances.entry(transfer.from).or_insert(Money::ZERO) += transfer.amount;
            *balances.entry(transfer.to).or_insert(Money::ZERO) -= transfer.amount;
        }
        Ok(balances)
    }

    /// No transfers are needed and nothing was left unmatched.
    pub fn is_settled(&self) -> bool {
        self.transfers.is_empty() && self.residual.is_zero()
    }
}
