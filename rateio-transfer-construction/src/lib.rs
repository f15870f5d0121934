#![warn(clippy::uninlined_format_args)]

mod model;

use indexmap::IndexMap;
use std::hash::Hash;
use thiserror::Error;

pub use model::{Matching, Payment, PersonBalance, Residual};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchingError {
    #[error("Balance {0} cannot be negated without overflow")]
    BalanceOverflow(i64),
    #[error("Merging balance {0} into an earlier entry for the same id overflows")]
    MergeOverflow(i64),
}

/// Matches debtors against creditors greedily, in the order they were given.
///
/// The current first debtor always pays the current first creditor
/// `min(debt, credit)`; whichever side reaches zero moves on to the next one.
/// Repeated ids are merged into a single balance at their first position, and
/// zero balances are treated as settled.
///
/// Produces at most `debtors + creditors - 1` payments. If the input does not
/// sum to zero, the leftover on the side that was not exhausted is reported in
/// [`Residual`] and no payment is invented for it.
pub fn match_in_order<Id>(
    people: impl IntoIterator<Item = PersonBalance<Id>>,
) -> Result<Matching<Id>, MatchingError>
where
    Id: Copy + Eq + Hash,
{
    let mut merged: IndexMap<Id, i64> = IndexMap::new();
    for person in people {
        let entry = merged.entry(person.id).or_insert(0);
        *entry = entry
            .checked_add(person.balance)
            .ok_or(MatchingError::MergeOverflow(person.balance))?;
    }

    let mut debtors: Vec<(Id, i64)> = Vec::new();
    let mut creditors: Vec<(Id, i64)> = Vec::new();
    for (&id, &balance) in &merged {
        if balance < 0 {
            let debt = balance
                .checked_neg()
                .ok_or(MatchingError::BalanceOverflow(balance))?;
            debtors.push((id, debt));
        } else if balance > 0 {
            creditors.push((id, balance));
        }
    }

    let debtor_count = debtors.len();
    let creditor_count = creditors.len();
    let mut payments = Vec::with_capacity((debtor_count + creditor_count).saturating_sub(1));
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let (debtor, debt) = debtors[d];
        let (creditor, credit) = creditors[c];
        let amount = debt.min(credit);

        if amount > 0 {
            payments.push(Payment {
                from: debtor,
                to: creditor,
                amount,
            });
        }

        debtors[d].1 -= amount;
        creditors[c].1 -= amount;
        if debtors[d].1 == 0 {
            d += 1;
        }
        if creditors[c].1 == 0 {
            c += 1;
        }
    }

    let residual = Residual {
        unmatched_debt: debtors[d..].iter().map(|&(_, debt)| i128::from(debt)).sum(),
        unmatched_credit: creditors[c..]
            .iter()
            .map(|&(_, credit)| i128::from(credit))
            .sum(),
    };

    Ok(Matching {
        payments,
        residual,
        debtor_count,
        creditor_count,
    })
}
