use crate::{
    model::{Money, ParticipantId, Share},
    services::{SettlementContext, SettlementError},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("No participants selected for the split")]
    NoParticipants,
    #[error("Participant '{0}' is not part of the split")]
    UnknownParticipant(ParticipantId),
    #[error("Fixed share {fixed} exceeds the expense total {total}")]
    FixedShareExceedsTotal { fixed: Money, total: Money },
    #[error("Remaining {remainder} has nobody left to be split among")]
    RemainderWithoutRecipients { remainder: Money },
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Builds share lists for an expense.
pub struct SplitPolicy;

impl SplitPolicy {
    /// Splits `total` evenly among `participants`, in atomic units.
    ///
    /// Leftover units go one each to the first participants, so the shares
    /// always add up to exactly `total` (rounded to the atomic unit).
    pub fn even(
        total: Money,
        participants: &[ParticipantId],
        context: SettlementContext,
    ) -> Result<Vec<Share>, SplitError> {
        if participants.is_empty() {
            return Err(SplitError::NoParticipants);
        }
        let units = context.to_atomic_units(total)?;
        distribute(units, participants, context)
    }

    /// Pins `fixed_id` to `fixed_amount` and splits what is left of `total`
    /// evenly among the other participants.
    pub fn with_fixed_share(
        total: Money,
        participants: &[ParticipantId],
        fixed_id: &ParticipantId,
        fixed_amount: Money,
        context: SettlementContext,
    ) -> Result<Vec<Share>, SplitError> {
        if participants.is_empty() {
            return Err(SplitError::NoParticipants);
        }
        if !participants.contains(fixed_id) {
            return Err(SplitError::UnknownParticipant(fixed_id.clone()));
        }

        let total_units = context.to_atomic_units(total)?;
        let fixed_units = context.to_atomic_units(fixed_amount)?;
        if fixed_units > total_units {
            return Err(SplitError::FixedShareExceedsTotal {
                fixed: fixed_amount,
                total,
            });
        }

        let others: Vec<ParticipantId> = participants
            .iter()
            .filter(|id| *id != fixed_id)
            .cloned()
            .collect();
        let remainder_units = total_units - fixed_units;
        if others.is_empty() && remainder_units != 0 {
            return Err(SplitError::RemainderWithoutRecipients {
                remainder: context.from_atomic_units(remainder_units)?,
            });
        }

        let fixed_share = context.from_atomic_units(fixed_units)?;
        let mut other_shares = distribute(remainder_units, &others, context)?.into_iter();
        let mut fixed_emitted = false;
        let shares = participants
            .iter()
            .filter_map(|id| {
                if id != fixed_id {
                    return other_shares.next();
                }
                if fixed_emitted {
                    return None;
                }
                fixed_emitted = true;
                Some(Share {
                    participant_id: id.clone(),
                    amount: fixed_share,
                })
            })
            .collect();

        Ok(shares)
    }
}

fn distribute(
    units: i64,
    members: &[ParticipantId],
    context: SettlementContext,
) -> Result<Vec<Share>, SplitError> {
    if members.is_empty() {
        return Ok(Vec::new());
    }

    let member_count = members.len() as i64;
    let base = units / member_count;
    let remainder = (units % member_count).unsigned_abs() as usize;
    let step = units.signum();

    members
        .iter()
        .enumerate()
        .map(|(idx, member)| -> Result<Share, SplitError> {
            let mut share = base;
            if idx < remainder {
                share += step;
            }
            Ok(Share {
                participant_id: member.clone(),
                amount: context.from_atomic_units(share)?,
            })
        })
        .collect()
}
