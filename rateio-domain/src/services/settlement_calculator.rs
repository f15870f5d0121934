use crate::{
    model::{MatchingResidual, Money, ParticipantTotals, Transfer, TransferPlan},
    services::{SettlementContext, SettlementError},
};
use rateio_transfer_construction::{MatchingError, PersonBalance, match_in_order};
use rust_decimal::Decimal;

/// Settlement calculation service
pub struct SettlementCalculator;

impl SettlementCalculator {
    /// Suggests transfers that bring every net balance in `totals` to zero.
    ///
    /// Balances are rounded to the context's atomic unit first; anything that
    /// rounds to zero is settled. Debtors and creditors are paired in the order
    /// they appear in `totals`: the first open debtor pays the first open
    /// creditor as much as either can take, then the exhausted side advances.
    ///
    /// # Arguments
    /// * `totals` - Net balances, usually from [`crate::BalanceCalculator`]
    /// * `context` - Atomic unit and rounding mode
    ///
    /// # Returns
    /// The transfers, plus whatever could not be matched when the balances do
    /// not sum to zero. That leftover is logged and never paid to anyone.
    pub fn compute_transfers<'a>(
        &self,
        totals: &[ParticipantTotals<'a>],
        context: SettlementContext,
    ) -> Result<TransferPlan<'a>, SettlementError> {
        let context = context.validate()?;

        tracing::debug!(
            participant_count = totals.len(),
            scale = context.scale,
            rounding_mode = ?context.rounding_mode,
            "Settlement matching started"
        );

        // Indices keep ids with equal text from ever being merged or self-paired.
        let balances = totals
            .iter()
            .enumerate()
            .map(|(idx, t)| {
                context
                    .to_atomic_units(t.net_balance)
                    .map(|balance| PersonBalance { id: idx, balance })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let matching = match_in_order(balances).map_err(|err| match err {
            MatchingError::BalanceOverflow(units) | MatchingError::MergeOverflow(units) => context
                .from_atomic_units(units)
                .map_or_else(|err| err, SettlementError::AmountOutOfRange),
        })?;

        let transfers = matching
            .payments
            .iter()
            .map(|payment| {
                Ok(Transfer {
                    from: totals[payment.from].participant_id,
                    to: totals[payment.to].participant_id,
                    amount: context.from_atomic_units(payment.amount)?,
                })
            })
            .collect::<Result<Vec<Transfer<'a>>, SettlementError>>()?;

        let residual = MatchingResidual {
            unmatched_debt: residual_money(matching.residual.unmatched_debt, context),
            unmatched_credit: residual_money(matching.residual.unmatched_credit, context),
        };

        if !residual.is_zero() {
            tracing::warn!(
                unmatched_debt = %residual.unmatched_debt,
                unmatched_credit = %residual.unmatched_credit,
                transfer_count = transfers.len(),
                "Net balances do not sum to zero; leftover dropped from settlement"
            );
        }

        tracing::debug!(
            debtor_count = matching.debtor_count,
            creditor_count = matching.creditor_count,
            transfer_count = transfers.len(),
            "Settlement matching finished"
        );

        Ok(TransferPlan {
            transfers,
            residual,
        })
    }
}

fn residual_money(units: i128, context: SettlementContext) -> Money {
    // Saturates only past 96 bits of units, far beyond any i64 balance sum.
    Money::from_decimal(
        Decimal::try_from_i128_with_scale(units, context.scale).unwrap_or(Decimal::MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::ParticipantId, services::RoundingMode};
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    #[fixture]
    fn calculator() -> SettlementCalculator {
        SettlementCalculator
    }

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|name| ParticipantId::from(*name)).collect()
    }

    fn totals<'a>(ids: &'a [ParticipantId], nets: &[Money]) -> Vec<ParticipantTotals<'a>> {
        ids.iter()
            .zip(nets)
            .map(|(id, net)| ParticipantTotals::new(id, *net, Money::ZERO))
            .collect()
    }

    fn cents(values: &[i64]) -> Vec<Money> {
        values.iter().map(|v| Money::new(*v, 2)).collect()
    }

    fn as_tuples(plan: &TransferPlan<'_>) -> Vec<(String, String, Money)> {
        plan.transfers
            .iter()
            .map(|t| (t.from.to_string(), t.to.to_string(), t.amount))
            .collect()
    }

    #[rstest]
    #[case::even_dinner(
        &["a", "b", "c"],
        &[6000, -3000, -3000],
        vec![("b", "a", 3000), ("c", "a", 3000)]
    )]
    #[case::custom_shares(
        &["a", "b", "c"],
        &[9000, -6000, -3000],
        vec![("b", "a", 6000), ("c", "a", 3000)]
    )]
    #[case::all_settled(&["a", "b"], &[0, 0], vec![])]
    #[case::empty(&[], &[], vec![])]
    #[case::two_creditors_one_debtor(
        &["a", "b", "c"],
        &[-10000, 2500, 7500],
        vec![("a", "b", 2500), ("a", "c", 7500)]
    )]
    #[case::first_encountered_pairs_first(
        &["d1", "c1", "d2", "c2"],
        &[-1000, 9000, -9000, 1000],
        vec![("d1", "c1", 1000), ("d2", "c1", 8000), ("d2", "c2", 1000)]
    )]
    fn transfers_in_input_order(
        calculator: SettlementCalculator,
        #[case] names: &[&str],
        #[case] nets: &[i64],
        #[case] expected: Vec<(&str, &str, i64)>,
    ) {
        let ids = ids(names);
        let totals = totals(&ids, &cents(nets));

        let plan = calculator
            .compute_transfers(&totals, SettlementContext::cents())
            .expect("settlement should succeed");

        let expected: Vec<(String, String, Money)> = expected
            .into_iter()
            .map(|(from, to, amount)| (from.to_owned(), to.to_owned(), Money::new(amount, 2)))
            .collect();
        assert_eq!(as_tuples(&plan), expected);
        assert!(plan.residual.is_zero());
    }

    #[rstest]
    fn sub_cent_balances_are_settled(calculator: SettlementCalculator) {
        let ids = ids(&["a", "b"]);
        let nets = [
            Money::from_decimal(dec!(0.004)),
            Money::from_decimal(dec!(-0.004)),
        ];
        let totals = totals(&ids, &nets);

        let plan = calculator
            .compute_transfers(&totals, SettlementContext::cents())
            .expect("settlement should succeed");

        assert!(plan.transfers.is_empty());
        assert!(plan.residual.is_zero());
    }

    #[rstest]
    fn one_cent_leftover_is_dropped_not_paid(calculator: SettlementCalculator) {
        // 100.00 split 33.33 three ways leaves the payer one cent short of zero-sum.
        let ids = ids(&["a", "b", "c"]);
        let totals = totals(&ids, &cents(&[6667, -3333, -3333]));

        let plan = calculator
            .compute_transfers(&totals, SettlementContext::cents())
            .expect("settlement should succeed");

        assert_eq!(
            as_tuples(&plan),
            vec![
                ("b".to_owned(), "a".to_owned(), Money::new(3333, 2)),
                ("c".to_owned(), "a".to_owned(), Money::new(3333, 2)),
            ]
        );
        assert_eq!(
            plan.residual,
            MatchingResidual {
                unmatched_debt: Money::ZERO,
                unmatched_credit: Money::new(1, 2),
            }
        );
    }

    #[rstest]
    fn float_residue_is_rounded_before_matching(calculator: SettlementCalculator) {
        let ids = ids(&["a", "b", "c"]);
        let nets = [
            Money::from_decimal(dec!(66.666666666667)),
            Money::from_decimal(dec!(-33.333333333333)),
            Money::from_decimal(dec!(-33.333333333334)),
        ];
        let totals = totals(&ids, &nets);

        let plan = calculator
            .compute_transfers(&totals, SettlementContext::cents())
            .expect("settlement should succeed");

        assert_eq!(
            as_tuples(&plan),
            vec![
                ("b".to_owned(), "a".to_owned(), Money::new(3333, 2)),
                ("c".to_owned(), "a".to_owned(), Money::new(3333, 2)),
            ]
        );
        assert_eq!(plan.residual.unmatched_credit, Money::new(1, 2));
    }

    #[rstest]
    fn duplicate_ids_never_pay_themselves(calculator: SettlementCalculator) {
        let ids = ids(&["a", "a", "b"]);
        let totals = totals(&ids, &cents(&[-500, -500, 1000]));

        let plan = calculator
            .compute_transfers(&totals, SettlementContext::cents())
            .expect("settlement should succeed");

        assert_eq!(plan.transfers.len(), 2);
        assert!(plan.transfers.iter().all(|t| t.from != t.to));
    }

    #[rstest]
    fn whole_unit_context_matches_whole_units(calculator: SettlementCalculator) {
        let ids = ids(&["a", "b"]);
        let nets = [Money::from_decimal(dec!(10.5)), Money::from_decimal(dec!(-10.5))];
        let totals = totals(&ids, &nets);
        let context = SettlementContext {
            scale: 0,
            rounding_mode: RoundingMode::HalfEven,
        };

        let plan = calculator
            .compute_transfers(&totals, context)
            .expect("settlement should succeed");

        assert_eq!(
            as_tuples(&plan),
            vec![("b".to_owned(), "a".to_owned(), Money::from_i64(10))]
        );
    }

    #[rstest]
    fn rejects_unsupported_scale(calculator: SettlementCalculator) {
        let context = SettlementContext {
            scale: 30,
            ..SettlementContext::cents()
        };
        assert!(matches!(
            calculator.compute_transfers(&[], context),
            Err(SettlementError::UnsupportedScale { scale: 30, .. })
        ));
    }
}
