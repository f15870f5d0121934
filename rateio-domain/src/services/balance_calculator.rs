use crate::model::{Expense, LedgerWarning, Money, Participant, ParticipantTotals, TotalsReport};
use fxhash::FxHashSet;
use indexmap::IndexMap;

/// Per-participant paid/owed/net totals over a ledger snapshot.
pub struct BalanceCalculator {
    /// Largest `|shares - total|` an expense may show before it is reported as unbalanced.
    pub share_tolerance: Money,
}

impl Default for BalanceCalculator {
    fn default() -> Self {
        Self {
            share_tolerance: Money::new(1, 2),
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Accumulated {
    paid: Money,
    owed: Money,
}

impl BalanceCalculator {
    /// Sums what each participant paid and owes across `expenses`.
    ///
    /// Returns one entry per participant in input order. Payers and shares that
    /// reference unknown ids are left out of every total and reported as warnings.
    pub fn compute_totals<'a>(
        &self,
        participants: &'a [Participant],
        expenses: &'a [Expense],
    ) -> TotalsReport<'a> {
        tracing::debug!(
            participant_count = participants.len(),
            expense_count = expenses.len(),
            "Computing participant totals"
        );

        let mut accumulated: IndexMap<&'a str, Accumulated> = participants
            .iter()
            .map(|p| (p.id.as_str(), Accumulated::default()))
            .collect();
        let mut warnings = Vec::new();

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for participant in participants {
            if !seen.insert(participant.id.as_str()) {
                warnings.push(LedgerWarning::DuplicateParticipant {
                    participant_id: &participant.id,
                });
            }
        }

        for expense in expenses {
            let expense_id = expense.id.as_str();

            if expense.total_amount.is_negative() {
                warnings.push(LedgerWarning::NegativeAmount {
                    expense_id,
                    amount: expense.total_amount,
                });
            }

            match accumulated.get_mut(expense.payer_id.as_str()) {
                Some(entry) => entry.paid += expense.total_amount,
                None => warnings.push(LedgerWarning::UnknownPayer {
                    expense_id,
                    payer_id: &expense.payer_id,
                    amount: expense.total_amount,
                }),
            }

            for share in &expense.shares {
                if share.amount.is_negative() {
                    warnings.push(LedgerWarning::NegativeAmount {
                        expense_id,
                        amount: share.amount,
                    });
                }
                match accumulated.get_mut(share.participant_id.as_str()) {
                    Some(entry) => entry.owed += share.amount,
                    None => warnings.push(LedgerWarning::UnknownShareParticipant {
                        expense_id,
                        participant_id: &share.participant_id,
                        amount: share.amount,
                    }),
                }
            }

            if !expense.is_balanced(self.share_tolerance) {
                warnings.push(LedgerWarning::UnbalancedExpense {
                    expense_id,
                    total: expense.total_amount,
                    shares_sum: expense.shares_sum(),
                });
            }
        }

        for warning in &warnings {
            tracing::warn!(
                unknown_reference = warning.is_unknown_reference(),
                "{warning}"
            );
        }

        let totals = participants
            .iter()
            .map(|participant| {
                let Accumulated { paid, owed } = accumulated
                    .get(participant.id.as_str())
                    .copied()
                    .unwrap_or_default();
                ParticipantTotals::new(&participant.id, paid, owed)
            })
            .collect();

        TotalsReport { totals, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{ParticipantId, Share},
        services::SettlementContext,
    };
    use rstest::{fixture, rstest};

    #[fixture]
    fn calculator() -> BalanceCalculator {
        BalanceCalculator::default()
    }

    fn people(ids: &[&str]) -> Vec<Participant> {
        ids.iter()
            .map(|id| Participant::new(*id, id.to_uppercase()))
            .collect()
    }

    fn expense(id: &str, total: i64, payer: &str, shares: &[(&str, i64)]) -> Expense {
        Expense {
            id: id.to_owned(),
            description: String::new(),
            total_amount: Money::new(total, 2),
            payer_id: ParticipantId::from(payer),
            shares: shares
                .iter()
                .map(|(who, cents)| Share::new(*who, Money::new(*cents, 2)))
                .collect(),
        }
    }

    fn summary(report: &TotalsReport<'_>) -> Vec<(String, i64, i64, i64)> {
        let cents = |m: Money| {
            SettlementContext::cents()
                .to_atomic_units(m)
                .expect("test amounts fit in cents")
        };
        report
            .totals
            .iter()
            .map(|t| {
                (
                    t.participant_id.to_string(),
                    cents(t.total_paid),
                    cents(t.total_owed),
                    cents(t.net_balance),
                )
            })
            .collect()
    }

    #[rstest]
    #[case::even_dinner(
        &["a", "b", "c"],
        vec![expense("e1", 9000, "a", &[("a", 3000), ("b", 3000), ("c", 3000)])],
        vec![("a", 9000, 3000, 6000), ("b", 0, 3000, -3000), ("c", 0, 3000, -3000)]
    )]
    #[case::offsetting_expenses(
        &["a", "b"],
        vec![
            expense("e1", 5000, "a", &[("a", 2500), ("b", 2500)]),
            expense("e2", 5000, "b", &[("a", 2500), ("b", 2500)]),
        ],
        vec![("a", 5000, 5000, 0), ("b", 5000, 5000, 0)]
    )]
    #[case::custom_shares(
        &["a", "b", "c"],
        vec![expense("e1", 10000, "a", &[("a", 1000), ("b", 6000), ("c", 3000)])],
        vec![("a", 10000, 1000, 9000), ("b", 0, 6000, -6000), ("c", 0, 3000, -3000)]
    )]
    #[case::payer_not_sharing(
        &["a", "b"],
        vec![expense("e1", 4000, "a", &[("b", 4000)])],
        vec![("a", 4000, 0, 4000), ("b", 0, 4000, -4000)]
    )]
    #[case::repeated_share_entries_all_count(
        &["a", "b"],
        vec![expense("e1", 3000, "a", &[("b", 1000), ("b", 2000)])],
        vec![("a", 3000, 0, 3000), ("b", 0, 3000, -3000)]
    )]
    #[case::participant_without_expenses(
        &["a", "b", "z"],
        vec![expense("e1", 1000, "b", &[("a", 1000)])],
        vec![("a", 0, 1000, -1000), ("b", 1000, 0, 1000), ("z", 0, 0, 0)]
    )]
    fn totals_per_participant(
        calculator: BalanceCalculator,
        #[case] ids: &[&str],
        #[case] expenses: Vec<Expense>,
        #[case] expected: Vec<(&str, i64, i64, i64)>,
    ) {
        let participants = people(ids);
        let report = calculator.compute_totals(&participants, &expenses);

        let expected: Vec<(String, i64, i64, i64)> = expected
            .into_iter()
            .map(|(id, paid, owed, net)| (id.to_owned(), paid, owed, net))
            .collect();
        assert_eq!(summary(&report), expected);
        assert!(report.warnings.is_empty());
        assert!(report.net_sum().is_zero());
    }

    #[rstest]
    fn empty_ledger_yields_empty_totals(calculator: BalanceCalculator) {
        let report = calculator.compute_totals(&[], &[]);
        assert!(report.totals.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[rstest]
    fn unknown_share_participant_is_excluded_and_counted(calculator: BalanceCalculator) {
        let participants = people(&["a", "b"]);
        let expenses = vec![expense(
            "e1",
            9000,
            "a",
            &[("a", 3000), ("b", 3000), ("ghost", 3000)],
        )];

        let report = calculator.compute_totals(&participants, &expenses);

        assert_eq!(
            summary(&report),
            vec![
                ("a".to_owned(), 9000, 3000, 6000),
                ("b".to_owned(), 0, 3000, -3000),
            ]
        );
        assert_eq!(report.unknown_reference_count(), 1);
        assert_eq!(
            report.warnings,
            vec![LedgerWarning::UnknownShareParticipant {
                expense_id: "e1",
                participant_id: &expenses[0].shares[2].participant_id,
                amount: Money::new(3000, 2),
            }]
        );
        assert_eq!(report.net_sum(), Money::new(3000, 2));
    }

    #[rstest]
    fn unknown_payer_is_excluded_and_counted(calculator: BalanceCalculator) {
        let participants = people(&["a", "b"]);
        let expenses = vec![expense("e1", 2000, "ghost", &[("a", 1000), ("b", 1000)])];

        let report = calculator.compute_totals(&participants, &expenses);

        assert_eq!(
            summary(&report),
            vec![
                ("a".to_owned(), 0, 1000, -1000),
                ("b".to_owned(), 0, 1000, -1000),
            ]
        );
        assert_eq!(report.unknown_reference_count(), 1);
        assert!(matches!(
            report.warnings[0],
            LedgerWarning::UnknownPayer {
                expense_id: "e1",
                ..
            }
        ));
    }

    #[rstest]
    fn unbalanced_expense_propagates_and_is_reported(calculator: BalanceCalculator) {
        let participants = people(&["a", "b"]);
        let expenses = vec![expense("e1", 10000, "a", &[("a", 4000), ("b", 4000)])];

        let report = calculator.compute_totals(&participants, &expenses);

        assert_eq!(report.net_sum(), Money::new(2000, 2));
        assert_eq!(report.unknown_reference_count(), 0);
        assert_eq!(
            report.warnings,
            vec![LedgerWarning::UnbalancedExpense {
                expense_id: "e1",
                total: Money::new(10000, 2),
                shares_sum: Money::new(8000, 2),
            }]
        );
    }

    #[rstest]
    fn one_cent_drift_is_tolerated(calculator: BalanceCalculator) {
        let participants = people(&["a", "b", "c"]);
        let expenses = vec![expense(
            "e1",
            10000,
            "a",
            &[("a", 3333), ("b", 3333), ("c", 3333)],
        )];

        let report = calculator.compute_totals(&participants, &expenses);

        assert!(report.warnings.is_empty());
        assert_eq!(report.net_sum(), Money::new(1, 2));
    }

    #[rstest]
    fn duplicate_participant_ids_share_totals(calculator: BalanceCalculator) {
        let participants = vec![Participant::new("a", "Ana"), Participant::new("a", "Ana B")];
        let expenses = vec![expense("e1", 1000, "a", &[("a", 1000)])];

        let report = calculator.compute_totals(&participants, &expenses);

        assert_eq!(
            summary(&report),
            vec![("a".to_owned(), 1000, 1000, 0), ("a".to_owned(), 1000, 1000, 0)]
        );
        assert_eq!(
            report.warnings,
            vec![LedgerWarning::DuplicateParticipant {
                participant_id: &participants[1].id,
            }]
        );
    }

    #[rstest]
    fn computation_is_idempotent(calculator: BalanceCalculator) {
        let participants = people(&["a", "b", "c"]);
        let expenses = vec![
            expense("e1", 9000, "a", &[("a", 3000), ("b", 3000), ("c", 3000)]),
            expense("e2", 1200, "c", &[("b", 1200)]),
        ];

        let first = calculator.compute_totals(&participants, &expenses);
        let second = calculator.compute_totals(&participants, &expenses);
        assert_eq!(first, second);
    }
}
