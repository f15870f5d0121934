use crate::{
    labels,
    text_table::{Alignment, TextTableBuilder},
};
use rateio_domain::{
    Ledger, Money, Participant, ParticipantId, ParticipantTotals, Settlement, Transfer,
};
use std::{borrow::Cow, collections::HashMap};

pub trait ParticipantDirectory {
    fn display_name(&self, participant_id: &ParticipantId) -> Option<&str>;
}

impl ParticipantDirectory for [Participant] {
    fn display_name(&self, participant_id: &ParticipantId) -> Option<&str> {
        self.iter()
            .find(|p| &p.id == participant_id)
            .map(|p| p.name.as_str())
    }
}

impl ParticipantDirectory for Ledger {
    fn display_name(&self, participant_id: &ParticipantId) -> Option<&str> {
        self.participants.display_name(participant_id)
    }
}

impl ParticipantDirectory for HashMap<ParticipantId, String> {
    fn display_name(&self, participant_id: &ParticipantId) -> Option<&str> {
        self.get(participant_id).map(String::as_str)
    }
}

pub struct SettlementPresenter;

pub struct SettlementView {
    pub totals_table: String,
    /// `None` when nobody owes anybody.
    pub transfer_table: Option<String>,
    /// Ledger warnings and matching leftovers, one line each.
    pub notes: Vec<String>,
}

impl SettlementPresenter {
    pub fn render(
        settlement: &Settlement<'_>,
        directory: &dyn ParticipantDirectory,
    ) -> SettlementView {
        let totals_table = Self::build_totals_table(&settlement.totals, directory);
        let transfer_table = (!settlement.transfers.is_empty())
            .then(|| Self::build_transfer_table(&settlement.transfers, directory));

        let mut notes: Vec<String> = settlement
            .warnings
            .iter()
            .map(|warning| warning.to_string())
            .collect();
        if !settlement.residual.unmatched_debt.is_zero() {
            notes.push(format!(
                "{}: {}",
                labels::UNMATCHED_DEBT,
                settlement.residual.unmatched_debt
            ));
        }
        if !settlement.residual.unmatched_credit.is_zero() {
            notes.push(format!(
                "{}: {}",
                labels::UNMATCHED_CREDIT,
                settlement.residual.unmatched_credit
            ));
        }

        SettlementView {
            totals_table,
            transfer_table,
            notes,
        }
    }

    pub fn build_totals_table(
        totals: &[ParticipantTotals<'_>],
        directory: &dyn ParticipantDirectory,
    ) -> String {
        let headers = [
            Cow::Borrowed(labels::PARTICIPANT),
            Cow::Borrowed(labels::PAID),
            Cow::Borrowed(labels::OWED),
            Cow::Borrowed(labels::BALANCE),
        ];
        let mut builder = TextTableBuilder::new()
            .alignments(&[
                Alignment::Left,
                Alignment::Right,
                Alignment::Right,
                Alignment::Right,
            ])
            .headers(&headers);

        for t in totals {
            builder = builder.row([
                format_participant_label(t.participant_id, directory),
                Cow::Owned(t.total_paid.to_string()),
                Cow::Owned(t.total_owed.to_string()),
                Cow::Owned(format_signed(t.net_balance)),
            ]);
        }

        builder.build()
    }

    pub fn build_transfer_table(
        transfers: &[Transfer<'_>],
        directory: &dyn ParticipantDirectory,
    ) -> String {
        let headers = [
            Cow::Borrowed(labels::FROM),
            Cow::Borrowed(labels::TO),
            Cow::Borrowed(labels::AMOUNT),
        ];
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Left, Alignment::Right])
            .headers(&headers);

        for transfer in transfers {
            builder = builder.row([
                format_participant_label(transfer.from, directory),
                format_participant_label(transfer.to, directory),
                Cow::Owned(transfer.amount.to_string()),
            ]);
        }

        builder.build()
    }
}

fn format_participant_label<'a>(
    participant_id: &'a ParticipantId,
    directory: &'a dyn ParticipantDirectory,
) -> Cow<'a, str> {
    match directory.display_name(participant_id) {
        Some(name) if !name.trim().is_empty() => Cow::Borrowed(name),
        _ => Cow::Borrowed(participant_id.as_str()),
    }
}

fn format_signed(amount: Money) -> String {
    let sign = if amount.signum() > 0 { "+" } else { "" };
    format!("{sign}{amount}")
}
