//! Receipt view model for a resolved transaction

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::state::TransactionStatus;
use super::types::Transaction;
use crate::money::format_currency;

/// `Oct 18, 2026, 02:05 PM`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y, %I:%M %p").to_string()
}

pub fn status_headline(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Completed => "Transfer Successful!",
        TransactionStatus::Failed => "Transfer Failed",
        TransactionStatus::Pending => "Transfer Pending",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub headline: &'static str,
    pub status: TransactionStatus,
    pub amount: String,
    pub recipient_name: String,
    pub recipient_phone: Option<String>,
    pub date: String,
    pub note: Option<String>,
    pub transaction_id: String,
}

impl From<&Transaction> for Receipt {
    fn from(tx: &Transaction) -> Self {
        Self {
            headline: status_headline(tx.status()),
            status: tx.status(),
            amount: format_currency(tx.amount),
            recipient_name: tx.recipient.name.clone(),
            recipient_phone: tx.recipient.phone_number.clone(),
            date: format_date(&tx.date),
            note: tx.note.clone(),
            transaction_id: tx.id.to_string(),
        }
    }
}

impl Receipt {
    /// Plain-text rendering, one field per line
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.headline.to_string(),
            format!("Amount:         {}", self.amount),
            format!("To:             {}", self.recipient_name),
        ];
        if let Some(phone) = &self.recipient_phone {
            lines.push(format!("Phone:          {}", phone));
        }
        lines.push(format!("Date:           {}", self.date));
        if let Some(note) = &self.note {
            lines.push(format!("Note:           {}", note));
        }
        lines.push(format!("Transaction ID: {}", self.transaction_id));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipient;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2026, 10, 18, 14, 5, 0).unwrap();
        assert_eq!(format_date(&date), "Oct 18, 2026, 02:05 PM");
        let date = Utc.with_ymd_and_hms(2026, 1, 3, 9, 30, 0).unwrap();
        assert_eq!(format_date(&date), "Jan 3, 2026, 09:30 AM");
    }

    #[test]
    fn test_receipt_from_transaction() {
        let mut tx = Transaction::pending(
            Decimal::new(20000, 2),
            Recipient::new("rcp-001", "Daniel Lim").with_phone("+60 12-111 2233"),
            Some("Dinner".into()),
        );
        let pending = Receipt::from(&tx);
        assert_eq!(pending.headline, "Transfer Pending");

        tx.resolve(TransactionStatus::Completed).unwrap();
        let receipt = Receipt::from(&tx);
        assert_eq!(receipt.headline, "Transfer Successful!");
        assert_eq!(receipt.amount, "RM200.00");
        assert_eq!(receipt.recipient_name, "Daniel Lim");
        assert_eq!(receipt.transaction_id, tx.id.to_string());

        let lines = receipt.to_lines();
        assert_eq!(lines[0], "Transfer Successful!");
        assert!(lines.iter().any(|l| l.contains("Dinner")));
        assert!(lines.iter().any(|l| l.contains("+60 12-111 2233")));
    }

    #[test]
    fn test_failed_headline() {
        assert_eq!(status_headline(TransactionStatus::Failed), "Transfer Failed");
    }
}
