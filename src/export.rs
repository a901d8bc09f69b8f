//! CSV rendering for the transaction export.

use chrono::{DateTime, Utc};

use crate::models::Transaction;

pub const CSV_HEADER: &str = "Sr.No,Institute Name,Date & Time,Order ID,Edviron Order ID,Order Amt,Transaction Amt,Payment Method,Status,Student Name,Student ID,Phone No.,Vendor Amount,Gateway,Capture Status";

pub fn transactions_to_csv(transactions: &[Transaction]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + transactions.len() * 160);
    out.push_str(CSV_HEADER);
    out.push('\n');

    let rows: Vec<String> = transactions
        .iter()
        .enumerate()
        .map(|(index, tx)| {
            let fields = [
                quote(&or_default(&tx.school_id, "EDV DEMO SCHOOL")),
                quote(&format_date(tx.created_at)),
                quote("N/A"),
                quote(&tx.custom_order_id),
                quote(&format!("₹{}", format_amount(tx.order_amount))),
                quote(&format!("₹{}", format_amount(tx.transaction_amount))),
                quote(&or_default(&tx.payment_mode, "NA")),
                quote(&tx.status),
                quote(&tx.student_info.name),
                quote(&tx.student_info.id),
                quote(&or_default(&tx.student_info.email, "0000000000")),
                quote("NA"),
                quote(&or_default(&tx.gateway, "NA")),
                quote("NA"),
            ];
            format!("{},{}", index + 1, fields.join(","))
        })
        .collect();
    out.push_str(&rows.join("\n"));
    out
}

/// `dd/mm/YYYY, hh:mm:ss am`
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y, %I:%M:%S %P").to_string()
}

/// Thousands-separated with at most two decimals, e.g. `12,500` or `1,234.5`.
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let rounded = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentInfo;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn sample() -> Transaction {
        Transaction {
            collect_id: Uuid::nil(),
            school_id: "St. Mary's \"Senior\" School".into(),
            gateway: "PhonePe".into(),
            order_amount: 12500.0,
            transaction_amount: 12550.5,
            status: "success".into(),
            order_status: "success".into(),
            custom_order_id: "EDV1713000000000001".into(),
            student_info: StudentInfo {
                name: "Priya Patel".into(),
                id: "STU002".into(),
                email: "priya.patel@example.com".into(),
            },
            payment_mode: "UPI".into(),
            payment_time: None,
            bank_reference: "NA".into(),
            payment_message: "NA".into(),
            created_at: Utc.with_ymd_and_hms(2025, 4, 23, 14, 5, 9).unwrap(),
        }
    }

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(format_amount(5000.0), "5,000");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(999.5), "999.5");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn dates_use_twelve_hour_clock() {
        let at = Utc.with_ymd_and_hms(2025, 4, 23, 14, 5, 9).unwrap();
        assert_eq!(format_date(at), "23/04/2025, 02:05:09 pm");
    }

    #[test]
    fn rows_are_numbered_and_quotes_escaped() {
        let csv = transactions_to_csv(&[sample()]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,\"St. Mary's \"\"Senior\"\" School\""));
        assert!(row.contains("\"₹12,500\",\"₹12,550.5\""));
        assert!(row.ends_with("\"PhonePe\",\"NA\""));
        assert_eq!(lines.next(), None);
    }
}
