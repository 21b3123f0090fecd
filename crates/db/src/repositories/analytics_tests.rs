use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::entities::{clients, email_logs, invoices};
use crate::repositories::analytics::{
    EmailStats, InvoiceCounts, aggregate, last_n_months, month_key,
};

fn ts(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).unwrap()
}

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

fn client(user_id: Uuid, name: &str) -> clients::Model {
    clients::Model {
        id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        email: "billing@example.com".to_string(),
        company: None,
        phone: None,
        address: None,
        created_at: ts("2026-01-01T00:00:00Z"),
        updated_at: ts("2026-01-01T00:00:00Z"),
    }
}

fn invoice(
    user_id: Uuid,
    client_id: Uuid,
    number: &str,
    status: &str,
    total: Decimal,
    created_at: &str,
) -> invoices::Model {
    invoices::Model {
        id: Uuid::new_v4(),
        user_id,
        client_id,
        invoice_number: number.to_string(),
        status: status.to_string(),
        issue_date: date("2026-03-01"),
        due_date: date("2026-03-31"),
        subtotal: total,
        tax_rate: dec!(0),
        tax_amount: dec!(0),
        total,
        notes: None,
        paid_at: (status == "paid").then(|| ts(created_at)),
        last_emailed_at: None,
        created_at: ts(created_at),
        updated_at: ts(created_at),
    }
}

fn log(user_id: Uuid, invoice_id: Uuid, status: &str, sent_at: &str) -> email_logs::Model {
    email_logs::Model {
        id: Uuid::new_v4(),
        invoice_id,
        user_id,
        recipient: "billing@example.com".to_string(),
        email_type: "invoice".to_string(),
        status: status.to_string(),
        message_id: Uuid::new_v4().to_string(),
        sent_at: ts(sent_at),
    }
}

#[test]
fn test_counts_and_revenue() {
    let user = Uuid::new_v4();
    let acme = client(user, "Acme");
    let invoices = vec![
        invoice(user, acme.id, "INV-20260001", "draft", dec!(100), "2026-03-01T10:00:00Z"),
        invoice(user, acme.id, "INV-20260002", "sent", dec!(200), "2026-03-02T10:00:00Z"),
        invoice(user, acme.id, "INV-20260003", "paid", dec!(300), "2026-03-03T10:00:00Z"),
        invoice(user, acme.id, "INV-20260004", "paid", dec!(50), "2026-03-04T10:00:00Z"),
        invoice(user, acme.id, "INV-20260005", "overdue", dec!(75), "2026-03-05T10:00:00Z"),
    ];

    let summary = aggregate(&invoices, std::slice::from_ref(&acme), &[], date("2026-03-15"));

    assert_eq!(summary.total_revenue, dec!(350));
    assert_eq!(
        summary.invoice_counts,
        InvoiceCounts {
            total: 5,
            draft: 1,
            sent: 1,
            paid: 2,
            overdue: 1,
        }
    );
    assert_eq!(summary.client_count, 1);
}

#[test]
fn test_email_stats_count_delivery_outcomes() {
    let user = Uuid::new_v4();
    let acme = client(user, "Acme");
    let inv = invoice(user, acme.id, "INV-20260001", "sent", dec!(100), "2026-03-01T10:00:00Z");
    let logs = vec![
        log(user, inv.id, "sent", "2026-03-01T10:00:00Z"),
        log(user, inv.id, "delivered", "2026-03-02T10:00:00Z"),
        log(user, inv.id, "delivered", "2026-03-03T10:00:00Z"),
        log(user, inv.id, "failed", "2026-03-04T10:00:00Z"),
    ];

    let summary = aggregate(
        std::slice::from_ref(&inv),
        std::slice::from_ref(&acme),
        &logs,
        date("2026-03-15"),
    );

    assert_eq!(
        summary.email_stats,
        EmailStats {
            total_sent: 4,
            delivered: 2,
            failed: 1,
        }
    );
}

#[test]
fn test_recent_lists_are_capped_and_newest_first() {
    let user = Uuid::new_v4();
    let acme = client(user, "Acme");

    let invoices: Vec<invoices::Model> = (1..=7)
        .map(|day| {
            invoice(
                user,
                acme.id,
                &format!("INV-2026000{day}"),
                "sent",
                dec!(10),
                &format!("2026-03-0{day}T10:00:00Z"),
            )
        })
        .collect();

    let logs: Vec<email_logs::Model> = (10..=21)
        .map(|day| {
            log(
                user,
                invoices[0].id,
                "sent",
                &format!("2026-03-{day}T10:00:00Z"),
            )
        })
        .collect();

    let summary = aggregate(&invoices, std::slice::from_ref(&acme), &logs, date("2026-03-31"));

    assert_eq!(summary.recent_invoices.len(), 5);
    assert_eq!(summary.recent_invoices[0].invoice_number, "INV-20260007");
    assert_eq!(summary.recent_invoices[4].invoice_number, "INV-20260003");

    assert_eq!(summary.recent_email_activity.len(), 10);
    assert_eq!(
        summary.recent_email_activity[0].sent_at,
        ts("2026-03-21T10:00:00Z")
    );
}

#[test]
fn test_recent_invoices_carry_client_names() {
    let user = Uuid::new_v4();
    let acme = client(user, "Acme");
    let beta = client(user, "Beta LLC");
    let invoices = vec![
        invoice(user, acme.id, "INV-20260001", "sent", dec!(10), "2026-03-01T10:00:00Z"),
        invoice(user, beta.id, "INV-20260002", "sent", dec!(20), "2026-03-02T10:00:00Z"),
    ];

    let summary = aggregate(&invoices, &[acme, beta], &[], date("2026-03-15"));

    assert_eq!(summary.recent_invoices[0].client_name, "Beta LLC");
    assert_eq!(summary.recent_invoices[1].client_name, "Acme");
}

#[test]
fn test_top_clients_ranked_by_billed_volume() {
    let user = Uuid::new_v4();
    let acme = client(user, "Acme");
    let beta = client(user, "Beta LLC");
    let gamma = client(user, "Gamma Inc");
    let idle = client(user, "No Invoices Yet");

    let invoices = vec![
        invoice(user, acme.id, "INV-20260001", "paid", dec!(100), "2026-03-01T10:00:00Z"),
        invoice(user, acme.id, "INV-20260002", "sent", dec!(200), "2026-03-02T10:00:00Z"),
        invoice(user, beta.id, "INV-20260003", "draft", dec!(500), "2026-03-03T10:00:00Z"),
        invoice(user, gamma.id, "INV-20260004", "paid", dec!(50), "2026-03-04T10:00:00Z"),
    ];

    let summary = aggregate(&invoices, &[acme, beta, gamma, idle], &[], date("2026-03-15"));

    assert_eq!(summary.top_clients.len(), 3);
    assert_eq!(summary.top_clients[0].name, "Beta LLC");
    assert_eq!(summary.top_clients[0].revenue, dec!(500));
    assert_eq!(summary.top_clients[0].invoice_count, 1);
    assert_eq!(summary.top_clients[1].name, "Acme");
    assert_eq!(summary.top_clients[1].revenue, dec!(300));
    assert_eq!(summary.top_clients[1].invoice_count, 2);
    assert_eq!(summary.top_clients[2].name, "Gamma Inc");
}

#[test]
fn test_monthly_revenue_zero_fills_window() {
    let user = Uuid::new_v4();
    let acme = client(user, "Acme");
    let invoices = vec![
        // Paid inside the window.
        invoice(user, acme.id, "INV-20260002", "paid", dec!(200), "2026-06-10T10:00:00Z"),
        invoice(user, acme.id, "INV-20260003", "paid", dec!(100), "2026-08-05T10:00:00Z"),
        // Paid before the window starts.
        invoice(user, acme.id, "INV-20260001", "paid", dec!(999), "2026-01-15T10:00:00Z"),
        // Unpaid invoices never contribute revenue.
        invoice(user, acme.id, "INV-20260004", "overdue", dec!(400), "2026-07-01T10:00:00Z"),
    ];

    let summary = aggregate(&invoices, std::slice::from_ref(&acme), &[], date("2026-08-25"));

    let months: Vec<&str> = summary
        .monthly_revenue
        .iter()
        .map(|entry| entry.month.as_str())
        .collect();
    assert_eq!(
        months,
        vec!["2026-03", "2026-04", "2026-05", "2026-06", "2026-07", "2026-08"]
    );

    assert_eq!(summary.monthly_revenue[3].revenue, dec!(200));
    assert_eq!(summary.monthly_revenue[4].revenue, dec!(0));
    assert_eq!(summary.monthly_revenue[5].revenue, dec!(100));
}

#[test]
fn test_last_n_months_crosses_year_boundary() {
    assert_eq!(
        last_n_months(date("2026-02-10"), 6),
        vec![(2025, 9), (2025, 10), (2025, 11), (2025, 12), (2026, 1), (2026, 2)]
    );
}

#[test]
fn test_month_key() {
    assert_eq!(month_key(date("2026-08-25")), (2026, 8));
}
