//! Database seeder for Invoya development and testing.
//!
//! Seeds a demo account with clients and invoices in every lifecycle state
//! so the dashboard has something to show right after `migrator fresh`.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::str::FromStr;
use uuid::Uuid;

use invoya_core::auth::hash_password;
use invoya_core::invoice::{InvoiceStatus, LineItem};
use invoya_db::repositories::client::CreateClientInput;
use invoya_db::repositories::invoice::CreateInvoiceInput;
use invoya_db::{ClientRepository, InvoiceRepository, UserRepository};

/// Demo account email; the password is `password123`.
const DEMO_EMAIL: &str = "demo@invoya.dev";
const DEMO_PASSWORD: &str = "password123";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = invoya_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    if demo_user_exists(&db).await {
        println!("Demo account already exists, nothing to do.");
        return;
    }

    println!("Seeding demo user...");
    let user_id = seed_demo_user(&db).await;

    println!("Seeding clients...");
    let client_ids = seed_clients(&db, user_id).await;

    println!("Seeding invoices...");
    seed_invoices(&db, user_id, &client_ids).await;

    println!("Seeding complete! Log in as {DEMO_EMAIL} / {DEMO_PASSWORD}");
}

async fn demo_user_exists(db: &DatabaseConnection) -> bool {
    UserRepository::new(db.clone())
        .email_exists(DEMO_EMAIL)
        .await
        .unwrap_or(false)
}

/// Seeds the demo user with a real password hash so login works.
async fn seed_demo_user(db: &DatabaseConnection) -> Uuid {
    let password_hash = hash_password(DEMO_PASSWORD).expect("Failed to hash demo password");

    let user = UserRepository::new(db.clone())
        .create(DEMO_EMAIL, &password_hash, "Demo User")
        .await
        .expect("Failed to insert demo user");

    println!("  Created demo user: {DEMO_EMAIL}");
    user.id
}

/// Seeds a few clients with varying levels of detail.
async fn seed_clients(db: &DatabaseConnection, user_id: Uuid) -> Vec<Uuid> {
    let repo = ClientRepository::new(db.clone());

    let inputs = [
        CreateClientInput {
            user_id,
            name: "Acme Corporation".to_string(),
            email: "billing@acme.example".to_string(),
            company: Some("Acme Corporation Ltd".to_string()),
            phone: Some("+1 555 0100".to_string()),
            address: Some("1 Roadrunner Way, Phoenix, AZ".to_string()),
        },
        CreateClientInput {
            user_id,
            name: "Blue Harbor Studio".to_string(),
            email: "accounts@blueharbor.example".to_string(),
            company: None,
            phone: None,
            address: None,
        },
        CreateClientInput {
            user_id,
            name: "Northwind Traders".to_string(),
            email: "finance@northwind.example".to_string(),
            company: Some("Northwind Traders GmbH".to_string()),
            phone: None,
            address: Some("Friedrichstrasse 12, Berlin".to_string()),
        },
    ];

    let mut ids = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = input.name.clone();
        let client = repo
            .create(input)
            .await
            .expect("Failed to insert demo client");
        println!("  Created client: {name}");
        ids.push(client.id);
    }
    ids
}

/// Seeds invoices in draft, sent, and paid states via the regular
/// creation path, so numbering and totals behave exactly like production.
async fn seed_invoices(db: &DatabaseConnection, user_id: Uuid, client_ids: &[Uuid]) {
    let repo = InvoiceRepository::new(db.clone());
    let today = Utc::now().date_naive();

    let inputs = [
        invoice(
            user_id,
            client_ids[0],
            None,
            today,
            vec![
                item("Landing page redesign", "1", "2400.00"),
                item("Design revisions", "3", "150.00"),
            ],
        ),
        invoice(
            user_id,
            client_ids[1],
            Some(InvoiceStatus::Sent),
            today - Duration::days(10),
            vec![item("Consulting retainer, August", "12", "185.00")],
        ),
        invoice(
            user_id,
            client_ids[2],
            Some(InvoiceStatus::Sent),
            today - Duration::days(45),
            vec![
                item("API integration", "1", "5200.00"),
                item("Load testing", "8", "95.00"),
            ],
        ),
    ];

    let mut created = Vec::new();
    for input in inputs {
        let detail = repo
            .create(input)
            .await
            .expect("Failed to insert demo invoice");
        println!(
            "  Created invoice {} ({})",
            detail.invoice.invoice_number, detail.invoice.status
        );
        created.push(detail);
    }

    // Settle the oldest invoice so revenue charts have data.
    let oldest = &created[2];
    repo.mark_paid(user_id, oldest.invoice.id, Utc::now() - Duration::days(30))
        .await
        .expect("Failed to mark demo invoice paid")
        .expect("Demo invoice should not be paid yet");
    println!("  Marked invoice {} paid", oldest.invoice.invoice_number);
}

fn invoice(
    user_id: Uuid,
    client_id: Uuid,
    status: Option<InvoiceStatus>,
    issue_date: NaiveDate,
    items: Vec<LineItem>,
) -> CreateInvoiceInput {
    CreateInvoiceInput {
        user_id,
        client_id,
        status,
        issue_date,
        due_date: issue_date + Duration::days(30),
        tax_rate: Decimal::from_str("10").expect("static decimal"),
        notes: None,
        items,
    }
}

fn item(description: &str, quantity: &str, rate: &str) -> LineItem {
    LineItem {
        description: description.to_string(),
        quantity: Decimal::from_str(quantity).expect("static decimal"),
        rate: Decimal::from_str(rate).expect("static decimal"),
    }
}
