//! # Seed Data Generator
//!
//! Populates an empty database with demo accounts, customers, products
//! and one sample sale.
//!
//! ## Usage
//! ```bash
//! cargo run -p tillpoint-db --bin seed
//! cargo run -p tillpoint-db --bin seed -- --db ./data/tillpoint.db
//! ```
//!
//! ## Accounts
//! | Email             | Password     | Role              |
//! |-------------------|--------------|-------------------|
//! | admin@pos.com     | admin123     | ADMIN             |
//! | cashier@pos.com   | cashier123   | CASHIER           |
//! | inventory@pos.com | inventory123 | INVENTORY_MANAGER |

use std::env;

use tillpoint_core::sale::{SaleLineRequest, SaleRequest};
use tillpoint_core::{Actor, Money, PaymentMethod, Role, SaleEngine};
use tillpoint_db::{CustomerFields, Database, DbConfig, NewProduct, NewUser};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USERS: &[(&str, &str, &str, Role)] = &[
    ("Admin User", "admin@pos.com", "admin123", Role::Admin),
    ("Cashier User", "cashier@pos.com", "cashier123", Role::Cashier),
    (
        "Inventory Manager",
        "inventory@pos.com",
        "inventory123",
        Role::InventoryManager,
    ),
];

const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("John Doe", "+1-555-0101", "john@example.com", "456 Oak Ave, City, State"),
    ("Jane Smith", "+1-555-0102", "jane@example.com", "789 Pine St, City, State"),
];

/// sku, name, category, price, cost, stock, reorder level, barcode
const PRODUCTS: &[(&str, &str, &str, i64, i64, i64, i64, &str)] = &[
    ("PROD-001", "Wireless Bluetooth Headphones", "Electronics", 9999, 6000, 50, 10, "1234567890123"),
    ("PROD-002", "Coffee Mug - Ceramic", "Home & Kitchen", 1299, 650, 100, 20, "1234567890124"),
    ("PROD-003", "Notebook - A5 Lined", "Stationery", 850, 400, 75, 15, "1234567890125"),
    ("PROD-004", "USB-C Cable - 6ft", "Electronics", 1599, 800, 30, 10, "1234567890126"),
    ("PROD-005", "Water Bottle - Stainless Steel", "Sports & Outdoors", 2499, 1200, 25, 8, "1234567890127"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/tillpoint.db".into());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tillpoint POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DATABASE_PATH or ./data/tillpoint.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Connected, migrations applied");

    if db.users().count().await? > 0 {
        warn!("Database already has users, skipping seed. Delete the file to regenerate.");
        return Ok(());
    }

    let mut cashier = None;
    let mut inventory_manager = None;
    for (name, email, password, role) in USERS {
        let user = db
            .users()
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: *role,
            })
            .await?;
        info!(email = %user.email, role = role.as_str(), "Created user");
        match role {
            Role::Cashier => cashier = Some(user),
            Role::InventoryManager => inventory_manager = Some(user),
            Role::Admin => {}
        }
    }
    let (Some(cashier), Some(inventory_manager)) = (cashier, inventory_manager) else {
        return Err("seed users are missing a cashier or inventory manager".into());
    };

    let mut customer_ids = Vec::new();
    for (name, phone, email, address) in CUSTOMERS {
        let customer = db
            .customers()
            .create(CustomerFields {
                name: Some(name.to_string()),
                phone: Some(phone.to_string()),
                email: Some(email.to_string()),
                address: Some(address.to_string()),
            })
            .await?;
        customer_ids.push(customer.id);
    }
    info!(count = customer_ids.len(), "Created customers");

    let mut product_ids = Vec::new();
    for (sku, name, category, price, cost, stock, reorder, barcode) in PRODUCTS {
        let product = db
            .products()
            .create(
                NewProduct {
                    sku: Some(sku.to_string()),
                    barcode: Some(barcode.to_string()),
                    name: name.to_string(),
                    category: Some(category.to_string()),
                    price_cents: *price,
                    cost_cents: *cost,
                    stock_qty: *stock,
                    reorder_level: Some(*reorder),
                },
                &inventory_manager.id,
            )
            .await?;
        product_ids.push(product.id);
    }
    info!(count = product_ids.len(), "Created products");

    // One sale through the engine so stock and logs line up.
    let engine = SaleEngine::new(db.sale_store());
    let actor = Actor {
        user_id: cashier.id.clone(),
        role: Role::Cashier,
    };
    let sale = engine
        .create_sale(
            &actor,
            SaleRequest {
                customer_id: customer_ids.first().cloned(),
                items: vec![
                    SaleLineRequest {
                        product_id: product_ids[0].clone(),
                        quantity: 1,
                    },
                    SaleLineRequest {
                        product_id: product_ids[1].clone(),
                        quantity: 2,
                    },
                ],
                payment_method: PaymentMethod::Cash,
                discount: Money::from_cents(500),
                tax: Money::from_cents(1098),
            },
        )
        .await?;
    info!(receipt = %sale.sale.receipt_number, total = %sale.sale.total(), "Created sample sale");

    info!("Seed complete");
    for (_, email, password, role) in USERS {
        info!(%email, %password, role = role.as_str(), "Demo login");
    }

    db.close().await;
    Ok(())
}
