//! # Seed Data Generator
//!
//! Populates the database with branches, products, shopkeepers, and a
//! sales history for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 sales (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-db --bin seed -- --sales 1000
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! Sales go through the normal recording path, so the generated stock
//! figures reconcile with the sales log exactly as production data
//! would.

use std::env;

use tally_core::PaymentMode;
use tally_db::{Database, DbConfig, NewProduct, NewSale};

/// Catalogue of products per branch, with cost and selling price in cents.
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Eau de Parfum 50ml", 4500, 7500),
    ("Eau de Parfum 100ml", 7000, 12000),
    ("Body Mist 100ml", 1200, 2500),
    ("Body Mist 250ml", 2000, 4000),
    ("Perfume Oil 10ml", 800, 2000),
    ("Perfume Oil 30ml", 1800, 4500),
    ("Reed Diffuser", 3000, 6000),
    ("Scented Candle", 1500, 3500),
    ("Shower Gel 250ml", 1000, 2200),
    ("Body Lotion 200ml", 1400, 3000),
    ("Gift Set Small", 5000, 9000),
    ("Gift Set Deluxe", 9000, 16000),
];

const BRANCHES: &[(&str, &str)] = &[
    ("Osu Branch", "Oxford Street, Osu"),
    ("Tema Branch", "Community 1 Market, Tema"),
    ("Kumasi Branch", "Adum High Street, Kumasi"),
];

const SHOPKEEPERS: &[(&str, &str)] = &[
    ("ama.owusu", "ama.owusu@example.com"),
    ("kofi.asante", "kofi.asante@example.com"),
    ("yaa.mensah", "yaa.mensah@example.com"),
];

const CUSTOMERS: &[&str] = &[
    "Akosua Boateng",
    "Kwame Darko",
    "Efua Addo",
    "Yaw Ofori",
    "Adjoa Appiah",
];

const MODES: &[PaymentMode] = &[
    PaymentMode::Cash,
    PaymentMode::Cash,
    PaymentMode::MobileMoney,
    PaymentMode::BankTransfer,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut sale_count: usize = 200;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sale_count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of sales to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", sale_count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check for existing data
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding branches and products...");

    let mut product_ids = Vec::new();
    for (branch_idx, (name, location)) in BRANCHES.iter().enumerate() {
        let branch = db.branches().insert(name, location).await?;
        for (product_idx, (product_name, cost, selling)) in PRODUCTS.iter().enumerate() {
            let seed = branch_idx * PRODUCTS.len() + product_idx;
            let product = db
                .products()
                .insert(NewProduct {
                    name: product_name.to_string(),
                    // Enough stock to absorb the generated sales
                    stock: 40 + (seed % 60) as i64 + sale_count as i64 / PRODUCTS.len() as i64,
                    cost_price_cents: *cost,
                    selling_price_cents: *selling,
                    low_stock_threshold: 5,
                    branch_id: branch.id.clone(),
                })
                .await?;
            product_ids.push(product.id);
        }
    }
    println!("  {} branches, {} products", BRANCHES.len(), product_ids.len());

    println!("Seeding shopkeepers...");
    let mut shopkeeper_ids = Vec::new();
    for (username, email) in SHOPKEEPERS {
        let keeper = db.users().register_shopkeeper(username, email).await?;
        shopkeeper_ids.push(keeper.id);
    }
    println!("  {} shopkeepers", shopkeeper_ids.len());

    println!("Recording sales...");
    let start = std::time::Instant::now();
    let mut recorded = 0usize;

    for seed in 0..sale_count {
        let product_id = &product_ids[seed % product_ids.len()];
        let Some(product) = db.products().get_by_id(product_id).await? else {
            continue;
        };

        let quantity = 1 + (seed % 3) as i64;
        let total = product.selling_price_cents * quantity;
        // Every 7th customer leaves a balance outstanding
        let amount_left = if seed % 7 == 0 { total / 4 } else { 0 };

        let result = db
            .sales()
            .record_sale(NewSale {
                customer_name: Some(CUSTOMERS[seed % CUSTOMERS.len()].to_string()),
                customer_contact: None,
                product_id: product.id.clone(),
                quantity_sold: quantity,
                amount_paid_cents: total - amount_left,
                amount_left_cents: amount_left,
                mode: MODES[seed % MODES.len()],
                shopkeeper_id: Some(shopkeeper_ids[seed % shopkeeper_ids.len()].clone()),
            })
            .await;

        match result {
            Ok(_) => recorded += 1,
            Err(e) if e.is_insufficient_stock() => continue,
            Err(e) => {
                eprintln!("Failed to record sale: {}", e);
                continue;
            }
        }

        if recorded % 100 == 0 && recorded > 0 {
            println!("  Recorded {} sales...", recorded);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Recorded {} sales in {:?}", recorded, elapsed);

    let low = db.products().low_stock().await?;
    println!("  Low-stock products: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
