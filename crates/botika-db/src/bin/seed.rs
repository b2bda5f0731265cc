//! # Seed Data Generator
//!
//! Populates the database with a pharmacy catalog and stock batches for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p botika-db --bin seed
//!
//! # Specify database path
//! cargo run -p botika-db --bin seed -- --db ./data/botika.db
//!
//! # More batches per product
//! cargo run -p botika-db --bin seed -- --batches 4
//! ```
//!
//! ## Generated Data
//! Each product gets 1..=N batches through the real `add_batch` path, so
//! the seeded database exercises numbering, stock caching, and price
//! synchronization exactly like production traffic would.

use chrono::{Duration, Utc};
use std::env;

use botika_core::Product;
use botika_db::ledger::AddBatchRequest;
use botika_db::repository::product::generate_product_id;
use botika_db::{Database, DbConfig};

/// (brand name, generic name, unit cost centavos, unit price centavos)
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("Biogesic 500mg", "Paracetamol", 350, 550),
    ("Neozep Forte", "Phenylephrine + Chlorphenamine + Paracetamol", 420, 650),
    ("Amoxil 500mg", "Amoxicillin", 900, 1250),
    ("Solmux 500mg", "Carbocisteine", 480, 750),
    ("Alaxan FR", "Ibuprofen + Paracetamol", 500, 780),
    ("Kremil-S", "Aluminum Hydroxide + Magnesium Hydroxide + Simethicone", 380, 600),
    ("Diatabs", "Loperamide", 420, 680),
    ("Bioflu", "Phenylephrine + Chlorphenamine + Paracetamol", 450, 700),
    ("Cetirizine 10mg", "Cetirizine", 250, 450),
    ("Losartan 50mg", "Losartan Potassium", 600, 950),
    ("Metformin 500mg", "Metformin Hydrochloride", 300, 520),
    ("Amlodipine 5mg", "Amlodipine Besilate", 280, 500),
    ("Mefenamic Acid 500mg", "Mefenamic Acid", 320, 550),
    ("Ascorbic Acid 500mg", "Vitamin C", 180, 350),
    ("Ferrous Sulfate", "Iron Supplement", 150, 300),
    ("Salbutamol 2mg", "Salbutamol", 400, 650),
    ("Omeprazole 20mg", "Omeprazole", 700, 1100),
    ("Simvastatin 20mg", "Simvastatin", 650, 1000),
    ("Cotrimoxazole 800mg", "Sulfamethoxazole + Trimethoprim", 550, 850),
    ("Loratadine 10mg", "Loratadine", 350, 600),
];

const SUPPLIERS: &[&str] = &[
    "Metro Drug Distribution",
    "Zuellig Pharma",
    "Globo Asiatico",
    "Dyna Drug",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,botika=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./botika_dev.db");
    let mut batches_per_product: usize = 2;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--batches" | "-b" => {
                if i + 1 < args.len() {
                    batches_per_product = args[i + 1].parse().unwrap_or(2);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Botika POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./botika_dev.db)");
                println!("  -b, --batches <N>    Batches per product (default: 2)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Botika POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", CATALOG.len());
    println!("Batches per product: {}", batches_per_product);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog and batches...");

    let ledger = db.ledger();
    let mut batches_created = 0usize;
    let start = std::time::Instant::now();

    for (idx, (name, generic, cost, price)) in CATALOG.iter().enumerate() {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            generic_name: Some(generic.to_string()),
            current_price_cents: 0,
            cost_price_cents: None,
            total_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;

        for batch_idx in 0..batches_per_product {
            // Later batches cost a bit more, mirroring supplier price creep
            let creep = (batch_idx as i64) * (cost / 20);
            let request = AddBatchRequest {
                product_id: product.id.clone(),
                quantity: 40 + ((idx * 7 + batch_idx * 13) % 60) as i64,
                expiry_date: Some(
                    (now + Duration::days(365 + (idx as i64 * 17 + batch_idx as i64 * 31) % 365))
                        .date_naive(),
                ),
                purchase_price_cents: Some(cost + creep),
                selling_price_cents: Some(price + creep),
                supplier_name: Some(SUPPLIERS[(idx + batch_idx) % SUPPLIERS.len()].to_string()),
                notes: None,
            };

            let added = ledger.add_batch(request).await?;
            batches_created += 1;

            if batch_idx == 0 {
                println!("  {} → {} ({} pcs)", name, added.batch_number, added.new_stock_level);
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Seeded {} products / {} batches in {:?}",
        CATALOG.len(),
        batches_created,
        elapsed
    );

    // Sanity: the price sweep should find nothing to fix on fresh data
    let drifted = db.ledger().refresh_all_product_prices().await?;
    println!("✓ Price sweep after seed: {} products needed correction", drifted);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
