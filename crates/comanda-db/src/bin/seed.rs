//! # Seed Data Generator
//!
//! Populates a database with a demo menu and floor for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./comanda_dev.db with 10 tables (default)
//! cargo run -p comanda-db --bin seed
//!
//! # Custom table count
//! cargo run -p comanda-db --bin seed -- --tables 25
//!
//! # Specify database path
//! cargo run -p comanda-db --bin seed -- --db ./data/comanda.db
//! ```
//!
//! ## Generated Data
//! - Categories: Lanches, Pratos, Bebidas, Sobremesas
//! - A handful of products per category with prices in centavos
//! - Tables numbered `1..=N`, each with a fresh QR code

use anyhow::Context;
use chrono::Utc;
use std::env;

use comanda_core::{new_id, Category, Product, Table};
use comanda_db::{Database, DbConfig};

/// Demo menu: (category, [(product, price in centavos, description)])
const MENU: &[(&str, &[(&str, i64, &str)])] = &[
    (
        "Lanches",
        &[
            ("X-Burger", 1800, "Pão, hambúrguer, queijo"),
            ("X-Salada", 2000, "Pão, hambúrguer, queijo, alface, tomate"),
            ("X-Bacon", 2300, "Pão, hambúrguer, queijo, bacon"),
            ("X-Tudo", 2800, ""),
            ("Misto Quente", 1200, "Pão de forma, presunto, queijo"),
        ],
    ),
    (
        "Pratos",
        &[
            ("Feijoada", 4500, "Serve uma pessoa"),
            ("Prato Feito", 2500, "Arroz, feijão, bife, salada"),
            ("Parmegiana de Frango", 3800, ""),
            ("Moqueca de Peixe", 5200, "Serve duas pessoas"),
        ],
    ),
    (
        "Bebidas",
        &[
            ("Refrigerante Lata", 600, "350ml"),
            ("Suco Natural", 900, "Laranja, limão ou maracujá"),
            ("Água Mineral", 400, "500ml"),
            ("Cerveja Long Neck", 1100, ""),
            ("Caipirinha", 1600, ""),
        ],
    ),
    (
        "Sobremesas",
        &[
            ("Pudim", 1000, ""),
            ("Brigadeiro", 350, "Unidade"),
            ("Açaí 300ml", 1500, "Com granola e banana"),
        ],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut table_count: i32 = 10;
    let mut db_path = String::from("./comanda_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tables" | "-t" => {
                if i + 1 < args.len() {
                    table_count = args[i + 1].parse().unwrap_or(10);
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
                println!("Comanda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --tables <N>   Number of tables to create (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: ./comanda_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Comanda Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Tables:   {}", table_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating menu...");

    let start = std::time::Instant::now();
    let mut product_total = 0;

    for (category_name, products) in MENU {
        let category = Category {
            id: new_id(),
            name: category_name.to_string(),
            created_at: Utc::now(),
        };
        db.categories()
            .insert(&category)
            .await
            .with_context(|| format!("inserting category {category_name}"))?;

        for (name, price_cents, description) in products.iter() {
            let product = Product {
                id: new_id(),
                name: name.to_string(),
                price_cents: *price_cents,
                description: description.to_string(),
                disabled: false,
                category_id: category.id.clone(),
                created_at: Utc::now(),
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            product_total += 1;
        }

        println!("  {}: {} products", category_name, products.len());
    }

    println!();
    println!("Generating tables...");

    let mut table_total = 0;
    for number in 1..=table_count {
        if db.tables().get_by_number(number).await?.is_some() {
            continue;
        }

        let table = Table {
            id: new_id(),
            number,
            qr_code: Table::generate_qr_code(),
            is_active: true,
            created_at: Utc::now(),
        };

        if let Err(e) = db.tables().insert(&table).await {
            eprintln!("Failed to insert table {}: {}", number, e);
            continue;
        }
        table_total += 1;
    }

    println!();
    println!(
        "✓ Generated {} categories, {} products and {} tables in {:?}",
        MENU.len(),
        product_total,
        table_total,
        start.elapsed()
    );
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
