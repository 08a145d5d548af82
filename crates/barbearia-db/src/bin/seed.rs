//! # Seed Data Generator
//!
//! Populates a database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./barbearia_dev.db
//! cargo run -p barbearia-db --bin seed
//!
//! # Specify database path
//! cargo run -p barbearia-db --bin seed -- --db ./data/barbearia.db
//! ```
//!
//! ## Generated Data
//! - Shop settings (name, phone, address, hours)
//! - Three professionals and a service menu, only into an empty catalog
//! - Clothing products, skipping names that already exist

use std::env;

use barbearia_core::{Money, ProductInput, ProfessionalInput, ServiceInput, ShopSettingsInput, StockCounts};
use barbearia_db::{Database, DbConfig};

/// (name, category, price in cents, duration in minutes, featured)
const SERVICES: &[(&str, &str, i64, i64, bool)] = &[
    ("Corte Masculino", "Cabelo", 3500, 30, true),
    ("Corte Infantil", "Cabelo", 3000, 30, false),
    ("Barba Completa", "Barba", 2500, 30, true),
    ("Corte + Barba", "Combo", 5500, 60, true),
    ("Pigmentação de Barba", "Barba", 4000, 45, false),
    ("Sobrancelha", "Estética", 1500, 15, false),
    ("Hidratação Capilar", "Tratamento", 4500, 40, false),
];

/// (name, specialties, years of experience)
const PROFESSIONALS: &[(&str, &[&str], i64)] = &[
    ("Carlos Silva", &["Corte", "Barba"], 12),
    ("Rafael Souza", &["Corte", "Degradê"], 6),
    ("Marcos Lima", &["Barba", "Tratamento"], 4),
];

/// (name, category, price, cost, [pp, p, m, g, gg], brand, color, material)
type ProductSeed = (&'static str, &'static str, i64, i64, [i64; 5], &'static str, &'static str, &'static str);

const PRODUCTS: &[ProductSeed] = &[
    ("Camiseta Básica Preta", "Camisetas", 2990, 1500, [5, 10, 20, 15, 5], "Básico", "Preta", "Algodão"),
    ("Camiseta Básica Branca", "Camisetas", 2990, 1500, [3, 12, 25, 18, 7], "Básico", "Branca", "Algodão"),
    ("Boné Aba Reta", "Bonés", 3500, 1800, [0, 0, 0, 0, 0], "Street", "Preto", "Algodão"),
    ("Short Esportivo", "Shorts", 4590, 2200, [0, 8, 15, 12, 5], "Sports", "Preto", "Poliéster"),
    ("Meia Esportiva", "Meias", 1590, 500, [0, 0, 0, 0, 0], "Sports", "Branca", "Algodão"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./barbearia_dev.db");

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
                println!("Barbearia Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./barbearia_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Barbearia Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    db.settings()
        .update(&ShopSettingsInput {
            name: "Barbearia do Centro".to_string(),
            phone: Some("(11) 3333-4444".to_string()),
            address: Some("Rua Principal, 100 - Centro".to_string()),
            opening_hours: Some("Seg a Sáb, 09h às 19h".to_string()),
            active: true,
        })
        .await?;
    println!("✓ Shop settings written");

    if db.services().count().await? > 0 {
        println!("⚠ Catalog already has services, skipping services and professionals");
    } else {
        for (name, category, price, duration, featured) in SERVICES {
            let input = ServiceInput {
                name: name.to_string(),
                description: None,
                price: Money::from_cents(*price),
                category: category.to_string(),
                available: true,
                featured: *featured,
                duration_minutes: *duration,
                tags: vec![category.to_lowercase()],
            };
            db.services().create(&input).await?;
        }
        println!("✓ {} services created", SERVICES.len());

        for (name, specialties, years) in PROFESSIONALS {
            let input = ProfessionalInput {
                full_name: name.to_string(),
                phone: None,
                email: None,
                specialties: specialties.iter().map(|s| s.to_string()).collect(),
                bio: None,
                years_experience: *years,
                rating: None,
                active: true,
            };
            db.professionals().create(&input).await?;
        }
        println!("✓ {} professionals created", PROFESSIONALS.len());
    }

    let mut created = 0;
    for (name, category, price, cost, [pp, p, m, g, gg], brand, color, material) in PRODUCTS {
        if db.products().exists_by_name(name).await? {
            println!("  Product \"{}\" already exists, skipping", name);
            continue;
        }

        let input = ProductInput {
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            price: Money::from_cents(*price),
            cost_price: Money::from_cents(*cost),
            stock: StockCounts::new(*pp, *p, *m, *g, *gg)?,
            minimum_stock: 5,
            brand: Some(brand.to_string()),
            color: Some(color.to_string()),
            material: Some(material.to_string()),
            tags: Vec::new(),
            active: true,
            featured: false,
        };

        if let Err(e) = db.products().create(&input).await {
            eprintln!("Failed to insert {}: {}", name, e);
            continue;
        }
        created += 1;
    }
    println!("✓ {} products created", created);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
