//! Example: Blog Application Schema
//!
//! This example declares the tables of a small blog application with
//! `#[derive(Entity)]` and prints the DDL each supported dialect would use to
//! create them, plus the equivalent JSON schema file for the CLI.
//!
//! Run with: cargo run --example user_schema -p oxide-sync

use oxide_sync::ddl::{generate_create_table, join_statements};
use oxide_sync::prelude::*;

// =============================================================================
// Entity Definitions
// =============================================================================

/// Registered authors.
#[allow(dead_code)]
#[derive(Entity)]
#[entity(table = "users", version = 2, comment = "Blog authors", engine = "InnoDB")]
struct User {
    #[field(auto_increment)]
    id: i64,
    #[field(length = 100, unique = "username")]
    username: String,
    #[field(length = 255, unique = "email")]
    email: String,
    #[field(default = "true")]
    is_active: bool,
    #[field(default_expr = "CURRENT_TIMESTAMP")]
    created_at: chrono::NaiveDateTime,
    #[field(version = 2, length = 500, comment = "Short biography")]
    bio: Option<String>,
    #[field(ignore)]
    password_cache: Option<String>,
}

/// Articles written by users.
#[allow(dead_code)]
#[derive(Entity)]
#[entity(table = "posts")]
struct Post {
    #[field(auto_increment)]
    id: i64,
    #[field(index = "author")]
    author_id: i64,
    #[field(length = 200)]
    title: String,
    #[field(sql_type = "TEXT")]
    body: String,
    #[field(default = "0")]
    view_count: i32,
    published_at: Option<chrono::NaiveDateTime>,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("{}", "=".repeat(70));
    println!(" OXIDE-SYNC: Blog Application Schema");
    println!("{}", "=".repeat(70));
    println!();

    let tables = vec![TableMetadata::of::<User>()?, TableMetadata::of::<Post>()?];

    for dialect in [Dialect::MySql, Dialect::Postgres, Dialect::H2] {
        println!("-- {} {}", dialect, "-".repeat(60));
        for table in &tables {
            let statements = generate_create_table(table, dialect)?;
            println!("{};\n", join_statements(&statements));
        }
    }

    println!("{}", "-".repeat(70));
    println!("Schema file for `oxide-sync --schema`:");
    let descriptors = vec![User::descriptor(), Post::descriptor()];
    println!("{}", serde_json::to_string_pretty(&descriptors)?);

    Ok(())
}
