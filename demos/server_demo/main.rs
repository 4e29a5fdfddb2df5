//! A small server-shaped demo of the full flow: two registered configs, the
//! default flag/file/env sources, and trailing arguments as the command.
//!
//! Try:
//!
//! ```text
//! cargo run --example server_demo -- --help
//! cargo run --example server_demo -- --database.driver mysql serve
//! DATABASE_URL=postgres://db cargo run --example server_demo -- serve
//! cargo run --example server_demo -- template
//! ```

use std::time::Duration;

use figset::sources::JsonCodec;
use figset::{Schema, Set, StructBuilder};

#[derive(Debug, Default)]
struct DbConfig {
    driver: String,
    url: String,
    pool: PoolConfig,
}

#[derive(Debug, Default)]
struct PoolConfig {
    size: u16,
    idle_timeout: Duration,
}

impl Schema for DbConfig {
    fn schema(b: &mut StructBuilder<'_, Self>) {
        b.field("driver", |c| &mut c.driver)
            .default_text("sqlite3")
            .help("database driver name");
        b.field("url", |c| &mut c.url)
            .default_text("./db")
            .help("database connection url");
        b.nested("pool", |c| &mut c.pool);
    }
}

impl Schema for PoolConfig {
    fn schema(b: &mut StructBuilder<'_, Self>) {
        b.field("size", |c| &mut c.size)
            .default_text("5")
            .help("connections kept open");
        b.field("idle_timeout", |c| &mut c.idle_timeout)
            .default_text("90s")
            .help("how long an idle connection is kept");
    }
}

#[derive(Debug, Default)]
struct ServerConfig {
    host: String,
    port: u16,
}

impl Schema for ServerConfig {
    fn schema(b: &mut StructBuilder<'_, Self>) {
        b.field("host", |c| &mut c.host)
            .default_text("127.0.0.1")
            .help("address to bind");
        b.field("port", |c| &mut c.port)
            .default_text("8080")
            .help("port to listen on");
    }
}

fn main() {
    let mut set = Set::new("server_demo");
    let db = set
        .register_value("database", DbConfig::default())
        .expect("database schema is valid");
    let server = set
        .register_value("server", ServerConfig::default())
        .expect("server schema is valid");

    let rest = set.parse_or_exit(std::env::args().skip(1));

    match rest.first().map(String::as_str) {
        Some("template") => {
            let path = std::path::Path::new("server_demo.json");
            if let Err(err) = set.write_template(path, &JsonCodec) {
                eprintln!("server_demo: {err}");
                std::process::exit(125);
            }
            println!("wrote {}", path.display());
        }
        Some("serve") | None => {
            let server = set.value_of(&server);
            let db = set.value_of(&db);
            println!("listening on {}:{}", server.host, server.port);
            println!(
                "database: {} at {} (pool {}, idle {:?})",
                db.driver, db.url, db.pool.size, db.pool.idle_timeout
            );
        }
        Some(other) => {
            eprintln!("server_demo: unknown command {other:?}");
            std::process::exit(125);
        }
    }
}
