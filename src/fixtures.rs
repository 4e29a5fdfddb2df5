#[cfg(test)]
pub mod test {
    use std::any::Any;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use crate::field::Field;
    use crate::schema::{Schema, StructBuilder, extract};

    /// The shared config shape used across source and set tests.
    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct DbConfig {
        pub driver: String,
        pub url: String,
        pub pool: PoolConfig,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct PoolConfig {
        pub size: u16,
        pub idle_timeout: Duration,
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

    /// A second registration for multi-config tests. `host` deliberately has
    /// no default.
    #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
    }

    impl Schema for ServerConfig {
        fn schema(b: &mut StructBuilder<'_, Self>) {
            b.field("host", |c| &mut c.host).help("address to bind");
            b.field("port", |c| &mut c.port)
                .default_text("8080")
                .help("port to listen on");
        }
    }

    /// A `DbConfig` extracted under the `database` prefix, defaults applied,
    /// ready to wrap in a `FieldSet`.
    pub fn extracted() -> (Vec<Field>, Vec<Box<dyn Any>>) {
        let mut config = Box::new(DbConfig::default());
        let fields =
            extract::<DbConfig>("database", config.as_mut()).expect("fixture schema is valid");
        (fields, vec![config as Box<dyn Any>])
    }

    #[test]
    fn fixture_defaults_load() {
        let (fields, roots) = extracted();
        assert_eq!(fields.len(), 4);
        let config = roots[0].downcast_ref::<DbConfig>().unwrap();
        assert_eq!(config.driver, "sqlite3");
        assert_eq!(config.pool.idle_timeout, Duration::from_secs(90));
    }
}
