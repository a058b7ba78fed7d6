// TIPS Account Lookup - Core Library
// Shared by the one-shot CLI and the API server

pub mod config;
pub mod error;
pub mod handler;
pub mod keys;
pub mod normalize;
#[cfg(feature = "server")]
pub mod server;
pub mod xml;
pub mod years;

// Re-export commonly used types
pub use config::{ConfigError, LogLevel, TipsConfig};
pub use error::{LookupError, NormalizeError};
pub use handler::{
    AccountEnvelope, AccountLookup, AccountQuery, ErrorEnvelope, InvocationContext,
    LookupBody, LookupResponse, QueryEcho,
};
pub use keys::{camel_case_keys, to_camel_case, year_block_key, year_field_key, YearField};
pub use normalize::{normalize, parse_tips_date, AccountResult, PropertyInfo};
pub use xml::{parse_document, RawRecord, RawValue};
pub use years::{collect_years, infer_full_year, YearBalance};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global fmt subscriber; `RUST_LOG` wins over the configured level
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_filter_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
