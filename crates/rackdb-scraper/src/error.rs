use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("parse error for product {store_product_id}: {reason}")]
    Parse {
        store_product_id: String,
        reason: String,
    },

    #[error("no adapter registered for brand {0:?}")]
    UnknownBrand(String),
}
