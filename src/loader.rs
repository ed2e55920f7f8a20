//! Loading customer records from JSON.
//!
//! The data file is a JSON array of customer objects. Loading fails fast:
//! a malformed file is reported before any pipeline stage runs.

use crate::error::{Result, StreamError};
use crate::record::Customer;
use std::fs;
use std::path::Path;
use tracing::info;

/// Parse a JSON array of customers.
pub fn parse_customers(text: &str) -> Result<Vec<Customer>> {
    Ok(serde_json::from_str(text)?)
}

/// Read and parse a JSON customer file.
pub fn load_customers(path: impl AsRef<Path>) -> Result<Vec<Customer>> {
    let path = path.as_ref();
    let load_err = |source: StreamError| StreamError::Load {
        path: path.to_path_buf(),
        source: Box::new(source),
    };

    let text = fs::read_to_string(path).map_err(|e| load_err(e.into()))?;
    let customers = parse_customers(&text).map_err(load_err)?;
    info!(path = %path.display(), count = customers.len(), "loaded customers");
    Ok(customers)
}
