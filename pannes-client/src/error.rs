#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("invalid data store url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid table name: {0:?}")]
    InvalidTable(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data store answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Table names end up in URLs and SQL text, so only plain identifiers pass.
pub fn check_table_name(table: &str) -> Result<&str, ClientError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit());

    if valid {
        Ok(table)
    } else {
        Err(ClientError::InvalidTable(table.to_string()))
    }
}
