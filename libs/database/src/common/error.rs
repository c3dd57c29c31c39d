/// Error type for connection management
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Health check failed
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// Applying the bootstrap schema failed
    #[error("Schema error: {0}")]
    Schema(String),
}
