use async_trait::async_trait;
use cortex_core::TabularResult;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::session::Session;

/// Runs generated SQL against the warehouse.
#[async_trait]
pub trait SqlRunner: Send + Sync {
    async fn execute(&self, session: &Session, sql: &str) -> Result<TabularResult, RemoteError>;
}

/// [`SqlRunner`] backed by the session's statement endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SqlRunner for QueryExecutor {
    async fn execute(&self, session: &Session, sql: &str) -> Result<TabularResult, RemoteError> {
        let sql = sql.trim();
        if sql.is_empty() {
            warn!("No SQL query to execute");
            return Err(RemoteError::EmptyStatement);
        }

        match session.run_statement(sql, &[]).await {
            Ok(table) => {
                debug!(rows = table.row_count(), columns = table.columns.len(), "Query executed");
                Ok(table)
            }
            Err(e) => {
                warn!(error = %e, "SQL execution failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortex_core::AssistantConfig;

    #[tokio::test]
    async fn test_empty_sql_is_rejected() {
        let session = Session::new(AssistantConfig::default()).unwrap();
        let result = QueryExecutor::new().execute(&session, "   \n").await;
        assert!(matches!(result, Err(RemoteError::EmptyStatement)));
    }

    #[tokio::test]
    async fn test_execute_requires_login() {
        let session = Session::new(AssistantConfig::default()).unwrap();
        let result = QueryExecutor::new().execute(&session, "SELECT 1").await;
        assert!(matches!(result, Err(RemoteError::NotAuthenticated)));
    }
}
