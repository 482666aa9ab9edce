//! Connection testing for the login screen.
//!
//! Failures are split two ways. A rejected credential is something the user
//! can fix by retyping; every other failure gets a generic connection
//! message.

use crate::credential::Credential;
use crate::error::{Result, StockdeskError};
use crate::remote::ListStore;
use crate::remote::error::is_credential_rejection;

/// Sign in and load the site, classifying any failure
pub async fn probe<S: ListStore>(store: &S, principal: &str, secret: &str) -> Result<()> {
    let credential = Credential::new(principal, secret);

    let result = async {
        let session = store.authenticate(&credential).await?;
        store.load_site(&session).await
    }
    .await;

    result.map_err(|e| {
        let classified = classify_failure(e);
        tracing::error!(principal, "connection test failed: {classified}");
        classified
    })?;

    tracing::debug!(principal, "connection test succeeded");
    Ok(())
}

/// Reduce any failure to `InvalidCredentials` or `Transport`
pub fn classify_failure(error: StockdeskError) -> StockdeskError {
    match error {
        StockdeskError::InvalidCredentials(_) | StockdeskError::Transport(_) => error,
        other => {
            let message = other.to_string();
            if is_credential_rejection(&message) {
                StockdeskError::InvalidCredentials(message)
            } else {
                StockdeskError::Transport(message)
            }
        }
    }
}
