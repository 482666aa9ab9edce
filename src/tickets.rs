//! Issue ticket submission.
//!
//! A ticket is created with a single create call. There is no retry and no
//! idempotency key: if the create succeeds on the server but the response is
//! lost, submitting again files a duplicate ticket.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credential::Session;
use crate::error::{Result, StockdeskError};
use crate::fields::MappingTable;
use crate::remote::ListStore;
use crate::types::{Fields, InventoryRecord, ItemId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TicketPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 3] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = StockdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            _ => Err(StockdeskError::InvalidArgument(format!(
                "invalid priority '{s}', expected Low, Medium or High"
            ))),
        }
    }
}

const REQUIRED_MESSAGE: &str = "Title and description are required.";

/// The report-issue form as the user filled it in.
///
/// A missing title is allowed when an item is given; it is then derived
/// from the item with [`suggested_title`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueReport {
    pub title: Option<String>,
    pub description: String,
    pub priority: TicketPriority,
    pub item: Option<ItemId>,
}

impl IssueReport {
    /// Reject a blank form before anything is sent
    pub fn validate(&self) -> Result<()> {
        let has_title = match self.title.as_deref() {
            Some(title) => !title.trim().is_empty(),
            None => self.item.is_some(),
        };
        if !has_title || self.description.trim().is_empty() {
            return Err(StockdeskError::Validation(REQUIRED_MESSAGE.to_string()));
        }
        Ok(())
    }
}

/// A ticket ready to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub reporter_id: UserId,
    pub related_item_id: Option<ItemId>,
}

impl TicketDraft {
    /// Title and description are required
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(StockdeskError::Validation(REQUIRED_MESSAGE.to_string()));
        }
        Ok(())
    }

    /// Build the create payload using the ticket list's columns
    pub fn to_fields(&self, table: &MappingTable) -> Fields {
        let column = |display: &'static str| -> String {
            match table.get(display) {
                Some(mapping) => mapping.write_column().into_owned(),
                None => display.to_string(),
            }
        };

        let mut fields = Fields::new();
        fields.insert(column("Title"), Value::String(self.title.clone()));
        fields.insert(column("Description"), Value::String(self.description.clone()));
        fields.insert(column("Priority"), Value::String(self.priority.to_string()));
        fields.insert(column("Reported By"), Value::from(self.reporter_id.0));
        if let Some(item_id) = self.related_item_id {
            fields.insert(column("Related Item"), Value::from(item_id.0));
        }
        fields
    }
}

/// Default title for a ticket raised from an inventory item
pub fn suggested_title(item: &InventoryRecord) -> String {
    format!("Issue with {}", item.text("Item"))
}

/// Resolve the site user id for the session's principal.
///
/// The session identity is authoritative; a mismatch with `principal_email`
/// is logged but does not fail the call.
pub async fn resolve_current_user_id<S: ListStore>(
    store: &S,
    session: &Session,
    principal_email: &str,
) -> Result<UserId> {
    let user = store
        .current_user(session)
        .await
        .inspect_err(|e| tracing::error!(principal = principal_email, "current_user failed: {e}"))?;

    let matches_principal = user
        .email
        .as_deref()
        .is_some_and(|email| email.eq_ignore_ascii_case(principal_email))
        || user
            .login_name
            .to_lowercase()
            .ends_with(&principal_email.to_lowercase());
    if !matches_principal {
        tracing::warn!(
            principal = principal_email,
            login = %user.login_name,
            "signed-in user does not match principal"
        );
    }

    tracing::debug!(user_id = %user.id, "resolved current user");
    Ok(user.id)
}

/// Create a ticket from a draft, returning the new ticket id
pub async fn submit_ticket<S: ListStore>(
    store: &S,
    session: &Session,
    table: &MappingTable,
    list: &str,
    draft: TicketDraft,
) -> Result<ItemId> {
    draft.validate()?;
    let fields = draft.to_fields(table);

    let id = store
        .create_item(session, list, &fields)
        .await
        .inspect_err(|e| tracing::error!(list, title = %draft.title, "create_item failed: {e}"))?;

    tracing::debug!(list, %id, title = %draft.title, "created ticket");
    Ok(id)
}
