//! The operations a front-end drives.
//!
//! A [`Desk`] bundles the credential context, the two mapping tables and the
//! configured list names. It keeps no state between calls apart from the
//! credential; every operation signs in afresh.

use crate::config::{Config, ListsConfig};
use crate::credential::CredentialContext;
use crate::error::{Result, StockdeskError};
use crate::fields::MappingTable;
use crate::items::{self, Changes};
use crate::pager::{self, Page};
use crate::probe;
use crate::query::{self, FieldFilter};
use crate::remote::{ListStore, SharePointStore};
use crate::tickets::{self, IssueReport, TicketDraft};
use crate::types::{InventoryRecord, ItemId, UserId};

pub struct Desk<S> {
    context: CredentialContext<S>,
    inventory: MappingTable,
    tickets: MappingTable,
    lists: ListsConfig,
    page_size: usize,
}

impl Desk<SharePointStore> {
    /// Create a desk talking to the configured SharePoint site
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = SharePointStore::from_config(config)?;
        Self::new(store, config)
    }
}

impl<S: ListStore> Desk<S> {
    pub fn new(store: S, config: &Config) -> Result<Self> {
        if config.page_size == 0 {
            return Err(StockdeskError::InvalidArgument(
                "page size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            context: CredentialContext::new(store),
            inventory: MappingTable::inventory(),
            tickets: MappingTable::tickets(),
            lists: config.lists.clone(),
            page_size: config.page_size,
        })
    }

    pub fn set_credentials(&mut self, principal: impl Into<String>, secret: impl Into<String>) {
        self.context.set_credentials(principal, secret);
    }

    pub fn clear_credentials(&mut self) {
        self.context.clear();
    }

    pub fn principal(&self) -> Option<&str> {
        self.context.principal()
    }

    pub fn inventory_table(&self) -> &MappingTable {
        &self.inventory
    }

    pub fn store(&self) -> &S {
        self.context.store()
    }

    /// Load one page of the inventory, optionally filtered by a substring
    /// match on a display field. Page numbers below 1 are treated as 1.
    pub async fn load_page(
        &self,
        page_number: usize,
        field: Option<&str>,
        value: Option<&str>,
    ) -> Result<Page> {
        let page_number = page_number.max(1);
        let filter = FieldFilter::from_parts(field, value);

        let session = self.context.session().await?;
        let records = query::list_items(
            self.context.store(),
            &session,
            &self.inventory,
            &self.lists.inventory,
            filter.as_ref(),
        )
        .await?;

        pager::paginate(records, self.page_size, page_number)
    }

    pub async fn load_item(&self, id: ItemId) -> Result<InventoryRecord> {
        let session = self.context.session().await?;
        items::get_item(
            self.context.store(),
            &session,
            &self.inventory,
            &self.lists.inventory,
            id,
        )
        .await
    }

    /// Look an item up by serial number, then by name
    pub async fn find_item(&self, value: &str) -> Result<Option<InventoryRecord>> {
        let session = self.context.session().await?;
        query::find_item(
            self.context.store(),
            &session,
            &self.inventory,
            &self.lists.inventory,
            value,
        )
        .await
    }

    pub async fn save_item(&self, id: ItemId, changes: &Changes) -> Result<()> {
        // Reject bad input before signing in
        items::coerce_changes(&self.inventory, changes)?;

        let session = self.context.session().await?;
        items::update_item(
            self.context.store(),
            &session,
            &self.inventory,
            &self.lists.inventory,
            id,
            changes,
        )
        .await
    }

    pub async fn current_user_id(&self) -> Result<UserId> {
        let principal = self
            .context
            .principal()
            .ok_or(StockdeskError::NotAuthenticated)?;
        let session = self.context.session().await?;
        tickets::resolve_current_user_id(self.context.store(), &session, principal).await
    }

    /// Title to prefill when reporting an issue against an item
    pub async fn suggest_ticket_title(&self, item_id: ItemId) -> Result<String> {
        let item = self.load_item(item_id).await?;
        Ok(tickets::suggested_title(&item))
    }

    pub async fn submit_ticket(&self, draft: TicketDraft) -> Result<ItemId> {
        draft.validate()?;

        let session = self.context.session().await?;
        tickets::submit_ticket(
            self.context.store(),
            &session,
            &self.tickets,
            &self.lists.tickets,
            draft,
        )
        .await
    }

    /// Submit a filled-in report form under a single session.
    ///
    /// The form is checked before signing in. Returns the new ticket id and
    /// the title it was filed under.
    pub async fn report_issue(&self, report: IssueReport) -> Result<(ItemId, String)> {
        report.validate()?;
        let principal = self
            .context
            .principal()
            .ok_or(StockdeskError::NotAuthenticated)?;

        let session = self.context.session().await?;
        let store = self.context.store();

        let title = match (report.title, report.item) {
            (Some(title), _) => title,
            (None, Some(item_id)) => {
                let item =
                    items::get_item(store, &session, &self.inventory, &self.lists.inventory, item_id)
                        .await?;
                tickets::suggested_title(&item)
            }
            (None, None) => String::new(),
        };

        let reporter_id = tickets::resolve_current_user_id(store, &session, principal).await?;
        let draft = TicketDraft {
            title: title.clone(),
            description: report.description,
            priority: report.priority,
            reporter_id,
            related_item_id: report.item,
        };
        let id = tickets::submit_ticket(store, &session, &self.tickets, &self.lists.tickets, draft)
            .await?;
        Ok((id, title))
    }

    /// Check a principal and secret without storing them
    pub async fn test_connection(&self, principal: &str, secret: &str) -> Result<()> {
        probe::probe(self.context.store(), principal, secret).await
    }
}
