//! Screen transitions for a front-end shell.
//!
//! Screens never call each other. They emit a [`NavigationEvent`] and the
//! shell decides which [`Screen`] comes next. The data-access modules know
//! nothing about either type.

use crate::types::ItemId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    Home,
    Inventory,
    /// Item editor; `None` shows an empty search form
    ItemDashboard { item_id: Option<ItemId> },
    /// Ticket form; `Some` ties the ticket to an item
    ReportIssue { item_id: Option<ItemId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    LoginSucceeded { principal: String },
    ShowHome,
    ShowInventory,
    ShowItemDashboard,
    ShowSubmitTicket,
    ItemSelected(ItemId),
    ReportIssueRequested(ItemId),
    TicketSubmitted,
    Logout,
}

/// Current screen plus the signed-in principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    screen: Screen,
    principal: Option<String>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            principal: None,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Apply an event and return the screen to show.
    ///
    /// Until a login succeeds every other event is ignored.
    pub fn dispatch(&mut self, event: NavigationEvent) -> &Screen {
        if self.principal.is_none() && !matches!(event, NavigationEvent::LoginSucceeded { .. }) {
            tracing::debug!(?event, "ignoring navigation before login");
            return &self.screen;
        }

        self.screen = match event {
            NavigationEvent::LoginSucceeded { principal } => {
                self.principal = Some(principal);
                Screen::Home
            }
            NavigationEvent::ShowHome | NavigationEvent::TicketSubmitted => Screen::Home,
            NavigationEvent::ShowInventory => Screen::Inventory,
            NavigationEvent::ShowItemDashboard => Screen::ItemDashboard { item_id: None },
            NavigationEvent::ShowSubmitTicket => Screen::ReportIssue { item_id: None },
            NavigationEvent::ItemSelected(id) => Screen::ItemDashboard { item_id: Some(id) },
            NavigationEvent::ReportIssueRequested(id) => Screen::ReportIssue { item_id: Some(id) },
            NavigationEvent::Logout => {
                self.principal = None;
                Screen::Login
            }
        };
        &self.screen
    }
}
