pub mod commands;
pub mod config;
pub mod credential;
pub mod desk;
pub mod error;
pub mod fields;
pub mod items;
pub mod navigation;
pub mod pager;
pub mod probe;
pub mod query;
pub mod remote;
pub mod tickets;
pub mod types;

pub use config::Config;
pub use credential::{Credential, CredentialContext, Session, authenticate};
pub use desk::Desk;
pub use error::{Result, StockdeskError};
pub use fields::{FieldKind, FieldMapping, MappingTable, Resolved};
pub use items::Changes;
pub use navigation::{NavigationEvent, Screen, Shell};
pub use pager::{Page, paginate};
pub use query::FieldFilter;
pub use remote::{ListStore, SharePointStore, StoreFilter};
pub use tickets::{IssueReport, TicketDraft, TicketPriority};
pub use types::{FieldValue, Fields, InventoryRecord, ItemId, StoreItem, UserId, UserIdentity};
