//! `report`: file an issue ticket, optionally against an inventory item.

use owo_colors::OwoColorize;
use serde_json::json;

use super::open_desk;
use crate::error::Result;
use crate::tickets::{IssueReport, TicketPriority};
use crate::types::ItemId;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Defaults to "Issue with <item>" when an item is given
    pub title: Option<String>,
    pub description: String,
    pub priority: TicketPriority,
    pub item: Option<ItemId>,
    pub json: bool,
}

pub async fn cmd_report(user: Option<&str>, options: ReportOptions) -> Result<()> {
    let report = IssueReport {
        title: options.title,
        description: options.description,
        priority: options.priority,
        item: options.item,
    };
    report.validate()?;

    let desk = open_desk(user)?;
    let (ticket_id, title) = desk.report_issue(report).await?;

    if options.json {
        let output = json!({
            "id": ticket_id,
            "title": title,
            "priority": options.priority.as_str(),
            "related_item": options.item,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{} ticket {}: {}",
            "Submitted".green(),
            ticket_id.to_string().bold(),
            title
        );
    }
    Ok(())
}
