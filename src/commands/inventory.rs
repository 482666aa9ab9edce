//! Inventory commands.
//!
//! - `ls`: page through the inventory, optionally filtered
//! - `show`: display one item
//! - `find`: look an item up by serial number or name
//! - `set`: apply `Field=Value` changes to an item

use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use super::{format_record, open_desk};
use crate::error::{Result, StockdeskError};
use crate::items::Changes;
use crate::pager::Page;
use crate::types::{ID_KEY, ItemId};

/// List one page of inventory items
pub async fn cmd_ls(
    user: Option<&str>,
    page: usize,
    field: Option<&str>,
    value: Option<&str>,
    output_json: bool,
) -> Result<()> {
    let desk = open_desk(user)?;
    let page = desk.load_page(page, field, value).await?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    let columns: Vec<&str> = desk.inventory_table().display_names().collect();
    println!("{}", render_page(&page, &columns));
    Ok(())
}

/// Show a single item
pub async fn cmd_show(user: Option<&str>, id: &str, output_json: bool) -> Result<()> {
    let id: ItemId = id.parse()?;
    let desk = open_desk(user)?;
    let item = desk.load_item(id).await?;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("{} {}", "Item".cyan().bold(), id.to_string().bold());
    println!("{}", format_record(&item));
    Ok(())
}

/// Find an item by serial number, falling back to its name
pub async fn cmd_find(user: Option<&str>, value: &str, output_json: bool) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StockdeskError::Validation(
            "Please enter an Item Name or Serial Number.".to_string(),
        ));
    }

    let desk = open_desk(user)?;
    let Some(item) = desk.find_item(value).await? else {
        if output_json {
            println!("null");
        } else {
            println!("{}", "No items found matching your search.".dimmed());
        }
        return Ok(());
    };

    if output_json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("{} {}", "Item".cyan().bold(), item.id.to_string().bold());
    println!("{}", format_record(&item));
    Ok(())
}

/// Update fields of an item from `Field=Value` arguments
pub async fn cmd_set(user: Option<&str>, id: &str, assignments: &[String]) -> Result<()> {
    let id: ItemId = id.parse()?;
    let changes = parse_assignments(assignments)?;

    let desk = open_desk(user)?;
    let editable: Vec<&str> = desk.inventory_table().editable_names().collect();
    for name in changes.keys() {
        if !editable.contains(&name.as_str()) {
            eprintln!(
                "{} ignoring '{}': not an editable field",
                "warning:".yellow(),
                name
            );
        }
    }

    desk.save_item(id, &changes).await?;
    println!("{} item {}", "Updated".green(), id);
    Ok(())
}

/// Parse `Field=Value` pairs. Values may be empty to clear a field.
pub fn parse_assignments(assignments: &[String]) -> Result<Changes> {
    let mut changes = Changes::new();
    for assignment in assignments {
        let (field, value) = assignment.split_once('=').ok_or_else(|| {
            StockdeskError::Validation(format!(
                "invalid change '{assignment}', expected Field=Value"
            ))
        })?;
        let field = field.trim();
        if field.is_empty() {
            return Err(StockdeskError::Validation(format!(
                "invalid change '{assignment}', field name is empty"
            )));
        }
        changes.insert(field.to_string(), value.to_string());
    }
    Ok(changes)
}

/// Render a page as a table followed by a `Page x of y` footer
pub fn render_page(page: &Page, columns: &[&str]) -> String {
    if page.items.is_empty() {
        return format!(
            "{}\n{}",
            "No items found.".dimmed(),
            page_footer(page)
        );
    }

    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once(ID_KEY.to_string()).chain(columns.iter().map(|c| c.to_string())),
    );
    for item in &page.items {
        builder.push_record(
            std::iter::once(item.id.to_string()).chain(columns.iter().map(|c| item.text(c))),
        );
    }

    let mut table = builder.build();
    table.with(Style::modern());
    format!("{}\n{}", table, page_footer(page))
}

fn page_footer(page: &Page) -> String {
    let mut footer = format!(
        "Page {} of {} ({} items)",
        page.page_number, page.total_pages, page.total_items
    );
    if page.has_next {
        footer.push_str(&format!(" - next: --page {}", page.page_number + 1));
    }
    footer
}
