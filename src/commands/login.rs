use owo_colors::OwoColorize;

use super::credentials;
use crate::config::Config;
use crate::desk::Desk;
use crate::error::Result;

/// Check that the configured credentials can sign in and reach the site
pub async fn cmd_login(user: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let (principal, secret) = credentials(user)?;
    let desk = Desk::from_config(&config)?;

    desk.test_connection(&principal, &secret).await?;

    let site = config.site_url().unwrap_or_default();
    println!(
        "{} as {} to {}",
        "Signed in".green(),
        principal.bold(),
        site.dimmed()
    );
    Ok(())
}
