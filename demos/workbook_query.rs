//! Prints the workbooks of a site with their views. Pass an owner name to
//! restrict the listing to that owner's workbooks.

use anyhow::Context;
use tableau_rest::{Client, Config, Filter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let filter = std::env::args()
        .nth(1)
        .map(|owner| Filter::new().eq("ownerName", owner));

    let client = Client::new(Config::from_env()).context("invalid TABLEAU_* configuration")?;
    let api = client.workbooks_views();

    let workbooks = api
        .query_workbooks_for_site(filter.as_ref())
        .context("failed to list workbooks")?;

    for workbook in &workbooks {
        let id = workbook.id.as_deref().unwrap_or_default();
        println!(
            "{} ({})",
            workbook.name.as_deref().unwrap_or("<unnamed>"),
            workbook.project.as_ref().and_then(|p| p.name.as_deref()).unwrap_or("no project"),
        );

        for view in api.query_views_for_workbook(id)? {
            println!(
                "    {:<38} {}",
                view.id.as_deref().unwrap_or("-"),
                view.name.as_deref().unwrap_or("-"),
            );
        }
    }

    client.authentication().sign_out()?;
    Ok(())
}
