//! Lists the users of a site, optionally restricted to the names given on
//! the command line.
//!
//! ```text
//! TABLEAU_HOST=https://tableau.example.com TABLEAU_USERNAME=admin \
//! TABLEAU_PASSWORD=secret TABLEAU_SITE=marketing \
//!     cargo run --example users_on_site -- alice bob
//! ```

use anyhow::Context;
use tableau_rest::{Client, Config};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let names: Vec<String> = std::env::args().skip(1).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let client = Client::new(Config::from_env()).context("invalid TABLEAU_* configuration")?;
    let users = client
        .users_groups()
        .get_users_on_site(&names)
        .context("failed to list users")?;

    for user in &users {
        println!(
            "{:<38} {:<24} {}",
            user.id.as_deref().unwrap_or("-"),
            user.name.as_deref().unwrap_or("-"),
            user.site_role.as_deref().unwrap_or("-"),
        );
    }
    println!("{} users", users.len());

    client.authentication().sign_out()?;
    Ok(())
}
