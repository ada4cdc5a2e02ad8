//! Renders a view (looked up by its URL name) and prints the PNG as a
//! base64 data URI.
//!
//! ```text
//! cargo run --example view_image -- SalesOverview Region=West
//! ```

use anyhow::{bail, Context};
use base64::Engine;
use tableau_rest::{Client, Config, ImageOptions};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(view_name) = args.next() else {
        bail!("usage: view_image <view-url-name> [field=value ...]");
    };

    let mut options = ImageOptions::default().with_max_age(1);
    for arg in args {
        let (field, value) = arg
            .split_once('=')
            .with_context(|| format!("view filter {:?} is not field=value", arg))?;
        options = options.with_view_filter(field, value);
    }

    let client = Client::new(Config::from_env()).context("invalid TABLEAU_* configuration")?;
    let api = client.workbooks_views();

    let views = api.get_view_by_path(&view_name)?;
    let Some(view_id) = views.first().and_then(|v| v.id.clone()) else {
        bail!("no view named {:?}", view_name);
    };

    let image = api.query_view_image(&view_id, &options)?;
    println!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&image)
    );

    client.authentication().sign_out()?;
    Ok(())
}
