use crate::app::Settings;
use crate::output::{print_json, print_table};
use anyhow::{bail, Context, Result};
use rotator_core::{AvatarApi, AvatarClient};

pub fn run(settings: &Settings, cookie: Option<String>, json: bool) -> Result<()> {
    let cookie = match cookie {
        Some(cookie) => cookie,
        None => settings.store()?.load().context("could not read config")?.cookie,
    };
    let cookie = cookie.trim();
    if cookie.is_empty() {
        bail!("no cookie: pass --cookie or save one in Settings");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(list(settings, cookie, json))
}

async fn list(settings: &Settings, cookie: &str, json: bool) -> Result<()> {
    let client = AvatarClient::new(settings.endpoints(), cookie)?;
    let user = client
        .authenticated_user()
        .await
        .context("Invalid cookie. Could not authenticate.")?;
    let outfits = client
        .list_outfits()
        .await
        .context("could not list outfits")?;

    if json {
        return print_json(&outfits);
    }

    println!("{} (@{}, id {})", user.display_name, user.name, user.id);
    if outfits.is_empty() {
        println!("No avatar outfits.");
        return Ok(());
    }
    let rows = outfits
        .iter()
        .map(|o| vec![o.id.to_string(), o.name.clone()])
        .collect();
    print_table(&["ID", "NAME"], rows);
    Ok(())
}
