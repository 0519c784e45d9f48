//! Login and logout - attach or detach the remote identity

use anyhow::Result;
use tally_core::config::RemoteSettings;
use tally_core::Identity;

use super::get_context;
use crate::output;

pub fn login(
    user_id: String,
    token: String,
    email: Option<String>,
    url: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let mut ctx = get_context("login")?;

    if url.is_some() || api_key.is_some() {
        let remote = ctx.config.remote.get_or_insert_with(RemoteSettings::default);
        if let Some(url) = url {
            remote.url = url;
        }
        if let Some(key) = api_key {
            remote.api_key = key;
        }
    }

    let mut identity = Identity::new(user_id, token);
    if let Some(email) = email {
        identity = identity.with_email(email);
    }
    let label = identity.display_name();

    ctx.login(identity)?;
    output::success(&format!(
        "Signed in as {}. {} account(s) loaded.",
        label,
        ctx.ledger.accounts().len()
    ));
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut ctx = get_context("logout")?;

    if ctx.ledger.identity().is_none() {
        output::info("Not signed in.");
        return Ok(());
    }

    ctx.logout()?;
    output::success("Signed out. Local data is kept.");
    Ok(())
}
