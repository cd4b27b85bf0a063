use std::time::Duration;

use anyhow::{Context, Result};

use wreck::config::WreckConfig;
use wreck::lightning::{LightningAddress, LightningClient};

/// Resolve the configured Lightning address and print a payable invoice.
pub async fn tip(config: &WreckConfig, amount_msat: Option<u64>) -> Result<()> {
    let address = config
        .lightning
        .address
        .as_deref()
        .context("no lightning address configured (set [lightning] address or WRECK_LN_ADDRESS)")?;
    let address = LightningAddress::parse(address)?;
    let amount_msat = amount_msat.unwrap_or(config.lightning.amount_msat);

    let client = LightningClient::new(Duration::from_secs(config.lightning.timeout_secs.max(1)))?;
    let pay_data = client.fetch_pay_data(&address).await?;
    let invoice = client.request_invoice(&pay_data, amount_msat).await?;

    println!("Tip {address} ({} sats)", amount_msat / 1000);
    println!();
    println!("{}", invoice.pr);
    if let Some(message) = invoice.success_action.and_then(|a| a.message) {
        println!();
        println!("{message}");
    }

    Ok(())
}
