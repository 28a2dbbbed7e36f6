use channel_admin::config::{AppConfig, PricingConfig};
use channel_admin::payments::CryptoPayClient;
use clap::Parser;
use log::{error, info};

#[derive(Parser, Debug)]
#[command(name = "price_quote")]
#[command(about = "Print energy and golden card prices, optionally check a Crypto Pay invoice")]
struct Args {
    /// energy amounts to quote
    #[arg(long = "energy", value_name = "AMOUNT", default_values_t = vec![50u32, 100, 300])]
    energy: Vec<u32>,

    /// golden card durations to quote, in hours
    #[arg(long = "hours", value_name = "HOURS", default_values_t = vec![12u32, 24, 72])]
    hours: Vec<u32>,

    /// rubles per US dollar, overrides RUBLES_PER_USD
    #[arg(long)]
    rate: Option<f64>,

    /// Crypto Pay invoice id to look up (needs CRYPTOPAY_TOKEN)
    #[arg(long)]
    invoice: Option<i64>,
}

fn print_quotes(pricing: &PricingConfig, args: &Args) {
    println!("Energy:");
    for amount in &args.energy {
        match pricing
            .price_for_energy(*amount)
            .and_then(|rub| Ok((rub, pricing.convert_rub_to_usd(rub)?)))
        {
            Ok((rub, usd)) => println!("  {:>5} ⚡️  {:>9.2} RUB  {:>8.2} USD", amount, rub, usd),
            Err(e) => println!("  {:>5} ⚡️  {}", amount, e),
        }
    }

    println!("Golden card:");
    for hours in &args.hours {
        let duration = chrono::Duration::hours(*hours as i64);
        match pricing
            .price_for_golden_card(duration)
            .and_then(|rub| Ok((rub, pricing.convert_rub_to_usd(rub)?)))
        {
            Ok((rub, usd)) => println!("  {:>5} h   {:>9.2} RUB  {:>8.2} USD", hours, rub, usd),
            Err(e) => println!("  {:>5} h   {}", hours, e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // quoting runs without BOT_TOKEN
    let config = match AppConfig::from_lookup(|key| match (key, std::env::var(key).ok()) {
        ("BOT_TOKEN", None) => Some("unused".to_string()),
        (_, value) => value,
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to read configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut pricing = config.pricing.clone();
    if let Some(rate) = args.rate {
        pricing.rubles_per_usd = rate;
    }

    print_quotes(&pricing, &args);

    if let Some(invoice_id) = args.invoice {
        let crypto = config
            .crypto_pay
            .as_ref()
            .ok_or("CRYPTOPAY_TOKEN is required to check invoices")?;
        let client = CryptoPayClient::from_config(crypto)?;
        info!("Looking up invoice {}", invoice_id);
        let invoice = client.get_invoice(invoice_id).await?;
        println!(
            "Invoice {}: {} {:.2} {} {}",
            invoice.invoice_id, invoice.status, invoice.amount, invoice.asset, invoice.pay_url
        );
    }

    Ok(())
}
