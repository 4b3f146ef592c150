//! Print the dealer credit summary for a date range
//!
//! ```bash
//! MALL_API_URL=https://mall.example.com/api \
//!   cargo run -p mall-client --example credit_summary -- 2024-01-01 2024-03-31
//! ```
//!
//! Tokens are read from the data dir (`MALL_DATA_DIR`); log in through the
//! app first.

use chrono::NaiveDate;
use mall_client::{ClientConfig, DateRange, MallClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mall_client::logger::init_logger("info", false, None)?;

    let mut args = std::env::args().skip(1);
    let start: NaiveDate = args.next().unwrap_or_else(|| "2024-01-01".into()).parse()?;
    let end: NaiveDate = args.next().unwrap_or_else(|| "2024-12-31".into()).parse()?;

    let client = MallClient::new(ClientConfig::from_env())?;
    if !client.session().is_logged_in() {
        anyhow::bail!("not logged in, no tokens in {}", client.config().data_dir.display());
    }

    let credit = client.credit();
    let account = credit.my_account().await?;
    println!(
        "Account #{}: limit {}, available {}, term {} days",
        account.id, account.credit_limit, account.available_credit, account.payment_term_days
    );

    let summary = credit.summarize(&DateRange::new(start, end)).await?;
    if !summary.has_data {
        println!("No records between {} and {}", start, end);
        return Ok(());
    }

    println!("Statements:        {}", summary.statement_count);
    println!("Opening balance:   {}", summary.previous_balance);
    println!("Closing balance:   {}", summary.period_end_balance);
    println!("Purchases:         {}", summary.total_purchases);
    println!("Payments:          {}", summary.total_payments);
    println!("Refunds:           {}", summary.total_refunds);
    println!("Due within term:   {}", summary.due_within_term);
    println!("Paid within term:  {}", summary.paid_within_term);
    println!("Overdue:           {}", summary.overdue_amount);
    println!("Unbilled entries:  {}", summary.unbilled_count);
    Ok(())
}
