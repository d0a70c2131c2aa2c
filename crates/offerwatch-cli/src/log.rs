/// Prints the most recent scrape log entries, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_log(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let rows = offerwatch_db::list_scrape_log(pool, limit.max(1)).await?;

    if rows.is_empty() {
        println!("no scrape runs logged yet; run `scrape` first");
        return Ok(());
    }

    println!(
        "{:<22}{:<13}{:>7}{:>6}{:>9}{:>11}  ERROR",
        "RUN TIME", "VARIANT", "FOUND", "NEW", "CHANGED", "UNCHANGED"
    );
    for row in &rows {
        println!(
            "{:<22}{:<13}{:>7}{:>6}{:>9}{:>11}  {}",
            row.run_time.format("%Y-%m-%d %H:%M:%S"),
            row.variant,
            row.offers_found,
            row.offers_new,
            row.offers_changed,
            row.offers_unchanged,
            row.error_message.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
