//! Pay period inspection.

use chrono::{Local, NaiveDate};
use tally_core::period::period_containing;

/// Log the pay period containing `date`, or today's.
pub fn show(date: Option<NaiveDate>) {
    let now = Local::now().naive_local();
    let reference = date.unwrap_or_else(|| now.date());
    let period = period_containing(reference);

    tracing::info!("Pay period containing {reference}:");
    tracing::info!("  Start: {}", period.start);
    tracing::info!("  End: {}", period.end);
    tracing::info!("  Half: {:?}", period.half());
    tracing::info!("  Days: {}", period.days());
    tracing::info!("  Status: {:?}", period.status(now));
}
