use chrono::NaiveDate;

use tally_core::{DailyRun, InteractiveSync};
use tally_domain::{Displayable, UserId};

use crate::{cli::AppContext, errors::CliError};

/// One interactive pass for `user`, as on session load.
pub fn interactive(
    context: &AppContext,
    user: &str,
    today: Option<NaiveDate>,
) -> Result<(), CliError> {
    let today = context.today(today)?;
    let mut sync = InteractiveSync::new(context.gateway(), UserId::from(user));
    let Some(report) = sync.load(today)? else {
        return Ok(());
    };
    for txn in &report.created {
        println!("+ {}", txn.display_label());
    }
    let totals = &report.totals;
    println!(
        "Created {} transaction(s) from {} rule(s); {} already present, {} failed, {} malformed.",
        totals.transactions_created,
        totals.rules_processed,
        totals.occurrences_skipped,
        totals.occurrences_failed,
        totals.malformed_rules
    );
    Ok(())
}

/// The unattended pass over every user, printed as JSON.
pub fn daily(context: &AppContext, today: Option<NaiveDate>) -> Result<(), CliError> {
    let today = context.today(today)?;
    let report = DailyRun::new(context.gateway())
        .with_ceiling(context.config().run_ceiling())
        .run(today)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
