use chrono::NaiveDate;

use tally_core::{
    storage::{partition_records, PersistenceGateway},
    ReconcileService, UpcomingService,
};
use tally_domain::{format_iso, UserId};

use crate::{cli::AppContext, errors::CliError};

pub fn upcoming(
    context: &AppContext,
    user: &str,
    limit: usize,
    today: Option<NaiveDate>,
) -> Result<(), CliError> {
    let today = context.today(today)?;
    let (rules, _) = partition_records(context.store().list_rules(&UserId::from(user))?);
    let bills = UpcomingService::upcoming(&rules, today, limit);
    if bills.is_empty() {
        println!("No upcoming bills.");
    }
    for bill in bills {
        println!(
            "{}{}  {}  {}  ({} day(s))",
            if bill.urgent { "! " } else { "  " },
            format_iso(bill.due_date),
            bill.description,
            bill.amount,
            bill.days_until
        );
    }
    Ok(())
}

pub fn reconcile(context: &AppContext, user: &str) -> Result<(), CliError> {
    let transactions = context.store().list_transactions(&UserId::from(user))?;
    let groups = ReconcileService::find_duplicates(&transactions);
    if groups.is_empty() {
        println!("No duplicate recurring transactions.");
    }
    for group in groups {
        println!(
            "{}  {}  x{}",
            format_iso(group.date),
            group.description,
            group.transaction_ids.len()
        );
        for id in group.transaction_ids {
            println!("    {id}");
        }
    }
    Ok(())
}
