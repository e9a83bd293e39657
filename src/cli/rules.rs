use tally_core::RuleService;
use tally_domain::{Displayable, RecurrenceRule, RuleDraft, RulePatch, UserId};

use crate::{
    cli::{AppContext, RulesCommands},
    errors::CliError,
};

pub fn run(context: &AppContext, command: RulesCommands) -> Result<(), CliError> {
    let gateway = context.store();
    match command {
        RulesCommands::Add {
            user,
            description,
            amount,
            category,
            category_id,
            kind,
            frequency,
            start,
            paused,
        } => {
            let draft = RuleDraft {
                amount,
                description,
                category,
                category_id,
                kind,
                frequency,
                start_date: start,
                active: !paused,
            };
            let rule = RuleService::create(gateway, &UserId::from(user), draft)?;
            println!("Added rule {}", rule.id);
            print_rule(&rule);
        }
        RulesCommands::List { user } => {
            let records = RuleService::list(gateway, &UserId::from(user))?;
            if records.is_empty() {
                println!("No recurring rules.");
            }
            for record in records {
                match record {
                    Ok(rule) => print_rule(&rule),
                    Err(malformed) => println!("! {malformed}"),
                }
            }
        }
        RulesCommands::Edit {
            user,
            id,
            description,
            amount,
            category,
            kind,
            frequency,
            next_due,
        } => {
            let patch = RulePatch {
                amount,
                description,
                category,
                kind,
                frequency,
                next_due_date: next_due,
                ..RulePatch::default()
            };
            let rule = RuleService::edit(gateway, &UserId::from(user), id, patch)?;
            print_rule(&rule);
        }
        RulesCommands::Pause { user, id } => {
            print_rule(&RuleService::set_active(gateway, &UserId::from(user), id, false)?);
        }
        RulesCommands::Resume { user, id } => {
            print_rule(&RuleService::set_active(gateway, &UserId::from(user), id, true)?);
        }
        RulesCommands::Toggle { user, id } => {
            print_rule(&RuleService::toggle(gateway, &UserId::from(user), id)?);
        }
        RulesCommands::Delete { user, id } => {
            RuleService::delete(gateway, &UserId::from(user), id)?;
            println!("Deleted rule {id}");
        }
    }
    Ok(())
}

fn print_rule(rule: &RecurrenceRule) {
    println!("{}  {}", rule.id, rule.display_label());
}
