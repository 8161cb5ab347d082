use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use core_types::{Account, BetDetails, HistoryEntry, Settings};
use ledger::Settlement;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn accounts_table(accounts: &[Account]) -> Table {
    let mut t = table(vec!["ID", "Name", "Balance", "Remarks", "Updated"]);
    for a in accounts {
        t.add_row(vec![
            a.account_id.to_string(),
            a.name.clone(),
            format!("{:.2}", a.balance),
            a.remarks.clone(),
            a.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    t
}

pub fn active_bets_table(bets: &[BetDetails]) -> Table {
    let mut t = table(vec!["Bet", "Match", "Date", "Odds", "Accounts", "Total", "Status"]);
    for d in bets {
        t.add_row(vec![
            d.bet.bet_id.to_string(),
            d.bet.match_label.clone(),
            format!("{} {}", d.fixture.match_date, d.fixture.match_time),
            format!("{} / {}", d.bet.team1_odds, d.bet.team2_odds),
            d.allocations.len().to_string(),
            format!("{:.2}", d.bet.total_amount),
            d.bet.status.to_string(),
        ]);
    }
    t
}

/// One bet with a row per allocation.
pub fn bet_table(details: &BetDetails) -> Table {
    let mut t = table(vec!["Bet", "Account", "Backs", "Odds", "Stake", "Payout"]);
    for a in &details.allocations {
        let team = a.allocation.team;
        t.add_row(vec![
            format!("#{} {}", details.bet.bet_id, details.bet.status),
            a.account_name.clone(),
            details.fixture.team_name(team).to_string(),
            details.bet.odds_for(team).to_string(),
            format!("{:.2}", a.allocation.amount),
            a.allocation.payout.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    t.add_row(vec![
        String::new(),
        details.bet.match_label.clone(),
        String::new(),
        String::new(),
        format!("{:.2}", details.bet.total_amount),
        String::new(),
    ]);
    t
}

pub fn settlement_table(settlement: &Settlement) -> Table {
    let mut t = table(vec!["Account", "Stake", "Payout", "Balance"]);
    for a in &settlement.allocations {
        t.add_row(vec![
            a.account_name.clone(),
            format!("{:.2}", a.stake),
            format!("{:.2}", a.payout),
            format!("{:.2}", a.balance_after),
        ]);
    }
    t.add_row(vec![
        format!("Bet {} {}", settlement.result.bet_id, settlement.result.result_type.as_str()),
        String::new(),
        format!("{:.2}", settlement.result.total_payout),
        format!("net {:.2}", settlement.result.net_profit),
    ]);
    t
}

pub fn history_table(history: &[HistoryEntry]) -> Table {
    let mut t = table(vec!["Bet", "Match", "Date", "Result", "Staked", "Payout", "Net"]);
    for entry in history {
        let d = &entry.details;
        let (payout, net) = match &entry.result {
            Some(r) => (format!("{:.2}", r.total_payout), format!("{:.2}", r.net_profit)),
            None => ("-".to_string(), "-".to_string()),
        };
        let result = match entry.result.as_ref().and_then(|r| r.winning_team) {
            Some(team) => format!("{} ({})", d.bet.status, d.fixture.team_name(team)),
            None => d.bet.status.to_string(),
        };
        t.add_row(vec![
            d.bet.bet_id.to_string(),
            d.bet.match_label.clone(),
            d.fixture.match_date.to_string(),
            result,
            format!("{:.2}", d.bet.total_amount),
            payout,
            net,
        ]);
    }
    t
}

pub fn settings_table(settings: &Settings) -> Table {
    let mut t = table(vec!["Setting", "Value"]);
    t.add_row(vec!["min_transfer".to_string(), format!("{:.2}", settings.min_transfer)]);
    t.add_row(vec![
        "default_betting_value".to_string(),
        format!("{:.2}", settings.default_betting_value),
    ]);
    if let Some(updated) = settings.updated_at {
        t.add_row(vec!["updated_at".to_string(), updated.format("%Y-%m-%d %H:%M").to_string()]);
    }
    t
}

pub fn backups_table(paths: &[String]) -> Table {
    let mut t = table(vec!["Backup"]);
    for p in paths {
        t.add_row(vec![p.clone()]);
    }
    t
}
