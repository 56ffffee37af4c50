use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{BandSummary, HealthBand, Level, PortfolioSummary, ScoredAccount};
use crate::weights::Weights;

const NEAR_TERM_RENEWAL_DAYS: i64 = 180;

pub fn summarize(accounts: &[ScoredAccount]) -> PortfolioSummary {
    let arr_where = |predicate: &dyn Fn(&ScoredAccount) -> bool| -> f64 {
        accounts
            .iter()
            .filter(|account| predicate(account))
            .map(|account| account.record.arr)
            .sum()
    };

    PortfolioSummary {
        total_arr: arr_where(&|_| true),
        at_risk_arr: arr_where(&|account| {
            matches!(account.health_band, HealthBand::Red | HealthBand::Yellow)
        }),
        near_term_renewal_arr: arr_where(&|account| {
            account
                .days_to_renewal
                .is_some_and(|days| (0..=NEAR_TERM_RENEWAL_DAYS).contains(&days))
        }),
        red_accounts: accounts
            .iter()
            .filter(|account| account.health_band == HealthBand::Red)
            .count(),
    }
}

/// Account count and ARR per band, Green first, bands without accounts included.
pub fn band_breakdown(accounts: &[ScoredAccount]) -> Vec<BandSummary> {
    HealthBand::ALL
        .iter()
        .map(|band| {
            let in_band = accounts
                .iter()
                .filter(|account| account.health_band == *band);
            BandSummary {
                band: *band,
                accounts: in_band.clone().count(),
                arr: in_band.map(|account| account.record.arr).sum(),
            }
        })
        .collect()
}

pub fn segments(accounts: &[ScoredAccount]) -> Vec<String> {
    let mut segments: Vec<String> = accounts
        .iter()
        .map(|account| account.record.segment.clone())
        .collect();
    segments.sort();
    segments.dedup();
    segments
}

/// Empty lists mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub segments: Vec<String>,
    pub bands: Vec<HealthBand>,
    pub risks: Vec<Level>,
    pub customer: Option<String>,
}

impl AccountFilter {
    pub fn matches(&self, account: &ScoredAccount) -> bool {
        let segment_ok =
            self.segments.is_empty() || self.segments.contains(&account.record.segment);
        let band_ok = self.bands.is_empty() || self.bands.contains(&account.health_band);
        let risk_ok = self.risks.is_empty() || self.risks.contains(&account.renewal_risk);
        let customer_ok = self.customer.as_ref().map_or(true, |needle| {
            account
                .record
                .customer
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });

        segment_ok && band_ok && risk_ok && customer_ok
    }
}

/// Filtered accounts, least healthy first. Ties keep input order.
pub fn account_view<'a>(
    accounts: &'a [ScoredAccount],
    filter: &AccountFilter,
) -> Vec<&'a ScoredAccount> {
    let mut view: Vec<&ScoredAccount> = accounts
        .iter()
        .filter(|account| filter.matches(account))
        .collect();
    view.sort_by(|a, b| a.health_score.total_cmp(&b.health_score));
    view
}

pub fn format_account_line(account: &ScoredAccount) -> String {
    let renewal = match account.days_to_renewal {
        Some(days) => format!("renews in {days}d"),
        None => "no renewal date".to_string(),
    };
    format!(
        "{} ({}, ${:.0}) score {:.1} {} | risk {} | expansion {} | usage {:.0}% | {}",
        account.record.customer,
        account.record.segment,
        account.record.arr,
        account.health_score,
        account.health_band,
        account.renewal_risk,
        account.expansion_potential,
        account.usage_ratio * 100.0,
        renewal
    )
}

pub fn format_money(amount: f64) -> String {
    let whole = format!("{:.0}", amount.abs());
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && whole != "0" { "-" } else { "" };
    format!("{sign}${grouped}")
}

pub fn build_report(
    accounts: &[ScoredAccount],
    filter: &AccountFilter,
    weights: &Weights,
    as_of: NaiveDate,
) -> String {
    let summary = summarize(accounts);
    let bands = band_breakdown(accounts);
    let view = account_view(accounts, filter);

    let mut output = String::new();

    let _ = writeln!(output, "# Customer Health Report");
    let _ = writeln!(
        output,
        "Generated for {} accounts as of {}",
        accounts.len(),
        as_of
    );
    let weight_list: Vec<String> = weights
        .entries()
        .iter()
        .map(|(name, weight)| format!("{name} {weight}"))
        .collect();
    let _ = writeln!(output, "Weights: {}", weight_list.join(", "));
    let _ = writeln!(output);

    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total ARR: {}", format_money(summary.total_arr));
    let _ = writeln!(
        output,
        "- ARR (Yellow + Red): {}",
        format_money(summary.at_risk_arr)
    );
    let _ = writeln!(
        output,
        "- ARR renewing in {} days: {}",
        NEAR_TERM_RENEWAL_DAYS,
        format_money(summary.near_term_renewal_arr)
    );
    let _ = writeln!(output, "- Red accounts: {}", summary.red_accounts);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Health Bands");
    for band in bands.iter() {
        let _ = writeln!(
            output,
            "- {}: {} accounts, {} ARR",
            band.band,
            band.accounts,
            format_money(band.arr)
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Accounts");
    if view.is_empty() {
        let _ = writeln!(output, "No accounts match the selected filters.");
    } else {
        for account in view.iter() {
            let _ = writeln!(output, "- {}", format_account_line(account));
            if !account.recommended_actions.is_empty() {
                let _ = writeln!(output, "  - Actions: {}", account.actions_display());
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountRecord, MetricScores};

    fn sample_account(
        customer: &str,
        segment: &str,
        arr: f64,
        score: f64,
        band: HealthBand,
        days_to_renewal: Option<i64>,
    ) -> ScoredAccount {
        ScoredAccount {
            record: AccountRecord {
                customer: customer.to_string(),
                segment: segment.to_string(),
                arr,
                renewal_date: None,
                nps: 0.0,
                tickets_last_90d: 0.0,
                csat: 3.0,
                logins_last_30d: 0.0,
                active_users: 1.0,
                total_seats: 1.0,
            },
            usage_ratio: 1.0,
            scores: MetricScores::default(),
            health_score: score,
            health_band: band,
            days_to_renewal,
            expansion_potential: Level::Low,
            renewal_risk: crate::risk::renewal_risk(band),
            recommended_actions: vec!["Reinforce value with EBR/QBR and explore expansion paths."],
        }
    }

    fn portfolio() -> Vec<ScoredAccount> {
        vec![
            sample_account("Acme", "Enterprise", 100_000.0, 82.0, HealthBand::Green, Some(30)),
            sample_account("Globex", "SMB", 20_000.0, 40.0, HealthBand::Red, Some(180)),
            sample_account("Initech", "SMB", 5_000.0, 60.0, HealthBand::Yellow, Some(181)),
            sample_account("Hooli", "Enterprise", 70_000.0, 40.0, HealthBand::Red, Some(-3)),
            sample_account("Umbrella", "Mid-Market", 9_000.0, 90.0, HealthBand::Green, None),
        ]
    }

    #[test]
    fn summary_aggregates_arr() {
        let summary = summarize(&portfolio());
        assert_eq!(summary.total_arr, 204_000.0);
        assert_eq!(summary.at_risk_arr, 95_000.0);
        assert_eq!(summary.near_term_renewal_arr, 120_000.0);
        assert_eq!(summary.red_accounts, 2);
    }

    #[test]
    fn empty_portfolio_summarizes_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_arr, 0.0);
        assert_eq!(summary.red_accounts, 0);
    }

    #[test]
    fn band_breakdown_lists_every_band() {
        let accounts: Vec<ScoredAccount> = portfolio()
            .into_iter()
            .filter(|account| account.health_band != HealthBand::Yellow)
            .collect();
        let bands = band_breakdown(&accounts);
        let order: Vec<HealthBand> = bands.iter().map(|b| b.band).collect();
        assert_eq!(order, HealthBand::ALL.to_vec());
        assert_eq!(bands[0].accounts, 2);
        assert_eq!(bands[0].arr, 109_000.0);
        assert_eq!(bands[1].accounts, 0);
        assert_eq!(bands[1].arr, 0.0);
        assert_eq!(bands[2].accounts, 2);
    }

    #[test]
    fn view_sorts_least_healthy_first_with_stable_ties() {
        let accounts = portfolio();
        let view = account_view(&accounts, &AccountFilter::default());
        let names: Vec<&str> = view.iter().map(|a| a.record.customer.as_str()).collect();
        assert_eq!(names, vec!["Globex", "Hooli", "Initech", "Acme", "Umbrella"]);
    }

    #[test]
    fn filters_combine() {
        let accounts = portfolio();
        let filter = AccountFilter {
            segments: vec!["SMB".to_string(), "Enterprise".to_string()],
            risks: vec![Level::High, Level::Medium],
            ..AccountFilter::default()
        };
        let names: Vec<&str> = account_view(&accounts, &filter)
            .iter()
            .map(|a| a.record.customer.as_str())
            .collect();
        assert_eq!(names, vec!["Globex", "Hooli", "Initech"]);

        let by_name = AccountFilter {
            bands: vec![HealthBand::Green],
            customer: Some("ACM".to_string()),
            ..AccountFilter::default()
        };
        assert_eq!(account_view(&accounts, &by_name).len(), 1);
    }

    #[test]
    fn segments_are_sorted_and_unique() {
        assert_eq!(
            segments(&portfolio()),
            vec!["Enterprise", "Mid-Market", "SMB"]
        );
    }

    #[test]
    fn money_is_grouped() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(999.4), "$999");
        assert_eq!(format_money(1_234_567.0), "$1,234,567");
        assert_eq!(format_money(-12_000.0), "-$12,000");
    }

    #[test]
    fn report_contains_sections() {
        let accounts = portfolio();
        let report = build_report(
            &accounts,
            &AccountFilter::default(),
            &Weights::default(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        );
        assert!(report.starts_with("# Customer Health Report"));
        assert!(report.contains("as of 2026-01-15"));
        assert!(report.contains("- Total ARR: $204,000"));
        assert!(report.contains("- Red accounts: 2"));
        assert!(report.contains("- Yellow: 1 accounts, $5,000 ARR"));
        assert!(report.contains("Globex (SMB, $20000) score 40.0 Red"));
        assert!(report.contains("  - Actions: Reinforce value"));
    }

    #[test]
    fn report_notes_empty_view() {
        let filter = AccountFilter {
            segments: vec!["Public Sector".to_string()],
            ..AccountFilter::default()
        };
        let report = build_report(
            &portfolio(),
            &filter,
            &Weights::default(),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        );
        assert!(report.contains("No accounts match the selected filters."));
    }
}
