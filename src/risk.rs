use crate::models::{BatchStats, HealthBand, Level, ScoredAccount};

const RENEWAL_WINDOW_DAYS: i64 = 120;

pub fn expansion_potential(band: HealthBand, usage_ratio: f64, nps: f64) -> Level {
    if band == HealthBand::Green && usage_ratio > 0.7 && nps >= 50.0 {
        return Level::High;
    }
    if band == HealthBand::Yellow && usage_ratio > 0.5 && nps >= 20.0 {
        return Level::Medium;
    }
    Level::Low
}

pub fn renewal_risk(band: HealthBand) -> Level {
    match band {
        HealthBand::Red => Level::High,
        HealthBand::Yellow => Level::Medium,
        HealthBand::Green => Level::Low,
    }
}

/// A recommendation rule group: contributes at most one action per account.
pub struct ActionRule {
    pub name: &'static str,
    pub evaluate: fn(&ScoredAccount, &BatchStats) -> Option<&'static str>,
}

/// Evaluated in order; the output keeps this order.
pub const ACTION_RULES: [ActionRule; 6] = [
    ActionRule {
        name: "health",
        evaluate: band_action,
    },
    ActionRule {
        name: "usage",
        evaluate: usage_action,
    },
    ActionRule {
        name: "tickets",
        evaluate: tickets_action,
    },
    ActionRule {
        name: "nps",
        evaluate: nps_action,
    },
    ActionRule {
        name: "csat",
        evaluate: csat_action,
    },
    ActionRule {
        name: "renewal",
        evaluate: renewal_action,
    },
];

pub fn recommended_actions(account: &ScoredAccount, stats: &BatchStats) -> Vec<&'static str> {
    ACTION_RULES
        .iter()
        .filter_map(|rule| {
            let action = (rule.evaluate)(account, stats);
            if action.is_some() {
                log::trace!("{}: {} rule matched", account.record.customer, rule.name);
            }
            action
        })
        .collect()
}

fn band_action(account: &ScoredAccount, _: &BatchStats) -> Option<&'static str> {
    Some(match account.health_band {
        HealthBand::Red => "Schedule executive-sponsored escalation and detailed recovery plan.",
        HealthBand::Yellow => "Run focused health check and align on 90-day success plan.",
        HealthBand::Green => "Reinforce value with EBR/QBR and explore expansion paths.",
    })
}

fn usage_action(account: &ScoredAccount, _: &BatchStats) -> Option<&'static str> {
    if account.usage_ratio < 0.4 {
        Some("Low adoption: run enablement sessions and map more use cases.")
    } else if account.usage_ratio > 0.8 {
        Some("High adoption: discuss seat expansion or advanced modules.")
    } else {
        None
    }
}

fn tickets_action(account: &ScoredAccount, stats: &BatchStats) -> Option<&'static str> {
    let median = stats.median_tickets?;
    (account.record.tickets_last_90d > median)
        .then_some("High support volume: review top ticket themes and propose fixes.")
}

fn nps_action(account: &ScoredAccount, _: &BatchStats) -> Option<&'static str> {
    let nps = account.record.nps;
    if nps < 0.0 {
        Some("Negative NPS: hold stakeholder interviews and address pain points.")
    } else if nps >= 50.0 {
        Some("Promoter: invite to reference program or case study.")
    } else {
        None
    }
}

fn csat_action(account: &ScoredAccount, _: &BatchStats) -> Option<&'static str> {
    (account.record.csat < 3.5)
        .then_some("Improve support quality: review SLAs and support playbook.")
}

fn renewal_action(account: &ScoredAccount, _: &BatchStats) -> Option<&'static str> {
    let days = account.days_to_renewal?;
    (days <= RENEWAL_WINDOW_DAYS)
        .then_some("Renewal <120 days: lock in mutual success plan and early commit.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountRecord, MetricScores};
    use chrono::NaiveDate;

    fn sample_account(band: HealthBand) -> ScoredAccount {
        ScoredAccount {
            record: AccountRecord {
                customer: "Initech".to_string(),
                segment: "SMB".to_string(),
                arr: 12_000.0,
                renewal_date: NaiveDate::from_ymd_opt(2027, 6, 1),
                nps: 10.0,
                tickets_last_90d: 2.0,
                csat: 4.2,
                logins_last_30d: 30.0,
                active_users: 6.0,
                total_seats: 10.0,
            },
            usage_ratio: 0.6,
            scores: MetricScores::default(),
            health_score: 60.0,
            health_band: band,
            days_to_renewal: Some(300),
            expansion_potential: Level::Low,
            renewal_risk: Level::Medium,
            recommended_actions: Vec::new(),
        }
    }

    fn stats(median_tickets: Option<f64>) -> BatchStats {
        BatchStats {
            max_logins: 100.0,
            max_tickets: 10.0,
            median_tickets,
        }
    }

    #[test]
    fn expansion_follows_priority_order() {
        assert_eq!(expansion_potential(HealthBand::Green, 0.9, 60.0), Level::High);
        assert_eq!(expansion_potential(HealthBand::Yellow, 0.6, 30.0), Level::Medium);
        assert_eq!(expansion_potential(HealthBand::Green, 0.6, 60.0), Level::Low);
        assert_eq!(expansion_potential(HealthBand::Green, 0.9, 49.0), Level::Low);
        assert_eq!(expansion_potential(HealthBand::Yellow, 0.5, 30.0), Level::Low);
        assert_eq!(expansion_potential(HealthBand::Yellow, 0.9, 19.0), Level::Low);
        assert_eq!(expansion_potential(HealthBand::Red, 1.0, 100.0), Level::Low);
    }

    #[test]
    fn renewal_risk_mirrors_band() {
        assert_eq!(renewal_risk(HealthBand::Red), Level::High);
        assert_eq!(renewal_risk(HealthBand::Yellow), Level::Medium);
        assert_eq!(renewal_risk(HealthBand::Green), Level::Low);
    }

    #[test]
    fn quiet_account_gets_only_band_action() {
        let account = sample_account(HealthBand::Yellow);
        let actions = recommended_actions(&account, &stats(Some(2.0)));
        assert_eq!(
            actions,
            vec!["Run focused health check and align on 90-day success plan."]
        );
    }

    #[test]
    fn every_rule_group_fires_in_order() {
        let mut account = sample_account(HealthBand::Red);
        account.usage_ratio = 0.1;
        account.record.tickets_last_90d = 9.0;
        account.record.nps = -20.0;
        account.record.csat = 2.0;
        account.days_to_renewal = Some(45);

        let actions = recommended_actions(&account, &stats(Some(3.0)));
        assert_eq!(actions.len(), ACTION_RULES.len());
        assert!(actions[0].starts_with("Schedule executive-sponsored"));
        assert!(actions[1].starts_with("Low adoption"));
        assert!(actions[2].starts_with("High support volume"));
        assert!(actions[3].starts_with("Negative NPS"));
        assert!(actions[4].starts_with("Improve support quality"));
        assert!(actions[5].starts_with("Renewal <120 days"));
    }

    #[test]
    fn promoters_with_high_adoption() {
        let mut account = sample_account(HealthBand::Green);
        account.usage_ratio = 0.95;
        account.record.nps = 50.0;

        let actions = recommended_actions(&account, &stats(Some(2.0)));
        assert_eq!(
            actions,
            vec![
                "Reinforce value with EBR/QBR and explore expansion paths.",
                "High adoption: discuss seat expansion or advanced modules.",
                "Promoter: invite to reference program or case study.",
            ]
        );
    }

    #[test]
    fn tickets_rule_compares_against_batch_median() {
        let mut account = sample_account(HealthBand::Yellow);
        account.record.tickets_last_90d = 3.0;
        let fires = |median| {
            recommended_actions(&account, &stats(median))
                .iter()
                .any(|a| a.starts_with("High support volume"))
        };
        assert!(fires(Some(2.5)));
        assert!(!fires(Some(3.0)));
        assert!(!fires(None));
    }

    #[test]
    fn renewal_rule_needs_a_date_and_includes_overdue() {
        let mut account = sample_account(HealthBand::Green);
        let has_renewal = |account: &ScoredAccount| {
            renewal_action(account, &stats(None)).is_some()
        };

        account.days_to_renewal = Some(120);
        assert!(has_renewal(&account));
        account.days_to_renewal = Some(121);
        assert!(!has_renewal(&account));
        account.days_to_renewal = Some(-30);
        assert!(has_renewal(&account));
        account.days_to_renewal = None;
        assert!(!has_renewal(&account));
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<_> = ACTION_RULES.iter().map(|rule| rule.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ACTION_RULES.len());
    }
}
