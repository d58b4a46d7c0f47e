use serde::Serialize;
use std::collections::HashMap;
use time::OffsetDateTime;

use crate::audits::calendar::next_month;
use crate::audits::repo::{Audit, AuditStatus};

const TOP_LOCATIONS: usize = 3;
const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LocationCount {
    pub location: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub by_status: StatusCounts,
    pub this_month: usize,
    pub next_month: usize,
    pub top_locations: Vec<LocationCount>,
    pub upcoming: Vec<Audit>,
}

/// Aggregate the whole collection in memory. Month windows follow the
/// calendar, so in December "next month" is January of the following year.
pub fn summarize(audits: &[Audit], now: OffsetDateTime) -> DashboardSummary {
    let by_status = StatusCounts {
        pending: count_status(audits, AuditStatus::Pending),
        completed: count_status(audits, AuditStatus::Completed),
        cancelled: count_status(audits, AuditStatus::Cancelled),
    };

    let (this_y, this_m) = (now.year(), now.month());
    let (next_y, next_m) = next_month(this_y, this_m);
    let in_month = |a: &&Audit, y: i32, m: time::Month| {
        a.scheduled_date.year() == y && a.scheduled_date.month() == m
    };
    let this_month = audits.iter().filter(|a| in_month(a, this_y, this_m)).count();
    let next_month = audits.iter().filter(|a| in_month(a, next_y, next_m)).count();

    let mut upcoming: Vec<Audit> = audits
        .iter()
        .filter(|a| a.status == AuditStatus::Pending && a.scheduled_date >= now)
        .cloned()
        .collect();
    upcoming.sort_by_key(|a| a.scheduled_date);
    upcoming.truncate(UPCOMING_LIMIT);

    DashboardSummary {
        total: audits.len(),
        by_status,
        this_month,
        next_month,
        top_locations: top_locations(audits),
        upcoming,
    }
}

fn count_status(audits: &[Audit], status: AuditStatus) -> usize {
    audits.iter().filter(|a| a.status == status).count()
}

/// Three most visited locations. Ties break by first appearance in the
/// collection, so the ranking is stable across refreshes.
fn top_locations(audits: &[Audit]) -> Vec<LocationCount> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, audit) in audits.iter().enumerate() {
        let entry = counts.entry(audit.location.as_str()).or_insert((0, index));
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(location, (count, first))| (location, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(TOP_LOCATIONS)
        .map(|(location, count, _)| LocationCount {
            location: location.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn audit(location: &str, status: AuditStatus, scheduled: OffsetDateTime) -> Audit {
        Audit {
            id: Uuid::new_v4(),
            title: format!("Auditoria {location}"),
            scheduled_date: scheduled,
            location: location.to_string(),
            auditor_id: Uuid::new_v4(),
            status,
            notes: None,
            created_at: scheduled,
            updated_at: scheduled,
        }
    }

    fn repeated(location: &str, n: usize) -> Vec<Audit> {
        (0..n)
            .map(|_| audit(location, AuditStatus::Completed, datetime!(2024-03-10 12:00 UTC)))
            .collect()
    }

    #[test]
    fn counts_partition_by_status() {
        let now = datetime!(2024-03-20 12:00 UTC);
        let audits = vec![
            audit("A", AuditStatus::Pending, datetime!(2024-03-25 09:00 UTC)),
            audit("B", AuditStatus::Completed, datetime!(2024-03-05 09:00 UTC)),
            audit("C", AuditStatus::Cancelled, datetime!(2024-03-06 09:00 UTC)),
            audit("D", AuditStatus::Pending, datetime!(2024-04-02 09:00 UTC)),
        ];
        let summary = summarize(&audits, now);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.by_status.pending, 2);
        assert_eq!(summary.by_status.completed, 1);
        assert_eq!(summary.by_status.cancelled, 1);
        assert_eq!(summary.this_month, 3);
        assert_eq!(summary.next_month, 1);
    }

    #[test]
    fn december_looks_into_the_next_year() {
        let now = datetime!(2024-12-15 12:00 UTC);
        let audits = vec![
            audit("A", AuditStatus::Pending, datetime!(2024-12-20 09:00 UTC)),
            audit("B", AuditStatus::Pending, datetime!(2025-01-05 09:00 UTC)),
            audit("C", AuditStatus::Pending, datetime!(2025-02-05 09:00 UTC)),
        ];
        let summary = summarize(&audits, now);
        assert_eq!(summary.this_month, 1);
        assert_eq!(summary.next_month, 1);
    }

    #[test]
    fn top_locations_rank_by_count_with_stable_ties() {
        let mut audits = Vec::new();
        audits.extend(repeated("A", 5));
        audits.extend(repeated("B", 3));
        audits.extend(repeated("C", 3));
        audits.extend(repeated("D", 1));

        let ranked = top_locations(&audits);
        assert_eq!(
            ranked,
            vec![
                LocationCount { location: "A".into(), count: 5 },
                LocationCount { location: "B".into(), count: 3 },
                LocationCount { location: "C".into(), count: 3 },
            ]
        );
    }

    #[test]
    fn upcoming_lists_only_future_pending_soonest_first() {
        let now = datetime!(2024-03-20 12:00 UTC);
        let audits = vec![
            audit("past", AuditStatus::Pending, datetime!(2024-03-10 09:00 UTC)),
            audit("done", AuditStatus::Completed, datetime!(2024-03-25 09:00 UTC)),
            audit("later", AuditStatus::Pending, datetime!(2024-04-10 09:00 UTC)),
            audit("soon", AuditStatus::Pending, datetime!(2024-03-21 09:00 UTC)),
        ];
        let summary = summarize(&audits, now);
        let locations: Vec<&str> = summary.upcoming.iter().map(|a| a.location.as_str()).collect();
        assert_eq!(locations, vec!["soon", "later"]);
    }

    #[test]
    fn an_audit_scheduled_right_now_still_counts_as_upcoming() {
        let now = datetime!(2024-03-20 12:00 UTC);
        let audits = vec![audit("agora", AuditStatus::Pending, now)];
        let summary = summarize(&audits, now);
        assert_eq!(summary.upcoming.len(), 1);
        assert_eq!(summary.upcoming[0].location, "agora");
    }

    #[test]
    fn upcoming_is_capped_at_five() {
        let now = datetime!(2024-03-01 00:00 UTC);
        let audits: Vec<Audit> = (1..=8)
            .map(|day| {
                audit(
                    "X",
                    AuditStatus::Pending,
                    datetime!(2024-03-01 00:00 UTC) + time::Duration::days(day),
                )
            })
            .collect();
        let summary = summarize(&audits, now);
        assert_eq!(summary.upcoming.len(), 5);
        assert_eq!(
            summary.upcoming[0].scheduled_date,
            datetime!(2024-03-02 00:00 UTC)
        );
    }
}
