use anyhow::Context;
use time::{Date, Duration, Month};

use crate::audits::repo::Audit;

/// Every day of every week that intersects the given month, Sunday-first
/// (pt-BR convention). Leading and trailing days belong to the adjacent
/// months, exactly like the calendar screen shows them.
pub fn month_grid(year: i32, month: Month) -> anyhow::Result<Vec<Date>> {
    let first = Date::from_calendar_date(year, month, 1).context("invalid month start")?;
    let last = Date::from_calendar_date(year, month, time::util::days_in_year_month(year, month))
        .context("invalid month end")?;

    let lead = first.weekday().number_days_from_sunday() as i64;
    let trail = 6 - last.weekday().number_days_from_sunday() as i64;
    let start = first - Duration::days(lead);
    let end = last + Duration::days(trail);

    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        day = day.next_day().context("date out of range")?;
    }
    Ok(days)
}

/// One month forward, rolling the year over December.
pub fn next_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::December => (year + 1, Month::January),
        _ => (year, month.next()),
    }
}

/// One month back, rolling the year under January.
pub fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        _ => (year, month.previous()),
    }
}

/// Exact calendar-day match against the scheduled date (UTC).
pub fn falls_on(audit: &Audit, day: Date) -> bool {
    audit.scheduled_date.date() == day
}

/// Audits bucketed into the cell of their scheduled day.
pub fn day_audits<'a>(audits: &'a [Audit], day: Date) -> Vec<&'a Audit> {
    audits.iter().filter(|a| falls_on(a, day)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audits::repo::AuditStatus;
    use time::macros::{date, datetime};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn audit_on(scheduled: OffsetDateTime) -> Audit {
        Audit {
            id: Uuid::new_v4(),
            title: "Auditoria de Segurança - Unidade SP".into(),
            scheduled_date: scheduled,
            location: "Av. Paulista, 1000 - São Paulo, SP".into(),
            auditor_id: Uuid::new_v4(),
            status: AuditStatus::Pending,
            notes: None,
            created_at: scheduled,
            updated_at: scheduled,
        }
    }

    #[test]
    fn march_2024_grid_spans_full_weeks() {
        let grid = month_grid(2024, Month::March).unwrap();
        // 2024-03-01 is a Friday, 2024-03-31 a Sunday: six full weeks.
        assert_eq!(grid.len(), 42);
        assert_eq!(grid[0], date!(2024 - 02 - 25));
        assert_eq!(*grid.last().unwrap(), date!(2024 - 04 - 06));
        assert!(grid.contains(&date!(2024 - 03 - 15)));
    }

    #[test]
    fn grid_starts_on_sunday_and_ends_on_saturday() {
        for (year, month) in [(2024, Month::March), (2025, Month::January), (2023, Month::June)] {
            let grid = month_grid(year, month).unwrap();
            assert_eq!(grid.len() % 7, 0);
            assert_eq!(grid[0].weekday(), time::Weekday::Sunday);
            assert_eq!(grid.last().unwrap().weekday(), time::Weekday::Saturday);
        }
    }

    #[test]
    fn audit_lands_in_its_day_cell() {
        let audits = vec![
            audit_on(datetime!(2024-03-15 10:00 UTC)),
            audit_on(datetime!(2024-03-16 09:00 UTC)),
        ];
        let cell = day_audits(&audits, date!(2024 - 03 - 15));
        assert_eq!(cell.len(), 1);
        assert_eq!(cell[0].scheduled_date, datetime!(2024-03-15 10:00 UTC));
    }

    #[test]
    fn navigation_forward_and_back_restores_the_grid() {
        let original = month_grid(2024, Month::March).unwrap();
        let (y, m) = next_month(2024, Month::March);
        assert_eq!((y, m), (2024, Month::April));
        let (y, m) = previous_month(y, m);
        assert_eq!((y, m), (2024, Month::March));
        assert_eq!(month_grid(y, m).unwrap(), original);
    }

    #[test]
    fn year_rolls_over_december_and_january() {
        assert_eq!(next_month(2024, Month::December), (2025, Month::January));
        assert_eq!(previous_month(2025, Month::January), (2024, Month::December));
    }

    #[test]
    fn out_of_range_year_is_an_error_not_a_panic() {
        assert!(month_grid(1_000_000, Month::March).is_err());
    }
}
