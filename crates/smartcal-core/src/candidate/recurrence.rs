//! Habit occurrence expansion.

use chrono::{Datelike, Duration, NaiveDate};

use super::input::{Frequency, Recurrence};

/// Dates among `dates` on which `recurrence` produces an occurrence.
///
/// `default_anchor` stands in for a missing `start_date`. Dates keep their
/// input order.
pub fn occurrences_on(
    recurrence: &Recurrence,
    dates: &[NaiveDate],
    default_anchor: NaiveDate,
) -> Vec<NaiveDate> {
    let interval = i64::from(recurrence.interval.max(1));
    let anchor = recurrence.start_date.unwrap_or(default_anchor);

    dates
        .iter()
        .copied()
        .filter(|date| *date >= anchor)
        .filter(|date| recurrence.end_date.map_or(true, |end| *date <= end))
        .filter(|date| match recurrence.frequency {
            Frequency::Daily => (*date - anchor).num_days() % interval == 0,
            Frequency::Weekly => {
                let week_start = |d: NaiveDate| {
                    d - Duration::days(i64::from(d.weekday().num_days_from_monday()))
                };
                let weeks = (week_start(*date) - week_start(anchor)).num_days() / 7;
                recurrence.days.contains(&date.weekday()) && weeks % interval == 0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn fortnight() -> Vec<NaiveDate> {
        march(2).iter_days().take(14).collect()
    }

    #[test]
    fn daily_every_day() {
        let dates = occurrences_on(&Recurrence::daily(), &fortnight(), march(2));
        assert_eq!(dates.len(), 14);
    }

    #[test]
    fn daily_every_third_day_from_anchor() {
        let rule = Recurrence::daily().every(3).starting(march(3));
        let dates = occurrences_on(&rule, &fortnight(), march(2));
        assert_eq!(dates, vec![march(3), march(6), march(9), march(12), march(15)]);
    }

    #[test]
    fn weekly_on_selected_days() {
        let rule = Recurrence::weekly(vec![Weekday::Mon, Weekday::Thu]);
        let dates = occurrences_on(&rule, &fortnight(), march(2));
        assert_eq!(dates, vec![march(2), march(5), march(9), march(12)]);
    }

    #[test]
    fn biweekly_skips_alternate_weeks() {
        let rule = Recurrence::weekly(vec![Weekday::Wed]).every(2);
        let dates = occurrences_on(&rule, &fortnight(), march(2));
        assert_eq!(dates, vec![march(4)]);
    }

    #[test]
    fn end_date_is_inclusive() {
        let rule = Recurrence::daily().until(march(4));
        let dates = occurrences_on(&rule, &fortnight(), march(2));
        assert_eq!(dates, vec![march(2), march(3), march(4)]);
    }
}
