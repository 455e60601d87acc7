use std::collections::BTreeSet;

use time::{Date, Duration, Weekday};

const DAYS_PER_WEEK: usize = 7;

/// Monday of the week containing `day`.
pub fn start_of_week(day: Date) -> Date {
    day - Duration::days(i64::from(day.weekday().number_days_from_monday()))
}

pub fn week_days(start: Date) -> [Date; DAYS_PER_WEEK] {
    std::array::from_fn(|offset| start + Duration::days(offset as i64))
}

/// Moves by whole weeks; negative goes back in time.
pub fn shift_week(start: Date, weeks: i64) -> Date {
    start + Duration::weeks(weeks)
}

pub fn month_label(start: Date) -> String {
    format!("{} {}", start.month(), start.year())
}

pub fn greeting(hour: u8) -> &'static str {
    match hour {
        6..12 => "Good morning",
        12..18 => "Good afternoon",
        _ => "Good evening",
    }
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    }
}

/// Month heading, weekday row and day row. Completed days show a check mark
/// and today is bracketed.
pub fn render_week(start: Date, completed: &BTreeSet<Date>, today: Date) -> String {
    let days = week_days(start);

    let header: Vec<String> = days
        .iter()
        .map(|day| format!("{:^5}", weekday_abbrev(day.weekday())))
        .collect();
    let cells: Vec<String> = days
        .iter()
        .map(|day| {
            let mark = if completed.contains(day) {
                "✔".to_owned()
            } else {
                day.day().to_string()
            };
            if *day == today {
                format!("{:^5}", format!("[{mark}]"))
            } else {
                format!("{mark:^5}")
            }
        })
        .collect();

    format!(
        "{}\n{}\n{}",
        month_label(start),
        header.join(""),
        cells.join("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn weeks_start_on_monday() {
        // 2026-10-19 is a Monday.
        assert_eq!(start_of_week(date!(2026 - 10 - 19)), date!(2026 - 10 - 19));
        assert_eq!(start_of_week(date!(2026 - 10 - 25)), date!(2026 - 10 - 19));
        assert_eq!(start_of_week(date!(2026 - 10 - 21)), date!(2026 - 10 - 19));
    }

    #[test]
    fn week_spans_seven_days() {
        let days = week_days(date!(2026 - 10 - 26));
        assert_eq!(days[0], date!(2026 - 10 - 26));
        assert_eq!(days[6], date!(2026 - 11 - 01));
    }

    #[test]
    fn swiping_moves_whole_weeks() {
        let start = date!(2026 - 10 - 19);
        assert_eq!(shift_week(start, 1), date!(2026 - 10 - 26));
        assert_eq!(shift_week(start, -2), date!(2026 - 10 - 05));
        assert_eq!(month_label(shift_week(start, 2)), "November 2026");
    }

    #[test]
    fn greets_by_hour() {
        assert_eq!(greeting(5), "Good evening");
        assert_eq!(greeting(6), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(18), "Good evening");
    }

    #[test]
    fn strip_marks_completed_days() {
        let start = date!(2026 - 10 - 19);
        let completed = BTreeSet::from([date!(2026 - 10 - 20)]);
        let strip = render_week(start, &completed, date!(2026 - 10 - 21));

        let lines: Vec<&str> = strip.lines().collect();
        assert_eq!(lines[0], "October 2026");
        assert!(lines[1].starts_with(" Mon "));
        assert!(lines[2].contains('✔'));
        assert!(lines[2].contains("[21]"));
        assert!(!lines[2].contains("20"));
    }
}
