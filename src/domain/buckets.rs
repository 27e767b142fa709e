use super::enums::Bucket;
use super::task::Task;
use chrono::{DateTime, Datelike, TimeZone};

/// Tasks grouped by bucket. Every bucket keeps input order.
#[derive(Debug, Clone, Default)]
pub struct Buckets<'a> {
    pub today: Vec<&'a Task>,
    pub overdue: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
    /// Every input task exactly once
    pub all: Vec<&'a Task>,
}

impl<'a> Buckets<'a> {
    pub fn get(&self, bucket: Bucket) -> &[&'a Task] {
        match bucket {
            Bucket::Today => &self.today,
            Bucket::Overdue => &self.overdue,
            Bucket::Completed => &self.completed,
            Bucket::All => &self.all,
        }
    }
}

/// Which named bucket a task falls into, if any besides `All`.
///
/// Completed wins over dates. "Today" compares the day of the month only, so
/// a task due on the 5th of any future month is listed today on the 5th.
pub fn classify<Tz: TimeZone>(task: &Task, reference: &DateTime<Tz>) -> Option<Bucket> {
    if task.completed {
        return Some(Bucket::Completed);
    }

    let due = task.due_date.with_timezone(&reference.timezone());
    if due.date_naive() < reference.date_naive() {
        Some(Bucket::Overdue)
    } else if due.day() == reference.day() {
        Some(Bucket::Today)
    } else {
        None
    }
}

/// Partition tasks into Today / Overdue / Completed, plus All
pub fn bucketize<'a, Tz: TimeZone>(tasks: &'a [Task], reference: &DateTime<Tz>) -> Buckets<'a> {
    let mut buckets = Buckets {
        all: Vec::with_capacity(tasks.len()),
        ..Buckets::default()
    };

    for task in tasks {
        buckets.all.push(task);
        match classify(task, reference) {
            Some(Bucket::Completed) => buckets.completed.push(task),
            Some(Bucket::Overdue) => buckets.overdue.push(task),
            Some(Bucket::Today) => buckets.today.push(task),
            _ => {}
        }
    }

    buckets
}

/// Share of today's tasks that are done
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRate(pub f64);

impl CompletionRate {
    /// Truncated integer percentage for display
    pub fn percent(&self) -> u32 {
        self.0 as u32
    }

    pub fn ratio(&self) -> f64 {
        self.0 / 100.0
    }
}

/// Home screen view of today: pending and completed tasks due today
#[derive(Debug, Clone, Default)]
pub struct TodaySummary<'a> {
    pub pending: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

impl<'a> TodaySummary<'a> {
    /// Only tasks whose due day of month matches the reference day count,
    /// completed or not.
    pub fn new<Tz: TimeZone>(tasks: &'a [Task], reference: &DateTime<Tz>) -> Self {
        let mut summary = Self::default();
        for task in tasks {
            let due = task.due_date.with_timezone(&reference.timezone());
            if due.day() != reference.day() {
                continue;
            }
            if task.completed {
                summary.completed.push(task);
            } else {
                summary.pending.push(task);
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.pending.len() + self.completed.len()
    }

    pub fn rate(&self) -> CompletionRate {
        let total = self.total();
        if total == 0 {
            return CompletionRate(0.0);
        }
        CompletionRate(self.completed.len() as f64 / total as f64 * 100.0)
    }
}

/// Completion percentage over tasks due today, 0 when none are
pub fn completion_rate<Tz: TimeZone>(tasks: &[Task], reference: &DateTime<Tz>) -> CompletionRate {
    TodaySummary::new(tasks, reference).rate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::NewTask;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap()
    }

    fn task(id: &str, due: DateTime<Utc>, completed: bool) -> Task {
        let mut task = Task::from_new(id.to_string(), NewTask::new("u1", id, due));
        if completed {
            task.complete(due);
        }
        task
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_all_contains_every_task() {
        let now = reference();
        let tasks = vec![
            task("a", now - Duration::days(3), false),
            task("b", now, true),
            task("c", now + Duration::days(2), false),
        ];
        let buckets = bucketize(&tasks, &now);
        assert_eq!(buckets.all.len(), tasks.len());
        assert_eq!(ids(&buckets.all), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_completed_wins_over_dates() {
        let now = reference();
        let tasks = vec![
            task("old", now - Duration::days(10), true),
            task("today", now + Duration::hours(2), true),
        ];
        let buckets = bucketize(&tasks, &now);
        assert_eq!(ids(&buckets.completed), vec!["old", "today"]);
        assert!(buckets.today.is_empty());
        assert!(buckets.overdue.is_empty());
    }

    #[test]
    fn test_today_and_overdue() {
        let now = reference();
        let tasks = vec![
            task("late", now - Duration::days(1), false),
            task("earlier-today", now - Duration::hours(9), false),
            task("tonight", now + Duration::hours(12), false),
            task("future", now + Duration::days(3), false),
        ];
        let buckets = bucketize(&tasks, &now);
        assert_eq!(ids(&buckets.overdue), vec!["late"]);
        assert_eq!(ids(&buckets.today), vec!["earlier-today", "tonight"]);
        assert_eq!(buckets.all.len(), 4);
        assert_eq!(classify(&tasks[3], &now), None);
    }

    #[test]
    fn test_same_day_of_month_next_month_counts_as_today() {
        let now = reference();
        let next_month = Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap();
        let tasks = vec![task("june", next_month, false)];
        let buckets = bucketize(&tasks, &now);
        assert_eq!(ids(&buckets.today), vec!["june"]);
    }

    #[test]
    fn test_bucket_accessor() {
        let now = reference();
        let tasks = vec![task("late", now - Duration::days(2), false)];
        let buckets = bucketize(&tasks, &now);
        assert_eq!(buckets.get(Bucket::Overdue).len(), 1);
        assert_eq!(buckets.get(Bucket::Today).len(), 0);
        assert_eq!(buckets.get(Bucket::All).len(), 1);
    }

    #[test]
    fn test_completion_rate_empty_is_zero() {
        let now = reference();
        let tasks = vec![task("future", now + Duration::days(3), true)];
        assert_eq!(completion_rate(&tasks, &now), CompletionRate(0.0));
        assert_eq!(completion_rate(&[], &now), CompletionRate(0.0));
    }

    #[test]
    fn test_completion_rate_all_done() {
        let now = reference();
        let tasks = vec![task("a", now, true), task("b", now + Duration::hours(1), true)];
        assert_eq!(completion_rate(&tasks, &now).percent(), 100);
    }

    #[test]
    fn test_completion_rate_partial() {
        let now = reference();
        let tasks = vec![
            task("a", now, true),
            task("b", now, false),
            task("c", now, false),
            task("elsewhere", now - Duration::days(1), true),
        ];
        let rate = completion_rate(&tasks, &now);
        assert!((rate.0 - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(rate.percent(), 33);

        let summary = TodaySummary::new(&tasks, &now);
        assert_eq!(summary.total(), 3);
        assert_eq!(ids(&summary.pending), vec!["b", "c"]);
    }
}
