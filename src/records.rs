use std::{cmp::Ordering, collections::BTreeSet};

use chrono::{DateTime, Datelike, Days, FixedOffset, Local, NaiveDate, Utc};
use tracing::debug;

use crate::domain::{
    Donor, DonorStatus, Gift, GiftKind, GiftState, Task, TaskCategory, TaskStatus,
};

// -----------------------------------------------------------------------------
// Predicates
// -----------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct SearchFilter {
    needle: Option<String>,
}

impl SearchFilter {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let needle = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        };
        Self { needle }
    }

    pub fn matches_any(&self, fields: &[&str]) -> bool {
        match &self.needle {
            None => true,
            Some(needle) => fields
                .iter()
                .any(|field| field.to_lowercase().contains(needle)),
        }
    }
}

/// Allowed values for a status-like field. An empty set means no filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership<T: Ord> {
    allowed: BTreeSet<T>,
}

impl<T: Ord> Default for Membership<T> {
    fn default() -> Self {
        Self {
            allowed: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Copy> Membership<T> {
    pub fn only(values: &[T]) -> Self {
        Self {
            allowed: values.iter().copied().collect(),
        }
    }

    pub fn admits(&self, value: T) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&value)
    }

    pub fn contains(&self, value: T) -> bool {
        self.allowed.contains(&value)
    }

    pub fn toggle(&mut self, value: T) {
        if !self.allowed.remove(&value) {
            self.allowed.insert(value);
        }
    }

    pub fn clear(&mut self) {
        self.allowed.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateRange {
    #[default]
    All,
    Last30Days,
    YearToDate,
}

impl DateRange {
    pub const ALL: [DateRange; 3] = [DateRange::All, DateRange::Last30Days, DateRange::YearToDate];

    pub fn label(&self) -> &'static str {
        match self {
            DateRange::All => "All time",
            DateRange::Last30Days => "Last 30 days",
            DateRange::YearToDate => "Year to date",
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            DateRange::All => true,
            DateRange::Last30Days => match today.checked_sub_days(Days::new(30)) {
                Some(cutoff) => date >= cutoff && date <= today,
                None => date <= today,
            },
            DateRange::YearToDate => date.year() == today.year() && date <= today,
        }
    }
}

/// The viewer's day and the offset record timestamps are read in. Both sides
/// of a date comparison must come from the same calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calendar {
    pub today: NaiveDate,
    pub offset: FixedOffset,
}

impl Calendar {
    pub fn local() -> Self {
        let now = Local::now();
        Self {
            today: now.date_naive(),
            offset: *now.offset(),
        }
    }

    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    NameAsc,
    PriorityAsc,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::DateDesc => "Newest first",
            SortKey::DateAsc => "Oldest first",
            SortKey::AmountDesc => "Largest amount",
            SortKey::NameAsc => "Name (A-Z)",
            SortKey::PriorityAsc => "Priority",
        }
    }
}

// -----------------------------------------------------------------------------
// Records
// -----------------------------------------------------------------------------

pub trait Record {
    type Status: Ord + Copy;

    fn status(&self) -> Self::Status;
    fn record_date(&self, calendar: &Calendar) -> Option<NaiveDate>;
    fn amount(&self) -> f64 {
        0.0
    }
    fn priority_rank(&self) -> u8 {
        0
    }
}

impl Record for Donor {
    type Status = DonorStatus;

    fn status(&self) -> DonorStatus {
        self.status
    }

    fn record_date(&self, calendar: &Calendar) -> Option<NaiveDate> {
        self.last_gift_at.map(|at| calendar.day_of(at))
    }

    fn amount(&self) -> f64 {
        self.lifetime_given
    }
}

impl Record for Gift {
    type Status = GiftState;

    fn status(&self) -> GiftState {
        self.status.state()
    }

    fn record_date(&self, calendar: &Calendar) -> Option<NaiveDate> {
        Some(calendar.day_of(self.date))
    }

    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Record for Task {
    type Status = TaskStatus;

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn record_date(&self, _calendar: &Calendar) -> Option<NaiveDate> {
        Some(self.due_date)
    }

    fn priority_rank(&self) -> u8 {
        self.priority.rank()
    }
}

pub struct Searchable<'a> {
    pub name: &'a str,
    pub fields: Vec<&'a str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordQuery<S: Ord> {
    pub search: String,
    pub statuses: Membership<S>,
    pub range: DateRange,
    pub sort: SortKey,
}

impl<S: Ord> Default for RecordQuery<S> {
    fn default() -> Self {
        Self {
            search: String::new(),
            statuses: Membership::default(),
            range: DateRange::All,
            sort: SortKey::DateDesc,
        }
    }
}

/// Filters with every predicate ANDed, then sorts. `sort_by` is stable, so
/// ties keep their original collection order.
pub fn run_query<'a, T, F>(
    records: &'a [T],
    query: &RecordQuery<T::Status>,
    calendar: &Calendar,
    describe: F,
) -> Vec<&'a T>
where
    T: Record,
    F: Fn(&'a T) -> Searchable<'a>,
{
    let filter = SearchFilter::new(&query.search);
    let mut rows: Vec<(&'a T, &'a str)> = records
        .iter()
        .filter(|record| query.statuses.admits(record.status()))
        .filter(|record| match (query.range, record.record_date(calendar)) {
            (DateRange::All, _) => true,
            (range, Some(date)) => range.contains(date, calendar.today),
            (_, None) => false,
        })
        .filter_map(|record| {
            let searchable = describe(record);
            let mut fields = searchable.fields;
            fields.push(searchable.name);
            filter
                .matches_any(&fields)
                .then_some((record, searchable.name))
        })
        .collect();

    rows.sort_by(|(a, a_name), (b, b_name)| {
        compare(query.sort, calendar, *a, a_name, *b, b_name)
    });
    debug!(
        total = records.len(),
        matched = rows.len(),
        "record query evaluated"
    );
    rows.into_iter().map(|(record, _)| record).collect()
}

fn compare<T: Record>(
    key: SortKey,
    calendar: &Calendar,
    a: &T,
    a_name: &str,
    b: &T,
    b_name: &str,
) -> Ordering {
    match key {
        // Records without a date sort last in either direction.
        SortKey::DateDesc => match (a.record_date(calendar), b.record_date(calendar)) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::DateAsc => match (a.record_date(calendar), b.record_date(calendar)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::AmountDesc => b.amount().total_cmp(&a.amount()),
        SortKey::NameAsc => a_name.to_lowercase().cmp(&b_name.to_lowercase()),
        SortKey::PriorityAsc => a.priority_rank().cmp(&b.priority_rank()),
    }
}

fn find_donor<'a>(donors: &'a [Donor], id: &str) -> Option<&'a Donor> {
    donors.iter().find(|donor| donor.id == id)
}

// -----------------------------------------------------------------------------
// Donors
// -----------------------------------------------------------------------------

pub type DonorQuery = RecordQuery<DonorStatus>;

pub fn donor_view<'a>(
    donors: &'a [Donor],
    query: &DonorQuery,
    calendar: &Calendar,
) -> Vec<&'a Donor> {
    run_query(donors, query, calendar, |donor| {
        let mut fields = vec![donor.email.as_str()];
        if let Some(address) = &donor.address {
            fields.push(address.city.as_str());
            fields.push(address.state.as_str());
        }
        fields.extend(donor.tags.iter().map(String::as_str));
        Searchable {
            name: &donor.name,
            fields,
        }
    })
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DonorStats {
    pub total: usize,
    pub active: usize,
    pub lapsed: usize,
    pub new: usize,
    pub at_risk: usize,
    pub lifetime_total: f64,
}

impl DonorStats {
    pub fn from_donors(donors: &[&Donor]) -> Self {
        donors.iter().fold(
            Self {
                total: donors.len(),
                ..Self::default()
            },
            |mut stats, donor| {
                match donor.status {
                    DonorStatus::Active => stats.active += 1,
                    DonorStatus::Lapsed => stats.lapsed += 1,
                    DonorStatus::New => stats.new += 1,
                    DonorStatus::AtRisk => stats.at_risk += 1,
                }
                stats.lifetime_total += donor.lifetime_given;
                stats
            },
        )
    }
}

// -----------------------------------------------------------------------------
// Gifts
// -----------------------------------------------------------------------------

pub type GiftQuery = RecordQuery<GiftState>;

/// Gifts whose donor no longer resolves still match on their own fields, and
/// sort under an empty name.
pub fn gift_view<'a>(
    gifts: &'a [Gift],
    donors: &'a [Donor],
    query: &GiftQuery,
    calendar: &Calendar,
) -> Vec<&'a Gift> {
    run_query(gifts, query, calendar, |gift| match find_donor(donors, &gift.donor_id) {
        Some(donor) => Searchable {
            name: &donor.name,
            fields: vec![donor.email.as_str(), gift.id.as_str()],
        },
        None => Searchable {
            name: "",
            fields: vec![gift.id.as_str()],
        },
    })
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GiftStats {
    pub total_volume: f64,
    pub success_count: usize,
    pub average_gift: f64,
    pub pending_count: usize,
    pub failed_count: usize,
    pub recurring_count: usize,
}

impl GiftStats {
    pub fn from_gifts(gifts: &[&Gift]) -> Self {
        let mut stats = Self::default();
        for gift in gifts {
            match gift.status.state() {
                GiftState::Succeeded => {
                    stats.total_volume += gift.amount;
                    stats.success_count += 1;
                }
                GiftState::Pending => stats.pending_count += 1,
                GiftState::Failed => stats.failed_count += 1,
            }
            if matches!(gift.kind, GiftKind::Recurring(_)) {
                stats.recurring_count += 1;
            }
        }
        stats.average_gift = if stats.success_count == 0 {
            0.0
        } else {
            stats.total_volume / stats.success_count as f64
        };
        stats
    }
}

// -----------------------------------------------------------------------------
// Tasks
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskQuery {
    pub base: RecordQuery<TaskStatus>,
    pub categories: Membership<TaskCategory>,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            base: RecordQuery {
                sort: SortKey::DateAsc,
                ..RecordQuery::default()
            },
            categories: Membership::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskBucket {
    Overdue,
    Today,
    Tomorrow,
    Upcoming,
    Completed,
}

impl TaskBucket {
    pub const ORDER: [TaskBucket; 5] = [
        TaskBucket::Overdue,
        TaskBucket::Today,
        TaskBucket::Tomorrow,
        TaskBucket::Upcoming,
        TaskBucket::Completed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskBucket::Overdue => "Overdue",
            TaskBucket::Today => "Today",
            TaskBucket::Tomorrow => "Tomorrow",
            TaskBucket::Upcoming => "Upcoming",
            TaskBucket::Completed => "Completed",
        }
    }

    pub fn classify(task: &Task, today: NaiveDate) -> Self {
        if task.status == TaskStatus::Completed {
            return TaskBucket::Completed;
        }
        let tomorrow = today.succ_opt().unwrap_or(today);
        match task.due_date {
            due if due < today => TaskBucket::Overdue,
            due if due == today => TaskBucket::Today,
            due if due == tomorrow => TaskBucket::Tomorrow,
            _ => TaskBucket::Upcoming,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct TaskGroup<'a> {
    pub bucket: TaskBucket,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, PartialEq)]
pub enum TaskView<'a> {
    Grouped(Vec<TaskGroup<'a>>),
    Flat(Vec<&'a Task>),
}

impl<'a> TaskView<'a> {
    pub fn len(&self) -> usize {
        match self {
            TaskView::Grouped(groups) => groups.iter().map(|group| group.tasks.len()).sum(),
            TaskView::Flat(tasks) => tasks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    donors: &'a [Donor],
    query: &TaskQuery,
    calendar: &Calendar,
) -> Vec<&'a Task> {
    run_query(tasks, &query.base, calendar, |task| {
        let mut fields = vec![task.title.as_str()];
        if let Some(description) = &task.description {
            fields.push(description.as_str());
        }
        if let Some(donor) = task
            .donor_id
            .as_deref()
            .and_then(|id| find_donor(donors, id))
        {
            fields.push(donor.name.as_str());
        }
        Searchable {
            name: &task.title,
            fields,
        }
    })
    .into_iter()
    .filter(|task| query.categories.admits(task.category))
    .collect()
}

pub fn task_view<'a>(
    tasks: &'a [Task],
    donors: &'a [Donor],
    query: &TaskQuery,
    calendar: &Calendar,
) -> TaskView<'a> {
    let rows = filter_tasks(tasks, donors, query, calendar);
    if query.base.sort == SortKey::PriorityAsc {
        return TaskView::Flat(rows);
    }
    TaskView::Grouped(group_tasks(&rows, calendar.today))
}

pub fn group_tasks<'a>(tasks: &[&'a Task], today: NaiveDate) -> Vec<TaskGroup<'a>> {
    TaskBucket::ORDER
        .iter()
        .filter_map(|bucket| {
            let members: Vec<&'a Task> = tasks
                .iter()
                .copied()
                .filter(|task| TaskBucket::classify(task, today) == *bucket)
                .collect();
            (!members.is_empty()).then_some(TaskGroup {
                bucket: *bucket,
                tasks: members,
            })
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub open: usize,
    pub overdue: usize,
    pub completed: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task], today: NaiveDate) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            match TaskBucket::classify(task, today) {
                TaskBucket::Completed => stats.completed += 1,
                TaskBucket::Overdue => {
                    stats.open += 1;
                    stats.overdue += 1;
                }
                _ => stats.open += 1,
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cadence, GiftChannel, GiftStatus, Instrument, Priority};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn calendar() -> Calendar {
        Calendar {
            today: today(),
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    fn noon(on: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&on.and_hms_opt(12, 0, 0).unwrap())
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn donor(id: &str, name: &str, email: &str) -> Donor {
        Donor {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar: None,
            address: None,
            status: DonorStatus::Active,
            lifetime_given: 0.0,
            last_gift_amount: 0.0,
            last_gift_at: None,
            cadence: Cadence::OneTime,
            tags: BTreeSet::new(),
            activities: Vec::new(),
        }
    }

    fn gift(id: &str, donor_id: &str, amount: f64, status: GiftStatus, on: NaiveDate) -> Gift {
        Gift {
            id: id.into(),
            donor_id: donor_id.into(),
            date: Utc
                .from_utc_datetime(&on.and_hms_opt(23, 59, 0).unwrap()),
            amount,
            status,
            channel: GiftChannel::Online,
            instrument: Instrument::Card,
            kind: GiftKind::OneTime,
        }
    }

    fn task(id: &str, status: TaskStatus, priority: Priority, due_date: NaiveDate) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: None,
            status,
            priority,
            category: TaskCategory::Todo,
            due_date,
            donor_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
        }
    }

    fn ids<T, F: Fn(&T) -> &str>(rows: &[&T], id: F) -> Vec<String> {
        rows.iter().map(|row| id(row).to_owned()).collect()
    }

    #[test]
    fn donor_search_matches_name_or_email_case_insensitively() {
        let donors = vec![
            donor("d1", "Alice Smith", "alice@example.com"),
            donor("d2", "Bob Johnson", "bob@example.com"),
        ];
        let query = DonorQuery {
            search: "alice".into(),
            ..DonorQuery::default()
        };
        let rows = donor_view(&donors, &query, &calendar());
        assert_eq!(ids(&rows, |d: &Donor| d.id.as_str()), vec!["d1"]);

        let query = DonorQuery {
            search: "  BOB@EXAMPLE ".into(),
            ..DonorQuery::default()
        };
        let rows = donor_view(&donors, &query, &calendar());
        assert_eq!(ids(&rows, |d: &Donor| d.id.as_str()), vec!["d2"]);
    }

    #[test]
    fn empty_membership_matches_everything() {
        let mut donors = vec![
            donor("d1", "Alice Smith", "a@example.com"),
            donor("d2", "Bob Johnson", "b@example.com"),
        ];
        donors[1].status = DonorStatus::Lapsed;

        let all = donor_view(&donors, &DonorQuery::default(), &calendar());
        assert_eq!(all.len(), 2);

        let query = DonorQuery {
            statuses: Membership::only(&[DonorStatus::Lapsed]),
            ..DonorQuery::default()
        };
        let lapsed = donor_view(&donors, &query, &calendar());
        assert_eq!(ids(&lapsed, |d: &Donor| d.id.as_str()), vec!["d2"]);
    }

    #[test]
    fn membership_toggle_adds_and_removes() {
        let mut membership = Membership::default();
        membership.toggle(GiftState::Failed);
        assert!(membership.contains(GiftState::Failed));
        assert!(!membership.admits(GiftState::Pending));
        membership.toggle(GiftState::Failed);
        assert!(membership.is_empty());
        assert!(membership.admits(GiftState::Pending));
    }

    #[rstest]
    #[case(DateRange::All, date(1, 1), true)]
    #[case(DateRange::Last30Days, date(9, 17), true)]
    #[case(DateRange::Last30Days, date(9, 16), false)]
    #[case(DateRange::Last30Days, date(10, 17), true)]
    #[case(DateRange::YearToDate, date(1, 1), true)]
    #[case(DateRange::YearToDate, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(), false)]
    fn date_range_uses_calendar_days(
        #[case] range: DateRange,
        #[case] on: NaiveDate,
        #[case] expected: bool,
    ) {
        assert_eq!(range.contains(on, today()), expected);
    }

    #[test]
    fn gift_stats_scenario() {
        let gifts = vec![
            gift("g1", "d1", 250.0, GiftStatus::Succeeded, today()),
            gift("g2", "d1", 100.0, GiftStatus::Pending, today()),
            gift(
                "g3",
                "d1",
                500.0,
                GiftStatus::Failed {
                    reason: "declined".into(),
                },
                today(),
            ),
        ];
        let rows: Vec<&Gift> = gifts.iter().collect();
        let stats = GiftStats::from_gifts(&rows);
        assert_eq!(stats.total_volume, 250.0);
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.average_gift, 250.0);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.failed_count, 1);
    }

    #[test]
    fn average_is_zero_without_successes() {
        let gifts = vec![gift("g1", "d1", 100.0, GiftStatus::Pending, today())];
        let rows: Vec<&Gift> = gifts.iter().collect();
        let stats = GiftStats::from_gifts(&rows);
        assert_eq!(stats.average_gift, 0.0);
        assert!(!stats.average_gift.is_nan());
        assert_eq!(GiftStats::from_gifts(&[]).average_gift, 0.0);
    }

    #[test]
    fn gift_search_joins_donor_and_tolerates_unknown_donors() {
        let donors = vec![donor("d1", "Alice Smith", "alice@example.com")];
        let gifts = vec![
            gift("g1", "d1", 10.0, GiftStatus::Succeeded, today()),
            gift("g2", "ghost", 20.0, GiftStatus::Succeeded, today()),
        ];
        let query = GiftQuery {
            search: "alice".into(),
            ..GiftQuery::default()
        };
        let rows = gift_view(&gifts, &donors, &query, &calendar());
        assert_eq!(ids(&rows, |g: &Gift| g.id.as_str()), vec!["g1"]);

        let rows = gift_view(&gifts, &donors, &GiftQuery::default(), &calendar());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn sorts_are_stable_for_equal_keys() {
        let donors = vec![donor("d1", "Alice Smith", "alice@example.com")];
        let gifts = vec![
            gift("g1", "d1", 50.0, GiftStatus::Succeeded, date(10, 1)),
            gift("g2", "d1", 75.0, GiftStatus::Succeeded, date(10, 3)),
            gift("g3", "d1", 50.0, GiftStatus::Succeeded, date(10, 2)),
        ];
        let by_amount = GiftQuery {
            sort: SortKey::AmountDesc,
            ..GiftQuery::default()
        };
        let rows = gift_view(&gifts, &donors, &by_amount, &calendar());
        assert_eq!(ids(&rows, |g: &Gift| g.id.as_str()), vec!["g2", "g1", "g3"]);

        let by_date = GiftQuery::default();
        let rows = gift_view(&gifts, &donors, &by_date, &calendar());
        assert_eq!(ids(&rows, |g: &Gift| g.id.as_str()), vec!["g2", "g3", "g1"]);

        let by_name = GiftQuery {
            sort: SortKey::NameAsc,
            ..GiftQuery::default()
        };
        let rows = gift_view(&gifts, &donors, &by_name, &calendar());
        assert_eq!(ids(&rows, |g: &Gift| g.id.as_str()), vec!["g1", "g2", "g3"]);
    }

    #[test]
    fn donors_without_gifts_sort_last_by_date() {
        let mut donors = vec![
            donor("d1", "Alice Smith", "a@example.com"),
            donor("d2", "Bob Johnson", "b@example.com"),
        ];
        donors[1].last_gift_at = Some(noon(date(3, 1)));
        let rows = donor_view(&donors, &DonorQuery::default(), &calendar());
        assert_eq!(ids(&rows, |d: &Donor| d.id.as_str()), vec!["d2", "d1"]);

        let ranged = DonorQuery {
            range: DateRange::YearToDate,
            ..DonorQuery::default()
        };
        let rows = donor_view(&donors, &ranged, &calendar());
        assert_eq!(ids(&rows, |d: &Donor| d.id.as_str()), vec!["d2"]);
    }

    #[test]
    fn evening_gift_west_of_utc_stays_on_its_local_day() {
        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
        let calendar = Calendar {
            today: today(),
            offset: pacific,
        };
        let evening = pacific
            .with_ymd_and_hms(2026, 10, 17, 20, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(evening.date_naive(), date(10, 18));

        let mut late = gift("g1", "d1", 40.0, GiftStatus::Succeeded, today());
        late.date = evening;
        assert_eq!(late.record_date(&calendar), Some(today()));

        let gifts = vec![late];
        let donors = vec![donor("d1", "Alice Smith", "alice@example.com")];
        for range in [DateRange::Last30Days, DateRange::YearToDate] {
            let query = GiftQuery {
                range,
                ..GiftQuery::default()
            };
            assert_eq!(gift_view(&gifts, &donors, &query, &calendar).len(), 1);
        }

        let mut giver = donor("d1", "Alice Smith", "alice@example.com");
        giver.last_gift_at = Some(evening);
        let donors = vec![giver];
        let recent = DonorQuery {
            range: DateRange::Last30Days,
            ..DonorQuery::default()
        };
        assert_eq!(donor_view(&donors, &recent, &calendar).len(), 1);
    }

    #[test]
    fn every_task_lands_in_exactly_one_bucket() {
        let tasks = vec![
            task("late", TaskStatus::Open, Priority::Low, date(10, 10)),
            task("today", TaskStatus::Open, Priority::High, today()),
            task("tomorrow", TaskStatus::Open, Priority::Medium, date(10, 18)),
            task("later", TaskStatus::Open, Priority::High, date(11, 2)),
            task("done-late", TaskStatus::Completed, Priority::High, date(10, 1)),
            task("done-soon", TaskStatus::Completed, Priority::Low, date(10, 30)),
        ];
        let view = task_view(&tasks, &[], &TaskQuery::default(), &calendar());
        assert_eq!(view.len(), tasks.len());
        assert!(!view.is_empty());
        let TaskView::Grouped(groups) = view else {
            panic!("date sort should group");
        };

        let summary: Vec<(TaskBucket, Vec<&str>)> = groups
            .iter()
            .map(|group| {
                (
                    group.bucket,
                    group.tasks.iter().map(|t| t.id.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (TaskBucket::Overdue, vec!["late"]),
                (TaskBucket::Today, vec!["today"]),
                (TaskBucket::Tomorrow, vec!["tomorrow"]),
                (TaskBucket::Upcoming, vec!["later"]),
                (TaskBucket::Completed, vec!["done-late", "done-soon"]),
            ]
        );
        let total: usize = groups.iter().map(|g| g.tasks.len()).sum();
        assert_eq!(total, tasks.len());
    }

    #[test]
    fn empty_buckets_are_omitted() {
        let tasks = vec![task("today", TaskStatus::Open, Priority::High, today())];
        let rows: Vec<&Task> = tasks.iter().collect();
        let groups = group_tasks(&rows, today());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].bucket, TaskBucket::Today);
    }

    #[test]
    fn priority_sort_suppresses_grouping() {
        let tasks = vec![
            task("a", TaskStatus::Open, Priority::Low, date(10, 10)),
            task("b", TaskStatus::Completed, Priority::High, today()),
            task("c", TaskStatus::Open, Priority::Medium, date(10, 20)),
            task("d", TaskStatus::Open, Priority::High, date(10, 19)),
        ];
        let query = TaskQuery {
            base: RecordQuery {
                sort: SortKey::PriorityAsc,
                ..RecordQuery::default()
            },
            ..TaskQuery::default()
        };
        let view = task_view(&tasks, &[], &query, &calendar());
        let expected = filter_tasks(&tasks, &[], &query, &calendar());
        assert_eq!(view.len(), expected.len());
        assert_eq!(view, TaskView::Flat(expected));
        let TaskView::Flat(rows) = view else {
            panic!("priority sort should not group");
        };
        assert_eq!(ids(&rows, |t: &Task| t.id.as_str()), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn task_category_and_donor_search_filters() {
        let donors = vec![donor("d1", "Alice Smith", "alice@example.com")];
        let mut tasks = vec![
            task("call", TaskStatus::Open, Priority::High, today()),
            task("mail", TaskStatus::Open, Priority::High, today()),
        ];
        tasks[0].category = TaskCategory::Call;
        tasks[0].donor_id = Some("d1".into());
        tasks[1].category = TaskCategory::Email;
        tasks[1].donor_id = Some("gone".into());

        let query = TaskQuery {
            categories: Membership::only(&[TaskCategory::Email]),
            ..TaskQuery::default()
        };
        let rows = filter_tasks(&tasks, &donors, &query, &calendar());
        assert_eq!(ids(&rows, |t: &Task| t.id.as_str()), vec!["mail"]);

        let query = TaskQuery {
            base: RecordQuery {
                search: "smith".into(),
                ..TaskQuery::default().base
            },
            ..TaskQuery::default()
        };
        let rows = filter_tasks(&tasks, &donors, &query, &calendar());
        assert_eq!(ids(&rows, |t: &Task| t.id.as_str()), vec!["call"]);
    }

    #[test]
    fn task_stats_count_overdue_as_open() {
        let tasks = vec![
            task("late", TaskStatus::Open, Priority::Low, date(10, 10)),
            task("today", TaskStatus::Open, Priority::High, today()),
            task("done", TaskStatus::Completed, Priority::High, date(10, 1)),
        ];
        assert_eq!(
            TaskStats::from_tasks(&tasks, today()),
            TaskStats {
                open: 2,
                overdue: 1,
                completed: 1,
            }
        );
    }

    #[test]
    fn donor_stats_sum_by_status() {
        let mut donors = vec![
            donor("d1", "Alice Smith", "a@example.com"),
            donor("d2", "Bob Johnson", "b@example.com"),
        ];
        donors[0].lifetime_given = 100.0;
        donors[1].lifetime_given = 50.5;
        donors[1].status = DonorStatus::AtRisk;
        let rows: Vec<&Donor> = donors.iter().collect();
        let stats = DonorStats::from_donors(&rows);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.at_risk, 1);
        assert_eq!(stats.lifetime_total, 150.5);
    }
}
