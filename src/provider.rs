use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

use crate::domain::{
    Activity, ActivityKind, Address, Cadence, Campaign, Donor, DonorStatus, Gift, GiftChannel,
    GiftKind, GiftStatus, Instrument, Priority, RecurringInfo, Task, TaskCategory, TaskStatus,
};

pub trait DataProvider {
    fn campaigns(&self) -> &[Campaign];
    fn donors(&self) -> &[Donor];
    fn gifts(&self) -> &[Gift];
    fn tasks(&self) -> &[Task];

    fn find_donor(&self, id: &str) -> Option<&Donor> {
        self.donors().iter().find(|donor| donor.id == id)
    }

    fn find_campaign(&self, id: &str) -> Option<&Campaign> {
        self.campaigns().iter().find(|campaign| campaign.id == id)
    }

    fn gifts_for_donor(&self, donor_id: &str) -> Vec<&Gift> {
        self.gifts()
            .iter()
            .filter(|gift| gift.donor_id == donor_id)
            .collect()
    }
}

pub struct MockData {
    campaigns: Vec<Campaign>,
    donors: Vec<Donor>,
    gifts: Vec<Gift>,
    tasks: Vec<Task>,
}

impl DataProvider for MockData {
    fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    fn donors(&self) -> &[Donor] {
        &self.donors
    }

    fn gifts(&self) -> &[Gift] {
        &self.gifts
    }

    fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

impl MockData {
    pub fn seeded(today: NaiveDate) -> Self {
        let gifts = seed_gifts(today);
        let mut donors = seed_donors();
        for donor in &mut donors {
            for gift in gifts.iter().filter(|gift| gift.donor_id == donor.id) {
                donor.activities.push(gift_activity(gift));
            }
            donor.last_gift_at = donor.latest_gift_at();
            if let Some(latest) = donor
                .activities
                .iter()
                .filter(|a| a.kind == ActivityKind::Gift)
                .max_by_key(|a| a.timestamp)
            {
                donor.last_gift_amount = latest.amount.unwrap_or_default();
            }
        }
        seed_interactions(&mut donors, today);

        Self {
            campaigns: seed_campaigns(),
            donors,
            gifts,
            tasks: seed_tasks(today),
        }
    }
}

fn days_ago(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(today)
}

fn days_ahead(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_add_days(Days::new(days)).unwrap_or(today)
}

fn at_noon(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default())
        .and_utc()
}

fn seed_campaigns() -> Vec<Campaign> {
    vec![
        Campaign {
            id: "cw-101".into(),
            title: "Clean Water for Turkana".into(),
            location: "Lodwar, Kenya".into(),
            image: "campaigns/turkana.jpg".into(),
            raised: 18_450.0,
            goal: 25_000.0,
            category: "Water".into(),
            description: "Drilling and maintaining boreholes for three villages.".into(),
        },
        Campaign {
            id: "cw-102".into(),
            title: "Literacy Circles".into(),
            location: "Guatemala City, Guatemala".into(),
            image: "campaigns/literacy.jpg".into(),
            raised: 7_200.0,
            goal: 12_000.0,
            category: "Education".into(),
            description: "Weekly reading groups led by trained local mentors.".into(),
        },
        Campaign {
            id: "cw-103".into(),
            title: "Mobile Clinic Fuel Fund".into(),
            location: "Sylhet, Bangladesh".into(),
            image: "campaigns/clinic.jpg".into(),
            raised: 9_900.0,
            goal: 9_000.0,
            category: "Health".into(),
            description: "Keeps the river clinic boat running through monsoon season.".into(),
        },
        Campaign {
            id: "cw-104".into(),
            title: "Seed Bank Restart".into(),
            location: "Oaxaca, Mexico".into(),
            image: "campaigns/seeds.jpg".into(),
            raised: 0.0,
            goal: 6_500.0,
            category: "Agriculture".into(),
            description: "Restocking heirloom maize varieties after the drought.".into(),
        },
    ]
}

fn donor(
    id: &str,
    name: &str,
    email: &str,
    city_state: Option<(&str, &str)>,
    status: DonorStatus,
    cadence: Cadence,
    tags: &[&str],
) -> Donor {
    Donor {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        avatar: None,
        address: city_state.map(|(city, state)| Address {
            street: String::new(),
            city: city.into(),
            state: state.into(),
            zip: String::new(),
        }),
        status,
        lifetime_given: 0.0,
        last_gift_amount: 0.0,
        last_gift_at: None,
        cadence,
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect::<BTreeSet<_>>(),
        activities: Vec::new(),
    }
}

fn seed_donors() -> Vec<Donor> {
    let mut donors = vec![
        donor(
            "d-001",
            "Alice Smith",
            "alice@example.com",
            Some(("Portland", "OR")),
            DonorStatus::Active,
            Cadence::Monthly,
            &["Major Donor", "Board"],
        ),
        donor(
            "d-002",
            "Bob Johnson",
            "bob@example.com",
            Some(("Austin", "TX")),
            DonorStatus::Lapsed,
            Cadence::Annually,
            &["Event Attendee"],
        ),
        donor(
            "d-003",
            "Carmen Ortiz",
            "carmen.ortiz@example.org",
            Some(("Denver", "CO")),
            DonorStatus::New,
            Cadence::OneTime,
            &[],
        ),
        donor(
            "d-004",
            "Dev Patel",
            "dev.patel@example.net",
            Some(("Raleigh", "NC")),
            DonorStatus::AtRisk,
            Cadence::Monthly,
            &["Volunteer"],
        ),
        donor(
            "d-005",
            "Eun-ji Park",
            "eunji@example.com",
            None,
            DonorStatus::Active,
            Cadence::Irregular,
            &["Church Partner"],
        ),
    ];
    // Lifetime totals include giving that predates the seeded gift list.
    let prior_giving = [4_200.0, 600.0, 0.0, 900.0, 1_150.0];
    for (donor, prior) in donors.iter_mut().zip(prior_giving) {
        donor.lifetime_given = prior;
    }
    donors
}

fn recurring(today: NaiveDate, started_days_ago: u64, next_in: u64) -> GiftKind {
    GiftKind::Recurring(RecurringInfo {
        frequency: "Monthly".into(),
        start_date: days_ago(today, started_days_ago),
        next_charge_date: days_ahead(today, next_in),
    })
}

fn seed_gifts(today: NaiveDate) -> Vec<Gift> {
    let gift = |id: &str,
                donor_id: &str,
                days: u64,
                amount: f64,
                status: GiftStatus,
                channel: GiftChannel,
                instrument: Instrument,
                kind: GiftKind| Gift {
        id: id.into(),
        donor_id: donor_id.into(),
        date: at_noon(days_ago(today, days)),
        amount,
        status,
        channel,
        instrument,
        kind,
    };

    vec![
        gift(
            "g-1001",
            "d-001",
            2,
            250.0,
            GiftStatus::Succeeded,
            GiftChannel::Online,
            Instrument::Card,
            recurring(today, 62, 28),
        ),
        gift(
            "g-1002",
            "d-003",
            5,
            100.0,
            GiftStatus::Pending,
            GiftChannel::Online,
            Instrument::Ach,
            GiftKind::OneTime,
        ),
        gift(
            "g-1003",
            "d-004",
            9,
            500.0,
            GiftStatus::Failed {
                reason: "Card declined: insufficient funds".into(),
            },
            GiftChannel::Online,
            Instrument::Card,
            recurring(today, 120, 1),
        ),
        gift(
            "g-1004",
            "d-002",
            45,
            75.0,
            GiftStatus::Succeeded,
            GiftChannel::Offline,
            Instrument::Check,
            GiftKind::OneTime,
        ),
        gift(
            "g-1005",
            "d-001",
            32,
            250.0,
            GiftStatus::Succeeded,
            GiftChannel::Online,
            Instrument::Card,
            recurring(today, 62, 28),
        ),
        gift(
            "g-1006",
            "d-005",
            14,
            40.0,
            GiftStatus::Succeeded,
            GiftChannel::Offline,
            Instrument::Cash,
            GiftKind::OneTime,
        ),
        gift(
            "g-1007",
            "d-004",
            39,
            35.0,
            GiftStatus::Succeeded,
            GiftChannel::Online,
            Instrument::Ach,
            recurring(today, 120, 1),
        ),
        gift(
            "g-1008",
            "d-009",
            20,
            60.0,
            GiftStatus::Succeeded,
            GiftChannel::Offline,
            Instrument::Check,
            GiftKind::OneTime,
        ),
        gift(
            "g-1009",
            "d-005",
            400,
            1_000.0,
            GiftStatus::Succeeded,
            GiftChannel::Offline,
            Instrument::Check,
            GiftKind::OneTime,
        ),
    ]
}

fn gift_activity(gift: &Gift) -> Activity {
    let state = gift.status.state();
    Activity {
        id: format!("act-{}", gift.id),
        kind: ActivityKind::Gift,
        timestamp: gift.date,
        title: format!("{} gift via {}", gift.kind.label(), gift.instrument.label()),
        description: gift.failure_reason().map(str::to_owned),
        amount: Some(gift.amount),
        status: Some(state.label().to_owned()),
        actor: None,
    }
}

fn seed_interactions(donors: &mut [Donor], today: NaiveDate) {
    let entries = [
        (
            "d-001",
            ActivityKind::Meeting,
            10,
            "Site visit debrief",
            "Walked through the borehole maintenance plan.",
        ),
        (
            "d-002",
            ActivityKind::Email,
            60,
            "Year-end appeal sent",
            "No reply yet.",
        ),
        (
            "d-004",
            ActivityKind::Call,
            8,
            "Called about declined card",
            "Asked to update payment details next week.",
        ),
        (
            "d-005",
            ActivityKind::Note,
            3,
            "Prefers paper receipts",
            "Mail receipts to the church office.",
        ),
    ];
    for (donor_id, kind, days, title, description) in entries {
        if let Some(donor) = donors.iter_mut().find(|donor| donor.id == donor_id) {
            donor.activities.push(Activity {
                id: format!("act-{donor_id}-{days}"),
                kind,
                timestamp: at_noon(days_ago(today, days)),
                title: title.into(),
                description: Some(description.into()),
                amount: None,
                status: None,
                actor: Some("Jordan (field)".into()),
            });
        }
    }
}

fn seed_tasks(today: NaiveDate) -> Vec<Task> {
    let task = |id: &str,
                title: &str,
                status: TaskStatus,
                priority: Priority,
                category: TaskCategory,
                due_date: NaiveDate,
                donor_id: Option<&str>| Task {
        id: id.into(),
        title: title.into(),
        description: None,
        status,
        priority,
        category,
        due_date,
        donor_id: donor_id.map(str::to_owned),
        created_at: at_noon(days_ago(today, 20)),
    };

    vec![
        task(
            "t-01",
            "Call Dev about declined card",
            TaskStatus::Open,
            Priority::High,
            TaskCategory::Call,
            days_ago(today, 2),
            Some("d-004"),
        ),
        task(
            "t-02",
            "Send thank-you note to Alice",
            TaskStatus::Open,
            Priority::Medium,
            TaskCategory::Email,
            today,
            Some("d-001"),
        ),
        task(
            "t-03",
            "Welcome packet for Carmen",
            TaskStatus::Open,
            Priority::Low,
            TaskCategory::Todo,
            days_ahead(today, 1),
            Some("d-003"),
        ),
        task(
            "t-04",
            "Lapsed donor re-engagement lunch",
            TaskStatus::Open,
            Priority::High,
            TaskCategory::Meeting,
            days_ahead(today, 6),
            Some("d-002"),
        ),
        task(
            "t-05",
            "Reconcile offline checks",
            TaskStatus::Completed,
            Priority::Medium,
            TaskCategory::Todo,
            days_ago(today, 4),
            None,
        ),
        task(
            "t-06",
            "Draft quarterly impact update",
            TaskStatus::Open,
            Priority::Medium,
            TaskCategory::Todo,
            days_ahead(today, 14),
            None,
        ),
    ]
}
