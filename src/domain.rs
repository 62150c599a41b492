use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

// Domain data structures shared across modules.

#[derive(Clone, Debug, Serialize)]
pub struct Campaign {
    pub id: String,
    pub title: String,
    pub location: String,
    pub image: String,
    pub raised: f64,
    pub goal: f64,
    pub category: String,
    pub description: String,
}

impl Campaign {
    pub fn progress_percent(&self) -> f64 {
        if self.goal <= 0.0 {
            return 0.0;
        }
        (self.raised / self.goal * 100.0).min(100.0)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Donor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub address: Option<Address>,
    pub status: DonorStatus,
    pub lifetime_given: f64,
    pub last_gift_amount: f64,
    pub last_gift_at: Option<DateTime<Utc>>,
    pub cadence: Cadence,
    pub tags: BTreeSet<String>,
    pub activities: Vec<Activity>,
}

impl Donor {
    pub fn location(&self) -> Option<String> {
        self.address
            .as_ref()
            .map(|address| format!("{}, {}", address.city, address.state))
    }

    pub fn latest_gift_at(&self) -> Option<DateTime<Utc>> {
        self.activities
            .iter()
            .filter(|activity| activity.kind == ActivityKind::Gift)
            .map(|activity| activity.timestamp)
            .max()
    }

    pub fn timeline(&self) -> Vec<&Activity> {
        let mut entries: Vec<&Activity> = self.activities.iter().collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    pub fn append_activity(&mut self, activity: Activity) {
        if activity.kind == ActivityKind::Gift {
            let at = activity.timestamp;
            if self.last_gift_at.is_none_or(|last| at >= last) {
                self.last_gift_at = Some(at);
                if let Some(amount) = activity.amount {
                    self.last_gift_amount = amount;
                }
            }
            if let Some(amount) = activity.amount {
                self.lifetime_given += amount;
            }
        }
        self.activities.push(activity);
    }

    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .collect::<String>()
            .to_uppercase()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DonorStatus {
    Active,
    Lapsed,
    New,
    AtRisk,
}

impl DonorStatus {
    pub const ALL: [DonorStatus; 4] = [
        DonorStatus::Active,
        DonorStatus::Lapsed,
        DonorStatus::New,
        DonorStatus::AtRisk,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DonorStatus::Active => "Active",
            DonorStatus::Lapsed => "Lapsed",
            DonorStatus::New => "New",
            DonorStatus::AtRisk => "At Risk",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Cadence {
    Monthly,
    OneTime,
    Annually,
    Irregular,
}

impl Cadence {
    pub fn label(&self) -> &'static str {
        match self {
            Cadence::Monthly => "Monthly",
            Cadence::OneTime => "One-Time",
            Cadence::Annually => "Annually",
            Cadence::Irregular => "Irregular",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Activity {
    pub id: String,
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub actor: Option<String>,
}

impl Activity {
    pub fn note(title: &str, description: Option<String>, actor: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: ActivityKind::Note,
            timestamp: Utc::now(),
            title: title.to_owned(),
            description,
            amount: None,
            status: None,
            actor,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ActivityKind {
    Gift,
    Note,
    Call,
    Email,
    Meeting,
    Task,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Gift => "Gift",
            ActivityKind::Note => "Note",
            ActivityKind::Call => "Call",
            ActivityKind::Email => "Email",
            ActivityKind::Meeting => "Meeting",
            ActivityKind::Task => "Task",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActivityKind::Gift => "$",
            ActivityKind::Note => "✎",
            ActivityKind::Call => "☎",
            ActivityKind::Email => "✉",
            ActivityKind::Meeting => "👥",
            ActivityKind::Task => "☑",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Gift {
    pub id: String,
    pub donor_id: String,
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub status: GiftStatus,
    pub channel: GiftChannel,
    pub instrument: Instrument,
    pub kind: GiftKind,
}

impl Gift {
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            GiftStatus::Failed { reason } => Some(reason),
            GiftStatus::Succeeded | GiftStatus::Pending => None,
        }
    }

    pub fn recurring_info(&self) -> Option<&RecurringInfo> {
        match &self.kind {
            GiftKind::Recurring(info) => Some(info),
            GiftKind::OneTime => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum GiftStatus {
    Succeeded,
    Pending,
    Failed { reason: String },
}

impl GiftStatus {
    pub fn state(&self) -> GiftState {
        match self {
            GiftStatus::Succeeded => GiftState::Succeeded,
            GiftStatus::Pending => GiftState::Pending,
            GiftStatus::Failed { .. } => GiftState::Failed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GiftState {
    Succeeded,
    Pending,
    Failed,
}

impl GiftState {
    pub const ALL: [GiftState; 3] = [GiftState::Succeeded, GiftState::Pending, GiftState::Failed];

    pub fn label(&self) -> &'static str {
        match self {
            GiftState::Succeeded => "Succeeded",
            GiftState::Pending => "Pending",
            GiftState::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, GiftState::Pending)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GiftChannel {
    Online,
    Offline,
}

impl GiftChannel {
    pub fn label(&self) -> &'static str {
        match self {
            GiftChannel::Online => "Online",
            GiftChannel::Offline => "Offline",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Instrument {
    Card,
    Ach,
    Check,
    Cash,
}

impl Instrument {
    pub fn label(&self) -> &'static str {
        match self {
            Instrument::Card => "Card",
            Instrument::Ach => "ACH",
            Instrument::Check => "Check",
            Instrument::Cash => "Cash",
        }
    }
}

/// A recurring gift always carries its schedule; a one-time gift never does.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum GiftKind {
    OneTime,
    Recurring(RecurringInfo),
}

impl GiftKind {
    pub fn label(&self) -> &'static str {
        match self {
            GiftKind::OneTime => "One-time",
            GiftKind::Recurring(_) => "Recurring",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecurringInfo {
    pub frequency: String,
    pub start_date: NaiveDate,
    pub next_charge_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub category: TaskCategory,
    pub due_date: NaiveDate,
    pub donor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TaskStatus {
    Open,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 2] = [TaskStatus::Open, TaskStatus::Completed];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::Completed => "Completed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TaskCategory {
    Call,
    Email,
    Todo,
    Meeting,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [
        TaskCategory::Call,
        TaskCategory::Email,
        TaskCategory::Todo,
        TaskCategory::Meeting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::Call => "Call",
            TaskCategory::Email => "Email",
            TaskCategory::Todo => "To-do",
            TaskCategory::Meeting => "Meeting",
        }
    }
}
