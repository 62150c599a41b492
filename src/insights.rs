use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, TryRecvError},
    },
    thread,
};

use chrono::{Days, NaiveDate};
use reqwest::{
    blocking::Client,
    header::{CONTENT_TYPE, USER_AGENT},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::InsightConfig,
    domain::{Donor, DonorStatus, Gift, Priority, TaskCategory},
    records::{Calendar, GiftStats},
    task_board::TaskDraft,
};

const USER_AGENT_HEADER: &str = "donor-desk/0.1";
const API_KEY_HEADER: &str = "x-goog-api-key";
pub const GENERIC_FAILURE: &str = "Unable to generate insights right now. Please try again later.";

#[derive(Clone, Debug, PartialEq)]
pub enum InsightOutcome<T = String> {
    Generated(T),
    Fallback(T),
    Failed(String),
}

impl<T> InsightOutcome<T> {
    pub fn content(&self) -> Option<&T> {
        match self {
            InsightOutcome::Generated(value) | InsightOutcome::Fallback(value) => Some(value),
            InsightOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Text generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No API key configured for text generation")]
    MissingApiKey,
    #[error("Text generation returned no text")]
    EmptyReply,
    #[error("Reply was not the JSON that was asked for: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Insight worker disconnected before returning a result")]
    WorkerGone,
}

pub struct InsightClient {
    client: Client,
    config: InsightConfig,
}

impl InsightClient {
    pub fn new(config: InsightConfig) -> Result<Self, InsightError> {
        let client = Client::builder()
            .user_agent(USER_AGENT_HEADER)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn generate_text(&self, prompt: &str) -> Result<String, InsightError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(InsightError::MissingApiKey)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_owned(),
                }],
            }],
        };

        info!(model = %self.config.model, "requesting generated insight");
        let response: GenerateResponse = self
            .client
            .post(url)
            .header(USER_AGENT, USER_AGENT_HEADER)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(InsightError::EmptyReply);
        }
        Ok(text)
    }

    pub fn run<T>(
        &self,
        prompt: &str,
        parse: impl FnOnce(String) -> Result<T, InsightError>,
        fallback: impl FnOnce() -> T,
    ) -> InsightOutcome<T> {
        match self.generate_text(prompt).and_then(parse) {
            Ok(value) => InsightOutcome::Generated(value),
            Err(InsightError::MissingApiKey) => {
                warn!("text generation is not configured; using canned insight");
                InsightOutcome::Fallback(fallback())
            }
            Err(err) => {
                warn!(error = %err, "text generation failed");
                InsightOutcome::Failed(GENERIC_FAILURE.to_owned())
            }
        }
    }
}

pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, InsightError> {
    Ok(serde_json::from_str(strip_code_fences(reply))?)
}

// -----------------------------------------------------------------------------
// Prompts
// -----------------------------------------------------------------------------

#[derive(Serialize)]
struct DonorContext<'a> {
    name: &'a str,
    status: &'static str,
    cadence: &'static str,
    lifetime_given: f64,
    last_gift_amount: f64,
    last_gift_date: Option<NaiveDate>,
    tags: Vec<&'a str>,
    recent_gifts: Vec<GiftContext>,
    recent_activity: Vec<&'a str>,
}

#[derive(Serialize)]
struct GiftContext {
    date: NaiveDate,
    amount: f64,
    status: &'static str,
    kind: &'static str,
}

fn donor_context<'a>(donor: &'a Donor, gifts: &[&Gift], calendar: &Calendar) -> DonorContext<'a> {
    DonorContext {
        name: &donor.name,
        status: donor.status.label(),
        cadence: donor.cadence.label(),
        lifetime_given: donor.lifetime_given,
        last_gift_amount: donor.last_gift_amount,
        last_gift_date: donor.last_gift_at.map(|at| calendar.day_of(at)),
        tags: donor.tags.iter().map(String::as_str).collect(),
        recent_gifts: gifts
            .iter()
            .take(10)
            .map(|gift| GiftContext {
                date: calendar.day_of(gift.date),
                amount: gift.amount,
                status: gift.status.state().label(),
                kind: gift.kind.label(),
            })
            .collect(),
        recent_activity: donor
            .timeline()
            .into_iter()
            .take(5)
            .map(|activity| activity.title.as_str())
            .collect(),
    }
}

pub fn donor_summary(
    client: &InsightClient,
    donor: &Donor,
    gifts: &[&Gift],
    calendar: &Calendar,
) -> InsightOutcome {
    let context =
        serde_json::to_string_pretty(&donor_context(donor, gifts, calendar)).unwrap_or_default();
    let prompt = format!(
        "You are assisting a nonprofit field fundraiser. Summarize this donor's giving \
         relationship in three sentences and recommend one next step.\n\nDonor:\n{context}"
    );
    client.run(&prompt, Ok, || fallback_donor_summary(donor, calendar))
}

pub fn fallback_donor_summary(donor: &Donor, calendar: &Calendar) -> String {
    let last_gift = match donor.last_gift_at {
        Some(at) => format!(
            "most recently ${:.2} on {}",
            donor.last_gift_amount,
            calendar.day_of(at).format("%b %-d, %Y")
        ),
        None => "with no recorded gifts yet".to_owned(),
    };
    let next_step = match donor.status {
        DonorStatus::Active => "Send a personal thank-you with a recent impact story.",
        DonorStatus::Lapsed => "Reach out with a re-engagement call before the next appeal.",
        DonorStatus::New => "Send a welcome packet and invite them to a site visit.",
        DonorStatus::AtRisk => "Check in soon and confirm their payment details are current.",
    };
    format!(
        "{} is {} donor ({} giving) who has given ${:.2} to date, {}. {}",
        donor.name,
        article_for(donor.status),
        donor.cadence.label().to_lowercase(),
        donor.lifetime_given,
        last_gift,
        next_step
    )
}

fn article_for(status: DonorStatus) -> String {
    match status {
        DonorStatus::Active => "an active".to_owned(),
        other => format!("a {}", other.label().to_lowercase()),
    }
}

#[derive(Serialize)]
struct ReportContext<'a> {
    period: &'a str,
    total_volume: f64,
    successful_gifts: usize,
    average_gift: f64,
    pending_gifts: usize,
    failed_gifts: usize,
    recurring_gifts: usize,
}

pub fn gift_report(client: &InsightClient, stats: &GiftStats, period: &str) -> InsightOutcome {
    let context = ReportContext {
        period,
        total_volume: stats.total_volume,
        successful_gifts: stats.success_count,
        average_gift: stats.average_gift,
        pending_gifts: stats.pending_count,
        failed_gifts: stats.failed_count,
        recurring_gifts: stats.recurring_count,
    };
    let context = serde_json::to_string_pretty(&context).unwrap_or_default();
    let prompt = format!(
        "Write a short giving report (one paragraph) for a nonprofit board from these \
         figures. Mention anything that needs follow-up.\n\n{context}"
    );
    client.run(&prompt, Ok, || fallback_gift_report(stats, period))
}

pub fn fallback_gift_report(stats: &GiftStats, period: &str) -> String {
    let mut report = format!(
        "{period}: {} successful gifts raised ${:.2}, an average of ${:.2} per gift.",
        stats.success_count, stats.total_volume, stats.average_gift
    );
    if stats.recurring_count > 0 {
        report.push_str(&format!(" {} were recurring.", stats.recurring_count));
    }
    if stats.pending_count + stats.failed_count > 0 {
        report.push_str(&format!(
            " {} pending and {} failed gifts need follow-up.",
            stats.pending_count, stats.failed_count
        ));
    }
    report
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TaskSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub due_in_days: u32,
}

impl TaskSuggestion {
    pub fn to_draft(&self, donor_id: &str, today: NaiveDate) -> TaskDraft {
        let category = match self.category.to_lowercase().as_str() {
            "call" => TaskCategory::Call,
            "email" => TaskCategory::Email,
            "meeting" => TaskCategory::Meeting,
            _ => TaskCategory::Todo,
        };
        let priority = match self.priority.to_lowercase().as_str() {
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        };
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority,
            category,
            due_date: today
                .checked_add_days(Days::new(u64::from(self.due_in_days)))
                .unwrap_or(today),
            donor_id: Some(donor_id.to_owned()),
        }
    }
}

pub fn suggest_tasks(
    client: &InsightClient,
    donor: &Donor,
    gifts: &[&Gift],
    calendar: &Calendar,
) -> InsightOutcome<Vec<TaskSuggestion>> {
    let context =
        serde_json::to_string_pretty(&donor_context(donor, gifts, calendar)).unwrap_or_default();
    let prompt = format!(
        "Suggest up to three follow-up tasks for a fundraiser working with this donor. \
         Respond with JSON only: an array of objects with the keys \"title\", \
         \"description\", \"category\" (call, email, todo or meeting), \"priority\" \
         (high, medium or low) and \"due_in_days\" (integer).\n\nDonor:\n{context}"
    );
    client.run(
        &prompt,
        |reply| parse_json_reply(&reply),
        || fallback_suggestions(donor),
    )
}

pub fn fallback_suggestions(donor: &Donor) -> Vec<TaskSuggestion> {
    let suggestion = |title: String, category: &str, priority: &str, due_in_days: u32| {
        TaskSuggestion {
            title,
            description: None,
            category: category.to_owned(),
            priority: priority.to_owned(),
            due_in_days,
        }
    };
    match donor.status {
        DonorStatus::Active => vec![suggestion(
            format!("Thank {} for their recent gift", donor.name),
            "email",
            "medium",
            2,
        )],
        DonorStatus::Lapsed => vec![suggestion(
            format!("Re-engagement call with {}", donor.name),
            "call",
            "high",
            3,
        )],
        DonorStatus::New => vec![suggestion(
            format!("Send welcome packet to {}", donor.name),
            "todo",
            "medium",
            1,
        )],
        DonorStatus::AtRisk => vec![
            suggestion(
                format!("Check in with {}", donor.name),
                "call",
                "high",
                1,
            ),
            suggestion(
                format!("Confirm payment details for {}", donor.name),
                "email",
                "medium",
                3,
            ),
        ],
    }
}

// -----------------------------------------------------------------------------
// Background jobs
// -----------------------------------------------------------------------------

pub struct InsightJob<T> {
    receiver: Receiver<InsightOutcome<T>>,
}

impl<T: Send + 'static> InsightJob<T> {
    pub fn spawn<F>(client: Arc<InsightClient>, work: F) -> Self
    where
        F: FnOnce(&InsightClient) -> InsightOutcome<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(work(&client));
        });
        Self { receiver: rx }
    }

    pub fn try_take(&self) -> Option<InsightOutcome<T>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!(error = %InsightError::WorkerGone, "insight job ended without a result");
                Some(InsightOutcome::Failed(GENERIC_FAILURE.to_owned()))
            }
        }
    }
}

// Request/response payloads ---------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

// -------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------
