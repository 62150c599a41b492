use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use eframe::{
    App, CreationContext, Frame,
    egui::{self, Context, Layout},
};
use egui_extras::{Column, TableBuilder};
use tracing::{info, warn};

use crate::{
    checkout::{
        CheckoutParams, CheckoutSession, CheckoutStep, FeeSchedule, Frequency, PRESET_AMOUNTS,
        PaymentMethod,
    },
    config::AppConfig,
    domain::{
        Activity, Donor, DonorStatus, Gift, GiftState, GiftStatus, Priority, Task, TaskCategory,
        TaskStatus,
    },
    insights::{self, InsightClient, InsightJob, InsightOutcome, TaskSuggestion},
    pagination::{clamp_page, page_count, page_slice, page_window},
    payment::{PaymentGateway, PaymentJob, SimulatedGateway},
    provider::{DataProvider, MockData},
    records::{
        Calendar, DateRange, DonorQuery, DonorStats, GiftQuery, GiftStats, Membership, SortKey, TaskQuery,
        TaskStats, TaskView, donor_view, gift_view, task_view,
    },
    task_board::{Reschedule, TaskBoard, TaskDraft},
};

pub const APP_NAME: &str = "Donor Desk";

const PAGE_SIZE: usize = 8;
const MAX_PAGE_BUTTONS: usize = 5;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Page {
    Dashboard,
    Donors,
    Gifts,
    Tasks,
    Checkout,
}

impl Page {
    const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Donors,
        Page::Gifts,
        Page::Tasks,
        Page::Checkout,
    ];

    fn label(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Donors => "Donors",
            Page::Gifts => "Gifts",
            Page::Tasks => "Tasks",
            Page::Checkout => "Donation checkout",
        }
    }
}

pub struct DonorDeskApp {
    data: MockData,
    donors: Vec<Donor>,
    fees: FeeSchedule,
    config_warning: Option<String>,
    insights: Option<Arc<InsightClient>>,
    gateway: Arc<dyn PaymentGateway>,
    page: Page,
    donor_page: DonorPage,
    gift_page: GiftPage,
    task_page: TaskPage,
    checkout: CheckoutPage,
}

impl DonorDeskApp {
    pub fn new(_cc: &CreationContext<'_>, config: AppConfig, config_warning: Option<String>) -> Self {
        let data = MockData::seeded(Calendar::local().today);
        let insights = match InsightClient::new(config.insights.clone()) {
            Ok(client) => {
                if !client.has_credentials() {
                    info!("no text-generation key configured; insights use canned summaries");
                }
                Some(Arc::new(client))
            }
            Err(err) => {
                warn!(error = %err, "insight client unavailable");
                None
            }
        };

        Self {
            donors: data.donors().to_vec(),
            task_page: TaskPage::new(TaskBoard::new(data.tasks().to_vec())),
            data,
            fees: config.fees,
            config_warning,
            insights,
            gateway: Arc::new(SimulatedGateway::new(config.payment_delay)),
            page: Page::Dashboard,
            donor_page: DonorPage::default(),
            gift_page: GiftPage::default(),
            checkout: CheckoutPage::default(),
        }
    }

    fn poll_jobs(&mut self) {
        self.donor_page.poll();
        self.gift_page.poll();
        self.checkout.poll();
    }

    fn render_side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading(APP_NAME);
        ui.separator();
        for page in Page::ALL {
            ui.selectable_value(&mut self.page, page, page.label());
        }
        if let Some(warning) = &self.config_warning {
            ui.separator();
            ui.colored_label(ui.visuals().warn_fg_color, warning);
        }
        ui.with_layout(Layout::bottom_up(egui::Align::Min), |ui| {
            let mode = match &self.insights {
                Some(client) if client.has_credentials() => format!("AI: {}", client.model()),
                Some(_) => "AI: offline summaries".to_owned(),
                None => "AI: unavailable".to_owned(),
            };
            ui.weak(mode);
        });
    }

    fn render_page(&mut self, ui: &mut egui::Ui, calendar: &Calendar) {
        let today = calendar.today;
        match self.page {
            Page::Dashboard => {
                let action =
                    render_dashboard(
                    ui,
                    &self.data,
                    &self.donors,
                    self.task_page.board.tasks(),
                    calendar,
                );
                match action {
                    Some(DashboardAction::Donate(campaign_id)) => {
                        self.checkout.open_link(
                            &format!("campaign={campaign_id}"),
                            &self.data,
                            self.fees,
                            today,
                        );
                        self.page = Page::Checkout;
                    }
                    Some(DashboardAction::ReviewAtRisk) => {
                        self.donor_page.query = DonorQuery {
                            statuses: Membership::only(&[DonorStatus::AtRisk]),
                            ..DonorQuery::default()
                        };
                        self.donor_page.page = 1;
                        self.page = Page::Donors;
                    }
                    None => {}
                }
            }
            Page::Donors => self.donor_page.render(
                ui,
                &mut self.donors,
                &self.data,
                &mut self.task_page.board,
                self.insights.as_ref(),
                calendar,
            ),
            Page::Gifts => {
                self.gift_page
                    .render(ui, self.data.gifts(), &self.donors, self.insights.as_ref(), calendar)
            }
            Page::Tasks => self.task_page.render(ui, &self.donors, calendar),
            Page::Checkout => {
                self.checkout
                    .render(ui, &self.data, self.fees, &self.gateway, today)
            }
        }
    }
}

impl App for DonorDeskApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        self.poll_jobs();
        let calendar = Calendar::local();

        egui::SidePanel::left("navigation_panel")
            .default_width(200.0)
            .show(ctx, |ui| self.render_side_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.render_page(ui, &calendar));
        });

        ctx.request_repaint_after(Duration::from_millis(250));
    }
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn donor_name<'a>(donors: &'a [Donor], id: &str) -> Option<&'a str> {
    donors
        .iter()
        .find(|donor| donor.id == id)
        .map(|donor| donor.name.as_str())
}

// -----------------------------------------------------------------------------
// Dashboard
// -----------------------------------------------------------------------------

enum DashboardAction {
    Donate(String),
    ReviewAtRisk,
}

fn render_dashboard(
    ui: &mut egui::Ui,
    data: &MockData,
    donors: &[Donor],
    tasks: &[Task],
    calendar: &Calendar,
) -> Option<DashboardAction> {
    let donor_rows: Vec<&Donor> = donors.iter().collect();
    let donor_stats = DonorStats::from_donors(&donor_rows);
    let recent = GiftQuery {
        range: DateRange::Last30Days,
        ..GiftQuery::default()
    };
    let gift_rows = gift_view(data.gifts(), donors, &recent, calendar);
    let gift_stats = GiftStats::from_gifts(&gift_rows);
    let task_stats = TaskStats::from_tasks(tasks, calendar.today);

    ui.heading("Overview");
    ui.horizontal_wrapped(|row| {
        stat_card(row, "Donors", donor_stats.total.to_string());
        stat_card(row, "At risk", donor_stats.at_risk.to_string());
        stat_card(row, "Raised (30 days)", money(gift_stats.total_volume));
        stat_card(row, "Average gift", money(gift_stats.average_gift));
        stat_card(row, "Open tasks", task_stats.open.to_string());
        stat_card(row, "Overdue", task_stats.overdue.to_string());
    });
    let mut action = None;
    if donor_stats.at_risk > 0 && ui.link("Review at-risk donors").clicked() {
        action = Some(DashboardAction::ReviewAtRisk);
    }

    ui.add_space(12.0);
    ui.heading("Recent gifts");
    for gift in gift_rows.iter().take(5) {
        ui.horizontal(|row| {
            row.label(calendar.day_of(gift.date).format(DATE_FORMAT).to_string());
            match data.find_donor(&gift.donor_id) {
                Some(donor) => row.label(&donor.name),
                None => row.weak("Unknown donor"),
            };
            row.strong(money(gift.amount));
            row.weak(gift.status.state().label());
        });
    }
    if gift_rows.is_empty() {
        ui.weak("No gifts in the last 30 days.");
    }

    ui.add_space(12.0);
    ui.heading("Campaigns");
    for campaign in data.campaigns() {
        ui.group(|group| {
            group.horizontal(|row| {
                row.strong(&campaign.title);
                row.weak(format!("{} · {}", campaign.location, campaign.category));
                row.with_layout(Layout::right_to_left(egui::Align::Center), |lane| {
                    if lane.button("Donate").clicked() {
                        action = Some(DashboardAction::Donate(campaign.id.clone()));
                    }
                });
            });
            group.label(&campaign.description);
            group.add(
                egui::ProgressBar::new((campaign.progress_percent() / 100.0) as f32).text(format!(
                    "{} of {} ({:.0}%)",
                    money(campaign.raised),
                    money(campaign.goal),
                    campaign.progress_percent()
                )),
            );
        });
    }
    action
}

fn stat_card(ui: &mut egui::Ui, label: &str, value: String) {
    ui.group(|group| {
        group.vertical(|column| {
            column.weak(label);
            column.heading(value);
        });
    });
}

fn render_pager(ui: &mut egui::Ui, page: &mut usize, total: usize) {
    if total <= 1 {
        return;
    }
    let window = page_window(*page, total, MAX_PAGE_BUTTONS);
    ui.horizontal(|row| {
        if row.add_enabled(*page > 1, egui::Button::new("‹")).clicked() {
            *page -= 1;
        }
        for (idx, number) in window.pages.iter().enumerate() {
            if idx == 1 && window.left_ellipsis {
                row.weak("…");
            }
            if idx + 1 == window.pages.len() && window.right_ellipsis {
                row.weak("…");
            }
            row.selectable_value(&mut *page, *number, number.to_string());
        }
        if row.add_enabled(*page < total, egui::Button::new("›")).clicked() {
            *page += 1;
        }
    });
}

fn membership_toggles<T: Ord + Copy>(
    ui: &mut egui::Ui,
    membership: &mut Membership<T>,
    values: &[T],
    label: impl Fn(&T) -> &'static str,
) -> bool {
    let mut changed = false;
    ui.horizontal_wrapped(|row| {
        for value in values {
            let mut on = membership.contains(*value);
            if row.toggle_value(&mut on, label(value)).changed() {
                membership.toggle(*value);
                changed = true;
            }
        }
        if !membership.is_empty() && row.small_button("Clear").clicked() {
            membership.clear();
            changed = true;
        }
    });
    changed
}

fn sort_picker(ui: &mut egui::Ui, id: &str, sort: &mut SortKey, options: &[SortKey]) -> bool {
    let before = *sort;
    egui::ComboBox::from_id_salt(id)
        .selected_text(sort.label())
        .show_ui(ui, |menu| {
            for option in options {
                menu.selectable_value(&mut *sort, *option, option.label());
            }
        });
    before != *sort
}

fn range_picker(ui: &mut egui::Ui, id: &str, range: &mut DateRange) -> bool {
    let before = *range;
    egui::ComboBox::from_id_salt(id)
        .selected_text(range.label())
        .show_ui(ui, |menu| {
            for option in DateRange::ALL {
                menu.selectable_value(&mut *range, option, option.label());
            }
        });
    before != *range
}

fn render_insight(ui: &mut egui::Ui, outcome: &InsightOutcome) {
    match outcome {
        InsightOutcome::Generated(text) => {
            ui.label(text);
        }
        InsightOutcome::Fallback(text) => {
            ui.label(text);
            ui.small("Offline summary. Configure an API key for AI-written insights.");
        }
        InsightOutcome::Failed(message) => {
            ui.colored_label(ui.visuals().error_fg_color, message);
        }
    }
}

// -----------------------------------------------------------------------------
// Donors
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Default)]
enum DonorTab {
    #[default]
    Overview,
    Gifts,
    Activity,
    Tasks,
}

impl DonorTab {
    const ALL: [DonorTab; 4] = [
        DonorTab::Overview,
        DonorTab::Gifts,
        DonorTab::Activity,
        DonorTab::Tasks,
    ];

    fn label(&self) -> &'static str {
        match self {
            DonorTab::Overview => "Overview",
            DonorTab::Gifts => "Gifts",
            DonorTab::Activity => "Activity",
            DonorTab::Tasks => "Tasks",
        }
    }
}

#[derive(Default)]
struct DonorPage {
    query: DonorQuery,
    page: usize,
    selected: Option<String>,
    tab: DonorTab,
    note_draft: String,
    summary_job: Option<InsightJob<String>>,
    summary: Option<InsightOutcome>,
    suggestions_job: Option<InsightJob<Vec<TaskSuggestion>>>,
    suggestions: Option<InsightOutcome<Vec<TaskSuggestion>>>,
}

impl DonorPage {
    fn poll(&mut self) {
        if let Some(outcome) = self.summary_job.as_ref().and_then(InsightJob::try_take) {
            self.summary = Some(outcome);
            self.summary_job = None;
        }
        if let Some(outcome) = self.suggestions_job.as_ref().and_then(InsightJob::try_take) {
            self.suggestions = Some(outcome);
            self.suggestions_job = None;
        }
    }

    fn select(&mut self, donor_id: String) {
        if self.selected.as_deref() == Some(donor_id.as_str()) {
            return;
        }
        self.selected = Some(donor_id);
        self.tab = DonorTab::Overview;
        self.note_draft.clear();
        self.summary = None;
        self.summary_job = None;
        self.suggestions = None;
        self.suggestions_job = None;
    }

    fn render(
        &mut self,
        ui: &mut egui::Ui,
        donors: &mut [Donor],
        data: &MockData,
        board: &mut TaskBoard,
        insights: Option<&Arc<InsightClient>>,
        calendar: &Calendar,
    ) {
        ui.heading("Donors");
        let mut changed = false;
        ui.horizontal(|row| {
            changed |= row
                .add(
                    egui::TextEdit::singleline(&mut self.query.search)
                        .hint_text("Search name, email or location…")
                        .desired_width(240.0),
                )
                .changed();
            changed |= sort_picker(
                row,
                "donor_sort",
                &mut self.query.sort,
                &[SortKey::DateDesc, SortKey::AmountDesc, SortKey::NameAsc],
            );
            changed |= range_picker(row, "donor_range", &mut self.query.range);
        });
        changed |= membership_toggles(ui, &mut self.query.statuses, &DonorStatus::ALL, |s| {
            s.label()
        });
        if changed {
            self.page = 1;
        }

        let rows = donor_view(donors, &self.query, calendar);
        let stats = DonorStats::from_donors(&rows);
        ui.weak(format!(
            "{} donors · {} lifetime",
            stats.total,
            money(stats.lifetime_total)
        ));

        let total_pages = page_count(rows.len(), PAGE_SIZE);
        self.page = clamp_page(self.page, total_pages);
        let mut clicked = None;
        ui.push_id("donor_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .column(Column::initial(160.0).resizable(true))
                .column(Column::initial(200.0))
                .column(Column::initial(80.0))
                .column(Column::initial(110.0))
                .column(Column::remainder())
                .header(20.0, |mut header| {
                    for title in ["Name", "Email", "Status", "Lifetime", "Last gift"] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for donor in page_slice(&rows, self.page, PAGE_SIZE) {
                        body.row(24.0, |mut row| {
                            row.col(|ui| {
                                if ui.link(format!("{}  {}", donor.initials(), donor.name)).clicked() {
                                    clicked = Some(donor.id.clone());
                                }
                            });
                            row.col(|ui| {
                                ui.label(&donor.email);
                            });
                            row.col(|ui| {
                                ui.label(donor.status.label());
                            });
                            row.col(|ui| {
                                ui.label(money(donor.lifetime_given));
                            });
                            row.col(|ui| {
                                match donor.last_gift_at {
                                    Some(at) => ui.label(format!(
                                        "{} on {}",
                                        money(donor.last_gift_amount),
                                        calendar.day_of(at).format(DATE_FORMAT)
                                    )),
                                    None => ui.weak("No gifts yet"),
                                };
                            });
                        });
                    }
                });
        });
        if rows.is_empty() {
            ui.weak("No donors match the current filters.");
        }
        render_pager(ui, &mut self.page, total_pages);

        if let Some(id) = clicked {
            self.select(id);
        }

        let Some(selected) = self.selected.clone() else {
            return;
        };
        let Some(donor) = donors.iter_mut().find(|donor| donor.id == selected) else {
            // The record disappeared; nothing to show.
            self.selected = None;
            return;
        };

        ui.separator();
        ui.horizontal(|row| {
            row.heading(&donor.name);
            row.weak(donor.status.label());
        });
        ui.horizontal(|row| {
            for tab in DonorTab::ALL {
                row.selectable_value(&mut self.tab, tab, tab.label());
            }
        });
        ui.separator();

        let mut donor_gifts = data.gifts_for_donor(&donor.id);
        donor_gifts.sort_by(|a, b| b.date.cmp(&a.date));

        match self.tab {
            DonorTab::Overview => {
                egui::Grid::new("donor_overview").num_columns(2).show(ui, |grid| {
                    grid.weak("Email");
                    grid.label(&donor.email);
                    grid.end_row();
                    grid.weak("Location");
                    grid.label(donor.location().unwrap_or_else(|| "Unknown".to_owned()));
                    grid.end_row();
                    grid.weak("Cadence");
                    grid.label(donor.cadence.label());
                    grid.end_row();
                    grid.weak("Lifetime");
                    grid.label(money(donor.lifetime_given));
                    grid.end_row();
                    grid.weak("Tags");
                    let tags: Vec<&str> = donor.tags.iter().map(String::as_str).collect();
                    grid.label(if tags.is_empty() {
                        "None".to_owned()
                    } else {
                        tags.join(", ")
                    });
                    grid.end_row();
                });
                ui.add_space(8.0);
                let busy = self.summary_job.is_some();
                if ui
                    .add_enabled(!busy && insights.is_some(), egui::Button::new("Summarize donor"))
                    .clicked()
                    && let Some(client) = insights
                {
                    let snapshot = donor.clone();
                    let gift_snapshot: Vec<Gift> = donor_gifts.iter().map(|g| (*g).clone()).collect();
                    let calendar = *calendar;
                    self.summary_job = Some(InsightJob::spawn(Arc::clone(client), move |client| {
                        let refs: Vec<&Gift> = gift_snapshot.iter().collect();
                        insights::donor_summary(client, &snapshot, &refs, &calendar)
                    }));
                }
                if busy {
                    ui.spinner();
                } else if let Some(summary) = &self.summary {
                    render_insight(ui, summary);
                }
            }
            DonorTab::Gifts => {
                let stats = GiftStats::from_gifts(&donor_gifts);
                ui.weak(format!(
                    "{} succeeded · {} total · {} average",
                    stats.success_count,
                    money(stats.total_volume),
                    money(stats.average_gift)
                ));
                render_gift_rows(ui, "donor_gifts", &donor_gifts, &[], calendar);
            }
            DonorTab::Activity => {
                ui.horizontal(|row| {
                    row.add(
                        egui::TextEdit::singleline(&mut self.note_draft)
                            .hint_text("Log a note…")
                            .desired_width(320.0),
                    );
                    let ready = !self.note_draft.trim().is_empty();
                    if row.add_enabled(ready, egui::Button::new("Add note")).clicked() {
                        let title = self.note_draft.trim().to_owned();
                        donor.append_activity(Activity::note(&title, None, None));
                        self.note_draft.clear();
                    }
                });
                for activity in donor.timeline() {
                    ui.horizontal(|row| {
                        row.label(activity.kind.icon());
                        row.strong(&activity.title);
                        if let Some(amount) = activity.amount {
                            row.label(money(amount));
                        }
                        if let Some(status) = &activity.status {
                            row.weak(status);
                        }
                        row.weak(activity.timestamp.format("%Y-%m-%d %H:%M").to_string());
                    });
                    if let Some(description) = &activity.description {
                        ui.small(description);
                    }
                    if let Some(actor) = &activity.actor {
                        ui.small(format!("by {actor}"));
                    }
                }
            }
            DonorTab::Tasks => {
                let linked: Vec<&Task> = board
                    .tasks()
                    .iter()
                    .filter(|task| task.donor_id.as_deref() == Some(donor.id.as_str()))
                    .collect();
                if linked.is_empty() {
                    ui.weak("No tasks linked to this donor.");
                }
                for task in linked {
                    ui.label(format!(
                        "{} {} · due {} · {}",
                        if task.status == TaskStatus::Completed { "☑" } else { "☐" },
                        task.title,
                        task.due_date.format(DATE_FORMAT),
                        task.priority.label()
                    ));
                }

                ui.add_space(8.0);
                let busy = self.suggestions_job.is_some();
                if ui
                    .add_enabled(!busy && insights.is_some(), egui::Button::new("Suggest follow-ups"))
                    .clicked()
                    && let Some(client) = insights
                {
                    let snapshot = donor.clone();
                    let gift_snapshot: Vec<Gift> = donor_gifts.iter().map(|g| (*g).clone()).collect();
                    let calendar = *calendar;
                    self.suggestions_job =
                        Some(InsightJob::spawn(Arc::clone(client), move |client| {
                            let refs: Vec<&Gift> = gift_snapshot.iter().collect();
                            insights::suggest_tasks(client, &snapshot, &refs, &calendar)
                        }));
                }
                if busy {
                    ui.spinner();
                }
                let mut accepted = None;
                if let Some(outcome) = &self.suggestions {
                    match (outcome.content(), outcome) {
                        (Some(list), _) => {
                            for (idx, suggestion) in list.iter().enumerate() {
                                ui.horizontal(|row| {
                                    row.label(&suggestion.title);
                                    row.weak(format!("in {} days", suggestion.due_in_days));
                                    if row.small_button("Add task").clicked() {
                                        accepted = Some(idx);
                                    }
                                });
                            }
                        }
                        (None, InsightOutcome::Failed(message)) => {
                            ui.colored_label(ui.visuals().error_fg_color, message);
                        }
                        (None, _) => {}
                    }
                }
                if let Some(idx) = accepted
                    && let Some(InsightOutcome::Generated(list) | InsightOutcome::Fallback(list)) =
                        &mut self.suggestions
                    && idx < list.len()
                {
                    let suggestion = list.remove(idx);
                    board.create(suggestion.to_draft(&donor.id, calendar.today));
                }
            }
        }
    }
}

fn render_gift_rows(
    ui: &mut egui::Ui,
    id: &str,
    gifts: &[&Gift],
    donors: &[Donor],
    calendar: &Calendar,
) {
    let show_donor = !donors.is_empty();
    ui.push_id(id, |ui| {
        let mut table = TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::initial(90.0));
        if show_donor {
            table = table.column(Column::initial(150.0).resizable(true));
        }
        table
            .column(Column::initial(90.0))
            .column(Column::initial(160.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Date");
                });
                if show_donor {
                    header.col(|ui| {
                        ui.strong("Donor");
                    });
                }
                for title in ["Amount", "Status", "Type"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for gift in gifts {
                    body.row(24.0, |mut row| {
                        row.col(|ui| {
                            ui.label(calendar.day_of(gift.date).format(DATE_FORMAT).to_string());
                        });
                        if show_donor {
                            row.col(|ui| match donor_name(donors, &gift.donor_id) {
                                Some(name) => {
                                    ui.label(name);
                                }
                                None => {
                                    ui.weak("Unknown donor");
                                }
                            });
                        }
                        row.col(|ui| {
                            ui.label(money(gift.amount));
                        });
                        row.col(|ui| {
                            let state = gift.status.state();
                            match &gift.status {
                                GiftStatus::Failed { reason } => {
                                    ui.colored_label(ui.visuals().error_fg_color, state.label())
                                        .on_hover_text(reason);
                                }
                                GiftStatus::Succeeded | GiftStatus::Pending => {
                                    let response = ui.label(state.label());
                                    if !state.is_terminal() {
                                        response.on_hover_text("Awaiting settlement");
                                    }
                                }
                            }
                            ui.small(format!("{} · {}", gift.channel.label(), gift.instrument.label()));
                        });
                        row.col(|ui| {
                            ui.label(gift.kind.label());
                            if let Some(info) = gift.recurring_info() {
                                ui.small(format!(
                                    "{} · next {}",
                                    info.frequency,
                                    info.next_charge_date.format(DATE_FORMAT)
                                ));
                            }
                        });
                    });
                }
            });
    });
}

// -----------------------------------------------------------------------------
// Gifts
// -----------------------------------------------------------------------------

#[derive(Default)]
struct GiftPage {
    query: GiftQuery,
    page: usize,
    report_job: Option<InsightJob<String>>,
    report: Option<InsightOutcome>,
}

impl GiftPage {
    fn poll(&mut self) {
        if let Some(outcome) = self.report_job.as_ref().and_then(InsightJob::try_take) {
            self.report = Some(outcome);
            self.report_job = None;
        }
    }

    fn render(
        &mut self,
        ui: &mut egui::Ui,
        gifts: &[Gift],
        donors: &[Donor],
        insights: Option<&Arc<InsightClient>>,
        calendar: &Calendar,
    ) {
        ui.heading("Gifts");
        let mut changed = false;
        ui.horizontal(|row| {
            changed |= row
                .add(
                    egui::TextEdit::singleline(&mut self.query.search)
                        .hint_text("Search donor name or email…")
                        .desired_width(240.0),
                )
                .changed();
            changed |= range_picker(row, "gift_range", &mut self.query.range);
            changed |= sort_picker(
                row,
                "gift_sort",
                &mut self.query.sort,
                &[SortKey::DateDesc, SortKey::AmountDesc, SortKey::NameAsc],
            );
        });
        changed |= membership_toggles(ui, &mut self.query.statuses, &GiftState::ALL, |s| s.label());
        if changed {
            self.page = 1;
        }

        let rows = gift_view(gifts, donors, &self.query, calendar);
        let stats = GiftStats::from_gifts(&rows);
        ui.horizontal_wrapped(|row| {
            stat_card(row, "Total volume", money(stats.total_volume));
            stat_card(row, "Succeeded", stats.success_count.to_string());
            stat_card(row, "Average gift", money(stats.average_gift));
            stat_card(row, "Pending", stats.pending_count.to_string());
            stat_card(row, "Failed", stats.failed_count.to_string());
        });

        let total_pages = page_count(rows.len(), PAGE_SIZE);
        self.page = clamp_page(self.page, total_pages);
        render_gift_rows(
            ui,
            "gift_table",
            page_slice(&rows, self.page, PAGE_SIZE),
            donors,
            calendar,
        );
        if rows.is_empty() {
            ui.weak("No gifts match the current filters.");
        }
        render_pager(ui, &mut self.page, total_pages);

        ui.add_space(8.0);
        let busy = self.report_job.is_some();
        if ui
            .add_enabled(!busy && insights.is_some(), egui::Button::new("Write giving report"))
            .clicked()
            && let Some(client) = insights
        {
            let period = self.query.range.label();
            self.report_job = Some(InsightJob::spawn(Arc::clone(client), move |client| {
                insights::gift_report(client, &stats, period)
            }));
        }
        if busy {
            ui.spinner();
        } else if let Some(report) = &self.report {
            render_insight(ui, report);
        }
    }
}

// -----------------------------------------------------------------------------
// Tasks
// -----------------------------------------------------------------------------

struct TaskEditor {
    editing: Option<String>,
    draft: TaskDraft,
    due_text: String,
    description: String,
}

impl TaskEditor {
    fn for_draft(editing: Option<String>, draft: TaskDraft) -> Self {
        Self {
            editing,
            due_text: draft.due_date.format(DATE_FORMAT).to_string(),
            description: draft.description.clone().unwrap_or_default(),
            draft,
        }
    }
}

enum TaskAction {
    Complete(String),
    Reschedule(String, Reschedule),
    Edit(String),
    Delete(String),
}

struct TaskPage {
    board: TaskBoard,
    query: TaskQuery,
    editor: Option<TaskEditor>,
}

impl TaskPage {
    fn new(board: TaskBoard) -> Self {
        Self {
            board,
            query: TaskQuery::default(),
            editor: None,
        }
    }

    fn render(&mut self, ui: &mut egui::Ui, donors: &[Donor], calendar: &Calendar) {
        let today = calendar.today;
        ui.horizontal(|row| {
            row.heading("Tasks");
            if row.button("New task").clicked() {
                self.editor = Some(TaskEditor::for_draft(None, TaskDraft::blank(today)));
            }
        });
        self.render_editor(ui, donors);

        ui.horizontal(|row| {
            row.add(
                egui::TextEdit::singleline(&mut self.query.base.search)
                    .hint_text("Search tasks…")
                    .desired_width(220.0),
            );
            sort_picker(
                row,
                "task_sort",
                &mut self.query.base.sort,
                &[SortKey::DateAsc, SortKey::DateDesc, SortKey::PriorityAsc, SortKey::NameAsc],
            );
        });
        membership_toggles(ui, &mut self.query.base.statuses, &TaskStatus::ALL, |s| s.label());
        membership_toggles(ui, &mut self.query.categories, &TaskCategory::ALL, |c| c.label());

        let stats = TaskStats::from_tasks(self.board.tasks(), today);
        ui.weak(format!(
            "{} open · {} overdue · {} completed",
            stats.open, stats.overdue, stats.completed
        ));
        ui.separator();

        let mut actions = Vec::new();
        let view = task_view(self.board.tasks(), donors, &self.query, calendar);
        if view.is_empty() {
            ui.weak("No tasks match the current filters.");
        }
        ui.weak(format!("{} shown", view.len()));
        match view {
            TaskView::Flat(tasks) => {
                for task in tasks {
                    actions.extend(draw_task_row(ui, task, donors));
                }
            }
            TaskView::Grouped(groups) => {
                for group in groups {
                    ui.strong(format!("{} ({})", group.bucket.label(), group.tasks.len()));
                    for task in group.tasks {
                        actions.extend(draw_task_row(ui, task, donors));
                    }
                    ui.add_space(6.0);
                }
            }
        }

        for action in actions {
            match action {
                TaskAction::Complete(id) => {
                    self.board.toggle_status(&id);
                }
                TaskAction::Reschedule(id, by) => {
                    self.board.reschedule(&id, by);
                }
                TaskAction::Edit(id) => {
                    if let Some(task) = self.board.get(&id) {
                        self.editor =
                            Some(TaskEditor::for_draft(Some(id), TaskDraft::from_task(task)));
                    }
                }
                TaskAction::Delete(id) => {
                    self.board.delete(&id);
                    if self
                        .editor
                        .as_ref()
                        .is_some_and(|editor| editor.editing.as_deref() == Some(id.as_str()))
                    {
                        self.editor = None;
                    }
                }
            }
        }
    }

    fn render_editor(&mut self, ui: &mut egui::Ui, donors: &[Donor]) {
        let Some(editor) = &mut self.editor else {
            return;
        };
        let mut save = false;
        let mut cancel = false;
        ui.group(|group| {
            group.strong(if editor.editing.is_some() { "Edit task" } else { "New task" });
            group.add(egui::TextEdit::singleline(&mut editor.draft.title).hint_text("Title"));
            group.add(
                egui::TextEdit::multiline(&mut editor.description)
                    .hint_text("Description")
                    .desired_rows(2),
            );
            group.horizontal(|row| {
                for priority in Priority::ALL {
                    row.radio_value(&mut editor.draft.priority, priority, priority.label());
                }
            });
            group.horizontal(|row| {
                for category in TaskCategory::ALL {
                    row.radio_value(&mut editor.draft.category, category, category.label());
                }
            });
            group.horizontal(|row| {
                row.label("Due");
                row.add(egui::TextEdit::singleline(&mut editor.due_text).desired_width(100.0));
                match NaiveDate::parse_from_str(editor.due_text.trim(), DATE_FORMAT) {
                    Ok(date) => editor.draft.due_date = date,
                    Err(_) => {
                        row.colored_label(row.visuals().error_fg_color, "Use YYYY-MM-DD");
                    }
                }
            });
            let selected = editor
                .draft
                .donor_id
                .as_deref()
                .and_then(|id| donor_name(donors, id))
                .unwrap_or("No donor")
                .to_owned();
            egui::ComboBox::from_id_salt("task_donor")
                .selected_text(selected)
                .show_ui(group, |menu| {
                    menu.selectable_value(&mut editor.draft.donor_id, None, "No donor");
                    for donor in donors {
                        menu.selectable_value(
                            &mut editor.draft.donor_id,
                            Some(donor.id.clone()),
                            &donor.name,
                        );
                    }
                });
            group.horizontal(|row| {
                if row
                    .add_enabled(editor.draft.is_valid(), egui::Button::new("Save"))
                    .clicked()
                {
                    save = true;
                }
                if row.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

        if save {
            let mut draft = editor.draft.clone();
            draft.description = Some(editor.description.clone());
            let stored = match &editor.editing {
                Some(id) => self.board.update(id, draft),
                None => self.board.create(draft).is_some(),
            };
            if stored {
                self.editor = None;
            }
        } else if cancel {
            self.editor = None;
        }
    }
}

fn draw_task_row(ui: &mut egui::Ui, task: &Task, donors: &[Donor]) -> Vec<TaskAction> {
    let mut actions = Vec::new();
    ui.horizontal(|row| {
        let mut done = task.status == TaskStatus::Completed;
        let toggle = row.add_enabled(!done, egui::Checkbox::without_text(&mut done));
        if toggle.changed() && done {
            actions.push(TaskAction::Complete(task.id.clone()));
        }
        row.strong(&task.title);
        row.weak(format!(
            "{} · {} · due {}",
            task.priority.label(),
            task.category.label(),
            task.due_date.format(DATE_FORMAT)
        ));
        if let Some(name) = task.donor_id.as_deref().and_then(|id| donor_name(donors, id)) {
            row.label(format!("· {name}"));
        }
        row.with_layout(Layout::right_to_left(egui::Align::Center), |lane| {
            if lane.small_button("Delete").clicked() {
                actions.push(TaskAction::Delete(task.id.clone()));
            }
            if lane.small_button("Edit").clicked() {
                actions.push(TaskAction::Edit(task.id.clone()));
            }
            for by in Reschedule::ALL.iter().rev() {
                if lane.small_button(by.label()).clicked() {
                    actions.push(TaskAction::Reschedule(task.id.clone(), *by));
                }
            }
        });
    });
    if let Some(description) = &task.description {
        ui.small(description);
    }
    actions
}

// -----------------------------------------------------------------------------
// Checkout
// -----------------------------------------------------------------------------

#[derive(Default)]
struct CheckoutPage {
    link: String,
    session: Option<CheckoutSession>,
    not_found: Option<String>,
    job: Option<PaymentJob>,
    start_text: String,
    end_text: String,
    end_enabled: bool,
}

impl CheckoutPage {
    fn poll(&mut self) {
        let (Some(job), Some(session)) = (&self.job, &mut self.session) else {
            return;
        };
        if let Some(outcome) = job.try_take() {
            session.complete_payment(job.request(), outcome);
            self.job = None;
        }
    }

    fn open_link(&mut self, link: &str, data: &MockData, fees: FeeSchedule, today: NaiveDate) {
        self.link = link.to_owned();
        self.job = None;
        match CheckoutSession::open(&CheckoutParams::parse(link), data, fees, today) {
            Ok(session) => {
                self.start_text = session.schedule.start_date.format(DATE_FORMAT).to_string();
                self.end_text.clear();
                self.end_enabled = false;
                self.session = Some(session);
                self.not_found = None;
            }
            Err(err) => {
                info!(error = %err, "checkout link did not resolve");
                self.session = None;
                self.not_found = Some(err.to_string());
            }
        }
    }

    fn render(
        &mut self,
        ui: &mut egui::Ui,
        data: &MockData,
        fees: FeeSchedule,
        gateway: &Arc<dyn PaymentGateway>,
        today: NaiveDate,
    ) {
        ui.heading("Donation checkout");
        let mut link = self.link.clone();
        let mut open = false;
        ui.horizontal(|row| {
            row.add(
                egui::TextEdit::singleline(&mut link)
                    .hint_text("campaign=cw-101&amount=50")
                    .desired_width(280.0),
            );
            open = row.button("Open").clicked();
        });
        self.link = link;
        if open {
            let link = self.link.clone();
            self.open_link(&link, data, fees, today);
        }

        if let Some(message) = &self.not_found {
            ui.add_space(12.0);
            ui.heading("Campaign not found");
            ui.weak(message);
            return;
        }

        let Some(session) = &mut self.session else {
            ui.weak("Open a campaign link, or pick a campaign from the dashboard.");
            return;
        };

        ui.separator();
        render_stepper(ui, session.step());
        ui.strong(session.recipient().title.clone());
        ui.add_space(8.0);

        match session.step() {
            CheckoutStep::Config => render_amount_step(
                ui,
                session,
                &mut self.start_text,
                &mut self.end_text,
                &mut self.end_enabled,
                today,
            ),
            CheckoutStep::Details => {
                egui::Grid::new("donor_details").num_columns(2).show(ui, |grid| {
                    grid.label("First name");
                    grid.text_edit_singleline(&mut session.details.first_name);
                    grid.end_row();
                    grid.label("Last name");
                    grid.text_edit_singleline(&mut session.details.last_name);
                    grid.end_row();
                    grid.label("Email");
                    grid.text_edit_singleline(&mut session.details.email);
                    grid.end_row();
                });
                ui.horizontal(|row| {
                    if row.button("Back").clicked() {
                        session.back();
                    }
                    if row
                        .add_enabled(session.can_advance(), egui::Button::new("Continue to payment"))
                        .clicked()
                    {
                        session.advance();
                    }
                });
            }
            CheckoutStep::Payment => {
                let breakdown = session.breakdown(today);
                let processing = session.is_processing();
                ui.add_enabled_ui(!processing, |ui| {
                    for method in PaymentMethod::ALL {
                        ui.radio_value(&mut session.method, method, method.label());
                    }
                });
                render_breakdown(ui, session, today);
                if let Some(error) = session.payment_error() {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }
                ui.horizontal(|row| {
                    if row.button("Back").clicked() {
                        // Dropping the job abandons the in-flight submission.
                        self.job = None;
                        session.back();
                    }
                    let label = if breakdown.due_today > 0.0 {
                        format!("Donate {}", money(breakdown.due_today))
                    } else {
                        "Schedule donation".to_owned()
                    };
                    if row
                        .add_enabled(!processing, egui::Button::new(label))
                        .clicked()
                        && let Some(request) = session.begin_payment(today)
                    {
                        self.job = Some(PaymentJob::spawn(Arc::clone(gateway), request));
                    }
                    if processing {
                        row.spinner();
                        row.weak("Processing…");
                    }
                });
            }
            CheckoutStep::Success => {
                if let Some(receipt) = session.receipt() {
                    ui.heading("Thank you!");
                    ui.label(format!(
                        "Confirmation {} · {} charged today to support {}.",
                        receipt.confirmation_id,
                        money(receipt.charged_today),
                        receipt.recipient
                    ));
                    if let (Frequency::Monthly, Some(next)) = (receipt.frequency, receipt.next_charge) {
                        ui.label(format!(
                            "Next monthly charge of {} on {}.",
                            money(receipt.total),
                            next.format(DATE_FORMAT)
                        ));
                    }
                    ui.weak(format!("A receipt was sent to {}.", receipt.email));
                }
                if ui.button("Start another donation").clicked() {
                    self.session = None;
                    self.link.clear();
                }
            }
        }
    }
}

fn render_stepper(ui: &mut egui::Ui, current: CheckoutStep) {
    ui.horizontal(|row| {
        for step in [
            CheckoutStep::Config,
            CheckoutStep::Details,
            CheckoutStep::Payment,
            CheckoutStep::Success,
        ] {
            if step == current {
                row.strong(step.label());
            } else if step < current {
                row.label(format!("✔ {}", step.label()));
            } else {
                row.weak(step.label());
            }
            if step != CheckoutStep::Success {
                row.weak("›");
            }
        }
    });
}

fn render_amount_step(
    ui: &mut egui::Ui,
    session: &mut CheckoutSession,
    start_text: &mut String,
    end_text: &mut String,
    end_enabled: &mut bool,
    today: NaiveDate,
) {
    ui.horizontal_wrapped(|row| {
        for preset in PRESET_AMOUNTS {
            let mut selected = session.amount().preset() == Some(preset);
            if row.toggle_value(&mut selected, money(preset)).clicked() {
                session.select_preset(preset);
            }
        }
    });
    ui.horizontal(|row| {
        row.label("Other amount $");
        let mut custom = session.amount().custom().to_owned();
        if row
            .add(egui::TextEdit::singleline(&mut custom).desired_width(100.0))
            .changed()
        {
            // Rejected keystrokes leave the stored text as it was.
            session.edit_custom_amount(&custom);
        }
    });

    ui.horizontal(|row| {
        row.radio_value(&mut session.frequency, Frequency::OneTime, Frequency::OneTime.label());
        row.radio_value(&mut session.frequency, Frequency::Monthly, Frequency::Monthly.label());
    });

    if session.frequency == Frequency::Monthly {
        ui.horizontal(|row| {
            row.label("Starts");
            if row
                .add(egui::TextEdit::singleline(&mut *start_text).desired_width(100.0))
                .changed()
                && let Ok(date) = NaiveDate::parse_from_str(start_text.trim(), DATE_FORMAT)
            {
                session.schedule.start_date = date;
            }
            row.checkbox(end_enabled, "Ends");
            if *end_enabled {
                row.add(egui::TextEdit::singleline(&mut *end_text).desired_width(100.0));
            }
        });
        session.schedule.end_date = if *end_enabled {
            NaiveDate::parse_from_str(end_text.trim(), DATE_FORMAT).ok()
        } else {
            None
        };
        if let Err(err) = session.schedule.validate(today) {
            ui.colored_label(ui.visuals().warn_fg_color, err.to_string());
        }
    }

    let fee = session.fees().fees(session.amount().amount());
    ui.checkbox(
        &mut session.cover_fees,
        format!("Cover the {} processing fee", money(fee)),
    );
    render_breakdown(ui, session, today);

    if ui
        .add_enabled(session.can_advance(), egui::Button::new("Continue"))
        .clicked()
    {
        session.advance();
    }
}

fn render_breakdown(ui: &mut egui::Ui, session: &CheckoutSession, today: NaiveDate) {
    let breakdown = session.breakdown(today);
    egui::Grid::new("price_breakdown").num_columns(2).show(ui, |grid| {
        grid.weak("Donation");
        grid.label(money(breakdown.amount));
        grid.end_row();
        if session.cover_fees {
            grid.weak("Processing fee");
            grid.label(money(breakdown.fees));
            grid.end_row();
        }
        grid.weak("Total");
        grid.strong(money(breakdown.total));
        grid.end_row();
        grid.weak("Due today");
        grid.label(money(breakdown.due_today));
        grid.end_row();
        if let Some(future) = breakdown.future_charge {
            grid.weak("Future charge");
            grid.label(format!(
                "{} on {}",
                money(future.amount),
                future.date.format(DATE_FORMAT)
            ));
            grid.end_row();
        } else if let Some(next) = breakdown.next_charge {
            grid.weak("Next charge");
            grid.label(next.format(DATE_FORMAT).to_string());
            grid.end_row();
        }
    });
}
