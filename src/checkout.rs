use chrono::{Months, NaiveDate};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    domain::Campaign,
    payment::{PaymentConfirmation, PaymentError, PaymentRequest},
    provider::DataProvider,
};

pub const PRESET_AMOUNTS: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

// -----------------------------------------------------------------------------
// Pricing
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeeSchedule {
    pub flat: f64,
    pub percent: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            flat: 0.30,
            percent: 0.029,
        }
    }
}

impl FeeSchedule {
    /// Fees on a gross-up: charging `amount + fees` leaves exactly `amount`
    /// once the processor takes its cut.
    pub fn fees(&self, amount: f64) -> f64 {
        (amount + self.flat) / (1.0 - self.percent) - amount
    }

    pub fn total(&self, amount: f64, cover_fees: bool) -> f64 {
        if cover_fees {
            amount + self.fees(amount)
        } else {
            amount
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Frequency {
    #[default]
    OneTime,
    Monthly,
}

impl Frequency {
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::OneTime => "One-time",
            Frequency::Monthly => "Monthly",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    #[default]
    Card,
    Ach,
    Wallet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Card, PaymentMethod::Ach, PaymentMethod::Wallet];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit card",
            PaymentMethod::Ach => "Bank transfer (ACH)",
            PaymentMethod::Wallet => "Digital wallet",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FutureCharge {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceBreakdown {
    pub amount: f64,
    pub fees: f64,
    pub total: f64,
    pub due_today: f64,
    pub future_charge: Option<FutureCharge>,
    pub next_charge: Option<NaiveDate>,
}

pub fn price(
    amount: f64,
    cover_fees: bool,
    frequency: Frequency,
    schedule: &Schedule,
    fees: &FeeSchedule,
    today: NaiveDate,
) -> PriceBreakdown {
    let total = fees.total(amount, cover_fees);
    let schedule = schedule.clamped(today);
    let (due_today, future_charge, next_charge) = match frequency {
        Frequency::OneTime => (total, None, None),
        Frequency::Monthly if schedule.start_date > today => (
            0.0,
            Some(FutureCharge {
                date: schedule.start_date,
                amount: total,
            }),
            Some(schedule.start_date),
        ),
        Frequency::Monthly => (total, None, schedule.next_charge_date(today)),
    };

    PriceBreakdown {
        amount,
        fees: fees.fees(amount),
        total,
        due_today,
        future_charge,
        next_charge,
    }
}

// -----------------------------------------------------------------------------
// Input validation
// -----------------------------------------------------------------------------

pub fn is_valid_amount_input(input: &str) -> bool {
    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (input, None),
    };
    let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    digits(whole)
        && fraction.is_none_or(|fraction| fraction.len() <= 2 && digits(fraction))
}

pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AmountSelection {
    preset: Option<f64>,
    custom: String,
    amount: f64,
}

impl AmountSelection {
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn preset(&self) -> Option<f64> {
        self.preset
    }

    pub fn custom(&self) -> &str {
        &self.custom
    }

    pub fn select_preset(&mut self, amount: f64) {
        self.preset = Some(amount);
        self.custom.clear();
        self.amount = amount;
    }

    pub fn edit_custom(&mut self, input: &str) -> bool {
        if !is_valid_amount_input(input) {
            return false;
        }
        self.preset = None;
        self.custom = input.to_owned();
        self.amount = if input.is_empty() {
            0.0
        } else {
            input.parse().unwrap_or(0.0)
        };
        true
    }
}

// -----------------------------------------------------------------------------
// Recurring schedule
// -----------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("start date {start} is before today ({today})")]
    StartsInPast { start: NaiveDate, today: NaiveDate },
    #[error("end date {end} is before the start date {start}")]
    EndsBeforeStart { start: NaiveDate, end: NaiveDate },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Schedule {
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            start_date: today,
            end_date: None,
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), ScheduleError> {
        if self.start_date < today {
            return Err(ScheduleError::StartsInPast {
                start: self.start_date,
                today,
            });
        }
        match self.end_date {
            Some(end) if end < self.start_date => Err(ScheduleError::EndsBeforeStart {
                start: self.start_date,
                end,
            }),
            _ => Ok(()),
        }
    }

    pub fn clamped(&self, today: NaiveDate) -> Self {
        let start_date = self.start_date.max(today);
        Self {
            start_date,
            end_date: self.end_date.map(|end| end.max(start_date)),
        }
    }

    pub fn next_charge_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let schedule = self.clamped(today);
        let next = if schedule.start_date > today {
            schedule.start_date
        } else {
            schedule.start_date.checked_add_months(Months::new(1))?
        };
        match schedule.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }
}

// -----------------------------------------------------------------------------
// Entry parameters
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CheckoutParams {
    pub recipient: Option<String>,
    pub amount: Option<f64>,
}

impl CheckoutParams {
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key {
                "campaign" | "id" if !value.is_empty() => {
                    params.recipient = Some(value.to_owned());
                }
                "amount" => {
                    params.amount = value
                        .parse::<f64>()
                        .ok()
                        .filter(|amount| amount.is_finite() && *amount > 0.0);
                }
                _ => {}
            }
        }
        params
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("no campaign was given")]
    MissingRecipient,
    #[error("campaign {0} was not found")]
    RecipientNotFound(String),
}

// -----------------------------------------------------------------------------
// Session
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    #[default]
    Config,
    Details,
    Payment,
    Success,
}

impl CheckoutStep {
    pub fn label(&self) -> &'static str {
        match self {
            CheckoutStep::Config => "Amount",
            CheckoutStep::Details => "Your details",
            CheckoutStep::Payment => "Payment",
            CheckoutStep::Success => "Done",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DonorDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl DonorDetails {
    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && is_plausible_email(&self.email)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Binds an in-flight payment to the step it was started from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentTicket(u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Receipt {
    pub confirmation_id: String,
    pub recipient: String,
    pub charged_today: f64,
    pub total: f64,
    pub frequency: Frequency,
    pub next_charge: Option<NaiveDate>,
    pub email: String,
}

pub struct CheckoutSession {
    recipient: Campaign,
    step: CheckoutStep,
    amount: AmountSelection,
    pub frequency: Frequency,
    pub cover_fees: bool,
    pub method: PaymentMethod,
    pub schedule: Schedule,
    pub details: DonorDetails,
    fees: FeeSchedule,
    generation: u64,
    in_flight: Option<PaymentTicket>,
    payment_error: Option<String>,
    receipt: Option<Receipt>,
}

impl CheckoutSession {
    pub fn new(recipient: Campaign, fees: FeeSchedule, today: NaiveDate) -> Self {
        Self {
            recipient,
            step: CheckoutStep::Config,
            amount: AmountSelection::default(),
            frequency: Frequency::OneTime,
            cover_fees: false,
            method: PaymentMethod::Card,
            schedule: Schedule::starting(today),
            details: DonorDetails::default(),
            fees,
            generation: 0,
            in_flight: None,
            payment_error: None,
            receipt: None,
        }
    }

    pub fn open(
        params: &CheckoutParams,
        provider: &dyn DataProvider,
        fees: FeeSchedule,
        today: NaiveDate,
    ) -> Result<Self, CheckoutError> {
        let id = params
            .recipient
            .as_deref()
            .ok_or(CheckoutError::MissingRecipient)?;
        let campaign = provider
            .find_campaign(id)
            .ok_or_else(|| CheckoutError::RecipientNotFound(id.to_owned()))?;

        let mut session = Self::new(campaign.clone(), fees, today);
        if let Some(initial) = params.amount {
            if PRESET_AMOUNTS.contains(&initial) {
                session.select_preset(initial);
            } else {
                let text = format!("{initial:.2}");
                let text = text.trim_end_matches('0').trim_end_matches('.');
                session.edit_custom_amount(text);
            }
        }
        info!(campaign = %campaign.id, "checkout session opened");
        Ok(session)
    }

    pub fn recipient(&self) -> &Campaign {
        &self.recipient
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn amount(&self) -> &AmountSelection {
        &self.amount
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn payment_error(&self) -> Option<&str> {
        self.payment_error.as_deref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn select_preset(&mut self, amount: f64) {
        self.amount.select_preset(amount);
    }

    pub fn edit_custom_amount(&mut self, input: &str) -> bool {
        self.amount.edit_custom(input)
    }

    pub fn breakdown(&self, today: NaiveDate) -> PriceBreakdown {
        price(
            self.amount.amount(),
            self.cover_fees,
            self.frequency,
            &self.schedule,
            &self.fees,
            today,
        )
    }

    pub fn can_advance(&self) -> bool {
        match self.step {
            CheckoutStep::Config => self.amount.amount() > 0.0,
            CheckoutStep::Details => self.amount.amount() > 0.0 && self.details.is_complete(),
            // Leaving payment happens only through a completed submission.
            CheckoutStep::Payment | CheckoutStep::Success => false,
        }
    }

    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        let next = match self.step {
            CheckoutStep::Config => CheckoutStep::Details,
            CheckoutStep::Details => CheckoutStep::Payment,
            CheckoutStep::Payment | CheckoutStep::Success => return false,
        };
        self.enter(next);
        true
    }

    pub fn back(&mut self) -> bool {
        let previous = match self.step {
            CheckoutStep::Details => CheckoutStep::Config,
            CheckoutStep::Payment => CheckoutStep::Details,
            CheckoutStep::Config | CheckoutStep::Success => return false,
        };
        if self.in_flight.is_some() {
            info!("in-flight payment abandoned by navigating back");
        }
        self.enter(previous);
        true
    }

    pub fn begin_payment(&mut self, today: NaiveDate) -> Option<PaymentRequest> {
        if self.step != CheckoutStep::Payment || self.in_flight.is_some() {
            return None;
        }
        let ticket = PaymentTicket(self.generation);
        self.in_flight = Some(ticket);
        self.payment_error = None;

        let breakdown = self.breakdown(today);
        Some(PaymentRequest {
            ticket,
            campaign_id: self.recipient.id.clone(),
            donor_name: self.details.full_name(),
            email: self.details.email.trim().to_owned(),
            method: self.method,
            frequency: self.frequency,
            charge_now: breakdown.due_today,
            total: breakdown.total,
            next_charge: breakdown.next_charge,
        })
    }

    /// Applies a finished submission. Results whose ticket no longer matches
    /// the current step are discarded and `false` is returned.
    pub fn complete_payment(
        &mut self,
        request: &PaymentRequest,
        outcome: Result<PaymentConfirmation, PaymentError>,
    ) -> bool {
        if self.step != CheckoutStep::Payment || self.in_flight != Some(request.ticket) {
            warn!(ticket = ?request.ticket, "discarding stale payment result");
            return false;
        }
        self.in_flight = None;
        match outcome {
            Ok(confirmation) => {
                info!(confirmation = %confirmation.confirmation_id, "payment confirmed");
                self.receipt = Some(Receipt {
                    confirmation_id: confirmation.confirmation_id,
                    recipient: self.recipient.title.clone(),
                    charged_today: confirmation.charged,
                    total: request.total,
                    frequency: request.frequency,
                    next_charge: request.next_charge,
                    email: request.email.clone(),
                });
                self.enter(CheckoutStep::Success);
            }
            Err(err) => {
                warn!(error = %err, "payment failed");
                self.payment_error = Some(err.to_string());
            }
        }
        true
    }

    fn enter(&mut self, step: CheckoutStep) {
        self.step = step;
        self.generation += 1;
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockData;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const EPSILON: f64 = 1e-9;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn campaign() -> Campaign {
        Campaign {
            id: "cw-1".into(),
            title: "Clean Water".into(),
            location: "Kenya".into(),
            image: String::new(),
            raised: 0.0,
            goal: 100.0,
            category: "Water".into(),
            description: String::new(),
        }
    }

    fn session() -> CheckoutSession {
        CheckoutSession::new(campaign(), FeeSchedule::default(), today())
    }

    fn confirmation(charged: f64) -> PaymentConfirmation {
        PaymentConfirmation {
            confirmation_id: "DD-TEST".into(),
            charged,
            processed_at: Utc::now(),
        }
    }

    fn at_payment() -> CheckoutSession {
        let mut session = session();
        session.select_preset(50.0);
        assert!(session.advance());
        session.details = DonorDetails {
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            email: "alice@example.com".into(),
        };
        assert!(session.advance());
        assert_eq!(session.step(), CheckoutStep::Payment);
        session
    }

    #[test]
    fn gross_up_round_trips() {
        let fees = FeeSchedule::default();
        for amount in [0.0, 1.0, 25.0, 99.99, 1000.0, 12_345.67] {
            let gross = amount + fees.fees(amount);
            assert!((gross - (amount + fees.flat) / (1.0 - fees.percent)).abs() < EPSILON);
            // The processor's cut of the gross leaves the intended amount.
            let net = gross - (gross * fees.percent + fees.flat);
            assert!((net - amount).abs() < EPSILON, "amount {amount}");
        }
        assert!((fees.fees(0.0) - 0.30 / 0.971).abs() < EPSILON);
    }

    #[test]
    fn total_includes_fees_only_when_covered() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.total(100.0, false), 100.0);
        assert!((fees.total(100.0, true) - 103.295_571_575_695_16).abs() < 1e-6);
    }

    #[test]
    fn monthly_gift_starting_later_is_not_due_today() {
        let fees = FeeSchedule::default();
        let schedule = Schedule {
            start_date: date(11, 1),
            end_date: None,
        };
        let breakdown = price(50.0, false, Frequency::Monthly, &schedule, &fees, today());
        assert_eq!(breakdown.due_today, 0.0);
        assert_eq!(
            breakdown.future_charge,
            Some(FutureCharge {
                date: date(11, 1),
                amount: 50.0,
            })
        );

        let starts_today = Schedule::starting(today());
        let breakdown = price(50.0, true, Frequency::Monthly, &starts_today, &fees, today());
        assert_eq!(breakdown.due_today, breakdown.total);
        assert_eq!(breakdown.future_charge, None);
        assert_eq!(breakdown.next_charge, Some(date(11, 17)));

        let breakdown = price(50.0, false, Frequency::OneTime, &schedule, &fees, today());
        assert_eq!(breakdown.due_today, 50.0);
        assert_eq!(breakdown.next_charge, None);
    }

    #[rstest]
    #[case("", true)]
    #[case("12", true)]
    #[case("12.", true)]
    #[case("12.5", true)]
    #[case(".75", true)]
    #[case("12.50", true)]
    #[case("12.505", false)]
    #[case("1.2.3", false)]
    #[case("-5", false)]
    #[case("1e3", false)]
    #[case("12 ", false)]
    fn amount_input_shape(#[case] input: &str, #[case] accepted: bool) {
        assert_eq!(is_valid_amount_input(input), accepted);
    }

    #[rstest]
    #[case("alice@example.com", true)]
    #[case(" alice@example.com ", true)]
    #[case("alice@example", false)]
    #[case("@example.com", false)]
    #[case("alice@@example.com", false)]
    #[case("alice smith@example.com", false)]
    #[case("alice@.com", false)]
    #[case("", false)]
    fn email_shape(#[case] email: &str, #[case] plausible: bool) {
        assert_eq!(is_plausible_email(email), plausible);
    }

    #[test]
    fn custom_amount_is_last_write_wins() {
        let mut selection = AmountSelection::default();
        selection.select_preset(100.0);
        selection.select_preset(250.0);
        assert!(selection.edit_custom("42.5"));
        assert_eq!(selection.amount(), 42.5);
        assert_eq!(selection.preset(), None);

        assert!(!selection.edit_custom("42.555"));
        assert_eq!(selection.custom(), "42.5");
        assert_eq!(selection.amount(), 42.5);

        selection.select_preset(25.0);
        assert_eq!(selection.custom(), "");
        assert_eq!(selection.amount(), 25.0);
    }

    #[test]
    fn clearing_custom_amount_blocks_progress() {
        let mut session = session();
        assert!(!session.advance());
        session.select_preset(50.0);
        assert!(session.edit_custom_amount("7"));
        assert!(session.edit_custom_amount(""));
        assert_eq!(session.amount().amount(), 0.0);
        assert!(!session.advance());
        assert!(session.edit_custom_amount("."));
        assert!(!session.advance());
        assert_eq!(session.step(), CheckoutStep::Config);
    }

    #[test]
    fn details_gate_requires_names_and_email() {
        let mut session = session();
        session.select_preset(25.0);
        assert!(session.advance());

        session.details.first_name = "Alice".into();
        session.details.email = "alice@example.com".into();
        assert!(!session.advance());

        session.details.last_name = "   ".into();
        assert!(!session.advance());

        session.details.last_name = "Smith".into();
        session.details.email = "alice.example.com".into();
        assert!(!session.advance());

        session.details.email = "alice@example.com".into();
        assert!(session.advance());
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert!(!session.advance());
    }

    #[test]
    fn back_keeps_entered_data() {
        let mut session = at_payment();
        assert!(session.back());
        assert_eq!(session.step(), CheckoutStep::Details);
        assert!(session.back());
        assert_eq!(session.step(), CheckoutStep::Config);
        assert!(!session.back());
        assert_eq!(session.amount().amount(), 50.0);
        assert_eq!(session.details.first_name, "Alice");
    }

    #[test]
    fn payment_success_is_terminal() {
        let mut session = at_payment();
        let request = session.begin_payment(today()).expect("on payment step");
        assert!(session.is_processing());
        assert!(session.begin_payment(today()).is_none());
        assert_eq!(request.charge_now, 50.0);

        assert!(session.complete_payment(&request, Ok(confirmation(50.0))));
        assert_eq!(session.step(), CheckoutStep::Success);
        assert_eq!(session.receipt().map(|r| r.charged_today), Some(50.0));
        assert!(!session.back());
        assert!(!session.advance());
        assert!(session.begin_payment(today()).is_none());
    }

    #[test]
    fn result_arriving_after_navigating_back_is_discarded() {
        let mut session = at_payment();
        let request = session.begin_payment(today()).expect("on payment step");
        assert!(session.back());

        assert!(!session.complete_payment(&request, Ok(confirmation(50.0))));
        assert_eq!(session.step(), CheckoutStep::Details);
        assert!(session.receipt().is_none());

        // Returning to payment does not revive the old ticket.
        assert!(session.advance());
        assert!(!session.complete_payment(&request, Ok(confirmation(50.0))));
        assert_eq!(session.step(), CheckoutStep::Payment);
    }

    #[test]
    fn failed_payment_stays_on_payment_step() {
        let mut session = at_payment();
        let request = session.begin_payment(today()).expect("on payment step");
        let applied = session.complete_payment(
            &request,
            Err(PaymentError::Declined("card declined".into())),
        );
        assert!(applied);
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert!(!session.is_processing());
        assert!(session.payment_error().is_some());
        assert!(session.begin_payment(today()).is_some());
    }

    #[test]
    fn schedule_validation_and_next_charge() {
        let past = Schedule {
            start_date: date(10, 1),
            end_date: None,
        };
        assert!(matches!(
            past.validate(today()),
            Err(ScheduleError::StartsInPast { .. })
        ));
        assert_eq!(past.clamped(today()).start_date, today());
        assert_eq!(past.next_charge_date(today()), Some(date(11, 17)));

        let inverted = Schedule {
            start_date: date(11, 1),
            end_date: Some(date(10, 20)),
        };
        assert!(matches!(
            inverted.validate(today()),
            Err(ScheduleError::EndsBeforeStart { .. })
        ));
        assert_eq!(inverted.clamped(today()).end_date, Some(date(11, 1)));
        assert_eq!(inverted.next_charge_date(today()), Some(date(11, 1)));

        let short = Schedule {
            start_date: today(),
            end_date: Some(date(11, 1)),
        };
        assert_eq!(short.validate(today()), Ok(()));
        assert_eq!(short.next_charge_date(today()), None);
    }

    #[test]
    fn params_parse_and_resolve() {
        let params = CheckoutParams::parse("?campaign=cw-101&amount=100");
        assert_eq!(params.recipient.as_deref(), Some("cw-101"));
        assert_eq!(params.amount, Some(100.0));
        assert_eq!(CheckoutParams::parse("campaign=x&amount=-4").amount, None);
        assert_eq!(CheckoutParams::parse("amount=abc").amount, None);

        let data = MockData::seeded(today());
        let session =
            CheckoutSession::open(&params, &data, FeeSchedule::default(), today()).unwrap();
        assert_eq!(session.amount().preset(), Some(100.0));

        let params = CheckoutParams::parse("campaign=cw-101&amount=12.5");
        let session =
            CheckoutSession::open(&params, &data, FeeSchedule::default(), today()).unwrap();
        assert_eq!(session.amount().custom(), "12.5");
        assert_eq!(session.amount().amount(), 12.5);

        let missing = CheckoutSession::open(
            &CheckoutParams::parse("campaign=nope"),
            &data,
            FeeSchedule::default(),
            today(),
        );
        assert_eq!(
            missing.err(),
            Some(CheckoutError::RecipientNotFound("nope".into()))
        );
        let empty = CheckoutSession::open(
            &CheckoutParams::default(),
            &data,
            FeeSchedule::default(),
            today(),
        );
        assert_eq!(empty.err(), Some(CheckoutError::MissingRecipient));
    }
}
