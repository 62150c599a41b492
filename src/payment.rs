use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, TryRecvError},
    },
    thread,
    time::Duration,
};

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::info;

use crate::checkout::{Frequency, PaymentMethod, PaymentTicket};

#[derive(Clone, Debug)]
pub struct PaymentRequest {
    pub ticket: PaymentTicket,
    pub campaign_id: String,
    pub donor_name: String,
    pub email: String,
    pub method: PaymentMethod,
    pub frequency: Frequency,
    pub charge_now: f64,
    pub total: f64,
    pub next_charge: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaymentConfirmation {
    pub confirmation_id: String,
    pub charged: f64,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment was declined: {0}")]
    Declined(String),
    #[error("Payment worker disconnected before returning a result")]
    WorkerGone,
}

pub type PaymentOutcome = Result<PaymentConfirmation, PaymentError>;

pub trait PaymentGateway: Send + Sync {
    fn submit(&self, request: &PaymentRequest) -> PaymentOutcome;
}

pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl PaymentGateway for SimulatedGateway {
    fn submit(&self, request: &PaymentRequest) -> PaymentOutcome {
        thread::sleep(self.delay);
        if request.total <= 0.0 {
            return Err(PaymentError::Declined("amount must be positive".to_owned()));
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        Ok(PaymentConfirmation {
            confirmation_id: format!("DD-{}", id[..8].to_uppercase()),
            charged: request.charge_now,
            processed_at: Utc::now(),
        })
    }
}

/// A submission running on a worker thread. Dropping the job cancels it: the
/// worker's result has nowhere to go.
pub struct PaymentJob {
    request: PaymentRequest,
    receiver: Receiver<PaymentOutcome>,
}

impl PaymentJob {
    pub fn spawn(gateway: Arc<dyn PaymentGateway>, request: PaymentRequest) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker_request = request.clone();
        info!(campaign = %request.campaign_id, "submitting payment");
        thread::spawn(move || {
            let outcome = gateway.submit(&worker_request);
            let _ = tx.send(outcome);
        });
        Self {
            request,
            receiver: rx,
        }
    }

    pub fn request(&self) -> &PaymentRequest {
        &self.request
    }

    pub fn try_take(&self) -> Option<PaymentOutcome> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PaymentError::WorkerGone)),
        }
    }

    #[cfg(test)]
    fn wait(&self) -> PaymentOutcome {
        self.receiver
            .recv_timeout(Duration::from_secs(5))
            .unwrap_or(Err(PaymentError::WorkerGone))
    }
}
