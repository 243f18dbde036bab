//! Sync run orchestration.
//!
//! One run walks PLANNING, FETCHING, TRANSFORMING, PUSHING. The health
//! probe happens before any fetch, so a dead cloud endpoint costs
//! nothing locally. Fetch failures abort the run; transform failures
//! are isolated per report; the push retries per policy; the resume
//! boundary is persisted only after the push is acknowledged.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dukaan_core::{PaymentKind, ReportKind, SyncPayload, SyncWindow};
use dukaan_tally::transform;
use dukaan_tally::ExportClient;
use tracing::{info, instrument, warn};

use crate::error::SyncError;
use crate::push::{push_with_retry, CloudClient, PushAck, RetryPolicy};
use crate::state::SyncStateStore;

/// Tunables for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Cap on the window length so a long-offline connector catches up
    /// in bounded chunks.
    pub max_window_days: u64,
    pub connector_version: String,
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_window_days: 30,
            connector_version: env!("CARGO_PKG_VERSION").to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// What a completed run did.
#[derive(Debug)]
pub enum RunOutcome {
    /// Resume date is in the future; nothing was fetched or pushed.
    NothingToSync,
    /// Payload pushed and acknowledged; state advanced to the window
    /// end.
    Pushed {
        window: SyncWindow,
        ack: PushAck,
        record_count: usize,
        /// Per-report transform failures that were isolated.
        diagnostics: Vec<String>,
    },
}

/// Drives one sync cycle end to end.
pub struct Orchestrator {
    export: Arc<dyn ExportClient>,
    cloud: Arc<dyn CloudClient>,
    state: SyncStateStore,
    config: SyncConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        export: Arc<dyn ExportClient>,
        cloud: Arc<dyn CloudClient>,
        state: SyncStateStore,
        config: SyncConfig,
    ) -> Self {
        Self {
            export,
            cloud,
            state,
            config,
        }
    }

    /// Runs one cycle for the given calendar day.
    #[instrument(skip(self), fields(today = %today))]
    pub async fn run(&self, today: NaiveDate) -> Result<RunOutcome, SyncError> {
        let resume = self.state.resume_date(today);
        let Some(window) = SyncWindow::plan(resume, today, self.config.max_window_days) else {
            info!(%resume, "nothing to sync");
            return Ok(RunOutcome::NothingToSync);
        };
        if window.days() as u64 == self.config.max_window_days {
            warn!(days = window.days(), "window capped");
        }
        info!(from = %window.from, to = %window.to, "sync window planned");

        self.cloud.check_health().await?;

        let fetch = |report: ReportKind| {
            let export = Arc::clone(&self.export);
            async move {
                export
                    .fetch(report, window)
                    .await
                    .map_err(|source| SyncError::Fetch { report, source })
            }
        };
        let sales_xml = fetch(ReportKind::SalesVouchers).await?;
        let purchase_xml = fetch(ReportKind::PurchaseVouchers).await?;
        let stock_xml = fetch(ReportKind::StockSummary).await?;
        let ledger_xml = fetch(ReportKind::LedgerBalances).await?;
        let payment_xml = fetch(ReportKind::PaymentVouchers).await?;
        let receipt_xml = fetch(ReportKind::ReceiptVouchers).await?;

        let mut diagnostics = Vec::new();
        let sales = isolate(
            &mut diagnostics,
            ReportKind::SalesVouchers,
            transform::parse_sales_vouchers(&sales_xml),
        );
        let purchases = isolate(
            &mut diagnostics,
            ReportKind::PurchaseVouchers,
            transform::parse_purchase_vouchers(&purchase_xml),
        );
        let stock = isolate(
            &mut diagnostics,
            ReportKind::StockSummary,
            transform::parse_stock_summary(&stock_xml, window.to),
        );
        let ledger = isolate(
            &mut diagnostics,
            ReportKind::LedgerBalances,
            transform::parse_ledger_balances(&ledger_xml, window.to),
        );
        let mut payments = isolate(
            &mut diagnostics,
            ReportKind::PaymentVouchers,
            transform::parse_money_vouchers(&payment_xml, PaymentKind::Payment),
        );
        payments.extend(isolate(
            &mut diagnostics,
            ReportKind::ReceiptVouchers,
            transform::parse_money_vouchers(&receipt_xml, PaymentKind::Receipt),
        ));

        info!(
            sales = sales.len(),
            purchases = purchases.len(),
            stock = stock.len(),
            ledger = ledger.len(),
            payments = payments.len(),
            "transformed"
        );

        let payload = SyncPayload {
            from_date: window.from,
            to_date: window.to,
            connector_version: self.config.connector_version.clone(),
            sync_started_at: Some(Utc::now()),
            sales_vouchers: sales,
            purchase_vouchers: purchases,
            stock_items: stock,
            ledger_entries: ledger,
            payment_entries: payments,
        };
        let record_count = payload.record_count();

        let ack = push_with_retry(self.cloud.as_ref(), &payload, &self.config.retry).await?;
        info!(status = %ack.status, sales = ack.sales_count, purchases = ack.purchase_count, "push acknowledged");

        self.state.save(window.to)?;

        Ok(RunOutcome::Pushed {
            window,
            ack,
            record_count,
            diagnostics,
        })
    }
}

/// A failed transform drops its report from the payload and leaves a
/// diagnostic; the other reports still sync.
fn isolate<T>(
    diagnostics: &mut Vec<String>,
    report: ReportKind,
    result: Result<Vec<T>, transform::TransformError>,
) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(e) => {
            warn!(report = %report, error = %e, "transform failed, report dropped from payload");
            diagnostics.push(format!("{report}: {e}"));
            Vec::new()
        }
    }
}
