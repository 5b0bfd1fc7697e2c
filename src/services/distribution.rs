//! Batch profit-distribution cycle.
//!
//! One pass visits every active position, credits any elapsed payout
//! periods, and releases principal at maturity. Positions are independent:
//! a failure on one is logged and the batch continues. Within a position
//! the step order (claim -> credit -> statement -> referral) is fixed; the
//! claim on the unique (investment_id, period_ending) key is what makes a
//! concurrent or repeated run safe.

use crate::error::{AppError, AppResult};
use crate::models::{
    InvestmentPosition, MovementSource, Plan, TransactionStatus, TransactionType,
};
use crate::repositories::{
    InvestmentRepository, PlanRepository, ProfitLogRepository, ReserveRepository,
    TransactionRepository, WalletRepository,
};
use crate::roi;
use crate::services::audit::AuditTrailService;
use crate::services::kyc::KycStatusProvider;
use crate::services::notify::{Notification, NotificationDispatcher, NotificationKind};
use crate::services::performance::PerformanceFeed;
use crate::services::referral::ReferralService;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

/// Options for one cycle run
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOptions {
    /// Compute and count without writing anything
    pub dry_run: bool,
    /// Evaluate eligibility as of this instant instead of now
    pub week_ending: Option<DateTime<Utc>>,
}

/// Aggregate result of one cycle run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub total_profit: Decimal,
    pub total_aum: Decimal,
    pub credited_count: u64,
    pub matured_count: u64,
    pub skipped_count: u64,
    pub failed_count: u64,
}

struct PositionOutcome {
    profit: Decimal,
    credited: u64,
    matured: bool,
    skipped: bool,
}

pub struct DistributionService {
    investment_repo: Arc<InvestmentRepository>,
    plan_repo: Arc<PlanRepository>,
    wallet_repo: Arc<WalletRepository>,
    profit_log_repo: Arc<ProfitLogRepository>,
    transaction_repo: Arc<TransactionRepository>,
    reserve_repo: Arc<ReserveRepository>,
    referral: Arc<ReferralService>,
    feed: Arc<dyn PerformanceFeed>,
    kyc: Arc<dyn KycStatusProvider>,
    notifier: Arc<dyn NotificationDispatcher>,
    audit: Option<Arc<AuditTrailService>>,
    service_fee_pct: Decimal,
    kyc_gate_profits: bool,
}

impl DistributionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        investment_repo: Arc<InvestmentRepository>,
        plan_repo: Arc<PlanRepository>,
        wallet_repo: Arc<WalletRepository>,
        profit_log_repo: Arc<ProfitLogRepository>,
        transaction_repo: Arc<TransactionRepository>,
        reserve_repo: Arc<ReserveRepository>,
        referral: Arc<ReferralService>,
        feed: Arc<dyn PerformanceFeed>,
        kyc: Arc<dyn KycStatusProvider>,
        notifier: Arc<dyn NotificationDispatcher>,
        service_fee_pct: Decimal,
        kyc_gate_profits: bool,
    ) -> Self {
        Self {
            investment_repo,
            plan_repo,
            wallet_repo,
            profit_log_repo,
            transaction_repo,
            reserve_repo,
            referral,
            feed,
            kyc,
            notifier,
            audit: None,
            service_fee_pct,
            kyc_gate_profits,
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditTrailService>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run one distribution pass over all active positions.
    pub async fn run_cycle(&self, options: CycleOptions) -> AppResult<CycleSummary> {
        let as_of = options.week_ending.unwrap_or_else(Utc::now);
        let positions = self
            .investment_repo
            .find_active()
            .await
            .map_err(AppError::from)?;

        info!(
            "Distribution cycle starting: {} active position(s), as_of={}, dry_run={}",
            positions.len(),
            as_of,
            options.dry_run
        );

        let mut summary = CycleSummary::default();
        let mut matured_principal = Decimal::ZERO;

        for position in &positions {
            match self.process_position(position, as_of, options.dry_run).await {
                Ok(outcome) => {
                    summary.total_profit += outcome.profit;
                    summary.credited_count += outcome.credited;
                    if outcome.matured {
                        summary.matured_count += 1;
                        matured_principal += position.principal;
                    }
                    if outcome.skipped {
                        summary.skipped_count += 1;
                    }
                }
                Err(e) => {
                    error!("Position {} failed, continuing batch: {}", position.id, e);
                    summary.failed_count += 1;
                }
            }
        }

        // AUM is recomputed fresh each run rather than tracked
        // incrementally; after maturity releases above this reflects the
        // surviving active principal. A dry run leaves matured rows in
        // place, so their principal is deducted to match the committing
        // path's number.
        summary.total_aum = self
            .investment_repo
            .active_principal_sum()
            .await
            .map_err(AppError::from)?;
        if options.dry_run {
            summary.total_aum -= matured_principal;
        }

        if !options.dry_run {
            self.reserve_repo
                .apply_cycle(summary.total_aum, summary.total_profit)
                .await
                .map_err(AppError::from)?;

            if let Some(audit) = &self.audit {
                audit
                    .log_cycle_completed(
                        summary.total_profit,
                        summary.total_aum,
                        summary.credited_count,
                        summary.matured_count,
                    )
                    .await?;
            }
        }

        info!(
            "Distribution cycle finished: credited={}, matured={}, skipped={}, failed={}, profit={}, aum={}",
            summary.credited_count,
            summary.matured_count,
            summary.skipped_count,
            summary.failed_count,
            summary.total_profit,
            summary.total_aum
        );

        Ok(summary)
    }

    async fn process_position(
        &self,
        position: &InvestmentPosition,
        as_of: DateTime<Utc>,
        dry_run: bool,
    ) -> AppResult<PositionOutcome> {
        let plan = self
            .plan_repo
            .find_by_id(position.plan_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::PlanNotFound(position.plan_id.to_string()))?;

        let mut outcome = PositionOutcome {
            profit: Decimal::ZERO,
            credited: 0,
            matured: false,
            skipped: false,
        };

        // Policy gate: unverified owners can be excluded from profit
        // credits. Principal release below is unaffected; maturity
        // returns the owner's own funds.
        let gate_profits = self.kyc_gate_profits && !self.kyc.is_approved(position.owner_id).await;
        if gate_profits {
            outcome.skipped = true;
        } else {
            let (rate_pct, weighted) = self.effective_rate(&plan).await;

            if rate_pct > Decimal::ZERO {
                let ends = roi::period_ends(
                    position.start_date,
                    plan.duration_days,
                    plan.frequency().period_days(),
                    as_of,
                );

                for period_ending in ends {
                    let credited = self
                        .credit_period(position, &plan, rate_pct, weighted, period_ending, dry_run)
                        .await?;

                    if let Some(net) = credited {
                        outcome.profit += net;
                        outcome.credited += 1;
                    }
                }
            }
        }

        if roi::is_mature(position.start_date, plan.duration_days, as_of) {
            outcome.matured = self.release_principal(position, dry_run).await?;
        }

        Ok(outcome)
    }

    /// Effective per-period rate and whether it came from stream weighting
    async fn effective_rate(&self, plan: &Plan) -> (Decimal, Option<Decimal>) {
        if plan.is_stream_weighted() {
            let allocations = plan.allocations_map();
            let streams: Vec<String> = allocations.keys().cloned().collect();
            let rates = self.feed.rates_for(&streams).await;
            let weighted = roi::weighted_rate_pct(&allocations, &rates);
            (weighted, Some(weighted))
        } else {
            (plan.return_percentage, None)
        }
    }

    /// Credit one elapsed period. Returns the net amount paid, or None when
    /// the period was already paid (idempotency skip).
    async fn credit_period(
        &self,
        position: &InvestmentPosition,
        plan: &Plan,
        rate_pct: Decimal,
        weighted_pct: Option<Decimal>,
        period_ending: DateTime<Utc>,
        dry_run: bool,
    ) -> AppResult<Option<Decimal>> {
        if self
            .profit_log_repo
            .exists(position.id, period_ending)
            .await
            .map_err(AppError::from)?
        {
            return Ok(None);
        }

        let breakdown = roi::profit_for_period(position.principal, rate_pct, self.service_fee_pct);
        if breakdown.net <= Decimal::ZERO {
            return Ok(None);
        }

        if dry_run {
            return Ok(Some(breakdown.net));
        }

        // The claim is the idempotency gate: losing the insert race means
        // another run already paid this period.
        let Some(entry) = self
            .profit_log_repo
            .try_claim(
                position.id,
                breakdown.net,
                period_ending,
                weighted_pct,
                Some(breakdown.gross),
                Some(breakdown.fee),
            )
            .await
            .map_err(AppError::from)?
        else {
            return Ok(None);
        };

        // Past the claim, a partial failure leaves state for out-of-band
        // reconciliation; retrying inside this pass would risk paying twice.
        if let Err(e) = self
            .wallet_repo
            .credit(
                position.owner_id,
                "USD",
                breakdown.net,
                MovementSource::ProfitCredit,
                Some(&format!("investment:{}:{}", position.id, period_ending.date_naive())),
                "system",
            )
            .await
        {
            warn!(
                "Data integrity: profit log {} claimed but wallet credit failed for position {}: {}",
                entry.id, position.id, e
            );
            return Err(AppError::DataIntegrity(format!(
                "profit claimed but not credited for position {} period {}",
                position.id, period_ending
            )));
        }

        if let Err(e) = self
            .transaction_repo
            .record(
                position.owner_id,
                Some(position.id),
                TransactionType::Profit,
                breakdown.net,
                "USD",
                TransactionStatus::Completed,
                serde_json::json!({
                    "kind": "profit_credit",
                    "period_ending": period_ending,
                    "gross": breakdown.gross,
                    "fee": breakdown.fee,
                    "weighted_pct": weighted_pct,
                }),
            )
            .await
        {
            warn!(
                "Data integrity: profit credited but statement write failed for position {}: {}",
                position.id, e
            );
        }

        self.notifier
            .dispatch(
                position.owner_id,
                Notification::new(
                    NotificationKind::ProfitCredited,
                    "Profit credited",
                    format!(
                        "{} USD profit from your {} plan position",
                        breakdown.net, plan.name
                    ),
                ),
            )
            .await;

        if let Some(audit) = &self.audit {
            audit
                .log_profit_distributed(position.owner_id, &entry)
                .await?;
        }

        if let Err(e) = self
            .referral
            .on_profit_credited(position, plan, breakdown.net)
            .await
        {
            warn!(
                "Referral cascade failed for position {}: {}",
                position.id, e
            );
        }

        Ok(Some(breakdown.net))
    }

    /// Return principal to the owner's USD wallet and close the position.
    /// Returns true when the position matured in this pass.
    async fn release_principal(
        &self,
        position: &InvestmentPosition,
        dry_run: bool,
    ) -> AppResult<bool> {
        if dry_run {
            return Ok(true);
        }

        let already_released = self
            .transaction_repo
            .principal_release_exists(position.id)
            .await
            .map_err(AppError::from)?;

        if already_released {
            // Credit happened in an interrupted earlier pass; finish the
            // status transition only.
            warn!(
                "Position {} has a principal release on record but is still active; repairing status",
                position.id
            );
            self.investment_repo
                .mark_matured(position.id)
                .await
                .map_err(AppError::from)?;
            return Ok(true);
        }

        self.wallet_repo
            .credit(
                position.owner_id,
                "USD",
                position.principal,
                MovementSource::PrincipalReturn,
                Some(&format!("investment:{}", position.id)),
                "system",
            )
            .await
            .map_err(AppError::from)?;

        if let Err(e) = self
            .transaction_repo
            .record(
                position.owner_id,
                Some(position.id),
                TransactionType::Transfer,
                position.principal,
                "USD",
                TransactionStatus::Completed,
                serde_json::json!({ "kind": "principal_release" }),
            )
            .await
        {
            warn!(
                "Data integrity: principal credited but release record failed for position {}: {}",
                position.id, e
            );
        }

        self.investment_repo
            .mark_matured(position.id)
            .await
            .map_err(AppError::from)?;

        self.notifier
            .dispatch(
                position.owner_id,
                Notification::new(
                    NotificationKind::PrincipalReleased,
                    "Investment matured",
                    format!(
                        "{} USD principal returned to your wallet",
                        position.principal
                    ),
                ),
            )
            .await;

        if let Some(audit) = &self.audit {
            audit.log_principal_released(position).await?;
        }

        info!(
            "Position {} matured, {} USD principal released",
            position.id, position.principal
        );

        Ok(true)
    }

    /// Scheduled entry point: run a committing cycle on a fixed interval
    /// until the task is cancelled.
    pub async fn run_forever(self: Arc<Self>, interval: Duration) {
        let mut ticker = time::interval(interval);
        info!("Distribution scheduler started, running every {:?}", interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.run_cycle(CycleOptions::default()).await {
                error!("Scheduled distribution cycle failed: {}", e);
            }
        }
    }
}
