//! Service-level tests against a live Postgres instance.
//!
//! Run with `cargo test -- --ignored --test-threads=1` after pointing
//! TEST_DATABASE_URL at a scratch database.

mod helpers;

use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use vestra_backend::models::*;
use vestra_backend::services::*;

// ============================================================================
// Investment creation workflow
// ============================================================================

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_create_investment_activates_when_funded() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(500), 28, dec!(5)).await;
        fund_wallet(&db, user.id, "USD", dec!(1000)).await;

        let outcome = db
            .investment_service()
            .create_investment(user.id, &plan.slug, dec!(250), "USD")
            .await
            .unwrap();

        assert_eq!(outcome.status, CreateStatus::Active);
        assert_eq!(outcome.position.principal, dec!(250));
        assert_eq!(outcome.position.status(), PositionStatus::Active);
        assert!(outcome.diagnostics.is_none());

        // Wallet debited through the ledger
        let balance = db.wallet_repo.balance_of(user.id, "USD").await.unwrap();
        assert_eq!(balance, dec!(750));

        // Funding statement recorded as completed
        let transactions = db
            .transaction_repo
            .find_by_investment(outcome.position.id)
            .await
            .unwrap();
        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].is_completed());
        assert_eq!(transactions[0].reference_kind(), Some("investment_funding"));
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_insufficient_funds_produce_pending_without_mutation() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(500), 28, dec!(5)).await;
        fund_wallet(&db, user.id, "USD", dec!(50)).await;

        let outcome = db
            .investment_service()
            .create_investment(user.id, &plan.slug, dec!(100), "USD")
            .await
            .unwrap();

        assert_eq!(outcome.status, CreateStatus::Pending);
        assert_eq!(outcome.position.status(), PositionStatus::Pending);

        let diagnostics = outcome.diagnostics.expect("pending outcome carries detail");
        assert_eq!(diagnostics.available_usd, dec!(50));
        assert_eq!(diagnostics.requested_usd, dec!(100));

        // No wallet was touched
        let balance = db.wallet_repo.balance_of(user.id, "USD").await.unwrap();
        assert_eq!(balance, dec!(50));
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_amount_range_is_inclusive() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(500), 28, dec!(5)).await;
        fund_wallet(&db, user.id, "USD", dec!(2000)).await;

        let service = db.investment_service();

        // Both boundaries are valid
        let at_min = service
            .create_investment(user.id, &plan.slug, dec!(100), "USD")
            .await
            .unwrap();
        assert_eq!(at_min.status, CreateStatus::Active);

        let at_max = service
            .create_investment(user.id, &plan.slug, dec!(500), "USD")
            .await
            .unwrap();
        assert_eq!(at_max.status, CreateStatus::Active);

        // A cent outside either bound is rejected before any mutation
        let below = service
            .create_investment(user.id, &plan.slug, dec!(99.99), "USD")
            .await
            .unwrap_err();
        assert!(matches!(
            below,
            vestra_backend::AppError::AmountOutOfRange { .. }
        ));

        let above = service
            .create_investment(user.id, &plan.slug, dec!(500.01), "USD")
            .await
            .unwrap_err();
        assert!(matches!(
            above,
            vestra_backend::AppError::AmountOutOfRange { .. }
        ));
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_multi_wallet_funding_conserves_value() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(500), 28, dec!(5)).await;
        fund_wallet(&db, user.id, "EUR", dec!(40)).await;
        fund_wallet(&db, user.id, "USD", dec!(30)).await;
        fund_wallet(&db, user.id, "GBP", dec!(50)).await;

        let wallet_service = db.wallet_service();
        let before = wallet_service.total_available_usd(user.id).await.unwrap();

        let outcome = db
            .investment_service()
            .create_investment(user.id, &plan.slug, dec!(100), "USD")
            .await
            .unwrap();
        assert_eq!(outcome.status, CreateStatus::Active);

        let after = wallet_service.total_available_usd(user.id).await.unwrap();
        let debited = before - after;
        assert!(
            (debited - outcome.position.principal).abs() <= dec!(0.000001),
            "debited {debited}, principal {}",
            outcome.position.principal
        );
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_compensation_restores_exact_balances() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        fund_wallet(&db, user.id, "EUR", dec!(200)).await;
        fund_wallet(&db, user.id, "USD", dec!(300)).await;

        let eur_wallet = db.wallet_repo.find_or_create(user.id, "EUR").await.unwrap();
        let usd_wallet = db.wallet_repo.find_or_create(user.id, "USD").await.unwrap();

        // Two debits of a funding sequence that will not complete
        let debits = vec![
            PlannedDebit {
                wallet_id: eur_wallet.id,
                currency: "EUR".to_string(),
                native_amount: dec!(150),
                usd_amount: dec!(163.5),
            },
            PlannedDebit {
                wallet_id: usd_wallet.id,
                currency: "USD".to_string(),
                native_amount: dec!(100),
                usd_amount: dec!(100),
            },
        ];
        for debit in &debits {
            db.wallet_repo
                .debit(
                    user.id,
                    &debit.currency,
                    debit.native_amount,
                    MovementSource::InvestmentCreation,
                    None,
                    "system",
                )
                .await
                .unwrap();
        }

        db.investment_service()
            .compensate_debits(user.id, &debits)
            .await;

        // Both wallets end exactly where they started
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "EUR").await.unwrap(),
            dec!(200)
        );
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            dec!(300)
        );

        // The refunds are on the movement log, tagged as rollbacks
        let movements = db.wallet_repo.movements_for(eur_wallet.id, 10).await.unwrap();
        assert!(movements
            .iter()
            .any(|m| m.source() == Some(MovementSource::Rollback)));
    })
    .await;
}

// ============================================================================
// Profit distribution cycle
// ============================================================================

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_flat_payout_scenario() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(5000), 14, dec!(10)).await;
        let position = create_active_position(&db, user.id, plan.id, dec!(1000), 8).await;

        let summary = db
            .distribution_service()
            .run_cycle(CycleOptions::default())
            .await
            .unwrap();

        // Week 1 pays 1000 * 10% * 95% = 95.00; week 2 is not yet due
        assert_eq!(summary.credited_count, 1);
        assert_eq!(summary.total_profit, dec!(95));
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            dec!(95)
        );

        let entries = db.profit_log_repo.entries_for(position.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, dec!(95));
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_cycle_is_idempotent_per_period() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(5000), 14, dec!(10)).await;
        let position = create_active_position(&db, user.id, plan.id, dec!(1000), 8).await;

        let service = db.distribution_service();
        let first = service.run_cycle(CycleOptions::default()).await.unwrap();
        assert_eq!(first.credited_count, 1);

        // Second pass over the same period credits nothing
        let second = service.run_cycle(CycleOptions::default()).await.unwrap();
        assert_eq!(second.credited_count, 0);
        assert_eq!(second.total_profit, Decimal::ZERO);

        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            dec!(95)
        );
        assert_eq!(
            db.profit_log_repo.entries_for(position.id).await.unwrap().len(),
            1
        );
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_maturity_releases_principal_exactly_once() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        // Zero-rate plan isolates the maturity path
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(5000), 14, Decimal::ZERO).await;
        let position = create_active_position(&db, user.id, plan.id, dec!(1000), 15).await;

        let service = db.distribution_service();
        let summary = service.run_cycle(CycleOptions::default()).await.unwrap();

        assert_eq!(summary.matured_count, 1);
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            dec!(1000)
        );

        let refreshed = db
            .investment_repo
            .find_by_id(position.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.status(), PositionStatus::Matured);

        // A matured position is out of the batch; nothing is re-credited
        let again = service.run_cycle(CycleOptions::default()).await.unwrap();
        assert_eq!(again.matured_count, 0);
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            dec!(1000)
        );
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_referral_cascade_credits_referrer() {
    with_test_db(|db| async move {
        let referrer = create_test_user(&db, None).await;
        let investor = create_test_user(&db, Some(referrer.id)).await;
        let plan = create_test_plan(&db, "pro", dec!(100), dec!(5000), 14, dec!(10)).await;
        create_active_position(&db, investor.id, plan.id, dec!(1000), 8).await;

        db.distribution_service()
            .run_cycle(CycleOptions::default())
            .await
            .unwrap();

        // Pro tier pays 7% of the 95 net credit
        assert_eq!(
            db.wallet_repo.balance_of(referrer.id, "USD").await.unwrap(),
            dec!(6.65)
        );

        let statement = db.transaction_repo.history_for(referrer.id, 10).await.unwrap();
        assert_eq!(statement.len(), 1);
        assert_eq!(statement[0].reference_kind(), Some("referral_bonus"));
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_dry_run_matches_committing_arithmetic_and_writes_nothing() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(5000), 14, dec!(10)).await;
        let position = create_active_position(&db, user.id, plan.id, dec!(1000), 8).await;

        let service = db.distribution_service();

        let forecast = service
            .run_cycle(CycleOptions {
                dry_run: true,
                week_ending: None,
            })
            .await
            .unwrap();

        // Nothing was written
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            Decimal::ZERO
        );
        assert!(db
            .profit_log_repo
            .entries_for(position.id)
            .await
            .unwrap()
            .is_empty());
        let reserve = db.reserve_repo.get().await.unwrap();
        assert_eq!(reserve.current_amount, Decimal::ZERO);

        // Committing run produces the same numbers
        let committed = service.run_cycle(CycleOptions::default()).await.unwrap();
        assert_eq!(forecast.total_profit, committed.total_profit);
        assert_eq!(forecast.total_aum, committed.total_aum);
        assert_eq!(forecast.credited_count, committed.credited_count);
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_stream_weighted_payout() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_weighted_plan(
            &db,
            dec!(100),
            dec!(5000),
            14,
            serde_json::json!({"alpha": 50, "beta": 30, "gamma": 20}),
        )
        .await;
        let position = create_active_position(&db, user.id, plan.id, dec!(1000), 8).await;

        let feed = Arc::new(SnapshotPerformanceFeed::new());
        feed.set_snapshot(HashMap::from([
            ("alpha".to_string(), dec!(2)),
            ("beta".to_string(), dec!(4)),
            // gamma missing from the snapshot: contributes zero
        ]))
        .await;

        let service = db.distribution_service_with(feed, Decimal::ZERO, false);
        let summary = service.run_cycle(CycleOptions::default()).await.unwrap();

        // 0.50*2 + 0.30*4 + 0.20*0 = 2.2% of 1000 = 22, no fee
        assert_eq!(summary.credited_count, 1);
        assert_eq!(summary.total_profit, dec!(22));

        let entries = db.profit_log_repo.entries_for(position.id).await.unwrap();
        assert_eq!(entries[0].weighted_pct, Some(dec!(2.2)));
        assert_eq!(entries[0].gross_profit, Some(dec!(22)));
        assert_eq!(entries[0].fee, Some(Decimal::ZERO));
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_kyc_gate_skips_unapproved_owner() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(5000), 14, dec!(10)).await;
        create_active_position(&db, user.id, plan.id, dec!(1000), 8).await;

        let feed = Arc::new(SnapshotPerformanceFeed::new());
        let service = db.distribution_service_with(feed, dec!(5), true);

        let gated = service.run_cycle(CycleOptions::default()).await.unwrap();
        assert_eq!(gated.skipped_count, 1);
        assert_eq!(gated.credited_count, 0);
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            Decimal::ZERO
        );

        // Approval lifts the gate on the next pass
        db.user_repo.set_kyc_approved(user.id, true).await.unwrap();
        let approved = service.run_cycle(CycleOptions::default()).await.unwrap();
        assert_eq!(approved.credited_count, 1);
        assert_eq!(
            db.wallet_repo.balance_of(user.id, "USD").await.unwrap(),
            dec!(95)
        );
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_week_ending_backdates_eligibility() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(5000), 28, dec!(10)).await;
        let position = create_active_position(&db, user.id, plan.id, dec!(1000), 30).await;

        // As of one week plus an hour after start, only week 1 is due
        let as_of = position.start_date + chrono::Duration::days(7) + chrono::Duration::hours(1);
        let summary = db
            .distribution_service()
            .run_cycle(CycleOptions {
                dry_run: false,
                week_ending: Some(as_of),
            })
            .await
            .unwrap();

        assert_eq!(summary.credited_count, 1);
        assert_eq!(summary.matured_count, 0);
    })
    .await;
}

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_reserve_and_aum_updated_together() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let plan = create_test_plan(&db, "starter", dec!(100), dec!(5000), 14, dec!(10)).await;
        create_active_position(&db, user.id, plan.id, dec!(1000), 8).await;

        db.distribution_service()
            .run_cycle(CycleOptions::default())
            .await
            .unwrap();

        let reserve = db.reserve_repo.get().await.unwrap();
        assert_eq!(reserve.current_amount, dec!(95));
        assert_eq!(reserve.total_aum, dec!(1000));
        assert_eq!(reserve.coverage_ratio(), Some(dec!(0.095)));
    })
    .await;
}

// ============================================================================
// Wallet service (deposits / withdrawals)
// ============================================================================

#[tokio::test]
#[ignore = "requires a Postgres instance (TEST_DATABASE_URL)"]
async fn test_deposit_and_withdrawal_flow() {
    with_test_db(|db| async move {
        let user = create_test_user(&db, None).await;
        let service = db.wallet_service();

        service
            .record_deposit(user.id, dec!(100), "EUR", "prov-123")
            .await
            .unwrap();
        assert_eq!(service.balance_of(user.id, "EUR").await.unwrap(), dec!(100));

        // Over-withdrawal is rejected before mutation
        let err = service
            .request_withdrawal(user.id, dec!(150), "EUR")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            vestra_backend::AppError::InsufficientFunds { .. }
        ));
        assert_eq!(service.balance_of(user.id, "EUR").await.unwrap(), dec!(100));

        let withdrawal = service
            .request_withdrawal(user.id, dec!(40), "EUR")
            .await
            .unwrap();
        assert_eq!(withdrawal.status(), Some(TransactionStatus::Pending));
        assert_eq!(service.balance_of(user.id, "EUR").await.unwrap(), dec!(60));
    })
    .await;
}
