use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use fitpact_domain::check_in::{
    CheckIn, CheckInRepository, CheckInStatus, CheckInType, DayPlan, WorkoutPlanProvider,
};
use fitpact_domain::contract::{Contract, ContractRepository, ContractStatus, DayOutcome};
use fitpact_domain::deposit::{
    Currency, DepositRecord, DepositRepository, DepositStatus, PaymentMethod, RefundOutcome,
    UsageReason,
};
use fitpact_domain::notification::{NotificationKind, NotificationMessage, NotificationSender};
use fitpact_domain::payment::{
    ExternalRefund, PaymentCallback, PaymentGateway, PaymentIntent, PaymentOutcome,
};
use fitpact_domain::shared::{CheckInId, ContractId, DepositId, DomainError, UserId};

use crate::application::services::*;

// Mock repositories and collaborators for testing

struct MockDepositRepository {
    records: tokio::sync::RwLock<HashMap<String, DepositRecord>>,
}

impl MockDepositRepository {
    fn new() -> Self {
        Self {
            records: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl DepositRepository for MockDepositRepository {
    async fn save(&self, record: &DepositRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        records.insert(record.id().as_str().to_string(), record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &DepositId) -> Result<Option<DepositRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(id.as_str()).cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<DepositRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect())
    }
}

struct MockContractRepository {
    contracts: tokio::sync::RwLock<HashMap<String, Contract>>,
}

impl MockContractRepository {
    fn new() -> Self {
        Self {
            contracts: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl ContractRepository for MockContractRepository {
    async fn save(&self, contract: &Contract) -> Result<(), DomainError> {
        let mut contracts = self.contracts.write().await;
        contracts.insert(contract.id().as_str().to_string(), contract.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ContractId) -> Result<Option<Contract>, DomainError> {
        let contracts = self.contracts.read().await;
        Ok(contracts.get(id.as_str()).cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Contract>, DomainError> {
        let contracts = self.contracts.read().await;
        Ok(contracts
            .values()
            .filter(|c| c.user_id() == user_id)
            .cloned()
            .collect())
    }
}

struct MockCheckInRepository {
    check_ins: tokio::sync::RwLock<Vec<CheckIn>>,
}

impl MockCheckInRepository {
    fn new() -> Self {
        Self {
            check_ins: tokio::sync::RwLock::new(Vec::new()),
        }
    }

    async fn seed_approved(&self, contract_id: &ContractId, date: NaiveDate, types: &[CheckInType]) {
        let mut check_ins = self.check_ins.write().await;
        for check_in_type in types {
            check_ins.push(CheckIn::restore(
                CheckInId::new(),
                UserId::from_string("user-1"),
                contract_id.clone(),
                *check_in_type,
                Utc::now(),
                date,
                CheckInStatus::Approved,
            ));
        }
    }
}

#[async_trait::async_trait]
impl CheckInRepository for MockCheckInRepository {
    async fn save(&self, check_in: &CheckIn) -> Result<(), DomainError> {
        let mut check_ins = self.check_ins.write().await;
        check_ins.push(check_in.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CheckInId) -> Result<Option<CheckIn>, DomainError> {
        let check_ins = self.check_ins.read().await;
        Ok(check_ins.iter().find(|c| c.id() == id).cloned())
    }

    async fn find_by_contract_on_date(
        &self,
        contract_id: &ContractId,
        date: NaiveDate,
    ) -> Result<Vec<CheckIn>, DomainError> {
        let check_ins = self.check_ins.read().await;
        Ok(check_ins
            .iter()
            .filter(|c| c.contract_id() == contract_id && c.local_date() == date)
            .cloned()
            .collect())
    }
}

struct RecordingNotifier {
    messages: tokio::sync::RwLock<Vec<NotificationMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            messages: tokio::sync::RwLock::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            messages: tokio::sync::RwLock::new(Vec::new()),
            fail: true,
        }
    }

    async fn sent(&self) -> Vec<NotificationMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait::async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::Infrastructure(
                "notification channel down".to_string(),
            ));
        }
        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        Ok(())
    }
}

struct StubPlanProvider {
    plans: HashMap<NaiveDate, DayPlan>,
}

#[async_trait::async_trait]
impl WorkoutPlanProvider for StubPlanProvider {
    async fn day_plan(
        &self,
        _contract_id: &ContractId,
        date: NaiveDate,
    ) -> Result<DayPlan, DomainError> {
        Ok(self.plans.get(&date).copied().unwrap_or(DayPlan::Rest))
    }
}

mockall::mock! {
    Gateway {}

    #[async_trait::async_trait]
    impl PaymentGateway for Gateway {
        async fn create_payment_intent(
            &self,
            order_id: &str,
            amount: Decimal,
            method: PaymentMethod,
            description: &str,
        ) -> Result<PaymentIntent, DomainError>;

        async fn request_refund(
            &self,
            order_id: &str,
            transaction_id: &str,
            amount: Decimal,
            reason: &str,
        ) -> Result<ExternalRefund, DomainError>;
    }
}

fn stub_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment_intent().returning(|_, _, _, _| {
        Ok(PaymentIntent {
            payment_url: "https://pay.example/intent/1".to_string(),
            qr_code: "qr-data".to_string(),
        })
    });
    gateway.expect_request_refund().returning(|_, _, _, _| {
        Ok(ExternalRefund {
            refund_id: "ext-refund-1".to_string(),
        })
    });
    gateway
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Harness {
    deposit_repo: Arc<MockDepositRepository>,
    contract_repo: Arc<MockContractRepository>,
    check_in_repo: Arc<MockCheckInRepository>,
    notifier: Arc<RecordingNotifier>,
    ledger: Arc<DepositLedgerService>,
    violations: Arc<ViolationService>,
    progress: ContractProgressService,
    settlement: SettlementService,
}

fn build_harness(plans: HashMap<NaiveDate, DayPlan>) -> Harness {
    let deposit_repo = Arc::new(MockDepositRepository::new());
    let contract_repo = Arc::new(MockContractRepository::new());
    let check_in_repo = Arc::new(MockCheckInRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let contract_locks = Arc::new(KeyedLocks::new());

    let ledger = Arc::new(DepositLedgerService::new(
        deposit_repo.clone(),
        Arc::new(stub_gateway()),
        notifier.clone(),
    ));
    let violations = Arc::new(ViolationService::new(
        contract_repo.clone(),
        ledger.clone(),
        notifier.clone(),
        contract_locks.clone(),
    ));
    let progress = ContractProgressService::new(
        contract_repo.clone(),
        check_in_repo.clone(),
        Arc::new(StubPlanProvider { plans }),
        violations.clone(),
        contract_locks.clone(),
    );
    let settlement = SettlementService::new(
        contract_repo.clone(),
        ledger.clone(),
        notifier.clone(),
        contract_locks,
    );

    Harness {
        deposit_repo,
        contract_repo,
        check_in_repo,
        notifier,
        ledger,
        violations,
        progress,
        settlement,
    }
}

async fn seed_funded_deposit(harness: &Harness, amount: i64) -> DepositId {
    let mut record = DepositRecord::new(
        UserId::from_string("user-1"),
        Decimal::from(amount),
        Currency::Cny,
        PaymentMethod::Wechat,
        None,
    )
    .unwrap();
    record
        .confirm_payment("tx-seed", Utc::now(), PaymentOutcome::Success)
        .unwrap();
    harness.deposit_repo.save(&record).await.unwrap();
    record.id().clone()
}

async fn seed_active_contract(
    harness: &Harness,
    amount: i64,
    deposit_id: Option<DepositId>,
) -> ContractId {
    let mut contract = Contract::new(
        UserId::from_string("user-1"),
        Decimal::from(amount),
        date(2025, 3, 1),
        date(2025, 3, 21),
        deposit_id,
    )
    .unwrap();
    contract.activate().unwrap();
    harness.contract_repo.save(&contract).await.unwrap();
    contract.id().clone()
}

// Deposit ledger

#[tokio::test]
async fn test_create_deposit_returns_payment_intent() {
    let harness = build_harness(HashMap::new());

    let (record, intent) = harness
        .ledger
        .create(
            UserId::from_string("user-1"),
            Decimal::from(150),
            Currency::Cny,
            PaymentMethod::Wechat,
            None,
        )
        .await
        .unwrap();

    assert_eq!(record.available_amount(), Decimal::ZERO);
    assert!(record.expiry_date().is_some());
    assert_eq!(intent.payment_url, "https://pay.example/intent/1");

    let saved = harness.deposit_repo.find_by_id(record.id()).await.unwrap();
    assert!(saved.is_some());
}

#[tokio::test]
async fn test_create_deposit_rejects_non_positive_amount() {
    let harness = build_harness(HashMap::new());

    let result = harness
        .ledger
        .create(
            UserId::from_string("user-1"),
            Decimal::from(-5),
            Currency::Cny,
            PaymentMethod::Alipay,
            None,
        )
        .await;
    assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
}

#[tokio::test]
async fn test_confirm_payment_unlocks_balance_once() {
    let harness = build_harness(HashMap::new());
    let (record, _) = harness
        .ledger
        .create(
            UserId::from_string("user-1"),
            Decimal::from(150),
            Currency::Cny,
            PaymentMethod::Wechat,
            None,
        )
        .await
        .unwrap();

    let callback = PaymentCallback {
        order_id: record.id().as_str().to_string(),
        transaction_id: "tx-1".to_string(),
        status: PaymentOutcome::Success,
        payment_time: Utc::now(),
    };

    let confirmed = harness.ledger.confirm_payment(&callback).await.unwrap();
    assert_eq!(confirmed.available_amount(), Decimal::from(150));

    // A duplicate callback is rejected and changes nothing.
    let result = harness.ledger.confirm_payment(&callback).await;
    assert!(matches!(result, Err(DomainError::AlreadyFinalized(_))));

    let stored = harness
        .deposit_repo
        .find_by_id(record.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.available_amount(), Decimal::from(150));
}

#[tokio::test]
async fn test_record_usage_sequence_and_exhaustion() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 90).await;

    for _ in 0..2 {
        harness
            .ledger
            .record_usage(
                &deposit_id,
                Decimal::from(40),
                None,
                UsageReason::Penalty,
                "missed day",
            )
            .await
            .unwrap();
    }

    let result = harness
        .ledger
        .record_usage(
            &deposit_id,
            Decimal::from(20),
            None,
            UsageReason::Penalty,
            "missed day",
        )
        .await;
    assert!(matches!(result, Err(DomainError::InsufficientBalance(_))));

    let record = harness
        .ledger
        .record_usage(
            &deposit_id,
            Decimal::from(10),
            None,
            UsageReason::Transfer,
            "moved out",
        )
        .await
        .unwrap();
    assert_eq!(record.available_amount(), Decimal::ZERO);
    assert_eq!(record.status(), DepositStatus::Used);
}

#[tokio::test]
async fn test_concurrent_usage_cannot_overdraw() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 100).await;

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let ledger = harness.ledger.clone();
        let deposit_id = deposit_id.clone();
        tasks.push(tokio::spawn(async move {
            ledger
                .record_usage(
                    &deposit_id,
                    Decimal::from(60),
                    None,
                    UsageReason::Penalty,
                    "missed day",
                )
                .await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(DomainError::InsufficientBalance(_)) => insufficient += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    // The per-record lock serializes the two debits; only one can fit.
    assert_eq!(successes, 1);
    assert_eq!(insufficient, 1);

    let record = harness
        .deposit_repo
        .find_by_id(&deposit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.used_amount(), Decimal::from(60));
}

#[tokio::test]
async fn test_request_refund_exceeding_available_leaves_refund_unset() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 100).await;
    harness
        .ledger
        .record_usage(
            &deposit_id,
            Decimal::from(70),
            None,
            UsageReason::Penalty,
            "missed day",
        )
        .await
        .unwrap();

    let result = harness
        .ledger
        .request_refund(&deposit_id, Decimal::from(50), "early exit")
        .await;
    assert!(matches!(result, Err(DomainError::ExceedsAvailable(_))));

    let record = harness
        .deposit_repo
        .find_by_id(&deposit_id)
        .await
        .unwrap()
        .unwrap();
    assert!(record.refund_info().is_none());
}

#[tokio::test]
async fn test_refund_flow_and_notification() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 100).await;

    harness
        .ledger
        .request_refund(&deposit_id, Decimal::from(100), "contract done")
        .await
        .unwrap();

    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::RefundRequested);

    let record = harness
        .ledger
        .confirm_refund(&deposit_id, RefundOutcome::Completed)
        .await
        .unwrap();
    assert_eq!(record.status(), DepositStatus::Refunded);
    assert_eq!(record.refunded_amount(), Decimal::from(100));
}

#[tokio::test]
async fn test_notifier_failure_does_not_roll_back_refund_request() {
    let deposit_repo = Arc::new(MockDepositRepository::new());
    let ledger = DepositLedgerService::new(
        deposit_repo.clone(),
        Arc::new(stub_gateway()),
        Arc::new(RecordingNotifier::failing()),
    );

    let mut record = DepositRecord::new(
        UserId::from_string("user-1"),
        Decimal::from(100),
        Currency::Cny,
        PaymentMethod::Wechat,
        None,
    )
    .unwrap();
    record
        .confirm_payment("tx-seed", Utc::now(), PaymentOutcome::Success)
        .unwrap();
    deposit_repo.save(&record).await.unwrap();

    let result = ledger
        .request_refund(record.id(), Decimal::from(40), "partial")
        .await;
    assert!(result.is_ok());

    let stored = deposit_repo.find_by_id(record.id()).await.unwrap().unwrap();
    assert!(stored.refund_info().is_some());
}

#[tokio::test]
async fn test_get_stats_across_records() {
    let harness = build_harness(HashMap::new());
    let user_id = UserId::from_string("user-1");

    let first = seed_funded_deposit(&harness, 100).await;
    let _second = seed_funded_deposit(&harness, 50).await;

    harness
        .ledger
        .record_usage(
            &first,
            Decimal::from(30),
            None,
            UsageReason::Penalty,
            "missed day",
        )
        .await
        .unwrap();

    let stats = harness.ledger.get_stats(&user_id).await.unwrap();
    assert_eq!(stats.total_deposit, Decimal::from(150));
    assert_eq!(stats.record_count, 2);
    assert_eq!(stats.available_deposit, Decimal::from(120));
    assert_eq!(stats.total_refunded, Decimal::ZERO);
    assert_eq!(stats.frozen_deposit, Decimal::from(30));
    assert!(stats.last_deposit_at.is_some());
}

// Violation / penalty calculator

#[tokio::test]
async fn test_three_violations_match_the_hundred_scenario() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 100).await;
    let contract_id = seed_active_contract(&harness, 100, Some(deposit_id.clone())).await;

    for day in 2..5u32 {
        let outcome = harness
            .violations
            .apply_violation(&contract_id, date(2025, 3, day))
            .await
            .unwrap();
        assert_eq!(outcome.penalty_applied, Decimal::from(33));
        assert!(!outcome.already_recorded);
    }

    let contract = harness
        .contract_repo
        .find_by_id(&contract_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contract.violation_days(), 3);
    assert_eq!(contract.accumulated_penalty(), Decimal::from(99));
    assert_eq!(contract.remaining_amount(), Decimal::from(1));
    assert_eq!(contract.remaining_amount(), contract.remainder_amount());

    let deposit = harness
        .deposit_repo
        .find_by_id(&deposit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deposit.available_amount(), Decimal::from(1));
    assert_eq!(deposit.usage_history().len(), 3);

    let sent = harness.notifier.sent().await;
    assert_eq!(
        sent.iter()
            .filter(|m| m.kind == NotificationKind::ViolationRecorded)
            .count(),
        3
    );
}

#[tokio::test]
async fn test_apply_violation_same_date_is_benign_replay() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 100).await;
    let contract_id = seed_active_contract(&harness, 100, Some(deposit_id.clone())).await;

    harness
        .violations
        .apply_violation(&contract_id, date(2025, 3, 2))
        .await
        .unwrap();
    let replay = harness
        .violations
        .apply_violation(&contract_id, date(2025, 3, 2))
        .await
        .unwrap();

    assert!(replay.already_recorded);
    assert_eq!(replay.penalty_applied, Decimal::ZERO);

    let contract = harness
        .contract_repo
        .find_by_id(&contract_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contract.violation_days(), 1);
    assert_eq!(contract.accumulated_penalty(), Decimal::from(33));
}

#[tokio::test]
async fn test_apply_violation_requires_active_contract() {
    let harness = build_harness(HashMap::new());
    let contract_id = seed_active_contract(&harness, 100, None).await;
    harness
        .settlement
        .settle(&contract_id, ContractStatus::Cancelled)
        .await
        .unwrap();

    let result = harness
        .violations
        .apply_violation(&contract_id, date(2025, 3, 2))
        .await;
    assert!(matches!(result, Err(DomainError::ContractNotActive(_))));
}

#[tokio::test]
async fn test_penalty_capped_at_deposit_available() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 40).await;
    harness
        .ledger
        .record_usage(
            &deposit_id,
            Decimal::from(30),
            None,
            UsageReason::Transfer,
            "moved out",
        )
        .await
        .unwrap();
    let contract_id = seed_active_contract(&harness, 100, Some(deposit_id.clone())).await;

    let outcome = harness
        .violations
        .apply_violation(&contract_id, date(2025, 3, 2))
        .await
        .unwrap();

    // Flat penalty is 33 but only 10 was left; the violation is still
    // recorded with the partial charge.
    assert_eq!(outcome.penalty_applied, Decimal::from(10));

    let contract = harness
        .contract_repo
        .find_by_id(&contract_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contract.violation_days(), 1);
    assert_eq!(contract.accumulated_penalty(), Decimal::from(10));
}

// Contract progress tracker

#[tokio::test]
async fn test_workout_day_completed_exactly_once() {
    let day = date(2025, 3, 3);
    let mut plans = HashMap::new();
    plans.insert(day, DayPlan::Workout);
    let harness = build_harness(plans);
    let contract_id = seed_active_contract(&harness, 100, None).await;

    harness
        .check_in_repo
        .seed_approved(&contract_id, day, &[CheckInType::Gym, CheckInType::Protein])
        .await;

    let evaluation = harness
        .progress
        .evaluate_day(&contract_id, day, date(2025, 3, 3))
        .await
        .unwrap();
    assert_eq!(evaluation.outcome, DayOutcome::Completed);
    assert!(evaluation.state_changed);

    // Replays return the same outcome without counting twice.
    let replay = harness
        .progress
        .evaluate_day(&contract_id, day, date(2025, 3, 4))
        .await
        .unwrap();
    assert_eq!(replay.outcome, DayOutcome::Completed);
    assert!(!replay.state_changed);

    let contract = harness
        .contract_repo
        .find_by_id(&contract_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contract.completed_days(), 1);
}

#[tokio::test]
async fn test_elapsed_workout_day_missing_protein_is_violated() {
    let day = date(2025, 3, 3);
    let mut plans = HashMap::new();
    plans.insert(day, DayPlan::Workout);
    let harness = build_harness(plans);
    let deposit_id = seed_funded_deposit(&harness, 100).await;
    let contract_id = seed_active_contract(&harness, 100, Some(deposit_id.clone())).await;

    // Only the gym check-in was approved by end of day.
    harness
        .check_in_repo
        .seed_approved(&contract_id, day, &[CheckInType::Gym])
        .await;

    let evaluation = harness
        .progress
        .evaluate_day(&contract_id, day, date(2025, 3, 4))
        .await
        .unwrap();
    assert_eq!(evaluation.outcome, DayOutcome::Violated);
    assert_eq!(evaluation.penalty_applied, Decimal::from(33));

    let contract = harness
        .contract_repo
        .find_by_id(&contract_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contract.violation_days(), 1);
    assert_eq!(contract.completed_days(), 0);

    // Re-running the evaluation neither double-counts nor double-charges.
    let replay = harness
        .progress
        .evaluate_day(&contract_id, day, date(2025, 3, 5))
        .await
        .unwrap();
    assert_eq!(replay.outcome, DayOutcome::Violated);
    assert!(!replay.state_changed);

    let deposit = harness
        .deposit_repo
        .find_by_id(&deposit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deposit.used_amount(), Decimal::from(33));
}

#[tokio::test]
async fn test_rest_day_is_neutral() {
    let harness = build_harness(HashMap::new());
    let contract_id = seed_active_contract(&harness, 100, None).await;

    let evaluation = harness
        .progress
        .evaluate_day(&contract_id, date(2025, 3, 3), date(2025, 3, 10))
        .await
        .unwrap();
    assert_eq!(evaluation.outcome, DayOutcome::Neutral);
    assert!(!evaluation.state_changed);

    let contract = harness
        .contract_repo
        .find_by_id(&contract_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contract.completed_days(), 0);
    assert_eq!(contract.violation_days(), 0);
}

#[tokio::test]
async fn test_incomplete_today_stays_pending() {
    let day = date(2025, 3, 3);
    let mut plans = HashMap::new();
    plans.insert(day, DayPlan::ActiveRecovery);
    let harness = build_harness(plans);
    let contract_id = seed_active_contract(&harness, 100, None).await;

    let evaluation = harness
        .progress
        .evaluate_day(&contract_id, day, day)
        .await
        .unwrap();
    assert_eq!(evaluation.outcome, DayOutcome::Pending);
    assert!(!evaluation.state_changed);
}

// Settlement

#[tokio::test]
async fn test_settle_completed_refunds_remaining_deposit() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 100).await;
    let contract_id = seed_active_contract(&harness, 100, Some(deposit_id.clone())).await;

    // Two violations leave 33 forfeited twice; 34 stays on the deposit
    // (the remainder plus one uncharged third).
    for day in 2..4u32 {
        harness
            .violations
            .apply_violation(&contract_id, date(2025, 3, day))
            .await
            .unwrap();
    }

    let outcome = harness
        .settlement
        .settle(&contract_id, ContractStatus::Completed)
        .await
        .unwrap();
    assert_eq!(outcome.final_status, ContractStatus::Completed);
    assert_eq!(outcome.refund_requested, Decimal::from(34));
    assert!(!outcome.already_settled);

    let deposit = harness
        .deposit_repo
        .find_by_id(&deposit_id)
        .await
        .unwrap()
        .unwrap();
    let info = deposit.refund_info().unwrap();
    assert_eq!(info.refund_amount(), Decimal::from(34));

    let sent = harness.notifier.sent().await;
    assert!(sent
        .iter()
        .any(|m| m.kind == NotificationKind::ContractSettled));

    // Settling again is a no-op and requests nothing further.
    let replay = harness
        .settlement
        .settle(&contract_id, ContractStatus::Completed)
        .await
        .unwrap();
    assert!(replay.already_settled);
    assert_eq!(replay.refund_requested, Decimal::ZERO);
}

#[tokio::test]
async fn test_settle_failed_issues_no_refund() {
    let harness = build_harness(HashMap::new());
    let deposit_id = seed_funded_deposit(&harness, 100).await;
    let contract_id = seed_active_contract(&harness, 100, Some(deposit_id.clone())).await;

    let outcome = harness
        .settlement
        .settle(&contract_id, ContractStatus::Failed)
        .await
        .unwrap();
    assert_eq!(outcome.refund_requested, Decimal::ZERO);

    let deposit = harness
        .deposit_repo
        .find_by_id(&deposit_id)
        .await
        .unwrap()
        .unwrap();
    assert!(deposit.refund_info().is_none());
}
