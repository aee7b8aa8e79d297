use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};

use fitpact_domain::check_in::{CheckIn, CheckInRepository, CheckInStatus, CheckInType};
use fitpact_domain::shared::{ContractId, UserId};
use fitpact_infrastructure::persistence::repositories::SqliteCheckInRepository;

mod test_helpers;

#[tokio::test]
async fn check_in_repo_roundtrip_and_date_query() {
    let db = test_helpers::setup_in_memory_db().await;
    let repo = SqliteCheckInRepository::new(Arc::new(db.pool().clone()));

    let contract_id = ContractId::new();
    let offset = FixedOffset::east_opt(8 * 3600).unwrap();

    let mut gym = CheckIn::new(
        UserId::from_string("user-1"),
        contract_id.clone(),
        CheckInType::Gym,
        Utc::now(),
        offset,
    );
    let protein = CheckIn::new(
        UserId::from_string("user-1"),
        contract_id.clone(),
        CheckInType::Protein,
        Utc::now(),
        offset,
    );

    repo.save(&gym).await.expect("save gym");
    repo.save(&protein).await.expect("save protein");

    // Review transition is persisted through the same upsert.
    gym.approve().expect("approve");
    repo.save(&gym).await.expect("save approved");

    let fetched = repo
        .find_by_id(gym.id())
        .await
        .expect("find")
        .expect("should exist");
    assert_eq!(fetched.status(), CheckInStatus::Approved);
    assert_eq!(fetched.check_in_type(), CheckInType::Gym);

    let today = fetched.local_date();
    let on_day = repo
        .find_by_contract_on_date(&contract_id, today)
        .await
        .expect("query by date");
    assert_eq!(on_day.len(), 2);

    let none = repo
        .find_by_contract_on_date(&contract_id, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        .await
        .expect("query empty date");
    assert!(none.is_empty());
}
