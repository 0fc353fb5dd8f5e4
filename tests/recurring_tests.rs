mod support;

use carpool_backend::entities::ride;
use carpool_backend::entities::user::UserRole;
use carpool_backend::error::AppError;
use carpool_backend::services::recurring::{create_template, NewTemplate};
use carpool_backend::services::Place;
use chrono::{Datelike, NaiveTime, Utc, Weekday};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use support::*;

fn weekday_commute(days: Vec<i64>) -> NewTemplate {
    NewTemplate {
        origin: Place::new("Model Town"),
        destination: Place::at("FCCU", FCCU.0, FCCU.1),
        departure_time_of_day: "09:30:00".to_string(),
        days_of_week: days,
        total_seats: 3,
    }
}

#[tokio::test]
async fn saturday_template_covers_the_next_work_week() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let saturday = pkt_at(2026, 10, 17, 10, 0);
    assert_eq!(saturday.weekday(), Weekday::Sat);

    let expanded = create_template(
        &db,
        driver.id,
        weekday_commute(vec![0, 1, 2, 3, 4]),
        saturday.with_timezone(&Utc),
        pkt(),
    )
    .await
    .expect("create template");

    assert_eq!(expanded.template.days_of_week, "0,1,2,3,4");
    assert_eq!(expanded.rides.len(), 5);

    let local: Vec<_> = expanded
        .rides
        .iter()
        .map(|r| r.departure_time.with_timezone(&pkt()))
        .collect();
    let days: Vec<u32> = local.iter().map(|d| d.day()).collect();
    assert_eq!(days, vec![19, 20, 21, 22, 23]);
    assert!(local
        .iter()
        .all(|d| d.time() == NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
    assert!(expanded.rides.iter().all(|r| r.is_recurring
        && r.recurring_id == Some(expanded.template.id)
        && r.available_seats == 3));

    let stored = ride::Entity::find()
        .filter(ride::Column::RecurringId.eq(expanded.template.id))
        .count(&db)
        .await
        .expect("count rides");
    assert_eq!(stored, 5);
}

#[tokio::test]
async fn todays_slot_is_kept_only_while_in_the_future() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;

    let monday_morning = pkt_at(2026, 10, 19, 8, 0).with_timezone(&Utc);
    let expanded = create_template(&db, driver.id, weekday_commute(vec![0]), monday_morning, pkt())
        .await
        .expect("create template");
    assert_eq!(expanded.rides.len(), 1);
    assert_eq!(
        expanded.rides[0].departure_time.with_timezone(&pkt()).day(),
        19
    );

    let monday_noon = pkt_at(2026, 10, 19, 12, 0).with_timezone(&Utc);
    let expanded = create_template(
        &db,
        driver.id,
        weekday_commute(vec![0, 6]),
        monday_noon,
        pkt(),
    )
    .await
    .expect("create template");
    // Only Sunday the 25th; today's 09:30 has passed and next Monday is outside the week
    assert_eq!(expanded.rides.len(), 1);
    assert_eq!(
        expanded.rides[0].departure_time.with_timezone(&pkt()).weekday(),
        Weekday::Sun
    );
}

#[tokio::test]
async fn template_input_is_validated() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_user(&db, "Rider", UserRole::Rider).await;
    let now = Utc::now();

    let empty = create_template(&db, driver.id, weekday_commute(vec![]), now, pkt()).await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let bad_day = create_template(&db, driver.id, weekday_commute(vec![1, 7]), now, pkt()).await;
    assert!(matches!(bad_day, Err(AppError::Validation(_))));

    let mut bad_time = weekday_commute(vec![1]);
    bad_time.departure_time_of_day = "25:00".to_string();
    let result = create_template(&db, driver.id, bad_time, now, pkt()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let mut no_seats = weekday_commute(vec![1]);
    no_seats.total_seats = 0;
    let result = create_template(&db, driver.id, no_seats, now, pkt()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let by_rider = create_template(&db, rider.id, weekday_commute(vec![1]), now, pkt()).await;
    assert!(matches!(by_rider, Err(AppError::ForbiddenRole(_))));

    let stored = ride::Entity::find().count(&db).await.expect("count rides");
    assert_eq!(stored, 0);
}
