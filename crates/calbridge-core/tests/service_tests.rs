use calbridge_core::datetime::DateInput;
use calbridge_core::enums::{
    AlarmMethod, AttendeeRole, AttendeeStatus, AttendeeType, CalendarAccessLevel,
    EventAvailability, EventStatus,
};
use calbridge_core::error::CoreError;
use calbridge_core::models::{AlarmRecord, AttendeeRecord, CalendarRecord, EventRecord, Source};
use calbridge_core::recurrence::{Frequency, RecurrenceRule, RecurrenceRuleRecord};
use calbridge_core::row::{columns, ColumnValue, Row};
use calbridge_core::service::CalendarService;
use calbridge_core::store::{InMemoryStore, RowStore, Selection, Table};

/// Helper function to create a service with one local calendar
async fn setup_service() -> (CalendarService<InMemoryStore>, i64) {
    let service = CalendarService::new(InMemoryStore::new());
    let calendar_id = service
        .create_calendar(&CalendarRecord {
            title: Some("Personal".to_string()),
            name: Some("personal".to_string()),
            color: Some("#3366CC".to_string()),
            time_zone: Some("Europe/Berlin".to_string()),
            allowed_reminders: vec![AlarmMethod::Alert, AlarmMethod::Email],
            source: Some(Source {
                name: Some("me@example.com".to_string()),
                is_local_account: true,
                ..Default::default()
            }),
            ..Default::default()
        })
        .await
        .expect("Failed to create test calendar");
    (service, calendar_id)
}

/// Helper function to build an event record in the test calendar
fn test_event(calendar_id: i64, title: &str) -> EventRecord {
    EventRecord {
        calendar_id: Some(calendar_id.to_string()),
        title: Some(title.to_string()),
        time_zone: Some("UTC".to_string()),
        start_date: Some("2025-01-01T09:00:00.000Z".into()),
        end_date: Some("2025-01-01T10:00:00.000Z".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_calendar_roundtrip() {
    let (service, calendar_id) = setup_service().await;

    let calendar = service
        .calendar(calendar_id)
        .await
        .unwrap()
        .expect("calendar exists");
    assert_eq!(calendar.id, Some(calendar_id.to_string()));
    assert_eq!(calendar.title.as_deref(), Some("Personal"));
    assert_eq!(calendar.color.as_deref(), Some("#3366CC"));
    assert_eq!(calendar.time_zone.as_deref(), Some("Europe/Berlin"));
    assert_eq!(calendar.access_level, Some(CalendarAccessLevel::Owner));
    assert_eq!(calendar.owner_account.as_deref(), Some("me@example.com"));
    assert_eq!(
        calendar.allowed_reminders,
        vec![AlarmMethod::Alert, AlarmMethod::Email]
    );
    assert!(calendar.allows_modifications);
    assert!(calendar.source.unwrap().is_local_account);

    assert_eq!(service.calendars().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_calendar_requires_source_name() {
    let service = CalendarService::new(InMemoryStore::new());
    let result = service
        .create_calendar(&CalendarRecord {
            title: Some("Work".to_string()),
            name: Some("work".to_string()),
            color: Some("#000000".to_string()),
            source: Some(Source::default()),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(CoreError::InvalidInput(_))));
}

#[tokio::test]
async fn test_save_and_get_event() {
    let (service, calendar_id) = setup_service().await;

    let mut record = test_event(calendar_id, "Planning");
    record.availability = Some(EventAvailability::Free);
    record.status = Some(EventStatus::Tentative);
    record.alarms = Some(vec![AlarmRecord {
        relative_offset: -15,
        method: Some(AlarmMethod::Alert),
    }]);
    let id = service.save_event(&record).await.unwrap();

    let event = service.get_event(id).await.unwrap().expect("event exists");
    assert_eq!(event.id, Some(id.to_string()));
    assert_eq!(event.title.as_deref(), Some("Planning"));
    assert_eq!(event.start_date, Some(DateInput::from("2025-01-01T09:00:00.000Z")));
    assert_eq!(event.end_date, Some(DateInput::from("2025-01-01T10:00:00.000Z")));
    assert_eq!(event.availability, Some(EventAvailability::Free));
    assert_eq!(event.status, Some(EventStatus::Tentative));
    assert_eq!(
        event.alarms,
        Some(vec![AlarmRecord {
            relative_offset: -15,
            method: Some(AlarmMethod::Alert)
        }])
    );
}

#[tokio::test]
async fn test_save_accepts_epoch_millis() {
    let (service, calendar_id) = setup_service().await;

    let mut record = test_event(calendar_id, "Launch");
    record.start_date = Some(DateInput::Millis(1_700_000_000_000));
    record.end_date = Some(DateInput::Millis(1_700_003_600_000));
    let id = service.save_event(&record).await.unwrap();

    let event = service.get_event(id).await.unwrap().unwrap();
    assert_eq!(event.start_date, Some(DateInput::from("2023-11-14T22:13:20.000Z")));
}

#[tokio::test]
async fn test_insert_requires_existing_calendar() {
    let (service, _) = setup_service().await;

    let mut record = test_event(0, "Orphan");
    record.calendar_id = None;
    assert!(matches!(
        service.save_event(&record).await,
        Err(CoreError::InvalidInput(_))
    ));

    let record = test_event(999, "Orphan");
    assert!(matches!(
        service.save_event(&record).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_unparseable_date_is_rejected() {
    let (service, calendar_id) = setup_service().await;
    let mut record = test_event(calendar_id, "Broken");
    record.start_date = Some("2025-01-01 09:00".into());
    assert!(matches!(
        service.save_event(&record).await,
        Err(CoreError::InvalidDate(_))
    ));
}

#[tokio::test]
async fn test_unbounded_recurrence_stores_duration() {
    let (service, calendar_id) = setup_service().await;

    let mut record = test_event(calendar_id, "Gym");
    record.recurrence_rule = Some(RecurrenceRuleRecord::from(RecurrenceRule::new(
        Frequency::Daily,
    )));
    let id = service.save_event(&record).await.unwrap();

    let rows = service
        .store()
        .query(Table::Events, &Selection::by_id(id))
        .await
        .unwrap();
    let row = &rows[0];
    assert_eq!(row.opt_string(columns::RRULE).as_deref(), Some("FREQ=DAILY"));
    assert_eq!(row.opt_string(columns::DURATION).as_deref(), Some("PT3600S"));
    assert_eq!(row.get(columns::DTEND), Some(&ColumnValue::Null));
    assert_eq!(row.get(columns::LAST_DATE), Some(&ColumnValue::Null));

    // Reading back derives the end from the duration.
    let event = service.get_event(id).await.unwrap().unwrap();
    assert_eq!(event.end_date, Some(DateInput::from("2025-01-01T10:00:00.000Z")));
    let rule = event.recurrence_rule.unwrap();
    assert_eq!(rule.frequency.as_deref(), Some("daily"));
    assert_eq!(rule.occurrence, None);
}

#[tokio::test]
async fn test_list_events_expands_series() {
    let (service, calendar_id) = setup_service().await;

    let mut record = test_event(calendar_id, "Standup");
    record.recurrence_rule = Some(RecurrenceRuleRecord::from(
        RecurrenceRule::new(Frequency::Weekly).with_interval(2).count(3),
    ));
    let id = service.save_event(&record).await.unwrap();
    service
        .save_event(&test_event(calendar_id, "One-off"))
        .await
        .unwrap();

    let events = service
        .list_events(
            &[calendar_id.to_string()],
            &"2025-01-01T00:00:00.000Z".into(),
            &"2025-03-01T00:00:00.000Z".into(),
        )
        .await
        .unwrap();

    let starts: Vec<_> = events
        .iter()
        .filter(|e| e.id == Some(id.to_string()))
        .map(|e| e.start_date.clone().unwrap())
        .collect();
    assert_eq!(
        starts,
        vec![
            DateInput::from("2025-01-01T09:00:00.000Z"),
            DateInput::from("2025-01-15T09:00:00.000Z"),
            DateInput::from("2025-01-29T09:00:00.000Z"),
        ]
    );
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.instance_id.is_some()));

    let other_calendar = service
        .list_events(
            &["999".to_string()],
            &"2025-01-01T00:00:00.000Z".into(),
            &"2025-03-01T00:00:00.000Z".into(),
        )
        .await
        .unwrap();
    assert!(other_calendar.is_empty());
}

#[tokio::test]
async fn test_delete_instance_writes_canceled_exception() {
    let (service, calendar_id) = setup_service().await;

    let mut record = test_event(calendar_id, "Daily");
    record.recurrence_rule = Some(RecurrenceRuleRecord::from(
        RecurrenceRule::new(Frequency::Daily).count(3),
    ));
    let id = service.save_event(&record).await.unwrap();

    let deleted = service
        .delete_event(id, Some(&"2025-01-02T09:00:00.000Z".into()))
        .await
        .unwrap();
    assert!(deleted);

    let exceptions = service
        .store()
        .query(Table::Events, &Selection::new().eq(columns::ORIGINAL_ID, id))
        .await
        .unwrap();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(
        exceptions[0].opt_int(columns::STATUS),
        EventStatus::Canceled.to_platform()
    );
    assert_eq!(
        exceptions[0].opt_int(columns::ORIGINAL_INSTANCE_TIME),
        1_735_808_400_000
    );

    let events = service
        .list_events(
            &[],
            &"2025-01-01T00:00:00.000Z".into(),
            &"2025-01-10T00:00:00.000Z".into(),
        )
        .await
        .unwrap();
    let starts: Vec<_> = events.iter().filter_map(|e| e.start_date.clone()).collect();
    assert_eq!(
        starts,
        vec![
            DateInput::from("2025-01-01T09:00:00.000Z"),
            DateInput::from("2025-01-03T09:00:00.000Z"),
        ]
    );
}

#[tokio::test]
async fn test_delete_whole_event() {
    let (service, calendar_id) = setup_service().await;
    let id = service
        .save_event(&test_event(calendar_id, "Temp"))
        .await
        .unwrap();

    assert!(service.delete_event(id, None).await.unwrap());
    assert!(service.get_event(id).await.unwrap().is_none());
    assert!(!service.delete_event(id, None).await.unwrap());
}

#[tokio::test]
async fn test_update_event_merges_and_nulls() {
    let (service, calendar_id) = setup_service().await;

    let mut record = test_event(calendar_id, "Review");
    record.notes = Some("bring slides".to_string());
    record.location = Some("Room 1".to_string());
    let id = service.save_event(&record).await.unwrap();

    let patch = EventRecord {
        title: Some("Design review".to_string()),
        ..Default::default()
    };
    let updated = service.update_event(id, &patch, &["notes"]).await.unwrap();
    assert_eq!(updated.title.as_deref(), Some("Design review"));
    assert_eq!(updated.notes, None);
    assert_eq!(updated.location.as_deref(), Some("Room 1"));
    assert_eq!(updated.start_date, Some(DateInput::from("2025-01-01T09:00:00.000Z")));
}

#[tokio::test]
async fn test_update_missing_event() {
    let (service, _) = setup_service().await;
    let result = service
        .update_event(42, &EventRecord::default(), &[])
        .await;
    assert!(matches!(result, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn test_saving_alarms_replaces_existing() {
    let (service, calendar_id) = setup_service().await;

    let mut record = test_event(calendar_id, "Dentist");
    record.alarms = Some(vec![
        AlarmRecord {
            relative_offset: -60,
            method: Some(AlarmMethod::Email),
        },
        AlarmRecord {
            relative_offset: -10,
            method: None,
        },
    ]);
    let id = service.save_event(&record).await.unwrap();
    assert_eq!(service.alarms(id).await.unwrap().len(), 2);

    let update = EventRecord {
        id: Some(id.to_string()),
        time_zone: Some("UTC".to_string()),
        alarms: Some(vec![AlarmRecord {
            relative_offset: -5,
            method: Some(AlarmMethod::Alert),
        }]),
        ..Default::default()
    };
    service.save_event(&update).await.unwrap();

    assert_eq!(
        service.alarms(id).await.unwrap(),
        vec![AlarmRecord {
            relative_offset: -5,
            method: Some(AlarmMethod::Alert)
        }]
    );
}

#[tokio::test]
async fn test_attendees() {
    let (service, calendar_id) = setup_service().await;
    let id = service
        .save_event(&test_event(calendar_id, "Offsite"))
        .await
        .unwrap();

    service
        .add_attendee(
            id,
            &AttendeeRecord {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                role: Some(AttendeeRole::Speaker),
                status: Some(AttendeeStatus::Accepted),
                attendee_type: Some(AttendeeType::Required),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let attendees = service.attendees(id).await.unwrap();
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0].email.as_deref(), Some("ada@example.com"));
    assert_eq!(attendees[0].role, Some(AttendeeRole::Speaker));
    assert_eq!(attendees[0].status, Some(AttendeeStatus::Accepted));

    assert!(service.attendees(id + 100).await.unwrap().is_empty());
    assert!(matches!(
        service.add_attendee(9_999, &AttendeeRecord::default()).await,
        Err(CoreError::NotFound(_))
    ));
}
