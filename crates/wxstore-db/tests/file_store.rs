use wxstore_core::{FieldValue, TableSchema, WeatherRecord};
use wxstore_db::{DataStore, DbError, StatementKind};

fn record(station: &str, date: &str) -> WeatherRecord {
    WeatherRecord {
        id: WeatherRecord::make_id(station, date),
        name: "NEWARK LIBERTY INTERNATIONAL AIRPORT, NJ US".into(),
        latitude: 40.6825.into(),
        longitude: (-74.1694).into(),
        dew: "-0056,1".into(),
        slp: "10234,1".into(),
        tmp: "+0011,1".into(),
        vis: "016000,1,9,9".into(),
        wnd: "320,1,N,0057,1".into(),
    }
}

#[test]
fn rows_survive_scope_bound_release() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data.db");
    let schema = TableSchema::weather("datasource");

    {
        let mut store = DataStore::open(&db_path).unwrap();
        assert_eq!(store.path(), db_path.as_path());
        store.create_weather_table(&schema).unwrap();
        store
            .insert_record(&schema, &record("72502", "2020-01-01"))
            .unwrap();
        // dropped here without an explicit close
    }

    let store = DataStore::open(&db_path).unwrap();
    let records = store.records(&schema).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "72502,2020-01-01");
}

#[test]
fn explicit_close_then_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data.db");
    let schema = TableSchema::weather("datasource");

    let mut store = DataStore::open(&db_path).unwrap();
    store.create_weather_table(&schema).unwrap();
    store.close().unwrap();
    assert!(matches!(
        store.load_frame(&schema),
        Err(DbError::ConnectionClosed)
    ));

    let mut store = DataStore::open(&db_path).unwrap();
    store
        .execute_one(
            StatementKind::Insert,
            &schema.insert_statement(),
            &record("72503", "2020-01-02").into_row(),
        )
        .unwrap();
    let row = store
        .query_one(
            "SELECT name, latitude FROM datasource WHERE id = ?1",
            &["72503,2020-01-02".into()],
        )
        .unwrap()
        .unwrap();
    assert_eq!(
        row,
        vec![
            FieldValue::from("NEWARK LIBERTY INTERNATIONAL AIRPORT, NJ US"),
            FieldValue::Real(40.6825)
        ]
    );
}

#[test]
fn update_many_reports_changed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let schema = TableSchema::weather("datasource");
    let mut store = DataStore::open(dir.path().join("data.db")).unwrap();
    store.create_weather_table(&schema).unwrap();
    store
        .insert_records(
            &schema,
            &[record("72502", "2020-01-01"), record("72503", "2020-01-01")],
        )
        .unwrap();

    let updates = vec![
        vec![FieldValue::from("+0099,1"), "72502,2020-01-01".into()],
        vec![FieldValue::from("+0098,1"), "72503,2020-01-01".into()],
        vec![FieldValue::from("+0097,1"), "00000,1900-01-01".into()],
    ];
    let changed = store
        .execute_many(
            StatementKind::Update,
            "UPDATE datasource SET tmp = ?1 WHERE id = ?2",
            &updates,
        )
        .unwrap();
    assert_eq!(changed, 2);

    let tmps = store
        .query_many("SELECT tmp FROM datasource ORDER BY id", &[])
        .unwrap();
    assert_eq!(
        tmps,
        vec![vec![FieldValue::from("+0099,1")], vec![FieldValue::from("+0098,1")]]
    );
}
