//! Property tests for the field codec over generated values.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use kintone_protocol::{Field, File, Record, SubTableRow, User, decode_record, encode_record};
use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;

// =========================================================================
// Strategies
// =========================================================================

/// 0001-01-01T00:00:00Z and 9999-12-31T23:59:59Z as Unix seconds.
const FIRST_SECOND: i64 = -62_135_596_800;
const LAST_SECOND: i64 = 253_402_300_799;

fn code() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

fn decimal() -> impl Strategy<Value = String> {
    "-?[0-9]{1,40}(\\.[0-9]{1,12})?"
}

fn strings() -> impl Strategy<Value = Vec<String>> {
    vec(any::<String>(), 0..4)
}

fn user() -> impl Strategy<Value = User> {
    (any::<String>(), any::<String>()).prop_map(|(code, name)| User::new(code, name))
}

fn users() -> impl Strategy<Value = Vec<User>> {
    vec(user(), 0..4)
}

fn file() -> impl Strategy<Value = File> {
    (any::<String>(), any::<String>(), any::<String>(), any::<u64>()).prop_map(
        |(content_type, file_key, name, size)| File {
            content_type,
            file_key,
            name,
            size,
        },
    )
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (1i32..=9999, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn time() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60, 0u32..60).prop_map(|(h, m, s)| NaiveTime::from_hms_opt(h, m, s).unwrap())
}

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (FIRST_SECOND..=LAST_SECOND, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| DateTime::from_timestamp(secs, nanos).unwrap())
}

fn text_field() -> impl Strategy<Value = Field> {
    prop_oneof![
        any::<String>().prop_map(Field::SingleLineText),
        any::<String>().prop_map(Field::MultiLineText),
        any::<String>().prop_map(Field::RichText),
        decimal().prop_map(Field::Number),
        decimal().prop_map(Field::Calc),
        any::<String>().prop_map(Field::RadioButton),
        any::<String>().prop_map(Field::Link),
        any::<String>().prop_map(Field::Status),
        any::<String>().prop_map(Field::RecordNumber),
    ]
}

fn list_field() -> impl Strategy<Value = Field> {
    prop_oneof![
        strings().prop_map(Field::CheckBox),
        strings().prop_map(Field::MultiSelect),
        strings().prop_map(Field::Category),
        option::of(any::<String>()).prop_map(Field::DropDown),
        vec(file(), 0..3).prop_map(Field::File),
        users().prop_map(Field::UserSelect),
        users().prop_map(Field::OrganizationSelect),
        users().prop_map(Field::GroupSelect),
        users().prop_map(Field::StatusAssignee),
        user().prop_map(Field::Creator),
    ]
}

fn moment_field() -> impl Strategy<Value = Field> {
    prop_oneof![
        user().prop_map(Field::Modifier),
        option::of(date()).prop_map(Field::Date),
        option::of(time()).prop_map(Field::Time),
        option::of(timestamp()).prop_map(Field::DateTime),
        timestamp().prop_map(Field::CreatedTime),
        timestamp().prop_map(Field::UpdatedTime),
        any::<u64>().prop_map(Field::Id),
        any::<u64>().prop_map(Field::Revision),
    ]
}

/// Any kind a subtable row may hold.
fn cell() -> impl Strategy<Value = Field> {
    prop_oneof![text_field(), list_field(), moment_field()]
}

fn sub_table() -> impl Strategy<Value = Field> {
    vec((any::<String>(), btree_map(code(), cell(), 0..4)), 0..3).prop_map(|rows| {
        Field::SubTable(
            rows.into_iter()
                .map(|(id, fields)| SubTableRow { id, fields })
                .collect(),
        )
    })
}

fn field() -> impl Strategy<Value = Field> {
    prop_oneof![4 => cell(), 1 => sub_table()]
}

fn round_trip(field: &Field) -> Field {
    let json = serde_json::to_value(field).unwrap();
    let tag = json["type"].as_str().unwrap();
    Field::decode("f", tag, &json["value"]).unwrap()
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #[test]
    fn test_every_field_round_trips(value in field()) {
        prop_assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn test_every_record_round_trips(fields in btree_map(code(), field(), 0..6)) {
        let record = Record { fields };
        let bytes = encode_record(&record).unwrap();
        prop_assert_eq!(decode_record(&bytes).unwrap(), record);
    }

    #[test]
    fn test_sub_second_times_are_never_encoded(base in time(), millis in 1u32..1000) {
        let time = base.with_nanosecond(millis * 1_000_000).unwrap();
        prop_assert!(serde_json::to_value(Field::Time(Some(time))).is_err());
    }

    #[test]
    fn test_five_digit_years_are_never_encoded(year in 10_000i32..200_000) {
        let ts = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        prop_assert!(serde_json::to_value(Field::DateTime(Some(ts))).is_err());
        prop_assert!(serde_json::to_value(Field::CreatedTime(ts)).is_err());
        prop_assert!(serde_json::to_value(Field::Date(Some(ts.date_naive()))).is_err());
    }
}
