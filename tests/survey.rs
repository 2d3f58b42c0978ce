#![forbid(unsafe_code)]
use astreinte_ra::io::parse_roster_csv;
use astreinte_ra::survey::{
    normalize_pref, normalize_survey_csv, parse_blackout_dates, parse_weekend_unavailable,
};
use astreinte_ra::{io::export_prefs_csv, PrefLevel, RaId};
use chrono::NaiveDate;

#[test]
fn free_text_preferences_are_normalised() {
    assert_eq!(normalize_pref("First choice"), PrefLevel::First);
    assert_eq!(normalize_pref(" Second"), PrefLevel::Second);
    assert_eq!(normalize_pref("Third (if needed)"), PrefLevel::Third);
    assert_eq!(normalize_pref("Not Available"), PrefLevel::NotAvailable);
    assert_eq!(normalize_pref(""), PrefLevel::NotAvailable);
}

#[test]
fn weekend_answers_become_dates() {
    let dates = parse_weekend_unavailable("Sat Sept 27, Fri Oct 17", 2025).unwrap();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 9, 27).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 17).unwrap(),
        ]
    );
    assert!(parse_weekend_unavailable("", 2025).unwrap().is_empty());
    assert!(parse_weekend_unavailable("none", 2025).unwrap().is_empty());
    assert!(parse_weekend_unavailable("Sat Foo 27", 2025).is_err());
}

const SURVEY: &str = "\
First Name,Last Name,Home Area,Preference for NE1 vs NE2?,Preference for block scheduling?,Sunday's,Monday's,Tuesday's,Wednesday's,Thursday's,Are there any weeks/weekdays during the quarter that you can not work?,What weekend shifts can you not work?
Alice,Martin,NE1,NE1,Yes please,First choice,Second choice,Third choice,Not Available,First choice,,\"Sat Sept 27, Fri Oct 17\"
Bruno,Van Dijk,NE2,No preference,No,First,First,First,First,First,,
,,,,,,,,,,,
";

#[test]
fn survey_export_normalises_into_prefs_rows() {
    let records = normalize_survey_csv(SURVEY.as_bytes(), 2025).unwrap();
    assert_eq!(records.len(), 2);

    let alice = &records[0];
    assert_eq!(alice.ra_id, "amartin");
    assert_eq!(alice.name, "Alice Martin");
    assert_eq!(alice.block_pref, "Yes");
    assert_eq!(alice.wed, "Not Available");
    assert_eq!(alice.weekend_unavailable, "2025-09-27;2025-10-17");
    assert_eq!(records[1].ra_id, "bvandijk");

    // la sortie est directement importable
    let mut buf = Vec::new();
    export_prefs_csv(&mut buf, &records).unwrap();
    let roster = parse_roster_csv(buf.as_slice()).unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster.find_by_id(&RaId::new("bvandijk")).is_some());
}

#[test]
fn blackout_answers_keep_only_iso_dates() {
    assert_eq!(
        parse_blackout_dates("2025-10-08; Week of Oct 6, 2025-11-02"),
        vec![
            NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
        ]
    );
    assert!(parse_blackout_dates("Week of Oct 6").is_empty());
    assert!(parse_blackout_dates("").is_empty());
}

const FREE_TEXT_SURVEY: &str = "\
First Name,Last Name,Home Area,Preference for NE1 vs NE2?,Preference for block scheduling?,Sunday's,Monday's,Tuesday's,Wednesday's,Thursday's,Are there any weeks/weekdays during the quarter that you can not work?,What weekend shifts can you not work?
Alex,Dupont,NE1,NE1,No,First,First,First,First,First,Week of Oct 6,
Anne,Dupont,NE2,NE2,No,First,First,First,First,First,\"2025-10-08, midterms\",
";

#[test]
fn free_text_blackouts_and_shared_slugs_still_import() {
    let records = normalize_survey_csv(FREE_TEXT_SURVEY.as_bytes(), 2025).unwrap();
    assert_eq!(records[0].ra_id, "adupont");
    assert_eq!(records[0].blackout_dates, "");
    assert_eq!(records[1].ra_id, "adupont2");
    assert_eq!(records[1].blackout_dates, "2025-10-08");

    let mut buf = Vec::new();
    export_prefs_csv(&mut buf, &records).unwrap();
    let roster = parse_roster_csv(buf.as_slice()).unwrap();
    assert_eq!(roster.len(), 2);
    let anne = roster.find_by_id(&RaId::new("adupont2")).unwrap();
    assert!(anne
        .blackout_dates
        .contains(&NaiveDate::from_ymd_opt(2025, 10, 8).unwrap()));
}
