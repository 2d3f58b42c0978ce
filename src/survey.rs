//! Normalisation des réponses brutes du formulaire de préférences.
//!
//! Produit des [`PrefsRecord`] au format attendu par `io::import_roster_csv`.

use crate::io::PrefsRecord;
use crate::model::{PrefLevel, RaId};
use anyhow::Context;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::io::Read;
use tracing::warn;

/// Réponse libre → niveau. Tout ce qui n'est pas reconnu vaut « Not Available ».
pub fn normalize_pref(raw: &str) -> PrefLevel {
    let raw = raw.trim();
    if raw.starts_with("First") {
        PrefLevel::First
    } else if raw.starts_with("Second") {
        PrefLevel::Second
    } else if raw.starts_with("Third") {
        PrefLevel::Third
    } else {
        PrefLevel::NotAvailable
    }
}

fn month_number(token: &str) -> Option<u32> {
    let prefix: String = token.chars().take(3).collect();
    let month = match prefix.as_str() {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// `"Sat Sept 27, Fri Oct 17"` → dates de l'année `year`.
/// Les morceaux de moins de trois mots sont ignorés.
pub fn parse_weekend_unavailable(raw: &str, year: i32) -> anyhow::Result<Vec<NaiveDate>> {
    let mut out = Vec::new();
    for token in raw.split(',') {
        let parts: Vec<&str> = token.split_whitespace().collect();
        let [_, month, day, ..] = parts.as_slice() else {
            continue;
        };
        let month = month_number(month).with_context(|| format!("unknown month in {token:?}"))?;
        let day: u32 = day
            .parse()
            .with_context(|| format!("invalid day in {token:?}"))?;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .with_context(|| format!("invalid date {token:?} in {year}"))?;
        out.push(date);
    }
    Ok(out)
}

/// Réponse « semaines/jours indisponibles » : seules les dates ISO
/// (`2025-10-08`, séparées par `;` ou `,`) sont gardées, le reste est signalé.
pub fn parse_blackout_dates(raw: &str) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for token in raw.split([';', ',']).map(str::trim).filter(|t| !t.is_empty()) {
        match NaiveDate::parse_from_str(token, "%Y-%m-%d") {
            Ok(date) => out.push(date),
            Err(_) => warn!(answer = token, "blackout answer is not an ISO date, ignored"),
        }
    }
    out
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

fn field<'r>(rec: &'r StringRecord, headers: &StringRecord, name: &str) -> &'r str {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .and_then(|idx| rec.get(idx))
        .map(str::trim)
        .unwrap_or("")
}

/// Convertit l'export du formulaire en lignes de préférences.
pub fn normalize_survey_csv<R: Read>(reader: R, year: i32) -> anyhow::Result<Vec<PrefsRecord>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut out = Vec::new();
    let mut taken = HashSet::new();

    for rec in rdr.records() {
        let rec = rec?;
        let first = field(&rec, &headers, "First Name");
        let last = field(&rec, &headers, "Last Name");
        if first.is_empty() && last.is_empty() {
            continue;
        }
        let weekend = parse_weekend_unavailable(field(&rec, &headers, "What weekend shifts can you not work?"), year)
            .with_context(|| format!("weekend answer of {first} {last}"))?;

        let blackout = parse_blackout_dates(field(
            &rec,
            &headers,
            "Are there any weeks/weekdays during the quarter that you can not work?",
        ));
        let id = RaId::from_name(first, last).unique_in(&mut taken);

        out.push(PrefsRecord {
            ra_id: id.as_str().to_string(),
            name: format!("{first} {last}"),
            home_area: field(&rec, &headers, "Home Area").to_string(),
            home_area_pref: field(&rec, &headers, "Preference for NE1 vs NE2?").to_string(),
            block_pref: if field(&rec, &headers, "Preference for block scheduling?").contains("Yes") {
                "Yes"
            } else {
                "No"
            }
            .to_string(),
            sun: normalize_pref(field(&rec, &headers, "Sunday's")).as_str().to_string(),
            mon: normalize_pref(field(&rec, &headers, "Monday's")).as_str().to_string(),
            tue: normalize_pref(field(&rec, &headers, "Tuesday's")).as_str().to_string(),
            wed: normalize_pref(field(&rec, &headers, "Wednesday's")).as_str().to_string(),
            thu: normalize_pref(field(&rec, &headers, "Thursday's")).as_str().to_string(),
            blackout_dates: join_dates(&blackout),
            weekend_unavailable: join_dates(&weekend),
        });
    }
    Ok(out)
}
