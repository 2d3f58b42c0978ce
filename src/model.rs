use crate::scheduler::SchedError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Identifiant fort pour un RA (slug dérivé du nom).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RaId(String);

impl RaId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }

    /// Slug `initiale du prénom + nom`, en minuscules, sans espaces.
    pub fn from_name(first: &str, last: &str) -> Self {
        let initial: String = first.trim().chars().take(1).collect();
        let slug: String = format!("{initial}{}", last.trim())
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Self(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Réserve un id libre dans `taken` : le slug tel quel, sinon suffixé
    /// `2`, `3`, ... (`adupont`, `adupont2`).
    pub fn unique_in(self, taken: &mut HashSet<RaId>) -> RaId {
        if taken.insert(self.clone()) {
            return self;
        }
        let mut n = 2u32;
        loop {
            let candidate = RaId(format!("{}{n}", self.0));
            if taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl fmt::Display for RaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Niveau de préférence pour un jour de semaine (dimanche à jeudi).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefLevel {
    First,
    Second,
    Third,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl PrefLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "First" => Some(Self::First),
            "Second" => Some(Self::Second),
            "Third" => Some(Self::Third),
            "Not Available" => Some(Self::NotAvailable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "First",
            Self::Second => "Second",
            Self::Third => "Third",
            Self::NotAvailable => "Not Available",
        }
    }
}

/// Préférences dimanche → jeudi. Vendredi et samedi relèvent des indisponibilités week-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayPrefs {
    pub sun: PrefLevel,
    pub mon: PrefLevel,
    pub tue: PrefLevel,
    pub wed: PrefLevel,
    pub thu: PrefLevel,
}

impl WeekdayPrefs {
    pub fn uniform(level: PrefLevel) -> Self {
        Self {
            sun: level,
            mon: level,
            tue: level,
            wed: level,
            thu: level,
        }
    }

    /// `None` pour vendredi/samedi.
    pub fn for_weekday(&self, day: Weekday) -> Option<PrefLevel> {
        match day {
            Weekday::Sun => Some(self.sun),
            Weekday::Mon => Some(self.mon),
            Weekday::Tue => Some(self.tue),
            Weekday::Wed => Some(self.wed),
            Weekday::Thu => Some(self.thu),
            Weekday::Fri | Weekday::Sat => None,
        }
    }
}

impl Default for WeekdayPrefs {
    fn default() -> Self {
        Self::uniform(PrefLevel::First)
    }
}

/// RA (membre d'astreinte) et ses disponibilités.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ra {
    pub id: RaId,
    pub name: String,
    #[serde(default)]
    pub home_area: String,
    #[serde(default)]
    pub home_area_pref: String,
    #[serde(default)]
    pub block_pref: bool,
    #[serde(default)]
    pub weekday_prefs: WeekdayPrefs,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub blackout_dates: BTreeSet<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub weekend_unavailable: BTreeSet<NaiveDate>,
}

impl Ra {
    /// Crée un RA disponible partout ; l'id est dérivé du nom complet.
    pub fn new<N: Into<String>>(name: N) -> Self {
        let name = name.into();
        let mut parts = name.split_whitespace();
        let first = parts.next().unwrap_or_default();
        let last: Vec<&str> = parts.collect();
        Self {
            id: RaId::from_name(first, &last.join(" ")),
            name,
            home_area: String::new(),
            home_area_pref: String::new(),
            block_pref: false,
            weekday_prefs: WeekdayPrefs::default(),
            blackout_dates: BTreeSet::new(),
            weekend_unavailable: BTreeSet::new(),
        }
    }

    /// Premier mot du nom, utilisé dans les tableaux de sortie.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// Vrai si l'une des indisponibilités interdit ce jour.
    pub fn is_unavailable_on(&self, date: NaiveDate) -> bool {
        if self.blackout_dates.contains(&date) {
            return true;
        }
        let day = date.weekday();
        if is_weekend(date) && self.weekend_unavailable.contains(&date) {
            return true;
        }
        self.weekday_prefs.for_weekday(day) == Some(PrefLevel::NotAvailable)
    }
}

/// Vendredi et samedi comptent comme week-end.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Fri | Weekday::Sat)
}

/// Zone d'astreinte. Exactement deux zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Area {
    Area1,
    Area2,
}

impl Area {
    pub const ALL: [Area; 2] = [Area::Area1, Area::Area2];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Primary, Role::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Secondary => "secondary",
        }
    }
}

/// Colonne d'un jour du planning : (zone, rôle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotKey {
    Area1Primary,
    Area2Primary,
    Area1Secondary,
    Area2Secondary,
}

impl SlotKey {
    /// Ordre des colonnes en sortie.
    pub const COLUMNS: [SlotKey; 4] = [
        SlotKey::Area1Primary,
        SlotKey::Area2Primary,
        SlotKey::Area1Secondary,
        SlotKey::Area2Secondary,
    ];

    pub fn new(area: Area, role: Role) -> Self {
        match (area, role) {
            (Area::Area1, Role::Primary) => SlotKey::Area1Primary,
            (Area::Area2, Role::Primary) => SlotKey::Area2Primary,
            (Area::Area1, Role::Secondary) => SlotKey::Area1Secondary,
            (Area::Area2, Role::Secondary) => SlotKey::Area2Secondary,
        }
    }

    pub fn area(&self) -> Area {
        match self {
            SlotKey::Area1Primary | SlotKey::Area1Secondary => Area::Area1,
            SlotKey::Area2Primary | SlotKey::Area2Secondary => Area::Area2,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            SlotKey::Area1Primary | SlotKey::Area2Primary => Role::Primary,
            SlotKey::Area1Secondary | SlotKey::Area2Secondary => Role::Secondary,
        }
    }

    /// Position dans `SlotKey::COLUMNS`.
    pub fn column(&self) -> usize {
        match self {
            SlotKey::Area1Primary => 0,
            SlotKey::Area2Primary => 1,
            SlotKey::Area1Secondary => 2,
            SlotKey::Area2Secondary => 3,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let area = match self.area() {
            Area::Area1 => "Area1",
            Area::Area2 => "Area2",
        };
        write!(f, "{area}_{}", self.role().as_str())
    }
}

/// Créneau d'astreinte : un jour, une zone, un rôle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Shift {
    pub date: NaiveDate,
    pub area: Area,
    pub role: Role,
}

impl Shift {
    pub fn new(date: NaiveDate, area: Area, role: Role) -> Self {
        Self { date, area, role }
    }

    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.area, self.role)
    }

    pub fn is_weekend(&self) -> bool {
        is_weekend(self.date)
    }
}

/// Roster validé, non modifiable après chargement.
#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    ras: Vec<Ra>,
}

impl Roster {
    /// Valide les ids (non vides, uniques) et les noms.
    pub fn new(ras: Vec<Ra>) -> Result<Self, SchedError> {
        if ras.is_empty() {
            return Err(SchedError::InputValidation("roster is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for ra in &ras {
            if ra.id.as_str().trim().is_empty() {
                return Err(SchedError::InputValidation(format!(
                    "empty ra_id for {:?}",
                    ra.name
                )));
            }
            if ra.name.trim().is_empty() {
                return Err(SchedError::InputValidation(format!(
                    "empty name for ra_id {}",
                    ra.id
                )));
            }
            if !seen.insert(ra.id.clone()) {
                return Err(SchedError::InputValidation(format!(
                    "duplicate ra_id {}",
                    ra.id
                )));
            }
        }
        Ok(Self { ras })
    }

    pub fn ras(&self) -> &[Ra] {
        &self.ras
    }

    pub fn len(&self) -> usize {
        self.ras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ras.is_empty()
    }

    pub fn find_by_id<'a>(&'a self, id: &RaId) -> Option<&'a Ra> {
        self.ras.iter().find(|r| &r.id == id)
    }

    pub fn index_of(&self, id: &RaId) -> Option<usize> {
        self.ras.iter().position(|r| &r.id == id)
    }
}
