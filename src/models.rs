use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const WEEK_COUNT: u8 = 8;
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
pub const RATING_MAX: u8 = 5;

/// The pre-sleep "10-3-2-1-0" checklist. Each flag is independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuleCheck {
    pub caffeine: bool,
    pub meal: bool,
    pub fluids: bool,
    pub screens: bool,
    pub snooze: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleItem {
    Caffeine,
    Meal,
    Fluids,
    Screens,
    Snooze,
}

impl RuleItem {
    pub const ALL: [RuleItem; 5] = [
        RuleItem::Caffeine,
        RuleItem::Meal,
        RuleItem::Fluids,
        RuleItem::Screens,
        RuleItem::Snooze,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RuleItem::Caffeine => "caffeine",
            RuleItem::Meal => "meal",
            RuleItem::Fluids => "fluids",
            RuleItem::Screens => "screens",
            RuleItem::Snooze => "snooze",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RuleItem::Caffeine => "10h: no caffeine",
            RuleItem::Meal => "3h: no food",
            RuleItem::Fluids => "2h: no fluids",
            RuleItem::Screens => "1h: no screens",
            RuleItem::Snooze => "0: no snooze button",
        }
    }
}

impl RuleCheck {
    pub fn get(&self, item: RuleItem) -> bool {
        match item {
            RuleItem::Caffeine => self.caffeine,
            RuleItem::Meal => self.meal,
            RuleItem::Fluids => self.fluids,
            RuleItem::Screens => self.screens,
            RuleItem::Snooze => self.snooze,
        }
    }

    pub fn toggled(&self, item: RuleItem) -> Self {
        let mut next = self.clone();
        let flag = match item {
            RuleItem::Caffeine => &mut next.caffeine,
            RuleItem::Meal => &mut next.meal,
            RuleItem::Fluids => &mut next.fluids,
            RuleItem::Screens => &mut next.screens,
            RuleItem::Snooze => &mut next.snooze,
        };
        *flag = !*flag;
        next
    }

    /// Number of flags that are set, 0..=5.
    pub fn score(&self) -> u8 {
        RuleItem::ALL.iter().filter(|item| self.get(**item)).count() as u8
    }

    pub fn any(&self) -> bool {
        self.score() > 0
    }
}

/// One day of the program. Numeric fields use 0 for "not filled in".
///
/// Every field carries a default so that blobs written by older clients,
/// or with fields missing, decode into a complete record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct DayData {
    pub id: String,
    pub day_name: String,
    pub workout: bool,
    pub nutrition: u8,
    pub supplements: bool,
    pub water: f64,
    pub sleep: f64,
    pub evening_hunger: u8,
    pub wellbeing: u8,
    pub notes: String,
    pub rule103210: RuleCheck,
}

impl DayData {
    pub fn blank(week_number: u8, index: usize) -> Self {
        Self {
            id: day_id(week_number, index),
            day_name: DAY_NAMES[index % DAY_NAMES.len()].to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WeekData {
    pub week_number: u8,
    pub days: Vec<Arc<DayData>>,
}

impl WeekData {
    pub fn blank(week_number: u8) -> Self {
        Self {
            week_number,
            days: (0..DAY_NAMES.len())
                .map(|index| Arc::new(DayData::blank(week_number, index)))
                .collect(),
        }
    }

    pub fn day(&self, day_id: &str) -> Option<&Arc<DayData>> {
        self.days.iter().find(|day| day.id == day_id)
    }
}

/// A user's whole journal, persisted as a single blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub weeks: Vec<Arc<WeekData>>,
}

impl Journal {
    /// The empty 8-week program every new user starts from.
    pub fn template() -> Self {
        Self {
            weeks: (1..=WEEK_COUNT).map(|n| Arc::new(WeekData::blank(n))).collect(),
        }
    }

    pub fn week(&self, week_number: u8) -> Option<&Arc<WeekData>> {
        self.weeks.iter().find(|week| week.week_number == week_number)
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::template()
    }
}

pub fn day_id(week_number: u8, index: usize) -> String {
    format!("w{}-d{}", week_number, index + 1)
}

/// Partial update for a single day. `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DayPatch {
    pub day_name: Option<String>,
    pub workout: Option<bool>,
    pub nutrition: Option<u8>,
    pub supplements: Option<bool>,
    pub water: Option<f64>,
    pub sleep: Option<f64>,
    pub evening_hunger: Option<u8>,
    pub wellbeing: Option<u8>,
    pub notes: Option<String>,
    pub rule103210: Option<RuleCheck>,
}

impl DayPatch {
    pub fn merge_into(&self, day: &DayData) -> DayData {
        let mut next = day.clone();
        if let Some(value) = &self.day_name {
            next.day_name = value.clone();
        }
        if let Some(value) = self.workout {
            next.workout = value;
        }
        if let Some(value) = self.nutrition {
            next.nutrition = value;
        }
        if let Some(value) = self.supplements {
            next.supplements = value;
        }
        if let Some(value) = self.water {
            next.water = value;
        }
        if let Some(value) = self.sleep {
            next.sleep = value;
        }
        if let Some(value) = self.evening_hunger {
            next.evening_hunger = value;
        }
        if let Some(value) = self.wellbeing {
            next.wellbeing = value;
        }
        if let Some(value) = &self.notes {
            next.notes = value.clone();
        }
        if let Some(value) = &self.rule103210 {
            next.rule103210 = value.clone();
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    #[default]
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<Option<String>> for Role {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::Client,
        }
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Role::from(Option::<String>::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// A persisted journal blob as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub data: Journal,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LegacyImportForm {
    pub accept: bool,
}

/// Coach page selection. Values come straight from links and are parsed leniently.
#[derive(Debug, Deserialize, Default)]
pub struct CoachQuery {
    pub client: Option<String>,
    pub week: Option<String>,
    pub day: Option<String>,
}

impl CoachQuery {
    /// The selected week, or `None` when missing or not a number.
    pub fn week_number(&self) -> Option<u8> {
        self.week.as_deref()?.trim().parse().ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientStateResponse {
    pub client: Profile,
    pub state: Option<StoredState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_has_eight_weeks_of_seven_blank_days() {
        let journal = Journal::template();
        assert_eq!(journal.weeks.len(), 8);
        for (i, week) in journal.weeks.iter().enumerate() {
            assert_eq!(week.week_number as usize, i + 1);
            assert_eq!(week.days.len(), 7);
            for day in &week.days {
                assert_eq!(day.sleep, 0.0);
                assert_eq!(day.water, 0.0);
                assert_eq!(day.nutrition, 0);
                assert_eq!(day.wellbeing, 0);
                assert_eq!(day.evening_hunger, 0);
                assert!(!day.workout);
                assert_eq!(day.rule103210.score(), 0);
            }
        }
        assert_eq!(journal.weeks[2].days[4].id, "w3-d5");
        assert_eq!(journal.weeks[2].days[4].day_name, "Friday");
    }

    #[test]
    fn day_decodes_with_missing_fields_defaulted() {
        let day: DayData =
            serde_json::from_str(r#"{"id":"x","sleep":7.5,"rule103210":{"meal":true}}"#).unwrap();
        assert_eq!(day.id, "x");
        assert_eq!(day.sleep, 7.5);
        assert_eq!(day.notes, "");
        assert!(day.rule103210.meal);
        assert_eq!(day.rule103210.score(), 1);
    }

    #[test]
    fn day_uses_camel_case_on_the_wire() {
        let value = serde_json::to_value(DayData::blank(1, 0)).unwrap();
        assert!(value.get("dayName").is_some());
        assert!(value.get("eveningHunger").is_some());
        assert!(value.get("rule103210").is_some());
    }

    #[test]
    fn rule_toggle_flips_only_one_flag() {
        let rule = RuleCheck::default().toggled(RuleItem::Screens);
        assert!(rule.screens);
        assert_eq!(rule.score(), 1);
        assert_eq!(rule.toggled(RuleItem::Screens), RuleCheck::default());
    }

    #[test]
    fn role_parses_admin_and_anything_else() {
        let admin: Profile = serde_json::from_str(r#"{"id":"1","email":"a","role":"admin"}"#).unwrap();
        let client: Profile = serde_json::from_str(r#"{"id":"2","email":"b","role":null}"#).unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(client.role, Role::Client);
    }

    #[test]
    fn patch_rejects_id_changes() {
        assert!(serde_json::from_str::<DayPatch>(r#"{"id":"other"}"#).is_err());
    }
}
