use crate::models::{DayData, Journal, WeekData};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    pub week_number: u8,
    pub filled_days: usize,
    pub workouts: usize,
    pub avg_sleep: Option<f64>,
    pub avg_water: Option<f64>,
    pub avg_nutrition: Option<f64>,
    pub avg_wellbeing: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub label: String,
    pub water: f64,
    pub sleep: f64,
    pub nutrition: u8,
    pub wellbeing: u8,
    pub workout: bool,
}

/// Dashboard totals over the whole program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub workouts: usize,
    pub avg_sleep: Option<f64>,
    pub avg_water: Option<f64>,
    pub points: Vec<ProgressPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JournalProgress {
    pub filled: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResponse {
    pub weeks: Vec<WeekSummary>,
    pub overview: ProgressOverview,
    pub progress: JournalProgress,
}

/// A day counts as filled once anything at all has been entered.
pub fn is_day_filled(day: &DayData) -> bool {
    !day.notes.trim().is_empty()
        || day.sleep != 0.0
        || day.water != 0.0
        || day.nutrition != 0
        || day.wellbeing != 0
        || day.workout
        || day.rule103210.any()
}

/// Mean of the non-zero values; 0 marks an unfilled entry.
pub fn mean_of_set<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|value| *value != 0.0)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { None } else { Some(sum / count as f64) }
}

pub fn summarize_week(week: &WeekData) -> WeekSummary {
    let days = &week.days;
    WeekSummary {
        week_number: week.week_number,
        filled_days: days.iter().filter(|day| is_day_filled(day)).count(),
        workouts: days.iter().filter(|day| day.workout).count(),
        avg_sleep: mean_of_set(days.iter().map(|day| day.sleep)),
        avg_water: mean_of_set(days.iter().map(|day| day.water)),
        avg_nutrition: mean_of_set(days.iter().map(|day| f64::from(day.nutrition))),
        avg_wellbeing: mean_of_set(days.iter().map(|day| f64::from(day.wellbeing))),
    }
}

pub fn journal_progress(journal: &Journal) -> JournalProgress {
    journal.weeks.iter().fold(JournalProgress { filled: 0, total: 0 }, |acc, week| JournalProgress {
        filled: acc.filled + week.days.iter().filter(|day| is_day_filled(day)).count(),
        total: acc.total + week.days.len(),
    })
}

pub fn progress_overview(journal: &Journal) -> ProgressOverview {
    let points: Vec<ProgressPoint> = journal
        .weeks
        .iter()
        .flat_map(|week| week.days.iter().map(move |day| (week.week_number, day)))
        .filter(|(_, day)| day.water > 0.0 || day.sleep > 0.0 || day.workout || day.nutrition > 0)
        .map(|(week_number, day)| ProgressPoint {
            label: point_label(week_number, day),
            water: day.water,
            sleep: day.sleep,
            nutrition: day.nutrition,
            wellbeing: day.wellbeing,
            workout: day.workout,
        })
        .collect();

    ProgressOverview {
        workouts: points.iter().filter(|point| point.workout).count(),
        avg_sleep: mean_of_set(points.iter().map(|point| point.sleep)),
        avg_water: mean_of_set(points.iter().map(|point| point.water)),
        points,
    }
}

pub fn build_summary(journal: &Journal) -> SummaryResponse {
    SummaryResponse {
        weeks: journal.weeks.iter().map(|week| summarize_week(week)).collect(),
        overview: progress_overview(journal),
        progress: journal_progress(journal),
    }
}

pub fn format_average(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}"),
        None => "no data".to_string(),
    }
}

fn point_label(week_number: u8, day: &DayData) -> String {
    let short: String = if day.day_name.is_empty() {
        day.id.clone()
    } else {
        day.day_name.chars().take(3).collect()
    };
    format!("W{week_number} {short}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayPatch, RuleCheck};
    use crate::store::update_day;
    use std::sync::Arc;

    fn week_with_sleep(values: &[f64]) -> WeekData {
        let mut week = WeekData::blank(1);
        for (day, sleep) in week.days.iter_mut().zip(values) {
            Arc::make_mut(day).sleep = *sleep;
        }
        week
    }

    #[test]
    fn filled_detects_notes_only_day() {
        let mut day = DayData::blank(1, 0);
        assert!(!is_day_filled(&day));
        day.notes = "ok".into();
        assert!(is_day_filled(&day));
    }

    #[test]
    fn filled_ignores_blank_notes() {
        let mut day = DayData::blank(1, 0);
        day.notes = "   ".into();
        assert!(!is_day_filled(&day));
    }

    #[test]
    fn filled_detects_single_rule_flag() {
        let mut day = DayData::blank(1, 0);
        day.rule103210 = RuleCheck {
            snooze: true,
            ..RuleCheck::default()
        };
        assert!(is_day_filled(&day));
    }

    #[test]
    fn sleep_mean_excludes_unset_days() {
        let summary = summarize_week(&week_with_sleep(&[7.0, 8.0, 0.0, 6.0]));
        assert_eq!(summary.avg_sleep, Some(7.0));
        assert_eq!(summary.filled_days, 3);
    }

    #[test]
    fn sleep_mean_of_empty_week_is_no_data() {
        let summary = summarize_week(&WeekData::blank(4));
        assert_eq!(summary.avg_sleep, None);
        assert_eq!(summary.avg_water, None);
        assert_eq!(format_average(summary.avg_sleep), "no data");
        assert_eq!(summary.filled_days, 0);
    }

    #[test]
    fn overview_counts_workouts_and_skips_empty_days() {
        let journal = Journal::template();
        let journal = update_day(
            &journal,
            1,
            "w1-d1",
            &DayPatch {
                workout: Some(true),
                water: Some(2.5),
                wellbeing: Some(4),
                nutrition: Some(2),
                ..DayPatch::default()
            },
        );
        let journal = update_day(
            &journal,
            3,
            "w3-d2",
            &DayPatch {
                sleep: Some(8.0),
                nutrition: Some(5),
                ..DayPatch::default()
            },
        );
        let journal = update_day(
            &journal,
            3,
            "w3-d3",
            &DayPatch {
                notes: Some("tired".into()),
                ..DayPatch::default()
            },
        );

        let overview = progress_overview(&journal);
        assert_eq!(overview.points.len(), 2);
        assert_eq!(overview.workouts, 1);
        assert_eq!(overview.avg_sleep, Some(8.0));
        assert_eq!(overview.avg_water, Some(2.5));
        assert_eq!(overview.points[0].label, "W1 Mon");
        assert_eq!((overview.points[0].wellbeing, overview.points[0].nutrition), (4, 2));
        assert_eq!((overview.points[1].wellbeing, overview.points[1].nutrition), (0, 5));
        assert_eq!(overview.points[1].label, "W3 Tue");

        let progress = journal_progress(&journal);
        assert_eq!(progress, JournalProgress { filled: 3, total: 56 });
    }

    #[test]
    fn format_average_uses_one_decimal() {
        assert_eq!(format_average(Some(7.26)), "7.3");
        assert_eq!(format_average(Some(2.0)), "2.0");
    }
}
