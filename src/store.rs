use crate::models::{DayPatch, Journal, WeekData};
use std::sync::Arc;

/// Returns a copy of `journal` with one day's fields replaced by `patch`.
///
/// Weeks and days that are not targeted keep their `Arc` identity, so callers
/// can detect changes with `Arc::ptr_eq`. Values are not range-checked here.
pub fn update_day(journal: &Journal, week_number: u8, day_id: &str, patch: &DayPatch) -> Journal {
    let weeks = journal
        .weeks
        .iter()
        .map(|week| {
            if week.week_number != week_number {
                return Arc::clone(week);
            }
            let days = week
                .days
                .iter()
                .map(|day| {
                    if day.id == day_id {
                        Arc::new(patch.merge_into(day))
                    } else {
                        Arc::clone(day)
                    }
                })
                .collect();
            Arc::new(WeekData {
                week_number: week.week_number,
                days,
            })
        })
        .collect();

    Journal { weeks }
}

/// The current journal of one session.
#[derive(Debug, Clone, Default)]
pub struct Store {
    current: Arc<Journal>,
}

impl Store {
    pub fn new(journal: Journal) -> Self {
        Self {
            current: Arc::new(journal),
        }
    }

    pub fn current(&self) -> Arc<Journal> {
        Arc::clone(&self.current)
    }

    /// Applies `patch` and returns the new journal, or `None` if the day does not exist.
    pub fn update_day(&mut self, week_number: u8, day_id: &str, patch: &DayPatch) -> Option<Arc<Journal>> {
        self.current.week(week_number)?.day(day_id)?;
        self.current = Arc::new(update_day(&self.current, week_number, day_id, patch));
        Some(self.current())
    }

    pub fn replace(&mut self, journal: Journal) -> Arc<Journal> {
        self.current = Arc::new(journal);
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleCheck;

    #[test]
    fn update_day_only_touches_the_target() {
        let journal = Journal::template();
        for week_number in 1..=8u8 {
            let week = journal.week(week_number).unwrap();
            for day in &week.days {
                let patch = DayPatch {
                    sleep: Some(7.5),
                    ..DayPatch::default()
                };
                let next = update_day(&journal, week_number, &day.id, &patch);

                for (old_week, new_week) in journal.weeks.iter().zip(&next.weeks) {
                    if old_week.week_number != week_number {
                        assert!(Arc::ptr_eq(old_week, new_week));
                        continue;
                    }
                    assert!(!Arc::ptr_eq(old_week, new_week));
                    for (old_day, new_day) in old_week.days.iter().zip(&new_week.days) {
                        if old_day.id == day.id {
                            assert_eq!(new_day.sleep, 7.5);
                            assert_eq!(new_day.water, old_day.water);
                            assert_eq!(new_day.id, old_day.id);
                        } else {
                            assert!(Arc::ptr_eq(old_day, new_day));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn update_day_leaves_input_untouched() {
        let journal = Journal::template();
        let patch = DayPatch {
            notes: Some("ok".into()),
            rule103210: Some(RuleCheck {
                caffeine: true,
                ..RuleCheck::default()
            }),
            ..DayPatch::default()
        };
        let next = update_day(&journal, 2, "w2-d3", &patch);
        assert_eq!(journal, Journal::template());
        let day = next.week(2).unwrap().day("w2-d3").unwrap();
        assert_eq!(day.notes, "ok");
        assert!(day.rule103210.caffeine);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let journal = Journal::template();
        let patch = DayPatch {
            nutrition: Some(9),
            ..DayPatch::default()
        };
        let next = update_day(&journal, 1, "w1-d1", &patch);
        assert_eq!(next.week(1).unwrap().days[0].nutrition, 9);
    }

    #[test]
    fn store_rejects_unknown_day() {
        let mut store = Store::new(Journal::template());
        let before = store.current();
        assert!(store.update_day(9, "w9-d1", &DayPatch::default()).is_none());
        assert!(store.update_day(1, "nope", &DayPatch::default()).is_none());
        assert!(Arc::ptr_eq(&before, &store.current()));
    }
}
