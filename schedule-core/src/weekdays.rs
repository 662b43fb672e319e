//! Weekday selection sets used by BYDAY recurrence terms.
//!
//! A [`WeekDays`] always carries all seven days. Each day is either
//! unselected, selected for every week, or selected with an ordinal
//! ("2nd Tuesday", "last Friday").

use std::fmt;

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekDay {
    /// All days in canonical Monday..Sunday order.
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
        WeekDay::Sunday,
    ];

    /// Two-letter iCalendar abbreviation ("MO", "TU", ...)
    pub fn abbreviation(self) -> &'static str {
        match self {
            WeekDay::Monday => "MO",
            WeekDay::Tuesday => "TU",
            WeekDay::Wednesday => "WE",
            WeekDay::Thursday => "TH",
            WeekDay::Friday => "FR",
            WeekDay::Saturday => "SA",
            WeekDay::Sunday => "SU",
        }
    }

    pub fn from_abbreviation(abbr: &str) -> Option<Self> {
        WeekDay::ALL
            .into_iter()
            .find(|day| day.abbreviation().eq_ignore_ascii_case(abbr))
    }

    pub fn name(self) -> &'static str {
        match self {
            WeekDay::Monday => "monday",
            WeekDay::Tuesday => "tuesday",
            WeekDay::Wednesday => "wednesday",
            WeekDay::Thursday => "thursday",
            WeekDay::Friday => "friday",
            WeekDay::Saturday => "saturday",
            WeekDay::Sunday => "sunday",
        }
    }

    /// Map an ISO weekday number (1 = Monday .. 7 = Sunday).
    pub fn from_iso_number(number: u32) -> Option<Self> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        WeekDay::ALL.get(index).copied()
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl From<chrono::Weekday> for WeekDay {
    fn from(day: chrono::Weekday) -> Self {
        WeekDay::ALL[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selection state of a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DaySelection {
    #[default]
    Unselected,
    /// Every occurrence of the day (`MO`)
    Every,
    /// The nth occurrence within the period (`2TU`, `-1FR`)
    Nth(i16),
}

impl DaySelection {
    pub fn is_selected(self) -> bool {
        !matches!(self, DaySelection::Unselected)
    }
}

impl From<bool> for DaySelection {
    fn from(selected: bool) -> Self {
        if selected {
            DaySelection::Every
        } else {
            DaySelection::Unselected
        }
    }
}

/// The set of weekdays a recurrence rule runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekDays {
    days: [DaySelection; 7],
}

impl WeekDays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse BYDAY tokens such as `MO`, `2TU` or `-1FR`.
    ///
    /// Tokens with an unknown abbreviation or a malformed ordinal are
    /// skipped; they never invalidate the rest of the set.
    pub fn from_by_day<S: AsRef<str>>(parts: &[S]) -> Self {
        parts
            .iter()
            .filter_map(|part| parse_by_day_token(part.as_ref()))
            .fold(WeekDays::new(), |days, (day, selection)| {
                days.set_week_day(day, selection)
            })
    }

    /// BYDAY tokens for all selected days, in Monday..Sunday order.
    pub fn to_by_day(&self) -> Vec<String> {
        WeekDay::ALL
            .into_iter()
            .filter_map(|day| match self.get(day) {
                DaySelection::Unselected => None,
                DaySelection::Every => Some(day.abbreviation().to_string()),
                DaySelection::Nth(n) => Some(format!("{}{}", n, day.abbreviation())),
            })
            .collect()
    }

    pub fn get(&self, day: WeekDay) -> DaySelection {
        self.days[day.index()]
    }

    /// Return a copy with `day` set to `value`.
    pub fn set_week_day(&self, day: WeekDay, value: impl Into<DaySelection>) -> Self {
        let mut days = self.days;
        days[day.index()] = value.into();
        WeekDays { days }
    }

    /// Return a copy with the weekday of `date` set to `value`.
    pub fn set_week_day_from_date(&self, date: NaiveDate, value: impl Into<DaySelection>) -> Self {
        match WeekDay::from_iso_number(date.weekday().number_from_monday()) {
            Some(day) => self.set_week_day(day, value),
            None => *self,
        }
    }

    /// True when no day is selected.
    pub fn is_default(&self) -> bool {
        !self.days.iter().any(|selection| selection.is_selected())
    }

    /// Selected days with their selection, in Monday..Sunday order.
    pub fn selected(&self) -> impl Iterator<Item = (WeekDay, DaySelection)> + '_ {
        WeekDay::ALL
            .into_iter()
            .map(|day| (day, self.get(day)))
            .filter(|(_, selection)| selection.is_selected())
    }
}

impl fmt::Display for WeekDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_by_day().join(","))
    }
}

/// Split `[ordinal]AB` into its weekday and selection.
fn parse_by_day_token(token: &str) -> Option<(WeekDay, DaySelection)> {
    let token = token.trim();
    let split = token.len().checked_sub(2)?;
    if !token.is_char_boundary(split) {
        return None;
    }
    let (ordinal, abbr) = token.split_at(split);
    let day = WeekDay::from_abbreviation(abbr)?;

    if ordinal.is_empty() {
        return Some((day, DaySelection::Every));
    }

    let n: i16 = ordinal.parse().ok()?;
    if n == 0 || n.abs() > 53 {
        return None;
    }
    Some((day, DaySelection::Nth(n)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_weekdays_are_default() {
        let days = WeekDays::new();
        assert!(days.is_default());
        assert!(days.to_by_day().is_empty());

        let days = days.set_week_day(WeekDay::Monday, true);
        assert!(!days.is_default());
    }

    #[test]
    fn set_week_day_does_not_touch_the_original() {
        let original = WeekDays::new();
        let updated = original.set_week_day(WeekDay::Friday, true);

        assert_eq!(original.get(WeekDay::Friday), DaySelection::Unselected);
        assert_eq!(updated.get(WeekDay::Friday), DaySelection::Every);
    }

    #[test]
    fn from_by_day_selects_listed_days() {
        let days = WeekDays::from_by_day(&["MO", "WE", "FR"]);

        assert_eq!(days.get(WeekDay::Monday), DaySelection::Every);
        assert_eq!(days.get(WeekDay::Tuesday), DaySelection::Unselected);
        assert_eq!(days.get(WeekDay::Wednesday), DaySelection::Every);
        assert_eq!(days.get(WeekDay::Friday), DaySelection::Every);

        let mut tokens = days.to_by_day();
        tokens.sort();
        assert_eq!(tokens, vec!["FR", "MO", "WE"]);
    }

    #[test]
    fn to_by_day_uses_monday_first_order() {
        let days = WeekDays::from_by_day(&["SU", "TH", "MO", "SA"]);
        assert_eq!(days.to_by_day(), vec!["MO", "TH", "SA", "SU"]);
    }

    #[test]
    fn from_by_day_keeps_ordinals() {
        let days = WeekDays::from_by_day(&["2TU", "-1FR", "+1MO"]);

        assert_eq!(days.get(WeekDay::Tuesday), DaySelection::Nth(2));
        assert_eq!(days.get(WeekDay::Friday), DaySelection::Nth(-1));
        assert_eq!(days.get(WeekDay::Monday), DaySelection::Nth(1));
        assert_eq!(days.to_by_day(), vec!["1MO", "2TU", "-1FR"]);
    }

    #[test]
    fn from_by_day_ignores_unknown_tokens() {
        let days = WeekDays::from_by_day(&["XX", "MO", "", "0TU", "99WE", "M", "ÄÖ", "xTH"]);

        assert_eq!(days.to_by_day(), vec!["MO"]);
    }

    #[test]
    fn set_week_day_from_date_uses_iso_weekday() {
        // 2024-01-03 is a Wednesday
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let days = WeekDays::new().set_week_day_from_date(date, true);

        assert_eq!(days.get(WeekDay::Wednesday), DaySelection::Every);
        assert_eq!(days.selected().count(), 1);

        // 2024-01-07 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let days = days.set_week_day_from_date(sunday, true);
        assert_eq!(days.to_by_day(), vec!["WE", "SU"]);
    }

    #[test]
    fn iso_numbers_map_to_days() {
        assert_eq!(WeekDay::from_iso_number(1), Some(WeekDay::Monday));
        assert_eq!(WeekDay::from_iso_number(7), Some(WeekDay::Sunday));
        assert_eq!(WeekDay::from_iso_number(0), None);
        assert_eq!(WeekDay::from_iso_number(8), None);
    }

    #[test]
    fn display_joins_tokens() {
        let days = WeekDays::from_by_day(&["FR", "MO"]);
        assert_eq!(days.to_string(), "MO,FR");
    }
}
