//! Month-grouping calendar builder
//!
//! Pure transformations from unordered dated items into ordered month
//! buckets and 42-cell month grids. Everything here is a deterministic
//! function of its inputs and the `today` passed in; there is no hidden
//! state.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};

/// French long month names, as the views display them
const MONTHS_FR: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Sortable `"YYYY-MM"` key of a date
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// `"YYYY-MM-DD"` key of a date
pub fn day_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Human label of a month, e.g. `"mai 2025"`
pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTHS_FR
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{name} {year}")
}

/// A bucket of items sharing a calendar year-month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup<T> {
    /// Sortable `"YYYY-MM"` key
    pub key: String,
    /// Locale label, e.g. `"mai 2025"`
    pub label: String,
    /// Items of this month, in input order
    pub items: Vec<T>,
}

/// Bucket items by calendar month, ascending by key.
///
/// Items for which `date_of` returns `None` (unparsable or absent dates)
/// are excluded rather than failing the grouping.
pub fn group_by_month<T, F>(items: &[T], date_of: F) -> Vec<MonthGroup<T>>
where
    T: Clone,
    F: Fn(&T) -> Option<NaiveDate>,
{
    let mut by_key: BTreeMap<String, MonthGroup<T>> = BTreeMap::new();
    for item in items {
        let Some(date) = date_of(item) else { continue };
        let key = month_key(date);
        by_key
            .entry(key.clone())
            .or_insert_with(|| MonthGroup {
                key,
                label: month_label(date.year(), date.month()),
                items: Vec::new(),
            })
            .items
            .push(item.clone());
    }
    by_key.into_values().collect()
}

/// Index of the first group at or after the current month; when all
/// groups are in the past, the last one; `None` when there are no groups.
pub fn initial_month_index<T>(groups: &[MonthGroup<T>], today: NaiveDate) -> Option<usize> {
    if groups.is_empty() {
        return None;
    }
    let current = month_key(today);
    Some(
        groups
            .iter()
            .position(|g| g.key >= current)
            .unwrap_or(groups.len() - 1),
    )
}

/// Month navigation over grouped items, starting at the current month
#[derive(Debug, Clone)]
pub struct MonthPager<T> {
    groups: Vec<MonthGroup<T>>,
    index: usize,
}

impl<T> MonthPager<T> {
    pub fn new(groups: Vec<MonthGroup<T>>, today: NaiveDate) -> Self {
        let index = initial_month_index(&groups, today).unwrap_or(0);
        Self { groups, index }
    }

    pub fn current(&self) -> Option<&MonthGroup<T>> {
        self.groups.get(self.index)
    }

    pub fn can_prev(&self) -> bool {
        self.index > 0
    }

    pub fn can_next(&self) -> bool {
        self.index + 1 < self.groups.len()
    }

    pub fn prev(&mut self) {
        if self.can_prev() {
            self.index -= 1;
        }
    }

    pub fn next(&mut self) {
        if self.can_next() {
            self.index += 1;
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Bucket items by calendar day for grid construction
pub fn group_by_day<T, F>(items: &[T], date_of: F) -> HashMap<NaiveDate, Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> Option<NaiveDate>,
{
    let mut by_day: HashMap<NaiveDate, Vec<T>> = HashMap::new();
    for item in items {
        let Some(date) = date_of(item) else { continue };
        by_day.entry(date).or_default().push(item.clone());
    }
    by_day
}

/// One cell of the 6x7 month grid
#[derive(Debug, Clone, PartialEq)]
pub struct DayCell<T> {
    pub date: NaiveDate,
    /// `"YYYY-MM-DD"` key
    pub ymd: String,
    /// Whether the cell belongs to the displayed month
    pub in_month: bool,
    /// Strictly before today
    pub is_past: bool,
    pub is_today: bool,
    pub items: Vec<T>,
}

/// A full 42-cell month view with its default selection
#[derive(Debug, Clone)]
pub struct MonthGrid<T> {
    pub year: i32,
    /// 1-12
    pub month: u32,
    pub label: String,
    /// Exactly 42 cells, starting the Monday on/before the 1st
    pub cells: Vec<DayCell<T>>,
    /// Default selection: today when visible and in-month, else the first
    /// in-month day with items, else the 1st of the month
    pub selected: NaiveDate,
}

/// Build the 6-week grid of a month. Returns `None` for an invalid
/// year/month pair.
pub fn build_month_grid<T: Clone>(
    year: i32,
    month: u32,
    items_by_day: &HashMap<NaiveDate, Vec<T>>,
    today: NaiveDate,
) -> Option<MonthGrid<T>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let shift = first.weekday().num_days_from_monday() as i64;
    let start = first - Duration::days(shift);

    let mut cells = Vec::with_capacity(42);
    for i in 0..42 {
        let date = start + Duration::days(i);
        cells.push(DayCell {
            date,
            ymd: day_key(date),
            in_month: date.year() == year && date.month() == month,
            is_past: date < today,
            is_today: date == today,
            items: items_by_day.get(&date).cloned().unwrap_or_default(),
        });
    }

    let today_cell = cells.iter().find(|c| c.is_today && c.in_month);
    let first_with_items = cells.iter().find(|c| c.in_month && !c.items.is_empty());
    let selected = match (today_cell, first_with_items) {
        (Some(c), _) => c.date,
        (None, Some(c)) => c.date,
        (None, None) => first,
    };

    Some(MonthGrid {
        year,
        month,
        label: month_label(year, month),
        cells,
        selected,
    })
}

/// The month before (year, month), wrapping the year
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// The month after (year, month), wrapping the year
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}
