//! Shaping of per-day booking sums into sales and attendance series.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bookings paid on one calendar day, summed by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySales {
    pub day: NaiveDate,
    pub payment: f64,
    pub booked: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySales {
    pub date: String,
    pub total_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyParticipants {
    pub date: String,
    pub total_participants: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    /// e.g. `Mar'25`
    pub date: String,
    pub total_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SalesTotals {
    pub total_sale: f64,
    pub total_participants: i64,
}

fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Orders the days and fills every missing day between the first and last
/// with `T::default()`.
fn fill_days<T, F>(records: &[DaySales], mut accumulate: F) -> Vec<(NaiveDate, T)>
where
    T: Default + Clone,
    F: FnMut(&mut T, &DaySales),
{
    let mut buckets: BTreeMap<NaiveDate, T> = BTreeMap::new();
    for record in records {
        accumulate(buckets.entry(record.day).or_default(), record);
    }

    let (Some(first), Some(last)) = (
        buckets.keys().next().copied(),
        buckets.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| (day, buckets.get(&day).cloned().unwrap_or_default()))
        .collect()
}

pub fn daily_sales(records: &[DaySales]) -> Vec<DailySales> {
    fill_days(records, |total: &mut f64, r| *total += r.payment)
        .into_iter()
        .map(|(day, total_payment)| DailySales {
            date: format_day(day),
            total_payment,
        })
        .collect()
}

pub fn daily_participants(records: &[DaySales]) -> Vec<DailyParticipants> {
    fill_days(records, |total: &mut i64, r| *total += r.booked)
    .into_iter()
    .map(|(day, total_participants)| DailyParticipants {
        date: format_day(day),
        total_participants,
    })
    .collect()
}

/// Only months that actually carry sales are returned, oldest first.
pub fn monthly_sales(records: &[DaySales]) -> Vec<MonthlySales> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in records {
        let key = (record.day.year(), record.day.month());
        *buckets.entry(key).or_default() += record.payment;
    }

    buckets
        .into_iter()
        .filter_map(|((year, month), total_payment)| {
            let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(MonthlySales {
                date: first_day.format("%b'%y").to_string(),
                total_payment,
            })
        })
        .collect()
}
