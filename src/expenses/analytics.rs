use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::Expense;

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    /// Percent of the overall total.
    pub share: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DailyTotal {
    pub date: String,
    pub amount: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub month: String,
    pub name: String,
    pub formatted_month: String,
    pub amount: f64,
    pub previous_month: Option<String>,
    /// Percent change against the previous month present in the data.
    pub change: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct HighestMonth {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_spent: f64,
    pub average_spent: f64,
    pub transaction_count: usize,
    pub categories: Vec<CategoryTotal>,
    pub daily: Vec<DailyTotal>,
    pub monthly: Vec<MonthlyTotal>,
    pub highest_month: Option<HighestMonth>,
    pub average_monthly: f64,
}

struct MonthBucket {
    name: String,
    formatted: String,
    amount: f64,
}

pub fn is_valid_month(month: &str) -> bool {
    lazy_static! {
        static ref MONTH_RE: Regex = Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap();
    }
    MONTH_RE.is_match(month)
}

fn month_key(at: OffsetDateTime) -> String {
    format!("{:04}-{:02}", at.year(), u8::from(at.month()))
}

fn day_key(at: OffsetDateTime) -> String {
    format!("{}-{:02}", month_key(at), at.day())
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Aggregates `expenses` in UTC. `month` (already validated) narrows the
/// monthly series; every other figure covers all expenses.
pub fn summarize(expenses: &[Expense], month: Option<&str>) -> Analytics {
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let count = expenses.len();

    let mut by_category: HashMap<&str, f64> = HashMap::new();
    let mut by_day: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_month: BTreeMap<String, MonthBucket> = BTreeMap::new();

    for e in expenses {
        let at = e.created_at.to_offset(time::UtcOffset::UTC);
        *by_category.entry(e.category.as_str()).or_default() += e.amount;
        *by_day.entry(day_key(at)).or_default() += e.amount;
        by_month
            .entry(month_key(at))
            .or_insert_with(|| {
                let full = at.month().to_string();
                MonthBucket {
                    name: full.chars().take(3).collect(),
                    formatted: format!("{} {}", full, at.year()),
                    amount: 0.0,
                }
            })
            .amount += e.amount;
    }

    let mut categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            total: round_to(amount, 2),
            share: if total > 0.0 {
                round_to(amount / total * 100.0, 1)
            } else {
                0.0
            },
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    let daily = by_day
        .into_iter()
        .map(|(date, amount)| DailyTotal {
            date,
            amount: round_to(amount, 2),
        })
        .collect();

    let mut monthly = Vec::with_capacity(by_month.len());
    let mut previous: Option<&MonthBucket> = None;
    let mut highest: Option<(&String, f64)> = None;
    for (key, bucket) in &by_month {
        let change = match previous {
            Some(prev) if prev.amount != 0.0 => {
                round_to((bucket.amount - prev.amount) / prev.amount * 100.0, 1)
            }
            _ => 0.0,
        };
        // Later months win ties.
        if highest.map_or(true, |(_, best)| bucket.amount >= best) {
            highest = Some((key, bucket.amount));
        }
        monthly.push(MonthlyTotal {
            month: key.clone(),
            name: bucket.name.clone(),
            formatted_month: bucket.formatted.clone(),
            amount: round_to(bucket.amount, 2),
            previous_month: previous.map(|p| p.name.clone()),
            change,
        });
        previous = Some(bucket);
    }

    let average_monthly = if by_month.is_empty() {
        0.0
    } else {
        round_to(
            by_month.values().map(|b| b.amount).sum::<f64>() / by_month.len() as f64,
            2,
        )
    };

    if let Some(month) = month {
        monthly.retain(|m| m.month == month);
    }

    Analytics {
        total_spent: round_to(total, 2),
        average_spent: if count > 0 {
            round_to(total / count as f64, 2)
        } else {
            0.0
        },
        transaction_count: count,
        categories,
        daily,
        monthly,
        highest_month: highest.map(|(month, amount)| HighestMonth {
            month: month.clone(),
            amount: round_to(amount, 2),
        }),
        average_monthly,
    }
}
