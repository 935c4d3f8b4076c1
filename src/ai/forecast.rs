//! Seven-day order volume projection from a least-squares trend line.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub const MIN_ORDERS: usize = 5;
pub const HORIZON_DAYS: u64 = 7;

pub const NOT_ENOUGH_ORDERS: &str = "Pas assez de données pour une prédiction fiable.";
pub const SINGLE_DAY: &str =
    "Données historiques sur une seule journée. Prédiction impossible.";

/// Historical order as seen by the forecaster.
#[derive(Debug, Clone, Copy)]
pub struct OrderSample {
    pub created_at: DateTime<Utc>,
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum Forecast {
    /// Not enough history; `forecast` is always empty.
    Diagnostic {
        forecast: Vec<ForecastPoint>,
        message: String,
    },
    Projection(Vec<ForecastPoint>),
}

impl Forecast {
    fn diagnostic(message: &str) -> Self {
        Forecast::Diagnostic {
            forecast: Vec::new(),
            message: message.to_string(),
        }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        match self {
            Forecast::Diagnostic { forecast, .. } => forecast,
            Forecast::Projection(points) => points,
        }
    }
}

/// Orders per calendar day, time of day discarded.
fn daily_counts(orders: &[OrderSample]) -> BTreeMap<NaiveDate, u32> {
    let mut counts = BTreeMap::new();
    for order in orders {
        *counts.entry(order.created_at.date_naive()).or_insert(0) += 1;
    }
    counts
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
fn fit_line(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut covariance, mut variance) = (0.0, 0.0);
    for (x, y) in points {
        covariance += (x - mean_x) * (y - mean_y);
        variance += (x - mean_x) * (x - mean_x);
    }

    let slope = if variance == 0.0 {
        0.0
    } else {
        covariance / variance
    };
    (mean_y - slope * mean_x, slope)
}

pub fn predict(orders: &[OrderSample]) -> Forecast {
    if orders.len() < MIN_ORDERS {
        return Forecast::diagnostic(NOT_ENOUGH_ORDERS);
    }

    let counts = daily_counts(orders);
    if counts.len() < 2 {
        return Forecast::diagnostic(SINGLE_DAY);
    }

    let Some(start) = counts.keys().next().copied() else {
        return Forecast::diagnostic(NOT_ENOUGH_ORDERS);
    };

    let points: Vec<(f64, f64)> = counts
        .iter()
        .map(|(day, count)| ((*day - start).num_days() as f64, f64::from(*count)))
        .collect();
    let last_day = points.iter().map(|(x, _)| *x as u64).max().unwrap_or(0);

    let (intercept, slope) = fit_line(&points);

    let forecast = (1..=HORIZON_DAYS)
        .filter_map(|offset| {
            let day_index = last_day + offset;
            let date = start.checked_add_days(Days::new(day_index))?;
            let predicted = (intercept + slope * day_index as f64)
                .round_ties_even()
                .max(0.0);
            Some(ForecastPoint {
                date,
                predicted_orders: predicted as i64,
            })
        })
        .collect();

    Forecast::Projection(forecast)
}
