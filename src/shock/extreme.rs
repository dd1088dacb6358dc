//! Extreme selection over a scenario path.
//!
//! Missing values are skipped. Ties go to the earliest period.

use crate::domain::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

/// A value together with the period it was observed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub period: Period,
    pub value: f64,
}

/// Non-missing observations in path order.
pub fn observations(path: &[(Period, Option<f64>)]) -> impl Iterator<Item = Observation> + '_ {
    path.iter().filter_map(|&(period, value)| {
        value
            .filter(|v| !v.is_nan())
            .map(|value| Observation { period, value })
    })
}

/// The smallest or largest observation; `None` if the path has no values.
pub fn select(path: &[(Period, Option<f64>)], which: Extreme) -> Option<Observation> {
    observations(path).fold(None, |best: Option<Observation>, obs| match best {
        None => Some(obs),
        Some(current) => {
            // Strict comparison keeps the earliest period on ties.
            let better = match which {
                Extreme::Min => obs.value < current.value,
                Extreme::Max => obs.value > current.value,
            };
            Some(if better { obs } else { current })
        }
    })
}

/// Both extremes, `(min, max)`.
pub fn select_range(path: &[(Period, Option<f64>)]) -> Option<(Observation, Observation)> {
    Some((select(path, Extreme::Min)?, select(path, Extreme::Max)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(values: &[Option<f64>]) -> Vec<(Period, Option<f64>)> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (Period::new(2025 + (i / 4) as i32, (i % 4) as u8 + 1).unwrap(), v))
            .collect()
    }

    #[test]
    fn skips_missing_values() {
        let p = path(&[None, Some(3.0), None, Some(1.0)]);
        assert_eq!(select(&p, Extreme::Min).unwrap().value, 1.0);
        assert_eq!(select(&p, Extreme::Max).unwrap().value, 3.0);
    }

    #[test]
    fn ties_keep_earliest_period() {
        let p = path(&[Some(2.0), Some(5.0), Some(1.0), Some(5.0), Some(1.0)]);
        let max = select(&p, Extreme::Max).unwrap();
        let min = select(&p, Extreme::Min).unwrap();
        assert_eq!(max.period, Period::new(2025, 2).unwrap());
        assert_eq!(min.period, Period::new(2025, 3).unwrap());
    }

    #[test]
    fn all_missing_has_no_extreme() {
        let p = path(&[None, None, Some(f64::NAN)]);
        assert!(select(&p, Extreme::Min).is_none());
        assert!(select_range(&p).is_none());
        assert!(select(&[], Extreme::Max).is_none());
    }
}
