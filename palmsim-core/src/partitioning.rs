//! Partitioning of an assimilate supply among competing sinks.
//!
//! Three rules are provided:
//!
//! - [`prioritized`]: demands are served greedily in list order. Every demand
//!   but the last receives its full amount while supply lasts; the last
//!   demand receives whatever remains.
//! - [`proportionate`]: every demand receives a share of the supply
//!   proportional to its size,
//!   $$ A_i = S \frac{D_i}{\sum_j D_j} $$
//! - [`parametrized`]: a blend of both,
//!   $$ A_i = k\,A_i^{prio} + (1-k)\,A_i^{prop} $$
//!   where $k$ is the priority of the first demand(s).
//!
//! A demand of exactly zero always receives zero.

use crate::errors::{PalmSimError, PalmSimResult};
use crate::timestep::FloatValue;

fn check_inputs(supply: FloatValue, demands: &[FloatValue]) -> PalmSimResult<()> {
    if !(supply >= 0.0) {
        return Err(PalmSimError::invariant("partitioning", "supply", supply));
    }
    if let Some(&negative) = demands.iter().find(|d| !(**d >= 0.0)) {
        return Err(PalmSimError::invariant("partitioning", "demand", negative));
    }
    Ok(())
}

/// Serve `demands` in order until `supply` is exhausted.
///
/// Leftover supply goes to the last demand unless that demand is zero.
///
/// ```
/// use palmsim_core::partitioning::prioritized;
///
/// assert_eq!(prioritized(2.0, &[1.5, 1.0]).unwrap(), vec![1.5, 0.5]);
/// assert_eq!(prioritized(2.0, &[2.0, 1.0]).unwrap(), vec![2.0, 0.0]);
/// assert_eq!(prioritized(4.0, &[2.0, 1.0]).unwrap(), vec![2.0, 2.0]);
/// ```
pub fn prioritized(supply: FloatValue, demands: &[FloatValue]) -> PalmSimResult<Vec<FloatValue>> {
    check_inputs(supply, demands)?;

    let mut remaining = supply;
    let last = demands.len().saturating_sub(1);
    let shares = demands
        .iter()
        .enumerate()
        .map(|(i, &demand)| {
            if demand == 0.0 {
                0.0
            } else if i == last {
                remaining.max(0.0)
            } else if demand < remaining {
                remaining -= demand;
                demand
            } else {
                let share = remaining.max(0.0);
                remaining = 0.0;
                share
            }
        })
        .collect();
    Ok(shares)
}

/// Share `supply` in proportion to `demands`.
///
/// Fails with [`PalmSimError::ZeroTotalDemand`] when all demands are zero.
pub fn proportionate(
    supply: FloatValue,
    demands: &[FloatValue],
) -> PalmSimResult<Vec<FloatValue>> {
    check_inputs(supply, demands)?;

    let total: FloatValue = demands.iter().sum();
    if total <= 0.0 {
        return Err(PalmSimError::ZeroTotalDemand { supply });
    }
    Ok(demands.iter().map(|d| supply * d / total).collect())
}

/// Blend of [`prioritized`] (weight `priority`) and [`proportionate`].
pub fn parametrized(
    supply: FloatValue,
    demands: &[FloatValue],
    priority: FloatValue,
) -> PalmSimResult<Vec<FloatValue>> {
    if !(0.0..=1.0).contains(&priority) {
        return Err(PalmSimError::invalid_parameter(
            "priority",
            format!("must lie within [0, 1], got {}", priority),
        ));
    }
    let prio = prioritized(supply, demands)?;
    let prop = proportionate(supply, demands)?;
    Ok(prio
        .iter()
        .zip(prop.iter())
        .map(|(a, b)| priority * a + (1.0 - priority) * b)
        .collect())
}

/// Share of each value in the total, or zero everywhere if the total is zero.
pub fn relative_shares(values: &[FloatValue]) -> Vec<FloatValue> {
    let total: FloatValue = values.iter().sum();
    values
        .iter()
        .map(|v| if total > 0.0 { v / total } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn proportionate_edge_cases() {
        assert_eq!(proportionate(6.0, &[2.0, 1.0]).unwrap(), vec![4.0, 2.0]);
        assert_eq!(proportionate(2.0, &[1.0, 1.0]).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn proportionate_zero_total_demand_fails() {
        let err = proportionate(3.0, &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, PalmSimError::ZeroTotalDemand { .. }));
    }

    #[test]
    fn zero_demand_receives_nothing() {
        assert_eq!(prioritized(4.0, &[2.0, 0.0]).unwrap(), vec![2.0, 0.0]);
        assert_eq!(proportionate(4.0, &[2.0, 0.0]).unwrap(), vec![4.0, 0.0]);
    }

    #[test]
    fn negative_demand_is_rejected() {
        assert!(prioritized(1.0, &[1.0, -0.5]).is_err());
        assert!(proportionate(1.0, &[-1.0, 2.0]).is_err());
    }

    #[test]
    fn parametrized_interpolates_between_rules() {
        let supply = 3.0;
        let demands = [2.0, 2.0];
        let k = 0.8;
        let shares = parametrized(supply, &demands, k).unwrap();
        // prioritized: [2, 1], proportionate: [1.5, 1.5]
        assert!(is_close!(shares[0], 0.8 * 2.0 + 0.2 * 1.5));
        assert!(is_close!(shares[1], 0.8 * 1.0 + 0.2 * 1.5));
    }

    #[test]
    fn parametrized_rejects_priority_outside_unit_interval() {
        assert!(parametrized(1.0, &[1.0, 1.0], 1.2).is_err());
    }

    #[test]
    fn relative_shares_of_zero_total() {
        assert_eq!(relative_shares(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(relative_shares(&[1.0, 3.0]), vec![0.25, 0.75]);
    }
}
