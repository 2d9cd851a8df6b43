//! Conservation and bounds of the partitioning rules over a grid of inputs.

use approx::assert_abs_diff_eq;
use palmsim_core::partitioning::{parametrized, prioritized, proportionate};

fn supplies() -> Vec<f64> {
    vec![0.0, 0.3, 1.0, 2.5, 7.0, 40.0]
}

fn demand_sets() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, 1.0],
        vec![1.5, 1.0],
        vec![0.2, 5.0],
        vec![3.0, 0.5, 2.0],
        vec![10.0, 0.1, 0.1, 4.0],
        vec![0.0, 2.0],
        vec![4.0, 0.0, 1.0],
    ]
}

/// Demand sets whose last demand is zero.
fn trailing_zero_sets() -> Vec<Vec<f64>> {
    vec![vec![1.0, 0.0], vec![0.5, 2.0, 0.0], vec![0.0, 0.0]]
}

fn assert_shares_bounded(shares: &[f64], supply: f64, demands: &[f64]) {
    for (share, demand) in shares.iter().zip(demands.iter()) {
        assert!(
            *share >= 0.0 && *share <= supply + 1e-12,
            "share {} outside [0, {}] in {:?}",
            share,
            supply,
            shares
        );
        if *demand == 0.0 {
            assert_eq!(*share, 0.0, "zero demand received {} in {:?}", share, shares);
        }
    }
}

#[test]
fn prioritized_conserves_supply() {
    for supply in supplies() {
        for demands in demand_sets() {
            let shares = prioritized(supply, &demands).unwrap();
            let total: f64 = shares.iter().sum();
            assert_abs_diff_eq!(total, supply, epsilon = 1e-9);
            assert_shares_bounded(&shares, supply, &demands);
        }
    }
}

#[test]
fn prioritized_never_exceeds_leading_demands() {
    for supply in supplies() {
        for demands in demand_sets() {
            let shares = prioritized(supply, &demands).unwrap();
            for (share, demand) in shares.iter().zip(demands.iter()).take(demands.len() - 1) {
                assert!(
                    *share <= *demand + 1e-12,
                    "share {:.3} exceeds demand {:.3}",
                    share,
                    demand
                );
            }
        }
    }
}

#[test]
fn proportionate_conserves_supply_and_ratios() {
    for supply in supplies() {
        for demands in demand_sets() {
            let shares = proportionate(supply, &demands).unwrap();
            let total: f64 = shares.iter().sum();
            assert_abs_diff_eq!(total, supply, epsilon = 1e-9);
            assert_shares_bounded(&shares, supply, &demands);

            let demand_total: f64 = demands.iter().sum();
            for (share, demand) in shares.iter().zip(demands.iter()) {
                assert_abs_diff_eq!(*share, supply * demand / demand_total, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn parametrized_conserves_supply() {
    for k in [0.0, 0.25, 0.8, 1.0] {
        for supply in supplies() {
            for demands in demand_sets() {
                let shares = parametrized(supply, &demands, k).unwrap();
                let total: f64 = shares.iter().sum();
                assert_abs_diff_eq!(total, supply, epsilon = 1e-9);
                assert_shares_bounded(&shares, supply, &demands);
            }
        }
    }
}

#[test]
fn trailing_zero_demand_gets_nothing() {
    for supply in supplies() {
        for demands in trailing_zero_sets() {
            let shares = prioritized(supply, &demands).unwrap();
            assert_shares_bounded(&shares, supply, &demands);
            let total: f64 = shares.iter().sum();
            assert!(total <= supply + 1e-9, "{:?} exceeds supply {}", shares, supply);
        }
    }
}
