//! Monte Carlo trials - error vs sample count
//!
//! Averages the reference scenario over seeded trials and checks the
//! shape of the error curve.

use rangebearing_filter::{monte_carlo_error_curve, run_experiment, ExperimentConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_error_drops_an_order_of_magnitude_by_200() {
        let config = ExperimentConfig::pedagogical()
            .with_samples(200)
            .with_checkpoints(vec![0, 200]);
        let curve = monte_carlo_error_curve(&config, 20).unwrap();

        let e0 = curve.mean_error_at(0).unwrap();
        let e200 = curve.mean_error_at(200).unwrap();
        println!("mean error: n=0 {:.4}, n=200 {:.4}", e0, e200);

        assert!((e0 - 2.5).abs() < 1e-12);
        assert!(
            e200 * 10.0 < e0,
            "mean error at 200 samples ({}) not 10x below initial ({})",
            e200,
            e0
        );
    }

    #[test]
    fn test_curve_points_follow_schedule() {
        let config = ExperimentConfig::pedagogical()
            .with_samples(100)
            .with_checkpoints(vec![100, 0, 10, 500]);
        let curve = monte_carlo_error_curve(&config, 4).unwrap();

        assert_eq!(curve.trials, 4);
        let samples: Vec<usize> = curve.points.iter().map(|p| p.samples).collect();
        assert_eq!(samples, vec![0, 10, 100]);
        for p in &curve.points {
            assert!(p.mean_error <= p.max_error + 1e-15);
        }
    }

    #[test]
    fn test_monte_carlo_is_deterministic() {
        let config = ExperimentConfig::pedagogical().with_samples(100);
        let a = monte_carlo_error_curve(&config, 6).unwrap();
        let b = monte_carlo_error_curve(&config, 6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_trials_match_individual_runs() {
        let config = ExperimentConfig::pedagogical()
            .with_samples(50)
            .with_checkpoints(vec![50]);
        let curve = monte_carlo_error_curve(&config, 3).unwrap();

        let errors: Vec<f64> = (0..3)
            .map(|k| {
                run_experiment(&config.clone().with_seed(config.seed + k))
                    .unwrap()
                    .final_error
            })
            .collect();
        let mean = errors.iter().sum::<f64>() / 3.0;
        assert!((curve.mean_error_at(50).unwrap() - mean).abs() < 1e-12);
    }
}
