use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::dataset::Dataset;
use crate::compiler::{Weights, compile};
use crate::vm::Vm;

/// Confusion counts and mean absolute error of one weight vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvalStats {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tn: usize,
    pub total: usize,
    pub mae: f64,
}

impl EvalStats {
    /// Folds `(predicted, observed)` pairs. A pair is positive when its value
    /// exceeds `threshold`.
    pub fn from_predictions<I>(predictions: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut stats = Self::default();
        let mut error = 0.0;

        for (predicted, observed) in predictions {
            match (predicted > threshold, observed > threshold) {
                (true, true) => stats.tp += 1,
                (true, false) => stats.fp += 1,
                (false, true) => stats.fn_ += 1,
                (false, false) => {}
            }
            error += (predicted - observed).abs();
            stats.total += 1;
        }

        stats.tn = stats.total - stats.tp - stats.fp - stats.fn_;
        if stats.total > 0 {
            stats.mae = error / stats.total as f64;
        }
        stats
    }

    /// Value minimized by the optimizer.
    pub fn fitness(&self) -> f64 {
        if self.total == 0 {
            f64::INFINITY
        } else {
            self.mae
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f_beta(&self, beta: f64) -> f64 {
        let (precision, recall) = (self.precision(), self.recall());
        let beta2 = beta * beta;
        let denominator = beta2 * precision + recall;

        if denominator == 0.0 {
            0.0
        } else {
            (1.0 + beta2) * precision * recall / denominator
        }
    }
}

impl fmt::Display for EvalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE: {:.4}, precision: {:.4}, recall: {:.4} (TP: {}, FP: {}, FN: {}, TN: {}, total: {})",
            self.mae,
            self.precision(),
            self.recall(),
            self.tp,
            self.fp,
            self.fn_,
            self.tn,
            self.total
        )
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Scores every sample with `weights`. Samples that fail are logged and left out.
pub fn evaluate(dataset: &Dataset, weights: &Weights, threshold: f64, vm: &mut Vm) -> EvalStats {
    let predictions = dataset.iter().filter_map(|sample| {
        let score = compile(&sample.query, weights)
            .map_err(|err| err.to_string())
            .and_then(|program| vm.run(&program).map_err(|err| err.to_string()));

        match score {
            Ok(score) => Some((score, sample.seconds)),
            Err(err) => {
                warn!(query = %sample.text, error = %err, "Failed to score sample");
                None
            }
        }
    });

    EvalStats::from_predictions(predictions, threshold)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::compiler::WeightSlot;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_confusion_counts() {
        let stats = EvalStats::from_predictions(
            [(2.0, 3.0), (2.0, 0.5), (0.5, 2.0), (0.1, 0.2), (0.3, 0.3)],
            1.0,
        );

        assert_eq!((stats.tp, stats.fp, stats.fn_, stats.tn), (1, 1, 1, 2));
        assert_eq!(stats.total, 5);
        assert_close(stats.mae, (1.0 + 1.5 + 1.5 + 0.1) / 5.0);
        assert_close(stats.precision(), 0.5);
        assert_close(stats.recall(), 0.5);
        assert_close(stats.f_beta(0.5), 0.5);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let stats = EvalStats::from_predictions([(1.0, 1.0)], 1.0);
        assert_eq!(stats.tn, 1);
    }

    #[test]
    fn test_empty() {
        let stats = EvalStats::from_predictions([], 1.0);

        assert_eq!(stats.total, 0);
        assert_eq!(stats.fitness(), f64::INFINITY);
        assert_eq!(stats.precision(), 0.0);
        assert_eq!(stats.recall(), 0.0);
        assert_eq!(stats.f_beta(1.0), 0.0);
    }

    #[rstest]
    #[case(1.0, 2.0 / 3.0)]
    #[case(0.5, 0.625 / 0.75)]
    #[case(2.0, 2.5 / 4.5)]
    fn test_f_beta(#[case] beta: f64, #[case] expected: f64) {
        // precision 1.0, recall 0.5
        let stats = EvalStats {
            tp: 1,
            fn_: 1,
            total: 2,
            ..Default::default()
        };

        assert_close(stats.f_beta(beta), expected);
    }

    #[test]
    fn test_evaluate() {
        let dataset = Dataset::from_pairs([(r#"[word=".*"]"#, 10.0), (r#"[word="a"]"#, 0.1)]);
        let weights = Weights::default().with(WeightSlot::RgAny, 10.0);
        let stats = evaluate(&dataset, &weights, 1.0, &mut Vm::new());

        assert_eq!(stats.total, 2);
        assert_eq!((stats.tp, stats.tn), (1, 1));
        assert_close(stats.mae, 0.45);
    }
}
