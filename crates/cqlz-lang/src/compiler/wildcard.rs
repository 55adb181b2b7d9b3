/// Probability that a run of `n + 1` consecutive `.` wildcards is the
/// dominant cost of a regular expression. Fitted on benchmark data.
pub const WILDCARD_RUN_PROB: [f64; 12] = [
    1.0, 0.62, 0.39, 0.24, 0.15, 0.094, 0.058, 0.036, 0.022, 0.014, 0.0085, 0.0053,
];

/// Used for runs longer than [`WILDCARD_RUN_PROB`].
pub const WILDCARD_RUN_FALLBACK: f64 = 0.003;

pub fn wildcard_run_probability(run: usize) -> f64 {
    match run {
        0 => 0.0,
        n => WILDCARD_RUN_PROB
            .get(n - 1)
            .copied()
            .unwrap_or(WILDCARD_RUN_FALLBACK),
    }
}
