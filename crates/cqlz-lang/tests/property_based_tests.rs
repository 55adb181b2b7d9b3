//! Property-based tests for the cost model and the optimizer.
use cqlz_lang::{
    CancelToken, Dataset, Optimizer, OptimizerConfig, Program, Vm, WeightSlot, Weights, compile,
    compiler::wildcard::wildcard_run_probability, optimizer::Chromosome, vm::Instruction,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn run(program: Vec<Instruction>) -> f64 {
    Vm::new().run(&Program::from(program)).unwrap()
}

mod strategies {
    use super::*;

    pub fn value() -> impl Strategy<Value = f64> {
        -1000.0f64..1000.0
    }

    pub fn weights() -> impl Strategy<Value = Weights> {
        prop::collection::vec(0.0f64..100.0, Weights::DIMENSION)
            .prop_map(|genes| Weights::from_vec(genes).unwrap())
    }

    fn regex() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,6}",
            "[a-z]{0,3}\\.[*+]",
            "[a-z]{1,3}\\.{1,4}[a-z]{1,3}",
            "[A-Z]{1,2}\\|[a-z]{1,3}",
            "\\([a-z]{1,3}\\|[a-z]{1,3}\\)",
            "\\[[a-z]{1,3}\\][a-z]?",
            "[a-z]{1,3}\\{[1-3],[4-6]\\}",
        ]
    }

    fn position() -> impl Strategy<Value = String> {
        let attr = prop_oneof![Just("word"), Just("lemma"), Just("tag")];
        let op = prop_oneof![Just("="), Just("!=")];
        prop_oneof![
            (attr, op, regex()).prop_map(|(attr, op, re)| format!(r#"[{attr}{op}"{re}"]"#)),
            regex().prop_map(|re| format!(r#""{re}""#)),
            Just("[]".to_string()),
            (1u32..4, 4u32..8).prop_map(|(from, to)| format!("[]{{{from},{to}}}")),
        ]
    }

    pub fn query() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(position(), 1..4),
            prop_oneof![
                Just(""),
                Just(" within <s/>"),
                Just(" within 5"),
                Just(" containing <p/>"),
            ],
        )
            .prop_map(|(positions, suffix)| format!("{}{suffix}", positions.join(" ")))
    }

    pub fn chromosome() -> impl Strategy<Value = Chromosome> {
        prop::collection::vec(0.0f64..100.0, 1..40).prop_map(Chromosome::new)
    }
}

proptest! {
    #[test]
    fn test_folds_match_sum_and_product(values in prop::collection::vec(strategies::value(), 1..16)) {
        use Instruction::*;

        let fold = |op: Instruction| {
            let mut program = values.iter().copied().map(PushConstant).collect::<Vec<_>>();
            program.extend(std::iter::repeat_n(op, values.len() - 1));
            run(program)
        };
        let magnitude = values.iter().map(|v| v.abs()).sum::<f64>().max(1.0);

        let product = values.iter().product::<f64>();
        prop_assert!(
            (fold(Multiply) - product).abs() <= 1e-9 * product.abs(),
            "{:?}: {} != {}", values, fold(Multiply), product
        );

        let sum = values.iter().sum::<f64>();
        prop_assert!(
            (fold(Add) - sum).abs() <= 1e-9 * magnitude,
            "{:?}: {} != {}", values, fold(Add), sum
        );
    }

    #[test]
    fn test_add_and_multiply_commute(a in strategies::value(), b in strategies::value()) {
        use Instruction::*;

        prop_assert_eq!(run(vec![PushConstant(a), PushConstant(b), Add]), a + b);
        prop_assert_eq!(
            run(vec![PushConstant(a), PushConstant(b), Add]),
            run(vec![PushConstant(b), PushConstant(a), Add])
        );
        prop_assert_eq!(
            run(vec![PushConstant(a), PushConstant(b), Multiply]),
            run(vec![PushConstant(b), PushConstant(a), Multiply])
        );
    }

    #[test]
    fn test_negate_probability_is_involution(x in 0.0f64..=1.0) {
        use Instruction::*;

        let twice = run(vec![PushConstant(x), NegateProbability, NegateProbability]);
        prop_assert!((twice - x).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_is_idempotent(x in strategies::value()) {
        use Instruction::*;

        let once = run(vec![PushConstant(x), Clamp1]);
        prop_assert!(once <= 1.0);
        prop_assert_eq!(once, run(vec![PushConstant(x), Clamp1, Clamp1]));
    }

    #[test]
    fn test_canonical_text_reparses(text in strategies::query()) {
        let query = cqlz_lang::parse(&text).unwrap();
        let reparsed = cqlz_lang::parse(&query.to_string()).unwrap();

        prop_assert_eq!(query, reparsed);
    }

    #[test]
    fn test_compile_is_deterministic(text in strategies::query(), weights in strategies::weights()) {
        let query = cqlz_lang::parse(&text).unwrap();

        prop_assert_eq!(compile(&query, &weights).ok(), compile(&query, &weights).ok());
    }

    #[test]
    fn test_program_leaves_single_nonnegative_value(
        text in strategies::query(),
        weights in strategies::weights(),
    ) {
        let query = cqlz_lang::parse(&text).unwrap();
        let Ok(program) = compile(&query, &weights) else {
            return Ok(());
        };
        let mut vm = Vm::new();
        vm.execute(&program).unwrap();

        prop_assert_eq!(vm.stack().len(), 1);
        prop_assert!(vm.stack()[0] >= 0.0, "{} scored {}", text, vm.stack()[0]);
    }

    #[test]
    fn test_wildcard_runs_never_get_more_likely(run in 1usize..64) {
        prop_assert!(wildcard_run_probability(run + 1) <= wildcard_run_probability(run));
    }

    #[test]
    fn test_rg_any_weight_is_monotonic(low in 0.0f64..50.0, delta in 0.0f64..50.0) {
        let query = cqlz_lang::parse(r#"[word="a.*b"]"#).unwrap();
        let score = |value: f64| {
            cqlz_lang::score(&query, &Weights::default().with(WeightSlot::RgAny, value)).unwrap()
        };

        prop_assert!(score(low) <= score(low + delta));
    }

    #[test]
    fn test_more_wildcards_gain_more_from_rg_any(
        weights in strategies::weights(),
        less in 0usize..4,
        extra in 1usize..4,
        low in 0.0f64..50.0,
        delta in 0.0f64..50.0,
    ) {
        let more = less + extra;
        let alternatives = |wildcards: usize| {
            let text = (0..more)
                .map(|i| if i < wildcards { r#"[word="a.*"]"# } else { r#"[word="ab"]"# })
                .collect::<Vec<_>>()
                .join(" | ");
            cqlz_lang::parse(&text).unwrap()
        };
        let (q_more, q_less) = (alternatives(more), alternatives(less));
        let scores = |value: f64| {
            let weights = weights.clone().with(WeightSlot::RgAny, value);
            (
                cqlz_lang::score(&q_more, &weights).unwrap(),
                cqlz_lang::score(&q_less, &weights).unwrap(),
            )
        };

        let (more_low, less_low) = scores(low);
        let (more_high, less_high) = scores(low + delta);
        let tolerance = 1e-9 * (more_low + less_low + more_high + less_high).max(1.0);

        prop_assert!(
            more_high - less_high >= more_low - less_low - tolerance,
            "raising RgAny from {} to {} shrank the gap from {} to {}",
            low,
            low + delta,
            more_low - less_low,
            more_high - less_high
        );
    }

    #[test]
    fn test_crossover_keeps_length(a in strategies::chromosome(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let b = Chromosome::random(a.len(), 100.0, &mut rng);
        let child = a.crossover(&b, &mut rng);

        prop_assert_eq!(child.len(), a.len());
        prop_assert!(
            child
                .genes()
                .iter()
                .zip(a.genes().iter().zip(b.genes()))
                .all(|(c, (x, y))| c == x || c == y)
        );
    }

    #[test]
    fn test_mutation_bounds(a in strategies::chromosome(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        prop_assert_eq!(a.mutate(0.0, 1.0, &mut rng), a.clone());

        let mutated = a.mutate(1.0, 1e-3, &mut rng);
        prop_assert_eq!(mutated.len(), a.len());
        prop_assert!(mutated.genes().iter().all(|g| (0.0..1e-3).contains(g)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn test_best_so_far_never_regresses(seed in any::<u64>(), workers in 1usize..5) {
        let dataset = Dataset::from_pairs([
            (r#"[word=".*"]"#, 30.0),
            (r#"[lemma="a.+"] within <s/>"#, 8.0),
            (r#"[tag="N"] [word="x"]"#, 0.2),
            (r#"[]{1,4} "y""#, 3.0),
        ]);
        let config = OptimizerConfig {
            population_size: 24,
            generations: 5,
            workers,
            seed: Some(seed),
            ..Default::default()
        };
        let result = Optimizer::new(config)
            .unwrap()
            .run(&dataset, &CancelToken::new())
            .unwrap();

        prop_assert!(
            result
                .history
                .windows(2)
                .all(|w| w[1].best_so_far <= w[0].best_so_far)
        );
        prop_assert!(result.history.iter().all(|r| r.best_so_far <= r.best));
    }
}
