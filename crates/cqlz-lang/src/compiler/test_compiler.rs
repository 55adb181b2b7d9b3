//! Tests compiling parsed queries and running the programs.

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::ast::node::Query;
    use crate::compiler::{CompileError, WeightSlot, Weights, compile};
    use crate::parser::parse;
    use crate::vm::{Instruction, Vm};

    fn score(text: &str, weights: &Weights) -> f64 {
        let query = parse(text).unwrap();
        let program = compile(&query, weights).unwrap();
        Vm::new().run(&program).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_wildcard_outweighs_tag() {
        let weights = Weights::default().with(WeightSlot::RgAny, 100.0);

        assert_close(score(r#"[word=".*"]"#, &weights), 100.0);
        assert_close(score(r#"[tag="N"]"#, &weights), 1.0);
    }

    #[test]
    fn test_instruction_order() {
        let weights = Weights::default()
            .with(WeightSlot::RgChar, 2.0)
            .with(WeightSlot::RgSimple, 3.0)
            .with(WeightSlot::RegExpRaw, 5.0)
            .with(WeightSlot::RegExp, 7.0)
            .with(WeightSlot::AtomQuery, 11.0)
            .with(WeightSlot::Repetition, 13.0);
        let program = compile(&parse(r#""a""#).unwrap(), &weights).unwrap();

        use Instruction::*;
        assert_eq!(
            program.as_slice(),
            &[
                PushConstant(2.0),
                PushConstant(3.0),
                Multiply,
                PushConstant(5.0),
                Multiply,
                PushConstant(7.0),
                Multiply,
                PushConstant(11.0),
                Multiply,
                PushConstant(13.0),
                Multiply,
            ]
        );
        assert_close(Vm::new().run(&program).unwrap(), 30030.0);
    }

    #[rstest]
    #[case::alternatives(r#""a|b""#, 2.0)]
    #[case::grouped_is_clamped(r#""(a|b)""#, 1.0)]
    #[case::sequence_or(r#"[word="a"] | [word="b"]"#, 2.0)]
    #[case::wildcard_run(r#""a...b""#, 0.39)]
    #[case::single_wildcard(r#""a.b""#, 1.0)]
    #[case::separate_runs(r#""a..b..c""#, 0.62 * 0.62)]
    #[case::long_run(r#""a....................b""#, 0.003)]
    #[case::dot_in_class(r#""[.]""#, 1.0)]
    fn test_score_with_unit_weights(#[case] text: &str, #[case] expected: f64) {
        assert_close(score(text, &Weights::default()), expected);
    }

    #[rstest]
    #[case::negated_regex(r#"[word!="a"]"#)]
    #[case::negated_att_val(r#"[!word="a"]"#)]
    fn test_negation(#[case] text: &str) {
        let weights = Weights::default().with(WeightSlot::RgChar, 0.2);
        assert_close(score(text, &weights), 0.8);
    }

    #[test]
    fn test_negation_is_clamped() {
        let weights = Weights::default().with(WeightSlot::RgChar, 5.0);
        assert_close(score(r#"[word!="a"]"#, &weights), 0.0);
    }

    #[rstest]
    #[case::negated(r#"[word!="a"]"#, 1)]
    #[case::plain(r#"[word="a"]"#, 0)]
    #[case::plain_group(r#""(a|b)""#, 1)]
    #[case::negated_group(r#"[word!="(a|b)"]"#, 2)]
    fn test_clamp_sites(#[case] text: &str, #[case] clamps: usize) {
        let program = compile(&parse(text).unwrap(), &Weights::default()).unwrap();
        let instructions = program.as_slice();

        assert_eq!(
            instructions
                .iter()
                .filter(|i| **i == Instruction::Clamp1)
                .count(),
            clamps
        );
        for (pc, instruction) in instructions.iter().enumerate() {
            if *instruction == Instruction::NegateProbability {
                assert_eq!(instructions[pc - 1], Instruction::Clamp1);
            }
        }
    }

    #[rstest]
    #[case::any_position("[]", 3.0)]
    #[case::bounded_repetition("[]{2,5}", 15.0)]
    #[case::optional("[]?", 15.0)]
    #[case::unbounded_repetition("[]*", 21.0)]
    fn test_positions(#[case] text: &str, #[case] expected: f64) {
        let weights = Weights::default()
            .with(WeightSlot::AnyPosition, 3.0)
            .with(WeightSlot::BoundedRepOpt, 5.0)
            .with(WeightSlot::RepOpt, 7.0);
        assert_close(score(text, &weights), expected);
    }

    #[rstest]
    #[case::small_cardinality(r#"[tag="N"]"#, 4.0)]
    #[case::large_cardinality(r#"[word="N"]"#, 1.0)]
    fn test_small_cardinality_attr(#[case] text: &str, #[case] expected: f64) {
        let weights = Weights::default().with(WeightSlot::SmallCardAttr, 4.0);
        assert_close(score(text, &weights), expected);
    }

    #[test]
    fn test_variant_slots() {
        let weights = Weights::default()
            .with(WeightSlot::UnicodeClass, 9.0)
            .with(WeightSlot::RgAltVal, 4.0)
            .with(WeightSlot::RgChar, 3.0)
            .with(WeightSlot::MuPart, 6.0);

        assert_close(score(r#""\p{L}""#, &weights), 9.0);
        assert_close(score(r#""[\d]""#, &weights), 4.0);
        assert_close(score(r#""[ab]""#, &weights), 24.0);
        assert_close(score("mu", &weights), 6.0);
    }

    #[test]
    fn test_structures_and_blocks() {
        let weights = Weights::default()
            .with(WeightSlot::Structure, 2.0)
            .with(WeightSlot::OpenStructTag, 3.0)
            .with(WeightSlot::WithinNumber, 5.0)
            .with(WeightSlot::GlobCond, 7.0)
            .with(WeightSlot::NumberedPosition, 11.0);

        assert_close(score("<s/>", &weights), 6.0);
        assert_close(score(r#"[word="a"] within 3"#, &weights), 5.0);
        assert_close(score(r#"[word="a"] within <s/>"#, &weights), 6.0);
        assert_close(score(r#"1:[word="a"] & 1.word = 1.word"#, &weights), 77.0);
    }

    #[test]
    fn test_program_leaves_one_value() {
        let query = parse(
            r#"1:[word=".*a" & tag!="N.*"]{2,3} (meet [lemma="x"] "y+" -2 2) <s/> & f(1.word) > 3 within <doc id="x"/>"#,
        )
        .unwrap();
        let program = compile(&query, &Weights::uniform(1.5)).unwrap();
        let mut vm = Vm::new();
        vm.execute(&program).unwrap();

        assert_eq!(vm.stack().len(), 1);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let query = parse(r#"[word="a.*b" | lemma=="x"] []{1,3} [tag="V.*"]"#).unwrap();
        let weights = Weights::uniform(1.7);

        assert_eq!(
            compile(&query, &weights).unwrap(),
            compile(&query, &weights).unwrap()
        );
    }

    #[rstest]
    #[case::default_query(Query::default())]
    #[case::empty_regex(parse(r#"[word=""]"#).unwrap())]
    fn test_empty_query(#[case] query: Query) {
        assert_eq!(
            compile(&query, &Weights::default()),
            Err(CompileError::EmptyQuery)
        );
    }
}
