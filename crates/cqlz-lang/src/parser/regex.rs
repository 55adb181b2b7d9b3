use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{anychar, char, none_of, one_of, satisfy},
    combinator::{map, opt, recognize, value},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair},
};
use smallvec::SmallVec;
use smol_str::SmolStr;

use super::{Span, nested, range_bounds};
use crate::ast::node::*;

/// `"regexp"`
pub(super) fn quoted_regex(input: Span) -> IResult<Span, RegExp> {
    delimited(char('"'), regexp, char('"')).parse(input)
}

fn regexp(input: Span) -> IResult<Span, RegExp> {
    map(separated_list1(char('|'), regexp_raw), |alternatives| RegExp {
        alternatives: SmallVec::from_vec(alternatives),
    })
    .parse(input)
}

fn regexp_raw(input: Span) -> IResult<Span, RegExpRaw> {
    map(many0(regexp_item), |items| RegExpRaw { items }).parse(input)
}

fn regexp_item(input: Span) -> IResult<Span, RegExpItem> {
    alt((
        map(look, RegExpItem::Look),
        map(grouped, RegExpItem::Grouped),
        map(simple, RegExpItem::Simple),
    ))
    .parse(input)
}

/// `(?=...)`, `(?<!...)`, `(?i)` are kept verbatim.
fn look(input: Span) -> IResult<Span, RgLook> {
    map(
        recognize((tag("(?"), look_body, char(')'))),
        |span: Span| RgLook {
            value: SmolStr::new(span.fragment()),
        },
    )
    .parse(input)
}

fn look_body(input: Span) -> IResult<Span, Span> {
    recognize(many0(alt((
        recognize(pair(char('\\'), anychar)),
        recognize((char('('), nested(look_body), char(')'))),
        recognize(none_of("()\\\"")),
    ))))
    .parse(input)
}

fn grouped(input: Span) -> IResult<Span, RgGrouped> {
    map(
        delimited(
            char('('),
            nested(separated_list1(char('|'), regexp_raw)),
            char(')'),
        ),
        |alternatives| RgGrouped { alternatives },
    )
    .parse(input)
}

fn simple(input: Span) -> IResult<Span, RgSimple> {
    map(many1(simple_item), |items| RgSimple { items }).parse(input)
}

fn simple_item(input: Span) -> IResult<Span, RgSimpleItem> {
    alt((
        map(range_bounds, |(from, to)| {
            RgSimpleItem::Range(RgRange {
                spec: RgRangeSpec { from, to },
            })
        }),
        map(posix_class, RgSimpleItem::PosixClass),
        map(char_class, RgSimpleItem::Alt),
        map(rg_char, RgSimpleItem::Char),
        // a brace that does not form a valid range
        map(one_of("{}"), |c| RgSimpleItem::Char(literal(c))),
    ))
    .parse(input)
}

fn posix_class(input: Span) -> IResult<Span, RgPosixClass> {
    map(
        delimited(
            tag("[[:"),
            take_while1(|c: char| c.is_ascii_alphabetic()),
            tag(":]]"),
        ),
        |name: Span| RgPosixClass {
            name: SmolStr::new(name.fragment()),
        },
    )
    .parse(input)
}

fn char_class(input: Span) -> IResult<Span, RgAlt> {
    map(
        delimited(
            char('['),
            pair(map(opt(char('^')), |not| not.is_some()), many1(class_value)),
            char(']'),
        ),
        |(not, values)| RgAlt { not, values },
    )
    .parse(input)
}

fn class_value(input: Span) -> IResult<Span, RgAltVal> {
    alt((
        map(
            recognize((tag("[:"), take_while1(|c: char| c.is_ascii_alphabetic()), tag(":]"))),
            |span: Span| RgAltVal::Escaped(SmolStr::new(span.fragment())),
        ),
        map(recognize(pair(char('\\'), anychar)), |span: Span| {
            RgAltVal::Escaped(SmolStr::new(span.fragment()))
        }),
        map((class_char, char('-'), class_char), |(from, _, to)| {
            RgAltVal::Range { from, to }
        }),
        map(class_char, |c| RgAltVal::Char(literal(c))),
    ))
    .parse(input)
}

fn class_char(input: Span) -> IResult<Span, char> {
    none_of("]\\\"").parse(input)
}

fn rg_char(input: Span) -> IResult<Span, RgChar> {
    alt((
        value(RgChar::Any(RgAny), char('.')),
        value(RgChar::QuestionMark(RgQM), char('?')),
        map(one_of("*+"), |value| RgChar::Repeat(RgRepeat { value })),
        map(one_of("^$"), |value| RgChar::Op(RgOp { value })),
        map(unicode_class, |span: Span| RgChar::Literal {
            value: SmolStr::new(span.fragment()),
            unicode_class: true,
        }),
        map(recognize(pair(char('\\'), anychar)), |span: Span| {
            RgChar::Literal {
                value: SmolStr::new(span.fragment()),
                unicode_class: false,
            }
        }),
        map(none_of("\"|()[]{}\\.?*+^$"), literal),
    ))
    .parse(input)
}

/// `\p{Lu}`, `\PL`
fn unicode_class(input: Span) -> IResult<Span, Span> {
    recognize((
        char('\\'),
        one_of("pP"),
        alt((
            recognize(delimited(
                char('{'),
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '='),
                char('}'),
            )),
            recognize(satisfy(|c| c.is_ascii_alphabetic())),
        )),
    ))
    .parse(input)
}

fn literal(c: char) -> RgChar {
    RgChar::Literal {
        value: std::iter::once(c).collect(),
        unicode_class: false,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse_regex(text: &str) -> RegExp {
        let (rest, regex) = regexp(Span::new_extra(text, 0)).unwrap();
        assert_eq!(*rest.fragment(), "", "unparsed input in {text}");
        regex
    }

    #[rstest]
    #[case("abc")]
    #[case("a|b|c")]
    #[case(".*")]
    #[case("N.+")]
    #[case("^a$")]
    #[case("x{2}")]
    #[case("x{2,}")]
    #[case("x{2,3}")]
    #[case("[abc]")]
    #[case("[^a-z\\d]")]
    #[case("[[:alpha:]]+")]
    #[case("[a[:digit:]]")]
    #[case("\\p{Lu}\\pL")]
    #[case("(?i)abc")]
    #[case("a(?=b(c))")]
    #[case("(a|b)c?")]
    #[case("a\\.b")]
    #[case("")]
    fn test_canonical_text(#[case] text: &str) {
        assert_eq!(parse_regex(text).to_string(), text);
    }

    #[test]
    fn test_items() {
        let regex = parse_regex("(?i)(a|b)x{2,3}");
        let items = &regex.alternatives[0].items;

        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            RegExpItem::Look(RgLook {
                value: "(?i)".into()
            })
        );
        assert!(matches!(&items[1], RegExpItem::Grouped(g) if g.alternatives.len() == 2));
        let RegExpItem::Simple(simple) = &items[2] else {
            panic!("expected a simple item");
        };
        assert_eq!(
            simple.items[1],
            RgSimpleItem::Range(RgRange {
                spec: RgRangeSpec {
                    from: 2,
                    to: Some(3)
                }
            })
        );
    }

    #[test]
    fn test_unicode_class_is_flagged() {
        let regex = parse_regex("\\p{Lu}a");
        let RegExpItem::Simple(simple) = &regex.alternatives[0].items[0] else {
            panic!("expected a simple item");
        };
        let RgSimpleItem::Char(first) = &simple.items[0] else {
            panic!("expected a char");
        };
        let RgSimpleItem::Char(second) = &simple.items[1] else {
            panic!("expected a char");
        };

        assert!(first.is_unicode_class());
        assert!(second.is_constant() && !second.is_unicode_class());
    }

    #[test]
    fn test_invalid_brace_is_literal() {
        let regex = parse_regex("a{b}");
        let RegExpItem::Simple(simple) = &regex.alternatives[0].items[0] else {
            panic!("expected a simple item");
        };

        assert_eq!(simple.items.len(), 4);
        assert!(
            simple
                .items
                .iter()
                .all(|item| matches!(item, RgSimpleItem::Char(c) if c.is_constant()))
        );
    }

    #[test]
    fn test_dot_inside_class_is_literal() {
        let regex = parse_regex("[.]");
        let RegExpItem::Simple(simple) = &regex.alternatives[0].items[0] else {
            panic!("expected a simple item");
        };
        let RgSimpleItem::Alt(alt) = &simple.items[0] else {
            panic!("expected a class");
        };

        assert_eq!(alt.num_items(), 1);
        assert!(matches!(&alt.values[0], RgAltVal::Char(c) if c.is_constant()));
    }

    #[test]
    fn test_escaped_quote() {
        let (rest, regex) = quoted_regex(Span::new_extra(r#""a\"b" rest"#, 0)).unwrap();
        assert_eq!(*rest.fragment(), " rest");
        assert_eq!(regex.to_string(), r#"a\"b"#);
    }
}
