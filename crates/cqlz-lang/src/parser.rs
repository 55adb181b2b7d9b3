//! CQL query parser.
//!
//! Turns query text into the syntax tree of [`crate::ast::node`]. Whitespace
//! is insignificant between tokens and inside brackets, but significant
//! inside quoted regular expressions.

pub mod error;
mod regex;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{anychar, char, i32 as signed, multispace0, none_of, satisfy, u32 as number},
    combinator::{eof, map, not, opt, recognize, value},
    error::ErrorKind,
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated},
};
use nom_locate::LocatedSpan;
use smallvec::SmallVec;

pub use error::ParseError;

use crate::ast::node::*;
use regex::quoted_regex;

/// Query text, carrying the nesting depth of the parser at this point.
type Span<'a> = LocatedSpan<&'a str, usize>;
type ParserError<'a> = nom::error::Error<Span<'a>>;

/// Deepest nesting of groups, negations and regex groups a query may use.
pub const MAX_DEPTH: usize = 32;

pub fn parse(text: &str) -> Result<Query, ParseError> {
    match query(Span::new_extra(text, 0)) {
        Ok((_, query)) => Ok(query),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(ParseError::TooDeep {
            offset: e.input.location_offset(),
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(error_at(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::UnexpectedEOFDetected {
            offset: text.len(),
        }),
    }
}

fn error_at(input: Span) -> ParseError {
    let rest = input.fragment().trim_start();
    let offset = input.location_offset() + (input.fragment().len() - rest.len());

    match rest.split_whitespace().next() {
        Some(found) => ParseError::UnexpectedToken {
            offset,
            found: found.to_string(),
        },
        None => ParseError::UnexpectedEOFDetected { offset },
    }
}

/// Runs `parser` one nesting level deeper, failing past [`MAX_DEPTH`].
fn nested<'a, O, P>(mut parser: P) -> impl FnMut(Span<'a>) -> IResult<Span<'a>, O>
where
    P: Parser<Span<'a>, Output = O, Error = ParserError<'a>>,
{
    move |mut input: Span<'a>| {
        let depth = input.extra;
        if depth >= MAX_DEPTH {
            return Err(nom::Err::Failure(ParserError::new(input, ErrorKind::TooLarge)));
        }

        input.extra = depth + 1;
        let (mut rest, output) = parser.parse(input)?;
        rest.extra = depth;
        Ok((rest, output))
    }
}

fn ws<'a, O, P>(parser: P) -> impl Parser<Span<'a>, Output = O, Error = ParserError<'a>>
where
    P: Parser<Span<'a>, Output = O, Error = ParserError<'a>>,
{
    delimited(multispace0, parser, multispace0)
}

fn parenthesized<'a, O, P>(parser: P) -> impl Parser<Span<'a>, Output = O, Error = ParserError<'a>>
where
    P: Parser<Span<'a>, Output = O, Error = ParserError<'a>>,
{
    delimited(ws(char('(')), parser, preceded(multispace0, char(')')))
}

fn keyword<'a>(word: &'static str) -> impl Parser<Span<'a>, Output = Span<'a>, Error = ParserError<'a>> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn bang(input: Span) -> IResult<Span, bool> {
    map(opt(terminated(char('!'), multispace0)), |not| not.is_some()).parse(input)
}

fn comma(input: Span) -> IResult<Span, char> {
    ws(char(',')).parse(input)
}

/// A `!` directly before an operator, `att != "x"`.
fn negation(input: Span) -> IResult<Span, bool> {
    map(opt(preceded(multispace0, char('!'))), |not| not.is_some()).parse(input)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn att_name(input: Span) -> IResult<Span, AttName> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
            take_while(is_name_char),
        )),
        |span: Span| AttName::new(span.fragment()),
    )
    .parse(input)
}

/// `{n}`, `{n,}` or `{n,m}`, shared by repetitions and regex ranges.
fn range_bounds(input: Span) -> IResult<Span, (u32, Option<u32>)> {
    delimited(
        char('{'),
        alt((
            separated_pair(number, char(','), opt(number)),
            map(number, |n| (n, Some(n))),
        )),
        char('}'),
    )
    .parse(input)
}

fn query(input: Span) -> IResult<Span, Query> {
    map(
        delimited(
            multispace0,
            (
                opt(sequence),
                opt(preceded(ws(char('&')), glob_part)),
                many0(preceded(multispace0, within_or_containing)),
            ),
            (multispace0, eof),
        ),
        |(sequence, glob_part, within_or_containing)| Query {
            sequence,
            glob_part,
            within_or_containing,
        },
    )
    .parse(input)
}

fn sequence(input: Span) -> IResult<Span, Sequence> {
    map(separated_list1(ws(char('|')), seq), |seqs| Sequence { seqs }).parse(input)
}

fn seq(input: Span) -> IResult<Span, Seq> {
    map(
        pair(bang, many1(preceded(multispace0, repetition))),
        |(not, repetitions)| Seq { not, repetitions },
    )
    .parse(input)
}

fn repetition(input: Span) -> IResult<Span, Repetition> {
    alt((
        map(close_struct_tag, Repetition::CloseStructTag),
        map(open_struct_tag, Repetition::OpenStructTag),
        map(pair(atom_query, opt(rep_opt)), |(atom, rep_opt)| {
            Repetition::Atom { atom, rep_opt }
        }),
    ))
    .parse(input)
}

fn rep_opt(input: Span) -> IResult<Span, RepOpt> {
    alt((
        value(RepOpt::Operator(RepOperator::ZeroOrMore), char('*')),
        value(RepOpt::Operator(RepOperator::OneOrMore), char('+')),
        value(RepOpt::Operator(RepOperator::Optional), char('?')),
        map(range_bounds, |(from, to)| RepOpt::Range { from, to }),
    ))
    .parse(input)
}

fn close_struct_tag(input: Span) -> IResult<Span, CloseStructTag> {
    map(
        delimited(
            (char('<'), multispace0, char('/'), multispace0),
            att_name,
            (multispace0, char('>')),
        ),
        |att_name| CloseStructTag {
            structure: Structure {
                att_name,
                att_val_list: None,
            },
        },
    )
    .parse(input)
}

fn open_struct_tag(input: Span) -> IResult<Span, OpenStructTag> {
    map(
        delimited(
            pair(char('<'), multispace0),
            pair(
                structure,
                map(opt(preceded(multispace0, char('/'))), |s| s.is_some()),
            ),
            pair(multispace0, char('>')),
        ),
        |(structure, self_closing)| OpenStructTag {
            structure,
            self_closing,
        },
    )
    .parse(input)
}

fn structure(input: Span) -> IResult<Span, Structure> {
    map(
        pair(att_name, opt(preceded(multispace0, att_val_list))),
        |(att_name, att_val_list)| Structure {
            att_name,
            att_val_list,
        },
    )
    .parse(input)
}

fn atom_query(input: Span) -> IResult<Span, AtomQuery> {
    alt((
        map(position, AtomQuery::Position),
        map(
            delimited(
                pair(char('('), multispace0),
                nested(pair(
                    sequence,
                    many0(preceded(multispace0, within_or_containing)),
                )),
                pair(multispace0, char(')')),
            ),
            |(sequence, blocks)| AtomQuery::Group { sequence, blocks },
        ),
    ))
    .parse(input)
}

fn position(input: Span) -> IResult<Span, Position> {
    alt((
        map(
            separated_pair(number, char(':'), one_position),
            |(number, position)| Position::Numbered(NumberedPosition { number, position }),
        ),
        map(one_position, Position::One),
    ))
    .parse(input)
}

fn one_position(input: Span) -> IResult<Span, OnePosition> {
    alt((
        map(
            delimited(
                pair(char('['), multispace0),
                opt(att_val_list),
                pair(multispace0, char(']')),
            ),
            OnePosition::AttValList,
        ),
        map(
            preceded(char('~'), pair(opt(number), quoted_regex)),
            |(number, regex)| OnePosition::Anchored { number, regex },
        ),
        map(mu_part, OnePosition::Mu),
        value(OnePosition::MuKeyword, keyword("mu")),
        map(quoted_regex, OnePosition::Regex),
    ))
    .parse(input)
}

fn mu_part(input: Span) -> IResult<Span, MuPart> {
    delimited(
        pair(char('('), multispace0),
        nested(alt((
            map(
                (
                    keyword("meet"),
                    preceded(multispace0, position),
                    preceded(multispace0, position),
                    opt(pair(ws(signed), signed)),
                ),
                |(_, left, right, window)| {
                    MuPart::Meet(MeetOp {
                        left: Box::new(left),
                        right: Box::new(right),
                        window,
                    })
                },
            ),
            map(
                (
                    keyword("union"),
                    preceded(multispace0, position),
                    preceded(multispace0, position),
                ),
                |(_, left, right)| {
                    MuPart::Union(UnionOp {
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                },
            ),
        ))),
        pair(multispace0, char(')')),
    )
    .parse(input)
}

fn att_val_list(input: Span) -> IResult<Span, AttValList> {
    map(separated_list1(ws(char('|')), att_val_and), |items| {
        AttValList { items }
    })
    .parse(input)
}

fn att_val_and(input: Span) -> IResult<Span, AttValAnd> {
    map(separated_list1(ws(char('&')), att_val), |items| AttValAnd {
        items: SmallVec::from_vec(items),
    })
    .parse(input)
}

fn att_val(input: Span) -> IResult<Span, AttVal> {
    alt((
        map(
            delimited(
                pair(char('('), multispace0),
                nested(att_val_list),
                pair(multispace0, char(')')),
            ),
            AttVal::Group,
        ),
        map(preceded(pair(char('!'), multispace0), nested(att_val)), |inner| {
            AttVal::Not(Box::new(inner))
        }),
        ws_term,
        map(
            preceded(
                keyword("swap"),
                parenthesized(separated_pair(number, comma, att_val_list)),
            ),
            |(number, list)| AttVal::Swap { number, list },
        ),
        map(
            preceded(
                keyword("ccoll"),
                parenthesized((number, comma, number, comma, att_val_list)),
            ),
            |(from, _, to, _, list)| AttVal::Ccoll { from, to, list },
        ),
        map(
            preceded(char('#'), pair(number, opt(preceded(char('-'), number)))),
            |(from, to)| match to {
                Some(to) => AttVal::PosNumRange { from, to },
                None => AttVal::PosNum(from),
            },
        ),
        att_condition,
    ))
    .parse(input)
}

fn ws_term(input: Span) -> IResult<Span, AttVal> {
    map(
        pair(
            alt((
                value(WsKeyword::Ws, keyword("ws")),
                value(WsKeyword::Term, keyword("term")),
            )),
            parenthesized(alt((
                map(separated_pair(number, comma, number), |(a, b)| {
                    WsTermArgs::Numbers(a, b)
                }),
                map(
                    (quoted_regex, comma, quoted_regex, comma, quoted_regex),
                    |(a, _, b, _, c)| WsTermArgs::Regexes(a, b, c),
                ),
            ))),
        ),
        |(keyword, args)| AttVal::WsTerm { keyword, args },
    )
    .parse(input)
}

/// `att="re"`, `att!="re"`, `att=="raw"`, `att<="re"`, `att~2"re"`
fn att_condition(input: Span) -> IResult<Span, AttVal> {
    let (input, (att_name, not)) =
        pair(att_name, terminated(negation, multispace0)).parse(input)?;

    alt((
        map(preceded(pair(tag("=="), multispace0), raw_string), |value| {
            AttVal::Raw {
                att_name: att_name.clone(),
                not,
                value,
            }
        }),
        map(
            pair(att_op, preceded(multispace0, quoted_regex)),
            |(op, regex)| AttVal::Regex {
                att_name: att_name.clone(),
                not,
                op,
                regex,
            },
        ),
    ))
    .parse(input)
}

fn att_op(input: Span) -> IResult<Span, AttOp> {
    alt((
        value(AttOp::Leq, tag("<=")),
        value(AttOp::Geq, tag(">=")),
        value(AttOp::Eq, char('=')),
        map(preceded(char('~'), opt(number)), AttOp::Teq),
    ))
    .parse(input)
}

fn raw_string(input: Span) -> IResult<Span, RawString> {
    map(
        delimited(
            char('"'),
            many0(alt((preceded(char('\\'), anychar), none_of("\"\\")))),
            char('"'),
        ),
        |letters: Vec<char>| RawString {
            value: SimpleString {
                value: letters.into_iter().collect(),
            },
        },
    )
    .parse(input)
}

fn within_or_containing(input: Span) -> IResult<Span, WithinOrContaining> {
    map(
        (
            bang,
            alt((
                value(WithinKeyword::Within, keyword("within")),
                value(WithinKeyword::Containing, keyword("containing")),
            )),
            preceded(multispace0, within_containing_part),
        ),
        |(not, keyword, part)| WithinOrContaining { not, keyword, part },
    )
    .parse(input)
}

fn within_containing_part(input: Span) -> IResult<Span, WithinContainingPart> {
    alt((
        map(terminated(number, not(char(':'))), |value| {
            WithinContainingPart::Number(WithinNumber { value })
        }),
        map(pair(bang, aligned_part), |(not, part)| {
            WithinContainingPart::Aligned { not, part }
        }),
        map(sequence, WithinContainingPart::Sequence),
    ))
    .parse(input)
}

fn aligned_part(input: Span) -> IResult<Span, AlignedPart> {
    map(
        separated_pair(att_name, ws(char(':')), sequence),
        |(att_name, sequence)| AlignedPart { att_name, sequence },
    )
    .parse(input)
}

fn glob_part(input: Span) -> IResult<Span, GlobPart> {
    map(separated_list1(ws(char('&')), glob_cond), |conds| GlobPart {
        conds,
    })
    .parse(input)
}

fn glob_cond(input: Span) -> IResult<Span, GlobCond> {
    alt((
        map(
            (
                preceded(
                    keyword("f"),
                    parenthesized(separated_pair(number, char('.'), att_name)),
                ),
                preceded(multispace0, bang),
                freq_op,
                preceded(multispace0, number),
            ),
            |((number, att_name), not, op, value)| GlobCond::Freq {
                number,
                att_name,
                not,
                op,
                value,
            },
        ),
        map(
            (
                separated_pair(number, char('.'), att_name),
                ws(alt((
                    value(true, tag("!=")),
                    value(false, tag("==")),
                    value(false, tag("=")),
                ))),
                separated_pair(number, char('.'), att_name),
            ),
            |((left, left_att), not, (right, right_att))| GlobCond::AttrEq {
                left,
                left_att,
                not,
                right,
                right_att,
            },
        ),
    ))
    .parse(input)
}

fn freq_op(input: Span) -> IResult<Span, FreqOp> {
    alt((
        value(FreqOp::Leq, tag("<=")),
        value(FreqOp::Geq, tag(">=")),
        value(FreqOp::Eq, tag("=")),
        value(FreqOp::Lt, tag("<")),
        value(FreqOp::Gt, tag(">")),
    ))
    .parse(input)
}
