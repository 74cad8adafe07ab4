use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::{opt, recognize, value},
    error::ErrorKind,
    multi::{many0, many1, separated_list0},
    sequence::pair,
};

use crate::MAX_PARSE_DEPTH;
use crate::syntax::Syntax;
use crate::value::NumberType;
use crate::{Error, ParseError, ParseErrorKind};

/// Allowed non-alphanumeric characters in symbol names
const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_";

/// Check if a string is a valid symbol name.
/// Valid: non-empty, no leading digit, no "-digit" prefix, alphanumeric
/// plus SYMBOL_SPECIAL_CHARS.
fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false,
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if first_char == '-'
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            name.chars()
                .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
        }
    }
}

/// A `;` comment running to the end of the line
fn line_comment(input: &str) -> IResult<&str, ()> {
    value((), pair(char(';'), take_while(|c| c != '\n'))).parse(input)
}

/// Zero or more whitespace runs and comments
fn ws0(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), line_comment)))).parse(input)
}

/// At least one whitespace run or comment; separates list elements
fn ws1(input: &str) -> IResult<&str, ()> {
    value((), many1(alt((value((), multispace1), line_comment)))).parse(input)
}

/// Parse a signed decimal integer
fn parse_number(input: &str) -> IResult<&str, Syntax> {
    let (input, number_str) = recognize(pair(
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit()),
    ))
    .parse(input)?;

    match number_str.parse::<NumberType>() {
        Ok(n) => Ok((input, Syntax::Number(n))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        ))),
    }
}

/// Parse a rational literal `num/den`; the denominator is unsigned and
/// must be nonzero
fn parse_rational(input: &str) -> IResult<&str, Syntax> {
    let (input, num_str) = recognize(pair(
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit()),
    ))
    .parse(input)?;
    let (input, _) = char('/').parse(input)?;
    let (input, den_str) = take_while1(|c: char| c.is_ascii_digit()).parse(input)?;

    match (num_str.parse::<NumberType>(), den_str.parse::<NumberType>()) {
        (Ok(num), Ok(den)) if den != 0 => Ok((input, Syntax::Rational(num, den))),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        ))),
    }
}

/// Parse a boolean (#t or #f)
fn parse_boolean(input: &str) -> IResult<&str, Syntax> {
    alt((
        value(Syntax::True, tag("#t")),
        value(Syntax::False, tag("#f")),
    ))
    .parse(input)
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Syntax> {
    let mut symbol_chars =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c));

    let (remaining, candidate) = symbol_chars.parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((remaining, Syntax::Symbol(candidate.into())))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Parse a string literal with escape sequences
fn parse_string(input: &str) -> IResult<&str, Syntax> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = Vec::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => {
                return Ok((char_iter.as_str(), Syntax::Str(chars.into_iter().collect())));
            }
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    // Unknown or incomplete escape sequence
                    _ => {
                        return Err(nom::Err::Error(nom::error::Error::new(
                            remaining,
                            ErrorKind::Char,
                        )));
                    }
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            None => {
                // End of input without a closing quote
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    ErrorKind::Char,
                )));
            }
        }
    }
}

/// Parse a parenthesized list
fn parse_list(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = ws0.parse(input)?;
    let (input, elements) =
        separated_list0(ws1, |input| parse_form(input, depth + 1)).parse(input)?;
    let (input, _) = ws0.parse(input)?;
    let (input, _) = char(')').parse(input)?;

    Ok((input, Syntax::List(elements)))
}

/// Parse the quote shorthand: 'x becomes (quote x)
fn parse_quote(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, _) = char('\'').parse(input)?;
    let (input, _) = ws0.parse(input)?;
    let (input, quoted) = parse_form(input, depth + 1)?;

    Ok((
        input,
        Syntax::List(vec![Syntax::Symbol("quote".to_owned()), quoted]),
    ))
}

fn parse_form(input: &str, depth: usize) -> IResult<&str, Syntax> {
    if depth >= MAX_PARSE_DEPTH {
        // Failure, not Error: alt and separated_list0 must not backtrack
        // past the depth limit
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    alt((
        |input| parse_quote(input, depth),
        |input| parse_list(input, depth),
        parse_rational,
        parse_number,
        parse_boolean,
        parse_string,
        parse_symbol,
    ))
    .parse(input)
}

/// Convert nom parsing errors to structured reader errors
fn convert_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::new(
                    ParseErrorKind::TooDeeplyNested,
                    format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                _ => {
                    if position < input.len() {
                        let near: String = input[position..].chars().take(10).collect();
                        ParseError::with_context(
                            ParseErrorKind::InvalidSyntax,
                            format!("invalid syntax near '{near}'"),
                            input,
                            position,
                        )
                    } else {
                        ParseError::new(ParseErrorKind::Incomplete, "unexpected end of input")
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => ParseError::new(ParseErrorKind::Incomplete, "incomplete input"),
    }
}

fn parse_top(input: &str) -> Result<(&str, Syntax), nom::Err<nom::error::Error<&str>>> {
    let (input, _) = ws0.parse(input)?;
    let (input, form) = parse_form(input, 0)?;
    let (input, _) = ws0.parse(input)?;
    Ok((input, form))
}

/// Read exactly one form from `input`. Trailing content is an error.
pub fn read(input: &str) -> Result<Syntax, Error> {
    match parse_top(input) {
        Ok(("", form)) => Ok(form),
        Ok((remaining, _)) => Err(Error::ParseError(ParseError::new(
            ParseErrorKind::TrailingContent,
            format!("unexpected remaining input: '{remaining}'"),
        ))),
        Err(e) => Err(Error::ParseError(convert_error(input, e))),
    }
}

/// Read every form in `input`, for file evaluation and multi-form lines.
pub fn read_program(input: &str) -> Result<Vec<Syntax>, Error> {
    let mut forms = Vec::new();
    let mut rest = input;
    loop {
        let (after_ws, _) = ws0.parse(rest)
            .map_err(|e| Error::ParseError(convert_error(input, e)))?;
        if after_ws.is_empty() {
            return Ok(forms);
        }
        let (after_form, form) = parse_form(after_ws, 0)
            .map_err(|e| Error::ParseError(convert_error(input, e)))?;
        forms.push(form);
        rest = after_form;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expected outcomes for the comprehensive reader tests
    #[derive(Debug)]
    enum ReadResult {
        Success(Syntax),
        Error,
    }
    use ReadResult::*;

    fn num(n: NumberType) -> Syntax {
        Syntax::Number(n)
    }

    fn sym(s: &str) -> Syntax {
        Syntax::Symbol(s.to_owned())
    }

    fn list(items: Vec<Syntax>) -> Syntax {
        Syntax::List(items)
    }

    fn run_read_tests(test_cases: Vec<(&str, ReadResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Read test #{}", i + 1);
            match (read(input), expected) {
                (Ok(actual), Success(expected_stx)) => {
                    assert_eq!(actual, *expected_stx, "{test_id}: for '{input}'");
                }
                (Err(_), Error) => {}
                (Ok(actual), Error) => {
                    panic!("{test_id}: expected error for '{input}', got {actual:?}");
                }
                (Err(err), Success(_)) => {
                    panic!("{test_id}: expected success for '{input}', got error {err:?}");
                }
            }
        }
    }

    #[test]
    fn test_reader_comprehensive() {
        let test_cases = vec![
            // ===== NUMBERS =====
            ("42", Success(num(42))),
            ("-5", Success(num(-5))),
            ("0", Success(num(0))),
            ("-0", Success(num(0))),
            ("9223372036854775807", Success(num(NumberType::MAX))),
            ("-9223372036854775808", Success(num(NumberType::MIN))),
            ("99999999999999999999", Error), // too large
            ("3.14", Error),                 // no floating point
            ("123abc", Error),
            // ===== RATIONALS =====
            ("1/2", Success(Syntax::Rational(1, 2))),
            ("-7/3", Success(Syntax::Rational(-7, 3))),
            // kept unnormalized in syntax; evaluation normalizes
            ("2/4", Success(Syntax::Rational(2, 4))),
            ("0/5", Success(Syntax::Rational(0, 5))),
            ("1/0", Error),  // zero denominator
            ("1/-2", Error), // sign goes on the numerator
            ("1/", Error),
            // ===== BOOLEANS =====
            ("#t", Success(Syntax::True)),
            ("#f", Success(Syntax::False)),
            ("#T", Error),
            ("#true", Error),
            // ===== SYMBOLS =====
            ("foo", Success(sym("foo"))),
            ("+", Success(sym("+"))),
            ("-", Success(sym("-"))),
            (">=", Success(sym(">="))),
            ("set-car!", Success(sym("set-car!"))),
            ("list?", Success(sym("list?"))),
            ("var123", Success(sym("var123"))),
            ("-abc", Success(sym("-abc"))),
            ("a/b", Success(sym("a/b"))),
            ("123var", Error),
            ("-42name", Error),
            ("test@home", Error),
            // ===== STRINGS =====
            ("\"hello\"", Success(Syntax::Str("hello".to_owned()))),
            ("\"\"", Success(Syntax::Str(String::new()))),
            (r#""a\nb""#, Success(Syntax::Str("a\nb".to_owned()))),
            (r#""tab\there""#, Success(Syntax::Str("tab\there".to_owned()))),
            (r#""q\"t""#, Success(Syntax::Str("q\"t".to_owned()))),
            (r#""b\\s""#, Success(Syntax::Str("b\\s".to_owned()))),
            (r#""bad\xesc""#, Error),
            (r#""unterminated"#, Error),
            (r#""ends-in-backslash\"#, Error),
            // ===== LISTS =====
            ("()", Success(list(vec![]))),
            ("(   )", Success(list(vec![]))),
            ("(42)", Success(list(vec![num(42)]))),
            (
                "(+ 1 2)",
                Success(list(vec![sym("+"), num(1), num(2)])),
            ),
            (
                "(1 hello \"world\" #t)",
                Success(list(vec![
                    num(1),
                    sym("hello"),
                    Syntax::Str("world".to_owned()),
                    Syntax::True,
                ])),
            ),
            (
                "((1 2) (3 4))",
                Success(list(vec![
                    list(vec![num(1), num(2)]),
                    list(vec![num(3), num(4)]),
                ])),
            ),
            (
                "( 1   2\t\n3 )",
                Success(list(vec![num(1), num(2), num(3)])),
            ),
            (
                "(+ 1/2 1/3)",
                Success(list(vec![
                    sym("+"),
                    Syntax::Rational(1, 2),
                    Syntax::Rational(1, 3),
                ])),
            ),
            ("(1 2 3", Error),  // missing closing paren
            ("((1 2)", Error),
            // ===== QUOTE SHORTHAND =====
            ("'foo", Success(list(vec![sym("quote"), sym("foo")]))),
            (
                "'(1 2)",
                Success(list(vec![sym("quote"), list(vec![num(1), num(2)])])),
            ),
            ("'()", Success(list(vec![sym("quote"), list(vec![])]))),
            (
                "''x",
                Success(list(vec![
                    sym("quote"),
                    list(vec![sym("quote"), sym("x")]),
                ])),
            ),
            // ===== COMMENTS AND WHITESPACE =====
            ("  42  ", Success(num(42))),
            ("\t#t\n", Success(Syntax::True)),
            ("42 ; trailing comment", Success(num(42))),
            ("; leading comment\n42", Success(num(42))),
            (
                "(1 ; one\n 2)",
                Success(list(vec![num(1), num(2)])),
            ),
            // ===== GENERAL ERRORS =====
            ("", Error),
            ("   ", Error),
            ("; only a comment", Error),
            (")", Error),
            ("1 2", Error),          // trailing content
            ("(+ 1 2) (+ 3 4)", Error), // read() takes one form
        ];

        run_read_tests(test_cases);
    }

    #[test]
    fn test_reader_depth_limits() {
        let parens_under_limit = format!(
            "{}x{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        let parens_at_limit = format!(
            "{}x{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );
        let quotes_at_limit = format!("{}a", "'".repeat(MAX_PARSE_DEPTH));

        assert!(read(&parens_under_limit).is_ok());

        for over in [parens_at_limit, quotes_at_limit] {
            match read(&over) {
                Err(crate::Error::ParseError(e)) => {
                    assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested, "for '{over}'");
                }
                other => panic!("expected depth error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_read_program() {
        let forms = read_program("(define x 1) ; comment\nx (+ x 2)").unwrap();
        assert_eq!(
            forms,
            vec![
                list(vec![sym("define"), sym("x"), num(1)]),
                sym("x"),
                list(vec![sym("+"), sym("x"), num(2)]),
            ]
        );

        assert_eq!(read_program("").unwrap(), vec![]);
        assert_eq!(read_program("  ; nothing\n").unwrap(), vec![]);
        assert!(read_program("(1 2").is_err());
    }

    #[test]
    fn test_trailing_content_kind() {
        match read("1 2") {
            Err(crate::Error::ParseError(e)) => assert_eq!(e.kind, ParseErrorKind::TrailingContent),
            other => panic!("expected trailing-content error, got {other:?}"),
        }
    }
}
