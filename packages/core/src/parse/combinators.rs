use super::{ParseError, Parser, ToLength};

pub fn map<I, O1, O2, P, F>(parser: P, f: F) -> impl Parser<I, O2>
where
    I: Clone,
    P: Parser<I, O1>,
    F: Fn(O1) -> O2,
{
    move |input: &mut I| {
        let o1 = parser.parse(input)?;
        Ok(f(o1))
    }
}

pub fn map_res<I, O1, O2, P, F, E>(parser: P, f: F) -> impl Parser<I, O2>
where
    I: Clone,
    P: Parser<I, O1>,
    F: Fn(O1) -> Result<O2, E>,
    E: Into<ParseError>,
{
    move |input: &mut I| {
        let o1 = parser.parse(input)?;
        f(o1).map_err(|e| e.into())
    }
}

pub fn peek<I, O, P>(parser: P) -> impl Parser<I, O>
where
    I: Clone,
    P: Parser<I, O>,
{
    // To peek the input, simply clone it and parse the clone
    move |input: &mut I| {
        let mut input_clone = input.clone();
        parser.parse(&mut input_clone)
    }
}

/// Applies the parser only if the condition holds.
pub fn cond<I, O, P>(condition: bool, parser: P) -> impl Parser<I, Option<O>>
where
    I: Clone,
    P: Parser<I, O>,
{
    move |input: &mut I| {
        if condition {
            parser.parse(input).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Applies the parser, mapping a recoverable failure to `None`.
pub fn opt<I, O, P>(parser: P) -> impl Parser<I, Option<O>>
where
    I: Clone,
    P: Parser<I, O>,
{
    move |input: &mut I| match parser.parse_peek(input) {
        Ok(o) => Ok(Some(o)),
        Err(ParseError::Recoverable(_)) | Err(ParseError::Incomplete(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Applies the parser a fixed number of times.
pub fn repeat<I, O, P, C>(parser: P, count: C) -> impl Parser<I, Vec<O>>
where
    I: Clone,
    P: Parser<I, O>,
    C: Into<usize>,
{
    let count = count.into();
    move |input: &mut I| {
        let mut res = Vec::with_capacity(count);
        for _ in 0..count {
            res.push(parser.parse(input)?);
        }
        Ok(res)
    }
}

/// Reads a count using the first parser, then applies the second parser
/// that many times.
pub fn length_repeat<I, O, C, PC, P>(parse_count: PC, parser: P) -> impl Parser<I, Vec<O>>
where
    I: Clone,
    PC: Parser<I, C>,
    C: ToLength,
    P: Parser<I, O>,
{
    move |input: &mut I| {
        let count = parse_count.parse(input)?.to_length();
        let mut res = Vec::with_capacity(count);
        for _ in 0..count {
            res.push(parser.parse(input)?);
        }
        Ok(res)
    }
}

/// Applies the parser until the input is exhausted.
pub fn many0<I, O, P>(parser: P, is_empty: impl Fn(&I) -> bool) -> impl Parser<I, Vec<O>>
where
    I: Clone,
    P: Parser<I, O>,
{
    move |input: &mut I| {
        let mut res = Vec::new();
        while !is_empty(input) {
            res.push(parser.parse(input)?);
        }
        Ok(res)
    }
}
