//! Parse an expense.
//!
//! Since expenses have a more or less complex syntax, we use nom.

use std::{cmp::Ordering, iter::repeat};

use chrono::NaiveDate;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag_no_case},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{eof, map, map_res, opt, peek, recognize, verify},
    error::{Error, ErrorKind},
    multi::{many1, many_till},
    sequence::{preceded, terminated, tuple},
    AsChar, IResult, InputTakeAtPosition,
};

use crate::{
    error::InputError,
    types::{Amount, ParsedContribution, ParsedExpense},
    validator::is_valid_name,
};

/// Parse an expense submitted by the user.
///
/// The syntax is `<item> <quantity>x<price> [date] paid <name[/amount]>... [for <name>...]`,
/// for example `basmati rice 2x150 paid ali/200 bilal for ali bilal chacha`.
/// Some basic checks are performed by the parser, while other checks are
/// executed later.
pub fn parse_expense(s: &str) -> IResult<&str, ParsedExpense> {
    let (s, (item_words, (quantity, price_per_unit))) = many_till(
        preceded(multispace0, parse_word),
        preceded(multispace0, parse_quantity_and_price),
    )(s)?;
    if item_words.is_empty() {
        return Err(nom::Err::Error(Error::new(s, ErrorKind::Verify)));
    }

    let (s, date) = opt(preceded(multispace1, parse_date))(s)?;
    let (s, _) = preceded(multispace1, keyword("paid"))(s)?;
    let (s, contributed_by) = many1(preceded(multispace1, parse_contribution))(s)?;
    let (s, consumed_by) = opt(preceded(
        tuple((multispace1, keyword("for"))),
        many1(preceded(multispace1, parse_person_name)),
    ))(s)?;
    let (s, _) = terminated(multispace0, eof)(s)?;

    let expense = ParsedExpense {
        item_name: item_words.join(" "),
        quantity,
        price_per_unit,
        date,
        contributed_by,
        consumed_by: consumed_by
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.to_string())
            .collect(),
    };
    Ok((s, expense))
}

/// Parse a whole expense, failing if it is not valid.
pub fn parse_full_expense(s: &str) -> Result<ParsedExpense, InputError> {
    parse_expense(s)
        .map(|(_, expense)| expense)
        .map_err(InputError::invalid_expense_syntax)
}

fn parse_word(s: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n")(s)
}

/// A keyword, matched regardless of case, which must be followed by a space.
fn keyword<'a>(k: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(k), peek(alt((multispace1, eof))))
}

fn parse_quantity_and_price(s: &str) -> IResult<&str, (u32, Amount)> {
    map(
        terminated(
            tuple((
                map_res(digit1, |q: &str| q.parse::<u32>()),
                char('x'),
                parse_amount,
            )),
            peek(alt((multispace1, eof))),
        ),
        |(quantity, _, price)| (quantity, price),
    )(s)
}

fn parse_contribution(s: &str) -> IResult<&str, ParsedContribution> {
    map(
        tuple((parse_person_name, opt(preceded(char('/'), parse_amount)))),
        |(name, amount)| ParsedContribution::new(name, amount),
    )(s)
}

/// Match until a whitespace or '/' is found, then make sure that a valid name
/// was matched (and not one of the keywords).
fn parse_person_name(s: &str) -> IResult<&str, &str> {
    verify(is_not(" \t\r\n/"), is_valid_name)(s)
}

pub fn parse_date(s: &str) -> IResult<&str, NaiveDate> {
    map_res(
        recognize(tuple((digit1, char('-'), digit1, char('-'), digit1))),
        |d: &str| NaiveDate::parse_from_str(d, "%Y-%m-%d"),
    )(s)
}

fn float1(s: &str) -> IResult<&str, &str> {
    s.split_at_position1_complete(
        |item| !item.is_dec_digit() && item != ',' && item != '.' && item != '-' && item != '+',
        nom::error::ErrorKind::Float,
    )
}

/// Parse a decimal number into hundredths. Digits after the second decimal
/// are dropped.
pub fn parse_amount(s: &str) -> IResult<&str, Amount> {
    fn do_parse(x: &str) -> Result<Amount, InputError> {
        let components: Vec<_> = x.split(&[',', '.']).collect();
        let digits = match components.as_slice() {
            [integer_part] => integer_part.to_string() + "00",
            [integer_part, fractional_part] if !fractional_part.is_empty() => {
                let fractional_part = match fractional_part.len().cmp(&2) {
                    Ordering::Less => fractional_part.to_string() + &make_string_of_char('0', 1),
                    Ordering::Greater => fractional_part[0..2].to_string(),
                    Ordering::Equal => fractional_part.to_string(),
                };
                integer_part.to_string() + &fractional_part
            }
            _ => return Err(InputError::invalid_amount(x)),
        };
        digits
            .parse::<Amount>()
            .map_err(|_| InputError::invalid_amount(x))
    }

    map_res(float1, do_parse)(s)
}

fn make_string_of_char(c: char, length: usize) -> String {
    repeat(c).take(length).collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("3.45"), Ok(("", 345)));
        assert_eq!(parse_amount("3,45"), Ok(("", 345)));
        assert_eq!(parse_amount("3.4"), Ok(("", 340)));
        assert_eq!(parse_amount("3.456"), Ok(("", 345)));
        assert_eq!(parse_amount("3"), Ok(("", 300)));
        assert_eq!(parse_amount("+3"), Ok(("", 300)));
        assert_eq!(parse_amount("-3.45"), Ok(("", -345)));
        assert_eq!(parse_amount("150 paid"), Ok((" paid", 15000)));
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount("3.").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-01 paid"),
            Ok((" paid", NaiveDate::from_ymd_opt(2024, 3, 1).expect("test")))
        );
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("01/03/2024").is_err());
    }

    #[test]
    fn test_parse_contribution() {
        assert_eq!(
            parse_contribution("Ali/300 bilal"),
            Ok((" bilal", ParsedContribution::new("Ali", Some(30000))))
        );
        assert_eq!(
            parse_contribution("bilal"),
            Ok(("", ParsedContribution::new("bilal", None)))
        );
        assert!(parse_contribution("for ali").is_err());
    }

    #[test]
    fn test_parse_expense() -> anyhow::Result<()> {
        let (rest, expense) =
            parse_expense("  basmati rice 2x150.5 2024-03-01 paid Ali/200 bilal for ali bilal chacha ")?;
        assert_eq!(rest, "");
        assert_eq!(expense.item_name, "basmati rice");
        assert_eq!(expense.quantity, 2);
        assert_eq!(expense.price_per_unit, 15050);
        assert_eq!(expense.total_price(), Some(30100));
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(
            expense.contributed_by,
            vec![
                ParsedContribution::new("Ali", Some(20000)),
                ParsedContribution::new("bilal", None)
            ]
        );
        assert_eq!(expense.consumed_by, vec!["ali", "bilal", "chacha"]);
        Ok(())
    }

    #[test]
    fn test_parse_expense_without_optional_parts() -> anyhow::Result<()> {
        let (_, expense) = parse_expense("milk 1x90 PAID chacha")?;
        assert_eq!(expense.item_name, "milk");
        assert_eq!(expense.date, None);
        assert_eq!(
            expense.contributed_by,
            vec![ParsedContribution::new("chacha", None)]
        );
        assert!(expense.consumed_by.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_expenses() {
        // No item.
        assert!(parse_expense("2x150 paid ali").is_err());
        // No quantity.
        assert!(parse_expense("rice 150 paid ali").is_err());
        // No contributors.
        assert!(parse_expense("rice 1x150 paid for ali").is_err());
        assert!(parse_expense("rice 1x150 for ali").is_err());
        // Trailing garbage.
        assert!(parse_expense("rice 1x150 paid ali for").is_err());
        assert!(parse_expense("rice 1x150 paid ali for bilal/20").is_err());
        // Invalid date.
        assert!(parse_expense("rice 1x150 2024-13-01 paid ali").is_err());

        assert!(matches!(
            parse_full_expense("rice"),
            Err(InputError::InvalidExpenseSyntax(_))
        ));
    }
}
