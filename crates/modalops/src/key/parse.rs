use std::ops::BitOr;

use crossterm::event::{KeyCode, KeyModifiers};

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{anychar, char, digit1},
    combinator::{eof, map_res, value},
    multi::{many0, many1},
    IResult,
};

use super::KeyChord;

fn parse_modifier(input: &str) -> IResult<&str, KeyModifiers> {
    alt((
        value(KeyModifiers::ALT, tag("A-")),
        value(KeyModifiers::ALT, tag("M-")),
        value(KeyModifiers::CONTROL, tag("C-")),
        value(KeyModifiers::SHIFT, tag("S-")),
    ))(input)
}

fn parse_arrow(input: &str) -> IResult<&str, KeyCode> {
    alt((
        value(KeyCode::Left, tag("Left")),
        value(KeyCode::Right, tag("Right")),
        value(KeyCode::Up, tag("Up")),
        value(KeyCode::Down, tag("Down")),
    ))(input)
}

fn parse_navigation(input: &str) -> IResult<&str, KeyCode> {
    alt((
        value(KeyCode::PageUp, tag("PageUp")),
        value(KeyCode::PageDown, tag("PageDown")),
        value(KeyCode::Home, tag("Home")),
        value(KeyCode::End, tag("End")),
        value(KeyCode::Insert, alt((tag("Insert"), tag("Ins")))),
        value(KeyCode::Delete, alt((tag("Delete"), tag("Del")))),
    ))(input)
}

fn parse_named_ascii(input: &str) -> IResult<&str, KeyCode> {
    alt((
        value(KeyCode::Char(' '), tag("Space")),
        value(KeyCode::Char('|'), tag("Bar")),
        value(KeyCode::Char('\\'), tag("Bslash")),
        value(KeyCode::Char('<'), tag("lt")),
    ))(input)
}

fn parse_named_ctl(input: &str) -> IResult<&str, KeyCode> {
    alt((
        value(KeyCode::Esc, tag("Esc")),
        value(KeyCode::Tab, tag("Tab")),
        value(KeyCode::Backspace, alt((tag("BS"), tag("BackSpace")))),
        value(KeyCode::Char('\n'), alt((tag("NL"), tag("NewLine"), tag("LF")))),
        value(KeyCode::Enter, alt((tag("CR"), tag("Return"), tag("Enter")))),
        value(KeyCode::Null, tag("Nul")),
    ))(input)
}

fn parse_keyname(input: &str) -> IResult<&str, KeyCode> {
    alt((parse_arrow, parse_named_ascii, parse_named_ctl, parse_navigation))(input)
}

fn parse_base10_u8(input: &str) -> Result<u8, std::num::ParseIntError> {
    input.parse::<u8>()
}

fn parse_function(input: &str) -> IResult<&str, KeyCode> {
    let (input, _) = char('F')(input)?;
    let (input, n) = map_res(digit1, parse_base10_u8)(input)?;

    Ok((input, KeyCode::F(n)))
}

fn parse_anychar(input: &str) -> IResult<&str, KeyCode> {
    let (input, c) = anychar(input)?;

    Ok((input, KeyCode::Char(c)))
}

fn parse_simple(input: &str) -> IResult<&str, KeyChord> {
    let (input, c) = anychar(input)?;

    Ok((input, KeyChord::from(c)))
}

fn parse_special(input: &str) -> IResult<&str, KeyChord> {
    let (input, _) = char('<')(input)?;
    let (input, m) = many0(parse_modifier)(input)?;
    let (input, mut k) = alt((parse_keyname, parse_function, parse_anychar))(input)?;
    let (input, _) = char('>')(input)?;

    let mut m = m.into_iter().fold(KeyModifiers::NONE, BitOr::bitor);

    if let KeyCode::Char(c) = k {
        if m.contains(KeyModifiers::CONTROL) {
            m -= KeyModifiers::SHIFT;

            let key = match c.to_ascii_lowercase() {
                'i' => KeyChord::from(KeyCode::Tab),
                'j' => KeyChord::from(KeyCode::Char('\n')),
                'm' => KeyChord::from(KeyCode::Enter),
                '[' => KeyChord::from(KeyCode::Esc),
                '?' => KeyChord::from(KeyCode::Backspace),
                '@' => KeyChord::new(KeyCode::Char(' '), m),
                c => KeyChord::new(KeyCode::Char(c), m),
            };

            return Ok((input, key));
        }

        if m.contains(KeyModifiers::SHIFT) {
            k = KeyCode::Char(c.to_ascii_uppercase());
        }
    } else if let KeyCode::Tab = k {
        if m == KeyModifiers::SHIFT {
            return Ok((input, KeyChord::from(KeyCode::BackTab)));
        }
    }

    return Ok((input, KeyChord::new(k, m)));
}

pub(super) fn parse_key_str(input: &str) -> IResult<&str, KeyChord> {
    let (input, res) = alt((parse_special, parse_simple))(input)?;
    let (input, _) = eof(input)?;

    Ok((input, res))
}

pub(super) fn parse_macro_str(input: &str) -> IResult<&str, Vec<KeyChord>> {
    let (input, res) = many1(alt((parse_special, parse_simple)))(input)?;
    let (input, _) = eof(input)?;

    Ok((input, res))
}
