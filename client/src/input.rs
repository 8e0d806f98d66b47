//! Line-oriented command input

use shared::{InvalidSessionCode, SessionCode, BOARD_CELLS};
use std::str::FromStr;
use thiserror::Error;

/// One command typed by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Join(SessionCode),
    Move(usize),
    Restart,
    Leave,
    Quit,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("type a command, or `help` for the list")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` takes no arguments")]
    UnexpectedArgument(&'static str),
    #[error("cells are numbered 0 to 8, got {0:?}")]
    InvalidCell(String),
    #[error(transparent)]
    InvalidCode(#[from] InvalidSessionCode),
}

pub const HELP: &str = "\
commands:
  create        open a new session and wait for an opponent
  join <code>   join the session with the given 6-digit code
  move <0-8>    place your mark (cells are numbered row by row)
  restart       clear the board and start over
  leave         leave the current session
  quit          exit
  help          show this list";

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ParseError::Empty);
        };
        let argument = words.next();
        if words.next().is_some() {
            return Err(ParseError::Unknown(line.trim().to_string()));
        }

        let command = match name.to_ascii_lowercase().as_str() {
            "create" => no_argument(argument, "create", Command::Create)?,
            "restart" => no_argument(argument, "restart", Command::Restart)?,
            "leave" => no_argument(argument, "leave", Command::Leave)?,
            "quit" | "exit" => no_argument(argument, "quit", Command::Quit)?,
            "help" | "?" => Command::Help,
            "join" => {
                let code = argument.ok_or(ParseError::MissingArgument("join"))?;
                Command::Join(code.parse()?)
            }
            "move" => {
                let cell = argument.ok_or(ParseError::MissingArgument("move"))?;
                Command::Move(parse_cell(cell)?)
            }
            // A bare digit is a move.
            other if argument.is_none() && other.len() == 1 => Command::Move(parse_cell(other)?),
            _ => return Err(ParseError::Unknown(name.to_string())),
        };

        Ok(command)
    }
}

fn no_argument(
    argument: Option<&str>,
    name: &'static str,
    command: Command,
) -> Result<Command, ParseError> {
    match argument {
        None => Ok(command),
        Some(_) => Err(ParseError::UnexpectedArgument(name)),
    }
}

fn parse_cell(text: &str) -> Result<usize, ParseError> {
    match text.parse::<usize>() {
        Ok(cell) if cell < BOARD_CELLS => Ok(cell),
        _ => Err(ParseError::InvalidCell(text.to_string())),
    }
}
