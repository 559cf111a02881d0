use std::{num::ParseIntError, str::FromStr};
use thiserror::Error;
use unicast_core::ProcessId;

/// One line of the interactive command surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `send <pid> <message text>`
    Send { to: ProcessId, message: String },
    /// `q`
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command `{0}', type `send <pid> <message>' or `q'")]
    Unknown(String),
    #[error("Missing destination, type `send <pid> <message>'")]
    MissingDestination,
    #[error("Invalid destination `{value}'")]
    InvalidDestination {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl FromStr for Command {
    type Err = CommandError;

    /// The message is everything after the destination, inner spaces
    /// included. Surrounding whitespace of the line is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        match verb {
            "" => Err(CommandError::Empty),
            "q" | "quit" => Ok(Self::Quit),
            "send" => {
                let rest = rest.trim_start();
                let (to, message) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if to.is_empty() {
                    return Err(CommandError::MissingDestination);
                }
                let to = to
                    .parse()
                    .map_err(|source| CommandError::InvalidDestination {
                        value: to.to_owned(),
                        source,
                    })?;

                Ok(Self::Send {
                    to,
                    message: message.trim_start().to_owned(),
                })
            }
            unknown => Err(CommandError::Unknown(unknown.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(to: i32, message: &str) -> Command {
        Command::Send {
            to: ProcessId::new(to),
            message: message.to_owned(),
        }
    }

    #[test]
    fn parse_send() {
        assert_eq!("send 2 hello".parse::<Command>(), Ok(send(2, "hello")));
        assert_eq!(
            "send 2 hello   world, again".parse::<Command>(),
            Ok(send(2, "hello   world, again"))
        );
        assert_eq!("  send\t3  spaced  \n".parse::<Command>(), Ok(send(3, "spaced")));
        assert_eq!("send -1 negative".parse::<Command>(), Ok(send(-1, "negative")));
    }

    #[test]
    fn parse_send_empty_message() {
        assert_eq!("send 2".parse::<Command>(), Ok(send(2, "")));
    }

    #[test]
    fn parse_quit() {
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
        assert_eq!(" quit ".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "recv 2 hello".parse::<Command>(),
            Err(CommandError::Unknown("recv".to_owned()))
        );
        assert_eq!(
            "send".parse::<Command>(),
            Err(CommandError::MissingDestination)
        );
        assert!(matches!(
            "send two hello".parse::<Command>(),
            Err(CommandError::InvalidDestination { value, .. }) if value == "two"
        ));
    }
}
