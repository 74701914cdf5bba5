//! Command parsing and execution for the gateway CLI
//!
//! This module handles:
//! - Parsing the positional arguments into a typed command
//! - Arity and socket-number validation before anything is sent
//! - Dispatching commands to their handlers
//! - Owning the cancellable context of long-running receive commands

mod context;
mod executor;
pub mod handlers;

pub use context::ContextManager;
pub use executor::App;

use crate::error::{Error, Result};
use std::io::{self, Write};

/// A parsed command with its validated arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ResetGpio,
    ResetRadio,
    MeasureTemp,
    /// Sockets to switch on; empty means every socket
    On(Vec<u32>),
    /// Sockets to switch off; empty means every socket
    Off(Vec<u32>),
    ReceiveOok,
    ReceiveFsk,
}

/// Name and help text of a command
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Every command, in the order they are listed in the usage text
pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "reset_gpio",
        description: "Reset GPIO",
    },
    CommandInfo {
        name: "reset_radio",
        description: "Reset RFM69 Radio",
    },
    CommandInfo {
        name: "measure_temp",
        description: "Measure Temperature",
    },
    CommandInfo {
        name: "on",
        description: "On TX (optionally use 1,2,3,4 as additional argument)",
    },
    CommandInfo {
        name: "off",
        description: "Off TX (optionally use 1,2,3,4 as additional argument)",
    },
    CommandInfo {
        name: "receive_ook",
        description: "Receive data in OOK mode",
    },
    CommandInfo {
        name: "receive_fsk",
        description: "Receive data in FSK mode",
    },
];

impl Command {
    /// Parse `name args...`
    ///
    /// Unknown names and wrong argument counts are [`Error::Help`]; a socket
    /// that is not a number is [`Error::ArgumentFormat`].
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Err(Error::Help("No command given".into()));
        };

        let command = match name.as_str() {
            "reset_gpio" => Command::ResetGpio,
            "reset_radio" => Command::ResetRadio,
            "measure_temp" => Command::MeasureTemp,
            "on" => return Ok(Command::On(to_sockets(rest)?)),
            "off" => return Ok(Command::Off(to_sockets(rest)?)),
            "receive_ook" => Command::ReceiveOok,
            "receive_fsk" => Command::ReceiveFsk,
            other => return Err(Error::Help(format!("Unknown command: {}", other))),
        };

        if !rest.is_empty() {
            return Err(Error::Help(format!("{} takes no arguments", name)));
        }
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::ResetGpio => "reset_gpio",
            Command::ResetRadio => "reset_radio",
            Command::MeasureTemp => "measure_temp",
            Command::On(_) => "on",
            Command::Off(_) => "off",
            Command::ReceiveOok => "receive_ook",
            Command::ReceiveFsk => "receive_fsk",
        }
    }

    /// True for commands that keep running until interrupted
    pub fn is_streaming(&self) -> bool {
        matches!(self, Command::ReceiveOok | Command::ReceiveFsk)
    }
}

/// Parse socket numbers; no arguments means all sockets
///
/// Fails on the first bad value, before anything is applied.
pub fn to_sockets(args: &[String]) -> Result<Vec<u32>> {
    args.iter().map(|value| parse_socket(value)).collect()
}

fn parse_socket(value: &str) -> Result<u32> {
    // Plain decimal digits only; `str::parse` alone would take a leading '+'
    if !value.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(Error::ArgumentFormat {
            value: value.to_string(),
            source: None,
        });
    }
    value.parse::<u32>().map_err(|source| Error::ArgumentFormat {
        value: value.to_string(),
        source: Some(source),
    })
}

/// Write the command summary
pub fn print_commands(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    for info in COMMANDS {
        writeln!(out, "  {:<12}\t{}", info.name, info.description)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&args(&["reset_gpio"])).ok(), Some(Command::ResetGpio));
        assert_eq!(Command::parse(&args(&["receive_fsk"])).ok(), Some(Command::ReceiveFsk));
        assert_eq!(
            Command::parse(&args(&["on", "1", "3"])).ok(),
            Some(Command::On(vec![1, 3]))
        );
        assert_eq!(Command::parse(&args(&["off"])).ok(), Some(Command::Off(vec![])));
    }

    #[test]
    fn test_unknown_command_is_help() {
        let err = Command::parse(&args(&["frobnicate"])).expect_err("unknown command");
        assert!(err.is_help());

        let err = Command::parse(&[]).expect_err("no command");
        assert!(err.is_help());
    }

    #[test]
    fn test_extra_arguments_are_help() {
        for name in ["reset_gpio", "reset_radio", "measure_temp", "receive_ook", "receive_fsk"] {
            let err = Command::parse(&args(&[name, "1"])).expect_err("extra argument");
            assert!(err.is_help(), "{} accepted an argument", name);
        }
    }

    #[test]
    fn test_to_sockets() {
        assert_eq!(to_sockets(&[]).expect("empty"), Vec::<u32>::new());
        assert_eq!(to_sockets(&args(&["1", "2", "3"])).expect("valid"), vec![1, 2, 3]);
        assert_eq!(to_sockets(&args(&["4", "1"])).expect("valid"), vec![4, 1]);

        match to_sockets(&args(&["1", "2", "x"])) {
            Err(Error::ArgumentFormat { value, .. }) => assert_eq!(value, "x"),
            other => panic!("expected argument format error, got {:?}", other),
        }
        assert!(matches!(
            to_sockets(&args(&["-1"])),
            Err(Error::ArgumentFormat { .. })
        ));
    }

    #[test]
    fn test_to_sockets_digits_only() {
        for bad in ["+1", " 1", "", "0x2"] {
            match to_sockets(&args(&["1", bad])) {
                Err(Error::ArgumentFormat { value, .. }) => assert_eq!(value, bad),
                other => panic!("{:?} accepted: {:?}", bad, other),
            }
        }
        assert!(matches!(
            to_sockets(&args(&["99999999999"])),
            Err(Error::ArgumentFormat { source: Some(_), .. })
        ));
    }

    #[test]
    fn test_only_receive_commands_stream() {
        assert!(Command::ReceiveOok.is_streaming());
        assert!(Command::ReceiveFsk.is_streaming());
        assert!(!Command::MeasureTemp.is_streaming());
        assert!(!Command::On(vec![1]).is_streaming());
        assert!(!Command::ResetGpio.is_streaming());
    }

    #[test]
    fn test_names_match_table() {
        let commands = [
            Command::ResetGpio,
            Command::ResetRadio,
            Command::MeasureTemp,
            Command::On(vec![]),
            Command::Off(vec![]),
            Command::ReceiveOok,
            Command::ReceiveFsk,
        ];
        for (command, info) in commands.iter().zip(COMMANDS) {
            assert_eq!(command.name(), info.name);
            assert_eq!(Command::parse(&args(&[info.name])).ok().as_ref(), Some(command));
        }
    }

    #[test]
    fn test_print_commands() {
        let mut out = Vec::new();
        print_commands(&mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("Commands:\n"));
        assert!(text.contains("receive_ook"));
        assert_eq!(text.lines().count(), COMMANDS.len() + 1);
    }
}
