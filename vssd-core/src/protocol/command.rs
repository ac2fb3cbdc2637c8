//! Command grammar for the interpreter

use std::path::PathBuf;

use thiserror::Error;

use super::operand::Scanner;
use crate::blockdev::BlockNumber;
use crate::status::DiskStatus;

/// Error type for command lines that do not parse
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// First word names no command
    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),
    /// `connect` without two numeric geometry operands
    #[error("missing <block_size> or <block_count> for connection")]
    MissingGeometry,
    /// `connect` without a disk type
    #[error("no valid disk type for connection")]
    MissingDiskType,
    /// `connect` with a disk type other than `o`, `n`, `r` or `u`
    #[error("no disk connected: \"{0}\" unknown disk type")]
    UnknownDiskType(String),
    /// `o` or `n` without a file name
    #[error("missing file name for disk image device")]
    MissingFileName,
    /// `read` or `write` without a block number
    #[error("missing <block_number> for {0}")]
    MissingBlockNumber(&'static str),
    /// `write` or `x` without a non-empty pattern
    #[error("missing <pattern> for {0}")]
    MissingPattern(&'static str),
    /// `s` without a status name
    #[error("missing <disk_status> after s")]
    MissingStatus,
    /// `s` followed by a name that is not a status
    #[error("unknown disk status \"{0}\"")]
    BadStatusName(String),
    /// Quoted string with no closing quote
    #[error("unterminated quoted string")]
    UnterminatedString,
    /// Backslash escape outside the supported set
    #[error("unsupported escape \\{0}")]
    BadEscape(char),
    /// Hex literal with an odd or empty digit count, or a non-hex digit
    #[error("invalid hex literal \"{0}\"")]
    BadHexLiteral(String),
    /// Trailing words the command does not take
    #[error("unexpected input \"{0}\"")]
    UnexpectedInput(String),
}

/// Device a `connect` command attaches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// `o <file>`: open an existing image
    Open(PathBuf),
    /// `n <file>`: create a fresh image
    New(PathBuf),
    /// `r`: memory device
    Memory,
    /// `u`: stub device
    Unimplemented,
}

/// One parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Attach a device, releasing any attached one first
    Connect {
        /// Requested bytes per block
        block_size: usize,
        /// Requested number of blocks
        block_count: usize,
        /// Which device to attach
        target: ConnectTarget,
    },
    /// Fill a block with a repeated pattern and write it
    Write {
        /// Block to write
        block: BlockNumber,
        /// Bytes repeated across the block
        pattern: Vec<u8>,
        /// Status the write should return
        expect: Option<DiskStatus>,
    },
    /// Read a block, then dump it or compare it with a pattern
    Read {
        /// Block to read
        block: BlockNumber,
        /// Pattern the block should hold; the block is dumped when absent
        examine: Option<Vec<u8>>,
        /// Status the read should return
        expect: Option<DiskStatus>,
    },
    /// Report the attached device's geometry and status
    Status,
    /// Release the attached device
    Disconnect,
    /// End the session
    Quit,
}

/// Parse one command line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let mut scanner = Scanner::new(line);
    let Some(word) = scanner.next_word() else {
        return Ok(None);
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "c" | "connect" => parse_connect(&mut scanner)?,
        "w" | "write" => parse_write(&mut scanner)?,
        "r" | "read" => parse_read(&mut scanner)?,
        "s" | "status" => Command::Status,
        "d" | "disconnect" => Command::Disconnect,
        "q" | "quit" => Command::Quit,
        _ => return Err(ParseError::UnknownCommand(word.to_string())),
    };
    scanner.expect_end()?;
    Ok(Some(command))
}

/// Whether the line's command word is `c` or `connect`
pub(crate) fn is_connect_line(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .map_or(false, |word| matches!(word.to_ascii_lowercase().as_str(), "c" | "connect"))
}

fn parse_connect(scanner: &mut Scanner<'_>) -> Result<Command, ParseError> {
    let mut number = || {
        scanner
            .next_word()
            .and_then(|w| w.parse::<usize>().ok())
            .ok_or(ParseError::MissingGeometry)
    };
    let block_size = number()?;
    let block_count = number()?;

    let target = match scanner.next_word().ok_or(ParseError::MissingDiskType)? {
        "o" => ConnectTarget::Open(file_name(scanner)?),
        "n" => ConnectTarget::New(file_name(scanner)?),
        "r" => ConnectTarget::Memory,
        "u" => ConnectTarget::Unimplemented,
        other => return Err(ParseError::UnknownDiskType(other.to_string())),
    };

    Ok(Command::Connect {
        block_size,
        block_count,
        target,
    })
}

fn file_name(scanner: &mut Scanner<'_>) -> Result<PathBuf, ParseError> {
    scanner
        .next_word()
        .map(PathBuf::from)
        .ok_or(ParseError::MissingFileName)
}

fn block_number(scanner: &mut Scanner<'_>, op: &'static str) -> Result<BlockNumber, ParseError> {
    scanner
        .next_word()
        .and_then(|w| w.parse::<BlockNumber>().ok())
        .ok_or(ParseError::MissingBlockNumber(op))
}

fn pattern(scanner: &mut Scanner<'_>, op: &'static str) -> Result<Vec<u8>, ParseError> {
    match scanner.operand()? {
        Some(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(ParseError::MissingPattern(op)),
    }
}

fn expected_status(scanner: &mut Scanner<'_>) -> Result<DiskStatus, ParseError> {
    let name = scanner.next_word().ok_or(ParseError::MissingStatus)?;
    match DiskStatus::from_name(name) {
        DiskStatus::NoSuchStatus => Err(ParseError::BadStatusName(name.to_string())),
        status => Ok(status),
    }
}

fn parse_write(scanner: &mut Scanner<'_>) -> Result<Command, ParseError> {
    let block = block_number(scanner, "write")?;
    let pattern = pattern(scanner, "write")?;

    let mut expect = None;
    while let Some(option) = scanner.next_word() {
        match option {
            "s" => expect = Some(expected_status(scanner)?),
            other => return Err(unexpected(other, scanner)),
        }
    }

    Ok(Command::Write {
        block,
        pattern,
        expect,
    })
}

fn parse_read(scanner: &mut Scanner<'_>) -> Result<Command, ParseError> {
    let block = block_number(scanner, "read")?;

    let mut examine = None;
    let mut expect = None;
    while let Some(option) = scanner.next_word() {
        match option {
            "x" => examine = Some(pattern(scanner, "examine")?),
            "s" => expect = Some(expected_status(scanner)?),
            other => return Err(unexpected(other, scanner)),
        }
    }

    Ok(Command::Read {
        block,
        examine,
        expect,
    })
}

fn unexpected(word: &str, scanner: &mut Scanner<'_>) -> ParseError {
    match scanner.remaining() {
        "" => ParseError::UnexpectedInput(word.to_string()),
        rest => ParseError::UnexpectedInput(format!("{} {}", word, rest)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   \t "), Ok(None));
    }

    #[test]
    fn test_connect_forms() {
        assert_eq!(
            parse_line("c 1024 256 n disk.img"),
            Ok(Some(Command::Connect {
                block_size: 1024,
                block_count: 256,
                target: ConnectTarget::New(PathBuf::from("disk.img")),
            }))
        );
        assert_eq!(
            parse_line("connect 512 8 r"),
            Ok(Some(Command::Connect {
                block_size: 512,
                block_count: 8,
                target: ConnectTarget::Memory,
            }))
        );
        assert!(matches!(
            parse_line("c 512 8 o old.img"),
            Ok(Some(Command::Connect { target: ConnectTarget::Open(_), .. }))
        ));
        assert!(matches!(
            parse_line("c 512 8 u"),
            Ok(Some(Command::Connect { target: ConnectTarget::Unimplemented, .. }))
        ));
    }

    #[test]
    fn test_connect_errors() {
        assert_eq!(parse_line("c 512"), Err(ParseError::MissingGeometry));
        assert_eq!(parse_line("c big 8 r"), Err(ParseError::MissingGeometry));
        assert_eq!(parse_line("c 512 8"), Err(ParseError::MissingDiskType));
        assert_eq!(parse_line("c 512 8 n"), Err(ParseError::MissingFileName));
        assert_eq!(
            parse_line("c 512 8 tape"),
            Err(ParseError::UnknownDiskType("tape".to_string()))
        );
    }

    #[test]
    fn test_write_forms() {
        assert_eq!(
            parse_line(r#"w 255 "X""#),
            Ok(Some(Command::Write {
                block: 255,
                pattern: b"X".to_vec(),
                expect: None,
            }))
        );
        assert_eq!(
            parse_line("write 3 0xCAFE s BLOCK_OUT_OF_RANGE"),
            Ok(Some(Command::Write {
                block: 3,
                pattern: vec![0xCA, 0xFE],
                expect: Some(DiskStatus::BlockOutOfRange),
            }))
        );
    }

    #[test]
    fn test_write_errors() {
        assert_eq!(parse_line("w"), Err(ParseError::MissingBlockNumber("write")));
        assert_eq!(parse_line("w 1"), Err(ParseError::MissingPattern("write")));
        assert_eq!(parse_line(r#"w 1 """#), Err(ParseError::MissingPattern("write")));
        assert_eq!(parse_line("w 1 plain"), Err(ParseError::MissingPattern("write")));
        assert_eq!(
            parse_line(r#"w 1 "a" s BROKEN"#),
            Err(ParseError::BadStatusName("BROKEN".to_string()))
        );
        assert_eq!(
            parse_line(r#"w 1 "a" extra stuff"#),
            Err(ParseError::UnexpectedInput("extra stuff".to_string()))
        );
    }

    #[test]
    fn test_read_forms() {
        assert_eq!(
            parse_line("r 7"),
            Ok(Some(Command::Read {
                block: 7,
                examine: None,
                expect: None,
            }))
        );
        assert_eq!(
            parse_line(r#"r 7 x "ab" s OK"#),
            Ok(Some(Command::Read {
                block: 7,
                examine: Some(b"ab".to_vec()),
                expect: Some(DiskStatus::Ok),
            }))
        );
        assert_eq!(parse_line("r 7 x"), Err(ParseError::MissingPattern("examine")));
        assert_eq!(parse_line("r 7 s"), Err(ParseError::MissingStatus));
        assert_eq!(parse_line("r -1"), Err(ParseError::MissingBlockNumber("read")));
    }

    #[test]
    fn test_connect_line_detection() {
        assert!(is_connect_line("c 32"));
        assert!(is_connect_line("  CONNECT"));
        assert!(!is_connect_line("cat 1 2"));
        assert!(!is_connect_line(""));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_line("d"), Ok(Some(Command::Disconnect)));
        assert_eq!(parse_line("quit"), Ok(Some(Command::Quit)));
        assert_eq!(parse_line("S"), Ok(Some(Command::Status)));
        assert_eq!(parse_line("q now"), Err(ParseError::UnexpectedInput("now".to_string())));
        assert_eq!(
            parse_line("format all"),
            Err(ParseError::UnknownCommand("format".to_string()))
        );
    }
}
