//! Command interpreter for driving a device from text
//!
//! A [`Session`] reads one command per line, attaches devices through the
//! construction factory and forwards reads and writes to whichever device is
//! attached. Device failures are reported on the error stream with the line
//! number and never end the session.

mod command;
mod operand;

use std::io::{BufRead, Write};

pub use self::command::{parse_line, Command, ConnectTarget, ParseError};
pub use self::operand::{parse_hex_literal, parse_quoted_literal};

use crate::block_util;
use crate::blockdev::{self, BackendKind, BlockDevice, BlockNumber, DeviceRequest};
use crate::config::{DumpFormat, SessionConfig};
use crate::error::Result;
use crate::status::DiskStatus;

const BANNER: &str = "\
Welcome to the Very Simple Simulated Disk protocol.
Commands:
\tc <block-size> <block-count> [o <fname> | n <fname> | r | u]
\t\t(c)onnect to a disk. Either o(pen) an existing filedisk,
\t\tcreate a (n)ew filedisk, use a (r)AM disk, or the (u)nimplemented disk.

\tw <block> <data> [s <disk_status>]
\t\t(w)rite the data to the block number.
\t\tOptionally check (s)tatus after operation

\tr <block> [x <data>] [s <disk_status>]
\t\t(r)ead the data from the given block number.
\t\tOptionally create block of data from <data> and e(x)amine whether
\t\tthe value matches. If not examined, dump the block.
\t\tOptionally check (s)tatus after operation

\ts\tshow the (s)tatus of the connected disk

\td\t(d)isconnect from system, shut down any open disks

\tq\t(q)uit the simulation
";

/// Whether the session keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next command
    Continue,
    /// End the session
    Quit,
}

/// Interpreter state for one run of the command protocol
pub struct Session<O: Write, E: Write> {
    config: SessionConfig,
    line_number: usize,
    error_count: usize,
    device: Option<Box<dyn BlockDevice>>,
    block: Vec<u8>,
    out: O,
    err: E,
}

impl<O: Write, E: Write> Session<O, E> {
    /// Create a session writing block dumps to `out` and reports to `err`
    pub fn new(config: SessionConfig, out: O, err: E) -> Self {
        Self {
            config,
            line_number: 0,
            error_count: 0,
            device: None,
            block: Vec::new(),
            out,
            err,
        }
    }

    /// Number of lines consumed so far, blank lines included
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Number of errors reported so far
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// The attached device, if any
    pub fn device(&self) -> Option<&dyn BlockDevice> {
        self.device.as_deref()
    }

    /// Release the session and hand back its writers
    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Execute every line of `input` until it ends or a `quit` command.
    ///
    /// In interactive mode the banner (if configured) and a prompt before each
    /// line are written to the output stream.
    pub fn run<R: BufRead>(&mut self, input: R, interactive: bool) -> Result<()> {
        if interactive && self.config.show_banner {
            self.out.write_all(BANNER.as_bytes())?;
        }

        let mut lines = input.lines();
        loop {
            if interactive {
                write!(self.out, "{}", self.config.prompt)?;
                self.out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            if self.execute_line(&line?)? == Flow::Quit {
                break;
            }
        }

        self.disconnect();
        self.out.flush()?;
        Ok(())
    }

    /// Parse and execute one line
    pub fn execute_line(&mut self, line: &str) -> Result<Flow> {
        self.line_number += 1;
        match command::parse_line(line) {
            Ok(None) => Ok(Flow::Continue),
            Ok(Some(command)) => self.execute(command),
            Err(err @ ParseError::UnknownCommand(_)) => {
                self.report(&format!("{} in \"{}\"", err, line.trim()), None, None)?;
                if self.config.stop_on_unknown_command {
                    Ok(Flow::Quit)
                } else {
                    Ok(Flow::Continue)
                }
            }
            Err(err) => {
                // A connect releases the attached disk even when malformed
                if command::is_connect_line(line) {
                    self.disconnect();
                }
                self.report(&err.to_string(), None, None)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Execute a parsed command
    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Connect {
                block_size,
                block_count,
                target,
            } => self.connect(block_size, block_count, target)?,
            // Everything else needs an attached device
            _ if self.device.is_none() => self.report("no disk currently connected", None, None)?,
            Command::Disconnect => self.disconnect(),
            Command::Status => self.show_status()?,
            Command::Write {
                block,
                pattern,
                expect,
            } => self.write_block(block, &pattern, expect)?,
            Command::Read {
                block,
                examine,
                expect,
            } => self.read_block(block, examine.as_deref(), expect)?,
        }
        Ok(Flow::Continue)
    }

    fn connect(&mut self, block_size: usize, block_count: usize, target: ConnectTarget) -> Result<()> {
        self.disconnect();

        let opening = matches!(target, ConnectTarget::Open(_));
        let request = DeviceRequest::new(block_size, block_count);
        let (kind, request) = match target {
            ConnectTarget::Open(path) => (BackendKind::File, request.with_path(path, false)),
            ConnectTarget::New(path) => (BackendKind::File, request.with_path(path, true)),
            ConnectTarget::Memory => (BackendKind::Memory, request),
            ConnectTarget::Unimplemented => (BackendKind::Unimplemented, request),
        };

        let Some(device) = blockdev::make_device(kind.token(), &request) else {
            return self.report("unable to construct disk", None, None);
        };

        // The stub never reports OK but stays attached
        if kind != BackendKind::Unimplemented && device.status() != DiskStatus::Ok {
            let message = match device.last_error() {
                Some(err) => format!("connecting error: {}", err),
                None => "connecting error".to_string(),
            };
            return self.report(&message, None, Some(device.status()));
        }

        if opening && (device.block_size(), device.block_count()) != (block_size, block_count) {
            log::warn!(
                "Opened image has geometry {}x{}, not the requested {}x{}",
                device.block_size(),
                device.block_count(),
                block_size,
                block_count
            );
        }

        log::info!(
            "Connected {} disk: {} blocks of {} bytes",
            kind,
            device.block_count(),
            device.block_size()
        );
        self.block = vec![0u8; device.block_size()];
        self.device = Some(device);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(device) = self.device.take() {
            log::info!("Disconnected {} disk", device.kind());
        }
        self.block = Vec::new();
    }

    fn show_status(&mut self) -> Result<()> {
        let Some(device) = self.device.as_deref() else {
            return Ok(());
        };
        writeln!(
            self.out,
            "{} disk: block_size = {} block_count = {} DiskStatus = {}",
            device.kind(),
            device.block_size(),
            device.block_count(),
            device.status()
        )?;
        Ok(())
    }

    fn write_block(&mut self, block: BlockNumber, pattern: &[u8], expect: Option<DiskStatus>) -> Result<()> {
        let Some(device) = self.device.as_mut() else {
            return Ok(());
        };
        block_util::fill_block(&mut self.block, pattern);
        let status = device.write(block, &self.block);
        self.check_status("write", block, status, expect)?;
        Ok(())
    }

    fn read_block(
        &mut self,
        block: BlockNumber,
        examine: Option<&[u8]>,
        expect: Option<DiskStatus>,
    ) -> Result<()> {
        let Some(device) = self.device.as_mut() else {
            return Ok(());
        };
        let status = device.read(block, &mut self.block);
        if !self.check_status("read", block, status, expect)? {
            return Ok(());
        }

        if let Some(pattern) = examine {
            let expected = block_util::filled_block(self.block.len(), pattern);
            if expected != self.block {
                self.report("examined block does not match", Some(block), None)?;
            }
            return Ok(());
        }

        match self.config.dump_format {
            DumpFormat::Raw => {
                block_util::dump_block(&mut self.out, &self.block)?;
                writeln!(self.out)?;
            }
            DumpFormat::Hex => block_util::hex_dump(&mut self.out, &self.block)?,
        }
        Ok(())
    }

    /// Report a status that is not the expected one. Returns whether the
    /// operation succeeded.
    fn check_status(
        &mut self,
        op: &str,
        block: BlockNumber,
        status: DiskStatus,
        expect: Option<DiskStatus>,
    ) -> Result<bool> {
        match expect {
            Some(expected) if expected == status => {}
            Some(expected) => self.report(
                &format!("{} status mismatch, expected {}", op, expected),
                Some(block),
                Some(status),
            )?,
            None if status != DiskStatus::Ok => {
                self.report(&format!("{} generates an error", op), Some(block), Some(status))?
            }
            None => {}
        }
        Ok(status.is_ok())
    }

    fn report(&mut self, message: &str, block: Option<BlockNumber>, status: Option<DiskStatus>) -> Result<()> {
        self.error_count += 1;

        let mut text = format!("{}: {}", self.line_number, message);
        if let Some(block) = block {
            text.push_str(&format!(" block[{}]", block));
        }
        if let Some(status) = status {
            text.push_str(&format!(" DiskStatus = {}", status));
        }
        log::debug!("{}", text);
        writeln!(self.err, "{}", text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session() -> Session<Vec<u8>, Vec<u8>> {
        Session::new(SessionConfig::default(), Vec::new(), Vec::new())
    }

    fn output(session: Session<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = session.into_writers();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_commands_need_a_device() {
        let mut session = session();
        assert_eq!(session.execute_line("r 0").unwrap(), Flow::Continue);
        assert_eq!(session.execute_line("d").unwrap(), Flow::Continue);
        assert_eq!(session.error_count(), 2);
        let (_, err) = output(session);
        assert_eq!(err, "1: no disk currently connected\n2: no disk currently connected\n");
    }

    #[test]
    fn test_memory_roundtrip() {
        let mut session = session();
        session.execute_line("c 32 4 r").unwrap();
        assert_eq!(session.device().map(|d| d.kind()), Some(BackendKind::Memory));
        session.execute_line(r#"w 3 "ab""#).unwrap();
        session.execute_line("r 3").unwrap();
        assert_eq!(session.error_count(), 0);
        let (out, _) = output(session);
        assert_eq!(out, format!("{}\n", "ab".repeat(16)));
    }

    #[test]
    fn test_device_errors_are_reported_not_fatal() {
        let mut session = session();
        session.execute_line("c 32 4 r").unwrap();
        session.execute_line(r#"w 4 "a""#).unwrap();
        assert_eq!(session.execute_line("r 9").unwrap(), Flow::Continue);
        let (_, err) = output(session);
        assert_eq!(
            err,
            "2: write generates an error block[4] DiskStatus = BLOCK_OUT_OF_RANGE\n\
             3: read generates an error block[9] DiskStatus = BLOCK_OUT_OF_RANGE\n"
        );
    }

    #[test]
    fn test_expected_status_and_examine() {
        let mut session = session();
        session.execute_line("c 32 4 r").unwrap();
        session.execute_line(r#"w 4 "a" s BLOCK_OUT_OF_RANGE"#).unwrap();
        session.execute_line(r#"w 1 "a" s OK"#).unwrap();
        session.execute_line(r#"r 1 x "a" s OK"#).unwrap();
        assert_eq!(session.error_count(), 0);

        session.execute_line(r#"r 1 x "b""#).unwrap();
        session.execute_line(r#"w 0 "a" s ERROR"#).unwrap();
        let (out, err) = output(session);
        assert!(out.is_empty(), "examined reads do not dump");
        assert_eq!(
            err,
            "5: examined block does not match block[1]\n\
             6: write status mismatch, expected ERROR block[0] DiskStatus = OK\n"
        );
    }

    #[test]
    fn test_unimplemented_disk_stays_attached() {
        let mut session = session();
        session.execute_line("c 512 8 u").unwrap();
        assert!(session.device().is_some());
        session.execute_line(r#"w 0 "a""#).unwrap();
        session.execute_line("s").unwrap();
        let (out, err) = output(session);
        assert_eq!(out, "unimplemented disk: block_size = 0 block_count = 0 DiskStatus = NOT_YET_IMPLEMENTED\n");
        assert_eq!(err, "2: write generates an error block[0] DiskStatus = NOT_YET_IMPLEMENTED\n");
    }

    #[test]
    fn test_failed_connect_leaves_nothing_attached() {
        let mut session = session();
        session.execute_line("c 8 4 r").unwrap();
        assert!(session.device().is_none());
        let (_, err) = output(session);
        assert!(err.starts_with("1: connecting error: Invalid geometry"));
        assert!(err.ends_with("DiskStatus = ERROR\n"));
    }

    #[test]
    fn test_malformed_connect_releases_device() {
        let mut session = session();
        session.execute_line("c 32 2 r").unwrap();
        assert!(session.device().is_some());
        session.execute_line("c 32").unwrap();
        assert!(session.device().is_none());

        session.execute_line("c 32 2 r").unwrap();
        session.execute_line("r 1 x").unwrap();
        assert!(session.device().is_some(), "other parse errors keep the disk");

        let (_, err) = output(session);
        assert_eq!(
            err,
            "2: missing <block_size> or <block_count> for connection\n\
             4: missing <pattern> for examine\n"
        );
    }

    #[test]
    fn test_unknown_command_handling() {
        let mut session = session();
        assert_eq!(session.execute_line("z 1 2").unwrap(), Flow::Continue);
        let (_, err) = output(session);
        assert_eq!(err, "1: unknown command \"z\" in \"z 1 2\"\n");

        let config = SessionConfig {
            stop_on_unknown_command: true,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, Vec::new(), Vec::new());
        assert_eq!(session.execute_line("z").unwrap(), Flow::Quit);
    }

    #[test]
    fn test_run_counts_blank_lines_and_stops_at_quit() {
        let script = "\nc 32 2 r\n\nr 5\nq\nr 0\n";
        let mut session = session();
        session.run(Cursor::new(script), false).unwrap();
        assert_eq!(session.line_number(), 5);
        assert!(session.device().is_none(), "run releases the device");
        let (out, err) = output(session);
        assert!(out.is_empty());
        assert_eq!(err, "4: read generates an error block[5] DiskStatus = BLOCK_OUT_OF_RANGE\n");
    }

    #[test]
    fn test_interactive_prompt_and_banner() {
        let config = SessionConfig {
            prompt: "> ".to_string(),
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, Vec::new(), Vec::new());
        session.run(Cursor::new("q\n"), true).unwrap();
        let (out, _) = output(session);
        assert!(out.starts_with("Welcome to the Very Simple Simulated Disk protocol."));
        assert!(out.ends_with("> "));
    }

    #[test]
    fn test_hex_dump_format() {
        let config = SessionConfig {
            dump_format: DumpFormat::Hex,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, Vec::new(), Vec::new());
        session.execute_line("c 32 2 r").unwrap();
        session.execute_line("w 0 0x41").unwrap();
        session.execute_line("r 0").unwrap();
        let (out, _) = output(session);
        assert_eq!(out.lines().count(), 2);
        assert!(out.starts_with("00000000: 41 41"));
    }
}
