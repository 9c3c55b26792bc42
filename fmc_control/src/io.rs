//! Digital I/O: output commands and input/output reads from a snapshot.
//!
//! Lines are numbered 0..=3 (IN0..IN3, OUT0..OUT3). Outputs are open-drain,
//! so driving a line `Low` pulls it to ground.

use fmc_common::consts::DIGITAL_IO_LINES;
use fmc_common::error::CommandError;
use fmc_common::status::MachineStatus;
use serde::{Deserialize, Serialize};

use crate::command::FrameWriter;

/// Output level code as the controller expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OutputLevel {
    High = 0,
    Low = 1,
}

impl OutputLevel {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::High),
            1 => Some(Self::Low),
            _ => None,
        }
    }
}

/// Auxiliary I/O command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCommand {
    SetOutput { line: u8, level: OutputLevel },
}

impl IoCommand {
    pub const OP_SET_OUTPUT: u8 = 0x10;

    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Self::SetOutput { line, level } => FrameWriter::new(Self::OP_SET_OUTPUT, 0)
                .u8(line)
                .u8(level as u8)
                .finish(),
        }
    }
}

fn check_line(line: u8) -> Result<(), CommandError> {
    if line < DIGITAL_IO_LINES {
        Ok(())
    } else {
        Err(CommandError::invalid(
            "line",
            format!("{line} outside 0..={}", DIGITAL_IO_LINES - 1),
        ))
    }
}

/// Build a set-output command.
pub fn set_output(line: u8, level: OutputLevel) -> Result<IoCommand, CommandError> {
    check_line(line)?;
    Ok(IoCommand::SetOutput { line, level })
}

/// Whether input `line` reads active in `status`.
pub fn input(status: &MachineStatus, line: u8) -> Result<bool, CommandError> {
    check_line(line)?;
    Ok(status.input_status & (1 << line) != 0)
}

/// Whether output `line` is set in `status`.
pub fn output(status: &MachineStatus, line: u8) -> Result<bool, CommandError> {
    check_line(line)?;
    Ok(status.output_status & (1 << line) != 0)
}
