//! Controller-resident program and script files.
//!
//! Holds no state of its own: every check runs against the file table in
//! the latest snapshot. Transfers are delegated to the transport.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use fmc_common::codec::status::check_file_name;
use fmc_common::consts::FILE_SLOT_LEN;
use fmc_common::error::{DecodeError, FileError};
use fmc_common::status::MachineStatus;
use serde::{Deserialize, Serialize};

use crate::command::FrameWriter;
use crate::error::Error;
use crate::state::AxisStateMachine;

/// Kind of file stored on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FileKind {
    /// Compiled motion program.
    Binary = 1,
    /// Script source.
    Script = 2,
}

impl FileKind {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Binary),
            2 => Some(Self::Script),
            _ => None,
        }
    }
}

impl TryFrom<i32> for FileKind {
    type Error = FileError;

    fn try_from(code: i32) -> Result<Self, FileError> {
        u8::try_from(code)
            .ok()
            .and_then(Self::from_u8)
            .ok_or_else(|| FileError::UnsupportedKind(code.to_string()))
    }
}

impl FromStr for FileKind {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, FileError> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(Self::Binary),
            "script" | "lua" => Ok(Self::Script),
            _ => Err(FileError::UnsupportedKind(s.to_string())),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Binary => "binary",
            Self::Script => "script",
        })
    }
}

/// Script control command frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    StartAutoRun { name: String },
    StopAutoRun,
    DeleteScript { name: String },
}

impl ScriptCommand {
    pub const OP_START_AUTO_RUN: u8 = 0x20;
    pub const OP_STOP_AUTO_RUN: u8 = 0x21;
    pub const OP_DELETE_SCRIPT: u8 = 0x22;

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::StartAutoRun { name } => FrameWriter::new(Self::OP_START_AUTO_RUN, 0)
                .slot_name(name)
                .finish(),
            Self::StopAutoRun => FrameWriter::new(Self::OP_STOP_AUTO_RUN, 0).finish(),
            Self::DeleteScript { name } => FrameWriter::new(Self::OP_DELETE_SCRIPT, 0)
                .slot_name(name)
                .finish(),
        }
    }
}

/// A checked upload request: local path, slot name and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload<'a> {
    pub path: &'a Path,
    pub name: String,
    pub kind: FileKind,
}

fn require_file(status: &MachineStatus, name: &str) -> Result<(), FileError> {
    if status.has_file(name) {
        Ok(())
    } else {
        Err(FileError::NotFound(name.to_string()))
    }
}

/// Start executing a resident file.
///
/// The file must be in the snapshot's table; then the axis state must allow
/// a script to start.
pub fn start_auto_run(status: &MachineStatus, name: &str) -> Result<ScriptCommand, Error> {
    require_file(status, name)?;
    AxisStateMachine::new(status).check_auto_run()?;
    Ok(ScriptCommand::StartAutoRun {
        name: name.to_string(),
    })
}

/// Stop any running script. Always legal.
pub fn stop_auto_run() -> ScriptCommand {
    ScriptCommand::StopAutoRun
}

/// Delete a resident file.
pub fn delete_script(status: &MachineStatus, name: &str) -> Result<ScriptCommand, FileError> {
    require_file(status, name)?;
    Ok(ScriptCommand::DeleteScript {
        name: name.to_string(),
    })
}

/// Validate an upload. The controller stores the file under its base name.
pub fn upload(path: &Path, kind: FileKind) -> Result<FileUpload<'_>, FileError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FileError::InvalidName(path.display().to_string()))?;
    check_file_name(name).map_err(|e| match e {
        DecodeError::NameTooLong { name, .. } => FileError::NameTooLong {
            name,
            max: FILE_SLOT_LEN,
        },
        _ => FileError::InvalidName(name.to_string()),
    })?;
    Ok(FileUpload {
        path,
        name: name.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmc_common::error::CommandError;
    use fmc_common::status::{AxisFlags, FileTable, RunMode};

    fn with_files(names: &[&str]) -> MachineStatus {
        let mut files = FileTable::new();
        for n in names {
            files.push(n.to_string()).unwrap();
        }
        MachineStatus {
            files,
            run_mode: RunMode::Manual,
            ..Default::default()
        }
    }

    #[test]
    fn start_missing_file_is_not_found() {
        let status = with_files(&["main.lua"]);
        assert!(matches!(
            start_auto_run(&status, "prog.bin"),
            Err(Error::File(FileError::NotFound(name))) if name == "prog.bin"
        ));
    }

    #[test]
    fn start_resident_file() {
        let status = with_files(&["prog.bin"]);
        let cmd = start_auto_run(&status, "prog.bin").unwrap();
        let frame = cmd.encode();
        assert_eq!(frame.len(), 2 + FILE_SLOT_LEN);
        assert_eq!(&frame[..2], &[0x20, 0x00]);
        assert_eq!(&frame[2..10], b"prog.bin");
    }

    #[test]
    fn missing_file_reported_before_mode_conflict() {
        let mut status = with_files(&[]);
        status.axis_status[0] = AxisFlags::RUNNING;
        assert!(matches!(start_auto_run(&status, "a.lua"), Err(Error::File(_))));

        let mut status = with_files(&["a.lua"]);
        status.axis_status[0] = AxisFlags::RUNNING;
        assert!(matches!(
            start_auto_run(&status, "a.lua"),
            Err(Error::Command(CommandError::ModeConflict(_)))
        ));
    }

    #[test]
    fn delete_requires_resident_file() {
        let status = with_files(&["a.lua", "b.lua"]);
        assert_eq!(
            delete_script(&status, "b.lua").unwrap(),
            ScriptCommand::DeleteScript {
                name: "b.lua".to_string()
            }
        );
        assert_eq!(
            delete_script(&status, "c.lua"),
            Err(FileError::NotFound("c.lua".to_string()))
        );
    }

    #[test]
    fn stop_is_unconditional() {
        assert_eq!(stop_auto_run().encode(), vec![0x21, 0x00]);
    }

    #[test]
    fn kind_codes_and_names() {
        assert_eq!(FileKind::try_from(1), Ok(FileKind::Binary));
        assert_eq!(FileKind::try_from(2), Ok(FileKind::Script));
        assert_eq!(
            FileKind::try_from(3),
            Err(FileError::UnsupportedKind("3".to_string()))
        );
        assert!(FileKind::try_from(-1).is_err());
        assert_eq!("Script".parse::<FileKind>(), Ok(FileKind::Script));
        assert!(matches!("gcode".parse::<FileKind>(), Err(FileError::UnsupportedKind(_))));
    }

    #[test]
    fn upload_checks_slot_name() {
        let ok = upload(Path::new("/tmp/jobs/cut.lua"), FileKind::Script).unwrap();
        assert_eq!(ok.name, "cut.lua");

        let long = format!("/tmp/{}.lua", "n".repeat(FILE_SLOT_LEN));
        assert!(matches!(
            upload(Path::new(&long), FileKind::Script),
            Err(FileError::NameTooLong { max: FILE_SLOT_LEN, .. })
        ));
        assert!(matches!(
            upload(Path::new("/"), FileKind::Binary),
            Err(FileError::InvalidName(_))
        ));
    }
}
