//! Register/coil access to extension devices on the shared RS-485 line.
//!
//! Requests are encoded as `slave_id, function, address_hi, address_lo, ...`
//! with big-endian words. Framing and CRC belong to the transport. This
//! layer does not arbitrate bus access; the transport serialises requests.
//!
//! | Function | Code | Request body                          | Response body           |
//! |----------|------|---------------------------------------|-------------------------|
//! | Read coils              | 0x01 | count                  | byte count, packed bits |
//! | Read holding registers  | 0x03 | count                  | byte count, words       |
//! | Write single coil       | 0x05 | 0xFF00 / 0x0000        | echo                    |
//! | Write single register   | 0x06 | value                  | echo                    |
//! | Write multiple registers| 0x10 | count, byte count, words | echo of address, count |

use fmc_common::consts::MAX_RAW_BUS_FRAME;
use fmc_common::error::{CommandError, DecodeError};
use serde::{Deserialize, Serialize};

/// Smallest and largest addressable slave id.
pub const SLAVE_ID_RANGE: std::ops::RangeInclusive<u8> = 1..=247;
/// Coils per read request.
pub const MAX_READ_COILS: u16 = 2000;
/// Registers per read request.
pub const MAX_READ_REGISTERS: u16 = 125;
/// Registers per write-multiple request.
pub const MAX_WRITE_REGISTERS: u16 = 123;

const COIL_ON: u16 = 0xFF00;
const COIL_OFF: u16 = 0x0000;
const EXCEPTION_BIT: u8 = 0x80;

/// Sub-bus function codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 0x01,
    ReadHoldingRegisters = 0x03,
    WriteSingleCoil = 0x05,
    WriteSingleRegister = 0x06,
    WriteMultipleRegisters = 0x10,
}

impl FunctionCode {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(Self::ReadCoils),
            0x03 => Some(Self::ReadHoldingRegisters),
            0x05 => Some(Self::WriteSingleCoil),
            0x06 => Some(Self::WriteSingleRegister),
            0x10 => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }
}

/// Accepted encodings for a single-coil "on" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoilConvention {
    /// Only `0xFF00` (on) and `0x0000` (off).
    Strict,
    /// Also accept `0x0001` as on.
    #[default]
    Lenient,
}

impl CoilConvention {
    /// Interpret a raw coil word.
    pub fn coil_value(self, raw: u16) -> Result<bool, CommandError> {
        match (raw, self) {
            (COIL_OFF, _) => Ok(false),
            (COIL_ON, _) | (0x0001, Self::Lenient) => Ok(true),
            _ => Err(CommandError::invalid(
                "coil_value",
                format!("{raw:#06x} is not a coil state ({self:?} convention)"),
            )),
        }
    }
}

/// One request shape with its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusRequest {
    ReadCoils { address: u16, count: u16 },
    ReadHoldingRegisters { address: u16, count: u16 },
    WriteSingleCoil { address: u16, on: bool },
    WriteSingleRegister { address: u16, value: u16 },
    WriteMultipleRegisters { address: u16, values: Vec<u16> },
}

impl BusRequest {
    pub const fn function(&self) -> FunctionCode {
        match self {
            Self::ReadCoils { .. } => FunctionCode::ReadCoils,
            Self::ReadHoldingRegisters { .. } => FunctionCode::ReadHoldingRegisters,
            Self::WriteSingleCoil { .. } => FunctionCode::WriteSingleCoil,
            Self::WriteSingleRegister { .. } => FunctionCode::WriteSingleRegister,
            Self::WriteMultipleRegisters { .. } => FunctionCode::WriteMultipleRegisters,
        }
    }

    pub const fn address(&self) -> u16 {
        match self {
            Self::ReadCoils { address, .. }
            | Self::ReadHoldingRegisters { address, .. }
            | Self::WriteSingleCoil { address, .. }
            | Self::WriteSingleRegister { address, .. }
            | Self::WriteMultipleRegisters { address, .. } => *address,
        }
    }
}

/// Decoded reply to a [`SubBusFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusResponse {
    Coils(Vec<bool>),
    Registers(Vec<u16>),
    /// Write acknowledged by a matching echo.
    Written,
}

/// A validated request addressed to one slave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBusFrame {
    slave_id: u8,
    request: BusRequest,
}

fn check_slave(slave_id: u8) -> Result<(), CommandError> {
    if SLAVE_ID_RANGE.contains(&slave_id) {
        Ok(())
    } else {
        Err(CommandError::invalid(
            "slave_id",
            format!("{slave_id} outside 1..=247"),
        ))
    }
}

fn check_count(name: &'static str, count: u16, max: u16) -> Result<(), CommandError> {
    if (1..=max).contains(&count) {
        Ok(())
    } else {
        Err(CommandError::invalid(name, format!("{count} outside 1..={max}")))
    }
}

impl SubBusFrame {
    pub fn read_coils(slave_id: u8, address: u16, count: u16) -> Result<Self, CommandError> {
        check_slave(slave_id)?;
        check_count("count", count, MAX_READ_COILS)?;
        Ok(Self {
            slave_id,
            request: BusRequest::ReadCoils { address, count },
        })
    }

    pub fn read_registers(slave_id: u8, address: u16, count: u16) -> Result<Self, CommandError> {
        check_slave(slave_id)?;
        check_count("count", count, MAX_READ_REGISTERS)?;
        Ok(Self {
            slave_id,
            request: BusRequest::ReadHoldingRegisters { address, count },
        })
    }

    /// Write one coil. `raw` is interpreted under `convention`.
    pub fn write_single_coil(
        slave_id: u8,
        address: u16,
        raw: u16,
        convention: CoilConvention,
    ) -> Result<Self, CommandError> {
        check_slave(slave_id)?;
        let on = convention.coil_value(raw)?;
        Ok(Self {
            slave_id,
            request: BusRequest::WriteSingleCoil { address, on },
        })
    }

    pub fn write_single_register(
        slave_id: u8,
        address: u16,
        value: u16,
    ) -> Result<Self, CommandError> {
        check_slave(slave_id)?;
        Ok(Self {
            slave_id,
            request: BusRequest::WriteSingleRegister { address, value },
        })
    }

    /// Write consecutive registers. `count` must equal `values.len()`.
    pub fn write_multiple_registers(
        slave_id: u8,
        address: u16,
        count: u16,
        values: &[u16],
    ) -> Result<Self, CommandError> {
        check_slave(slave_id)?;
        if usize::from(count) != values.len() {
            return Err(CommandError::invalid(
                "count",
                format!("declared {count}, {} values supplied", values.len()),
            ));
        }
        check_count("count", count, MAX_WRITE_REGISTERS)?;
        Ok(Self {
            slave_id,
            request: BusRequest::WriteMultipleRegisters {
                address,
                values: values.to_vec(),
            },
        })
    }

    #[inline]
    pub const fn slave_id(&self) -> u8 {
        self.slave_id
    }

    #[inline]
    pub const fn request(&self) -> &BusRequest {
        &self.request
    }

    /// Encode the request bytes handed to the transport.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8);
        buf.push(self.slave_id);
        buf.push(self.request.function() as u8);
        buf.extend_from_slice(&self.request.address().to_be_bytes());
        match &self.request {
            BusRequest::ReadCoils { count, .. } | BusRequest::ReadHoldingRegisters { count, .. } => {
                buf.extend_from_slice(&count.to_be_bytes());
            }
            BusRequest::WriteSingleCoil { on, .. } => {
                let word = if *on { COIL_ON } else { COIL_OFF };
                buf.extend_from_slice(&word.to_be_bytes());
            }
            BusRequest::WriteSingleRegister { value, .. } => {
                buf.extend_from_slice(&value.to_be_bytes());
            }
            BusRequest::WriteMultipleRegisters { values, .. } => {
                // Bounded by MAX_WRITE_REGISTERS at construction.
                let count = values.len() as u16;
                buf.extend_from_slice(&count.to_be_bytes());
                buf.push((values.len() * 2) as u8);
                for v in values {
                    buf.extend_from_slice(&v.to_be_bytes());
                }
            }
        }
        buf
    }

    /// Decode and check the slave's reply to this request.
    ///
    /// # Errors
    ///
    /// - `DecodeError::BusException` for an exception reply (`function | 0x80`)
    /// - `DecodeError::UnexpectedResponse` for a wrong slave, function code,
    ///   byte count or write echo
    pub fn decode_response(&self, bytes: &[u8]) -> Result<BusResponse, DecodeError> {
        let function = self.request.function() as u8;
        let unexpected = |what: String| Err(DecodeError::UnexpectedResponse(what));

        if bytes.len() < 3 {
            return unexpected(format!("reply of {} bytes is too short", bytes.len()));
        }
        if bytes[0] != self.slave_id {
            return unexpected(format!(
                "reply from slave {}, expected {}",
                bytes[0], self.slave_id
            ));
        }
        if bytes[1] == function | EXCEPTION_BIT {
            return Err(DecodeError::BusException {
                function,
                code: bytes[2],
            });
        }
        if bytes[1] != function {
            return unexpected(format!(
                "function {:#04x} in reply, expected {function:#04x}",
                bytes[1]
            ));
        }

        match &self.request {
            BusRequest::ReadCoils { count, .. } => {
                let data = read_body(bytes, usize::from(count.div_ceil(8)))?;
                let coils = (0..usize::from(*count))
                    .map(|i| data[i / 8] & (1 << (i % 8)) != 0)
                    .collect();
                Ok(BusResponse::Coils(coils))
            }
            BusRequest::ReadHoldingRegisters { count, .. } => {
                let data = read_body(bytes, usize::from(*count) * 2)?;
                let words = data
                    .chunks_exact(2)
                    .map(|w| u16::from_be_bytes([w[0], w[1]]))
                    .collect();
                Ok(BusResponse::Registers(words))
            }
            _ => {
                let request = self.encode();
                if bytes.len() != 6 || bytes[..] != request[..6] {
                    return unexpected(format!("write echo {bytes:02x?} does not match request"));
                }
                Ok(BusResponse::Written)
            }
        }
    }
}

/// Check the byte count of a read reply and return its data section.
fn read_body(bytes: &[u8], expected: usize) -> Result<&[u8], DecodeError> {
    let declared = usize::from(bytes[2]);
    if declared != expected || bytes.len() != 3 + expected {
        return Err(DecodeError::UnexpectedResponse(format!(
            "byte count {declared} with {} data bytes, expected {expected}",
            bytes.len() - 3
        )));
    }
    Ok(&bytes[3..])
}

/// Raw RS-485 passthrough payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBusFrame(Vec<u8>);

impl RawBusFrame {
    /// Wrap a payload of 1..=[`MAX_RAW_BUS_FRAME`] bytes.
    pub fn new(payload: &[u8]) -> Result<Self, CommandError> {
        if payload.is_empty() || payload.len() > MAX_RAW_BUS_FRAME {
            return Err(CommandError::invalid(
                "payload",
                format!("{} bytes outside 1..={MAX_RAW_BUS_FRAME}", payload.len()),
            ));
        }
        Ok(Self(payload.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
