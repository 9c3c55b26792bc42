//! Device session integration tests over the simulated transport.
//!
//! Cover the end-to-end contract: commands are built against the cached
//! snapshot, frames reach the transport byte-exact, and no failure leaves
//! the cache partially updated.

use fmc_control::prelude::*;
use std::path::Path;

const DEV: DeviceId = 7;

fn status_with(flags: [AxisFlags; 3]) -> MachineStatus {
    MachineStatus {
        run_mode: RunMode::Manual,
        axis_status: flags,
        ..Default::default()
    }
}

fn idle() -> MachineStatus {
    status_with([AxisFlags::POWER_ON; 3])
}

fn polled_session(status: &MachineStatus) -> DeviceSession<SimTransport> {
    let mut sim = SimTransport::new();
    sim.add_device(DEV, status).unwrap();
    let mut session = DeviceSession::with_defaults(sim);
    session.poll_status(DEV).unwrap();
    session
}

fn jog(target: f32) -> JogParams {
    JogParams {
        target,
        speed: 20.0,
        acc: 200.0,
        dec: 200.0,
        mode: JogMode::Absolute,
    }
}

fn home() -> HomeParams {
    HomeParams {
        speed: 10.0,
        acc_dec: 100.0,
        fall_step: 1.0,
        dir: HomeDirection::Negative,
    }
}

fn arc(radius: f32) -> ArcParams {
    ArcParams {
        end: [3.0, 4.0],
        center: [0.0, 0.0],
        radius,
        speed: 15.0,
        acc: 100.0,
        dec: 100.0,
        dir: ArcDirection::Clockwise,
    }
}

fn sent(session: &DeviceSession<SimTransport>) -> usize {
    session.transport().sent(DEV).len()
}

// ─── Motion gating ──────────────────────────────────────────────────

#[test]
fn jog_on_running_axis_is_busy_and_nothing_is_sent() {
    let mut session = polled_session(&status_with([AxisFlags::RUNNING, AxisFlags::POWER_ON, AxisFlags::POWER_ON]));
    assert_eq!(
        session.jog(DEV, AxisSelection::X, jog(5.0)),
        Err(Error::Command(CommandError::AxisBusy {
            axis: Axis::X,
            state: AxisState::Running
        }))
    );
    assert_eq!(sent(&session), 0);

    session.jog(DEV, AxisSelection::Y, jog(5.0)).unwrap();
    let frame = &session.transport().sent(DEV)[0];
    assert_eq!(&frame[..2], &[0x01, 0x02]);
    assert_eq!(*frame.last().unwrap(), JogMode::Absolute as u8);
}

#[test]
fn home_requires_defined_limits() {
    for undefined in [AxisFlags::LIMIT_N_UNDEFINED, AxisFlags::LIMIT_P_UNDEFINED] {
        let mut session = polled_session(&status_with([AxisFlags::POWER_ON, AxisFlags::POWER_ON, undefined]));
        assert_eq!(
            session.home(DEV, Axis::Z, home()),
            Err(Error::Command(CommandError::HomeRequiresLimits { axis: Axis::Z }))
        );
        assert_eq!(sent(&session), 0);
    }

    let mut session = polled_session(&idle());
    session.home(DEV, Axis::Z, home()).unwrap();
    assert_eq!(&session.transport().sent(DEV)[0][..2], &[0x02, 0x04]);
}

#[test]
fn arc_geometry() {
    let mut session = polled_session(&idle());
    session.arc_2axis(DEV, AxisSelection::XY, arc(5.0)).unwrap();
    assert!(matches!(
        session.arc_2axis(DEV, AxisSelection::XY, arc(4.9)),
        Err(Error::Command(CommandError::ArcGeometryMismatch { .. }))
    ));
    assert_eq!(sent(&session), 1);
}

#[test]
fn arc_tolerance_from_config() {
    let config = ControlConfig::from_toml_str("[command]\narc_radius_tolerance = 0.05\n").unwrap();
    config.validate().unwrap();
    let mut sim = SimTransport::new();
    sim.add_device(DEV, &idle()).unwrap();
    let mut session = DeviceSession::new(sim, &config).unwrap();
    session.poll_status(DEV).unwrap();
    assert!(session.arc_2axis(DEV, AxisSelection::XY, arc(4.9)).is_ok());
}

#[test]
fn unusable_arc_tolerance_refused_by_session() {
    for text in ["nan", "-0.001", "0.0"] {
        let config =
            ControlConfig::from_toml_str(&format!("[command]\narc_radius_tolerance = {text}\n"))
                .unwrap();
        let mut sim = SimTransport::new();
        sim.add_device(DEV, &idle()).unwrap();
        assert!(matches!(
            DeviceSession::new(sim, &config),
            Err(ConfigError::ValidationError(_))
        ));
    }
}

#[test]
fn line_2axis_with_three_axis_mask_rejected() {
    let mut session = polled_session(&idle());
    let params = LineParams {
        end: [10.0, 10.0],
        speed: 30.0,
        acc: 100.0,
        dec: 100.0,
    };
    assert!(matches!(
        session.line_2axis(DEV, AxisSelection::XYZ, params),
        Err(Error::Command(CommandError::InvalidAxisMask { mask: 0x07, .. }))
    ));
    session.line_2axis(DEV, AxisSelection::YZ, params).unwrap();

    session
        .line_3axis(
            DEV,
            AxisSelection::XYZ,
            LineParams {
                end: [1.0, 2.0, 3.0],
                speed: 30.0,
                acc: 100.0,
                dec: 100.0,
            },
        )
        .unwrap();
    let frames = session.transport().sent(DEV);
    assert_eq!(&frames[0][..2], &[0x04, 0x06]);
    assert_eq!(&frames[1][..2], &[0x05, 0x07]);
}

#[test]
fn pause_resume_cycle_follows_polled_state() {
    let mut session = polled_session(&status_with([AxisFlags::RUNNING, AxisFlags::RUNNING, AxisFlags::POWER_ON]));
    session.pause(DEV, AxisSelection::XY).unwrap();
    assert!(matches!(
        session.resume(DEV, AxisSelection::XY),
        Err(Error::Command(CommandError::InvalidStateTransition { command: "resume", .. }))
    ));

    // Still running until the controller reports the pause.
    let paused = status_with([AxisFlags::PAUSE, AxisFlags::PAUSE, AxisFlags::POWER_ON]);
    session.transport_mut().set_status(DEV, &paused).unwrap();
    session.poll_status(DEV).unwrap();
    session.resume(DEV, AxisSelection::XY).unwrap();
    assert!(session.pause(DEV, AxisSelection::X).is_err());
    assert_eq!(
        session.transport().sent(DEV),
        &[vec![0x07u8, 0x03], vec![0x08, 0x03]]
    );
}

// ─── Cache integrity ────────────────────────────────────────────────

#[test]
fn failed_poll_keeps_previous_snapshot() {
    let mut session = polled_session(&idle());
    let before = session.status(DEV).unwrap().clone();

    let running = status_with([AxisFlags::RUNNING; 3]);
    session.transport_mut().set_status(DEV, &running).unwrap();
    session.transport_mut().fail_next(TransportError::Timeout);
    assert_eq!(
        session.poll_status(DEV),
        Err(Error::Transport(TransportError::Timeout))
    );
    assert_eq!(session.status(DEV).unwrap(), &before);

    session.transport_mut().set_status_bytes(DEV, vec![0u8; STATUS_RECORD_SIZE - 4]);
    assert!(matches!(
        session.poll_status(DEV),
        Err(Error::Decode(DecodeError::SizeMismatch { .. }))
    ));
    assert_eq!(session.status(DEV).unwrap(), &before);
}

#[test]
fn failed_submit_keeps_cache() {
    let mut session = polled_session(&idle());
    let before = session.status(DEV).unwrap().clone();
    session
        .transport_mut()
        .fail_next(TransportError::ConnectionLost("cable".into()));
    assert!(matches!(
        session.jog(DEV, AxisSelection::Z, jog(1.0)),
        Err(Error::Transport(TransportError::ConnectionLost(_)))
    ));
    assert_eq!(session.status(DEV).unwrap(), &before);
    assert_eq!(sent(&session), 0);
}

#[test]
fn unknown_device_has_no_snapshot() {
    let mut session = polled_session(&idle());
    assert_eq!(session.status(99), Err(Error::NoSnapshot { device: 99 }));
    assert!(matches!(
        session.poll_status(99),
        Err(Error::Transport(TransportError::ConnectionLost(_)))
    ));
    assert_eq!(session.status(99), Err(Error::NoSnapshot { device: 99 }));
}

#[test]
fn anomalous_snapshot_is_cached_not_rejected() {
    let session = polled_session(&status_with([AxisFlags::RUNNING | AxisFlags::STOP, AxisFlags::POWER_ON, AxisFlags::POWER_ON]));
    let status = session.status(DEV).unwrap();
    assert_eq!(status.anomalies().len(), 1);
    assert_eq!(derive_state(status.axis_flags(Axis::X)), AxisState::Running);
}

// ─── Parameters ─────────────────────────────────────────────────────

#[test]
fn params_store_then_load() {
    let mut session = polled_session(&idle());
    assert_eq!(session.params(DEV), Err(Error::NoParams { device: DEV }));

    let params = DeviceParams {
        id: DEV,
        baud_232: 115_200,
        baud_485: 9_600,
        ip: "192.168.0.31".to_string(),
        port: 8088,
        axes: vec![
            AxisParams {
                div: 16,
                lead: 10,
                soft_limit_max: 500,
                soft_limit_min: 0,
                home_time: 30,
            };
            MAX_AXIS
        ],
    };
    session.store_params(DEV, params.clone()).unwrap();
    assert_eq!(session.params(DEV).unwrap(), &params);

    session.forget(DEV);
    assert_eq!(session.load_params(DEV).unwrap(), &params);
}

#[test]
fn invalid_params_never_reach_transport() {
    let mut session = polled_session(&idle());
    let mut params = DeviceParams {
        ip: "10.0.0.9".to_string(),
        axes: vec![AxisParams::default(); MAX_AXIS],
        ..Default::default()
    };
    params.axes[0].soft_limit_min = 100;
    params.axes[0].soft_limit_max = 50;
    let stored_before = session.transport().device(DEV).unwrap().params.clone();

    assert_eq!(
        session.store_params(DEV, params),
        Err(Error::Validation(ValidationError::InvalidSoftLimits {
            axis: 0,
            min: 100,
            max: 50
        }))
    );
    assert_eq!(session.transport().device(DEV).unwrap().params, stored_before);
    assert_eq!(session.params(DEV), Err(Error::NoParams { device: DEV }));
}

#[test]
fn failed_param_write_leaves_cache_unchanged() {
    let mut session = polled_session(&idle());
    session.load_params(DEV).unwrap();
    let cached = session.params(DEV).unwrap().clone();

    let changed = DeviceParams {
        id: 42,
        ..cached.clone()
    };
    session.transport_mut().fail_next(TransportError::Nak { code: -3 });
    assert_eq!(
        session.store_params(DEV, changed),
        Err(Error::Transport(TransportError::Nak { code: -3 }))
    );
    assert_eq!(session.params(DEV).unwrap(), &cached);
}

#[test]
fn version_record() {
    let mut session = polled_session(&idle());
    let v = VersionInfo {
        firmware: 0x0203,
        lib: 0x0101,
        serial_number: 123_456,
    };
    session.transport_mut().set_version(DEV, &v);
    assert_eq!(session.version(DEV).unwrap(), v);
}

// ─── Files and scripts ──────────────────────────────────────────────

#[test]
fn start_absent_program_is_not_found() {
    let mut session = polled_session(&idle());
    assert_eq!(
        session.start_auto_run(DEV, "prog.bin"),
        Err(Error::File(FileError::NotFound("prog.bin".to_string())))
    );
    assert_eq!(
        session.delete_script(DEV, "prog.bin"),
        Err(Error::File(FileError::NotFound("prog.bin".to_string())))
    );
}

#[test]
fn upload_then_run_then_delete() {
    let mut session = polled_session(&idle());
    session
        .upload_file(DEV, Path::new("/programs/prog.bin"), FileKind::Binary)
        .unwrap();

    // Snapshot is stale until the next poll.
    assert!(session.start_auto_run(DEV, "prog.bin").is_err());
    session.poll_status(DEV).unwrap();
    session.start_auto_run(DEV, "prog.bin").unwrap();
    session.delete_script(DEV, "prog.bin").unwrap();

    let frames = session.transport().sent(DEV);
    assert_eq!(frames[0][0], ScriptCommand::OP_START_AUTO_RUN);
    assert_eq!(&frames[0][2..10], b"prog.bin");
    assert_eq!(frames[1][0], ScriptCommand::OP_DELETE_SCRIPT);
}

#[test]
fn auto_run_conflicts_with_manual_motion() {
    let mut with_file = status_with([AxisFlags::POWER_ON, AxisFlags::HOMING, AxisFlags::POWER_ON]);
    with_file.files.push("main.lua".to_string()).unwrap();
    let mut session = polled_session(&with_file);
    assert!(matches!(
        session.start_auto_run(DEV, "main.lua"),
        Err(Error::Command(CommandError::ModeConflict(_)))
    ));
    session.stop_auto_run(DEV).unwrap();
}

#[test]
fn upload_rejects_unusable_names() {
    let mut session = polled_session(&idle());
    let long = format!("/tmp/{}.bin", "p".repeat(40));
    assert!(matches!(
        session.upload_file(DEV, Path::new(&long), FileKind::Binary),
        Err(Error::File(FileError::NameTooLong { .. }))
    ));
    assert!(session.transport().device(DEV).unwrap().uploads.is_empty());
}

// ─── I/O ────────────────────────────────────────────────────────────

#[test]
fn set_output_frames() {
    let mut session = polled_session(&idle());
    session.set_output(DEV, 2, OutputLevel::Low).unwrap();
    assert!(matches!(
        session.set_output(DEV, 4, OutputLevel::Low),
        Err(Error::Command(CommandError::InvalidParameter { name: "line", .. }))
    ));
    assert_eq!(session.transport().sent(DEV), &[vec![0x10u8, 0x00, 2, 1]]);
}

// ─── Sub-bus ────────────────────────────────────────────────────────

#[test]
fn coil_value_outside_convention_rejected() {
    let session = polled_session(&idle());
    assert!(matches!(
        SubBusFrame::write_single_coil(1, 0x0010, 0x1234, session.coil_convention()),
        Err(CommandError::InvalidParameter { .. })
    ));
}

#[test]
fn register_read_through_session() {
    let mut session = polled_session(&idle());
    let frame = SubBusFrame::read_registers(3, 0x0100, 2).unwrap();
    session
        .transport_mut()
        .queue_bus_reply(DEV, vec![3, 0x03, 4, 0x12, 0x34, 0xAB, 0xCD]);
    assert_eq!(
        session.bus_request(DEV, &frame).unwrap(),
        BusResponse::Registers(vec![0x1234, 0xABCD])
    );
    assert_eq!(
        session.transport().device(DEV).unwrap().bus_requests[0],
        vec![3, 0x03, 0x01, 0x00, 0x00, 0x02]
    );
}

#[test]
fn bus_exception_surfaces_as_decode_error() {
    let mut session = polled_session(&idle());
    let frame = SubBusFrame::write_single_coil(3, 0x0001, 0xFF00, CoilConvention::Strict).unwrap();
    session.transport_mut().queue_bus_reply(DEV, vec![3, 0x85, 0x04]);
    assert_eq!(
        session.bus_request(DEV, &frame),
        Err(Error::Decode(DecodeError::BusException {
            function: 0x05,
            code: 0x04
        }))
    );
}

#[test]
fn raw_bus_passthrough() {
    let mut session = polled_session(&idle());
    session.transport_mut().queue_bus_reply(DEV, vec![0xAA, 0x55]);
    let frame = RawBusFrame::new(b"PING").unwrap();
    assert_eq!(session.bus_raw(DEV, &frame).unwrap(), vec![0xAA, 0x55]);
    assert_eq!(
        session.bus_raw(DEV, &frame),
        Err(Error::Transport(TransportError::Timeout))
    );
}
