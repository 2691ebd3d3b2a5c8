//! Command execution: desk assembly, move runs, the watch loop, self-check.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;

use desk_ble::SimulatedDesk;
use desk_ble::idle::AlwaysActive;
use desk_ble::wall::SystemWallClock;
use desk_config::Config;
use desk_core::autostand::{AutoStand, run_autostand};
use desk_core::{DeskPosition, DeskRemote, Height, MoveOutcome, MoveStatus, SwitchDirection};
use desk_traits::clock::{Clock, MonotonicClock, WallClock};
use desk_traits::{MoveSink, PositionSource};
use eyre::WrapErr;

/// Starting raw offset for the simulated desk, ~79.3 cm.
const SIM_START_RAW: u16 = 1778;

type DeskHalves = (
    Box<dyn PositionSource + Send>,
    Box<dyn MoveSink + Send>,
    Option<Height>,
);

#[cfg(feature = "ble")]
fn connect_desk(cfg: &Config) -> eyre::Result<DeskHalves> {
    use desk_ble::ble::{BleDesk, BleOptions};
    use std::time::Duration;

    let opts = BleOptions {
        name_pattern: cfg.ble.name_pattern.clone(),
        scan_timeout: Duration::from_secs(cfg.ble.scan_timeout_s),
        connect_timeout: Duration::from_secs(cfg.ble.connect_timeout_s),
        write_timeout: Duration::from_secs(cfg.ble.write_timeout_s),
        read_timeout: Duration::from_secs(cfg.ble.read_timeout_s),
    };
    let desk = BleDesk::connect(&opts).wrap_err("connecting to desk over BLE")?;
    let starting = desk
        .read_position()
        .ok()
        .and_then(|payload| DeskPosition::decode(&payload).ok())
        .map(|p| p.height());
    let (source, sink) = desk.split();
    Ok((Box::new(source), Box::new(sink), starting))
}

#[cfg(not(feature = "ble"))]
fn connect_desk(cfg: &Config) -> eyre::Result<DeskHalves> {
    let _ = cfg;
    tracing::info!("built without the `ble` feature; using the simulated desk");
    Ok(sim_desk())
}

fn sim_desk() -> DeskHalves {
    let (source, sink) = SimulatedDesk::new(SIM_START_RAW);
    let starting = DeskPosition::new(SIM_START_RAW, 0).height();
    (Box::new(source), Box::new(sink), Some(starting))
}

/// Ctrl-C while the desk may be in motion: halt it, then exit.
fn stop_on_interrupt(remote: &Arc<DeskRemote>) -> eyre::Result<()> {
    let remote = remote.clone();
    ctrlc::set_handler(move || {
        let _ = remote.stop_moving();
        std::process::exit(130);
    })
    .wrap_err("installing interrupt handler")
}

fn report_outcome(outcome: &MoveOutcome, json: bool) {
    if json {
        let payload = serde_json::json!({
            "ok": true,
            "status": format!("{:?}", outcome.status),
            "commands": outcome.commands_issued,
            "final_height_in": outcome.final_height.as_inches(),
            "final_height_cm": outcome.final_height.as_cm(),
        });
        println!("{payload}");
    } else {
        println!(
            "{:?} after {} command(s); height {:.2} in ({:.1} cm)",
            outcome.status,
            outcome.commands_issued,
            outcome.final_height.as_inches(),
            outcome.final_height.as_cm(),
        );
    }
}

pub fn run_move(cfg: &Config, target: Height, json: bool) -> eyre::Result<()> {
    let (source, sink, starting) = connect_desk(cfg)?;

    let mut builder = DeskRemote::builder()
        .with_source(source)
        .with_sink(sink)
        .with_move_cfg((&cfg.control).into())
        .with_timeouts((&cfg.timeouts).into());
    if let Some(height) = starting {
        builder = builder.with_starting_height(height);
    }
    let remote = Arc::new(builder.build()?);
    stop_on_interrupt(&remote)?;

    tracing::info!(target_in = target.as_inches(), "move requested");
    let outcome = remote.move_to(target)?;
    report_outcome(&outcome, json);

    if outcome.status == MoveStatus::Abandoned {
        tracing::warn!("desk disconnected before the move completed");
    }
    Ok(())
}

pub fn run_watch(cfg: &Config) -> eyre::Result<()> {
    let (source, sink, starting) = connect_desk(cfg)?;
    let (tap_tx, tap_rx) = mpsc::channel::<SwitchDirection>();

    let mut builder = DeskRemote::builder()
        .with_source(source)
        .with_sink(sink)
        .with_move_cfg((&cfg.control).into())
        .with_double_tap_cfg((&cfg.double_tap).into())
        .with_timeouts((&cfg.timeouts).into())
        .on_height_changed(|height| {
            println!("height: {:.2} in ({:.1} cm)", height.as_inches(), height.as_cm());
        })
        .on_move_complete(|status| {
            tracing::info!(?status, "move finished");
        });
    if cfg.double_tap.enabled {
        builder = builder.on_double_tap(move |direction| {
            let _ = tap_tx.send(direction);
        });
    }
    if let Some(height) = starting {
        builder = builder.with_starting_height(height);
    }
    let remote = Arc::new(builder.build()?);
    stop_on_interrupt(&remote)?;

    let standing = Height::from_inches(cfg.desk.standing_height_in);
    let sitting = Height::from_inches(cfg.desk.sitting_height_in);

    // Double taps of the physical switch jump to the configured presets.
    {
        let remote = remote.clone();
        std::thread::spawn(move || {
            while let Ok(direction) = tap_rx.recv() {
                let target = match direction {
                    SwitchDirection::Up => standing,
                    SwitchDirection::Down => sitting,
                };
                println!("double tap: moving to {:.2} in", target.as_inches());
                if let Err(e) = remote.move_to(target) {
                    tracing::warn!(error = %e, "double-tap move failed");
                }
            }
        });
    }

    let autostand_cfg: desk_core::AutoStandCfg = (&cfg.autostand).into();
    let stand_action = spawn_move_action(&remote, standing, "stand");
    let sit_action = spawn_move_action(&remote, sitting, "sit");
    // Input-idle telemetry is the host's business; headless watch treats the
    // user as present.
    let auto = AutoStand::new(
        move || autostand_cfg.clone(),
        AlwaysActive,
        stand_action,
        sit_action,
    );

    let wall: Arc<dyn WallClock + Send + Sync> = Arc::new(SystemWallClock::new());
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    if let Some(span) = auto.next_span(wall.now()) {
        println!(
            "next automatic stand: {}-{}, if activity within {} minutes",
            span.stand, span.sit, cfg.autostand.inactivity_timeout_min
        );
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    run_autostand(&auto, &clock, &wall, &shutdown);
    Ok(())
}

/// Scheduled actions must not block the tick thread for a whole move.
fn spawn_move_action(
    remote: &Arc<DeskRemote>,
    target: Height,
    label: &'static str,
) -> impl Fn() + Send + Sync + 'static {
    let remote = remote.clone();
    move || {
        let remote = remote.clone();
        std::thread::spawn(move || {
            tracing::info!(label, target_in = target.as_inches(), "scheduled move");
            if let Err(e) = remote.move_to(target) {
                tracing::warn!(error = %e, label, "scheduled move failed");
            }
        });
    }
}

pub fn run_self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let (source, sink, starting) = sim_desk();
    let start = starting.ok_or_else(|| eyre::eyre!("simulated desk reported no height"))?;

    let remote = DeskRemote::builder()
        .with_source(source)
        .with_sink(sink)
        .with_move_cfg((&cfg.control).into())
        .with_timeouts((&cfg.timeouts).into())
        .with_starting_height(start)
        .build()?;

    let target = Height::from_cm(start.as_cm() + 5.0 * desk_core::protocol::CENTIMETERS_PER_INCH);
    let outcome = remote.move_to(target)?;

    // One simulated nudge travels 2.54 cm, so landing anywhere within a
    // nudge of the target is a pass.
    let within_tolerance = (outcome.final_height.as_cm() - target.as_cm()).abs() <= 2.6;
    let ok =
        outcome.status == MoveStatus::Arrived && outcome.commands_issued >= 2 && within_tolerance;

    if json {
        let payload = serde_json::json!({
            "ok": ok,
            "status": format!("{:?}", outcome.status),
            "commands": outcome.commands_issued,
            "start_in": start.as_inches(),
            "target_in": target.as_inches(),
            "final_height_in": outcome.final_height.as_inches(),
        });
        println!("{payload}");
    } else if ok {
        println!(
            "self-check ok: {} command(s), {:.2} in -> {:.2} in",
            outcome.commands_issued,
            start.as_inches(),
            outcome.final_height.as_inches(),
        );
    }

    if !ok {
        eyre::bail!(
            "self-check failed: {:?} after {} command(s), final height {:.2} in",
            outcome.status,
            outcome.commands_issued,
            outcome.final_height.as_inches(),
        );
    }
    Ok(())
}
