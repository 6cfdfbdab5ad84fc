use std::time::{Duration, Instant};

use gale::{param::WindParamsSnapshot, AudioStreamConfig, GaleCpalCtx, UpdateStatus};

const UPDATE_INTERVAL: Duration = Duration::from_millis(15);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);
/// How long each stage of the demo plays for.
const STAGE_DURATION: Duration = Duration::from_secs(20);

struct Stage {
    name: &'static str,
    wind_force: u32,
    gust_active: bool,
    squall_active: bool,
}

const STAGES: &[Stage] = &[
    Stage {
        name: "light breeze",
        wind_force: 2,
        gust_active: false,
        squall_active: false,
    },
    Stage {
        name: "fresh breeze with gusts",
        wind_force: 5,
        gust_active: true,
        squall_active: false,
    },
    Stage {
        name: "gale with squalls",
        wind_force: 8,
        gust_active: true,
        squall_active: true,
    },
    Stage {
        name: "storm",
        wind_force: 11,
        gust_active: true,
        squall_active: false,
    },
];

fn main() {
    simple_log::quick!("info");

    println!("Gale wind demo...");

    let mut cx = GaleCpalCtx::new(WindParamsSnapshot {
        gust_interval: 0.05,
        ..Default::default()
    });
    cx.activate(AudioStreamConfig::default(), Default::default())
        .unwrap();

    if let Some(spec) = cx.process_spec() {
        log::info!(
            "Rendering {} channels at {} Hz in blocks of {} frames",
            spec.channel_count(),
            spec.sample_rate(),
            spec.block_size()
        );
    }

    'stages: for stage in STAGES {
        log::info!("Stage: {}", stage.name);

        let params = cx.params();
        params.set_wind_force(stage.wind_force);
        params.set_gust_active(stage.gust_active);
        params.set_squall_active(stage.squall_active);

        let start = Instant::now();
        let mut last_report = start;
        while start.elapsed() < STAGE_DURATION {
            std::thread::sleep(UPDATE_INTERVAL);

            match cx.update() {
                UpdateStatus::Active => {}
                UpdateStatus::Inactive => break 'stages,
                UpdateStatus::Deactivated { error } => {
                    log::error!("Deactivated unexpectedly: {}", error);
                    break 'stages;
                }
            }

            if last_report.elapsed() >= REPORT_INTERVAL {
                last_report = Instant::now();

                if let Some(t) = cx.telemetry() {
                    log::info!(
                        "wind {:5.2} m/s | gust {:5.2} ({:?}, {:?}) | cutoff {:7.2} Hz | q {:.2}",
                        t.wind_speed,
                        t.gust_level,
                        t.gust_status,
                        t.episode_kind,
                        t.cutoff_hz,
                        t.resonance
                    );
                }
            }
        }
    }

    cx.deactivate();

    println!("finished");
}
