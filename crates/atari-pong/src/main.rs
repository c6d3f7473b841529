use atari_engine::device::GpuInit;
use atari_engine::logging::{LoggingConfig, init_logging};
use atari_engine::window::{ExitStatus, Runtime};

use atari_pong::{PongConfig, PongGame};

fn main() {
    init_logging(LoggingConfig::default());
    log::info!("Hello, Atari!");

    let config = PongConfig::default();
    let runtime = config.runtime.clone();

    let status = match Runtime::run(runtime, GpuInit::default(), PongGame::new(config)) {
        Ok(status) => status,
        Err(e) => {
            log::error!("{e:#}");
            ExitStatus::EnvironmentFailure
        }
    };

    // Every window and GPU resource is dropped by now.
    std::process::exit(status.code());
}
