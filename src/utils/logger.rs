use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

const DEFAULT_FILTER: &str = "warn,voice_onboard=info";

pub fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_FILTER);

    let mut builder = Builder::from_env(env);

    builder
        .filter_module("mio", LevelFilter::Error)
        .filter_module("tokio_util", LevelFilter::Error)
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("hyper_util", LevelFilter::Error)
        .filter_module("reqwest", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    // a second init (tests, embedding) keeps the first logger
    let _ = builder.try_init();
}
