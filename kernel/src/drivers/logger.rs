//! `log` backend — строки вида `[LEVEL] target: message` в консоль ядра.
//! `log` backend: `[LEVEL] target: message` lines on the kernel console.

use log::{LevelFilter, Log, Metadata, Record};

pub struct KernelLogger;

static LOGGER: KernelLogger = KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            crate::kprintln!("[{:<5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Установить логгер. Повторный вызов меняет только уровень.
/// Install the logger. Calling again only changes the level.
pub fn init(filter: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        crate::kprintln!("[log] kernel logger installed");
    }
    log::set_max_level(filter);
}
