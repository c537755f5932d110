//! Конфигурация планировщика / Scheduler configuration
//!
//! Константы времени компиляции + `SchedConfig`, передаваемый при загрузке.
//! Compile-time constants + `SchedConfig` handed over at boot.

/// Размер таблицы процессов и ёмкость каждой очереди уровня.
/// Process-table size and capacity of every level queue.
pub const NPROC: usize = 64;

/// Число уровней MLFQ / Number of MLFQ levels
pub const MLFQ_LEVELS: usize = 3;

/// Нижний уровень — там работает приоритет.
/// Lowest level, the only one where priority matters.
pub const LOWEST_LEVEL: u8 = (MLFQ_LEVELS - 1) as u8;

/// Приоритет нового процесса и после boost / Priority of a new or boosted process
pub const MAX_PRIORITY: u8 = 3;

/// Тиков между priority boost / Ticks between priority boosts
pub const BOOST_INTERVAL: u32 = 100;

pub const DEFAULT_PASSWORD: i32 = 2019044711;

/// Квант уровня: 4, 6, 8 тиков / Level quantum: 4, 6, 8 ticks
pub const fn time_quantum(level: u8) -> u32 {
    2 * level as u32 + 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    /// Пароль schedulerLock/Unlock / schedulerLock/Unlock password
    pub password:       i32,
    /// Горизонт boost и принудительной разблокировки (тики)
    /// Boost and forced-unlock horizon, in ticks
    pub boost_interval: u32,
    pub log_level:      log::LevelFilter,
}

impl SchedConfig {
    pub const fn new() -> Self {
        Self {
            password:       DEFAULT_PASSWORD,
            boost_interval: BOOST_INTERVAL,
            log_level:      log::LevelFilter::Info,
        }
    }

    pub const fn with_password(mut self, password: i32) -> Self {
        self.password = password;
        self
    }
}

impl Default for SchedConfig {
    fn default() -> Self { Self::new() }
}
