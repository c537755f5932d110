//! MlfqOS Kernel — ядро планировщика / scheduler core
//!
//! 3-уровневая MLFQ с блокировкой планировщика по паролю и периодическим
//! priority boost.
//! A 3-level MLFQ with a password-gated scheduler lock and a periodic
//! priority boost.
//!
//! Порядок загрузки / Boot order:
//!   1. logger  — `log` поверх консоли / `log` on top of the console
//!   2. sched   — таблица процессов + MLFQ / process table + MLFQ
//!   3. init    — первый процесс / first process
//!
//! После этого каждый CPU вызывает `Scheduler::run`.
//! Each CPU then calls `Scheduler::run`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arch;
pub mod config;
pub mod drivers;
pub mod error;
pub mod proc;
pub mod sched;
pub mod syscall;

pub use arch::Cpu;
pub use config::SchedConfig;
pub use error::{KernelError, Result};
pub use proc::{Channel, Pid, ProcState};
pub use sched::{LockOutcome, Scheduler, Step, UnlockOutcome};

/// Поднять планировщик и первый процесс.
/// Bring up the scheduler and the first process.
pub fn boot(config: SchedConfig) -> Result<Scheduler> {
    drivers::logger::init(config.log_level);
    kprintln!("MlfqOS booting...");

    kprintln!(
        "[sched] Initializing scheduler (MLFQ, {} levels, boost every {} ticks)...",
        config::MLFQ_LEVELS, config.boost_interval
    );
    let sched = Scheduler::new(config);

    let init = sched.spawn_init()?;
    kprintln!("[sched] OK: init is pid {}", init);
    Ok(sched)
}
