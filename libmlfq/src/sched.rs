//! Scheduler API — MLFQ уровни, приоритеты и блокировка планировщика.
//! Scheduler API: MLFQ levels, priorities and the scheduler lock.

use crate::{check, Result, Syscall, Sysno};

/// Отдать CPU / Give up the CPU for one scheduling round.
pub fn yield_now<S: Syscall>(gate: &mut S) {
    gate.syscall(Sysno::Yield, 0, 0);
}

/// Текущий уровень MLFQ вызывающего (0 — высший).
/// Caller's current MLFQ level (0 is highest).
pub fn get_level<S: Syscall>(gate: &mut S) -> Result<u8> {
    check(gate.syscall(Sysno::GetLevel, 0, 0)).map(|level| level as u8)
}

/// Задать приоритет процесса `pid` (0..=3). Недопустимое значение ядро
/// отклоняет молча — ответ всё равно 0.
///
/// Set the priority of `pid`. The kernel rejects out-of-range values with a
/// diagnostic but still answers 0.
pub fn set_priority<S: Syscall>(gate: &mut S, pid: i32, priority: i32) -> Result<()> {
    check(gate.syscall(Sysno::SetPriority, pid as isize, priority as isize)).map(|_| ())
}

/// Закрепить себя на CPU. Неверный пароль или повторная блокировка
/// завершают вызывающего.
///
/// Pin the caller to the CPU. A wrong password or a duplicate lock
/// terminates the caller.
pub fn scheduler_lock<S: Syscall>(gate: &mut S, password: i32) -> Result<()> {
    check(gate.syscall(Sysno::SchedulerLock, password as isize, 0)).map(|_| ())
}

/// Снять блокировку и вернуться в голову уровня 0.
/// Release the lock and return to the head of level 0.
pub fn scheduler_unlock<S: Syscall>(gate: &mut S, password: i32) -> Result<()> {
    check(gate.syscall(Sysno::SchedulerUnlock, password as isize, 0)).map(|_| ())
}
