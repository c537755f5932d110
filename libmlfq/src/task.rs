//! Task API — создание, завершение и ожидание процессов.
//! Task API: process creation, exit and reaping.

use crate::{check, Result, Syscall, Sysno};

/// Создать дочерний процесс; возвращает его pid.
/// Create a child process and return its pid.
pub fn fork<S: Syscall>(gate: &mut S) -> Result<i32> {
    check(gate.syscall(Sysno::Fork, 0, 0)).map(|pid| pid as i32)
}

/// Завершиться. Ядро больше не запустит вызывающего.
/// Exit. The kernel never runs the caller again.
pub fn exit<S: Syscall>(gate: &mut S) {
    gate.syscall(Sysno::Exit, 0, 0);
}

/// Забрать завершившегося ребёнка.
/// `Err(WouldBlock)` — вызывающий уснул, повторить после пробуждения.
///
/// Reap an exited child. `Err(WouldBlock)` means the caller was put to
/// sleep and should retry once woken.
pub fn wait<S: Syscall>(gate: &mut S) -> Result<i32> {
    check(gate.syscall(Sysno::Wait, 0, 0)).map(|pid| pid as i32)
}

pub fn kill<S: Syscall>(gate: &mut S, pid: i32) -> Result<()> {
    check(gate.syscall(Sysno::Kill, pid as isize, 0)).map(|_| ())
}

pub fn getpid<S: Syscall>(gate: &mut S) -> i32 {
    gate.syscall(Sysno::GetPid, 0, 0) as i32
}
