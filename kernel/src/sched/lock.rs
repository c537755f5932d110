//! Lock Manager — schedulerLock / schedulerUnlock по паролю.
//! Lock Manager: password-gated schedulerLock / schedulerUnlock.
//!
//! Нарушение протокола — не ошибка, а смерть вызывающего.
//! A protocol violation is not an error: the caller is killed.

use crate::error::{KernelError, Result};
use crate::proc::{Pid, Proc, ProcFlags};

use super::mlfq::Mlfq;
use super::SchedState;

/// Итог schedulerLock / Result of schedulerLock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired,
    /// Блокировка уже занята — вызывающий убит / Already held, caller killed
    AlreadyLocked,
    /// Неверный пароль — вызывающий убит / Wrong password, caller killed
    BadPassword,
}

/// Итог schedulerUnlock / Result of schedulerUnlock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Released,
    /// Нечего снимать — вызывающий жив / Nothing to release, caller survives
    NotLocked,
    /// Блокировка снята, вызывающий убит / Lock released, caller killed
    BadPassword,
}

impl Mlfq {
    pub(crate) fn pin(&mut self, proc: &mut Proc) {
        self.set_locked(true);
        self.queue_mut(proc.level).set_locked(true);
        proc.flags.insert(ProcFlags::LOCKED);
    }

    pub(crate) fn unpin(&mut self, proc: &mut Proc) {
        proc.flags.remove(ProcFlags::LOCKED);
        self.clear_lock();
    }

    /// Сбросить все флаги блокировки MLFQ / Clear every MLFQ lock flag
    pub(crate) fn clear_lock(&mut self) {
        self.set_locked(false);
        for level in 0..crate::config::MLFQ_LEVELS as u8 {
            self.queue_mut(level).set_locked(false);
        }
    }
}

impl SchedState {
    pub(crate) fn scheduler_lock(&mut self, caller: Pid, password: i32, expected: i32) -> Result<LockOutcome> {
        let proc = self.procs.get(caller).ok_or(KernelError::NoSuchProcess(caller))?;

        if self.mlfq.is_locked() {
            log::warn!("duplicate lock by pid {}", caller);
            self.procs.kill(caller)?;
            return Ok(LockOutcome::AlreadyLocked);
        }
        if password != expected {
            log::warn!(
                "bad lock password: pid {} quantum {} level {}",
                caller, proc.time_quantum, proc.level
            );
            self.procs.kill(caller)?;
            return Ok(LockOutcome::BadPassword);
        }

        // Свежее окно в 100 тиков / A fresh 100-tick window
        self.mlfq.reset_ticks();
        if let Some(proc) = self.procs.get_mut(caller) {
            self.mlfq.pin(proc);
        }
        log::debug!("pid {} locked the scheduler", caller);
        Ok(LockOutcome::Acquired)
    }

    pub(crate) fn scheduler_unlock(&mut self, caller: Pid, password: i32, expected: i32) -> Result<UnlockOutcome> {
        let proc = self.procs.get(caller).ok_or(KernelError::NoSuchProcess(caller))?;

        if !self.mlfq.is_locked() {
            log::warn!("duplicate unlock by pid {}", caller);
            return Ok(UnlockOutcome::NotLocked);
        }
        if password != expected {
            log::warn!(
                "bad unlock password: pid {} quantum {} level {}",
                caller, proc.time_quantum, proc.level
            );
            self.release_lock();
            self.procs.kill(caller)?;
            return Ok(UnlockOutcome::BadPassword);
        }

        self.release_lock();
        self.demote_to_head(caller)?;
        log::debug!("pid {} unlocked the scheduler", caller);
        Ok(UnlockOutcome::Released)
    }

    /// Снять блокировку с того, кто её держит. Возвращает его pid.
    /// Release the lock from whoever holds it and return that pid.
    pub(crate) fn release_lock(&mut self) -> Option<Pid> {
        let holder = self.procs.iter().find(|p| p.is_locked()).map(|p| p.pid);
        match holder.and_then(|pid| self.procs.get_mut(pid)) {
            Some(proc) => self.mlfq.unpin(proc),
            None       => self.mlfq.clear_lock(),
        }
        holder
    }

    /// Уровень 0, приоритет 3, квант 0 — и в голову уровня 0.
    /// Level 0, priority 3, quantum 0, and back to the head of level 0.
    pub(crate) fn demote_to_head(&mut self, pid: Pid) -> Result<()> {
        let proc = self.procs.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        proc.reset_aging();
        if let Some(level) = self.mlfq.level_of(pid) {
            self.mlfq.queue_mut(level).remove(pid);
        }
        self.mlfq.queue_mut(0).push_front(pid)
    }
}
