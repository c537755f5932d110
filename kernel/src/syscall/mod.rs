//! Syscall handler — вызовы планировщика и процессов
//!
//! Номера / Numbers (libmlfq::Sysno):
//!   1  fork()                     — создать ребёнка / create a child
//!   2  exit()                     — завершиться / exit
//!   3  wait()                     — забрать зомби / reap a zombie
//!   6  kill(pid)                  — пометить на завершение / mark for exit
//!   11 getpid()
//!   22 yield()                    — отдать CPU / give up the CPU
//!   23 getLevel()                 — уровень MLFQ / MLFQ level
//!   24 setPriority(pid, prio)     — приоритет 0..=3 / priority 0..=3
//!   25 schedulerLock(password)    — закрепиться / pin the caller
//!   26 schedulerUnlock(password)  — открепиться / unpin the caller
//!
//! Векторы / Vectors: 129 → schedulerLock, 130 → schedulerUnlock,
//! оба с паролем из конфигурации / both with the configured password.

use libmlfq::sysno::{EFAIL, ENOSYS, T_SCHED_LOCK, T_SCHED_UNLOCK};
use libmlfq::{Syscall, Sysno};

use crate::error::{KernelError, Result};
use crate::proc::Pid;
use crate::sched::Scheduler;

/// Выполнить syscall `number` от имени `pid`.
/// Run syscall `number` on behalf of `pid`.
pub fn syscall_handler(
    sched: &Scheduler,
    pid: Pid,
    number: usize,
    arg0: isize,
    arg1: isize,
) -> isize {
    let Some(nr) = Sysno::from_usize(number) else {
        log::warn!("pid {}: unknown syscall {}", pid, number);
        return ENOSYS;
    };

    match nr {
        Sysno::Fork   => ret(sched.fork(pid).map(|child| child.as_u32() as isize)),
        Sysno::Exit   => ret(sched.exit(pid).map(|()| 0)),
        Sysno::Wait   => ret(sched.wait(pid).map(|child| child.as_u32() as isize)),
        Sysno::Kill   => match arg_int(arg0) {
            Some(target) => ret(sched.kill(pid_arg(target)).map(|()| 0)),
            None         => EFAIL,
        },
        Sysno::GetPid => pid.as_u32() as isize,
        Sysno::Yield  => {
            let _ = sched.yield_now(pid);
            0
        }
        Sysno::GetLevel => ret(sched.get_level(pid).map(isize::from)),
        // Ответ 0 при любом исходе / 0 whatever the outcome
        Sysno::SetPriority => match (arg_int(arg0), arg_int(arg1)) {
            (Some(target), Some(priority)) => {
                let _ = sched.set_priority(pid_arg(target), priority);
                0
            }
            _ => EFAIL,
        },
        Sysno::SchedulerLock => match arg_int(arg0) {
            Some(password) => {
                let _ = sched.scheduler_lock(pid, password);
                0
            }
            None => EFAIL,
        },
        Sysno::SchedulerUnlock => match arg_int(arg0) {
            Some(password) => {
                let _ = sched.scheduler_unlock(pid, password);
                0
            }
            None => EFAIL,
        },
    }
}

/// Программное прерывание от `pid`. `false` — вектор не наш.
/// Software interrupt raised by `pid`. `false` means the vector is not ours.
pub fn interrupt_handler(sched: &Scheduler, pid: Pid, vector: u8) -> bool {
    let password = sched.config().password;
    match vector {
        T_SCHED_LOCK => {
            let _ = sched.scheduler_lock(pid, password);
            true
        }
        T_SCHED_UNLOCK => {
            let _ = sched.scheduler_unlock(pid, password);
            true
        }
        _ => false,
    }
}

fn ret(result: Result<isize>) -> isize {
    result.unwrap_or_else(KernelError::as_errno)
}

/// Аргумент syscall — int / Syscall arguments are ints
fn arg_int(arg: isize) -> Option<i32> {
    i32::try_from(arg).ok()
}

/// Отрицательный pid превращается в 0, который не принадлежит никому.
/// A negative pid becomes 0, which never names a live process.
fn pid_arg(pid: i32) -> Pid {
    Pid(u32::try_from(pid).unwrap_or(0))
}

/// Процесс, исполняющий userspace-код: шлюз `libmlfq::Syscall` к ядру.
/// A process running user code: its `libmlfq::Syscall` gate into the kernel.
pub struct UserContext<'a> {
    sched: &'a Scheduler,
    pid:   Pid,
}

impl<'a> UserContext<'a> {
    pub fn new(sched: &'a Scheduler, pid: Pid) -> Self {
        Self { sched, pid }
    }

    pub fn pid(&self) -> Pid { self.pid }

    /// `int $vector` из userspace / `int $vector` from userspace
    pub fn interrupt(&mut self, vector: u8) -> bool {
        interrupt_handler(self.sched, self.pid, vector)
    }
}

impl Syscall for UserContext<'_> {
    fn syscall(&mut self, nr: Sysno, arg0: isize, arg1: isize) -> isize {
        syscall_handler(self.sched, self.pid, nr.as_usize(), arg0, arg1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SchedConfig, DEFAULT_PASSWORD};
    use crate::proc::ProcState;
    use libmlfq::{sched as usched, task};

    fn booted() -> (Scheduler, Pid) {
        let sched = Scheduler::new(SchedConfig::default());
        let init = sched.spawn_init().unwrap();
        (sched, init)
    }

    #[test]
    fn unknown_number_is_enosys() {
        let (sched, init) = booted();
        assert_eq!(syscall_handler(&sched, init, 0, 0, 0), ENOSYS);
        assert_eq!(syscall_handler(&sched, init, 500, 0, 0), ENOSYS);
    }

    #[test]
    fn get_level_and_getpid_through_the_gate() {
        let (sched, init) = booted();
        let mut user = UserContext::new(&sched, init);
        assert_eq!(usched::get_level(&mut user), Ok(0));
        assert_eq!(task::getpid(&mut user), init.as_u32() as i32);
    }

    #[test]
    fn set_priority_answers_zero_even_when_rejected() {
        let (sched, init) = booted();
        let mut user = UserContext::new(&sched, init);
        assert_eq!(usched::set_priority(&mut user, init.as_u32() as i32, 7), Ok(()));
        assert_eq!(sched.proc(init).unwrap().priority, 3);
        assert_eq!(usched::set_priority(&mut user, -4, 1), Ok(()));
        assert_eq!(
            syscall_handler(&sched, init, Sysno::SetPriority.as_usize(), 1, isize::MAX),
            EFAIL
        );
    }

    #[test]
    fn lock_with_wrong_password_returns_zero_and_kills() {
        let (sched, init) = booted();
        let child = sched.fork(init).unwrap();
        let mut user = UserContext::new(&sched, child);
        assert_eq!(usched::scheduler_lock(&mut user, 1234), Ok(()));
        assert!(sched.proc(child).unwrap().is_killed());
        assert!(!sched.inspect(|st| st.mlfq.is_locked()));
    }

    #[test]
    fn interrupt_vectors_use_configured_password() {
        let (sched, init) = booted();
        let child = sched.fork(init).unwrap();
        let mut user = UserContext::new(&sched, child);

        assert!(user.interrupt(T_SCHED_LOCK));
        assert!(sched.proc(child).unwrap().is_locked());
        assert!(user.interrupt(T_SCHED_UNLOCK));
        let p = sched.proc(child).unwrap();
        assert!(!p.is_locked() && !p.is_killed());
        assert!(!user.interrupt(0x20));
        assert_eq!(sched.config().password, DEFAULT_PASSWORD);
    }

    #[test]
    fn fork_wait_exit_round() {
        let (sched, init) = booted();
        let mut parent = UserContext::new(&sched, init);
        let child = task::fork(&mut parent).unwrap();
        assert_eq!(task::wait(&mut parent), Err(libmlfq::Error::WouldBlock));
        assert_eq!(sched.proc(init).unwrap().state, ProcState::Sleeping);

        let mut kid = UserContext::new(&sched, Pid(child as u32));
        task::exit(&mut kid);
        assert_eq!(sched.proc(init).unwrap().state, ProcState::Runnable);
        assert_eq!(task::wait(&mut parent), Ok(child));
        assert_eq!(task::wait(&mut parent), Err(libmlfq::Error::Failed));
    }
}
