//! HAL — переключение контекста / context switch
//!
//! Планировщик не видит регистров и trap frame: для него запуск процесса —
//! блокирующий вызов, который возвращается, когда процесс отдал CPU.
//! The scheduler never sees registers or trap frames: running a process is
//! a blocking call that returns once the process gives the CPU back.

use crate::proc::Pid;
use crate::sched::Scheduler;

/// Один CPU с точки зрения планировщика.
/// One CPU as the scheduler sees it.
pub trait Cpu {
    /// Выполнять `pid`, пока он не уступит, не уснёт или не завершится.
    /// Процесс обращается к ядру через `sched`.
    ///
    /// Run `pid` until it yields, sleeps or exits. The process reaches the
    /// kernel through `sched`.
    fn switch_to(&mut self, sched: &Scheduler, pid: Pid);

    /// Запускать некого. Платформа с таймером ждёт прерывания и сообщает
    /// о каждом тике через `Scheduler::idle_tick`; без этого спящий держатель
    /// блокировки не расходует своё окно.
    ///
    /// Nothing to run. A platform with a timer waits for the interrupt and
    /// reports each tick through `Scheduler::idle_tick`; without that a sleeping
    /// lock holder does not use up its window.
    fn idle(&mut self, _sched: &Scheduler) {
        core::hint::spin_loop();
    }
}

/// Любое замыкание — CPU: удобно для тестов и симуляции.
/// Any closure is a CPU, handy for tests and simulation.
impl<F> Cpu for F
where
    F: FnMut(&Scheduler, Pid),
{
    fn switch_to(&mut self, sched: &Scheduler, pid: Pid) {
        self(sched, pid)
    }
}
