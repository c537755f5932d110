//! Scheduler — 3-уровневая MLFQ с блокировкой планировщика
//!
//! Multilevel Feedback Queue с закреплением процесса по паролю.
//! Multilevel Feedback Queue with password-gated process pinning.
//!
//! Очереди / Queues:
//!   0 → квант 4 тика / 4-tick quantum  (highest priority, round robin)
//!   1 → квант 6 тиков / 6-tick quantum (round robin)
//!   2 → квант 8 тиков / 8-tick quantum (minimum `priority` first)
//!
//! Каждые 100 тиков — priority boost: все снова на уровне 0.
//! Every 100 ticks a priority boost lifts everyone back to level 0.
//!
//! Всё состояние — под одной `spin::Mutex`.
//! All state lives under one `spin::Mutex`.

pub mod boost;
pub mod lock;
pub mod mlfq;
pub mod queue;

use spin::Mutex;

use crate::arch::Cpu;
use crate::config::{time_quantum, SchedConfig, LOWEST_LEVEL, MAX_PRIORITY};
use crate::error::{KernelError, Result};
use crate::proc::{Channel, Pid, Proc, ProcFlags, ProcState, ProcTable};

pub use lock::{LockOutcome, UnlockOutcome};
use mlfq::Mlfq;

/// Всё, что защищает глобальная блокировка: таблица процессов + MLFQ.
/// Everything the global lock protects: the process table and the MLFQ.
pub struct SchedState {
    pub procs: ProcTable,
    pub mlfq:  Mlfq,
}

/// Итог одной итерации цикла планировщика / Outcome of one scheduler iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Процесс отработал свой срез / The process ran a slice
    Ran(Pid),
    /// Закреплённый процесс оказался зомби, блокировка брошена
    /// The pinned process turned out to be a zombie; the lock was dropped
    Abandoned(Pid),
    /// Запускать некого / Nothing to run
    Idle,
}

enum Selection {
    Run(Pid),
    Abandoned(Pid),
    Idle,
}

impl SchedState {
    pub const fn new() -> Self {
        Self { procs: ProcTable::new(), mlfq: Mlfq::new() }
    }

    fn select(&mut self) -> Selection {
        if !self.mlfq.is_locked() {
            return match self.mlfq.find_runnable(&self.procs) {
                Some(pid) => Selection::Run(pid),
                None      => Selection::Idle,
            };
        }

        let Some(pid) = self.mlfq.rotate_to_pinned(&self.procs) else {
            log::error!("scheduler locked but no pinned process queued, releasing");
            self.release_lock();
            return Selection::Idle;
        };
        match self.procs.state_of(pid) {
            Some(ProcState::Zombie) => {
                log::info!("pinned pid {} exited, lock abandoned", pid);
                self.release_lock();
                Selection::Abandoned(pid)
            }
            Some(ProcState::Runnable) => Selection::Run(pid),
            // Спит или уже выполняется на другом CPU
            // Asleep, or already running on another CPU
            _ => Selection::Idle,
        }
    }

    /// Тик таймера на простаивающем CPU. Считается, только пока
    /// закреплённый процесс спит: окно блокировки идёт и без него.
    /// Timer tick on an idle CPU. Counted only while the pinned process
    /// sleeps, so the lock window keeps running without it.
    fn idle_tick(&mut self, boost_interval: u32) {
        if !self.mlfq.is_locked() {
            return;
        }
        let Some(pid) = self.procs.iter().find(|p| p.is_locked()).map(|p| p.pid) else {
            return;
        };
        if self.procs.state_of(pid) != Some(ProcState::Sleeping) {
            return;
        }
        self.mlfq.tick();
        if self.mlfq.global_ticks() >= boost_interval {
            log::info!("pid {} slept through the lock window, unlocking", pid);
            self.force_unlock(pid);
            self.mlfq.boost(&mut self.procs);
        }
    }

    /// Учёт после возврата из процесса: тики, boost, старение, round robin.
    /// Bookkeeping once the process hands the CPU back: ticks, boost, aging
    /// and round robin.
    fn finish_slice(&mut self, pid: Pid, level: u8, boost_interval: u32) {
        let Some(p) = self.procs.get(pid) else {
            // Уже забран родителем / Already reaped by its parent
            return;
        };
        if p.is_killed() && p.state != ProcState::Zombie {
            if let Err(err) = self.procs.exit(pid) {
                // init не умирает: снять флаг, иначе его больше не запустят
                // init never dies: drop the flag or it is never run again
                log::error!("pid {} ignores kill: {}", pid, err);
                if let Some(p) = self.procs.get_mut(pid) {
                    p.flags.remove(ProcFlags::KILLED);
                }
            }
        }
        let Some(p) = self.procs.get_mut(pid) else { return };
        if p.state == ProcState::Running {
            // Вытеснен таймером / Preempted by the timer
            p.state = ProcState::Runnable;
        }

        if p.state == ProcState::Runnable {
            p.time_quantum += 1;
            self.mlfq.tick();
        } else if p.is_locked() {
            self.mlfq.tick();
        }

        if self.mlfq.global_ticks() >= boost_interval {
            if p.is_locked() {
                log::info!("pid {} held the lock for {} ticks, unlocking", pid, boost_interval);
                self.force_unlock(pid);
            } else {
                if p.time_quantum >= time_quantum(level) {
                    age(p, level);
                    let to = p.level;
                    let _ = self.mlfq.requeue(pid, to);
                }
                // Держатель на другом CPU / Holder is on another CPU
                if let Some(holder) = self.release_lock() {
                    if let Err(err) = self.demote_to_head(holder) {
                        log::error!("forced unlock of pid {}: {}", holder, err);
                    }
                }
            }
            self.mlfq.boost(&mut self.procs);
        } else if !self.mlfq.is_locked() {
            if p.time_quantum >= time_quantum(level) {
                age(p, level);
            }
            // Round robin — всегда в хвост / Round robin, always to the rear
            let to = p.level;
            let _ = self.mlfq.requeue(pid, to);
        }
    }

    fn force_unlock(&mut self, pid: Pid) {
        self.release_lock();
        if let Err(err) = self.demote_to_head(pid) {
            log::error!("forced unlock of pid {}: {}", pid, err);
        }
    }
}

impl Default for SchedState {
    fn default() -> Self { Self::new() }
}

/// Квант исчерпан: уровни 0 и 1 — вниз на уровень, уровень 2 — минус
/// приоритет (не ниже 0).
/// Quantum used up: levels 0 and 1 drop a level, level 2 loses one
/// priority step, floored at 0.
fn age(p: &mut Proc, level: u8) {
    p.time_quantum = 0;
    if level < LOWEST_LEVEL {
        p.level = level + 1;
        log::trace!("pid {} demoted to L{}", p.pid, p.level);
    } else {
        p.priority = p.priority.saturating_sub(1);
        log::trace!("pid {} priority lowered to {}", p.pid, p.priority);
    }
}

/// Контекст планировщика: владелец всего состояния MLFQ.
/// Передаётся по ссылке во все операции, без глобальных переменных.
///
/// Scheduler context: owns all MLFQ state and is passed by reference into
/// every operation instead of living in globals.
pub struct Scheduler {
    state:  Mutex<SchedState>,
    config: SchedConfig,
}

impl Scheduler {
    pub const fn new(config: SchedConfig) -> Self {
        Self { state: Mutex::new(SchedState::new()), config }
    }

    pub fn config(&self) -> &SchedConfig { &self.config }

    /// Посмотреть на состояние под блокировкой / Look at the state under the lock
    pub fn inspect<R>(&self, f: impl FnOnce(&SchedState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Копия записи процесса / Copy of a process record
    pub fn proc(&self, pid: Pid) -> Option<Proc> {
        self.state.lock().procs.get(pid).copied()
    }

    // ── Таблица процессов / Process table ───────────────────────────────────

    /// Первый процесс — цель переподчинения сирот.
    /// The first process, which adopts orphans.
    pub fn spawn_init(&self) -> Result<Pid> {
        let mut st = self.state.lock();
        let SchedState { procs, mlfq } = &mut *st;
        let pid = procs.alloc(mlfq, None, "init")?;
        procs.set_init(pid);
        procs.make_runnable(pid)?;
        log::info!("init is pid {}", pid);
        Ok(pid)
    }

    pub fn fork(&self, parent: Pid) -> Result<Pid> {
        let mut st = self.state.lock();
        let SchedState { procs, mlfq } = &mut *st;
        procs.fork(mlfq, parent)
    }

    pub fn exit(&self, pid: Pid) -> Result<()> {
        self.state.lock().procs.exit(pid)
    }

    pub fn wait(&self, pid: Pid) -> Result<Pid> {
        let mut st = self.state.lock();
        let SchedState { procs, mlfq } = &mut *st;
        procs.wait(pid, mlfq)
    }

    pub fn kill(&self, pid: Pid) -> Result<()> {
        self.state.lock().procs.kill(pid)
    }

    pub fn sleep(&self, pid: Pid, chan: Channel) -> Result<()> {
        self.state.lock().procs.sleep(pid, chan)
    }

    pub fn wakeup(&self, chan: Channel) -> usize {
        self.state.lock().procs.wakeup(chan)
    }

    /// Отдать CPU на один раунд / Give up the CPU for one round
    pub fn yield_now(&self, pid: Pid) -> Result<()> {
        self.state.lock().procs.make_runnable(pid)
    }

    /// Тик таймера, пришедший, пока CPU простаивает (см. `Cpu::idle`).
    /// A timer tick that arrived while the CPU was idle (see `Cpu::idle`).
    pub fn idle_tick(&self) {
        self.state.lock().idle_tick(self.config.boost_interval);
    }

    pub fn procdump(&self) {
        self.state.lock().procs.dump();
    }

    // ── Lock Manager ────────────────────────────────────────────────────────

    pub fn scheduler_lock(&self, pid: Pid, password: i32) -> Result<LockOutcome> {
        self.state.lock().scheduler_lock(pid, password, self.config.password)
    }

    pub fn scheduler_unlock(&self, pid: Pid, password: i32) -> Result<UnlockOutcome> {
        self.state.lock().scheduler_unlock(pid, password, self.config.password)
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn get_level(&self, pid: Pid) -> Result<u8> {
        self.proc(pid).map(|p| p.level).ok_or(KernelError::NoSuchProcess(pid))
    }

    /// Приоритет вне 0..=3 отклоняется без изменений; неизвестный pid
    /// молча игнорируется.
    /// A priority outside 0..=3 is rejected with no change; an unknown pid
    /// is silently ignored.
    pub fn set_priority(&self, pid: Pid, priority: i32) -> Result<()> {
        let priority = match u8::try_from(priority) {
            Ok(p) if p <= MAX_PRIORITY => p,
            _ => {
                log::warn!("priority {} is not allowed in MLFQ", priority);
                return Err(KernelError::InvalidPriority(priority));
            }
        };
        if let Some(p) = self.state.lock().procs.get_mut(pid) {
            p.priority = priority;
        }
        Ok(())
    }

    // ── Цикл планировщика / Scheduler loop ──────────────────────────────────

    /// Одна итерация: выбрать, передать управление, учесть.
    /// One iteration: select, hand off, account.
    ///
    /// Блокировка отпускается на время передачи: процесс возвращается в ядро
    /// через те же операции `Scheduler` и сам захватывает её снова.
    /// The guard is released for the handoff: the process re-enters the
    /// kernel through the same `Scheduler` operations, which take it again.
    pub fn run_once<C: Cpu>(&self, cpu: &mut C) -> Step {
        let boost_interval = self.config.boost_interval;
        let (pid, level, killed) = {
            let mut st = self.state.lock();
            let pid = match st.select() {
                Selection::Run(pid)       => pid,
                Selection::Abandoned(pid) => return Step::Abandoned(pid),
                Selection::Idle           => return Step::Idle,
            };
            let Some(p) = st.procs.get_mut(pid) else { return Step::Idle };
            p.state = ProcState::Running;
            (pid, p.level, p.is_killed())
        };

        // Убитый процесс не возвращается в userspace / A killed process never
        // returns to userspace
        if !killed {
            cpu.switch_to(self, pid);
        }

        self.state.lock().finish_slice(pid, level, boost_interval);
        Step::Ran(pid)
    }

    /// Цикл CPU — никогда не возвращается / Per-CPU loop, never returns
    pub fn run<C: Cpu>(&self, cpu: &mut C) -> ! {
        loop {
            if self.run_once(cpu) == Step::Idle {
                cpu.idle(self);
            }
        }
    }
}
