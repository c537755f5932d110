//! Processes — запись процесса и таблица процессов.
//! Processes: the process record and the process table.
//!
//! Таблица владеет записями; очереди MLFQ хранят только `Pid`.
//! The table owns the records; MLFQ queues only hold `Pid`s.
//!
//! Все методы вызываются под глобальной блокировкой планировщика.
//! Every method runs under the scheduler's global lock.

use core::fmt;

use bitflags::bitflags;

use crate::config::{MAX_PRIORITY, NPROC};
use crate::error::{KernelError, Result};
use crate::sched::mlfq::Mlfq;

/// Идентификатор процесса / Process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl Pid {
    pub const fn as_u32(self) -> u32 { self.0 }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Unused,
    Embryo,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

impl ProcState {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcState::Unused   => "unused",
            ProcState::Embryo   => "embryo",
            ProcState::Sleeping => "sleep ",
            ProcState::Runnable => "runble",
            ProcState::Running  => "run   ",
            ProcState::Zombie   => "zombie",
        }
    }
}

bitflags! {
    /// Флаги процесса / Process flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcFlags: u8 {
        /// Должен завершиться в ближайшей безопасной точке
        /// Must exit at the next safe point
        const KILLED = 1 << 0;
        /// Держит блокировку планировщика / Holds the scheduler lock
        const LOCKED = 1 << 1;
    }
}

/// Канал сна / Sleep channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Родитель ждёт детей в wait() / Parent waiting for children in wait()
    Wait(Pid),
    /// Произвольный объект ядра / Any other kernel object
    Object(usize),
}

const NAME_LEN: usize = 16;

/// Запись процесса / Process record
#[derive(Debug, Clone, Copy)]
pub struct Proc {
    pub pid:          Pid,
    pub state:        ProcState,
    /// Уровень MLFQ, 0 — высший / MLFQ level, 0 is highest
    pub level:        u8,
    /// Порядок внутри уровня 2 / Ordering inside level 2
    pub priority:     u8,
    /// Тики на текущем уровне / Ticks used at the current level
    pub time_quantum: u32,
    pub flags:        ProcFlags,
    pub parent:       Option<Pid>,
    pub chan:         Option<Channel>,
    name:             [u8; NAME_LEN],
}

impl Proc {
    const UNUSED: Proc = Proc {
        pid:          Pid(0),
        state:        ProcState::Unused,
        level:        0,
        priority:     MAX_PRIORITY,
        time_quantum: 0,
        flags:        ProcFlags::empty(),
        parent:       None,
        chan:         None,
        name:         [0; NAME_LEN],
    };

    pub fn is_locked(&self) -> bool { self.flags.contains(ProcFlags::LOCKED) }
    pub fn is_killed(&self) -> bool { self.flags.contains(ProcFlags::KILLED) }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("?")
    }

    fn set_name(&mut self, name: &str) {
        // Режем по границе символа / Cut on a char boundary
        let mut len = name.len().min(NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.name = [0; NAME_LEN];
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
    }

    /// Вершина уровня 0, полный приоритет, нулевой квант.
    /// Top of level 0, full priority, empty quantum.
    pub(crate) fn reset_aging(&mut self) {
        self.level        = 0;
        self.priority     = MAX_PRIORITY;
        self.time_quantum = 0;
    }
}

pub struct ProcTable {
    slots:    [Proc; NPROC],
    next_pid: u32,
    init:     Option<Pid>,
}

impl ProcTable {
    pub const fn new() -> Self {
        Self { slots: [Proc::UNUSED; NPROC], next_pid: 1, init: None }
    }

    pub fn get(&self, pid: Pid) -> Option<&Proc> {
        self.slots.iter().find(|p| p.state != ProcState::Unused && p.pid == pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Proc> {
        self.slots.iter_mut().find(|p| p.state != ProcState::Unused && p.pid == pid)
    }

    /// Все занятые слоты / Every allocated slot
    pub fn iter(&self) -> impl Iterator<Item = &Proc> {
        self.slots.iter().filter(|p| p.state != ProcState::Unused)
    }

    pub fn state_of(&self, pid: Pid) -> Option<ProcState> {
        self.get(pid).map(|p| p.state)
    }

    pub fn init(&self) -> Option<Pid> { self.init }

    pub(crate) fn set_init(&mut self, pid: Pid) { self.init = Some(pid); }

    /// Найти свободный слот, перевести в Embryo и поставить в хвост уровня 0.
    /// Ошибка очереди возвращается как отказ в создании процесса.
    ///
    /// Claim an unused slot as Embryo and append it to level 0. A queue
    /// failure is reported as a process-creation failure.
    pub fn alloc(&mut self, mlfq: &mut Mlfq, parent: Option<Pid>, name: &str) -> Result<Pid> {
        let idx = self.slots
            .iter()
            .position(|p| p.state == ProcState::Unused)
            .ok_or(KernelError::NoFreeSlot)?;

        let pid = Pid(self.next_pid);
        let Some(next_pid) = self.next_pid.checked_add(1) else {
            log::error!("pid space exhausted");
            return Err(KernelError::NoFreeSlot);
        };
        mlfq.enqueue(pid, 0)?;
        self.next_pid = next_pid;

        let slot = &mut self.slots[idx];
        *slot = Proc::UNUSED;
        slot.pid    = pid;
        slot.state  = ProcState::Embryo;
        slot.parent = parent;
        slot.set_name(name);
        Ok(pid)
    }

    /// Ребёнок наследует имя родителя и сразу готов к запуску.
    /// The child inherits the parent's name and is immediately runnable.
    pub fn fork(&mut self, mlfq: &mut Mlfq, parent: Pid) -> Result<Pid> {
        let name = self.get(parent).ok_or(KernelError::NoSuchProcess(parent))?.name;
        let pid = self.alloc(mlfq, Some(parent), "")?;
        if let Some(child) = self.get_mut(pid) {
            child.name  = name;
            child.state = ProcState::Runnable;
        }
        Ok(pid)
    }

    pub fn make_runnable(&mut self, pid: Pid) -> Result<()> {
        let p = self.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        p.state = ProcState::Runnable;
        Ok(())
    }

    /// Пометить на завершение; спящего — разбудить.
    /// Завершение произойдёт в следующей безопасной точке.
    ///
    /// Mark for termination and wake it if sleeping. The process exits at
    /// its next safe point.
    pub fn kill(&mut self, pid: Pid) -> Result<()> {
        let p = self.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        p.flags.insert(ProcFlags::KILLED);
        if p.state == ProcState::Sleeping {
            p.state = ProcState::Runnable;
        }
        Ok(())
    }

    /// Уснуть на канале. Процесс остаётся в своей очереди MLFQ.
    /// Sleep on a channel. The process keeps its MLFQ queue slot.
    pub fn sleep(&mut self, pid: Pid, chan: Channel) -> Result<()> {
        let p = self.get_mut(pid).ok_or(KernelError::NoSuchProcess(pid))?;
        p.chan  = Some(chan);
        p.state = ProcState::Sleeping;
        Ok(())
    }

    /// Разбудить всех спящих на канале; возвращает их число.
    /// Wake every sleeper on the channel and return how many woke.
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let mut woken = 0;
        for p in self.slots.iter_mut() {
            if p.state == ProcState::Sleeping && p.chan == Some(chan) {
                p.state = ProcState::Runnable;
                p.chan  = None;
                woken += 1;
            }
        }
        woken
    }

    /// Стать зомби: разбудить родителя, отдать детей init.
    /// Запись остаётся в очереди до wait().
    ///
    /// Become a zombie: wake the parent, hand children to init. The record
    /// stays queued until it is reaped by wait().
    pub fn exit(&mut self, pid: Pid) -> Result<()> {
        if self.init == Some(pid) {
            log::error!("init exiting");
            return Err(KernelError::InitExiting);
        }
        let parent = self.get(pid).ok_or(KernelError::NoSuchProcess(pid))?.parent;
        if let Some(parent) = parent {
            self.wakeup(Channel::Wait(parent));
        }

        let init = self.init;
        let mut wake_init = false;
        for p in self.slots.iter_mut() {
            if p.state != ProcState::Unused && p.parent == Some(pid) {
                p.parent = init;
                wake_init |= p.state == ProcState::Zombie;
            }
        }
        if let (true, Some(init)) = (wake_init, init) {
            self.wakeup(Channel::Wait(init));
        }

        if let Some(p) = self.get_mut(pid) {
            p.state = ProcState::Zombie;
            p.chan  = None;
        }
        Ok(())
    }

    /// Забрать одного зомби-ребёнка: убрать из очереди MLFQ, освободить слот.
    /// Если дети есть, но все живы — уснуть и вернуть `WouldBlock`.
    ///
    /// Reap one zombie child: pull it out of its MLFQ queue and free the
    /// slot. With only live children the caller sleeps and gets `WouldBlock`.
    pub fn wait(&mut self, parent: Pid, mlfq: &mut Mlfq) -> Result<Pid> {
        let mut have_kids = false;
        for p in self.slots.iter_mut() {
            if p.state == ProcState::Unused || p.parent != Some(parent) {
                continue;
            }
            have_kids = true;
            if p.state == ProcState::Zombie {
                let pid = p.pid;
                mlfq.remove_zombie(p);
                *p = Proc::UNUSED;
                return Ok(pid);
            }
        }

        let caller = self.get(parent).ok_or(KernelError::NoSuchProcess(parent))?;
        if !have_kids || caller.is_killed() {
            return Err(KernelError::NoChildren);
        }
        self.sleep(parent, Channel::Wait(parent))?;
        Err(KernelError::WouldBlock)
    }

    /// Список процессов в лог (^P) / Process listing to the log (^P)
    pub fn dump(&self) {
        for p in self.iter() {
            log::info!(
                "{} {} {} L{} P{} Q{}{}",
                p.pid, p.state.as_str(), p.name(),
                p.level, p.priority, p.time_quantum,
                if p.is_locked() { " [locked]" } else { "" },
            );
        }
    }
}

impl Default for ProcTable {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(names: &[&str]) -> (ProcTable, Mlfq, [Pid; 4]) {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let mut pids = [Pid(0); 4];
        for (i, name) in names.iter().enumerate() {
            pids[i] = table.alloc(&mut mlfq, None, name).unwrap();
            table.make_runnable(pids[i]).unwrap();
        }
        (table, mlfq, pids)
    }

    #[test]
    fn alloc_starts_at_top_of_mlfq() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let pid = table.alloc(&mut mlfq, None, "init").unwrap();
        let p = table.get(pid).unwrap();
        assert_eq!(p.state, ProcState::Embryo);
        assert_eq!((p.level, p.priority, p.time_quantum), (0, 3, 0));
        assert!(!p.is_locked());
        assert_eq!(p.name(), "init");
        assert_eq!(mlfq.queue(0).front(), Some(pid));
    }

    #[test]
    fn alloc_fails_when_table_is_full() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        for _ in 0..NPROC {
            table.alloc(&mut mlfq, None, "p").unwrap();
        }
        assert_eq!(table.alloc(&mut mlfq, None, "p"), Err(KernelError::NoFreeSlot));
        assert_eq!(mlfq.queue(0).len(), NPROC);
    }

    #[test]
    fn long_names_are_truncated() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let pid = table.alloc(&mut mlfq, None, "a-very-long-process-name").unwrap();
        assert_eq!(table.get(pid).unwrap().name(), "a-very-long-proc");
    }

    #[test]
    fn kill_wakes_a_sleeper() {
        let (mut table, _mlfq, [a, ..]) = table_with(&["a"]);
        table.sleep(a, Channel::Object(7)).unwrap();
        table.kill(a).unwrap();
        let p = table.get(a).unwrap();
        assert!(p.is_killed());
        assert_eq!(p.state, ProcState::Runnable);
        assert_eq!(table.kill(Pid(99)), Err(KernelError::NoSuchProcess(Pid(99))));
    }

    #[test]
    fn wakeup_only_touches_matching_channel() {
        let (mut table, _mlfq, [a, b, ..]) = table_with(&["a", "b"]);
        table.sleep(a, Channel::Object(1)).unwrap();
        table.sleep(b, Channel::Object(2)).unwrap();
        assert_eq!(table.wakeup(Channel::Object(1)), 1);
        assert_eq!(table.state_of(a), Some(ProcState::Runnable));
        assert_eq!(table.state_of(b), Some(ProcState::Sleeping));
    }

    #[test]
    fn exit_wakes_parent_and_reparents_children() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let init = table.alloc(&mut mlfq, None, "init").unwrap();
        table.set_init(init);
        let parent = table.alloc(&mut mlfq, Some(init), "parent").unwrap();
        let child = table.alloc(&mut mlfq, Some(parent), "child").unwrap();
        table.sleep(init, Channel::Wait(init)).unwrap();

        table.exit(parent).unwrap();
        assert_eq!(table.state_of(parent), Some(ProcState::Zombie));
        assert_eq!(table.get(child).unwrap().parent, Some(init));
        assert_eq!(table.state_of(init), Some(ProcState::Runnable));
        // Зомби остаётся в очереди до wait()
        assert!(mlfq.queue(0).contains(parent));
    }

    #[test]
    fn init_may_not_exit() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let init = table.alloc(&mut mlfq, None, "init").unwrap();
        table.set_init(init);
        assert_eq!(table.exit(init), Err(KernelError::InitExiting));
        assert_eq!(table.state_of(init), Some(ProcState::Embryo));
    }

    #[test]
    fn wait_reaps_zombie_and_frees_its_queue_slot() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let parent = table.alloc(&mut mlfq, None, "parent").unwrap();
        let child = table.alloc(&mut mlfq, Some(parent), "child").unwrap();
        table.exit(child).unwrap();

        assert_eq!(table.wait(parent, &mut mlfq), Ok(child));
        assert!(table.get(child).is_none());
        assert!(!mlfq.queue(0).contains(child));
        assert_eq!(mlfq.queue(0).len(), 1);
    }

    #[test]
    fn wait_blocks_while_children_live() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let parent = table.alloc(&mut mlfq, None, "parent").unwrap();
        assert_eq!(table.wait(parent, &mut mlfq), Err(KernelError::NoChildren));

        table.alloc(&mut mlfq, Some(parent), "child").unwrap();
        assert_eq!(table.wait(parent, &mut mlfq), Err(KernelError::WouldBlock));
        let p = table.get(parent).unwrap();
        assert_eq!(p.state, ProcState::Sleeping);
        assert_eq!(p.chan, Some(Channel::Wait(parent)));
    }

    #[test]
    fn alloc_fails_cleanly_when_pids_run_out() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        table.next_pid = u32::MAX - 1;
        let last = table.alloc(&mut mlfq, None, "last").unwrap();
        assert_eq!(last, Pid(u32::MAX - 1));

        assert_eq!(table.alloc(&mut mlfq, None, "over"), Err(KernelError::NoFreeSlot));
        assert_eq!(table.iter().count(), 1);
        assert_eq!(mlfq.queue(0).len(), 1);
    }
}
