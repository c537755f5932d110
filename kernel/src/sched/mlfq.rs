//! MLFQ State — три очереди уровней, флаг блокировки и глобальные тики.
//! MLFQ State: three level queues, the lock flag and the global tick count.
//!
//! Выбор процесса физически вращает очереди: пропущенные процессы уходят
//! в хвост и теряют место.
//! Selection physically rotates the queues: skipped processes go to the
//! rear and lose their place.

use crate::config::{LOWEST_LEVEL, MLFQ_LEVELS};
use crate::error::Result;
use crate::proc::{Pid, Proc, ProcState, ProcTable};

use super::queue::LevelQueue;

pub struct Mlfq {
    queues:       [LevelQueue; MLFQ_LEVELS],
    /// Какой-то процесс держит блокировку / Some process holds the lock
    locked:       bool,
    /// Тики с последнего boost или захвата блокировки
    /// Ticks since the last boost or lock acquisition
    global_ticks: u32,
}

impl Mlfq {
    pub const fn new() -> Self {
        Self {
            queues:       [LevelQueue::new(0), LevelQueue::new(1), LevelQueue::new(2)],
            locked:       false,
            global_ticks: 0,
        }
    }

    pub fn queue(&self, level: u8) -> &LevelQueue {
        &self.queues[level as usize]
    }

    pub(crate) fn queue_mut(&mut self, level: u8) -> &mut LevelQueue {
        &mut self.queues[level as usize]
    }

    pub fn is_locked(&self) -> bool { self.locked }
    pub fn global_ticks(&self) -> u32 { self.global_ticks }

    pub(crate) fn set_locked(&mut self, locked: bool) { self.locked = locked; }
    pub(crate) fn reset_ticks(&mut self) { self.global_ticks = 0; }
    pub(crate) fn tick(&mut self) { self.global_ticks = self.global_ticks.saturating_add(1); }

    pub fn enqueue(&mut self, pid: Pid, level: u8) -> Result<()> {
        self.queue_mut(level).enqueue(pid)
    }

    /// Уровень, в очереди которого стоит `pid` / Level whose queue holds `pid`
    pub fn level_of(&self, pid: Pid) -> Option<u8> {
        (0..MLFQ_LEVELS as u8).find(|&level| self.queue(level).contains(pid))
    }

    /// Уровень закреплённого процесса / Level of the pinned process
    pub fn locked_level(&self) -> Option<u8> {
        (0..MLFQ_LEVELS as u8).find(|&level| self.queue(level).is_locked())
    }

    /// Снять `pid` с его текущей очереди и поставить в хвост `level`.
    /// Take `pid` off whatever queue holds it and append it to `level`.
    pub(crate) fn requeue(&mut self, pid: Pid, level: u8) -> Result<()> {
        if let Some(old) = self.level_of(pid) {
            self.queue_mut(old).remove(pid);
        }
        self.enqueue(pid, level)
    }

    /// Убрать зомби перед освобождением слота. Брошенная им блокировка
    /// снимается.
    /// Drop a zombie before its slot is reclaimed, releasing any lock it
    /// still holds.
    pub(crate) fn remove_zombie(&mut self, proc: &mut Proc) {
        if proc.is_locked() {
            log::info!("lock held by zombie pid {} released at reap", proc.pid);
            self.unpin(proc);
        }
        if let Some(level) = self.level_of(proc.pid) {
            self.queue_mut(level).remove(proc.pid);
        }
    }

    /// Найти готовый процесс без блокировки: уровни 0 и 1 — round robin,
    /// уровень 2 — минимальный `priority`, при равенстве — порядок очереди.
    /// Найденный процесс оказывается в голове своей очереди.
    ///
    /// Pick a runnable process when nothing is pinned: round robin on
    /// levels 0 and 1, minimum `priority` on level 2 with ties broken by
    /// queue order. The winner ends up at the front of its queue.
    pub fn find_runnable(&mut self, procs: &ProcTable) -> Option<Pid> {
        let runnable = |pid: Pid| procs.state_of(pid) == Some(ProcState::Runnable);

        for level in 0..LOWEST_LEVEL {
            let queue = self.queue_mut(level);
            for _ in 0..queue.len() {
                let pid = queue.front()?;
                if runnable(pid) {
                    return Some(pid);
                }
                queue.rotate();
            }
        }

        let queue = self.queue_mut(LOWEST_LEVEL);
        let mut best: Option<(Pid, u8)> = None;
        for pid in queue.iter() {
            let Some(p) = procs.get(pid) else { continue };
            if p.state != ProcState::Runnable {
                continue;
            }
            if best.map_or(true, |(_, prio)| p.priority < prio) {
                best = Some((pid, p.priority));
            }
        }
        let (winner, _) = best?;
        while queue.front() != Some(winner) {
            queue.rotate();
        }
        Some(winner)
    }

    /// Прокрутить заблокированный уровень до процесса с `is_locked`.
    /// Rotate the locked level until the pinned process is at the front.
    pub fn rotate_to_pinned(&mut self, procs: &ProcTable) -> Option<Pid> {
        let level = self.locked_level()?;
        let queue = self.queue_mut(level);
        for _ in 0..queue.len() {
            let pid = queue.front()?;
            if procs.get(pid).is_some_and(Proc::is_locked) {
                return Some(pid);
            }
            queue.rotate();
        }
        None
    }
}

impl Default for Mlfq {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(table: &mut ProcTable, mlfq: &mut Mlfq, n: usize) -> Vec<Pid> {
        (0..n)
            .map(|_| {
                let pid = table.alloc(mlfq, None, "t").unwrap();
                table.make_runnable(pid).unwrap();
                pid
            })
            .collect()
    }

    fn move_to(table: &mut ProcTable, mlfq: &mut Mlfq, pid: Pid, level: u8, priority: u8) {
        let p = table.get_mut(pid).unwrap();
        p.level = level;
        p.priority = priority;
        mlfq.requeue(pid, level).unwrap();
    }

    #[test]
    fn round_robin_skips_and_rotates_non_runnable() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let pids = spawn(&mut table, &mut mlfq, 3);
        table.sleep(pids[0], crate::proc::Channel::Object(1)).unwrap();

        assert_eq!(mlfq.find_runnable(&table), Some(pids[1]));
        // Спящий ушёл в хвост / The sleeper went to the rear
        let order: Vec<_> = mlfq.queue(0).iter().collect();
        assert_eq!(order, [pids[1], pids[2], pids[0]]);
    }

    #[test]
    fn higher_levels_win() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let pids = spawn(&mut table, &mut mlfq, 2);
        move_to(&mut table, &mut mlfq, pids[0], 1, 3);
        move_to(&mut table, &mut mlfq, pids[1], 2, 0);
        assert_eq!(mlfq.find_runnable(&table), Some(pids[0]));
    }

    #[test]
    fn lowest_level_picks_minimum_priority_with_queue_order_ties() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let pids = spawn(&mut table, &mut mlfq, 4);
        move_to(&mut table, &mut mlfq, pids[0], 2, 3);
        move_to(&mut table, &mut mlfq, pids[1], 2, 1);
        move_to(&mut table, &mut mlfq, pids[2], 2, 1);
        move_to(&mut table, &mut mlfq, pids[3], 2, 0);
        table.sleep(pids[3], crate::proc::Channel::Object(1)).unwrap();

        assert_eq!(mlfq.find_runnable(&table), Some(pids[1]));
        let order: Vec<_> = mlfq.queue(2).iter().collect();
        assert_eq!(order, [pids[1], pids[2], pids[3], pids[0]]);
    }

    #[test]
    fn nothing_runnable_yields_none() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let pids = spawn(&mut table, &mut mlfq, 2);
        for &pid in &pids {
            table.sleep(pid, crate::proc::Channel::Object(3)).unwrap();
        }
        assert_eq!(mlfq.find_runnable(&table), None);
        assert_eq!(mlfq.queue(0).len(), 2);
    }

    #[test]
    fn requeue_moves_between_levels() {
        let mut table = ProcTable::new();
        let mut mlfq = Mlfq::new();
        let pids = spawn(&mut table, &mut mlfq, 2);
        mlfq.requeue(pids[0], 1).unwrap();
        assert_eq!(mlfq.level_of(pids[0]), Some(1));
        assert_eq!(mlfq.queue(0).len(), 1);
        mlfq.requeue(pids[1], 0).unwrap();
        assert_eq!(mlfq.queue(0).front(), Some(pids[1]));
    }
}
