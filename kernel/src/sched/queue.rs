//! Level Queue — кольцевой буфер `Pid` фиксированной ёмкости.
//! Level Queue: fixed-capacity ring buffer of `Pid`s.
//!
//!   front → [p3][p7][p1] ← rear
//!
//! Очередь не владеет процессами: только идентификаторы.
//! The queue owns nothing but identifiers.

use crate::config::NPROC;
use crate::error::{KernelError, Result};
use crate::proc::Pid;

pub struct LevelQueue {
    slots:  [Option<Pid>; NPROC],
    front:  usize,
    rear:   usize,
    size:   usize,
    level:  u8,
    /// Закреплённый процесс живёт на этом уровне
    /// The pinned process lives on this level
    locked: bool,
}

impl LevelQueue {
    pub const fn new(level: u8) -> Self {
        Self { slots: [None; NPROC], front: 1, rear: 0, size: 0, level, locked: false }
    }

    pub fn len(&self) -> usize { self.size }
    pub fn is_empty(&self) -> bool { self.size == 0 }
    pub fn is_full(&self) -> bool { self.size == NPROC }
    pub fn is_locked(&self) -> bool { self.locked }

    pub(crate) fn set_locked(&mut self, locked: bool) { self.locked = locked; }

    pub fn front(&self) -> Option<Pid> {
        if self.is_empty() { None } else { self.slots[self.front] }
    }

    /// Добавить в хвост / Append at the rear
    pub fn enqueue(&mut self, pid: Pid) -> Result<()> {
        if self.is_full() {
            log::error!("L{} queue full, cannot enqueue pid {}", self.level, pid);
            return Err(KernelError::QueueFull { level: self.level });
        }
        self.rear = (self.rear + 1) % NPROC;
        self.slots[self.rear] = Some(pid);
        self.size += 1;
        Ok(())
    }

    /// Снять с головы / Take from the front
    pub fn dequeue(&mut self) -> Option<Pid> {
        if self.is_empty() {
            return None;
        }
        let pid = self.slots[self.front].take();
        self.front = (self.front + 1) % NPROC;
        self.size -= 1;
        pid
    }

    /// Вставить перед головой. Только для процесса, снявшего блокировку.
    /// Insert ahead of the front. Only used when a process gives up the lock.
    pub fn push_front(&mut self, pid: Pid) -> Result<()> {
        if self.is_full() {
            log::error!("L{} queue full, cannot push pid {}", self.level, pid);
            return Err(KernelError::QueueFull { level: self.level });
        }
        self.front = (self.front + NPROC - 1) % NPROC;
        self.slots[self.front] = Some(pid);
        self.size += 1;
        Ok(())
    }

    /// Голову — в хвост. Пропущенный процесс теряет место в очереди.
    /// Move the front to the rear. A skipped process loses its place.
    pub fn rotate(&mut self) {
        if let Some(pid) = self.dequeue() {
            // Место только что освободилось / A slot was just freed
            let _ = self.enqueue(pid);
        }
    }

    /// Удалить `pid` из середины, сдвигая всё между головой и ним на шаг
    /// к хвосту. Порядок остальных сохраняется; нет такого — ничего не делать.
    ///
    /// Remove `pid` from anywhere, shifting every entry between the front and
    /// the hole one step toward the rear. Order is preserved; a missing pid
    /// is a no-op.
    pub fn remove(&mut self, pid: Pid) -> bool {
        let Some(mut idx) = self.position(pid) else {
            return false;
        };
        while idx != self.front {
            let prev = (idx + NPROC - 1) % NPROC;
            self.slots[idx] = self.slots[prev];
            idx = prev;
        }
        self.slots[self.front] = None;
        self.front = (self.front + 1) % NPROC;
        self.size -= 1;
        true
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.position(pid).is_some()
    }

    /// Идентификаторы от головы к хвосту / Identifiers from front to rear
    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        (0..self.size).filter_map(move |i| self.slots[(self.front + i) % NPROC])
    }

    fn position(&self, pid: Pid) -> Option<usize> {
        (0..self.size)
            .map(|i| (self.front + i) % NPROC)
            .find(|&idx| self.slots[idx] == Some(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(pids: &[u32]) -> LevelQueue {
        let mut q = LevelQueue::new(0);
        for &p in pids {
            q.enqueue(Pid(p)).unwrap();
        }
        q
    }

    fn order(q: &LevelQueue) -> Vec<u32> {
        q.iter().map(Pid::as_u32).collect()
    }

    #[test]
    fn fifo_order() {
        let mut q = queue_of(&[1, 2, 3]);
        assert_eq!(q.front(), Some(Pid(1)));
        assert_eq!(q.dequeue(), Some(Pid(1)));
        assert_eq!(q.dequeue(), Some(Pid(2)));
        assert_eq!(q.len(), 1);
        assert_eq!(q.dequeue(), Some(Pid(3)));
        assert_eq!(q.dequeue(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn enqueue_on_full_queue_is_an_error() {
        let mut q = LevelQueue::new(2);
        for p in 0..NPROC as u32 {
            q.enqueue(Pid(p + 1)).unwrap();
        }
        assert_eq!(q.enqueue(Pid(999)), Err(KernelError::QueueFull { level: 2 }));
        assert_eq!(q.push_front(Pid(999)), Err(KernelError::QueueFull { level: 2 }));
        assert_eq!(q.len(), NPROC);
    }

    #[test]
    fn wraps_around_the_buffer() {
        let mut q = LevelQueue::new(0);
        for round in 0..3 * NPROC as u32 {
            q.enqueue(Pid(round)).unwrap();
            assert_eq!(q.dequeue(), Some(Pid(round)));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn push_front_becomes_new_head() {
        let mut q = queue_of(&[1, 2]);
        q.push_front(Pid(9)).unwrap();
        assert_eq!(order(&q), [9, 1, 2]);

        let mut empty = LevelQueue::new(0);
        empty.push_front(Pid(4)).unwrap();
        assert_eq!(empty.front(), Some(Pid(4)));
        assert_eq!(empty.dequeue(), Some(Pid(4)));
    }

    #[test]
    fn rotate_moves_front_to_rear() {
        let mut q = queue_of(&[1, 2, 3]);
        q.rotate();
        assert_eq!(order(&q), [2, 3, 1]);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut q = queue_of(&[1, 2, 3, 4, 5]);
        assert!(q.remove(Pid(4)));
        assert_eq!(order(&q), [1, 2, 3, 5]);
        assert!(q.remove(Pid(1)));
        assert_eq!(order(&q), [2, 3, 5]);
        assert!(q.remove(Pid(5)));
        assert_eq!(order(&q), [2, 3]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn remove_across_wraparound() {
        let mut q = LevelQueue::new(0);
        // Сдвинуть голову к концу массива / Move the front near the array end
        for p in 0..NPROC as u32 - 2 {
            q.enqueue(Pid(p)).unwrap();
            q.dequeue();
        }
        for p in [10, 11, 12, 13] {
            q.enqueue(Pid(p)).unwrap();
        }
        assert!(q.remove(Pid(12)));
        assert_eq!(order(&q), [10, 11, 13]);
    }

    #[test]
    fn remove_missing_pid_is_noop() {
        let mut q = queue_of(&[1, 2]);
        assert!(!q.remove(Pid(7)));
        assert_eq!(order(&q), [1, 2]);
    }
}
