//! Priority Booster — периодический сброс, ограничивающий голодание.
//! Priority Booster: the periodic reset that bounds starvation.

use crate::proc::ProcTable;

use super::mlfq::Mlfq;

impl Mlfq {
    /// Уровень 0 — сброс на месте; уровни 1 и 2 — целиком в хвост уровня 0.
    /// Level 0 is reset in place; levels 1 and 2 drain, in order, onto the
    /// tail of level 0.
    pub fn boost(&mut self, procs: &mut ProcTable) {
        for pid in self.queue(0).iter() {
            if let Some(p) = procs.get_mut(pid) {
                p.reset_aging();
            }
        }

        let mut moved = 0;
        for level in 1..crate::config::MLFQ_LEVELS as u8 {
            while let Some(pid) = self.queue_mut(level).dequeue() {
                if let Some(p) = procs.get_mut(pid) {
                    p.reset_aging();
                }
                // Ёмкость общая на всех уровнях / Capacity covers every live process
                let _ = self.enqueue(pid, 0);
                moved += 1;
            }
        }

        self.reset_ticks();
        log::debug!("priority boost: {} processes moved to L0", moved);
    }
}
