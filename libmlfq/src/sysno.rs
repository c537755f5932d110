//! Номера syscall'ов и векторов — общий ABI ядра и userspace.
//! Syscall and vector numbers: ABI shared by kernel and userspace.

/// Номер системного вызова / System call number
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sysno {
    Fork            = 1,
    Exit            = 2,
    Wait            = 3,
    Kill            = 6,
    GetPid          = 11,
    Yield           = 22,
    GetLevel        = 23,
    SetPriority     = 24,
    SchedulerLock   = 25,
    SchedulerUnlock = 26,
}

impl Sysno {
    pub const fn from_usize(number: usize) -> Option<Self> {
        Some(match number {
            1  => Sysno::Fork,
            2  => Sysno::Exit,
            3  => Sysno::Wait,
            6  => Sysno::Kill,
            11 => Sysno::GetPid,
            22 => Sysno::Yield,
            23 => Sysno::GetLevel,
            24 => Sysno::SetPriority,
            25 => Sysno::SchedulerLock,
            26 => Sysno::SchedulerUnlock,
            _  => return None,
        })
    }

    pub const fn as_usize(self) -> usize { self as usize }
}

// ── Векторы прерываний / Interrupt vectors ───────────────────────────────────

/// `int $129` — schedulerLock с паролем ядра / with the kernel's password
pub const T_SCHED_LOCK:   u8 = 129;
/// `int $130` — schedulerUnlock с паролем ядра / with the kernel's password
pub const T_SCHED_UNLOCK: u8 = 130;

// ── Коды ошибок / Error codes ────────────────────────────────────────────────

pub const EFAIL:  isize = -1;
pub const EAGAIN: isize = -11;
pub const ENOSYS: isize = -38;
