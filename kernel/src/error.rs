//! Ошибки ядра / Kernel errors

use core::fmt;

use crate::proc::Pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Очередь уровня заполнена / Level queue is full
    QueueFull { level: u8 },
    /// Нет свободного слота в таблице процессов / Process table exhausted
    NoFreeSlot,
    NoSuchProcess(Pid),
    /// Приоритет вне 0..=3 / Priority outside 0..=3
    InvalidPriority(i32),
    NoChildren,
    /// Вызывающий уснул / Caller was put to sleep
    WouldBlock,
    InitExiting,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::QueueFull { level } => write!(f, "level {} queue is full", level),
            KernelError::NoFreeSlot          => f.write_str("process table is full"),
            KernelError::NoSuchProcess(pid)  => write!(f, "no process with pid {}", pid),
            KernelError::InvalidPriority(p)  => write!(f, "priority {} is not allowed in MLFQ", p),
            KernelError::NoChildren          => f.write_str("no children to wait for"),
            KernelError::WouldBlock          => f.write_str("caller must sleep"),
            KernelError::InitExiting         => f.write_str("init exiting"),
        }
    }
}

impl KernelError {
    /// Код возврата syscall / Syscall return code
    pub const fn as_errno(self) -> isize {
        match self {
            KernelError::WouldBlock => libmlfq::sysno::EAGAIN,
            _                       => libmlfq::sysno::EFAIL,
        }
    }
}

pub type Result<T> = core::result::Result<T, KernelError>;
