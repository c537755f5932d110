//! libmlfq — MlfqOS userspace library
//!
//! Тонкая обёртка над syscall'ами планировщика.
//! Thin wrapper over the scheduler syscalls.
//!
//! Использование / Usage:
//!   use libmlfq::sched;
//!   sched::scheduler_lock(&mut gate, password)?;
//!
//! Ядро подключает этот крейт ради общих номеров syscall'ов.
//! The kernel links this crate for the shared syscall numbers.

#![no_std]

pub mod sysno;
pub mod sched;
pub mod task;

pub use sysno::Sysno;

/// Ошибки syscall / Syscall errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Ядро отказало (-1) / Kernel refused the call (-1)
    Failed,
    /// Вызывающий уснул, повторить позже / Caller was put to sleep, retry later
    WouldBlock,
    /// Нет такого syscall / No such syscall
    NoSys,
    Unknown(isize),
}

impl Error {
    /// Перевести код возврата ядра в ошибку.
    /// Translate a negative kernel return code into an error.
    pub const fn from_code(code: isize) -> Self {
        match code {
            sysno::EFAIL  => Error::Failed,
            sysno::EAGAIN => Error::WouldBlock,
            sysno::ENOSYS => Error::NoSys,
            other         => Error::Unknown(other),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Failed     => f.write_str("syscall failed"),
            Error::WouldBlock => f.write_str("caller must block"),
            Error::NoSys      => f.write_str("unknown syscall"),
            Error::Unknown(c) => write!(f, "unknown error code {}", c),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Шлюз в ядро — `syscall`/`int 0x40` на железе, прямой вызов в тестах.
/// Gate into the kernel: `syscall`/`int 0x40` on hardware, a direct call in tests.
pub trait Syscall {
    fn syscall(&mut self, nr: Sysno, arg0: isize, arg1: isize) -> isize;
}

/// Неотрицательный ответ — успех, отрицательный — код ошибки.
/// Non-negative return is success, negative is an error code.
pub(crate) fn check(ret: isize) -> Result<isize> {
    if ret < 0 { Err(Error::from_code(ret)) } else { Ok(ret) }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{Syscall, Sysno};

    /// Записывает вызовы и отвечает заранее заданным кодом.
    pub struct FakeGate {
        pub calls: [(Option<Sysno>, isize, isize); 8],
        pub count: usize,
        pub reply: isize,
    }

    impl FakeGate {
        pub fn replying(reply: isize) -> Self {
            Self { calls: [(None, 0, 0); 8], count: 0, reply }
        }

        pub fn last(&self) -> (Option<Sysno>, isize, isize) {
            self.calls[self.count - 1]
        }
    }

    impl Syscall for FakeGate {
        fn syscall(&mut self, nr: Sysno, arg0: isize, arg1: isize) -> isize {
            self.calls[self.count] = (Some(nr), arg0, arg1);
            self.count += 1;
            self.reply
        }
    }
}
