//! Kernel console — кольцевой буфер + необязательный приёмник платформы.
//! Kernel console: ring buffer plus an optional platform sink.
//!
//! Платформа с UART регистрирует `set_sink`, чтобы видеть вывод вживую:
//! A platform with a UART registers `set_sink` to see output live:
//!   console::set_sink(uart::print);

use core::fmt;
use spin::Mutex;

/// Размер буфера (16KB) — старые байты затираются.
/// Buffer size (16KB); oldest bytes are overwritten.
const CONSOLE_SIZE: usize = 16 * 1024;

struct Console {
    buf:  [u8; CONSOLE_SIZE],
    /// Следующая позиция записи / Next write position
    head: usize,
    len:  usize,
    sink: Option<fn(&str)>,
}

impl Console {
    const fn new() -> Self {
        Self { buf: [0; CONSOLE_SIZE], head: 0, len: 0, sink: None }
    }

    fn push_str(&mut self, s: &str) {
        for &byte in s.as_bytes() {
            self.buf[self.head] = byte;
            self.head = (self.head + 1) % CONSOLE_SIZE;
        }
        self.len = (self.len + s.len()).min(CONSOLE_SIZE);
        if let Some(sink) = self.sink {
            sink(s);
        }
    }

    /// Последние `out.len()` байт, от старых к новым.
    /// The newest `out.len()` bytes, oldest first.
    fn copy_out(&self, out: &mut [u8]) -> usize {
        let n = self.len.min(out.len());
        let start = (self.head + CONSOLE_SIZE - n) % CONSOLE_SIZE;
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = self.buf[(start + i) % CONSOLE_SIZE];
        }
        n
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

static CONSOLE: Mutex<Console> = Mutex::new(Console::new());

/// Зеркалировать вывод в устройство платформы.
/// Mirror output to a platform device.
pub fn set_sink(sink: fn(&str)) {
    CONSOLE.lock().sink = Some(sink);
}

pub fn print(s: &str) {
    CONSOLE.lock().push_str(s);
}

/// Скопировать сохранённый вывод; возвращает число байт.
/// Copy retained output out; returns the byte count.
pub fn read(out: &mut [u8]) -> usize {
    CONSOLE.lock().copy_out(out)
}

/// Внутренняя функция для макроса kprint!
/// Internal function for kprint! macro
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    CONSOLE.lock().write_fmt(args).ok();
}
