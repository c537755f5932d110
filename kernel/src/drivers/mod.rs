//! Kernel-space drivers
//!
//! Минимально необходимые для отладки / Minimum required for debugging:
//!   - console — кольцевой буфер вывода ядра / kernel output ring buffer
//!   - logger  — бэкенд `log` поверх консоли / `log` backend on the console

pub mod console;
pub mod logger;

/// Макрос для отладочного вывода.
/// Debug print macro.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::drivers::console::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kprintln {
    ()           => ($crate::kprint!("\n"));
    ($($arg:tt)*) => ($crate::kprint!("{}\n", format_args!($($arg)*)));
}
