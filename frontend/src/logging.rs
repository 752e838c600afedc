//! 日志初始化
//!
//! `tracing-subscriber` 的 fmt 输出按级别转发到浏览器控制台，
//! 非 wasm 目标写到 stderr。

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_LEVEL: Level = Level::INFO;

/// 编译期可通过 `EHS_LOG_LEVEL` 指定级别（trace/debug/info/warn/error）
pub fn init_logging() {
    let level = option_env!("EHS_LOG_LEVEL")
        .and_then(|raw| raw.parse::<Level>().ok())
        .unwrap_or(DEFAULT_LEVEL);

    // 多次调用时只有第一次生效
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(ConsoleMakeWriter)
        .try_init();
}

pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// 缓冲一条格式化后的日志，drop 时整行输出
pub struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buf: Vec::with_capacity(128),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        emit(self.level, line.trim_end());
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    let msg = wasm_bindgen::JsValue::from_str(line);
    if level == Level::ERROR {
        web_sys::console::error_1(&msg);
    } else if level == Level::WARN {
        web_sys::console::warn_1(&msg);
    } else {
        web_sys::console::log_1(&msg);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    use std::io::Write;
    let _ = writeln!(io::stderr(), "{}", line);
}
