//! Process-wide logger.
//!
//! Starts as a no-op logger. Services install their own with
//! [`replace_globals`] during bootstrap and keep the returned closure to put
//! the previous one back.

use crate::logger::{Logger, LoggerWithCtx};
use crate::sugar::SugaredLogger;
use opentelemetry::Context;
use parking_lot::RwLock;
use std::sync::LazyLock;

struct Globals {
    logger: Logger,
    sugar: SugaredLogger,
}

impl Globals {
    fn new(logger: Logger) -> Self {
        Self {
            sugar: logger.sugar(),
            logger,
        }
    }
}

static GLOBALS: LazyLock<RwLock<Globals>> =
    LazyLock::new(|| RwLock::new(Globals::new(Logger::nop())));

/// The global logger.
pub fn l() -> Logger {
    GLOBALS.read().logger.clone()
}

/// The global sugared logger.
pub fn s() -> SugaredLogger {
    GLOBALS.read().sugar.clone()
}

/// The global logger bound to `cx`.
pub fn ctx(cx: &Context) -> LoggerWithCtx {
    l().ctx(cx)
}

/// Installs `logger` globally and returns a closure that restores the previous one.
pub fn replace_globals(logger: Logger) -> impl FnOnce() + Send + 'static {
    let previous = std::mem::replace(&mut *GLOBALS.write(), Globals::new(logger));
    move || {
        *GLOBALS.write() = previous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LoggerConfig;
    use crate::sink::MemorySink;
    use parking_lot::{Mutex, const_mutex};
    use std::sync::Arc;

    // Tests in this module mutate the process-wide logger.
    static SERIAL: Mutex<()> = const_mutex(());

    #[test]
    fn test_replace_and_restore() {
        let _serial = SERIAL.lock();
        let before = l();
        let logger = Logger::new(Arc::new(MemorySink::new()), LoggerConfig::default());

        let restore = replace_globals(logger.clone());
        assert!(l().ptr_eq(&logger));
        assert!(s().desugar().ptr_eq(&logger));

        restore();
        assert!(l().ptr_eq(&before));
    }

    #[test]
    fn test_ctx_uses_current_global() {
        let _serial = SERIAL.lock();
        let sink = Arc::new(MemorySink::new());
        let restore = replace_globals(Logger::new(sink.clone(), LoggerConfig::default()));

        ctx(&Context::new()).warn("global", vec![]);
        restore();

        assert_eq!(sink.take()[0].message, "global");
    }
}
