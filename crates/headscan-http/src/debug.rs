//! Debug logging for the parser.
//!
//! Logging is off by default. Set `HEADSCAN_DEBUG=1` (or `true`) before the
//! first parse, or call [`enable_debug`] at any time. An explicit call always
//! wins over the environment.
//!
//! Events are written to stderr, one line each, tagged with the component
//! that produced them:
//!
//! ```text
//! [HEADSCAN:PARSE] headers incomplete after 37 bytes in state HeaderValue
//! [HEADSCAN:TABLE] header table full at 4 entries, grew to 8
//! ```
//!
//! A disabled event costs one atomic load; its arguments are not formatted.

use std::env;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

const UNSET: u8 = 0;
const OFF: u8 = 1;
const ON: u8 = 2;

static SETTING: AtomicU8 = AtomicU8::new(UNSET);

fn enabled_by_env() -> bool {
    env::var("HEADSCAN_DEBUG").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Returns true if debug events are printed.
///
/// The first call reads `HEADSCAN_DEBUG` unless logging was already switched
/// on or off explicitly.
#[must_use]
pub fn is_debug_enabled() -> bool {
    match SETTING.load(Ordering::Relaxed) {
        ON => true,
        OFF => false,
        _ => {
            let from_env = if enabled_by_env() { ON } else { OFF };
            match SETTING.compare_exchange(UNSET, from_env, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => {
                    if from_env == ON {
                        emit("INIT", format_args!("debug logging enabled by HEADSCAN_DEBUG"));
                    }
                    from_env == ON
                }
                Err(current) => current == ON,
            }
        }
    }
}

/// Print debug events from now on.
pub fn enable_debug() {
    SETTING.store(ON, Ordering::Release);
}

/// Stop printing debug events.
pub fn disable_debug() {
    SETTING.store(OFF, Ordering::Release);
}

#[doc(hidden)]
pub fn emit(component: &str, args: fmt::Arguments<'_>) {
    eprintln!("[HEADSCAN:{component}] {args}");
}

macro_rules! debug_event {
    ($component:literal, $($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            $crate::debug::emit($component, format_args!($($arg)*));
        }
    };
}

/// Request line and state machine exits.
macro_rules! debug_parse {
    ($($arg:tt)*) => { debug_event!("PARSE", $($arg)*) };
}

/// Header table growth, reset and dropped headers.
macro_rules! debug_table {
    ($($arg:tt)*) => { debug_event!("TABLE", $($arg)*) };
}

macro_rules! debug_body {
    ($($arg:tt)*) => { debug_event!("BODY", $($arg)*) };
}

macro_rules! debug_pool {
    ($($arg:tt)*) => { debug_event!("POOL", $($arg)*) };
}
