//! Bar state reachable from the window procedure
//!
//! The bar lives in a thread-local slot on the UI thread. Messages sent to the
//! window while a handler already holds the bar (a synchronous `SendMessage`
//! from inside that handler) find the slot busy.

use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::bar::Bar;
use crate::shell::{MessageId, RawMessage};

thread_local! {
    static BAR: RefCell<Option<Bar>> = const { RefCell::new(None) };
    static DEFERRED: RefCell<VecDeque<RawMessage>> = const { RefCell::new(VecDeque::new()) };
}

// AppBar callback id, readable even while the bar is busy
static APPBAR_MESSAGE: AtomicU32 = AtomicU32::new(0);

/// Install the bar for this thread
pub fn set_bar(bar: Bar) {
    BAR.with(|slot| {
        *slot.borrow_mut() = Some(bar);
    });
}

/// Remove the bar so it can be dropped outside the window procedure
pub fn take_bar() -> Option<Bar> {
    BAR.with(|slot| slot.try_borrow_mut().ok().and_then(|mut bar| bar.take()))
}

/// Access the bar. `None` when it is missing or already in use.
///
/// Messages deferred while the bar was busy are handed to it afterwards.
pub fn with_bar<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Bar) -> R,
{
    let result = BAR.with(|slot| match slot.try_borrow_mut() {
        Ok(mut bar) => bar.as_mut().map(f),
        Err(_) => {
            debug!("Bar is busy, skipping nested access");
            None
        }
    })?;
    replay_deferred();
    Some(result)
}

/// Keep a message for the bar until the running handler returns
pub fn defer(message: RawMessage) {
    DEFERRED.with(|queue| queue.borrow_mut().push_back(message));
}

fn replay_deferred() {
    while let Some(message) = DEFERRED.with(|queue| queue.borrow_mut().pop_front()) {
        debug!("Replaying deferred message {:#x}", message.code);
        let replayed = BAR.with(|slot| {
            let mut bar = slot.try_borrow_mut().ok()?;
            Some(bar.as_mut()?.handle_message(message))
        });
        if replayed.is_none() {
            DEFERRED.with(|queue| queue.borrow_mut().clear());
            return;
        }
    }
}

/// Whether a handler currently holds the bar
pub fn is_busy() -> bool {
    BAR.with(|slot| slot.try_borrow_mut().is_err())
}

pub fn set_appbar_message(id: Option<MessageId>) {
    APPBAR_MESSAGE.store(id.map_or(0, |id| id.0), Ordering::SeqCst);
}

/// The registered AppBar callback message, if any
pub fn appbar_message() -> Option<u32> {
    match APPBAR_MESSAGE.load(Ordering::SeqCst) {
        0 => None,
        id => Some(id),
    }
}
