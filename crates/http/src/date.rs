//! Prepared `Date` header line shared by all connections.
//!
//! Formatting an HTTP date on every response is wasted work when the value
//! only changes once per second. [`DateService`] renders the complete
//! `Date: <IMF-fixdate>\r\n` line on a background task and publishes it with
//! an atomic pointer swap, so readers always see a whole line.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use bytes::{Bytes, BytesMut};
use tokio::task::JoinHandle;

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(800);

#[derive(Debug)]
pub struct DateService {
    current: Arc<ArcSwap<Bytes>>,
    handle: JoinHandle<()>,
}

impl DateService {
    /// Starts the service on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new() -> Self {
        Self::with_update_interval(DEFAULT_UPDATE_INTERVAL)
    }

    pub fn with_update_interval(update_interval: Duration) -> Self {
        let current = Arc::new(ArcSwap::from_pointee(render_date_line()));
        let current_arc = Arc::clone(&current);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(update_interval);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                current_arc.store(Arc::new(render_date_line()));
            }
        });

        Self { current, handle }
    }

    /// The current `Date: ...\r\n` line.
    #[inline]
    pub fn date_line(&self) -> Bytes {
        self.current.load().as_ref().clone()
    }
}

impl Default for DateService {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DateService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn render_date_line() -> Bytes {
    let mut date = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut date);

    let mut line = BytesMut::with_capacity(b"Date: ".len() + date.len() + 2);
    line.extend_from_slice(b"Date: ");
    line.extend_from_slice(&date[..]);
    line.extend_from_slice(b"\r\n");
    line.freeze()
}
