//! Spinner on stderr while requests are in flight.

use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;

use partnerdash_core::partnerdash_api::LoadingSignal;

/// Follow `loading` and show a spinner whenever it is busy.
///
/// The task ends when the returned handle is aborted.
pub fn spawn_spinner(loading: &LoadingSignal) -> JoinHandle<()> {
    let mut busy = loading.busy_stream();
    tokio::spawn(async move {
        let mut spinner: Option<ProgressBar> = None;
        while let Some(is_busy) = busy.next().await {
            if is_busy {
                spinner.get_or_insert_with(new_spinner);
            } else if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
            }
        }
    })
}

fn new_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Loading…");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
