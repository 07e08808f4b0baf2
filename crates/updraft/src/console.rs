//! Console handlers for every callback the check engine can dispatch.

use std::sync::Arc;

use log::info;
use updraft_core::{CallbackRegistry, ErrorCode};

use crate::settings::JsonSettingsStore;

pub fn register(callbacks: &CallbackRegistry, store: &Arc<JsonSettingsStore>) {
    callbacks.set_error_handler(|code, message| match code {
        ErrorCode::FeedUnavailable => eprintln!("error: update feed unavailable: {message}"),
        ErrorCode::Generic => eprintln!("error: {message}"),
    });
    callbacks.set_feed_unavailable_handler(|| {
        info!("Update feed could not be downloaded or read");
    });

    callbacks.set_update_found_handler(|candidate| {
        let kind = if candidate.critical_update {
            "Critical update"
        } else {
            "Update"
        };
        println!("{kind} available: {}", candidate.version);
        if let Some(notes) = candidate.release_notes_url() {
            println!("  release notes: {notes}");
        }
        if let Some(download) = candidate.download_url() {
            println!("  download: {download}");
        }
    });
    callbacks.set_update_not_found_handler(|| println!("You are running the latest version."));

    callbacks.set_download_progress_handler(|downloaded, total| {
        info!("Downloaded {downloaded} of {total} bytes");
    });
    callbacks.set_download_complete_handler(|| info!("Download complete"));
    callbacks.set_download_failed_handler(|| eprintln!("error: download failed"));
    callbacks.set_update_cancelled_handler(|| info!("Update cancelled"));
    callbacks.set_update_skipped_handler(|| info!("Update skipped"));
    callbacks.set_update_postponed_handler(|| info!("Update postponed"));
    callbacks.set_update_dismissed_handler(|| info!("Update dismissed"));

    callbacks.set_run_installer_handler(|installer, arguments| {
        info!(
            "Refusing to run installer {} {arguments}: not supported from the console",
            installer.display()
        );
        false
    });
    callbacks.set_can_shutdown_handler(|| true);
    callbacks.set_shutdown_request_handler(|| info!("Shutdown requested"));

    let store = Arc::clone(store);
    callbacks.set_available_host_handler(move || store.snapshot().server_host);
}
