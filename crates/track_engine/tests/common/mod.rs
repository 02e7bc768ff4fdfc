use page::SimHost;
use track_engine::TrackEngine;

/// Default quiet period from `Settings::default()`.
pub const DEBOUNCE_MS: u64 = 250;

/// Deliver pending mutation batches, fire due timers, and run scheduled
/// frames until the host settles (bounded, so poll chains cannot spin).
pub fn settle(host: &SimHost, engine: &mut TrackEngine<SimHost>) {
    for _ in 0..4 {
        let batch = host.take_mutations();
        if !batch.is_empty() {
            engine.apply_mutations(&batch);
        }
        for timer in host.advance_time(DEBOUNCE_MS) {
            engine.timer_fired(timer);
        }
        for frame in host.take_frames() {
            engine.frame_fired(frame);
        }
    }
}
