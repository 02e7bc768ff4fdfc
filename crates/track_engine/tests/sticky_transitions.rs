use std::cell::RefCell;
use std::rc::Rc;

use page::{ElementKey, PageDom, Rect, SimHost, StyleScope};
use track_engine::{Settings, TrackEngine};

type StuckLog = Rc<RefCell<Vec<(ElementKey, String)>>>;

fn sticky_fixture(top: &str, rect_top: f64) -> (SimHost, ElementKey, TrackEngine<SimHost>, StuckLog) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "header");
    host.set_attribute(el, "id", "masthead");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_computed(el, "height", "60px");
    host.set_computed(el, "position", "sticky");
    host.set_computed(el, "top", top);
    host.set_rect(el, Rect::from_xywh(0.0, rect_top, 800.0, 60.0));

    let log: StuckLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let settings = Settings {
        detect_sticky: true,
        on_change: Some(Box::new(move |key, prop, value| {
            if prop == "stuck" {
                sink.borrow_mut().push((key, value.to_owned()));
            }
        })),
        ..Settings::default()
    };
    let engine = TrackEngine::new(host.clone(), settings);
    (host, el, engine, log)
}

fn scroll_tick(host: &SimHost, engine: &mut TrackEngine<SimHost>) {
    engine.scrolled();
    for frame in host.take_frames() {
        engine.frame_fired(frame);
    }
}

#[test]
fn transitions_fire_exactly_once_per_state_change() {
    let (host, el, mut engine, log) = sticky_fixture("10px", 9.0);

    // Within the tolerance band at init.
    assert!(host.attribute(el, "data-keeptrack-stuck").is_some());
    assert_eq!(
        host.style_value(StyleScope::Root, "--masthead-stuck").as_deref(),
        Some("1")
    );
    assert_eq!(log.borrow().len(), 1);

    // Same position: checks repeat, the transition does not.
    scroll_tick(&host, &mut engine);
    scroll_tick(&host, &mut engine);
    assert_eq!(log.borrow().len(), 1);

    // Moved off the offset: one unstuck transition.
    host.set_rect(el, Rect::from_xywh(0.0, 20.0, 800.0, 60.0));
    scroll_tick(&host, &mut engine);
    assert!(host.attribute(el, "data-keeptrack-stuck").is_none());
    assert_eq!(
        host.style_value(StyleScope::Root, "--masthead-stuck").as_deref(),
        Some("0")
    );
    assert_eq!(log.borrow().len(), 2);
    assert_eq!(log.borrow()[1].1, "0");

    scroll_tick(&host, &mut engine);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn non_numeric_top_offsets_are_skipped() {
    let (host, el, mut engine, log) = sticky_fixture("auto", 0.0);

    scroll_tick(&host, &mut engine);
    assert!(host.attribute(el, "data-keeptrack-stuck").is_none());
    assert_eq!(host.style_value(StyleScope::Root, "--masthead-stuck"), None);
    assert!(log.borrow().is_empty());
}

#[test]
fn scroll_events_coalesce_to_one_check_per_frame() {
    let (host, _el, mut engine, _log) = sticky_fixture("10px", 9.0);

    engine.scrolled();
    engine.scrolled();
    engine.scrolled();
    assert_eq!(host.pending_frame_count(), 1);
    for frame in host.take_frames() {
        engine.frame_fired(frame);
    }
    // The in-flight flag clears once the frame runs.
    engine.scrolled();
    assert_eq!(host.pending_frame_count(), 1);
}
