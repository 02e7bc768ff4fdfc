use std::cell::Cell;
use std::rc::Rc;

use page::{ElementKey, PageDom, SimHost, StyleScope};
use track_engine::{Settings, TrackEngine};

#[test]
fn unchanged_styles_produce_no_second_writes() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(el, "data-keeptrack", "height, background-color");
    host.set_computed(el, "height", "40px");
    host.set_computed(el, "background-color", "rgb(10, 20, 30)");

    let changes = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&changes);
    let settings = Settings {
        on_change: Some(Box::new(move |_, _, _| counter.set(counter.get() + 1))),
        ..Settings::default()
    };
    let mut engine = TrackEngine::new(host.clone(), settings);

    // No id and no target: properties land on the element itself.
    assert_eq!(
        host.style_value(StyleScope::Element(el), "--height").as_deref(),
        Some("40px")
    );
    assert_eq!(
        host.style_value(StyleScope::Element(el), "--background-color")
            .as_deref(),
        Some("rgb(10, 20, 30)")
    );
    assert_eq!(changes.get(), 2);

    let writes_before = host.write_count();
    engine.recalculate();
    engine.recalculate();
    assert_eq!(host.write_count(), writes_before);
    assert_eq!(changes.get(), 2);

    host.set_computed(el, "height", "64px");
    engine.recalculate();
    assert_eq!(
        host.style_value(StyleScope::Element(el), "--height").as_deref(),
        Some("64px")
    );
    assert_eq!(host.write_count(), writes_before + 1);
    assert_eq!(changes.get(), 3);
}

#[test]
fn id_scoped_properties_land_on_the_root() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "header");
    host.set_attribute(el, "id", "masthead");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_computed(el, "height", "72px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());

    assert_eq!(
        host.style_value(StyleScope::Root, "--masthead-height").as_deref(),
        Some("72px")
    );
    assert_eq!(host.style_value(StyleScope::Element(el), "--height"), None);
}

#[test]
fn empty_property_lists_mirror_nothing() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(el, "data-keeptrack", " , ,");
    host.set_computed(el, "height", "40px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());
    assert_eq!(host.style_value(StyleScope::Element(el), "--height"), None);
}
