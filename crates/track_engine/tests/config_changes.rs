mod common;

use page::{ElementKey, PageDom, SimHost, StyleScope};
use track_engine::{Settings, TrackEngine};

#[test]
fn changed_marker_and_id_rehome_properties_without_orphans() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(el, "id", "x");
    host.set_attribute(el, "data-keeptrack", "width, height");
    host.set_computed(el, "width", "10px");
    host.set_computed(el, "height", "20px");

    let mut engine = TrackEngine::new(host.clone(), Settings::default());
    assert_eq!(
        host.style_value(StyleScope::Root, "--x-width").as_deref(),
        Some("10px")
    );
    assert_eq!(
        host.style_value(StyleScope::Root, "--x-height").as_deref(),
        Some("20px")
    );

    host.set_attribute(el, "data-keeptrack", "width");
    host.set_attribute(el, "id", "y");
    let batch = host.take_mutations();
    engine.apply_mutations(&batch);
    common::settle(&host, &mut engine);

    assert_eq!(host.style_value(StyleScope::Root, "--x-width"), None);
    assert_eq!(host.style_value(StyleScope::Root, "--x-height"), None);
    assert_eq!(
        host.style_value(StyleScope::Root, "--y-width").as_deref(),
        Some("10px")
    );
    assert_eq!(host.style_value(StyleScope::Root, "--y-height"), None);
}

#[test]
fn dropping_the_id_moves_properties_back_to_the_element() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(el, "id", "x");
    host.set_attribute(el, "data-keeptrack", "width");
    host.set_computed(el, "width", "10px");

    let mut engine = TrackEngine::new(host.clone(), Settings::default());
    assert_eq!(
        host.style_value(StyleScope::Root, "--x-width").as_deref(),
        Some("10px")
    );

    host.set_attribute(el, "id", "");
    let batch = host.take_mutations();
    engine.apply_mutations(&batch);

    assert_eq!(host.style_value(StyleScope::Root, "--x-width"), None);
    assert_eq!(
        host.style_value(StyleScope::Element(el), "--width").as_deref(),
        Some("10px")
    );
}
