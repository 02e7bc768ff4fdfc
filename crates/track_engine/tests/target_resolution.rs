use page::{ElementKey, PageDom, SimHost, StyleScope};
use track_engine::{Settings, TrackEngine};

#[test]
fn ancestor_depth_targets_resolve_by_parent_walk() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let grandparent = host.add_element(ElementKey::ROOT, "section");
    let parent = host.add_element(grandparent, "div");
    let el = host.add_element(parent, "div");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_attribute(el, "data-keeptrack-target-parent", "2");
    host.set_computed(el, "height", "30px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());
    assert_eq!(
        host.style_value(StyleScope::Element(grandparent), "--height")
            .as_deref(),
        Some("30px")
    );
}

#[test]
fn trailing_text_after_the_depth_is_ignored() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let grandparent = host.add_element(ElementKey::ROOT, "section");
    let parent = host.add_element(grandparent, "div");
    let el = host.add_element(parent, "div");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_attribute(el, "data-keeptrack-target-parent", "2-up");
    host.set_computed(el, "height", "30px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());
    assert_eq!(
        host.style_value(StyleScope::Element(grandparent), "--height")
            .as_deref(),
        Some("30px")
    );
}

#[test]
fn the_older_attribute_spelling_is_honored() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let parent = host.add_element(ElementKey::ROOT, "div");
    let el = host.add_element(parent, "div");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_attribute(el, "data-keeptrack-addparent", "1");
    host.set_computed(el, "height", "12px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());
    assert_eq!(
        host.style_value(StyleScope::Element(parent), "--height").as_deref(),
        Some("12px")
    );
}

#[test]
fn selector_targets_try_ancestors_then_the_document() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let wrap = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(wrap, "class", "wrap");
    let el = host.add_element(wrap, "div");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_attribute(el, "data-keeptrack-target-parent", ".wrap");
    host.set_computed(el, "height", "30px");

    let sidebar = host.add_element(ElementKey::ROOT, "aside");
    host.set_attribute(sidebar, "id", "sidebar");
    let other = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(other, "data-keeptrack", "width");
    host.set_attribute(other, "data-keeptrack-target-parent", "#sidebar");
    host.set_computed(other, "width", "200px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());
    assert_eq!(
        host.style_value(StyleScope::Element(wrap), "--height").as_deref(),
        Some("30px")
    );
    assert_eq!(
        host.style_value(StyleScope::Element(sidebar), "--width").as_deref(),
        Some("200px")
    );
}

#[test]
fn malformed_selectors_fall_back_without_raising() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_attribute(el, "data-keeptrack-target-parent", "[unclosed");
    host.set_computed(el, "height", "30px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());
    // No target and no id: the element itself receives the property.
    assert_eq!(
        host.style_value(StyleScope::Element(el), "--height").as_deref(),
        Some("30px")
    );
}

#[test]
fn excess_ancestor_depth_resolves_to_no_target() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut host = SimHost::new();
    let el = host.add_element(ElementKey::ROOT, "div");
    host.set_attribute(el, "id", "deep");
    host.set_attribute(el, "data-keeptrack", "height");
    host.set_attribute(el, "data-keeptrack-target-parent", "9");
    host.set_computed(el, "height", "30px");

    let _engine = TrackEngine::new(host.clone(), Settings::default());
    // Fallback with an id is the document root.
    assert_eq!(
        host.style_value(StyleScope::Root, "--deep-height").as_deref(),
        Some("30px")
    );
}
