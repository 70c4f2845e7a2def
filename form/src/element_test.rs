use super::*;

#[test]
fn to_html_serializes_attributes_and_children() {
    let element = Element::new("div")
        .with_id("input-0-a")
        .with_class("configOption")
        .with_class(HIDDEN_CLASS)
        .with_child(Element::new("label").with_attr("for", "x").with_text("A: "))
        .with_child(Element::new("input").with_attr("type", "text").with_attr("value", "v"));
    assert_eq!(
        element.to_html(),
        r#"<div id="input-0-a" class="configOption hidden"><label for="x">A: </label><input type="text" value="v"/></div>"#
    );
}

#[test]
fn to_html_escapes_text_and_attributes() {
    let element = Element::new("span").with_attr("title", "\"quoted\" & <b>").with_text("<script>'x'</script>");
    assert_eq!(
        element.to_html(),
        "<span title=\"&quot;quoted&quot; &amp; &lt;b&gt;\">&lt;script&gt;&#39;x&#39;&lt;/script&gt;</span>"
    );
}

#[test]
fn find_helpers_search_depth_first() {
    let tree = Element::new("div")
        .with_child(Element::new("p").with_class("description").with_text("first"))
        .with_child(Element::new("div").with_child(Element::new("input").with_id("deep")));
    assert_eq!(tree.find_by_class("description").and_then(|e| e.text.as_deref()), Some("first"));
    assert_eq!(tree.find_by_id("deep").map(|e| e.tag.as_str()), Some("input"));
    assert!(tree.find_by_id("missing").is_none());
}

#[test]
fn attr_lookup() {
    let element = Element::new("input").with_attr("min", "1").with_attr("max", "5");
    assert_eq!(element.attr("max"), Some("5"));
    assert_eq!(element.attr("step"), None);
}
