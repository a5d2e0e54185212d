mod common;

use textbox_svg::{
    BackgroundImage, BackgroundReference, FontHandle, Page, Style, assemble, layout, render_svg,
};

fn style() -> Style {
    Style::new("Noto Sans CJK JP Regular")
}

#[test]
fn page_shell_only() {
    let page = Page::a4();
    assert_eq!((page.width_px, page.height_px), (793, 1122));

    let svg = assemble(&page, None, &[], &style());
    assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg "));
    assert!(svg.trim_end().ends_with("</svg>"));

    let doc = roxmltree::Document::parse(&svg).expect("well-formed svg");
    let root = doc.root_element();
    assert_eq!(root.tag_name().name(), "svg");
    assert_eq!(root.tag_name().namespace(), Some("http://www.w3.org/2000/svg"));
    assert_eq!(root.attribute("width"), Some("210mm"));
    assert_eq!(root.attribute("height"), Some("297mm"));
    assert_eq!(root.attribute("viewBox"), Some("0 0 793 1122"));
    assert_eq!(root.children().filter(|n| n.is_element()).count(), 0);
    assert!(svg.contains("xmlns:xlink=\"http://www.w3.org/1999/xlink\""));
}

#[test]
fn background_precedes_text_and_carries_both_hrefs() {
    let page = Page::a4();
    let font = FontHandle::builtin();
    let bg = BackgroundImage::full_page(BackgroundReference::Path("scan & co.png".into()), &page);
    let lines = layout(&["first\n", "second\n"], &font);

    let svg = assemble(&page, Some(&bg), &lines.commands, &style());

    let doc = roxmltree::Document::parse(&svg).expect("well-formed svg");
    let children: Vec<&str> = doc
        .root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    assert_eq!(children, ["image", "g", "g"]);

    let (href, xlink) = common::background_hrefs(&svg).expect("background image");
    assert_eq!(href, "scan & co.png");
    assert_eq!(href, xlink);
    assert!(svg.contains("href=\"scan &amp; co.png\""));

    let image = doc.descendants().find(|n| n.has_tag_name("image")).unwrap();
    assert_eq!(image.attribute("width"), Some("793"));
    assert_eq!(image.attribute("height"), Some("1122"));
    assert_eq!(image.attribute("preserveAspectRatio"), Some("xMidYMid meet"));

    let texts: Vec<String> = common::text_groups(&svg).into_iter().map(|g| g.text).collect();
    assert_eq!(texts, ["first", "second"]);
}

#[test]
fn inline_background_is_a_png_data_uri() {
    let page = Page::a4();
    let png_signature = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let bg = BackgroundImage::full_page(BackgroundReference::InlineBytes(png_signature), &page);

    let svg = assemble(&page, Some(&bg), &[], &style());
    let (href, xlink) = common::background_hrefs(&svg).expect("background image");
    assert!(href.starts_with("data:image/png;base64,iVBORw0KGgo"));
    assert_eq!(href, xlink);
}

#[test]
fn reserved_characters_only_appear_escaped() {
    let font = FontHandle::builtin();
    let content = "<script>alert('x')</script>\nTom & Jerry \"live\"\n";
    let (svg, _) = render_svg(content, None, &font, &style());

    assert!(!svg.contains("<script>"));
    assert!(!svg.contains("Tom & Jerry"));
    assert!(svg.contains("&lt;script&gt;alert(&apos;x&apos;)&lt;/script&gt;"));
    assert!(svg.contains("Tom &amp; Jerry &quot;live&quot;"));

    let texts: Vec<String> = common::text_groups(&svg).into_iter().map(|g| g.text).collect();
    assert_eq!(texts, ["<script>alert('x')</script>", "Tom & Jerry \"live\""]);
}

#[test]
fn text_style_attributes() {
    let font = FontHandle::builtin();
    let (svg, _) = render_svg("styled\n", None, &font, &Style::new("A&B Sans"));

    let doc = roxmltree::Document::parse(&svg).expect("well-formed svg");
    let rect = doc.descendants().find(|n| n.has_tag_name("rect")).unwrap();
    assert_eq!(rect.attribute("fill"), Some("#FFFFFF"));
    assert_eq!(rect.attribute("opacity"), Some("0.9"));
    assert_eq!(rect.attribute("x"), Some("20"));

    let text = doc.descendants().find(|n| n.has_tag_name("text")).unwrap();
    assert_eq!(text.attribute("font-family"), Some("A&B Sans"));
    assert_eq!(text.attribute("font-size"), Some("16"));
    assert_eq!(text.attribute("dominant-baseline"), Some("central"));
    assert_eq!(text.attribute("x"), Some("25"));
}

#[test]
fn hello_blank_world_groups() {
    let font = FontHandle::builtin();
    let (svg, line_layout) = render_svg("Hello\n\nWorld\n", None, &font, &style());
    assert_eq!(line_layout.cursor, 40 + 3 * 27);

    let groups = common::text_groups(&svg);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].text, "Hello");
    assert_eq!(groups[0].rect_y, "35");
    assert_eq!(groups[0].rect_height, "25");
    assert_eq!(groups[0].text_y, "47.5");
    assert_eq!(groups[1].text, "World");
    assert_eq!(groups[1].rect_y, "89");
    assert_eq!(groups[1].text_y, "101.5");
}

#[test]
fn control_characters_keep_document_well_formed() {
    let font = FontHandle::builtin();
    let (svg, line_layout) = render_svg("page\x0cbreak\nbell\x07\nnul\0end\n", None, &font, &style());
    assert_eq!(line_layout.text_blocks().count(), 3);

    let texts: Vec<String> = common::text_groups(&svg).into_iter().map(|g| g.text).collect();
    assert_eq!(texts, ["page\u{FFFD}break", "bell\u{FFFD}", "nul\u{FFFD}end"]);
    assert!(!svg.contains('\x0c'));
    assert!(!svg.contains('\x07'));
    assert!(!svg.contains('\0'));
}

#[test]
fn escape_keeps_tabs_and_replaces_noncharacters() {
    assert_eq!(textbox_svg::escape_xml("a\tb"), "a\tb");
    assert_eq!(textbox_svg::escape_xml("x\u{FFFF}y\u{FFFE}"), "x\u{FFFD}y\u{FFFD}");
    assert_eq!(textbox_svg::escape_xml("\u{1F}"), "\u{FFFD}");
}
