mod common;

use pactpress::{
    Alignment, Engine, FontSizeName, PageGeometry, PaintOp, SectionId, SectionStyleOverride,
};

fn payment_text_ops(preview: &pactpress::Preview) -> Vec<(f32, [u8; 3])> {
    // Payment rows render the percentage/amount value in the section's
    // header color; collect (px, color) pairs for every text op that draws
    // a currency value.
    preview
        .pages
        .iter()
        .flat_map(|p| p.ops.iter())
        .filter_map(|op| match op {
            PaintOp::Text { text, px, color, .. } if text.contains('$') && text.contains('%') => {
                Some((*px, *color))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn section_override_changes_rendered_output() {
    common::init_logs();
    let engine = Engine::new();
    let mut doc = common::large_document(2);
    doc.style.section_overrides.insert(
        SectionId::Payment,
        SectionStyleOverride {
            header_color: Some([180, 30, 30]),
            content_size: Some(FontSizeName::XLarge),
            ..SectionStyleOverride::default()
        },
    );

    let preview = engine.preview(&doc, &PageGeometry::A4).unwrap();
    let ops = payment_text_ops(&preview);
    assert!(!ops.is_empty());
    for (px, color) in ops {
        assert_eq!(color, [180, 30, 30]);
        assert_eq!(px, 16.0); // body xlarge
    }
}

#[test]
fn apply_global_styles_beats_the_override() {
    let engine = Engine::new();
    let mut doc = common::large_document(2);
    doc.style.section_overrides.insert(
        SectionId::Payment,
        SectionStyleOverride {
            header_color: Some([180, 30, 30]),
            content_size: Some(FontSizeName::XLarge),
            ..SectionStyleOverride::default()
        },
    );
    doc.style.apply_global_styles = true;

    let preview = engine.preview(&doc, &PageGeometry::A4).unwrap();
    let ops = payment_text_ops(&preview);
    assert!(!ops.is_empty());
    for (px, color) in ops {
        assert_eq!(color, doc.style.primary_color);
        assert_eq!(px, 12.0); // global body medium
    }
}

#[test]
fn alignment_override_moves_section_content() {
    let engine = Engine::new();
    let mut doc = common::large_document(1);
    doc.services_description = "Short.".to_string();

    let left = engine.preview(&doc, &PageGeometry::A4).unwrap();
    doc.style.section_overrides.insert(
        SectionId::Scope,
        SectionStyleOverride {
            content_alignment: Some(Alignment::Right),
            ..SectionStyleOverride::default()
        },
    );
    let right = engine.preview(&doc, &PageGeometry::A4).unwrap();

    let find_x = |preview: &pactpress::Preview| -> f32 {
        preview
            .pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .find_map(|op| match op {
                PaintOp::Text { text, x, .. } if text == "Short." => Some(*x),
                _ => None,
            })
            .expect("scope paragraph rendered")
    };
    assert!(find_x(&right) > find_x(&left));
}

#[test]
fn style_changes_reflow_pagination() {
    let engine = Engine::new();
    let mut doc = common::large_document(12);
    let medium = engine.preview(&doc, &PageGeometry::A4).unwrap();

    doc.style.body_size = FontSizeName::XLarge;
    doc.style.line_spacing = 1.8;
    let large = engine.preview(&doc, &PageGeometry::A4).unwrap();

    assert!(
        large.pages.len() > medium.pages.len(),
        "larger type must need more pages"
    );
}
