use crate::content::ContentBlock;
use crate::error::{Error, Warning};

/// One page's worth of blocks, in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub blocks: Vec<ContentBlock>,
}

/// Greedily pack blocks into pages of `page_content_height` px.
///
/// Single forward pass: a block whose measured height no longer fits on the
/// partially-filled current page closes that page and opens a new one.
/// Blocks are indivisible by construction (the builder never emits half a
/// milestone), and a heading is kept together with the block that follows
/// it so a section title never strands at the bottom of a page.
///
/// A block taller than the page itself is placed alone on its own page and
/// allowed to overflow; that is policy, not an error. An empty block list
/// yields zero pages.
pub fn paginate<F>(
    blocks: &[ContentBlock],
    page_content_height: f32,
    mut measure: F,
) -> Result<(Vec<Page>, Vec<Warning>), Error>
where
    F: FnMut(&ContentBlock) -> Result<f32, Error>,
{
    let mut warnings = Vec::new();

    let heights: Vec<f32> = blocks
        .iter()
        .map(|b| measure(b))
        .collect::<Result<_, _>>()?;

    for (block, &h) in blocks.iter().zip(&heights) {
        if h > page_content_height {
            log::warn!(
                "block {} measures {h:.0}px, taller than the {page_content_height:.0}px page",
                block.ident()
            );
            warnings.push(Warning::OversizedBlock {
                block: block.ident(),
                height_px: h,
                max_px: page_content_height,
            });
        }
    }

    let mut pages: Vec<Page> = Vec::new();
    let mut current: Vec<ContentBlock> = Vec::new();
    let mut current_height: f32 = 0.0;

    for (i, block) in blocks.iter().enumerate() {
        let h = heights[i];
        // A heading participates in the fit check together with its first
        // child, so the break lands before the heading instead of after it.
        let check_h = if block.is_heading() && i + 1 < blocks.len() {
            h + heights[i + 1]
        } else {
            h
        };

        if current_height > 0.0 && current_height + check_h > page_content_height {
            pages.push(Page {
                blocks: std::mem::take(&mut current),
            });
            current_height = 0.0;
        }

        current.push(block.clone());
        current_height += h;
    }

    if !current.is_empty() {
        pages.push(Page { blocks: current });
    }

    Ok((pages, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::SectionId;

    fn para(tag: &str) -> ContentBlock {
        ContentBlock::Paragraph {
            text: tag.into(),
            section: SectionId::Scope,
        }
    }

    fn heading(text: &str) -> ContentBlock {
        ContentBlock::Heading {
            level: 2,
            text: text.into(),
            section: SectionId::Scope,
        }
    }

    /// Measure stub keyed on the block's text: "h300" measures 300px.
    fn tagged_height(block: &ContentBlock) -> Result<f32, Error> {
        let text = match block {
            ContentBlock::Paragraph { text, .. } | ContentBlock::Heading { text, .. } => text,
            _ => unreachable!(),
        };
        Ok(text.trim_start_matches('h').parse::<f32>().unwrap())
    }

    #[test]
    fn empty_input_yields_zero_pages() {
        let (pages, warnings) = paginate(&[], 1003.0, tagged_height).unwrap();
        assert!(pages.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn blocks_fill_greedily_and_conserve_count() {
        let blocks: Vec<ContentBlock> =
            ["h300", "h500", "h300", "h400", "h400"].map(para).to_vec();
        let (pages, _) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].blocks.len(), 2); // 300 + 500
        assert_eq!(pages[1].blocks.len(), 2); // 300 + 400
        assert_eq!(pages[2].blocks.len(), 1); // 400
        let total: usize = pages.iter().map(|p| p.blocks.len()).sum();
        assert_eq!(total, blocks.len());
    }

    #[test]
    fn milestone_never_splits_even_with_headroom() {
        // 300 + 500 = 800 leaves 203px of headroom on page one, but the
        // third 300px block moves to page two whole.
        let blocks: Vec<ContentBlock> = ["h300", "h500", "h300"].map(para).to_vec();
        let (pages, _) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks.len(), 2);
        assert_eq!(pages[1].blocks.len(), 1);
    }

    #[test]
    fn oversized_block_gets_its_own_page_and_warns() {
        let blocks = vec![para("h200"), para("h1500"), para("h200")];
        let (pages, warnings) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].blocks.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::OversizedBlock { .. }));
    }

    #[test]
    fn single_oversized_block_is_one_page_not_zero() {
        let blocks = vec![para("h5000")];
        let (pages, warnings) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].blocks.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn heading_stays_with_first_child() {
        // Heading fits on page one but its child doesn't: both move.
        let blocks = vec![para("h900"), heading("h50"), para("h200")];
        let (pages, _) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks.len(), 1);
        assert_eq!(pages[1].blocks.len(), 2);
        assert!(pages[1].blocks[0].is_heading());
    }

    #[test]
    fn trailing_heading_does_not_look_ahead() {
        let blocks = vec![para("h900"), heading("h50")];
        let (pages, _) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn pagination_is_deterministic() {
        let blocks: Vec<ContentBlock> = ["h120", "h340", "h560", "h80", "h900", "h44"]
            .map(para)
            .to_vec();
        let (a, _) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        let (b, _) = paginate(&blocks, 1003.0, tagged_height).unwrap();
        assert_eq!(a, b);
    }
}
