use chrono::NaiveDate;

use crate::error::Warning;
use crate::model::{
    ContractDocument, ImageRef, Milestone, Party, PaymentMode, PaymentScheduleEntry, SignerRole,
};
use crate::style::SectionId;

/// One indivisible unit of renderable content. `MilestoneItem`,
/// `PaymentRow` and `SignatureBlock` are atomic: the paginator never
/// splits them across a page boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    Heading {
        /// 1 = document title, 2 = section heading, 3 = subheading.
        level: u8,
        text: String,
        section: SectionId,
    },
    Paragraph {
        text: String,
        section: SectionId,
    },
    PartyPair {
        provider: Party,
        counterparty: Party,
    },
    MilestoneItem {
        index: usize,
        milestone: Milestone,
    },
    PaymentRow {
        index: usize,
        entry: PaymentScheduleEntry,
        /// `total_amount * percentage / 100` when a total exists, else the
        /// row renders its percentage only.
        resolved_amount: Option<f64>,
    },
    SignatureBlock {
        role: SignerRole,
        name: String,
        image: Option<ImageRef>,
        date: Option<NaiveDate>,
    },
}

impl ContentBlock {
    pub fn section(&self) -> SectionId {
        match self {
            ContentBlock::Heading { section, .. } | ContentBlock::Paragraph { section, .. } => {
                *section
            }
            ContentBlock::PartyPair { .. } => SectionId::Parties,
            ContentBlock::MilestoneItem { .. } => SectionId::Milestones,
            ContentBlock::PaymentRow { .. } => SectionId::Payment,
            ContentBlock::SignatureBlock { .. } => SectionId::Signatures,
        }
    }

    /// True for blocks that must never be broken across pages. Headings are
    /// handled separately: a heading is kept with the block that follows it.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            ContentBlock::MilestoneItem { .. }
                | ContentBlock::PaymentRow { .. }
                | ContentBlock::SignatureBlock { .. }
        )
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, ContentBlock::Heading { .. })
    }

    /// Stable identity for logs and warnings: section id or indexed entry.
    pub fn ident(&self) -> String {
        match self {
            ContentBlock::Heading { section, level, .. } => {
                format!("{}/h{}", section.as_str(), level)
            }
            ContentBlock::Paragraph { section, .. } => format!("{}/p", section.as_str()),
            ContentBlock::PartyPair { .. } => "parties/pair".to_string(),
            ContentBlock::MilestoneItem { index, .. } => format!("milestone[{index}]"),
            ContentBlock::PaymentRow { index, .. } => format!("payment-row[{index}]"),
            ContentBlock::SignatureBlock { role, .. } => format!("signature/{:?}", role),
        }
    }
}

/// Fixed currency formatting shared by preview and export: dollar glyph,
/// comma grouping, two decimals.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

/// Long-form date shared by preview and export, e.g. "January 5, 2025".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn has_scope(doc: &ContractDocument) -> bool {
    !doc.services_description.trim().is_empty() || !doc.deliverables.trim().is_empty()
}

fn has_parties(doc: &ContractDocument) -> bool {
    !doc.provider.name.trim().is_empty() || !doc.counterparty.name.trim().is_empty()
}

fn has_payment(doc: &ContractDocument) -> bool {
    doc.payment.rate.is_some()
        || doc.payment.total_amount.is_some()
        || !doc.payment.schedule.is_empty()
}

fn has_timeline(doc: &ContractDocument) -> bool {
    doc.start_date.is_some() || doc.end_date.is_some()
}

fn has_terms(doc: &ContractDocument) -> bool {
    doc.terms.confidentiality
        || !doc.terms.termination.trim().is_empty()
        || doc.terms.notice_period_days > 0
        || !doc.terms.jurisdiction.trim().is_empty()
        || doc.terms.retainer.is_some()
}

fn push_paragraph(blocks: &mut Vec<ContentBlock>, section: SectionId, text: String) {
    if !text.trim().is_empty() {
        blocks.push(ContentBlock::Paragraph { text, section });
    }
}

fn payment_summary(doc: &ContractDocument) -> String {
    match doc.payment.mode {
        PaymentMode::Fixed => match doc.payment.total_amount {
            Some(total) => format!(
                "The total fee for the services is {}, payable per the schedule below.",
                format_currency(total)
            ),
            None => "The fee for the services is payable per the schedule below.".to_string(),
        },
        PaymentMode::Hourly => match doc.payment.rate {
            Some(rate) => format!(
                "Services are billed at an hourly rate of {}.",
                format_currency(rate)
            ),
            None => "Services are billed hourly.".to_string(),
        },
    }
}

fn timeline_summary(doc: &ContractDocument) -> String {
    match (doc.start_date, doc.end_date) {
        (Some(start), Some(end)) => format!(
            "This agreement commences on {} and continues until {} unless terminated earlier.",
            format_long_date(start),
            format_long_date(end)
        ),
        (Some(start), None) => format!(
            "This agreement commences on {} and continues until the services are complete.",
            format_long_date(start)
        ),
        (None, Some(end)) => format!(
            "This agreement continues until {} unless terminated earlier.",
            format_long_date(end)
        ),
        (None, None) => String::new(),
    }
}

fn terms_paragraphs(doc: &ContractDocument, blocks: &mut Vec<ContentBlock>) {
    let terms = &doc.terms;
    if terms.confidentiality {
        push_paragraph(
            blocks,
            SectionId::Terms,
            "Each party agrees to hold the other party's non-public information in strict \
             confidence and to use it only as required to perform under this agreement."
                .to_string(),
        );
    }
    let ip = match terms.ip_ownership {
        crate::model::IpOwnership::Provider => {
            "All intellectual property created under this agreement remains the property of the \
             service provider."
        }
        crate::model::IpOwnership::Client => {
            "Upon full payment, all intellectual property created under this agreement is \
             assigned to the client."
        }
        crate::model::IpOwnership::Shared => {
            "Intellectual property created under this agreement is jointly owned by both parties."
        }
    };
    let usage = match terms.usage_rights {
        crate::model::UsageRights::Exclusive => {
            "The client receives an exclusive license to use the deliverables."
        }
        crate::model::UsageRights::NonExclusive => {
            "The client receives a non-exclusive license to use the deliverables."
        }
    };
    push_paragraph(blocks, SectionId::Terms, format!("{ip} {usage}"));

    if !terms.termination.trim().is_empty() {
        push_paragraph(blocks, SectionId::Terms, terms.termination.clone());
    }
    if terms.notice_period_days > 0 {
        push_paragraph(
            blocks,
            SectionId::Terms,
            format!(
                "Either party may terminate this agreement with {} days' written notice.",
                terms.notice_period_days
            ),
        );
    }
    if let Some(retainer) = &terms.retainer {
        let kind = if retainer.refundable {
            "refundable"
        } else {
            "non-refundable"
        };
        push_paragraph(
            blocks,
            SectionId::Terms,
            format!(
                "A {} retainer of {} is due upon signing.",
                kind,
                format_currency(retainer.amount)
            ),
        );
    }
    if !terms.jurisdiction.trim().is_empty() {
        push_paragraph(
            blocks,
            SectionId::Terms,
            format!(
                "This agreement is governed by the laws of {}.",
                terms.jurisdiction
            ),
        );
    }
}

/// Normalize a contract document into the ordered, renderable block list.
/// Pure: no side effects, deterministic, and section order is fixed
/// regardless of styling. Sections with no underlying data emit nothing.
pub fn build_blocks(doc: &ContractDocument) -> (Vec<ContentBlock>, Vec<Warning>) {
    let mut blocks = Vec::new();
    let mut warnings = Vec::new();

    // Introduction
    blocks.push(ContentBlock::Heading {
        level: 1,
        text: doc.title.clone(),
        section: SectionId::Introduction,
    });
    push_paragraph(&mut blocks, SectionId::Introduction, doc.subtitle.clone());

    // Parties
    if has_parties(doc) {
        blocks.push(ContentBlock::Heading {
            level: 2,
            text: "Parties".to_string(),
            section: SectionId::Parties,
        });
        blocks.push(ContentBlock::PartyPair {
            provider: doc.provider.clone(),
            counterparty: doc.counterparty.clone(),
        });
    }

    // Scope and milestones
    if has_scope(doc) {
        blocks.push(ContentBlock::Heading {
            level: 2,
            text: "Scope of Services".to_string(),
            section: SectionId::Scope,
        });
        push_paragraph(&mut blocks, SectionId::Scope, doc.services_description.clone());
        if !doc.deliverables.trim().is_empty() {
            blocks.push(ContentBlock::Heading {
                level: 3,
                text: "Deliverables".to_string(),
                section: SectionId::Scope,
            });
            push_paragraph(&mut blocks, SectionId::Scope, doc.deliverables.clone());
        }
    }
    if !doc.milestones.is_empty() {
        blocks.push(ContentBlock::Heading {
            level: 2,
            text: "Milestones".to_string(),
            section: SectionId::Milestones,
        });
        for (index, milestone) in doc.milestones.iter().enumerate() {
            blocks.push(ContentBlock::MilestoneItem {
                index,
                milestone: milestone.clone(),
            });
        }
    }

    // Payment
    if has_payment(doc) {
        blocks.push(ContentBlock::Heading {
            level: 2,
            text: "Payment".to_string(),
            section: SectionId::Payment,
        });
        push_paragraph(&mut blocks, SectionId::Payment, payment_summary(doc));
        let total: f64 = doc.payment.schedule.iter().map(|e| e.percentage).sum();
        if !doc.payment.schedule.is_empty() && (total - 100.0).abs() > 0.01 {
            warnings.push(Warning::InvalidScheduleTotal { total });
        }
        for (index, entry) in doc.payment.schedule.iter().enumerate() {
            let resolved_amount = doc
                .payment
                .total_amount
                .map(|total| total * entry.percentage / 100.0);
            blocks.push(ContentBlock::PaymentRow {
                index,
                entry: entry.clone(),
                resolved_amount,
            });
        }
    }

    // Timeline
    if has_timeline(doc) {
        blocks.push(ContentBlock::Heading {
            level: 2,
            text: "Timeline".to_string(),
            section: SectionId::Timeline,
        });
        push_paragraph(&mut blocks, SectionId::Timeline, timeline_summary(doc));
    }

    // Additional terms
    if has_terms(doc) {
        blocks.push(ContentBlock::Heading {
            level: 2,
            text: "Additional Terms".to_string(),
            section: SectionId::Terms,
        });
        terms_paragraphs(doc, &mut blocks);
    }

    // Signatures
    blocks.push(ContentBlock::Heading {
        level: 2,
        text: "Signatures".to_string(),
        section: SectionId::Signatures,
    });
    blocks.push(ContentBlock::SignatureBlock {
        role: SignerRole::Provider,
        name: doc.provider.name.clone(),
        image: doc.signatures.provider.clone(),
        date: doc.signatures.signed_date,
    });
    blocks.push(ContentBlock::SignatureBlock {
        role: SignerRole::Counterparty,
        name: doc.counterparty.name.clone(),
        image: doc.signatures.counterparty.clone(),
        date: doc.signatures.signed_date,
    });

    (blocks, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_doc() -> ContractDocument {
        ContractDocument::new("c-1", "Consulting Agreement")
    }

    #[test]
    fn empty_sections_emit_no_blocks() {
        let (blocks, warnings) = build_blocks(&base_doc());
        assert!(warnings.is_empty());
        // Title plus signatures only; no payment, scope, parties or timeline.
        assert!(
            blocks
                .iter()
                .all(|b| !matches!(b.section(), SectionId::Payment | SectionId::Timeline))
        );
        assert!(blocks.iter().any(|b| b.is_heading()));
        assert_eq!(
            blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::SignatureBlock { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn payment_rows_resolve_amounts_from_total() {
        let mut doc = base_doc();
        doc.payment.total_amount = Some(5000.0);
        doc.payment.schedule = vec![
            PaymentScheduleEntry {
                description: "Deposit".into(),
                percentage: 40.0,
                due_date: None,
            },
            PaymentScheduleEntry {
                description: "Final".into(),
                percentage: 60.0,
                due_date: None,
            },
        ];
        let (blocks, warnings) = build_blocks(&doc);
        assert!(warnings.is_empty());
        let amounts: Vec<Option<f64>> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::PaymentRow {
                    resolved_amount, ..
                } => Some(*resolved_amount),
                _ => None,
            })
            .collect();
        assert_eq!(amounts, vec![Some(2000.0), Some(3000.0)]);
    }

    #[test]
    fn rows_without_total_stay_unresolved() {
        let mut doc = base_doc();
        doc.payment.schedule = vec![PaymentScheduleEntry {
            description: "Deposit".into(),
            percentage: 50.0,
            due_date: None,
        }];
        let (blocks, _) = build_blocks(&doc);
        let row = blocks
            .iter()
            .find(|b| matches!(b, ContentBlock::PaymentRow { .. }))
            .unwrap();
        match row {
            ContentBlock::PaymentRow {
                resolved_amount, ..
            } => assert_eq!(*resolved_amount, None),
            _ => unreachable!(),
        }
    }

    #[test]
    fn bad_schedule_total_warns_but_still_renders_all_rows() {
        let mut doc = base_doc();
        doc.payment.schedule = vec![
            PaymentScheduleEntry {
                description: "Deposit".into(),
                percentage: 50.0,
                due_date: None,
            },
            PaymentScheduleEntry {
                description: "Final".into(),
                percentage: 60.0,
                due_date: None,
            },
        ];
        let (blocks, warnings) = build_blocks(&doc);
        assert_eq!(
            warnings,
            vec![Warning::InvalidScheduleTotal { total: 110.0 }]
        );
        assert_eq!(
            blocks
                .iter()
                .filter(|b| matches!(b, ContentBlock::PaymentRow { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn ordering_is_fixed_by_section() {
        let mut doc = base_doc();
        doc.provider.name = "Ada Contractor".into();
        doc.services_description = "Design and build the thing.".into();
        doc.payment.total_amount = Some(100.0);
        doc.start_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        doc.terms.jurisdiction = "Norway".into();

        let (blocks, _) = build_blocks(&doc);
        let sections: Vec<SectionId> = blocks.iter().map(|b| b.section()).collect();
        let mut deduped = sections.clone();
        deduped.dedup();
        assert_eq!(
            deduped,
            vec![
                SectionId::Introduction,
                SectionId::Parties,
                SectionId::Scope,
                SectionId::Payment,
                SectionId::Timeline,
                SectionId::Terms,
                SectionId::Signatures,
            ]
        );
    }

    #[test]
    fn currency_and_date_formats_are_fixed() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1000000.0), "$1,000,000.00");
        let d = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(format_long_date(d), "January 5, 2025");
    }
}
