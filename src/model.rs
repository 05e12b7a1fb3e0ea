use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::style::StyleConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Fixed,
    Hourly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpOwnership {
    Provider,
    Client,
    Shared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageRights {
    Exclusive,
    NonExclusive,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub organization: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    /// Currency amount, non-negative.
    pub amount: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentScheduleEntry {
    pub description: String,
    /// Share of the total amount, 0–100. Entries should sum to 100 but the
    /// engine renders and warns rather than rejects when they don't.
    pub percentage: f64,
    pub due_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub mode: PaymentMode,
    /// Hourly rate when mode is Hourly.
    pub rate: Option<f64>,
    /// Total contract amount when mode is Fixed.
    pub total_amount: Option<f64>,
    pub schedule: Vec<PaymentScheduleEntry>,
}

impl Default for PaymentTerms {
    fn default() -> Self {
        Self {
            mode: PaymentMode::Fixed,
            rate: None,
            total_amount: None,
            schedule: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Retainer {
    pub amount: f64,
    pub refundable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Terms {
    pub confidentiality: bool,
    pub ip_ownership: IpOwnership,
    pub usage_rights: UsageRights,
    pub termination: String,
    pub notice_period_days: u32,
    pub jurisdiction: String,
    pub retainer: Option<Retainer>,
}

impl Default for Terms {
    fn default() -> Self {
        Self {
            confidentiality: false,
            ip_ownership: IpOwnership::Client,
            usage_rights: UsageRights::NonExclusive,
            termination: String::new(),
            notice_period_days: 0,
            jurisdiction: String::new(),
            retainer: None,
        }
    }
}

/// Encoded raster image bytes (PNG or JPEG). Decoded lazily at render time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub bytes: Vec<u8>,
}

impl ImageRef {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerRole {
    Provider,
    Counterparty,
}

impl SignerRole {
    pub fn caption(self) -> &'static str {
        match self {
            SignerRole::Provider => "Service Provider",
            SignerRole::Counterparty => "Client",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Signatures {
    pub provider: Option<ImageRef>,
    pub counterparty: Option<ImageRef>,
    pub signed_date: Option<NaiveDate>,
}

/// Root entity for one pagination run. Treated as an immutable snapshot:
/// any field or style change means a full re-run, never an incremental
/// update of a previous run's output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractDocument {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub provider: Party,
    pub counterparty: Party,
    pub services_description: String,
    pub deliverables: String,
    pub milestones: Vec<Milestone>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub payment: PaymentTerms,
    pub terms: Terms,
    pub signatures: Signatures,
    pub style: StyleConfig,
}

impl ContractDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: String::new(),
            provider: Party::default(),
            counterparty: Party::default(),
            services_description: String::new(),
            deliverables: String::new(),
            milestones: Vec::new(),
            start_date: None,
            end_date: None,
            payment: PaymentTerms::default(),
            terms: Terms::default(),
            signatures: Signatures::default(),
            style: StyleConfig::default(),
        }
    }
}

/// Page surface in CSS pixels at 96 DPI. A4 defaults to 794x1123 with a
/// 60px margin on every side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_px: f32,
    pub height_px: f32,
    pub margin_px: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width_px: 794.0,
        height_px: 1123.0,
        margin_px: 60.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width_px - 2.0 * self.margin_px
    }

    /// Vertical space available for blocks after subtracting margins.
    pub fn content_height(&self) -> f32 {
        self.height_px - 2.0 * self.margin_px
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_content_box() {
        let g = PageGeometry::A4;
        assert_eq!(g.content_width(), 674.0);
        assert_eq!(g.content_height(), 1003.0);
    }

    #[test]
    fn document_round_trips_through_json() {
        let mut doc = ContractDocument::new("c-17", "Website Redesign");
        doc.milestones.push(Milestone {
            title: "Wireframes".into(),
            description: "Initial wireframes for all views".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            amount: Some(1200.0),
        });
        doc.payment.total_amount = Some(4800.0);

        let json = serde_json::to_string(&doc).unwrap();
        let back: ContractDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
